//! # nrmb-network
//!
//! NRM collector 네트워크 어댑터.
//! RPC 채널(HTTP/JSON, reqwest)로 센서 등록과 스코프 조회를 하고,
//! 발행 채널(WebSocket, tokio-tungstenite)로 진행 이벤트를 보낸다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use nrmb_network::collector_client::NrmCollectorClient;
//!
//! let client = NrmCollectorClient::connect(&config.collector).await?;
//! let session = TelemetrySession::open(Arc::new(client), "stream", &config.progress).await?;
//! ```

pub mod collector_client;
