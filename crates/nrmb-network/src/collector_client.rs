//! NRM collector 클라이언트.
//!
//! `Collector` 포트 구현. 센서/스코프 관리는 HTTP RPC, 이벤트는 WebSocket 텍스트 프레임.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use nrmb_core::config::CollectorConfig;
use nrmb_core::error::CoreError;
use nrmb_core::models::progress::{ProgressEvent, Scope, Sensor};
use nrmb_core::ports::collector::Collector;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 센서 생성 요청 본문
#[derive(Debug, Serialize)]
struct CreateSensorRequest<'a> {
    name: &'a str,
}

/// 센서 생성 응답
#[derive(Debug, Deserialize)]
struct CreateSensorResponse {
    uuid: String,
}

/// collector 클라이언트 — `Collector` 포트 구현
pub struct NrmCollectorClient {
    client: reqwest::Client,
    rpc_base: String,
    publisher: tokio::sync::Mutex<Option<SplitSink<WsStream, Message>>>,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl NrmCollectorClient {
    /// 설정된 collector에 연결 (발행 채널 WebSocket 수립 + RPC 클라이언트 빌드)
    pub async fn connect(config: &CollectorConfig) -> Result<Self, CoreError> {
        Self::connect_to(&config.rpc_url(), &config.pub_url(), config.request_timeout()).await
    }

    /// 명시적 URL로 연결
    pub async fn connect_to(
        rpc_base: &str,
        pub_url: &str,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        info!("collector 발행 채널 연결: {pub_url}");
        let (ws_stream, _) = tokio_tungstenite::connect_async(pub_url)
            .await
            .map_err(|e| CoreError::Network(format!("발행 채널 연결 실패 ({pub_url}): {e}")))?;

        let (write, read) = ws_stream.split();
        let reader = tokio::spawn(Self::read_loop(read));

        Ok(Self {
            client,
            rpc_base: rpc_base.trim_end_matches('/').to_string(),
            publisher: tokio::sync::Mutex::new(Some(write)),
            reader: parking_lot::Mutex::new(Some(reader)),
        })
    }

    /// 발행 채널 수신 루프 — collector는 이 채널로 응답하지 않으므로 제어 프레임만 소모한다
    async fn read_loop(mut read: SplitStream<WsStream>) {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => debug!("발행 채널 수신 (무시): {}", text.as_str()),
                Ok(_) => {} // Ping/Pong은 자동 처리
                Err(e) => {
                    warn!("발행 채널 수신 에러: {e}");
                    break;
                }
            }
        }
        debug!("발행 채널 수신 루프 종료");
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.rpc_base, path)
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(
        &self,
        resp: reqwest::Response,
        resource_type: &str,
    ) -> Result<reqwest::Response, CoreError> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status.as_u16() {
            404 => Err(CoreError::NotFound {
                resource_type: resource_type.to_string(),
                id: text,
            }),
            503 => Err(CoreError::ServiceUnavailable(text)),
            _ => Err(CoreError::Internal(format!(
                "collector RPC 에러 ({status}): {text}"
            ))),
        }
    }
}

#[async_trait]
impl Collector for NrmCollectorClient {
    async fn add_sensor(&self, name: &str) -> Result<Sensor, CoreError> {
        debug!("센서 등록 요청: name={name}");

        let resp = self
            .client
            .post(self.url("/sensors"))
            .json(&CreateSensorRequest { name })
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("센서 등록 요청 실패: {e}")))?;

        let resp = self.check_response(resp, "Sensor").await?;
        let created: CreateSensorResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("센서 응답 파싱 실패: {e}")))?;

        debug!("센서 등록 성공: uuid={}", created.uuid);
        Ok(Sensor::new(name, created.uuid))
    }

    async fn remove_sensor(&self, sensor: &Sensor) -> Result<(), CoreError> {
        debug!("센서 해제 요청: uuid={}", sensor.uuid);

        let resp = self
            .client
            .delete(self.url(&format!("/sensors/{}", sensor.uuid)))
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("센서 해제 요청 실패: {e}")))?;

        self.check_response(resp, "Sensor").await?;
        Ok(())
    }

    async fn list_scopes(&self) -> Result<Vec<Scope>, CoreError> {
        let resp = self
            .client
            .get(self.url("/scopes"))
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("스코프 조회 요청 실패: {e}")))?;

        let resp = self.check_response(resp, "Scope").await?;
        let scopes: Vec<Scope> = resp
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("스코프 응답 파싱 실패: {e}")))?;

        debug!("스코프 {}개 조회", scopes.len());
        Ok(scopes)
    }

    fn release_scope(&self, scope: Scope) {
        // 스코프는 collector 측 상태가 없는 로컬 핸들
        debug!("스코프 반환: {}", scope.uuid());
    }

    async fn send_event(&self, event: &ProgressEvent) -> Result<(), CoreError> {
        let json = serde_json::to_string(event)?;

        let mut publisher = self.publisher.lock().await;
        let write = publisher
            .as_mut()
            .ok_or_else(|| CoreError::Network("발행 채널이 닫혀 있음".to_string()))?;

        write
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| CoreError::Network(format!("이벤트 전송 실패: {e}")))
    }

    async fn disconnect(&self) -> Result<(), CoreError> {
        let write = self.publisher.lock().await.take();
        let result = match write {
            Some(mut write) => {
                let sent = write.send(Message::Close(None)).await;
                let _ = write.close().await;
                sent.map_err(|e| CoreError::Network(format!("발행 채널 종료 실패: {e}")))
            }
            None => Ok(()),
        };

        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }

        info!("collector 연결 종료");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrmb_core::models::progress::MACHINE_SCOPE_UUID;
    use nrmb_core::time::Timestamp;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// 텍스트 프레임을 채널로 넘기는 1회용 WebSocket 서버
    async fn spawn_event_sink() -> (u16, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                match msg {
                    Message::Text(text) => {
                        let _ = tx.send(text.as_str().to_string());
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        });

        (port, rx)
    }

    async fn connect_client(
        server: &mockito::ServerGuard,
    ) -> (NrmCollectorClient, mpsc::UnboundedReceiver<String>) {
        let (pub_port, rx) = spawn_event_sink().await;
        let config = CollectorConfig {
            host: "127.0.0.1".to_string(),
            pub_port,
            rpc_port: server.socket_address().port(),
            request_timeout_ms: 2_000,
        };
        let client = NrmCollectorClient::connect(&config).await.unwrap();
        (client, rx)
    }

    #[tokio::test]
    async fn add_sensor_returns_assigned_uuid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sensors")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({ "name": "nrm.benchmarks.progress" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uuid":"sensor-42"}"#)
            .create_async()
            .await;

        let (client, _rx) = connect_client(&server).await;
        let sensor = client.add_sensor("nrm.benchmarks.progress").await.unwrap();

        assert_eq!(sensor.uuid, "sensor-42");
        assert_eq!(sensor.name, "nrm.benchmarks.progress");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn remove_sensor_hits_delete_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/sensors/sensor-42")
            .with_status(204)
            .create_async()
            .await;

        let (client, _rx) = connect_client(&server).await;
        let result = client
            .remove_sensor(&Sensor::new("nrm.benchmarks.progress", "sensor-42"))
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_scopes_parses_array() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/scopes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"uuid":"nrm.scope.hwloc.Core.0"},{"uuid":"nrm.scope.hwloc.Machine.0","numa":[0]}]"#,
            )
            .create_async()
            .await;

        let (client, _rx) = connect_client(&server).await;
        let scopes = client.list_scopes().await.unwrap();

        assert_eq!(scopes.len(), 2);
        assert!(scopes[1].matches(MACHINE_SCOPE_UUID));
        for scope in scopes {
            client.release_scope(scope);
        }
    }

    #[tokio::test]
    async fn status_codes_map_to_core_errors() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("DELETE", "/sensors/gone")
            .with_status(404)
            .with_body("gone")
            .create_async()
            .await;
        let _busy = server
            .mock("GET", "/scopes")
            .with_status(503)
            .with_body("starting")
            .create_async()
            .await;
        let _broken = server
            .mock("POST", "/sensors")
            .with_status(500)
            .create_async()
            .await;

        let (client, _rx) = connect_client(&server).await;

        let err = client
            .remove_sensor(&Sensor::new("x", "gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref resource_type, .. } if resource_type == "Sensor"));

        let err = client.list_scopes().await.unwrap_err();
        assert!(matches!(err, CoreError::ServiceUnavailable(_)));

        let err = client.add_sensor("x").await.unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[tokio::test]
    async fn send_event_publishes_text_frame() {
        let server = mockito::Server::new_async().await;
        let (client, mut rx) = connect_client(&server).await;

        let event = ProgressEvent::new(
            Timestamp::from_parts(2, 7),
            &Sensor::new("nrm.benchmarks.progress", "sensor-1"),
            &Scope::new(MACHINE_SCOPE_UUID),
            6.0,
        );
        client.send_event(&event).await.unwrap();

        let frame = rx.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["timestamp"], 2_000_000_007i64);
        assert_eq!(json["sensor"], "sensor-1");
        assert_eq!(json["scope"], MACHINE_SCOPE_UUID);
        assert_eq!(json["value"], 6.0);
    }

    #[tokio::test]
    async fn send_after_disconnect_fails() {
        let server = mockito::Server::new_async().await;
        let (client, _rx) = connect_client(&server).await;

        client.disconnect().await.unwrap();
        client.disconnect().await.unwrap();

        let event = ProgressEvent::new(
            Timestamp::now(),
            &Sensor::new("n", "s"),
            &Scope::new(MACHINE_SCOPE_UUID),
            1.0,
        );
        let err = client.send_event(&event).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }

    #[tokio::test]
    async fn connect_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = CollectorConfig {
            host: "127.0.0.1".to_string(),
            pub_port: port,
            rpc_port: port,
            request_timeout_ms: 500,
        };
        let result = NrmCollectorClient::connect(&config).await;
        assert!(matches!(result, Err(CoreError::Network(_))));
    }
}
