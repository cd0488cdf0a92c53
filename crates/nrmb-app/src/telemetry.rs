//! 텔레메트리 세션 수명 관리.
//!
//! 드라이버 스레드는 동기 코드이므로 전송 전용 tokio 런타임을 따로 두고
//! `open`/`close`만 `block_on`으로 실행한다. `report`는 채널 전송만 하므로 블로킹하지 않는다.

use anyhow::{Context, Result};
use nrmb_core::config::BenchConfig;
use nrmb_core::ports::collector::Collector;
use nrmb_network::collector_client::NrmCollectorClient;
use nrmb_progress::error::SessionError;
use nrmb_progress::session::{SessionSummary, TelemetrySession};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info, warn};

/// 전송 런타임 워커 수
const TELEMETRY_WORKERS: usize = 1;

/// 전송용 런타임 생성
pub fn build_runtime() -> Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(TELEMETRY_WORKERS)
        .thread_name("nrmb-telemetry")
        .enable_all()
        .build()
        .context("텔레메트리 런타임 생성 실패")
}

/// 초기화 실패는 치명적: 로그를 남기고 커널 실행 전에 종료한다
fn fatal(e: SessionError) -> anyhow::Error {
    error!("텔레메트리 초기화 실패: {e}");
    anyhow::Error::new(e).context("NRM 텔레메트리 세션을 열 수 없음")
}

/// 설정의 collector에 연결하고 세션 열기
pub fn open_session(
    runtime: &Runtime,
    config: &BenchConfig,
    prog_name: &str,
) -> Result<TelemetrySession> {
    info!("collector 연결: {}", config.collector.rpc_url());
    let client = runtime
        .block_on(NrmCollectorClient::connect(&config.collector))
        .map_err(|e| fatal(SessionError::Connect(e)))?;
    open_with(runtime, Arc::new(client), config, prog_name)
}

/// 이미 연결된 collector로 세션 열기
///
/// 실패 시 collector 연결을 닫고 반환한다.
pub fn open_with(
    runtime: &Runtime,
    collector: Arc<dyn Collector>,
    config: &BenchConfig,
    prog_name: &str,
) -> Result<TelemetrySession> {
    runtime
        .block_on(async {
            let opened =
                TelemetrySession::open(Arc::clone(&collector), prog_name, &config.progress).await;
            if opened.is_err() {
                if let Err(e) = collector.disconnect().await {
                    warn!("collector 연결 종료 실패: {e}");
                }
            }
            opened
        })
        .map_err(fatal)
}

/// 세션 닫기 (잔여 진행량 flush 포함)
pub fn close_session(runtime: &Runtime, session: TelemetrySession) -> SessionSummary {
    let summary = runtime.block_on(session.close());
    info!(
        flushes = summary.flushes,
        total = summary.total_progress,
        failed = summary.dispatch.failed,
        "텔레메트리 요약"
    );
    summary
}
