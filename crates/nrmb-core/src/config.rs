//! 벤치마크 프로세스 설정.
//!
//! collector 엔드포인트(주소, 발행/RPC 포트)와 진행 보고 레이트 리밋을 정의한다.
//! 호출자가 아닌 프로세스 전역 설정에서 온다: 기본값 → JSON 파일 → `NRMB_*` 환경변수 순으로
//! `config` crate가 병합한다.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::CoreError;

/// 환경변수 접두사 (예: `NRMB_COLLECTOR__RPC_PORT=4000`)
pub const ENV_PREFIX: &str = "NRMB";

/// 중첩 키 구분자 (`collector.rpc_port` ↔ `COLLECTOR__RPC_PORT`)
const ENV_SEPARATOR: &str = "__";

/// 최상위 벤치마크 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    /// collector(NRM 데몬) 연결 설정
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 진행 보고 설정
    #[serde(default)]
    pub progress: ProgressConfig,
}

// ============================================================
// collector 설정
// ============================================================

/// collector 연결 설정 — 발행(WebSocket) 채널과 RPC(HTTP) 채널
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// collector 호스트 주소
    #[serde(default = "default_host")]
    pub host: String,
    /// 이벤트 발행 포트
    #[serde(default = "default_pub_port")]
    pub pub_port: u16,
    /// RPC 포트 (센서 등록, 스코프 조회)
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    /// RPC 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            pub_port: default_pub_port(),
            rpc_port: default_rpc_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl CollectorConfig {
    /// RPC 채널 기본 URL
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}", self.host, self.rpc_port)
    }

    /// 이벤트 발행 채널 URL
    pub fn pub_url(&self) -> String {
        format!("ws://{}:{}/events", self.host, self.pub_port)
    }

    /// RPC 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ============================================================
// 진행 보고 설정
// ============================================================

/// 진행 보고 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// 두 flush 사이 최소 간격 (밀리초)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

impl ProgressConfig {
    /// 레이트 리밋 윈도우를 Duration으로 반환
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

// ============================================================
// 로드 / 검증
// ============================================================

impl BenchConfig {
    /// 기본값 + (선택) JSON 파일 + `NRMB_*` 환경변수로 설정 로드
    ///
    /// 파일 경로가 주어지면 파일은 필수다.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        Self::from_sources(path, environment())
    }

    fn from_sources(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, CoreError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(true),
            );
        }

        let config: BenchConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            host = %config.collector.host,
            pub_port = config.collector.pub_port,
            rpc_port = config.collector.rpc_port,
            rate_limit_ms = config.progress.rate_limit_ms,
            "설정 로드 완료"
        );
        Ok(config)
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.collector.host.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "collector.host".to_string(),
                message: "빈 호스트 주소".to_string(),
            });
        }
        if self.collector.pub_port == 0 {
            return Err(CoreError::Validation {
                field: "collector.pub_port".to_string(),
                message: "포트 0은 허용되지 않음".to_string(),
            });
        }
        if self.collector.rpc_port == 0 {
            return Err(CoreError::Validation {
                field: "collector.rpc_port".to_string(),
                message: "포트 0은 허용되지 않음".to_string(),
            });
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_pub_port() -> u16 {
    2345
}

fn default_rpc_port() -> u16 {
    3456
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_rate_limit_ms() -> u64 {
    10
}
