//! # nrmb-core
//!
//! NRM 벤치마크 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 텔레메트리 도메인 구조체 (센서, 스코프, 진행 이벤트)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — collector 엔드포인트 / 레이트 리밋 설정 (`config` crate 로드)
//! - [`time`] — 타임스탬프 캡처와 나노초 차이 계산
//! - [`check`] — 부동소수점 결과 검증 유틸리티

pub mod check;
pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod time;

#[cfg(test)]
mod tests {
    use crate::models::progress::{ProgressEvent, Scope, Sensor};
    use crate::time::Timestamp;

    #[test]
    fn progress_event_serde_roundtrip() {
        let event = ProgressEvent::new(
            Timestamp::from_parts(12, 345),
            &Sensor::new("nrm.benchmarks.progress", "sensor-1"),
            &Scope::new("nrm.scope.hwloc.Machine.0"),
            6.0,
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: ProgressEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, event);
        assert_eq!(deserialized.timestamp().as_nanos(), 12_000_000_345);
        assert_eq!(deserialized.scope_uuid(), "nrm.scope.hwloc.Machine.0");
    }

    #[test]
    fn config_defaults() {
        let config = crate::config::BenchConfig::default();
        assert_eq!(config.collector.host, "127.0.0.1");
        assert_eq!(config.collector.pub_port, 2345);
        assert_eq!(config.collector.rpc_port, 3456);
        assert_eq!(config.progress.rate_limit_ms, 10);
    }
}
