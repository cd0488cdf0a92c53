//! 세션 초기화 에러.

use nrmb_core::error::CoreError;
use thiserror::Error;

/// 텔레메트리 세션 초기화 실패. 모두 복구 불가이며 재시도하지 않는다.
#[derive(Debug, Error)]
pub enum SessionError {
    /// collector 연결 실패
    #[error("collector 연결 실패: {0}")]
    Connect(#[from] CoreError),

    /// 진행 센서 등록 실패
    #[error("센서 등록 실패: {0}")]
    SensorRegistration(#[source] CoreError),

    /// 스코프 목록 조회 실패
    #[error("스코프 조회 실패: {0}")]
    ScopeDiscovery(#[source] CoreError),

    /// 대상 스코프 없음
    #[error("스코프 '{target}' 미발견 (조회된 스코프 {discovered}개)")]
    ScopeNotFound {
        /// 찾던 스코프 uuid
        target: String,
        /// 조회된 스코프 수
        discovered: usize,
    },
}
