//! 커널 에러 타입.

use thiserror::Error;

/// 커널 파라미터/검증 에러
#[derive(Debug, Error)]
pub enum KernelError {
    /// 허용 범위를 벗어난 문제 크기
    #[error("잘못된 파라미터 {name}: {reason}")]
    InvalidParameter {
        /// 파라미터 이름
        name: &'static str,
        /// 거부 사유
        reason: String,
    },

    /// 알 수 없는 행렬 조건 (good/poor 외)
    #[error("알 수 없는 조건 옵션: {0}")]
    UnknownConditioning(String),

    /// 결과 검증 실패
    #[error("검증 실패: {0}")]
    Verification(String),
}
