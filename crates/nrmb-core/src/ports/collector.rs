//! collector 포트.
//!
//! 구현: `nrmb-network` crate (reqwest RPC + tokio-tungstenite 발행 채널)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::progress::{ProgressEvent, Scope, Sensor};

/// NRM collector(리소스 관리 데몬) 클라이언트
///
/// 세션이 `Arc<dyn Collector>`로 보유하며, 연결은 세션 수명 동안 유효하다.
#[async_trait]
pub trait Collector: Send + Sync {
    /// 센서 생성 + 등록
    async fn add_sensor(&self, name: &str) -> Result<Sensor, CoreError>;

    /// 센서 등록 해제 + 제거
    async fn remove_sensor(&self, sensor: &Sensor) -> Result<(), CoreError>;

    /// collector가 아는 스코프 목록 조회
    ///
    /// 반환된 스코프는 모두 호출자 소유다. 쓰지 않을 스코프는 `release_scope`로 반환한다.
    async fn list_scopes(&self) -> Result<Vec<Scope>, CoreError>;

    /// 스코프 핸들 반환 (로컬 자원 해제, 실패하지 않음)
    fn release_scope(&self, scope: Scope);

    /// 진행 이벤트 발행
    async fn send_event(&self, event: &ProgressEvent) -> Result<(), CoreError>;

    /// 연결 종료
    async fn disconnect(&self) -> Result<(), CoreError>;
}
