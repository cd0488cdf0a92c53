//! # nrmb-app
//!
//! NRM 벤치마크 드라이버.
//! 인자 파싱 결과로 커널을 준비하고, 텔레메트리 세션 안에서 실행한 뒤 결과를 보고한다.

pub mod drivers;
pub mod report;
pub mod telemetry;
