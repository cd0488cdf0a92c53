//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `nrmb-network`가 [`collector::Collector`]를 구현하고,
//! `nrmb-progress`가 [`progress::ProgressSink`]를 구현한다.
//! 드라이버(`nrmb-app`)는 두 포트만 보고 와이어링한다.

pub mod collector;
pub mod progress;
