//! # nrmb-progress
//!
//! NRM 텔레메트리 세션과 레이트 리밋 진행 보고.
//!
//! 벤치마크 드라이버는 세션을 한 번 열고([`session::TelemetrySession::open`]),
//! 커널 반복 사이마다 [`emitter::report`]로 진행량을 보고하고, 종료 시 세션을 닫는다.
//! 보고는 동기 호출이며 네트워크를 기다리지 않는다. 실제 전송은
//! [`dispatcher::EventDispatcher`] 백그라운드 태스크가 맡는다.

pub mod dispatcher;
pub mod emitter;
pub mod error;
pub mod session;
