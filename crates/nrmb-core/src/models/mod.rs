//! NRM 벤치마크 도메인 모델.
//!
//! collector와 주고받는 텔레메트리 데이터 구조체를 정의한다.

pub mod progress;
