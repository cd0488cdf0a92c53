//! # nrmb-kernels
//!
//! CPU 데이터 병렬 수치 커널. 모든 병렬 루프는 rayon 전역 풀에서 돈다.
//!
//! - [`stream`] — STREAM Copy / Scale / Add / Triad
//! - [`linalg`] — 밀집 행렬/벡터 연산과 테스트 선형계 생성
//! - [`cg`] — 켤레 기울기법
//! - [`bicgstab`] — BiCGStab
//! - [`npb`] — NAS Parallel Benchmarks EP, IS 포팅
//!
//! 커널은 텔레메트리를 모른다. 진행 보고는 호출자가 반복 콜백에서 처리한다.

pub mod bicgstab;
pub mod cg;
pub mod error;
pub mod linalg;
pub mod npb;
pub mod stream;
