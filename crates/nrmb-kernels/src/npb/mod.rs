//! NAS Parallel Benchmarks 커널 포팅.
//!
//! - [`random`] — NAS 선형 합동 난수 생성기 (`randlc`, `vranlc`)
//! - [`ep`] — Embarrassingly Parallel: 가우시안 쌍 생성과 환형 구간 집계
//! - [`is`] — Integer Sort: 버킷 기반 키 순위 계산

pub mod ep;
pub mod is;
pub mod random;
