//! STREAM 메모리 대역폭 커널.
//!
//! 네 연산 모두 원소 단위 병렬 루프다:
//! Copy `c = a`, Scale `b = s·c`, Add `c = a + b`, Triad `a = b + s·c`.

use rayon::prelude::*;

/// STREAM 기본 스칼라
pub const STREAM_SCALAR: f64 = 3.0;

/// `len`개 원소를 `value`로 채운 배열 (병렬 first-touch)
pub fn filled(len: usize, value: f64) -> Vec<f64> {
    (0..len).into_par_iter().map(|_| value).collect()
}

/// `dst = src`
pub fn copy(dst: &mut [f64], src: &[f64]) {
    debug_assert_eq!(dst.len(), src.len());
    dst.par_iter_mut()
        .zip(src.par_iter())
        .for_each(|(d, s)| *d = *s);
}

/// `dst = scalar · src`
pub fn scale(dst: &mut [f64], src: &[f64], scalar: f64) {
    debug_assert_eq!(dst.len(), src.len());
    dst.par_iter_mut()
        .zip(src.par_iter())
        .for_each(|(d, s)| *d = scalar * *s);
}

/// `dst = x + y`
pub fn add(dst: &mut [f64], x: &[f64], y: &[f64]) {
    debug_assert_eq!(dst.len(), x.len());
    debug_assert_eq!(dst.len(), y.len());
    dst.par_iter_mut()
        .zip(x.par_iter())
        .zip(y.par_iter())
        .for_each(|((d, x), y)| *d = *x + *y);
}

/// `dst = x + scalar · y`
pub fn triad(dst: &mut [f64], x: &[f64], y: &[f64], scalar: f64) {
    debug_assert_eq!(dst.len(), x.len());
    debug_assert_eq!(dst.len(), y.len());
    dst.par_iter_mut()
        .zip(x.par_iter())
        .zip(y.par_iter())
        .for_each(|((d, x), y)| *d = *x + scalar * *y);
}

/// STREAM 연산 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOp {
    Copy,
    Scale,
    Add,
    Triad,
}

impl StreamOp {
    /// 실행 순서대로의 전체 연산
    pub const ALL: [StreamOp; 4] = [StreamOp::Copy, StreamOp::Scale, StreamOp::Add, StreamOp::Triad];

    pub fn name(self) -> &'static str {
        match self {
            StreamOp::Copy => "Copy",
            StreamOp::Scale => "Scale",
            StreamOp::Add => "Add",
            StreamOp::Triad => "Triad",
        }
    }

    /// 원소 하나당 접근하는 배열 수 (읽기 + 쓰기)
    pub fn arrays_touched(self) -> usize {
        match self {
            StreamOp::Copy | StreamOp::Scale => 2,
            StreamOp::Add | StreamOp::Triad => 3,
        }
    }
}

/// STREAM 세 배열
#[derive(Debug, Clone)]
pub struct StreamArrays {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    scalar: f64,
}

impl StreamArrays {
    /// `a = 1, b = 2, c = 0`으로 초기화
    pub fn new(len: usize) -> Self {
        Self {
            a: filled(len, 1.0),
            b: filled(len, 2.0),
            c: filled(len, 0.0),
            scalar: STREAM_SCALAR,
        }
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// 배열 하나의 바이트 크기
    pub fn bytes_per_array(&self) -> usize {
        self.len() * std::mem::size_of::<f64>()
    }

    /// 연산 하나 실행
    pub fn run(&mut self, op: StreamOp) {
        match op {
            StreamOp::Copy => copy(&mut self.c, &self.a),
            StreamOp::Scale => scale(&mut self.b, &self.c, self.scalar),
            StreamOp::Add => add(&mut self.c, &self.a, &self.b),
            StreamOp::Triad => triad(&mut self.a, &self.b, &self.c, self.scalar),
        }
    }

    /// 네 연산을 순서대로 한 번
    pub fn full_pass(&mut self) {
        for op in StreamOp::ALL {
            self.run(op);
        }
    }
}

/// `passes`번의 전체 패스 후 (a, b, c) 기대값
pub fn expected_after(passes: usize, scalar: f64) -> (f64, f64, f64) {
    let (mut a, mut b, mut c) = (1.0, 2.0, 0.0);
    for _ in 0..passes {
        c = a;
        b = scalar * c;
        c = a + b;
        a = b + scalar * c;
    }
    (a, b, c)
}
