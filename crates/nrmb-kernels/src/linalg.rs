//! 밀집 선형대수 보조 연산과 테스트 선형계.
//!
//! 행 우선(row-major) 밀집 행렬. BLAS 레벨 1/2 연산 중 솔버가 쓰는 것만 제공한다.

use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

use crate::error::KernelError;

/// 행 우선 n×n 밀집 행렬
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// 행 단위 병렬 초기화. `f(i, row)`가 i번째 행을 채운다.
    pub fn from_rows<F>(n: usize, f: F) -> Self
    where
        F: Fn(usize, &mut [f64]) + Sync + Send,
    {
        let mut matrix = Self::zeros(n);
        if n > 0 {
            matrix
                .data
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, row)| f(i, row));
        }
        matrix
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// `y = alpha · A·x + beta · y`
    pub fn gemv(&self, alpha: f64, x: &[f64], beta: f64, y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.n);
        debug_assert_eq!(y.len(), self.n);
        if self.n == 0 {
            return;
        }
        y.par_iter_mut()
            .zip(self.data.par_chunks(self.n))
            .for_each(|(yi, row)| {
                let ax: f64 = row.iter().zip(x).map(|(a, x)| a * x).sum();
                *yi = if beta == 0.0 {
                    alpha * ax
                } else {
                    alpha * ax + beta * *yi
                };
            });
    }
}

/// 내적
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.par_iter().zip(y.par_iter()).map(|(a, b)| a * b).sum()
}

/// `y = y + alpha · x`
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    y.par_iter_mut()
        .zip(x.par_iter())
        .for_each(|(yi, xi)| *yi += alpha * xi);
}

/// 유클리드 노름
pub fn nrm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// 테스트 행렬 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conditioning {
    /// 모든 원소 3.2 + 대각에 n (대각 우세 대칭 양정치)
    Good,
    /// 대각 1..=n, 나머지 0
    Poor,
}

impl FromStr for Conditioning {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(Conditioning::Good),
            "poor" => Ok(Conditioning::Poor),
            other => Err(KernelError::UnknownConditioning(other.to_string())),
        }
    }
}

impl fmt::Display for Conditioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conditioning::Good => write!(f, "good"),
            Conditioning::Poor => write!(f, "poor"),
        }
    }
}

/// `A·x = b` 문제. 초기 `x = 0`, `b = 6.5`.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub a: DenseMatrix,
    pub b: Vec<f64>,
    pub x: Vec<f64>,
}

/// 우변 원소값
const RHS_VALUE: f64 = 6.5;

/// good 조건 행렬의 비대각 원소값
const GOOD_OFF_DIAGONAL: f64 = 3.2;

impl LinearSystem {
    pub fn new(n: usize, conditioning: Conditioning) -> Self {
        let a = match conditioning {
            Conditioning::Good => DenseMatrix::from_rows(n, |i, row| {
                row.fill(GOOD_OFF_DIAGONAL);
                row[i] += n as f64;
            }),
            Conditioning::Poor => DenseMatrix::from_rows(n, |i, row| {
                row.fill(0.0);
                row[i] = (i + 1) as f64;
            }),
        };

        Self {
            a,
            b: vec![RHS_VALUE; n],
            x: vec![0.0; n],
        }
    }

    pub fn dim(&self) -> usize {
        self.a.dim()
    }

    /// `‖b − A·x‖`
    pub fn residual_norm(&self) -> f64 {
        let mut r = self.b.clone();
        self.a.gemv(-1.0, &self.x, 1.0, &mut r);
        nrm2(&r)
    }

    /// `‖b − A·x‖ / ‖b‖`
    pub fn relative_residual(&self) -> f64 {
        let b_norm = nrm2(&self.b);
        if b_norm == 0.0 {
            return self.residual_norm();
        }
        self.residual_norm() / b_norm
    }
}
