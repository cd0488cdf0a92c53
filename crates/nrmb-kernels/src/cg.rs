//! 켤레 기울기법 (대칭 양정치 밀집 행렬).

use rayon::prelude::*;
use tracing::debug;

use crate::linalg::{axpy, dot, LinearSystem};

/// 잔차 노름 수렴 기준
pub const CG_TOLERANCE: f64 = 1e-25;

/// 반복 하나의 상태 (진행 보고, 로그 출력용)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationInfo {
    /// 0부터 시작하는 반복 번호
    pub iteration: usize,
    /// 반복 후 오차 지표
    pub error: f64,
}

/// 솔버 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOutcome {
    /// 완료된 갱신 반복 수
    pub iterations: usize,
    /// 수렴 기준 도달 여부
    pub converged: bool,
    /// 종료 시 오차 지표
    pub final_error: f64,
}

/// CG로 `system.x` 갱신. 최대 n+1회 반복.
///
/// 매 반복 끝(수렴으로 빠져나가는 반복 제외)에 `on_iteration`을 호출한다.
pub fn conjugate_gradient<F>(system: &mut LinearSystem, mut on_iteration: F) -> SolveOutcome
where
    F: FnMut(IterationInfo),
{
    let n = system.dim();
    let LinearSystem { a, b, x } = system;

    // r = b - A·x
    let mut r = b.clone();
    a.gemv(-1.0, x, 1.0, &mut r);
    let mut p = r.clone();
    let mut ap = vec![0.0; n];

    let mut old_residual = dot(&r, &r);
    let mut outcome = SolveOutcome {
        iterations: 0,
        converged: old_residual.sqrt() < CG_TOLERANCE,
        final_error: old_residual.sqrt(),
    };
    if outcome.converged {
        return outcome;
    }

    for iteration in 0..=n {
        a.gemv(1.0, &p, 0.0, &mut ap);

        let p_ap = dot(&p, &ap);
        if p_ap == 0.0 || !p_ap.is_finite() {
            debug!("CG 중단: pᵀAp = {p_ap} (반복 {iteration})");
            break;
        }
        let alpha = old_residual / p_ap;

        axpy(alpha, &p, x);
        axpy(-alpha, &ap, &mut r);
        outcome.iterations = iteration + 1;

        let residual = dot(&r, &r);
        outcome.final_error = residual.sqrt();
        if outcome.final_error < CG_TOLERANCE {
            outcome.converged = true;
            break;
        }

        let beta = residual / old_residual;
        p.par_iter_mut()
            .zip(r.par_iter())
            .for_each(|(pi, ri)| *pi = ri + beta * *pi);

        old_residual = residual;
        on_iteration(IterationInfo {
            iteration,
            error: outcome.final_error,
        });
    }

    debug!(
        iterations = outcome.iterations,
        error = outcome.final_error,
        "CG 종료"
    );
    outcome
}
