//! BiCGStab (안정화 쌍켤레 기울기법).

use rayon::prelude::*;
use tracing::debug;

use crate::cg::{IterationInfo, SolveOutcome};
use crate::linalg::{axpy, dot, nrm2, LinearSystem};

/// 중간 잔차 `s`가 이보다 작으면 반 스텝으로 종료
const S_NORM_TOLERANCE: f64 = 1e-10;

/// `criteria` 자릿수를 수렴 기준 `10^-criteria`로 변환
pub fn tolerance_from_criteria(criteria: u32) -> f64 {
    10f64.powi(-i32::try_from(criteria).unwrap_or(i32::MAX))
}

/// BiCGStab으로 `system.x` 갱신. 최대 n회 반복.
///
/// `|rho| < tolerance`이면 수렴으로 본다. 초기 잔차 계산 직후 `on_residual`을,
/// 각 반복 끝에 `on_iteration`을 호출한다.
pub fn bicgstab<R, F>(
    system: &mut LinearSystem,
    tolerance: f64,
    mut on_residual: R,
    mut on_iteration: F,
) -> SolveOutcome
where
    R: FnMut(f64),
    F: FnMut(IterationInfo),
{
    let n = system.dim();
    let LinearSystem { a, b, x } = system;

    // r = b - A·x, r̂ = r
    let mut r = b.clone();
    a.gemv(-1.0, x, 1.0, &mut r);
    let r_hat = r.clone();
    on_residual(nrm2(&r));

    let mut v = vec![0.0; n];
    let mut p = vec![0.0; n];
    let mut s = vec![0.0; n];
    let mut t = vec![0.0; n];

    let mut alpha = 1.0;
    let mut omega = 1.0;
    let mut rho_prime = 1.0;

    let mut outcome = SolveOutcome {
        iterations: 0,
        converged: n == 0,
        final_error: 0.0,
    };

    for iteration in 0..n {
        let rho = dot(&r_hat, &r);
        outcome.final_error = rho.abs();
        if rho.abs() < tolerance {
            outcome.converged = true;
            break;
        }

        if iteration == 0 {
            p.copy_from_slice(&r);
        } else {
            let beta = (rho / rho_prime) * (alpha / omega);
            p.par_iter_mut()
                .zip(r.par_iter())
                .zip(v.par_iter())
                .for_each(|((pi, ri), vi)| *pi = ri + beta * (*pi - omega * vi));
        }

        a.gemv(1.0, &p, 0.0, &mut v);
        alpha = rho / dot(&r_hat, &v);

        s.par_iter_mut()
            .zip(r.par_iter())
            .zip(v.par_iter())
            .for_each(|((si, ri), vi)| *si = ri - alpha * vi);

        let s_norm = nrm2(&s);
        if s_norm < S_NORM_TOLERANCE {
            axpy(alpha, &p, x);
            outcome.iterations = iteration + 1;
            outcome.final_error = s_norm;
            outcome.converged = true;
            break;
        }

        a.gemv(1.0, &s, 0.0, &mut t);
        omega = dot(&t, &s) / dot(&t, &t);
        if !omega.is_finite() || !alpha.is_finite() {
            debug!("BiCGStab 붕괴: alpha={alpha} omega={omega} (반복 {iteration})");
            break;
        }

        x.par_iter_mut()
            .zip(p.par_iter())
            .zip(s.par_iter())
            .for_each(|((xi, pi), si)| *xi += alpha * pi + omega * si);
        r.par_iter_mut()
            .zip(s.par_iter())
            .zip(t.par_iter())
            .for_each(|((ri, si), ti)| *ri = si - omega * ti);

        rho_prime = rho;
        outcome.iterations = iteration + 1;
        on_iteration(IterationInfo {
            iteration,
            error: rho_prime.abs(),
        });
    }

    debug!(
        iterations = outcome.iterations,
        error = outcome.final_error,
        converged = outcome.converged,
        "BiCGStab 종료"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::Conditioning;

    #[test]
    fn criteria_to_tolerance() {
        assert_eq!(tolerance_from_criteria(0), 1.0);
        assert!((tolerance_from_criteria(10) - 1e-10).abs() < 1e-24);
    }

    #[test]
    fn good_conditioning_converges() {
        let mut system = LinearSystem::new(64, Conditioning::Good);
        let mut residuals = Vec::new();
        let outcome = bicgstab(
            &mut system,
            tolerance_from_criteria(10),
            |r| residuals.push(r),
            |_| {},
        );

        assert!(outcome.converged);
        assert_eq!(residuals.len(), 1);
        assert!(system.relative_residual() < 1e-8);
    }

    #[test]
    fn poor_conditioning_reduces_residual() {
        let mut system = LinearSystem::new(10, Conditioning::Poor);
        let mut steps = 0;
        bicgstab(&mut system, tolerance_from_criteria(12), |_| {}, |_| steps += 1);

        assert!(steps <= 10);
        assert!(system.relative_residual() < 1e-4);
    }

    #[test]
    fn loose_tolerance_stops_immediately() {
        let mut system = LinearSystem::new(8, Conditioning::Good);
        let outcome = bicgstab(&mut system, f64::MAX, |_| {}, |_| {});

        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
        assert!(system.x.iter().all(|&v| v == 0.0));
    }
}
