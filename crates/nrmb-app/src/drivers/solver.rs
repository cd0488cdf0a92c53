//! 반복 솔버 드라이버 (cg, bicgstab).

use nrmb_core::ports::progress::ProgressSink;
use nrmb_core::time::TimingStats;
use nrmb_kernels::bicgstab::{bicgstab, tolerance_from_criteria};
use nrmb_kernels::cg::{conjugate_gradient, IterationInfo, SolveOutcome};
use nrmb_kernels::linalg::{Conditioning, LinearSystem};
use std::cell::RefCell;

use super::{timed, Driver};
use crate::report::BenchReport;

fn step_line(info: IterationInfo) -> String {
    format!("Step: {} Error: {:.11}", info.iteration, info.error)
}

fn solver_report(
    prog_name: &str,
    label: &str,
    system: &LinearSystem,
    conditioning: Conditioning,
    steps: Vec<String>,
    outcome: SolveOutcome,
    stats: &TimingStats,
) -> BenchReport {
    let mut report = BenchReport::new(
        prog_name,
        format!("one progress per iteration, {label} solver"),
    );
    report
        .field("Matrix size", format!("{} x {}", system.dim(), system.dim()))
        .field("Conditioning", conditioning)
        .field("Number of threads", rayon::current_num_threads());
    for step in steps {
        report.line(step);
    }
    report
        .line(format!("{label} total iterations: {}", outcome.iterations))
        .line(format!("{label} time: {:.6}", stats.total_nanos() as f64 * 1e-9))
        .field("Converged", outcome.converged)
        .field(
            "Relative residual",
            format!("{:.6e}", system.relative_residual()),
        );
    report
}

/// 밀집 CG
pub struct CgDriver {
    prog_name: String,
    system: LinearSystem,
    conditioning: Conditioning,
    log: bool,
}

impl CgDriver {
    pub fn new(prog_name: String, n: usize, conditioning: Conditioning, log: bool) -> Self {
        Self {
            prog_name,
            system: LinearSystem::new(n, conditioning),
            conditioning,
            log,
        }
    }
}

impl Driver for CgDriver {
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport {
        let mut stats = TimingStats::new();
        let mut steps = Vec::new();
        let log = self.log;
        let system = &mut self.system;

        let outcome = timed(&mut stats, || {
            conjugate_gradient(system, |info| {
                if log {
                    steps.push(step_line(info));
                }
                sink.report(1.0);
            })
        });

        solver_report(
            &self.prog_name,
            "CG",
            &self.system,
            self.conditioning,
            steps,
            outcome,
            &stats,
        )
    }
}

/// 밀집 BiCGStab
pub struct BicgstabDriver {
    prog_name: String,
    system: LinearSystem,
    conditioning: Conditioning,
    tolerance: f64,
    log: bool,
}

impl BicgstabDriver {
    pub fn new(
        prog_name: String,
        n: usize,
        conditioning: Conditioning,
        criteria: u32,
        log: bool,
    ) -> Self {
        Self {
            prog_name,
            system: LinearSystem::new(n, conditioning),
            conditioning,
            tolerance: tolerance_from_criteria(criteria),
            log,
        }
    }
}

impl Driver for BicgstabDriver {
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport {
        let mut stats = TimingStats::new();
        let mut steps = Vec::new();
        let log = self.log;
        let tolerance = self.tolerance;
        let system = &mut self.system;

        // 시작 시점 보고, 이후 초기 잔차 계산 직후와 매 반복 끝에 보고
        sink.report(1.0);
        let sink = RefCell::new(sink);
        let outcome = timed(&mut stats, || {
            bicgstab(
                system,
                tolerance,
                |_| sink.borrow_mut().report(1.0),
                |info| {
                    if log {
                        steps.push(step_line(info));
                    }
                    sink.borrow_mut().report(1.0);
                },
            )
        });

        solver_report(
            &self.prog_name,
            "BiCGStab",
            &self.system,
            self.conditioning,
            steps,
            outcome,
            &stats,
        )
    }
}
