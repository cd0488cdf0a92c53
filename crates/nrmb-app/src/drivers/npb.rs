//! NAS 병렬 벤치마크 드라이버 (ep, is).

use nrmb_core::ports::progress::ProgressSink;
use nrmb_core::time::TimingStats;
use nrmb_kernels::error::KernelError;
use nrmb_kernels::npb::ep::{self, EmbarrassinglyParallel, EpTally};
use nrmb_kernels::npb::is::IntegerSort;
use tracing::warn;

use super::{timed, Driver};
use crate::report::{BenchReport, ValidationStatus};

/// NAS EP
pub struct EpDriver {
    prog_name: String,
    times: u64,
    ep: EmbarrassinglyParallel,
}

impl EpDriver {
    pub fn new(prog_name: String, m: u32, times: u64) -> Result<Self, KernelError> {
        Ok(Self {
            prog_name,
            times,
            ep: EmbarrassinglyParallel::new(m)?,
        })
    }
}

impl Driver for EpDriver {
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport {
        sink.report(1.0);

        let mut stats = TimingStats::new();
        let mut tally = EpTally::default();
        for _ in 0..self.times {
            tally = timed(&mut stats, || self.ep.run());
            sink.report(1.0);
        }

        // 참조값이 없는 m은 비교할 수 없으므로 통과로 본다
        let validation = match ep::verify(self.ep.m(), &tally) {
            Some(passed) => ValidationStatus::from_passed(passed),
            None => ValidationStatus::Passed,
        };

        let mut report = BenchReport::new(
            self.prog_name.clone(),
            "one progress per iteration, NPB EP benchmark",
        );
        report
            .field("Problem size", format!("{}.", self.ep.m()))
            .field("Gaussian Pairs", format!("{:15.0}.", tally.gaussian_pairs()))
            .field(
                "Validation values",
                format!("{:25.15e} {:25.15e}", tally.sx, tally.sy),
            )
            .execution(self.times, rayon::current_num_threads())
            .timing("", &stats)
            .set_validation(validation);
        report
    }
}

/// NAS IS
pub struct IsDriver {
    prog_name: String,
    times: u64,
    is: IntegerSort,
}

impl IsDriver {
    /// 키 생성과 워밍업 순위 계산까지 마친 상태로 만든다
    pub fn new(prog_name: String, t: u32, times: u64) -> Result<Self, KernelError> {
        let mut is = IntegerSort::new(t)?;
        is.generate_keys();
        // 워밍업 (측정 제외)
        is.rank(1);
        Ok(Self {
            prog_name,
            times,
            is,
        })
    }
}

impl Driver for IsDriver {
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport {
        let mut stats = TimingStats::new();
        for iteration in 0..self.times {
            let iteration = usize::try_from(iteration).unwrap_or(usize::MAX);
            timed(&mut stats, || self.is.rank(iteration));
            sink.report(1.0);
        }

        let validation = match self.is.verify() {
            Ok(()) => ValidationStatus::Passed,
            Err(e) => {
                warn!("IS 검증 실패: {e}");
                ValidationStatus::Failed
            }
        };

        let mut report = BenchReport::new(
            self.prog_name.clone(),
            "one progress per iteration, NPB IS benchmark",
        );
        report
            .field("Problem size", format!("{}.", self.is.total_keys_log2()))
            .execution(self.times, rayon::current_num_threads())
            .timing("", &stats)
            .set_validation(validation);
        report
    }
}
