//! STREAM 계열 드라이버 (copy, triad, stream).

use nrmb_core::check::{check_all_relative, check_relative};
use nrmb_core::ports::progress::ProgressSink;
use nrmb_core::time::{diff, Timestamp, TimingStats};
use nrmb_kernels::stream::{self, expected_after, StreamArrays, StreamOp, STREAM_SCALAR};
use tracing::debug;

use super::{timed, Driver};
use crate::report::{BenchReport, ValidationStatus};

/// 결과 비교 허용 비트
const VALIDATION_BITS: u32 = 2;

/// `b = a` 반복
pub struct CopyDriver {
    prog_name: String,
    times: u64,
    a: Vec<f64>,
    b: Vec<f64>,
}

impl CopyDriver {
    pub fn new(prog_name: String, array_size: usize, times: u64) -> Self {
        Self {
            prog_name,
            times,
            a: stream::filled(array_size, 1.0),
            b: stream::filled(array_size, 2.0),
        }
    }
}

impl Driver for CopyDriver {
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport {
        stream::copy(&mut self.b, &self.a);
        sink.report(1.0);

        let mut stats = TimingStats::new();
        for _ in 0..self.times {
            timed(&mut stats, || stream::copy(&mut self.b, &self.a));
            sink.report(1.0);
        }

        let bytes = self.a.len() * std::mem::size_of::<f64>();
        let a = &self.a;
        let valid = check_all_relative(&self.b, VALIDATION_BITS, |i| a[i]).is_none();

        let mut report = BenchReport::new(
            self.prog_name.clone(),
            "one progress per iteration, Copy benchmark",
        );
        report
            .array_size(self.a.len(), bytes)
            .execution(self.times, rayon::current_num_threads())
            .timing("", &stats)
            .bandwidth("", 2 * bytes, &stats)
            .set_validation(ValidationStatus::from_passed(valid));
        report
    }
}

/// `c = a + 3·b` 반복
pub struct TriadDriver {
    prog_name: String,
    times: u64,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
}

/// a = 1, b = 2일 때 Triad 결과
const TRIAD_EXPECTED: f64 = 7.0;

impl TriadDriver {
    pub fn new(prog_name: String, array_size: usize, times: u64) -> Self {
        Self {
            prog_name,
            times,
            a: stream::filled(array_size, 1.0),
            b: stream::filled(array_size, 2.0),
            c: stream::filled(array_size, 0.0),
        }
    }
}

impl Driver for TriadDriver {
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport {
        stream::triad(&mut self.c, &self.a, &self.b, STREAM_SCALAR);
        sink.report(1.0);

        let mut stats = TimingStats::new();
        for _ in 0..self.times {
            timed(&mut stats, || {
                stream::triad(&mut self.c, &self.a, &self.b, STREAM_SCALAR)
            });
            sink.report(1.0);
        }

        let bytes = self.a.len() * std::mem::size_of::<f64>();
        let mismatch = check_all_relative(&self.c, VALIDATION_BITS, |_| TRIAD_EXPECTED);
        if let Some(i) = mismatch {
            debug!("Triad 검증 실패: c[{i}] = {}", self.c[i]);
        }

        let mut report = BenchReport::new(
            self.prog_name.clone(),
            "one progress per iteration, Triad benchmark",
        );
        report
            .array_size(self.a.len(), bytes)
            .execution(self.times, rayon::current_num_threads())
            .timing("", &stats)
            .bandwidth("", 3 * bytes, &stats)
            .set_validation(ValidationStatus::from_passed(mismatch.is_none()));
        report
    }
}

/// 네 연산을 각각 측정하는 STREAM
pub struct StreamDriver {
    prog_name: String,
    times: u64,
    arrays: StreamArrays,
}

impl StreamDriver {
    pub fn new(prog_name: String, array_size: usize, times: u64) -> Self {
        Self {
            prog_name,
            times,
            arrays: StreamArrays::new(array_size),
        }
    }

    fn validate(&self) -> bool {
        // 워밍업 1회 + 측정 times회
        let passes = usize::try_from(self.times).map_or(usize::MAX, |t| t.saturating_add(1));
        let (a, b, c) = expected_after(passes, STREAM_SCALAR);
        let arrays = &self.arrays;
        (0..arrays.len()).all(|i| {
            check_relative(a, arrays.a[i], VALIDATION_BITS)
                && check_relative(b, arrays.b[i], VALIDATION_BITS)
                && check_relative(c, arrays.c[i], VALIDATION_BITS)
        })
    }
}

impl Driver for StreamDriver {
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport {
        let progress_start = Timestamp::now();

        self.arrays.full_pass();
        sink.report(1.0);

        let mut stats = [TimingStats::new(); 4];
        for _ in 0..self.times {
            for (op, op_stats) in StreamOp::ALL.into_iter().zip(stats.iter_mut()) {
                timed(op_stats, || self.arrays.run(op));
            }
            sink.report(1.0);
        }
        let progress_time = diff(&progress_start, &Timestamp::now());

        let bytes = self.arrays.bytes_per_array();
        let mut report = BenchReport::new(
            self.prog_name.clone(),
            "one progress per iteration, Stream benchmark",
        );
        report
            .array_size(self.arrays.len(), bytes)
            .execution(self.times, rayon::current_num_threads())
            .field("Progress Time (ns)", progress_time);
        for (op, op_stats) in StreamOp::ALL.into_iter().zip(stats.iter()) {
            let prefix = format!("{} ", op.name());
            report
                .timing(&prefix, op_stats)
                .bandwidth(&prefix, op.arrays_touched() * bytes, op_stats);
        }
        report.set_validation(ValidationStatus::from_passed(self.validate()));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrmb_core::ports::progress::RecordingSink;

    #[test]
    fn copy_reports_warmup_and_each_iteration() {
        let mut driver = CopyDriver::new("nrmb-copy".to_string(), 4_096, 3);
        let mut sink = RecordingSink::new();
        let report = driver.run(&mut sink);

        assert_eq!(sink.reports().len(), 4);
        assert_eq!(report.validation(), ValidationStatus::Passed);
        assert!(report.lines().iter().any(|l| l.starts_with("Perf (MiB/s)")));
    }

    #[test]
    fn triad_validates() {
        let mut driver = TriadDriver::new("nrmb-triad".to_string(), 4_096, 2);
        let mut sink = RecordingSink::new();
        let report = driver.run(&mut sink);

        assert_eq!(sink.total(), 3.0);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn stream_times_each_operation() {
        let mut driver = StreamDriver::new("nrmb-stream".to_string(), 2_048, 4);
        let mut sink = RecordingSink::new();
        let report = driver.run(&mut sink);

        assert_eq!(sink.reports().len(), 5);
        assert_eq!(report.validation(), ValidationStatus::Passed);
        for op in StreamOp::ALL {
            let prefix = format!("{} Time (s)", op.name());
            assert!(report.lines().iter().any(|l| l.starts_with(&prefix)));
        }
        assert!(report
            .lines()
            .iter()
            .any(|l| l.starts_with("Progress Time (ns):")));
    }

    #[test]
    fn progress_time_spans_every_report() {
        let mut driver = StreamDriver::new("nrmb-stream".to_string(), 2_048, 3);
        let mut sink = RecordingSink::new();
        let report = driver.run(&mut sink);

        let progress_time: i64 = report
            .lines()
            .iter()
            .find_map(|l| l.strip_prefix("Progress Time (ns):"))
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let reports = sink.reports();
        let first = reports.first().unwrap().0;
        let last = reports.last().unwrap().0;
        assert!(progress_time >= diff(&first, &last));
    }

    #[test]
    fn stream_detects_corruption() {
        let mut driver = StreamDriver::new("nrmb-stream".to_string(), 64, 1);
        let mut sink = RecordingSink::new();
        driver.run(&mut sink);
        driver.arrays.b[10] = -1.0;
        assert!(!driver.validate());
    }
}
