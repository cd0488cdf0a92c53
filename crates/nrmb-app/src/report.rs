//! 벤치마크 결과 보고서 (stdout 출력 형식).

use nrmb_core::time::TimingStats;
use std::fmt;

/// 라벨 열 너비 (`"NRM Benchmarks:      "`)
const LABEL_WIDTH: usize = 21;

const MIB: f64 = 1024.0 * 1024.0;

/// 결과 검증 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Passed,
    Failed,
    /// 검증하지 않음
    Disabled,
}

impl ValidationStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        }
    }

    /// 프로세스 종료 코드
    pub fn exit_code(self) -> i32 {
        match self {
            ValidationStatus::Failed => 1,
            ValidationStatus::Passed | ValidationStatus::Disabled => 0,
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Passed => write!(f, "VALIDATION PASSED!!!!"),
            ValidationStatus::Failed => write!(f, "VALIDATION FAILED!!!!"),
            ValidationStatus::Disabled => write!(f, "VALIDATION disabled"),
        }
    }
}

/// 드라이버 하나의 실행 결과
#[derive(Debug, Clone)]
pub struct BenchReport {
    prog_name: String,
    description: String,
    lines: Vec<String>,
    validation: ValidationStatus,
}

impl BenchReport {
    pub fn new(prog_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            prog_name: prog_name.into(),
            description: description.into(),
            lines: Vec::new(),
            validation: ValidationStatus::Disabled,
        }
    }

    /// `라벨:` 열을 맞춘 한 줄 추가
    pub fn field(&mut self, label: &str, value: impl fmt::Display) -> &mut Self {
        let label = format!("{label}:");
        self.lines.push(format!("{label:<width$}{value}", width = LABEL_WIDTH));
        self
    }

    /// 형식 그대로 한 줄 추가
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// 배열 원소 수와 배열당 메모리
    pub fn array_size(&mut self, elements: usize, bytes_per_array: usize) -> &mut Self {
        self.field("Array size", format!("{elements} (elements)."))
            .field(
                "Memory per array",
                format!("{:.1} MiB.", bytes_per_array as f64 / MIB),
            )
    }

    /// 실행 횟수와 스레드 수
    pub fn execution(&mut self, times: u64, threads: usize) -> &mut Self {
        self.field("Kernel was executed", format!("{times} times."))
            .field("Number of threads", threads)
    }

    /// 반복 시간 통계 (초)
    pub fn timing(&mut self, prefix: &str, stats: &TimingStats) -> &mut Self {
        self.line(format!(
            "{prefix}Time (s): avg: {:11.6} min: {:11.6} max: {:11.6}",
            stats.avg_secs(),
            stats.min_secs(),
            stats.max_secs()
        ))
    }

    /// 대역폭 (MiB/s). `bytes`는 반복 한 번이 옮기는 바이트 수.
    pub fn bandwidth(&mut self, prefix: &str, bytes: usize, stats: &TimingStats) -> &mut Self {
        let mib = bytes as f64 / MIB;
        let per_sec = |secs: f64| if secs > 0.0 { mib / secs } else { 0.0 };
        self.line(format!(
            "{prefix}Perf (MiB/s): avg: {:12.6} best: {:12.6}",
            per_sec(stats.avg_secs()),
            per_sec(stats.min_secs())
        ))
    }

    pub fn set_validation(&mut self, status: ValidationStatus) -> &mut Self {
        self.validation = status;
        self
    }

    pub fn prog_name(&self) -> &str {
        &self.prog_name
    }

    pub fn validation(&self) -> ValidationStatus {
        self.validation
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn exit_code(&self) -> i32 {
        self.validation.exit_code()
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<width$}{}", "NRM Benchmarks:", self.prog_name, width = LABEL_WIDTH)?;
        writeln!(f, "{:<width$}{}", "Version:", env!("CARGO_PKG_VERSION"), width = LABEL_WIDTH)?;
        writeln!(f, "Description: {}", self.description)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "{}", self.validation)
    }
}
