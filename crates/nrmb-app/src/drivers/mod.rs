//! 벤치마크 드라이버.
//!
//! 각 드라이버는 두 단계로 실행된다.
//! 1. [`Benchmark::prepare`]: 파라미터 검증 + 데이터 할당/초기화 (세션 열기 전)
//! 2. [`Driver::run`]: 워밍업 → 측정 반복 → 진행 보고 → [`BenchReport`] 생성

mod npb;
mod solver;
mod stream;

pub use npb::{EpDriver, IsDriver};
pub use solver::{BicgstabDriver, CgDriver};
pub use stream::{CopyDriver, StreamDriver, TriadDriver};

use clap::Subcommand;
use nrmb_core::ports::progress::ProgressSink;
use nrmb_core::time::{Timestamp, TimingStats};
use nrmb_kernels::error::KernelError;
use nrmb_kernels::linalg::Conditioning;

use crate::report::BenchReport;

/// 준비가 끝난 벤치마크
pub trait Driver {
    /// 벤치마크 실행. 진행량은 `sink`로 보고한다.
    fn run(&mut self, sink: &mut dyn ProgressSink) -> BenchReport;
}

/// 실행할 벤치마크와 인자
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Benchmark {
    /// STREAM Copy (`b = a`)
    Copy {
        /// 배열 원소 수
        array_size: usize,
        /// 측정 반복 횟수
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        times: u64,
    },

    /// STREAM Triad (`c = a + 3·b`)
    Triad {
        /// 배열 원소 수
        array_size: usize,
        /// 측정 반복 횟수
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        times: u64,
    },

    /// STREAM 네 연산 (Copy, Scale, Add, Triad)
    Stream {
        /// 배열 원소 수
        array_size: usize,
        /// 측정 반복 횟수
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        times: u64,
    },

    /// 켤레 기울기법
    Cg {
        /// 행렬 크기 n
        n: usize,
        /// 행렬 조건 (good | poor)
        conditioning: Conditioning,
        /// 반복마다 오차 출력
        #[arg(long)]
        log: bool,
    },

    /// BiCGStab
    Bicgstab {
        /// 행렬 크기 n
        n: usize,
        /// 행렬 조건 (good | poor)
        conditioning: Conditioning,
        /// 수렴 기준 자릿수 (`10^-criteria`)
        criteria: u32,
        /// 반복마다 오차 출력
        #[arg(long)]
        log: bool,
    },

    /// NAS EP
    Ep {
        /// 문제 크기 m (`2^m`쌍)
        m: u32,
        /// 측정 반복 횟수
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        times: u64,
    },

    /// NAS IS
    Is {
        /// 문제 크기 T (`2^T`개 키)
        t: u32,
        /// 측정 반복 횟수
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        times: u64,
    },
}

impl Benchmark {
    /// 서브커맨드 이름
    pub fn name(&self) -> &'static str {
        match self {
            Benchmark::Copy { .. } => "copy",
            Benchmark::Triad { .. } => "triad",
            Benchmark::Stream { .. } => "stream",
            Benchmark::Cg { .. } => "cg",
            Benchmark::Bicgstab { .. } => "bicgstab",
            Benchmark::Ep { .. } => "ep",
            Benchmark::Is { .. } => "is",
        }
    }

    /// 세션 이름 겸 보고서 첫 줄
    pub fn prog_name(&self) -> String {
        format!("nrmb-{}", self.name())
    }

    /// 파라미터 검증과 데이터 초기화. 현재 rayon 풀에서 병렬로 할당한다.
    pub fn prepare(&self) -> Result<Box<dyn Driver>, KernelError> {
        let prog_name = self.prog_name();
        let driver: Box<dyn Driver> = match *self {
            Benchmark::Copy { array_size, times } => {
                Box::new(CopyDriver::new(prog_name, array_size, times))
            }
            Benchmark::Triad { array_size, times } => {
                Box::new(TriadDriver::new(prog_name, array_size, times))
            }
            Benchmark::Stream { array_size, times } => {
                Box::new(StreamDriver::new(prog_name, array_size, times))
            }
            Benchmark::Cg {
                n,
                conditioning,
                log,
            } => Box::new(CgDriver::new(prog_name, n, conditioning, log)),
            Benchmark::Bicgstab {
                n,
                conditioning,
                criteria,
                log,
            } => Box::new(BicgstabDriver::new(
                prog_name,
                n,
                conditioning,
                criteria,
                log,
            )),
            Benchmark::Ep { m, times } => Box::new(EpDriver::new(prog_name, m, times)?),
            Benchmark::Is { t, times } => Box::new(IsDriver::new(prog_name, t, times)?),
        };
        Ok(driver)
    }
}

/// `work` 한 번의 소요 시간을 `stats`에 기록
fn timed<T>(stats: &mut TimingStats, work: impl FnOnce() -> T) -> T {
    let start = Timestamp::now();
    let out = work();
    let end = Timestamp::now();
    stats.record_span(&start, &end);
    out
}
