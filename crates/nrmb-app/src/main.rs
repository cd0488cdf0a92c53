//! # nrmb
//!
//! NRM 벤치마크 바이너리 진입점.
//! rayon 풀 구성 → 커널 준비 → 텔레메트리 세션 → 실행 → 결과 출력.

use anyhow::{bail, Context, Result};
use clap::Parser;
use nrmb_app::drivers::Benchmark;
use nrmb_app::telemetry;
use nrmb_core::config::BenchConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// NRM 진행 보고 벤치마크
///
/// 커널을 실행하며 진행량을 NRM 데몬에 보고한다
#[derive(Parser, Debug)]
#[command(name = "nrmb")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (JSON)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 커널 스레드 수 (기본: rayon 기본값)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    bench: Benchmark,
}

/// 전역 rayon 풀 구성 후 실제 스레드 수 확인
fn configure_pool(threads: Option<usize>) -> Result<usize> {
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("nrmb-kernel-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build_global()
        .context("rayon 스레드 풀 초기화 실패")?;

    check_thread_count(
        threads,
        rayon::current_num_threads(),
        rayon::broadcast(|_| ()).len(),
    )
}

/// 풀이 보고한 스레드 수, 실제 참여 스레드 수, 요청값 비교
///
/// 요청값 0은 rayon 기본값을 뜻하므로 비교하지 않는다.
fn check_thread_count(requested: Option<usize>, reported: usize, joined: usize) -> Result<usize> {
    if reported != joined {
        bail!("스레드 수 불일치: 풀 {reported}, 실제 참여 {joined}");
    }
    if let Some(n) = requested.filter(|&n| n > 0 && n != reported) {
        bail!("요청한 스레드 수 {n}와 풀 크기 {reported}가 다름");
    }
    Ok(reported)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // stdout은 결과 보고서 전용
    let log_filter = format!(
        "nrmb={lvl},nrmb_app={lvl},nrmb_core={lvl},nrmb_network={lvl},nrmb_progress={lvl},nrmb_kernels={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = BenchConfig::load(args.config.as_deref()).context("설정 로드 실패")?;
    let threads = configure_pool(args.threads)?;
    info!(bench = args.bench.name(), threads, "벤치마크 준비");

    let mut driver = args.bench.prepare().context("벤치마크 파라미터 오류")?;

    let runtime = telemetry::build_runtime()?;
    let mut session = telemetry::open_session(&runtime, &config, &args.bench.prog_name())?;

    let report = driver.run(&mut session);

    let summary = telemetry::close_session(&runtime, session);
    if summary.dispatch.failed > 0 || summary.dispatch.dropped > 0 {
        warn!(
            failed = summary.dispatch.failed,
            dropped = summary.dispatch.dropped,
            "일부 진행 이벤트 전송 실패"
        );
    }

    print!("{report}");
    Ok(ExitCode::from(u8::try_from(report.exit_code()).unwrap_or(1)))
}
