//! NAS EP (Embarrassingly Parallel).
//!
//! `2^m`쌍의 균등 난수로 가우시안 편차를 만들고(acceptance-rejection),
//! 편차 절대값의 합과 정사각 환형 구간별 개수를 집계한다.
//! `2^MK`쌍 단위 배치 `2^(m-MK)`개가 서로 독립이라 배치 단위로 병렬화한다.

use nrmb_core::check::check_precision;
use rayon::prelude::*;
use tracing::debug;

use super::random::{randlc, vranlc, NAS_MULTIPLIER};
use crate::error::KernelError;

/// 배치 크기 로그 (배치당 `2^MK`쌍)
pub const MK: u32 = 16;
/// 배치당 쌍 수
pub const NK: usize = 1 << MK;
/// 환형 구간 수
pub const NQ: usize = 10;
/// 난수 시드
pub const EP_SEED: f64 = 271_828_183.0;
/// 참조값 비교 epsilon
pub const EP_EPSILON: f64 = 1e-8;

/// 허용 최대 m
const MAX_M: u32 = 60;

/// 배치/전체 집계
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpTally {
    /// |X| 합
    pub sx: f64,
    /// |Y| 합
    pub sy: f64,
    /// 구간별 개수
    pub q: [f64; NQ],
}

impl Default for EpTally {
    fn default() -> Self {
        Self {
            sx: 0.0,
            sy: 0.0,
            q: [0.0; NQ],
        }
    }
}

impl EpTally {
    fn merge(mut self, other: EpTally) -> EpTally {
        self.sx += other.sx;
        self.sy += other.sy;
        for (q, o) in self.q.iter_mut().zip(other.q) {
            *q += o;
        }
        self
    }

    /// 생성된 가우시안 쌍 수
    pub fn gaussian_pairs(&self) -> f64 {
        self.q.iter().sum()
    }
}

/// 문제 크기 m의 EP 인스턴스
#[derive(Debug, Clone)]
pub struct EmbarrassinglyParallel {
    m: u32,
    batches: usize,
    an: f64,
}

impl EmbarrassinglyParallel {
    /// `MK <= m <= 60`
    pub fn new(m: u32) -> Result<Self, KernelError> {
        if !(MK..=MAX_M).contains(&m) {
            return Err(KernelError::InvalidParameter {
                name: "m",
                reason: format!("{MK} 이상 {MAX_M} 이하여야 함 (입력 {m})"),
            });
        }

        // an = a^(2^(MK+1)) mod 2^46: 배치 하나가 소비하는 2·NK개 난수만큼 건너뛰는 곱수
        let mut an = NAS_MULTIPLIER;
        for _ in 0..=MK {
            let square = an;
            randlc(&mut an, square);
        }

        Ok(Self {
            m,
            batches: 1usize << (m - MK),
            an,
        })
    }

    pub fn m(&self) -> u32 {
        self.m
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// 전체 배치를 병렬 실행. 호출마다 새 집계를 반환한다.
    pub fn run(&self) -> EpTally {
        let tally = (0..self.batches)
            .into_par_iter()
            .map_init(
                || vec![0.0; 2 * NK],
                |buffer, batch| self.run_batch(batch, buffer),
            )
            .reduce(EpTally::default, EpTally::merge);

        debug!(
            m = self.m,
            pairs = tally.gaussian_pairs(),
            "EP 실행 완료"
        );
        tally
    }

    fn run_batch(&self, batch: usize, x: &mut [f64]) -> EpTally {
        // 이 배치의 시작 시드: seed · an^batch
        let mut t1 = EP_SEED;
        let mut t2 = self.an;
        let mut kk = batch;
        while kk > 0 {
            let ik = kk / 2;
            if 2 * ik != kk {
                randlc(&mut t1, t2);
            }
            if ik == 0 {
                break;
            }
            let square = t2;
            randlc(&mut t2, square);
            kk = ik;
        }

        vranlc(&mut t1, NAS_MULTIPLIER, x);

        let mut tally = EpTally::default();
        for pair in x.chunks_exact(2) {
            let x1 = 2.0 * pair[0] - 1.0;
            let x2 = 2.0 * pair[1] - 1.0;
            let t = x1 * x1 + x2 * x2;
            if t <= 1.0 {
                let factor = (-2.0 * t.ln() / t).sqrt();
                let gx = (x1 * factor).abs();
                let gy = (x2 * factor).abs();
                if let Some(count) = tally.q.get_mut(gx.max(gy) as usize) {
                    *count += 1.0;
                }
                tally.sx += gx;
                tally.sy += gy;
            }
        }
        tally
    }
}

/// NAS 참조 (sx, sy). 참조값이 없는 m은 `None`.
pub fn reference_sums(m: u32) -> Option<(f64, f64)> {
    let sums = match m {
        24 => (1.051299420395306e07, 1.051517131857535e07),
        25 => (2.102505525182392e07, 2.103162209578822e07),
        28 => (1.682235632304711e08, 1.682195123368299e08),
        30 => (6.728927543423024e08, 6.728951822504275e08),
        32 => (2.691444083862931e09, 2.691519118724585e09),
        36 => (4.306350280812112e10, 4.306347571859157e10),
        40 => (6.890169663167274e11, 6.890164670688535e11),
        44 => (1.102426773788175e13, 1.102426773787993e13),
        _ => return None,
    };
    Some(sums)
}

/// 참조값과 비교. 참조가 없으면 `None`.
pub fn verify(m: u32, tally: &EpTally) -> Option<bool> {
    reference_sums(m).map(|(sx, sy)| {
        check_precision(sx, tally.sx, EP_EPSILON) && check_precision(sy, tally.sy, EP_EPSILON)
    })
}
