//! NAS IS (Integer Sort).
//!
//! `2^T`개의 정수 키(범위 `0..2^(T-4)`)를 만들고, 키마다 "자기 이하인 키의 수"를
//! 계산한다. 키 청크별 로컬 버킷 정렬 → 버킷별 병렬 순위 계산의 두 단계로 나눈다.

use rayon::prelude::*;
use tracing::debug;

use super::random::{find_my_seed, randlc, NAS_MULTIPLIER};
use crate::error::KernelError;

/// 키 생성 시드
pub const IS_SEED: f64 = 314_159_265.0;
/// 반복마다 수정하는 키 위치 수
pub const MAX_ITERATIONS: usize = 10;
/// 버킷 수 로그
pub const NUM_BUCKETS_LOG2: u32 = 10;

/// 허용 최소 T (`max_key_log2 >= NUM_BUCKETS_LOG2`)
pub const MIN_T: u32 = NUM_BUCKETS_LOG2 + 4;
/// 허용 최대 T (32비트 키/순위 범위)
pub const MAX_T: u32 = 26;

/// 검증 시 전수 비교할 샘플 키 수
const VERIFY_SAMPLES: usize = 16;

/// 키 청크 하나의 로컬 버킷 정렬 결과
#[derive(Debug, Clone, Default)]
struct LocalBuckets {
    /// 버킷 b의 키는 `keys[offsets[b]..offsets[b+1]]`
    offsets: Vec<usize>,
    keys: Vec<u32>,
}

impl LocalBuckets {
    fn fill(&mut self, chunk: &[u32], shift: u32, num_buckets: usize) {
        self.offsets.clear();
        self.offsets.resize(num_buckets + 1, 0);
        for &key in chunk {
            self.offsets[(key >> shift) as usize + 1] += 1;
        }
        for b in 0..num_buckets {
            self.offsets[b + 1] += self.offsets[b];
        }

        self.keys.clear();
        self.keys.resize(chunk.len(), 0);
        let mut cursor = self.offsets.clone();
        for &key in chunk {
            let slot = &mut cursor[(key >> shift) as usize];
            self.keys[*slot] = key;
            *slot += 1;
        }
    }

    fn bucket(&self, b: usize) -> &[u32] {
        &self.keys[self.offsets[b]..self.offsets[b + 1]]
    }

    fn bucket_len(&self, b: usize) -> usize {
        self.offsets[b + 1] - self.offsets[b]
    }
}

/// 문제 크기 T의 IS 인스턴스
#[derive(Debug, Clone)]
pub struct IntegerSort {
    total_keys_log2: u32,
    max_key_log2: u32,
    keys: Vec<u32>,
    /// `ranks[k]` = k 이하인 키의 수
    ranks: Vec<u32>,
    chunk_len: usize,
    locals: Vec<LocalBuckets>,
}

impl IntegerSort {
    /// `MIN_T <= t <= MAX_T`. 키 생성 전 상태로 만든다.
    pub fn new(t: u32) -> Result<Self, KernelError> {
        if !(MIN_T..=MAX_T).contains(&t) {
            return Err(KernelError::InvalidParameter {
                name: "t",
                reason: format!("{MIN_T} 이상 {MAX_T} 이하여야 함 (입력 {t})"),
            });
        }

        let num_keys = 1usize << t;
        let max_key_log2 = t - 4;
        let workers = rayon::current_num_threads().max(1);
        let chunk_len = num_keys.div_ceil(workers);
        let chunks = num_keys.div_ceil(chunk_len);

        Ok(Self {
            total_keys_log2: t,
            max_key_log2,
            keys: vec![0; num_keys],
            ranks: vec![0; 1usize << max_key_log2],
            chunk_len,
            locals: vec![LocalBuckets::default(); chunks],
        })
    }

    pub fn total_keys_log2(&self) -> u32 {
        self.total_keys_log2
    }

    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn max_key(&self) -> u32 {
        1 << self.max_key_log2
    }

    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn ranks(&self) -> &[u32] {
        &self.ranks
    }

    /// 현재 풀 크기만큼의 구간으로 나눠 키 생성
    pub fn generate_keys(&mut self) {
        let parts = rayon::current_num_threads().max(1);
        let max_key = self.max_key();
        create_keys(&mut self.keys, max_key, parts);
    }

    /// 한 번의 순위 계산. `iteration`은 `1..=MAX_ITERATIONS`로 순환한다.
    pub fn rank(&mut self, iteration: usize) {
        let iteration = iteration % MAX_ITERATIONS + 1;
        let max_key = self.max_key();
        self.keys[iteration] = iteration as u32;
        self.keys[iteration + MAX_ITERATIONS] = max_key - iteration as u32;

        let shift = self.max_key_log2 - NUM_BUCKETS_LOG2;
        let num_buckets = 1usize << NUM_BUCKETS_LOG2;
        let bucket_width = 1usize << shift;

        // 1단계: 청크별 로컬 버킷 정렬
        self.locals
            .par_iter_mut()
            .zip(self.keys.par_chunks(self.chunk_len))
            .for_each(|(local, chunk)| local.fill(chunk, shift, num_buckets));

        // 버킷 b 앞에 오는 전체 키 수
        let mut bucket_start = vec![0usize; num_buckets + 1];
        for b in 0..num_buckets {
            let in_bucket: usize = self.locals.iter().map(|l| l.bucket_len(b)).sum();
            bucket_start[b + 1] = bucket_start[b] + in_bucket;
        }

        // 2단계: 버킷별 병렬 순위 계산
        let locals = &self.locals;
        self.ranks
            .par_chunks_mut(bucket_width)
            .enumerate()
            .for_each(|(b, ranks)| {
                ranks.fill(0);
                let base = b * bucket_width;
                for local in locals {
                    for &key in local.bucket(b) {
                        ranks[key as usize - base] += 1;
                    }
                }
                ranks[0] += bucket_start[b] as u32;
                for k in 1..ranks.len() {
                    ranks[k] += ranks[k - 1];
                }
            });

        debug!(iteration, keys = self.keys.len(), "IS 순위 계산 완료");
    }

    /// 순위 검증: 단조 증가, 마지막 = 키 수, 샘플 키의 전수 비교
    pub fn verify(&self) -> Result<(), KernelError> {
        if let Some(pos) = self.ranks.windows(2).position(|w| w[1] < w[0]) {
            return Err(KernelError::Verification(format!(
                "순위 감소: ranks[{pos}]={} > ranks[{}]={}",
                self.ranks[pos],
                pos + 1,
                self.ranks[pos + 1]
            )));
        }

        let last = self.ranks.last().copied().unwrap_or(0) as usize;
        if last != self.num_keys() {
            return Err(KernelError::Verification(format!(
                "전체 순위 {last} ≠ 키 수 {}",
                self.num_keys()
            )));
        }

        let stride = (self.ranks.len() / VERIFY_SAMPLES).max(1);
        for sample in (0..self.ranks.len()).step_by(stride) {
            let limit = sample as u32;
            let expected = self.keys.par_iter().filter(|&&k| k <= limit).count();
            if self.ranks[sample] as usize != expected {
                return Err(KernelError::Verification(format!(
                    "키 {sample}: 순위 {} ≠ 전수 {expected}",
                    self.ranks[sample]
                )));
            }
        }
        Ok(())
    }
}

/// `parts`개 구간으로 나눠 키 병렬 생성
///
/// 키 i는 전체 난수열의 4i+1..=4i+4번째 값을 쓰므로 결과는 `parts`와 무관하다.
pub fn create_keys(keys: &mut [u32], max_key: u32, parts: usize) {
    let num_keys = keys.len();
    if num_keys == 0 {
        return;
    }
    let parts = parts.clamp(1, num_keys);
    let chunk_len = num_keys.div_ceil(parts);
    let scale = f64::from(max_key / 4);

    keys.par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(part, chunk)| {
            let mut seed = find_my_seed(part, parts, 4 * num_keys as u64, IS_SEED, NAS_MULTIPLIER);
            for key in chunk.iter_mut() {
                let mut x = randlc(&mut seed, NAS_MULTIPLIER);
                x += randlc(&mut seed, NAS_MULTIPLIER);
                x += randlc(&mut seed, NAS_MULTIPLIER);
                x += randlc(&mut seed, NAS_MULTIPLIER);
                *key = (scale * x) as u32;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_t() {
        assert!(IntegerSort::new(MIN_T - 1).is_err());
        assert!(IntegerSort::new(27).is_err());
        assert!(IntegerSort::new(MIN_T).is_ok());
    }

    #[test]
    fn keys_independent_of_partition() {
        let max_key = 1 << 12;
        let mut single = vec![0u32; 1 << 16];
        let mut split = vec![0u32; 1 << 16];
        create_keys(&mut single, max_key, 1);
        create_keys(&mut split, max_key, 4);

        assert_eq!(single, split);
        assert!(single.iter().all(|&k| k < max_key));
    }

    #[test]
    fn generated_keys_match_single_partition() {
        let mut is = IntegerSort::new(MIN_T).unwrap();
        is.generate_keys();

        let mut expected = vec![0u32; is.num_keys()];
        create_keys(&mut expected, is.max_key(), 1);
        assert_eq!(is.keys(), expected.as_slice());
    }

    #[test]
    fn ranks_verify_after_each_iteration() {
        let mut is = IntegerSort::new(16).unwrap();
        is.generate_keys();

        for iteration in 0..3 {
            is.rank(iteration);
            is.verify().unwrap();
        }
        assert_eq!(*is.ranks().last().unwrap() as usize, is.num_keys());
    }

    #[test]
    fn iteration_zero_stays_in_range() {
        let mut is = IntegerSort::new(MIN_T).unwrap();
        is.generate_keys();
        is.rank(0);
        assert_eq!(is.keys()[1], 1);
        assert_eq!(is.keys()[1 + MAX_ITERATIONS], is.max_key() - 1);
        is.verify().unwrap();
    }

    #[test]
    fn corrupted_ranks_fail_verification() {
        let mut is = IntegerSort::new(MIN_T).unwrap();
        is.generate_keys();
        is.rank(1);
        let mid = is.ranks.len() / 2;
        is.ranks[mid] = 0;
        assert!(matches!(is.verify(), Err(KernelError::Verification(_))));
    }
}
