//! 타임스탬프 캡처와 구간 측정.
//!
//! 벽시계(realtime) 기준 초 + 나노초 쌍을 캡처하고, 두 시점의 차이를 부호 있는 나노초로 계산한다.
//! 진행 이벤트의 타임스탬프와 드라이버의 반복별 시간 측정이 모두 이 타입을 쓴다.

use chrono::Utc;
use std::ops::Add;
use std::time::Duration;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// 초 + 나노초 시점. `nanos`는 항상 `0..1_000_000_000` 범위로 정규화된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    secs: i64,
    nanos: i64,
}

impl Timestamp {
    /// 현재 벽시계 시각 캡처
    pub fn now() -> Self {
        let now = Utc::now();
        Self::from_parts(now.timestamp(), i64::from(now.timestamp_subsec_nanos()))
    }

    /// 초/나노초로 생성 (나노초 초과분은 초로 올림)
    pub fn from_parts(secs: i64, nanos: i64) -> Self {
        Self {
            secs: secs + nanos.div_euclid(NANOS_PER_SEC),
            nanos: nanos.rem_euclid(NANOS_PER_SEC),
        }
    }

    /// epoch 기준 나노초로 생성
    pub fn from_nanos(nanos: i64) -> Self {
        Self::from_parts(0, nanos)
    }

    /// epoch 기준 나노초 (wire 포맷)
    pub fn as_nanos(&self) -> i64 {
        self.secs * NANOS_PER_SEC + self.nanos
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn subsec_nanos(&self) -> i64 {
        self.nanos
    }

    /// `earlier` 이후 경과 시간. 시계가 역행했으면 0.
    pub fn elapsed_since(&self, earlier: &Timestamp) -> Duration {
        let nanos = diff(earlier, self);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        let secs = i64::try_from(rhs.as_secs()).unwrap_or(i64::MAX - self.secs);
        Timestamp::from_parts(self.secs + secs, self.nanos + i64::from(rhs.subsec_nanos()))
    }
}

/// `end - start` 나노초. 오용(역순 인자) 시에만 음수.
pub fn diff(start: &Timestamp, end: &Timestamp) -> i64 {
    (end.secs - start.secs) * NANOS_PER_SEC + (end.nanos - start.nanos)
}

// ============================================================
// 반복 시간 통계
// ============================================================

/// 반복별 측정 시간 누적기 (합계/최소/최대, 나노초)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingStats {
    sum: i64,
    min: i64,
    max: i64,
    count: u64,
}

impl Default for TimingStats {
    fn default() -> Self {
        Self {
            sum: 0,
            min: i64::MAX,
            max: 0,
            count: 0,
        }
    }
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 한 반복의 소요 시간(ns) 기록
    pub fn record(&mut self, nanos: i64) {
        self.sum += nanos;
        self.min = self.min.min(nanos);
        self.max = self.max.max(nanos);
        self.count += 1;
    }

    /// `start`..`end` 구간을 기록하고 소요 나노초 반환
    pub fn record_span(&mut self, start: &Timestamp, end: &Timestamp) -> i64 {
        let nanos = diff(start, end);
        self.record(nanos);
        nanos
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total_nanos(&self) -> i64 {
        self.sum
    }

    pub fn avg_secs(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64 / NANOS_PER_SEC as f64
    }

    pub fn min_secs(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.min as f64 / NANOS_PER_SEC as f64
    }

    pub fn max_secs(&self) -> f64 {
        self.max as f64 / NANOS_PER_SEC as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_of_same_instant_is_zero() {
        let t = Timestamp::now();
        assert_eq!(diff(&t, &t), 0);
    }

    #[test]
    fn diff_is_antisymmetric() {
        let a = Timestamp::from_parts(10, 900_000_000);
        let b = Timestamp::from_parts(12, 100_000_000);
        assert_eq!(diff(&a, &b), 1_200_000_000);
        assert_eq!(diff(&a, &b), -diff(&b, &a));
    }

    #[test]
    fn diff_handles_nanosecond_borrow() {
        let start = Timestamp::from_parts(5, 999_999_999);
        let end = Timestamp::from_parts(6, 1);
        assert_eq!(diff(&start, &end), 2);
    }

    #[test]
    fn from_parts_normalizes() {
        let t = Timestamp::from_parts(1, 2_500_000_000);
        assert_eq!(t.secs(), 3);
        assert_eq!(t.subsec_nanos(), 500_000_000);

        let t = Timestamp::from_parts(1, -1);
        assert_eq!(t.secs(), 0);
        assert_eq!(t.subsec_nanos(), 999_999_999);
    }

    #[test]
    fn elapsed_since_saturates() {
        let early = Timestamp::from_nanos(1_000);
        let late = Timestamp::from_nanos(5_000);
        assert_eq!(late.elapsed_since(&early), Duration::from_nanos(4_000));
        assert_eq!(early.elapsed_since(&late), Duration::ZERO);
    }

    #[test]
    fn add_duration_carries() {
        let t = Timestamp::from_parts(1, 900_000_000) + Duration::from_millis(200);
        assert_eq!(t, Timestamp::from_parts(2, 100_000_000));
    }

    #[test]
    fn now_is_monotone_enough() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(diff(&a, &b) >= 0);
    }

    #[test]
    fn timing_stats_tracks_extremes() {
        let mut stats = TimingStats::new();
        stats.record(2_000_000_000);
        stats.record(1_000_000_000);
        stats.record(3_000_000_000);

        assert_eq!(stats.count(), 3);
        assert_eq!(stats.total_nanos(), 6_000_000_000);
        assert!((stats.avg_secs() - 2.0).abs() < 1e-12);
        assert!((stats.min_secs() - 1.0).abs() < 1e-12);
        assert!((stats.max_secs() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_stats_report_zero() {
        let stats = TimingStats::default();
        assert_eq!(stats.avg_secs(), 0.0);
        assert_eq!(stats.min_secs(), 0.0);
    }
}
