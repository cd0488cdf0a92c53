//! 레이트 리밋 진행 보고.
//!
//! 보고된 진행량을 누적하다가 마지막 flush 이후 윈도우가 지나면
//! 누적값 전체를 이벤트 하나로 내보낸다. 판단 로직은 시계를 주입받는
//! [`ProgressAccumulator`]에 있고, [`report`]는 세션에 현재 시각을 붙여 위임한다.

use nrmb_core::ports::progress::ProgressSink;
use nrmb_core::time::Timestamp;
use std::time::Duration;
use tracing::debug;

use crate::session::TelemetrySession;

/// 경과 시간이 윈도우와 정확히 같을 때의 flush 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushBoundary {
    /// `elapsed > window`일 때만 flush
    Exclusive,
    /// `elapsed >= window`일 때 flush
    Inclusive,
}

impl FlushBoundary {
    pub fn is_elapsed(self, elapsed: Duration, window: Duration) -> bool {
        match self {
            FlushBoundary::Exclusive => elapsed > window,
            FlushBoundary::Inclusive => elapsed >= window,
        }
    }
}

/// 세션이 사용하는 경계 규칙
pub const RATE_LIMIT_BOUNDARY: FlushBoundary = FlushBoundary::Exclusive;

/// 누적 + flush 판단 (순수 로직, 시계 주입)
#[derive(Debug, Clone)]
pub struct ProgressAccumulator {
    window: Duration,
    boundary: FlushBoundary,
    pending: f64,
    last_flush: Timestamp,
    flushes: u64,
    flushed_total: f64,
    ignored: u64,
}

impl ProgressAccumulator {
    /// `start`를 마지막 flush 시각으로 하는 빈 누적기
    pub fn new(window: Duration, start: Timestamp) -> Self {
        Self {
            window,
            boundary: RATE_LIMIT_BOUNDARY,
            pending: 0.0,
            last_flush: start,
            flushes: 0,
            flushed_total: 0.0,
            ignored: 0,
        }
    }

    pub fn with_boundary(mut self, boundary: FlushBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// 진행량 누적. flush 시점이면 내보낼 누적값 반환.
    ///
    /// 음수나 유한하지 않은 값은 상태를 바꾸지 않고 버린다.
    pub fn accumulate(&mut self, value: f64, now: Timestamp) -> Option<f64> {
        if !value.is_finite() || value < 0.0 {
            self.ignored += 1;
            debug!("잘못된 진행량 무시: {value}");
            return None;
        }

        self.pending += value;

        let elapsed = now.elapsed_since(&self.last_flush);
        if !self.boundary.is_elapsed(elapsed, self.window) {
            return None;
        }

        let flushed = self.take();
        self.last_flush = now;
        debug!(value = flushed, ?elapsed, "진행량 flush");
        Some(flushed)
    }

    /// 남은 누적값 회수 (0이면 `None`). 종료 시 마지막 flush에 사용.
    pub fn take_pending(&mut self) -> Option<f64> {
        if self.pending > 0.0 {
            Some(self.take())
        } else {
            None
        }
    }

    fn take(&mut self) -> f64 {
        let value = std::mem::take(&mut self.pending);
        self.flushes += 1;
        self.flushed_total += value;
        value
    }

    pub fn pending(&self) -> f64 {
        self.pending
    }

    pub fn last_flush(&self) -> Timestamp {
        self.last_flush
    }

    /// 지금까지 내보낸 flush 수
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// 지금까지 내보낸 값의 합
    pub fn flushed_total(&self) -> f64 {
        self.flushed_total
    }

    /// 무시된 보고 수
    pub fn ignored(&self) -> u64 {
        self.ignored
    }
}

/// 세션에 진행량 보고 (현재 시각 기준, 비차단)
pub fn report(session: &mut TelemetrySession, value: f64) {
    session.report(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    fn at(start: Timestamp, millis: u64) -> Timestamp {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn reports_inside_window_flush_once_at_120ms() {
        let start = Timestamp::from_parts(1_000, 0);
        let mut acc = ProgressAccumulator::new(WINDOW, start);

        let mut flushed = Vec::new();
        for millis in [0, 20, 40, 60, 80, 120] {
            if let Some(v) = acc.accumulate(1.0, at(start, millis)) {
                flushed.push((millis, v));
            }
        }

        assert_eq!(flushed, vec![(120, 6.0)]);
        assert_eq!(acc.pending(), 0.0);
        assert_eq!(acc.last_flush(), at(start, 120));
    }

    #[test]
    fn exactly_window_does_not_flush() {
        let start = Timestamp::from_parts(1_000, 0);
        let mut acc = ProgressAccumulator::new(WINDOW, start);

        assert_eq!(acc.accumulate(1.0, at(start, 100)), None);
        assert_eq!(acc.pending(), 1.0);
    }

    #[test]
    fn inclusive_boundary_flushes_at_window() {
        let start = Timestamp::from_parts(1_000, 0);
        let mut acc =
            ProgressAccumulator::new(WINDOW, start).with_boundary(FlushBoundary::Inclusive);

        assert_eq!(acc.accumulate(1.0, at(start, 100)), Some(1.0));
    }

    #[test]
    fn many_reports_in_window_collapse_to_one() {
        let start = Timestamp::from_parts(0, 0);
        let mut acc = ProgressAccumulator::new(WINDOW, start);

        let n = 50;
        let mut flushes = Vec::new();
        for i in 0..n {
            if let Some(v) = acc.accumulate(2.5, at(start, i)) {
                flushes.push(v);
            }
        }
        assert!(flushes.is_empty());
        assert_eq!(acc.take_pending(), Some(2.5 * n as f64));
        assert_eq!(acc.take_pending(), None);
    }

    #[test]
    fn spaced_reports_flush_individually() {
        let start = Timestamp::from_parts(0, 0);
        let mut acc = ProgressAccumulator::new(WINDOW, start);

        assert_eq!(acc.accumulate(3.0, at(start, 150)), Some(3.0));
        assert_eq!(acc.accumulate(4.0, at(start, 300)), Some(4.0));
        assert_eq!(acc.accumulate(5.0, at(start, 450)), Some(5.0));
        assert_eq!(acc.flushes(), 3);
        assert_eq!(acc.flushed_total(), 12.0);
    }

    #[test]
    fn invalid_increments_ignored() {
        let start = Timestamp::from_parts(0, 0);
        let mut acc = ProgressAccumulator::new(WINDOW, start);

        assert_eq!(acc.accumulate(-1.0, at(start, 500)), None);
        assert_eq!(acc.accumulate(f64::NAN, at(start, 500)), None);
        assert_eq!(acc.accumulate(f64::INFINITY, at(start, 500)), None);
        assert_eq!(acc.pending(), 0.0);
        assert_eq!(acc.ignored(), 3);
        assert_eq!(acc.last_flush(), start);
    }

    #[test]
    fn clock_going_backwards_never_flushes() {
        let start = Timestamp::from_parts(10, 0);
        let mut acc = ProgressAccumulator::new(WINDOW, start);

        assert_eq!(acc.accumulate(1.0, Timestamp::from_parts(5, 0)), None);
        assert_eq!(acc.pending(), 1.0);
    }

    #[test]
    fn zero_pending_is_not_taken() {
        let mut acc = ProgressAccumulator::new(WINDOW, Timestamp::from_parts(0, 0));
        assert_eq!(acc.take_pending(), None);
        assert_eq!(acc.flushes(), 0);
    }
}
