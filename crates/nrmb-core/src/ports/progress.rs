//! 진행 보고 포트.
//!
//! 커널 실행부는 이 trait만 보고 진행량을 보고한다.
//! 구현: `nrmb-progress::session::TelemetrySession`

use crate::time::Timestamp;

/// 진행량 수신자
pub trait ProgressSink {
    /// 주어진 시각 기준으로 진행량 보고
    fn report_at(&mut self, value: f64, now: Timestamp);

    /// 현재 시각 기준으로 진행량 보고
    fn report(&mut self, value: f64) {
        self.report_at(value, Timestamp::now());
    }
}

/// 보고된 값을 모두 기록하는 수신자 (테스트, 건조 실행용)
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    reports: Vec<(Timestamp, f64)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[(Timestamp, f64)] {
        &self.reports
    }

    /// 보고된 값의 합
    pub fn total(&self) -> f64 {
        self.reports.iter().map(|(_, v)| v).sum()
    }
}

impl ProgressSink for RecordingSink {
    fn report_at(&mut self, value: f64, now: Timestamp) {
        self.reports.push((now, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_uses_current_time() {
        let before = Timestamp::now();
        let mut sink = RecordingSink::new();
        sink.report(1.0);
        sink.report(2.0);

        assert_eq!(sink.reports().len(), 2);
        assert!(sink.reports()[0].0 >= before);
        assert_eq!(sink.total(), 3.0);
    }
}
