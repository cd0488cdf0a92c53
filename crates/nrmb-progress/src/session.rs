//! 텔레메트리 세션.
//!
//! collector 연결, 진행 센서, 머신 스코프를 세션 수명 동안 소유한다.
//! `open`과 `close` 사이에서만 진행 보고가 가능하며, `close`는 세션을 소비한다.

use nrmb_core::config::ProgressConfig;
use nrmb_core::models::progress::{
    ProgressEvent, Scope, Sensor, MACHINE_SCOPE_UUID, PROGRESS_SENSOR_NAME,
};
use nrmb_core::ports::collector::Collector;
use nrmb_core::ports::progress::ProgressSink;
use nrmb_core::time::Timestamp;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dispatcher::{DispatchStats, EventDispatcher};
use crate::emitter::ProgressAccumulator;
use crate::error::SessionError;

/// 조회된 스코프를 {선택, 거부}로 분리
///
/// `target`과 일치하는 첫 스코프만 선택한다. 중복 일치 항목은 거부 쪽으로 간다.
pub fn partition_scopes(scopes: Vec<Scope>, target: &str) -> (Option<Scope>, Vec<Scope>) {
    let mut selected = None;
    let mut rejected = Vec::with_capacity(scopes.len());

    for scope in scopes {
        if selected.is_none() && scope.matches(target) {
            selected = Some(scope);
        } else {
            rejected.push(scope);
        }
    }

    (selected, rejected)
}

/// 텔레메트리 세션
pub struct TelemetrySession {
    collector: Arc<dyn Collector>,
    sensor: Sensor,
    scope: Scope,
    progress: ProgressAccumulator,
    dispatcher: EventDispatcher,
    prog_name: String,
}

/// 세션 종료 요약
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// 벤치마크 이름
    pub prog_name: String,
    /// 생성된 진행 이벤트 수 (종료 시 flush 포함)
    pub flushes: u64,
    /// 내보낸 진행량 합계
    pub total_progress: f64,
    /// 무시된 보고 수
    pub ignored_reports: u64,
    /// 전송 통계
    pub dispatch: DispatchStats,
}

impl TelemetrySession {
    /// 세션 열기
    ///
    /// 센서 등록 → 스코프 조회 → 머신 스코프 선택, 나머지 반환 → 디스패처 시작.
    /// 머신 스코프가 없으면 센서를 해제하고 `ScopeNotFound`로 실패한다.
    pub async fn open(
        collector: Arc<dyn Collector>,
        prog_name: &str,
        config: &ProgressConfig,
    ) -> Result<Self, SessionError> {
        let sensor = collector
            .add_sensor(PROGRESS_SENSOR_NAME)
            .await
            .map_err(SessionError::SensorRegistration)?;
        debug!("진행 센서 등록: {} ({})", sensor.name, sensor.uuid);

        let scopes = match collector.list_scopes().await {
            Ok(scopes) => scopes,
            Err(e) => {
                Self::unregister(collector.as_ref(), &sensor).await;
                return Err(SessionError::ScopeDiscovery(e));
            }
        };

        let discovered = scopes.len();
        let (selected, rejected) = partition_scopes(scopes, MACHINE_SCOPE_UUID);
        for scope in rejected {
            collector.release_scope(scope);
        }

        let Some(scope) = selected else {
            Self::unregister(collector.as_ref(), &sensor).await;
            return Err(SessionError::ScopeNotFound {
                target: MACHINE_SCOPE_UUID.to_string(),
                discovered,
            });
        };

        let dispatcher = EventDispatcher::spawn(Arc::clone(&collector));
        let progress = ProgressAccumulator::new(config.rate_limit(), Timestamp::now());

        info!(
            prog_name,
            scope = scope.uuid(),
            rate_limit_ms = config.rate_limit_ms,
            "텔레메트리 세션 시작"
        );

        Ok(Self {
            collector,
            sensor,
            scope,
            progress,
            dispatcher,
            prog_name: prog_name.to_string(),
        })
    }

    async fn unregister(collector: &dyn Collector, sensor: &Sensor) {
        if let Err(e) = collector.remove_sensor(sensor).await {
            warn!("센서 해제 실패: {e}");
        }
    }

    /// 세션 닫기
    ///
    /// 남은 누적값 flush → 전송 drain → 센서 해제 → 스코프 반환 → 연결 종료.
    /// 정리 단계 실패는 로그만 남긴다.
    pub async fn close(self) -> SessionSummary {
        let Self {
            collector,
            sensor,
            scope,
            mut progress,
            dispatcher,
            prog_name,
        } = self;

        if let Some(value) = progress.take_pending() {
            debug!("종료 전 잔여 진행량 flush: {value}");
            dispatcher.enqueue(ProgressEvent::new(Timestamp::now(), &sensor, &scope, value));
        }

        let dispatch = dispatcher.shutdown().await;

        Self::unregister(collector.as_ref(), &sensor).await;
        collector.release_scope(scope);
        if let Err(e) = collector.disconnect().await {
            warn!("collector 연결 종료 실패: {e}");
        }

        info!(
            prog_name = %prog_name,
            flushes = progress.flushes(),
            sent = dispatch.sent,
            failed = dispatch.failed,
            "텔레메트리 세션 종료"
        );

        SessionSummary {
            prog_name,
            flushes: progress.flushes(),
            total_progress: progress.flushed_total(),
            ignored_reports: progress.ignored(),
            dispatch,
        }
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// 아직 flush되지 않은 누적값
    pub fn pending(&self) -> f64 {
        self.progress.pending()
    }

    pub fn last_flush(&self) -> Timestamp {
        self.progress.last_flush()
    }
}

impl ProgressSink for TelemetrySession {
    fn report_at(&mut self, value: f64, now: Timestamp) {
        if let Some(flushed) = self.progress.accumulate(value, now) {
            self.dispatcher
                .enqueue(ProgressEvent::new(now, &self.sensor, &self.scope, flushed));
        }
    }
}
