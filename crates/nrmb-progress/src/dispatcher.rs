//! 이벤트 디스패처.
//!
//! flush된 진행 이벤트를 무제한 채널로 받아 백그라운드 태스크에서 collector로 전송한다.
//! 큐 추가는 동기 호출이라 커널 루프를 막지 않는다. 전송 실패는 로그와 카운터로만 남긴다.

use nrmb_core::models::progress::ProgressEvent;
use nrmb_core::ports::collector::Collector;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 종료 시 남은 이벤트 전송을 기다리는 최대 시간
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct DispatchCounters {
    enqueued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl DispatchCounters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// 디스패처 — 진행 이벤트 큐 → collector 전송
pub struct EventDispatcher {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    worker: JoinHandle<()>,
    counters: Arc<DispatchCounters>,
}

impl EventDispatcher {
    /// 전송 태스크 시작. tokio 런타임 컨텍스트 안에서 호출해야 한다.
    pub fn spawn(collector: Arc<dyn Collector>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(DispatchCounters::default());
        let worker = tokio::spawn(Self::run(collector, rx, Arc::clone(&counters)));

        Self {
            tx,
            worker,
            counters,
        }
    }

    async fn run(
        collector: Arc<dyn Collector>,
        mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
        counters: Arc<DispatchCounters>,
    ) {
        while let Some(event) = rx.recv().await {
            match collector.send_event(&event).await {
                Ok(()) => {
                    counters.sent.fetch_add(1, Ordering::Relaxed);
                    debug!("진행 이벤트 전송: value={}", event.value());
                }
                Err(e) => {
                    let failed = counters.failed.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!("진행 이벤트 전송 실패 (누적 {failed}건): {e}");
                }
            }
        }
        debug!("디스패처 전송 루프 종료");
    }

    /// 이벤트를 큐에 추가 (비차단)
    pub fn enqueue(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("디스패처 태스크 종료됨, 이벤트 폐기");
            return;
        }
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// 채널을 닫고 남은 이벤트 전송을 기다린 뒤 최종 통계 반환
    pub async fn shutdown(self) -> DispatchStats {
        let Self {
            tx,
            mut worker,
            counters,
        } = self;
        drop(tx);

        match tokio::time::timeout(DRAIN_TIMEOUT, &mut worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("디스패처 태스크 비정상 종료: {e}"),
            Err(_) => {
                warn!("디스패처 drain 타임아웃 ({DRAIN_TIMEOUT:?}), 남은 이벤트 폐기");
                worker.abort();
            }
        }

        counters.snapshot()
    }
}

/// 디스패처 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 큐에 들어간 이벤트 수
    pub enqueued: u64,
    /// 전송 성공 수
    pub sent: u64,
    /// 전송 실패 수
    pub failed: u64,
    /// 태스크 종료 후 폐기된 수
    pub dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrmb_core::error::CoreError;
    use nrmb_core::models::progress::{Scope, Sensor};
    use nrmb_core::time::Timestamp;
    use parking_lot::Mutex;

    struct MockCollector {
        should_fail: bool,
        sent: Mutex<Vec<f64>>,
    }

    impl MockCollector {
        fn new(should_fail: bool) -> Arc<Self> {
            Arc::new(Self {
                should_fail,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Collector for MockCollector {
        async fn add_sensor(&self, name: &str) -> Result<Sensor, CoreError> {
            Ok(Sensor::new(name, "sensor-1"))
        }
        async fn remove_sensor(&self, _sensor: &Sensor) -> Result<(), CoreError> {
            Ok(())
        }
        async fn list_scopes(&self) -> Result<Vec<Scope>, CoreError> {
            Ok(vec![])
        }
        fn release_scope(&self, _scope: Scope) {}
        async fn send_event(&self, event: &ProgressEvent) -> Result<(), CoreError> {
            if self.should_fail {
                return Err(CoreError::Network("mock 실패".to_string()));
            }
            self.sent.lock().push(event.value());
            Ok(())
        }
        async fn disconnect(&self) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn make_event(value: f64) -> ProgressEvent {
        ProgressEvent::new(
            Timestamp::now(),
            &Sensor::new("nrm.benchmarks.progress", "sensor-1"),
            &Scope::new("nrm.scope.hwloc.Machine.0"),
            value,
        )
    }

    #[tokio::test]
    async fn shutdown_drains_in_order() {
        let collector = MockCollector::new(false);
        let dispatcher = EventDispatcher::spawn(collector.clone());

        for v in [1.0, 2.0, 3.0] {
            dispatcher.enqueue(make_event(v));
        }
        let stats = dispatcher.shutdown().await;

        assert_eq!(stats.enqueued, 3);
        assert_eq!(stats.sent, 3);
        assert_eq!(stats.failed, 0);
        assert_eq!(*collector.sent.lock(), vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn send_failures_are_counted() {
        let collector = MockCollector::new(true);
        let dispatcher = EventDispatcher::spawn(collector);

        dispatcher.enqueue(make_event(1.0));
        dispatcher.enqueue(make_event(1.0));
        let stats = dispatcher.shutdown().await;

        assert_eq!(stats.enqueued, 2);
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.failed, 2);
    }

    #[tokio::test]
    async fn empty_shutdown() {
        let dispatcher = EventDispatcher::spawn(MockCollector::new(false));
        assert_eq!(dispatcher.shutdown().await, DispatchStats::default());
    }
}
