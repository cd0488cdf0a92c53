//! 진행 보고 텔레메트리 모델.
//!
//! 센서(이벤트 발신자), 스코프(하드웨어 locality), 진행 이벤트.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// 벤치마크 진행 센서의 고정 이름
pub const PROGRESS_SENSOR_NAME: &str = "nrm.benchmarks.progress";

/// 세션이 선택하는 머신 전체 스코프 uuid
pub const MACHINE_SCOPE_UUID: &str = "nrm.scope.hwloc.Machine.0";

/// collector에 등록된 센서
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// 등록 시 사용한 이름
    pub name: String,
    /// collector가 할당한 식별자
    pub uuid: String,
}

impl Sensor {
    pub fn new(name: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: uuid.into(),
        }
    }
}

/// 하드웨어 locality 스코프.
///
/// Clone을 구현하지 않는다. 조회된 스코프는 세션이 보유하거나
/// `Collector::release_scope`로 정확히 한 번 반환해야 한다.
#[must_use = "스코프는 보유하거나 release_scope로 반환해야 한다"]
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    uuid: String,
}

impl Scope {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// 주어진 uuid와 일치하는지 확인
    pub fn matches(&self, uuid: &str) -> bool {
        self.uuid == uuid
    }
}

/// 진행 이벤트 — flush 한 번에 하나 생성되는 불변 값.
///
/// 직렬화 결과가 곧 발행 채널의 wire 포맷이다:
/// `{"type":"progress","timestamp":<ns>,"sensor":"…","scope":"…","value":<f64>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "progress")]
pub struct ProgressEvent {
    #[serde(with = "timestamp_nanos")]
    timestamp: Timestamp,
    #[serde(rename = "sensor")]
    sensor_uuid: String,
    #[serde(rename = "scope")]
    scope_uuid: String,
    value: f64,
}

impl ProgressEvent {
    pub fn new(timestamp: Timestamp, sensor: &Sensor, scope: &Scope, value: f64) -> Self {
        Self {
            timestamp,
            sensor_uuid: sensor.uuid.clone(),
            scope_uuid: scope.uuid.clone(),
            value,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn sensor_uuid(&self) -> &str {
        &self.sensor_uuid
    }

    pub fn scope_uuid(&self) -> &str {
        &self.scope_uuid
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// `Timestamp` ↔ epoch 나노초 정수
mod timestamp_nanos {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::time::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(ts.as_nanos())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        i64::deserialize(deserializer).map(Timestamp::from_nanos)
    }
}
