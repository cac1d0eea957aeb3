// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

#[test]
fn new_instance_starts_stopped_manual_with_no_runtime_state() {
    let inst = Instance::new(InstanceId::from_string("abcd1234"), "t", "fakesrc ! fakesink", t(0));
    assert_eq!(inst.status, InstanceStatus::Stopped);
    assert_eq!(inst.instance_type, InstanceType::Manual);
    assert!(inst.pid.is_none());
    assert!(inst.error_logs.is_empty());
    assert_eq!(inst.retry_count, 0);
}

#[test]
fn reset_runtime_fields_clears_transient_state() {
    let mut inst = Instance::new(InstanceId::from_string("abcd1234"), "t", "p", t(0));
    inst.status = InstanceStatus::Running;
    inst.pid = Some(1234);
    inst.error_message = Some("boom".to_string());
    inst.retry_count = 2;
    inst.uptime_start = Some(t(0));

    inst.reset_runtime_fields();

    assert_eq!(inst.status, InstanceStatus::Stopped);
    assert!(inst.pid.is_none());
    assert!(inst.error_message.is_none());
    assert_eq!(inst.retry_count, 0);
    assert!(inst.uptime_start.is_none());
}

#[test]
fn error_log_ring_buffer_evicts_oldest() {
    let mut inst = Instance::new(InstanceId::from_string("abcd1234"), "t", "p", t(0));
    for i in 0..(ERROR_LOG_CAPACITY + 10) {
        inst.push_error_log(format!("line {i}"));
    }
    assert_eq!(inst.error_logs.len(), ERROR_LOG_CAPACITY);
    assert_eq!(inst.error_logs.first().map(String::as_str), Some("line 10"));
    assert_eq!(inst.error_logs.last().map(String::as_str), Some("line 109"));
}

#[test]
fn uptime_seconds_computed_from_start() {
    let mut inst = Instance::new(InstanceId::from_string("abcd1234"), "t", "p", t(0));
    inst.uptime_start = Some(t(0));
    assert_eq!(inst.uptime_seconds(t(42)), Some(42));
}

#[test]
fn uptime_seconds_none_when_not_running() {
    let inst = Instance::new(InstanceId::from_string("abcd1234"), "t", "p", t(0));
    assert_eq!(inst.uptime_seconds(t(10)), None);
}

#[test]
fn serde_round_trip_preserves_all_fields() {
    let mut inst = Instance::new(InstanceId::from_string("abcd1234"), "t", "p", t(0));
    inst.status = InstanceStatus::Error;
    inst.error_message = Some("device-not-found".to_string());
    let json = serde_json::to_string(&inst).expect("serialize");
    let back: Instance = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.status, InstanceStatus::Error);
    assert_eq!(back.error_message.as_deref(), Some("device-not-found"));
    assert_eq!(back.id, inst.id);
}
