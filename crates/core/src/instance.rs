// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Instance` domain type: a configured pipeline plus its runtime state.

use crate::auto_config::AutoConfig;
use crate::id::InstanceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of stderr lines kept per instance.
pub const ERROR_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
    WaitingSignal,
}

crate::simple_display! {
    InstanceStatus {
        Stopped => "stopped",
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
        Error => "error",
        WaitingSignal => "waiting_signal",
    }
}

impl Default for InstanceStatus {
    fn default() -> Self {
        Self::Stopped
    }
}

/// Event that, once observed, allows an autostart-eligible instance to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Boot,
    HdmiSignalReady,
    HdmiPassthroughReady,
}

crate::simple_display! {
    TriggerEvent {
        Boot => "boot",
        HdmiSignalReady => "hdmi_signal_ready",
        HdmiPassthroughReady => "hdmi_passthrough_ready",
    }
}

/// Whether an instance was hand-created or is the controller's singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceType {
    Manual,
    Auto,
}

impl Default for InstanceType {
    fn default() -> Self {
        Self::Manual
    }
}

/// Recovery policy controlling automatic restart behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub auto_restart: bool,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    /// Declared but never consulted by any transition.
    /// Persisted for round-trip fidelity only.
    pub restart_on_signal: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { auto_restart: true, max_retries: 3, retry_delay_seconds: 5, restart_on_signal: true }
    }
}

/// Advisory recording policy. Toggling this flag never rewrites or
/// restarts a live pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub enabled: bool,
    pub location: String,
    pub max_segment_seconds: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self { enabled: false, location: String::new(), max_segment_seconds: 0 }
    }
}

/// A configured pipeline plus its runtime state and optional child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub name: String,
    pub pipeline: String,
    pub status: InstanceStatus,
    pub pid: Option<u32>,
    pub autostart: bool,
    pub trigger_event: Option<TriggerEvent>,
    pub recovery: RecoveryConfig,
    pub recording: RecordingConfig,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,

    // Runtime-only fields: reset to defaults on load.
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub uptime_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_logs: Vec<String>,

    pub instance_type: InstanceType,
    #[serde(default)]
    pub auto_config: Option<AutoConfig>,
}

impl Instance {
    /// Create a brand-new manual instance. Timestamps are supplied by the
    /// caller (via a `Clock`) so construction stays deterministic in tests.
    pub fn new(id: InstanceId, name: impl Into<String>, pipeline: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            pipeline: pipeline.into(),
            status: InstanceStatus::Stopped,
            pid: None,
            autostart: false,
            trigger_event: None,
            recovery: RecoveryConfig::default(),
            recording: RecordingConfig::default(),
            created_at: now,
            modified_at: now,
            error_message: None,
            retry_count: 0,
            uptime_start: None,
            error_logs: Vec::new(),
            instance_type: InstanceType::Manual,
            auto_config: None,
        }
    }

    /// Reset all runtime-only fields to their defaults, as required after a
    /// daemon restart: a loaded instance owns no live
    /// process and has forgotten any in-flight error/retry state.
    pub fn reset_runtime_fields(&mut self) {
        self.status = InstanceStatus::Stopped;
        self.pid = None;
        self.error_message = None;
        self.retry_count = 0;
        self.uptime_start = None;
    }

    /// Append a line to the bounded stderr ring buffer, evicting the oldest
    /// entry once `ERROR_LOG_CAPACITY` is exceeded.
    pub fn push_error_log(&mut self, line: String) {
        self.error_logs.push(line);
        if self.error_logs.len() > ERROR_LOG_CAPACITY {
            let overflow = self.error_logs.len() - ERROR_LOG_CAPACITY;
            self.error_logs.drain(0..overflow);
        }
    }

    pub fn uptime_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.uptime_start.map(|start| (now - start).num_seconds().max(0))
    }

    #[cfg(any(test, feature = "test-support"))]
    crate::setters! {
        into { name: String, pipeline: String }
        set { status: InstanceStatus, autostart: bool, instance_type: InstanceType }
        option { trigger_event: TriggerEvent, auto_config: AutoConfig }
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
