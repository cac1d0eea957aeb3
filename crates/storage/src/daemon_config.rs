// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's own settings blob, persisted at `<state-root>/config`
//!. These are overrides for the knobs the
//! `env` module otherwise resolves from `GSTMGR_*` environment variables;
//! an unset field means "use the environment/built-in default".

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    /// Overrides `GSTMGR_BUS_NAME`.
    pub bus_name: Option<String>,
    /// Overrides `GSTMGR_HDMI_SYSFS_ROOT`.
    pub hdmi_sysfs_root: Option<String>,
    /// Overrides `GSTMGR_SHUTDOWN_DRAIN_MS`.
    pub shutdown_drain_ms: Option<u64>,
}
