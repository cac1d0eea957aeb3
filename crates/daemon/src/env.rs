// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the state directory: `GSTMGR_STATE_DIR` > `XDG_STATE_HOME/gst-manager`
/// > `~/.local/state/gst-manager`.
pub fn state_dir() -> Result<PathBuf, &'static str> {
    if let Ok(dir) = std::env::var("GSTMGR_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("gst-manager"));
    }
    let home = std::env::var("HOME").map_err(|_| "HOME is not set and no state dir override was given")?;
    Ok(PathBuf::from(home).join(".local/state/gst-manager"))
}

/// Override the well-known bus name, normally `org.gstmanager.Daemon1`.
pub fn bus_name() -> Option<String> {
    std::env::var("GSTMGR_BUS_NAME").ok().filter(|s| !s.is_empty())
}

/// Restrict the Signal Monitor's sysfs candidate search to a single root,
/// primarily for tests and non-standard board layouts.
pub fn hdmi_sysfs_root() -> Option<PathBuf> {
    std::env::var("GSTMGR_HDMI_SYSFS_ROOT").ok().map(PathBuf::from)
}

/// Shutdown drain timeout (default 5s, configurable via `GSTMGR_SHUTDOWN_DRAIN_MS`).
pub fn shutdown_drain_timeout() -> Duration {
    std::env::var("GSTMGR_SHUTDOWN_DRAIN_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
