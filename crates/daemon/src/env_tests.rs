// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    std::env::remove_var("XDG_STATE_HOME");
    std::env::set_var("GSTMGR_STATE_DIR", "/tmp/gstmgr-test-state");
    let dir = state_dir().expect("state dir");
    std::env::remove_var("GSTMGR_STATE_DIR");
    assert_eq!(dir, PathBuf::from("/tmp/gstmgr-test-state"));
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg_state_home() {
    std::env::remove_var("GSTMGR_STATE_DIR");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");
    let dir = state_dir().expect("state dir");
    std::env::remove_var("XDG_STATE_HOME");
    assert_eq!(dir, PathBuf::from("/tmp/xdg-state/gst-manager"));
}

#[test]
#[serial]
fn bus_name_absent_by_default() {
    std::env::remove_var("GSTMGR_BUS_NAME");
    assert_eq!(bus_name(), None);
}

#[test]
#[serial]
fn bus_name_reads_override() {
    std::env::set_var("GSTMGR_BUS_NAME", "org.example.Test1");
    assert_eq!(bus_name(), Some("org.example.Test1".to_string()));
    std::env::remove_var("GSTMGR_BUS_NAME");
}

#[test]
#[serial]
fn shutdown_drain_timeout_defaults_to_five_seconds() {
    std::env::remove_var("GSTMGR_SHUTDOWN_DRAIN_MS");
    assert_eq!(shutdown_drain_timeout(), Duration::from_secs(5));
}

#[test]
#[serial]
fn shutdown_drain_timeout_reads_override() {
    std::env::set_var("GSTMGR_SHUTDOWN_DRAIN_MS", "1500");
    assert_eq!(shutdown_drain_timeout(), Duration::from_millis(1500));
    std::env::remove_var("GSTMGR_SHUTDOWN_DRAIN_MS");
}
