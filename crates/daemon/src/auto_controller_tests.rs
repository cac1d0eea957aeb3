// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gst_manager_core::{Provenance, SystemClock};
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn script(body: &str) -> (TempDir, String) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("launcher.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    (dir, path.to_string_lossy().to_string())
}

fn controller_with_launcher(launcher: Vec<String>) -> (TempDir, AutoController) {
    let state_dir = tempdir().expect("tempdir");
    let store = Arc::new(Store::new(state_dir.path()));
    let supervisor = Arc::new(Supervisor::new(store.clone(), Arc::new(SystemClock)).with_launcher(launcher));
    (state_dir, AutoController::new(supervisor, store))
}

async fn wait_until(mut f: impl FnMut() -> bool, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !f() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not reached within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn sample_signal() -> SignalInfo {
    SignalInfo {
        cable_connected: true,
        signal_locked: true,
        width: 1920,
        height: 1080,
        fps: 30,
        interlaced: false,
        color_format: "YUV".to_string(),
        raw_source: String::new(),
        provenance: Provenance::Native,
    }
}

#[test]
fn load_defaults_when_no_config_exists() {
    let (_state, controller) = controller_with_launcher(default_launcher_for_test());
    controller.load().expect("load");
    assert_eq!(controller.config(), Some(AutoConfig::default()));
    assert_eq!(controller.instance_id(), None);
}

fn default_launcher_for_test() -> Vec<String> {
    vec!["true".to_string()]
}

#[tokio::test]
async fn create_or_update_persists_config_and_marks_instance_auto() {
    let (_scriptdir, launcher_path) = script("exit 0");
    let (_state, controller) = controller_with_launcher(vec![launcher_path]);
    controller.load().expect("load");

    let config = AutoConfig::default();
    let id = controller.create_or_update(config.clone(), Some(&sample_signal())).await.expect("create");

    let inst = controller.supervisor.get(&id).expect("get");
    assert_eq!(inst.instance_type, InstanceType::Auto);
    assert!(inst.auto_config.is_some());
    assert_eq!(inst.auto_config.as_ref().unwrap().width, 1920);
    assert_eq!(inst.auto_config.as_ref().unwrap().height, 1080);
    assert_eq!(inst.auto_config.as_ref().unwrap().framerate, 30);

    let reloaded = controller.store.load_auto_config().expect("load").expect("some");
    let reloaded: AutoConfig = serde_json::from_value(reloaded).expect("parse");
    assert_eq!(reloaded.width, 1920);
}

#[tokio::test]
async fn create_or_update_replaces_existing_instance() {
    let (_scriptdir, launcher_path) = script("exit 0");
    let (_state, controller) = controller_with_launcher(vec![launcher_path]);
    controller.load().expect("load");

    let first = controller.create_or_update(AutoConfig::default(), None).await.expect("create");
    let second = controller.create_or_update(AutoConfig::default(), None).await.expect("create");

    assert_ne!(first, second);
    assert!(controller.supervisor.get(&first).is_err());
    assert_eq!(controller.instance_id(), Some(second));
}

#[tokio::test]
async fn on_passthrough_ready_autostarts_when_enabled() {
    let (_scriptdir, launcher_path) = script("sleep 5");
    let (_state, controller) = controller_with_launcher(vec![launcher_path]);
    controller.load().expect("load");

    controller.on_passthrough_ready(&sample_signal()).await.expect("ready");

    let id = controller.instance_id().expect("has instance");
    wait_until(
        || controller.supervisor.status(&id).unwrap().status == InstanceStatus::Running,
        Duration::from_secs(5),
    )
    .await;

    controller.supervisor.stop(&id).await.expect("stop");
}

#[tokio::test]
async fn on_passthrough_ready_noop_when_autostart_disabled() {
    let (_scriptdir, launcher_path) = script("exit 0");
    let (_state, controller) = controller_with_launcher(vec![launcher_path]);
    controller.load().expect("load");

    let mut config = AutoConfig::default();
    config.autostart_on_ready = false;
    controller.create_or_update(config, None).await.expect("create");

    controller.on_passthrough_ready(&sample_signal()).await.expect("ready");
    let id = controller.instance_id().expect("has instance");
    assert_eq!(controller.supervisor.status(&id).unwrap().status, InstanceStatus::Stopped);
}

#[tokio::test]
async fn on_passthrough_lost_stops_running_instance() {
    let (_scriptdir, launcher_path) = script("trap 'exit 0' INT\nwhile true; do sleep 1; done");
    let (_state, controller) = controller_with_launcher(vec![launcher_path]);
    controller.load().expect("load");

    controller.on_passthrough_ready(&sample_signal()).await.expect("ready");
    let id = controller.instance_id().expect("has instance");
    wait_until(
        || controller.supervisor.status(&id).unwrap().status == InstanceStatus::Running,
        Duration::from_secs(5),
    )
    .await;

    controller.on_passthrough_lost().await.expect("lost");
    wait_until(
        || controller.supervisor.status(&id).unwrap().status == InstanceStatus::Stopped,
        Duration::from_secs(15),
    )
    .await;
}

#[tokio::test]
async fn update_config_rejects_invalid_rc_mode() {
    let (_scriptdir, launcher_path) = script("exit 0");
    let (_state, controller) = controller_with_launcher(vec![launcher_path]);
    controller.load().expect("load");
    controller.create_or_update(AutoConfig::default(), None).await.expect("create");

    let patch = serde_json::json!({"rc_mode": 9});
    let err = controller.update_config(&patch).await.unwrap_err();
    assert_eq!(err.code(), "InvalidConfig");
}

#[tokio::test]
async fn delete_removes_instance_and_config() {
    let (_scriptdir, launcher_path) = script("exit 0");
    let (_state, controller) = controller_with_launcher(vec![launcher_path]);
    controller.load().expect("load");
    let id = controller.create_or_update(AutoConfig::default(), None).await.expect("create");

    controller.delete().await.expect("delete");

    assert!(controller.supervisor.get(&id).is_err());
    assert_eq!(controller.instance_id(), None);
    assert!(controller.store.load_auto_config().expect("load").is_none());
}
