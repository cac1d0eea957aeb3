// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gst_manager_core::SystemClock;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Write an executable shell script, return (tempdir-to-keep-alive, path).
fn script(body: &str) -> (TempDir, String) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("launcher.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    (dir, path.to_string_lossy().to_string())
}

fn supervisor_with_launcher(launcher: Vec<String>) -> (TempDir, Arc<Supervisor>) {
    let state_dir = tempdir().expect("tempdir");
    let store = Arc::new(Store::new(state_dir.path()));
    let supervisor = Arc::new(Supervisor::new(store, Arc::new(SystemClock)).with_launcher(launcher));
    (state_dir, supervisor)
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

#[tokio::test]
async fn create_persists_and_lists() {
    let (_scriptdir, launcher_path) = script("exit 0");
    let (_state, supervisor) = supervisor_with_launcher(vec![launcher_path]);

    let id = supervisor.create("Camera", "videotestsrc ! fakesink").expect("create");
    let listed = supervisor.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].status, InstanceStatus::Stopped);
}

#[tokio::test]
async fn start_then_clean_exit_transitions_to_stopped() {
    let (_scriptdir, launcher_path) = script("exit 0");
    let (_state, supervisor) = supervisor_with_launcher(vec![launcher_path]);
    let id = supervisor.create("Camera", "").expect("create");

    supervisor.start(&id).await.expect("start");
    wait_until(|| supervisor.status(&id).unwrap().status == InstanceStatus::Stopped, Duration::from_secs(5)).await;

    let status = supervisor.status(&id).expect("status");
    assert_eq!(status.pid, None);
}

#[tokio::test]
async fn start_then_fatal_stderr_transitions_to_error() {
    let (_scriptdir, launcher_path) = script("echo 'no such file' >&2\nexit 1");
    let (_state, supervisor) = supervisor_with_launcher(vec![launcher_path]);
    let id = supervisor.create("Camera", "").expect("create");

    supervisor.start(&id).await.expect("start");
    wait_until(|| supervisor.status(&id).unwrap().status == InstanceStatus::Error, Duration::from_secs(5)).await;

    let status = supervisor.status(&id).expect("status");
    assert!(status.error.unwrap().contains("no such file"));
    assert!(status.has_logs);
}

#[tokio::test]
async fn transient_error_retries_then_succeeds() {
    let counter = tempdir().expect("tempdir");
    let counter_path = counter.path().join("count");
    let (_scriptdir, launcher_path) = script(
        "count=$(cat \"$1\" 2>/dev/null || echo 0); count=$((count+1)); echo $count > \"$1\"; \
         if [ \"$count\" -eq 1 ]; then echo 'connection refused' >&2; exit 1; else exit 0; fi",
    );
    let (_state, supervisor) = supervisor_with_launcher(vec![launcher_path]);
    let id = supervisor.create("Camera", counter_path.to_string_lossy().to_string()).expect("create");

    // Speed up the retry delay so the test doesn't wait on the default 5s.
    {
        let mut inst = supervisor.get(&id).expect("get");
        inst.recovery.retry_delay_seconds = 0;
        inst.recovery.max_retries = 1;
        supervisor.store.save(&inst).expect("save");
    }
    supervisor.load_from_store().expect("reload");

    supervisor.start(&id).await.expect("start");
    wait_until(|| supervisor.status(&id).unwrap().status == InstanceStatus::Stopped, Duration::from_secs(5)).await;

    let status = supervisor.status(&id).expect("status");
    assert_eq!(status.retry_count, 1);
}

#[tokio::test]
async fn start_rejects_when_already_running() {
    let (_scriptdir, launcher_path) = script("sleep 5");
    let (_state, supervisor) = supervisor_with_launcher(vec![launcher_path]);
    let id = supervisor.create("Camera", "").expect("create");

    supervisor.start(&id).await.expect("start");
    wait_until(|| supervisor.status(&id).unwrap().status == InstanceStatus::Running, Duration::from_secs(5)).await;

    let err = supervisor.start(&id).await.unwrap_err();
    assert_eq!(err.code(), "InstanceRunning");

    supervisor.stop(&id).await.expect("stop");
}

#[tokio::test]
async fn stop_interrupts_then_marks_stopped() {
    let (_scriptdir, launcher_path) = script("trap 'exit 0' INT\nwhile true; do sleep 1; done");
    let (_state, supervisor) = supervisor_with_launcher(vec![launcher_path]);
    let id = supervisor.create("Camera", "").expect("create");

    supervisor.start(&id).await.expect("start");
    wait_until(|| supervisor.status(&id).unwrap().status == InstanceStatus::Running, Duration::from_secs(5)).await;

    supervisor.stop(&id).await.expect("stop");
    wait_until(|| supervisor.status(&id).unwrap().status == InstanceStatus::Stopped, Duration::from_secs(5)).await;
}

#[tokio::test]
async fn delete_rejects_while_running() {
    let (_scriptdir, launcher_path) = script("sleep 5");
    let (_state, supervisor) = supervisor_with_launcher(vec![launcher_path]);
    let id = supervisor.create("Camera", "").expect("create");

    supervisor.start(&id).await.expect("start");
    wait_until(|| supervisor.status(&id).unwrap().status == InstanceStatus::Running, Duration::from_secs(5)).await;

    let err = supervisor.delete(&id).unwrap_err();
    assert_eq!(err.code(), "InstanceRunning");

    supervisor.stop(&id).await.expect("stop");
}

#[test]
fn delete_unknown_instance_is_not_found() {
    let (_state, supervisor) = supervisor_with_launcher(default_launcher());
    let err = supervisor.delete(&InstanceId::from_string("ffffffff")).unwrap_err();
    assert_eq!(err.code(), "InstanceNotFound");
}

#[test]
fn update_pipeline_changes_text_and_modified_at() {
    let (_state, supervisor) = supervisor_with_launcher(default_launcher());
    let id = supervisor.create("Camera", "old ! pipeline").expect("create");
    supervisor.update_pipeline(&id, "new ! pipeline").expect("update");
    assert_eq!(supervisor.get(&id).expect("get").pipeline, "new ! pipeline");
}

#[test]
fn get_logs_returns_tail_of_n() {
    let (_state, supervisor) = supervisor_with_launcher(default_launcher());
    let id = supervisor.create("Camera", "").expect("create");
    {
        let mut inst = supervisor.get(&id).expect("get");
        for i in 0..5 {
            inst.push_error_log(format!("line {i}"));
        }
        supervisor.store.save(&inst).expect("save");
    }
    supervisor.load_from_store().expect("reload");
    let logs = supervisor.get_logs(&id, 2).expect("logs");
    assert_eq!(logs, vec!["line 3".to_string(), "line 4".to_string()]);
}
