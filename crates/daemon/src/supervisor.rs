// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance Supervisor: owns the in-memory instance table, spawns
//! and reaps child pipeline processes, and enforces per-instance retry
//! policy. Each child is reaped by a detached per-child `tokio::spawn`
//! task that awaits exit without blocking the caller.

use gst_manager_core::{
    AutoConfig, Clock, Error, Instance, InstanceId, InstanceStatus, InstanceType, Result, TriggerEvent,
};
use gst_manager_storage::Store;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::broadcast;

use crate::event::DaemonEvent;

/// Argv prefix used to invoke the media-framework launcher.
fn default_launcher() -> Vec<String> {
    vec!["gst-launch-1.0".to_string(), "-e".to_string()]
}

const TRANSIENT_ERRORS: &[&str] = &[
    "connection refused",
    "connection reset",
    "timeout",
    "buffer underrun",
    "temporary failure",
    "resource temporarily unavailable",
];

const FATAL_ERRORS: &[&str] = &[
    "device not found",
    "no such file",
    "permission denied",
    "no element",
    "invalid pipeline",
    "encoder failure",
];

/// A snapshot view of one instance's runtime status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub status: InstanceStatus,
    pub pid: Option<u32>,
    pub uptime_seconds: Option<i64>,
    pub recording: bool,
    pub recording_path: String,
    pub error: Option<String>,
    pub retry_count: u32,
    pub has_logs: bool,
}

/// Classify a stderr tail as transient, fatal, both, or neither.
fn classify(stderr_tail: &str) -> (bool, bool) {
    let lowered = stderr_tail.to_lowercase();
    let transient = TRANSIENT_ERRORS.iter().any(|p| lowered.contains(p));
    let fatal = FATAL_ERRORS.iter().any(|p| lowered.contains(p));
    (transient, fatal)
}

struct RunningChild {
    pid: u32,
}

/// Spawns, monitors, retries, and reaps child pipeline processes.
pub struct Supervisor {
    table: Arc<Mutex<HashMap<InstanceId, Instance>>>,
    running: Arc<Mutex<HashMap<InstanceId, RunningChild>>>,
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<DaemonEvent>,
    launcher: Vec<String>,
}

impl Supervisor {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            table: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(Mutex::new(HashMap::new())),
            store,
            clock,
            events,
            launcher: default_launcher(),
        }
    }

    /// Override the launcher argv prefix (normally `["gst-launch-1.0", "-e"]`).
    /// Exists so tests can substitute a short-lived real executable instead
    /// of requiring GStreamer to be installed.
    #[cfg(any(test, feature = "test-support"))]
    pub fn with_launcher(mut self, launcher: Vec<String>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Populate the in-memory table from the Store. Called once at startup.
    pub fn load_from_store(&self) -> Result<()> {
        let instances = self.store.load_all()?;
        let mut table = self.table.lock();
        for inst in instances {
            table.insert(inst.id.clone(), inst);
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DaemonEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DaemonEvent) {
        let _ = self.events.send(event);
    }

    pub fn list(&self) -> Vec<Instance> {
        self.table.lock().values().cloned().collect()
    }

    pub fn get(&self, id: &InstanceId) -> Result<Instance> {
        self.table.lock().get(id).cloned().ok_or_else(|| Error::not_found(id.as_str()))
    }

    fn persist(&self, inst: &Instance) -> Result<()> {
        self.store.save(inst)
    }

    fn set_status(&self, id: &InstanceId, status: InstanceStatus) {
        {
            let mut table = self.table.lock();
            if let Some(inst) = table.get_mut(id) {
                inst.status = status;
                inst.modified_at = self.clock.utc_now();
                let _ = self.store.save(inst);
            }
        }
        self.emit(DaemonEvent::InstanceStatusChanged { id: id.clone(), status });
    }

    pub fn create(&self, name: impl Into<String>, pipeline: impl Into<String>) -> Result<InstanceId> {
        let now = self.clock.utc_now();
        let inst = Instance::new(InstanceId::generate(), name, pipeline, now);
        let id = inst.id.clone();
        self.persist(&inst)?;
        self.table.lock().insert(id.clone(), inst);
        Ok(id)
    }

    pub fn delete(&self, id: &InstanceId) -> Result<()> {
        {
            let table = self.table.lock();
            let inst = table.get(id).ok_or_else(|| Error::not_found(id.as_str()))?;
            if inst.status == InstanceStatus::Running {
                return Err(Error::illegal_state("cannot delete a running instance"));
            }
        }
        self.table.lock().remove(id);
        self.store.delete(id)?;
        Ok(())
    }

    pub fn update_pipeline(&self, id: &InstanceId, pipeline: impl Into<String>) -> Result<()> {
        let mut table = self.table.lock();
        let inst = table.get_mut(id).ok_or_else(|| Error::not_found(id.as_str()))?;
        if inst.status == InstanceStatus::Running {
            return Err(Error::illegal_state("cannot update the pipeline of a running instance"));
        }
        inst.pipeline = pipeline.into();
        inst.modified_at = self.clock.utc_now();
        self.store.save(inst)?;
        Ok(())
    }

    pub fn set_autostart(&self, id: &InstanceId, enabled: bool, trigger: Option<TriggerEvent>) -> Result<()> {
        let mut table = self.table.lock();
        let inst = table.get_mut(id).ok_or_else(|| Error::not_found(id.as_str()))?;
        inst.autostart = enabled;
        inst.trigger_event = trigger;
        inst.modified_at = self.clock.utc_now();
        self.store.save(inst)?;
        Ok(())
    }

    /// Mark `id` as the auto-managed instance, attaching its configuration
    /// and autostart trigger. Used only by the auto-instance controller;
    /// hand-created instances never carry an `auto_config`.
    pub fn mark_auto(&self, id: &InstanceId, auto_config: AutoConfig, autostart: bool, trigger: TriggerEvent) -> Result<()> {
        let mut table = self.table.lock();
        let inst = table.get_mut(id).ok_or_else(|| Error::not_found(id.as_str()))?;
        inst.instance_type = InstanceType::Auto;
        inst.auto_config = Some(auto_config);
        inst.autostart = autostart;
        inst.trigger_event = Some(trigger);
        inst.modified_at = self.clock.utc_now();
        self.store.save(inst)?;
        Ok(())
    }

    pub fn status(&self, id: &InstanceId) -> Result<StatusView> {
        let table = self.table.lock();
        let inst = table.get(id).ok_or_else(|| Error::not_found(id.as_str()))?;
        Ok(StatusView {
            status: inst.status,
            pid: inst.pid,
            uptime_seconds: inst.uptime_seconds(self.clock.utc_now()),
            recording: inst.recording.enabled,
            recording_path: inst.recording.location.clone(),
            error: inst.error_message.clone(),
            retry_count: inst.retry_count,
            has_logs: !inst.error_logs.is_empty(),
        })
    }

    pub fn get_logs(&self, id: &InstanceId, n: usize) -> Result<Vec<String>> {
        let table = self.table.lock();
        let inst = table.get(id).ok_or_else(|| Error::not_found(id.as_str()))?;
        let logs = &inst.error_logs;
        let start = logs.len().saturating_sub(n);
        Ok(logs[start..].to_vec())
    }

    pub fn clear_logs(&self, id: &InstanceId) -> Result<()> {
        let mut table = self.table.lock();
        let inst = table.get_mut(id).ok_or_else(|| Error::not_found(id.as_str()))?;
        inst.error_logs.clear();
        self.store.save(inst)?;
        Ok(())
    }

    /// Start `id`: forbidden while already `running`/`starting`; otherwise
    /// resets the retry budget for this run and hands off to
    /// [`Self::spawn_and_track`].
    pub async fn start(self: &Arc<Self>, id: &InstanceId) -> Result<()> {
        {
            let mut table = self.table.lock();
            let inst = table.get_mut(id).ok_or_else(|| Error::not_found(id.as_str()))?;
            if inst.status == InstanceStatus::Running || inst.status == InstanceStatus::Starting {
                return Err(Error::illegal_state("instance is already running"));
            }
            inst.retry_count = 0;
        }
        self.spawn_and_track(id).await
    }

    /// Tokenize the pipeline, spawn the launcher, and detach a reaper task
    /// that owns the child for the rest of its life. Shared by `start()`
    /// and the reaper's own transient-retry path: the retry path re-enters
    /// here directly, bypassing `start()`'s already-running guard (the
    /// instance's status is still `running`, left over from the child that
    /// just exited) and leaving `retry_count` untouched, since the reaper
    /// has already incremented it for this attempt.
    async fn spawn_and_track(self: &Arc<Self>, id: &InstanceId) -> Result<()> {
        let pipeline_text = {
            let table = self.table.lock();
            let inst = table.get(id).ok_or_else(|| Error::not_found(id.as_str()))?;
            inst.pipeline.clone()
        };

        let args = shell_words::split(&pipeline_text)
            .map_err(|e| Error::invalid_input(format!("unparseable pipeline text: {e}")))?;

        self.set_status(id, InstanceStatus::Starting);

        let mut command = Command::new(&self.launcher[0]);
        command.args(&self.launcher[1..]).args(&args).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(false);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.fail(id, format!("failed to spawn launcher: {e}"));
                return Err(Error::child_failure(e.to_string()));
            }
        };

        let pid = child.id().ok_or_else(|| Error::child_failure("spawned child has no pid"))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        {
            let mut table = self.table.lock();
            if let Some(inst) = table.get_mut(id) {
                inst.pid = Some(pid);
                inst.uptime_start = Some(self.clock.utc_now());
                inst.error_message = None;
                let _ = self.store.save(inst);
            }
        }
        self.running.lock().insert(id.clone(), RunningChild { pid });
        self.set_status(id, InstanceStatus::Running);

        let supervisor = Arc::clone(self);
        let id = id.clone();
        tokio::spawn(async move {
            supervisor.reap(id, child, stdout, stderr).await;
        });

        Ok(())
    }

    /// Awaits child exit, captures the stderr tail, and decides between a
    /// clean stop, a transient retry, or a terminal error.
    async fn reap(
        self: Arc<Self>,
        id: InstanceId,
        mut child: tokio::process::Child,
        stdout: Option<tokio::process::ChildStdout>,
        stderr: Option<tokio::process::ChildStderr>,
    ) {
        let drain_stdout = async move {
            if let Some(mut stdout) = stdout {
                let mut sink = String::new();
                let _ = stdout.read_to_string(&mut sink).await;
            }
        };
        let read_stderr = async move {
            let mut tail = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut tail).await;
            }
            tail
        };
        let (_, tail) = tokio::join!(drain_stdout, read_stderr);
        let lines: Vec<String> = tail.lines().rev().take(100).map(str::to_string).collect::<Vec<_>>().into_iter().rev().collect();

        let exit_status = child.wait().await;
        self.running.lock().remove(&id);

        {
            let mut table = self.table.lock();
            if let Some(inst) = table.get_mut(&id) {
                for line in &lines {
                    inst.push_error_log(line.clone());
                }
                let _ = self.store.save(inst);
            }
        }

        // Instance may have been deleted out from under the reaper.
        let (auto_restart, max_retries, retry_delay, retry_count) = {
            let table = self.table.lock();
            match table.get(&id) {
                Some(inst) => (inst.recovery.auto_restart, inst.recovery.max_retries, inst.recovery.retry_delay_seconds, inst.retry_count),
                None => return,
            }
        };

        match exit_status {
            Ok(status) if status.success() => {
                self.finish_stopped(&id);
            }
            _ => {
                let (transient, fatal) = classify(&tail);
                if transient && !fatal && auto_restart && retry_count < max_retries {
                    {
                        let mut table = self.table.lock();
                        if let Some(inst) = table.get_mut(&id) {
                            inst.retry_count += 1;
                            let _ = self.store.save(inst);
                        }
                    }
                    tokio::time::sleep(std::time::Duration::from_secs(retry_delay)).await;
                    let _ = self.spawn_and_track(&id).await;
                } else {
                    self.fail(&id, tail);
                }
            }
        }
    }

    /// Clears the per-run transient fields but, unlike
    /// [`Instance::reset_runtime_fields`], leaves `retry_count` alone: a run
    /// that succeeded after one or more retries should still report how
    /// many it took. `retry_count` is reset to zero only by a fresh
    /// `start()` call or a Store `load_all`/import/export.
    fn finish_stopped(&self, id: &InstanceId) {
        {
            let mut table = self.table.lock();
            if let Some(inst) = table.get_mut(id) {
                inst.pid = None;
                inst.error_message = None;
                inst.uptime_start = None;
                let _ = self.store.save(inst);
            }
        }
        self.set_status(id, InstanceStatus::Stopped);
    }

    fn fail(&self, id: &InstanceId, message: String) {
        {
            let mut table = self.table.lock();
            if let Some(inst) = table.get_mut(id) {
                inst.error_message = Some(message);
                inst.pid = None;
                let _ = self.store.save(inst);
            }
        }
        self.set_status(id, InstanceStatus::Error);
    }

    /// Stop `id`: interrupt, wait up to 10s, then force-kill.
    pub async fn stop(&self, id: &InstanceId) -> Result<()> {
        let pid = {
            let table = self.table.lock();
            let inst = table.get(id).ok_or_else(|| Error::not_found(id.as_str()))?;
            if inst.status != InstanceStatus::Running {
                return Err(Error::illegal_state("instance is not running"));
            }
            match self.running.lock().get(id) {
                Some(child) => child.pid,
                None => return Err(Error::illegal_state("instance has no running child")),
            }
        };

        self.set_status(id, InstanceStatus::Stopping);
        interrupt(pid);

        let deadline = tokio::time::sleep(std::time::Duration::from_secs(10));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    kill(pid);
                    break;
                }
                _ = tokio::time::sleep(std::time::Duration::from_millis(100)) => {
                    if !self.running.lock().contains_key(id) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    pub async fn stop_all(&self) {
        let running_ids: Vec<InstanceId> = self.running.lock().keys().cloned().collect();
        for id in running_ids {
            let _ = self.stop(&id).await;
        }
    }
}

#[cfg(unix)]
fn interrupt(pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGINT);
}

#[cfg(not(unix))]
fn interrupt(_pid: u32) {}

#[cfg(unix)]
fn kill(pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
}

#[cfg(not(unix))]
fn kill(_pid: u32) {}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
