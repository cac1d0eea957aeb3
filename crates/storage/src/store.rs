// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Persistence Store: one directory per instance id holding a
//! `current` record and a `history/` directory of timestamped prior
//! records, plus top-level `auto_instance` and `config` blobs. The
//! write-then-rename idiom in [`crate::atomic::write_atomic`] enforces the
//! "never a half-written `current`" invariant on every save.

use crate::atomic::write_atomic;
use chrono::Utc;
use gst_manager_core::{Error, Instance, InstanceId, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default bound on history snapshots retained per instance.
pub const DEFAULT_MAX_HISTORY_FILES: usize = 100;

/// Durable storage of instance records, their revision history, and the
/// daemon/auto-config blobs.
pub struct Store {
    root: PathBuf,
    max_history_files: usize,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), max_history_files: DEFAULT_MAX_HISTORY_FILES }
    }

    pub fn with_max_history_files(mut self, n: usize) -> Self {
        self.max_history_files = n;
        self
    }

    fn instances_dir(&self) -> PathBuf {
        self.root.join("instances")
    }

    fn instance_dir(&self, id: &InstanceId) -> PathBuf {
        self.instances_dir().join(id.as_str())
    }

    fn current_path(&self, id: &InstanceId) -> PathBuf {
        self.instance_dir(id).join("current")
    }

    fn history_dir(&self, id: &InstanceId) -> PathBuf {
        self.instance_dir(id).join("history")
    }

    fn auto_instance_path(&self) -> PathBuf {
        self.root.join("auto_instance")
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Enumerate instance directories and return deserialized records.
    /// Missing/corrupt records are skipped with a warning; all
    /// runtime-only fields are reset on return.
    pub fn load_all(&self) -> Result<Vec<Instance>> {
        let dir = self.instances_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let current = entry.path().join("current");
            if !current.exists() {
                tracing::warn!(path = %current.display(), "missing current record, skipping");
                continue;
            }
            match fs::read(&current) {
                Ok(bytes) => match serde_json::from_slice::<Instance>(&bytes) {
                    Ok(mut inst) => {
                        inst.reset_runtime_fields();
                        out.push(inst);
                    }
                    Err(e) => {
                        tracing::warn!(path = %current.display(), error = %e, "corrupt instance record, skipping");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %current.display(), error = %e, "failed to read instance record, skipping");
                }
            }
        }
        Ok(out)
    }

    /// Atomically persist `instance`. Before overwriting, the previous
    /// `current` is copied into `history/<utc-timestamp>` and history is
    /// trimmed to the retention bound.
    pub fn save(&self, instance: &Instance) -> Result<()> {
        let current = self.current_path(&instance.id);
        if current.exists() {
            self.snapshot_to_history(&instance.id, &current)?;
        }
        let bytes = serde_json::to_vec_pretty(instance)?;
        write_atomic(&current, &bytes)?;
        Ok(())
    }

    fn snapshot_to_history(&self, id: &InstanceId, current: &Path) -> Result<()> {
        let history_dir = self.history_dir(id);
        fs::create_dir_all(&history_dir)?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let dest = history_dir.join(&stamp);
        fs::copy(current, &dest)?;
        self.trim_history(&history_dir)?;
        Ok(())
    }

    fn trim_history(&self, history_dir: &Path) -> Result<()> {
        let mut entries: Vec<_> = fs::read_dir(history_dir)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());
        while entries.len() > self.max_history_files {
            let oldest = entries.remove(0);
            let _ = fs::remove_file(oldest.path());
        }
        Ok(())
    }

    /// Recursively remove the instance directory (current + history).
    pub fn delete(&self, id: &InstanceId) -> Result<()> {
        let dir = self.instance_dir(id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Newest-first list of past snapshots for `id`.
    pub fn history(&self, id: &InstanceId) -> Result<Vec<Instance>> {
        let history_dir = self.history_dir(id);
        if !history_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<_> = fs::read_dir(&history_dir)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());
        entries.reverse();
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Ok(bytes) = fs::read(entry.path()) {
                if let Ok(inst) = serde_json::from_slice::<Instance>(&bytes) {
                    out.push(inst);
                }
            }
        }
        Ok(out)
    }

    /// Canonical textual form of the current record, runtime-only fields
    /// stripped. Returns `None` if the instance has no persisted record.
    pub fn export(&self, id: &InstanceId) -> Result<Option<String>> {
        let current = self.current_path(id);
        if !current.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&current)?;
        let mut inst: Instance = serde_json::from_slice(&bytes)?;
        inst.reset_runtime_fields();
        inst.error_logs.clear();
        Ok(Some(serde_json::to_string_pretty(&inst)?))
    }

    /// Parse `text` as an instance record. If the embedded id already has a
    /// live on-disk record, a fresh id is generated and `"(copy)"` is
    /// appended to the name; `created_at` is preserved if present,
    /// `modified_at` is refreshed. Returns the (possibly new) id.
    pub fn import(&self, text: &str) -> Result<InstanceId> {
        let mut inst: Instance = serde_json::from_str(text)
            .map_err(|e| Error::invalid_input(format!("malformed instance record: {e}")))?;

        if self.current_path(&inst.id).exists() {
            inst.id = InstanceId::generate();
            inst.name = format!("{} (copy)", inst.name);
        }

        inst.modified_at = Utc::now();
        inst.reset_runtime_fields();
        self.save(&inst)?;
        Ok(inst.id)
    }

    /// Persist the singleton auto-config blob (opaque JSON text owned by the
    /// Auto-Instance Controller).
    pub fn save_auto_config(&self, json: &serde_json::Value) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(json)?;
        write_atomic(&self.auto_instance_path(), &bytes)?;
        Ok(())
    }

    pub fn load_auto_config(&self) -> Result<Option<serde_json::Value>> {
        let path = self.auto_instance_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn delete_auto_config(&self) -> Result<()> {
        let path = self.auto_instance_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Persist the daemon's own settings blob (overrides surfaced through
    /// the bus configuration methods).
    pub fn save_daemon_config(&self, settings: &crate::DaemonSettings) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(settings)?;
        write_atomic(&self.config_path(), &bytes)?;
        Ok(())
    }

    pub fn load_daemon_config(&self) -> Result<crate::DaemonSettings> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(crate::DaemonSettings::default());
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
