// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-Instance Controller: owns the single auto-managed capture
//! instance. Only one auto instance exists at a time, and every
//! configuration change that touches pipeline-affecting fields goes
//! through delete-then-create rather than an in-place pipeline edit.

use gst_manager_core::{AutoConfig, Error, InstanceId, InstanceStatus, InstanceType, Result, SignalInfo, TriggerEvent};
use gst_manager_storage::Store;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::pipeline;
use crate::supervisor::Supervisor;

struct AutoState {
    config: Option<AutoConfig>,
    instance_id: Option<InstanceId>,
}

/// Owns the singleton auto-managed instance and its `AutoConfig`.
pub struct AutoController {
    supervisor: Arc<Supervisor>,
    store: Arc<Store>,
    state: Mutex<AutoState>,
}

impl AutoController {
    pub fn new(supervisor: Arc<Supervisor>, store: Arc<Store>) -> Self {
        Self { supervisor, store, state: Mutex::new(AutoState { config: None, instance_id: None }) }
    }

    /// Load the persisted configuration (or defaults on first boot) and
    /// recover the instance-id binding from whichever instance in the
    /// supervisor's table already carries `InstanceType::Auto`.
    pub fn load(&self) -> Result<()> {
        let config = match self.store.load_auto_config()? {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => AutoConfig::default(),
        };
        let instance_id =
            self.supervisor.list().into_iter().find(|i| i.instance_type == InstanceType::Auto).map(|i| i.id);

        let mut state = self.state.lock();
        state.config = Some(config);
        state.instance_id = instance_id;
        Ok(())
    }

    pub fn config(&self) -> Option<AutoConfig> {
        self.state.lock().config.clone()
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.state.lock().instance_id.clone()
    }

    fn persist_config(&self, config: &AutoConfig) -> Result<()> {
        let value = serde_json::to_value(config)?;
        self.store.save_auto_config(&value)
    }

    /// Replace the auto instance with one built from `config`. Any
    /// existing auto instance is stopped (if running) and deleted first;
    /// the new instance is created fresh and marked `InstanceType::Auto`.
    pub async fn create_or_update(&self, mut config: AutoConfig, signal: Option<&SignalInfo>) -> Result<InstanceId> {
        config.validate().map_err(Error::invalid_input)?;

        if let Some(info) = signal {
            if info.width > 0 {
                config.width = info.width;
            }
            if info.height > 0 {
                config.height = info.height;
            }
            if info.fps > 0 {
                config.framerate = info.fps;
            }
        }

        if let Some(id) = self.instance_id() {
            if let Ok(inst) = self.supervisor.get(&id) {
                if inst.status == InstanceStatus::Running {
                    let _ = self.supervisor.stop(&id).await;
                }
            }
            let _ = self.supervisor.delete(&id);
        }

        let pipeline_text = pipeline::build(&config);
        let id = self.supervisor.create("Auto HDMI Capture", pipeline_text)?;
        self.supervisor.mark_auto(&id, config.clone(), config.autostart_on_ready, TriggerEvent::HdmiPassthroughReady)?;

        {
            let mut state = self.state.lock();
            state.config = Some(config.clone());
            state.instance_id = Some(id.clone());
        }
        self.persist_config(&config)?;

        Ok(id)
    }

    /// Render the pipeline a given config would produce, without touching
    /// the live instance.
    pub fn get_pipeline_preview(&self, config: &AutoConfig) -> String {
        pipeline::build_preview(config)
    }

    /// HDMI passthrough became ready: recreate the pipeline with the
    /// current TX resolution if the instance needs it, then start it.
    /// No-op if autostart is disabled.
    pub async fn on_passthrough_ready(&self, signal: &SignalInfo) -> Result<()> {
        let Some(config) = self.config() else { return Ok(()) };
        if !config.autostart_on_ready {
            return Ok(());
        }

        let existing_id = self.instance_id();
        let needs_recreate = match &existing_id {
            Some(id) => self.supervisor.get(id).map(|i| i.status == InstanceStatus::Stopped).unwrap_or(true),
            None => true,
        };

        let id = match existing_id {
            Some(id) if !needs_recreate => id,
            _ => self.create_or_update(config, Some(signal)).await?,
        };

        self.supervisor.start(&id).await
    }

    /// HDMI passthrough was lost: stop the auto instance if it is running.
    /// Leaves it configured so the next ready edge restarts it.
    pub async fn on_passthrough_lost(&self) -> Result<()> {
        let Some(id) = self.instance_id() else { return Ok(()) };
        if let Ok(inst) = self.supervisor.get(&id) {
            if inst.status == InstanceStatus::Running {
                self.supervisor.stop(&id).await?;
            }
        }
        Ok(())
    }

    /// Apply a partial JSON patch to the current config. Recreates the
    /// pipeline only if an instance already exists and is stopped;
    /// otherwise the new config is simply persisted for the next create.
    pub async fn update_config(&self, patch: &serde_json::Value) -> Result<()> {
        let mut config = self.config().ok_or_else(|| Error::illegal_state("no auto instance configured"))?;
        config.apply_partial(patch);
        config.validate().map_err(Error::invalid_input)?;

        let should_recreate = match self.instance_id() {
            Some(id) => self.supervisor.get(&id).map(|i| i.status == InstanceStatus::Stopped).unwrap_or(false),
            None => false,
        };

        if should_recreate {
            self.create_or_update(config, None).await?;
        } else {
            {
                let mut state = self.state.lock();
                state.config = Some(config.clone());
            }
            self.persist_config(&config)?;
        }
        Ok(())
    }

    /// Stop and delete the auto instance, forgetting its configuration.
    pub async fn delete(&self) -> Result<()> {
        if let Some(id) = self.instance_id() {
            if let Ok(inst) = self.supervisor.get(&id) {
                if inst.status == InstanceStatus::Running {
                    self.supervisor.stop(&id).await?;
                }
            }
            let _ = self.supervisor.delete(&id);
        }

        {
            let mut state = self.state.lock();
            state.config = None;
            state.instance_id = None;
        }

        self.store.delete_auto_config()
    }
}

#[cfg(test)]
#[path = "auto_controller_tests.rs"]
mod tests;
