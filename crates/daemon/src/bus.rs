// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External Interface: a `zbus` service façade exposing one
//! well-known name, `org.gstmanager.Daemon1`, at object path
//! `/org/gstmanager/Daemon1`. Each method below maps directly onto a
//! Supervisor/Controller/Store/Monitor operation; structured payloads
//! (instance lists, status records, config blobs) travel as JSON text
//! within zbus's string types, readable over `busctl`/`dbus-send` without
//! a Rust-specific codec. The three signals are re-emitted by
//! [`spawn_signal_fanout`] from the shared `DaemonEvent` broadcast
//! channel.

use gst_manager_core::{AutoConfig, Error, InstanceId, TriggerEvent};
use gst_manager_storage::Store;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use zbus::object_server::SignalEmitter;

use crate::auto_controller::AutoController;
use crate::collaborators::{DiscoveryProvider, GenerationAgent};
use crate::event::DaemonEvent;
use crate::event_manager::EventManager;
use crate::monitor::HdmiMonitor;
use crate::supervisor::Supervisor;

pub const BUS_NAME: &str = "org.gstmanager.Daemon1";
pub const OBJECT_PATH: &str = "/org/gstmanager/Daemon1";

/// Typed bus errors. Named so zbus reports them to clients as
/// `org.gstmanager.Daemon1.<Variant>`.
#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "org.gstmanager.Daemon1")]
pub enum BusError {
    InstanceNotFound(String),
    InstanceRunning(String),
    InvalidConfig(String),
    Error(String),
}

impl From<Error> for BusError {
    fn from(e: Error) -> Self {
        let detail = e.to_string();
        match e.code() {
            "InstanceNotFound" => BusError::InstanceNotFound(detail),
            "InstanceRunning" => BusError::InstanceRunning(detail),
            "InvalidConfig" => BusError::InvalidConfig(detail),
            _ => BusError::Error(detail),
        }
    }
}

type BusResult<T> = Result<T, BusError>;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn parse_id(raw: &str) -> InstanceId {
    InstanceId::from_string(raw)
}

fn parse_trigger(raw: &str) -> Option<TriggerEvent> {
    match raw {
        "boot" => Some(TriggerEvent::Boot),
        "hdmi_signal_ready" => Some(TriggerEvent::HdmiSignalReady),
        "hdmi_passthrough_ready" => Some(TriggerEvent::HdmiPassthroughReady),
        _ => None,
    }
}

/// Implements the `org.gstmanager.Daemon1` interface over the daemon's
/// core components.
pub struct BusService {
    supervisor: Arc<Supervisor>,
    auto_controller: Arc<AutoController>,
    monitor: Arc<HdmiMonitor>,
    event_manager: Arc<EventManager>,
    discovery: Arc<dyn DiscoveryProvider>,
    generation_agent: Arc<dyn GenerationAgent>,
    store: Arc<Store>,
}

impl BusService {
    pub fn new(
        supervisor: Arc<Supervisor>,
        auto_controller: Arc<AutoController>,
        monitor: Arc<HdmiMonitor>,
        event_manager: Arc<EventManager>,
        discovery: Arc<dyn DiscoveryProvider>,
        generation_agent: Arc<dyn GenerationAgent>,
        store: Arc<Store>,
    ) -> Self {
        Self { supervisor, auto_controller, monitor, event_manager, discovery, generation_agent, store }
    }
}

#[zbus::interface(name = "org.gstmanager.Daemon1")]
impl BusService {
    async fn list_instances(&self) -> String {
        to_json(&self.supervisor.list())
    }

    async fn create_instance(&self, name: String, pipeline: String) -> BusResult<String> {
        let id = self.supervisor.create(name, pipeline)?;
        Ok(id.to_string())
    }

    async fn delete_instance(&self, id: String) -> BusResult<bool> {
        self.supervisor.delete(&parse_id(&id))?;
        Ok(true)
    }

    async fn start_instance(&self, id: String) -> BusResult<bool> {
        self.supervisor.start(&parse_id(&id)).await?;
        Ok(true)
    }

    async fn stop_instance(&self, id: String) -> BusResult<bool> {
        self.supervisor.stop(&parse_id(&id)).await?;
        Ok(true)
    }

    async fn get_instance_status(&self, id: String) -> BusResult<String> {
        Ok(to_json(&self.supervisor.status(&parse_id(&id))?))
    }

    async fn update_pipeline(&self, id: String, pipeline: String) -> BusResult<bool> {
        self.supervisor.update_pipeline(&parse_id(&id), pipeline)?;
        Ok(true)
    }

    async fn get_instance_logs(&self, id: String, n: u32) -> BusResult<Vec<String>> {
        Ok(self.supervisor.get_logs(&parse_id(&id), n as usize)?)
    }

    async fn clear_instance_logs(&self, id: String) -> BusResult<bool> {
        self.supervisor.clear_logs(&parse_id(&id))?;
        Ok(true)
    }

    async fn get_board_context(&self) -> BusResult<String> {
        Ok(to_json(&self.discovery.get_context().await?))
    }

    async fn get_hdmi_status(&self) -> String {
        to_json(&self.monitor.get_status().await)
    }

    async fn get_passthrough_state(&self) -> String {
        to_json(&self.event_manager.passthrough_state())
    }

    async fn set_instance_autostart(&self, id: String, enabled: bool, trigger: String) -> BusResult<bool> {
        self.supervisor.set_autostart(&parse_id(&id), enabled, parse_trigger(&trigger))?;
        Ok(true)
    }

    async fn get_auto_instance_config(&self) -> String {
        to_json(&self.auto_controller.config().unwrap_or_default())
    }

    async fn set_auto_instance_config(&self, config: String) -> BusResult<bool> {
        let parsed: AutoConfig =
            serde_json::from_str(&config).map_err(|e| BusError::InvalidConfig(e.to_string()))?;
        self.auto_controller.create_or_update(parsed, self.event_manager.hdmi_status().as_ref()).await?;
        Ok(true)
    }

    async fn get_auto_instance_pipeline_preview(&self, config: String) -> BusResult<String> {
        let parsed: AutoConfig =
            serde_json::from_str(&config).map_err(|e| BusError::InvalidConfig(e.to_string()))?;
        parsed.validate().map_err(|field| BusError::InvalidConfig(field.to_string()))?;
        Ok(self.auto_controller.get_pipeline_preview(&parsed))
    }

    async fn delete_auto_instance(&self) -> BusResult<bool> {
        self.auto_controller.delete().await?;
        Ok(true)
    }

    async fn export_instance(&self, id: String) -> BusResult<String> {
        match self.store.export(&parse_id(&id))? {
            Some(text) => Ok(text),
            None => Err(Error::not_found(id).into()),
        }
    }

    async fn import_instance(&self, text: String) -> BusResult<String> {
        Ok(self.store.import(&text)?.to_string())
    }

    async fn ai_generate_pipeline(&self, prompt: String) -> BusResult<String> {
        Ok(self.generation_agent.generate_pipeline(&prompt).await?)
    }

    async fn ai_fix_error(&self, pipeline: String, stderr_tail: String) -> BusResult<String> {
        Ok(self.generation_agent.fix_error(&pipeline, &stderr_tail).await?)
    }

    #[zbus(signal)]
    async fn instance_status_changed(emitter: &SignalEmitter<'_>, id: String, state: String) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn hdmi_signal_changed(
        emitter: &SignalEmitter<'_>,
        available: bool,
        resolution: String,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn passthrough_state_changed(
        emitter: &SignalEmitter<'_>,
        can_capture: bool,
        state: String,
    ) -> zbus::Result<()>;
}

/// Subscribe to the daemon-wide event channel and re-emit each event as
/// the matching bus signal. Runs until the channel closes.
pub async fn spawn_signal_fanout(connection: zbus::Connection, mut events: broadcast::Receiver<DaemonEvent>) {
    tokio::spawn(async move {
        let iface_ref = match connection.object_server().interface::<_, BusService>(OBJECT_PATH).await {
            Ok(iface) => iface,
            Err(_) => return,
        };

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            };

            let emitter = iface_ref.signal_emitter();
            let _ = match event {
                DaemonEvent::InstanceStatusChanged { id, status } => {
                    BusService::instance_status_changed(emitter, id.to_string(), status.to_string()).await
                }
                DaemonEvent::HdmiSignalChanged { available, resolution } => {
                    BusService::hdmi_signal_changed(emitter, available, resolution.unwrap_or_default()).await
                }
                DaemonEvent::PassthroughStateChanged { can_capture, state } => {
                    BusService::passthrough_state_changed(emitter, can_capture, to_json(&state)).await
                }
            };
        }
    });
}
