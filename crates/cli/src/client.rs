// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin `zbus` proxy for the `org.gstmanager.Daemon1` bus surface.
//! Mirrors the server-side interface in `gst-manager-daemon::bus` method
//! for method; kept here rather than imported because the CLI talks to
//! the daemon over the bus and never links its internals.

use zbus::{proxy, Connection};

/// Matches `gst_manager_daemon::bus::BUS_NAME`.
pub const BUS_NAME: &str = "org.gstmanager.Daemon1";
/// Matches `gst_manager_daemon::bus::OBJECT_PATH`.
pub const OBJECT_PATH: &str = "/org/gstmanager/Daemon1";

#[proxy(
    interface = "org.gstmanager.Daemon1",
    default_service = "org.gstmanager.Daemon1",
    default_path = "/org/gstmanager/Daemon1"
)]
pub trait Daemon1 {
    async fn list_instances(&self) -> zbus::Result<String>;
    async fn create_instance(&self, name: &str, pipeline: &str) -> zbus::Result<String>;
    async fn delete_instance(&self, id: &str) -> zbus::Result<bool>;
    async fn start_instance(&self, id: &str) -> zbus::Result<bool>;
    async fn stop_instance(&self, id: &str) -> zbus::Result<bool>;
    async fn get_instance_status(&self, id: &str) -> zbus::Result<String>;
    async fn update_pipeline(&self, id: &str, pipeline: &str) -> zbus::Result<bool>;
    async fn get_instance_logs(&self, id: &str, n: u32) -> zbus::Result<Vec<String>>;
    async fn clear_instance_logs(&self, id: &str) -> zbus::Result<bool>;
    async fn get_board_context(&self) -> zbus::Result<String>;
    async fn get_hdmi_status(&self) -> zbus::Result<String>;
    async fn get_passthrough_state(&self) -> zbus::Result<String>;
    async fn set_instance_autostart(&self, id: &str, enabled: bool, trigger: &str) -> zbus::Result<bool>;
    async fn get_auto_instance_config(&self) -> zbus::Result<String>;
    async fn set_auto_instance_config(&self, config: &str) -> zbus::Result<bool>;
    async fn get_auto_instance_pipeline_preview(&self, config: &str) -> zbus::Result<String>;
    async fn delete_auto_instance(&self) -> zbus::Result<bool>;
    async fn export_instance(&self, id: &str) -> zbus::Result<String>;
    async fn import_instance(&self, text: &str) -> zbus::Result<String>;
    async fn ai_generate_pipeline(&self, prompt: &str) -> zbus::Result<String>;
    async fn ai_fix_error(&self, pipeline: &str, stderr_tail: &str) -> zbus::Result<String>;

    #[zbus(signal)]
    fn instance_status_changed(&self, id: String, state: String) -> zbus::Result<()>;
    #[zbus(signal)]
    fn hdmi_signal_changed(&self, available: bool, resolution: String) -> zbus::Result<()>;
    #[zbus(signal)]
    fn passthrough_state_changed(&self, can_capture: bool, state: String) -> zbus::Result<()>;
}

/// Connect to the system bus and bind the `Daemon1` proxy.
pub async fn connect() -> zbus::Result<Daemon1Proxy<'static>> {
    let connection = Connection::system().await?;
    Daemon1Proxy::new(&connection).await
}
