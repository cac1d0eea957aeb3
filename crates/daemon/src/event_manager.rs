// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Manager: composes the Signal Monitor with the
//! Auto-Instance Controller into the RX-then-TX-settle passthrough state
//! machine, and fans out the resulting events. Applies a 1.5s TX-settle
//! delay after an RX-ready edge, and stops legacy manual instances whose
//! pipeline references the capture device on signal loss.

use gst_manager_core::{InstanceStatus, PassthroughState, Provenance, SignalInfo, TxStatus};
use parking_lot::Mutex;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::auto_controller::AutoController;
use crate::collaborators::NativeSignalProvider;
use crate::event::DaemonEvent;
use crate::monitor::HdmiMonitor;
use crate::supervisor::Supervisor;

/// Delay after an RX-ready edge before TX status is consulted.
pub const TX_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// The legacy capture device path — distinct from the TX capture device
/// at `/dev/video71` used by the auto instance. Running manual instances
/// whose pipeline text references it are stopped when RX signal is lost.
const LEGACY_CAPTURE_DEVICE: &str = "/dev/vdin1";

/// Candidate base paths for the TX-side sysfs attributes (`ready`,
/// `is_passthrough_switch`, `disp_mode`), tried when no native signal
/// provider is configured. Mirrors the RX candidate list in `monitor.rs`.
const TX_SYSFS_PATHS: &[&str] = &["/sys/class/amhdmitx/amhdmitx0", "/sys/devices/platform/amhdmitx"];

#[allow(clippy::expect_used)]
static DISP_MODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)x(\d+)[pi](\d+)").expect("constant regex pattern is valid"));

/// Parse a `disp_mode` timing name of the form `WxH[p|i]FPSHZ` (e.g.
/// `3840x2160p60hz`) into `(width, height, fps)`.
fn parse_disp_mode(timing: &str) -> Option<(u32, u32, u32)> {
    let caps = DISP_MODE_PATTERN.captures(timing.trim())?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?))
}

fn read_sysfs_attr(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default().trim().to_string()
}

/// Read TX status from the sysfs attribute fallback, trying each
/// candidate base path in turn. Returns the default (all-false) status if
/// none of the candidates exist.
fn read_tx_status_sysfs(root_override: Option<&Path>) -> TxStatus {
    let candidates: Vec<PathBuf> = match root_override {
        Some(root) => vec![root.to_path_buf()],
        None => TX_SYSFS_PATHS.iter().map(PathBuf::from).collect(),
    };
    let Some(base) = candidates.into_iter().find(|p| p.exists()) else {
        return TxStatus::default();
    };

    let ready = matches!(read_sysfs_attr(&base.join("ready")).as_str(), "1" | "true");
    let passthrough = matches!(read_sysfs_attr(&base.join("is_passthrough_switch")).as_str(), "1" | "true");
    let timing_name = read_sysfs_attr(&base.join("disp_mode"));
    let (width, height, fps) = parse_disp_mode(&timing_name).unwrap_or((0, 0, 0));
    let connected = width > 0 && height > 0;

    TxStatus { connected, enabled: ready, ready, passthrough, width, height, fps, timing_name }
}

struct EventState {
    rx_stable: bool,
    last_signal: Option<SignalInfo>,
    tx_status: Option<TxStatus>,
    last_passthrough: Option<PassthroughState>,
}

/// Coordinates the Signal Monitor with the Auto-Instance Controller and
/// fans out `DaemonEvent`s to any subscriber (presently the bus façade).
pub struct EventManager {
    supervisor: Arc<Supervisor>,
    auto_controller: Arc<AutoController>,
    native: Option<Arc<dyn NativeSignalProvider>>,
    tx_sysfs_root_override: Option<PathBuf>,
    events: broadcast::Sender<DaemonEvent>,
    state: Mutex<EventState>,
}

impl EventManager {
    pub fn new(
        supervisor: Arc<Supervisor>,
        auto_controller: Arc<AutoController>,
        native: Option<Arc<dyn NativeSignalProvider>>,
        events: broadcast::Sender<DaemonEvent>,
    ) -> Self {
        Self {
            supervisor,
            auto_controller,
            native,
            tx_sysfs_root_override: None,
            events,
            state: Mutex::new(EventState {
                rx_stable: false,
                last_signal: None,
                tx_status: None,
                last_passthrough: None,
            }),
        }
    }

    /// Restrict the TX sysfs candidate search to a single root, for tests
    /// (`GSTMGR_HDMI_SYSFS_ROOT`).
    pub fn with_tx_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.tx_sysfs_root_override = Some(root.into());
        self
    }

    pub fn passthrough_state(&self) -> PassthroughState {
        self.state.lock().last_passthrough.clone().unwrap_or_default()
    }

    pub fn hdmi_status(&self) -> Option<SignalInfo> {
        self.state.lock().last_signal.clone()
    }

    fn emit(&self, event: DaemonEvent) {
        let _ = self.events.send(event);
    }

    /// Spawn the signal monitor's polling loop and begin reacting to its
    /// coalesced change stream. Cancelling the returned token stops both
    /// the monitor and this coordinator.
    pub fn spawn(self: Arc<Self>, monitor: Arc<HdmiMonitor>) -> CancellationToken {
        let (mut rx, monitor_token) = monitor.spawn();
        let coordinator_token = CancellationToken::new();
        let loop_token = coordinator_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    maybe_status = rx.recv() => {
                        match maybe_status {
                            Some(status) => self.clone().on_signal_change(status).await,
                            None => break,
                        }
                    }
                }
            }
            monitor_token.cancel();
        });

        coordinator_token
    }

    async fn on_signal_change(self: Arc<Self>, status: SignalInfo) {
        let was_locked = {
            let mut state = self.state.lock();
            let was_locked = state.last_signal.as_ref().map(|s| s.signal_locked).unwrap_or(false);
            state.last_signal = Some(status.clone());
            was_locked
        };

        self.emit(DaemonEvent::HdmiSignalChanged {
            available: status.signal_locked,
            resolution: status.resolution(),
        });

        if status.signal_locked && !was_locked {
            self.clone().on_rx_ready();
        } else if !status.signal_locked && was_locked {
            self.on_rx_lost().await;
        }
    }

    /// RX became stable: start the 1.5s TX-settle timer, cancelling and
    /// replacing any timer already in flight.
    fn on_rx_ready(self: Arc<Self>) {
        self.state.lock().rx_stable = true;

        tokio::spawn(async move {
            tokio::time::sleep(TX_SETTLE_DELAY).await;
            if !self.state.lock().rx_stable {
                return;
            }
            self.check_tx_status().await;
        });
    }

    async fn on_rx_lost(&self) {
        {
            let mut state = self.state.lock();
            state.rx_stable = false;
            state.tx_status = None;
        }
        self.evaluate_passthrough().await;
        self.stop_legacy_instances().await;
    }

    async fn check_tx_status(&self) {
        let tx = match &self.native {
            Some(native) => native.get_tx_status().await.unwrap_or_default(),
            None => read_tx_status_sysfs(self.tx_sysfs_root_override.as_deref()),
        };
        self.state.lock().tx_status = Some(tx);
        self.evaluate_passthrough().await;
    }

    async fn evaluate_passthrough(&self) {
        let (rx_stable, tx) = {
            let state = self.state.lock();
            (state.rx_stable, state.tx_status.clone())
        };
        let current = PassthroughState::evaluate(rx_stable, tx.as_ref());

        let changed = {
            let mut state = self.state.lock();
            let changed = state
                .last_passthrough
                .as_ref()
                .map(|p| p.can_capture != current.can_capture || p.resolution != current.resolution)
                .unwrap_or(true);
            state.last_passthrough = Some(current.clone());
            changed
        };
        if !changed {
            return;
        }

        self.emit(DaemonEvent::PassthroughStateChanged { can_capture: current.can_capture, state: current.clone() });

        if current.can_capture {
            if let Some(tx) = tx {
                let info = SignalInfo {
                    cable_connected: true,
                    signal_locked: true,
                    width: tx.width,
                    height: tx.height,
                    fps: tx.fps,
                    interlaced: false,
                    color_format: String::new(),
                    raw_source: String::new(),
                    provenance: Provenance::Native,
                };
                let _ = self.auto_controller.on_passthrough_ready(&info).await;
            }
        } else {
            let _ = self.auto_controller.on_passthrough_lost().await;
        }
    }

    /// Stop any running manual instance whose pipeline text still
    /// references the legacy capture device, since losing RX means that
    /// device is no longer backed by a live signal.
    async fn stop_legacy_instances(&self) {
        for inst in self.supervisor.list() {
            if inst.status == InstanceStatus::Running && inst.pipeline.contains(LEGACY_CAPTURE_DEVICE) {
                let _ = self.supervisor.stop(&inst.id).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "event_manager_tests.rs"]
mod tests;
