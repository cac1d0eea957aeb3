// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HDMI input (RX) and output (TX) signal state, and the composite
//! passthrough projection over both.

use serde::{Deserialize, Serialize};

/// Where a `SignalInfo` reading was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Native,
    Sysfs,
    V4l2,
}

crate::simple_display! {
    Provenance {
        Native => "native",
        Sysfs => "sysfs",
        V4l2 => "v4l2",
    }
}

/// HDMI input (RX) side status, as produced by the Signal Monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalInfo {
    pub cable_connected: bool,
    pub signal_locked: bool,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub interlaced: bool,
    pub color_format: String,
    pub raw_source: String,
    pub provenance: Provenance,
}

impl SignalInfo {
    pub fn disconnected(provenance: Provenance) -> Self {
        Self {
            cable_connected: false,
            signal_locked: false,
            width: 0,
            height: 0,
            fps: 0,
            interlaced: false,
            color_format: String::new(),
            raw_source: String::new(),
            provenance,
        }
    }

    /// `"{W}x{H}{p|i}{fps}"`, only meaningful once `signal_locked`.
    pub fn resolution(&self) -> Option<String> {
        if !self.signal_locked {
            return None;
        }
        Some(format!(
            "{}x{}{}{}",
            self.width,
            self.height,
            if self.interlaced { "i" } else { "p" },
            self.fps
        ))
    }

    /// A "significant change": locked/connected/width/height/fps differ.
    pub fn significantly_differs_from(&self, other: &SignalInfo) -> bool {
        self.signal_locked != other.signal_locked
            || self.cable_connected != other.cable_connected
            || self.width != other.width
            || self.height != other.height
            || self.fps != other.fps
    }
}

/// HDMI output (TX) side status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxStatus {
    pub connected: bool,
    pub enabled: bool,
    pub ready: bool,
    pub passthrough: bool,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub timing_name: String,
}

/// Composite projection over the most recent `SignalInfo` and `TxStatus`,
/// plus the settle timer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassthroughState {
    pub rx_stable: bool,
    pub tx_ready: bool,
    pub tx_connected: bool,
    pub can_capture: bool,
    pub resolution: Option<String>,
}

impl PassthroughState {
    pub fn evaluate(rx_stable: bool, tx: Option<&TxStatus>) -> Self {
        let tx_ready = tx.map(|t| t.ready).unwrap_or(false);
        let tx_connected = tx.map(|t| t.connected).unwrap_or(false);
        let can_capture = rx_stable && tx_ready && tx_connected;
        let resolution = tx.filter(|_| can_capture).map(|t| format!("{}x{}p{}", t.width, t.height, t.fps));
        Self { rx_stable, tx_ready, tx_connected, can_capture, resolution }
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
