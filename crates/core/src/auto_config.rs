// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for the singleton auto-managed capture instance.

use serde::{Deserialize, Serialize};

/// Selects one of two fixed audio capture devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    PrimaryLoopback,
    LineIn,
}

impl AudioSource {
    /// ALSA device string wired into the pipeline's audio branch.
    pub fn device(self) -> &'static str {
        match self {
            Self::PrimaryLoopback => "hw:0,6",
            Self::LineIn => "hw:0,0",
        }
    }
}

impl Default for AudioSource {
    fn default() -> Self {
        Self::PrimaryLoopback
    }
}

/// Encoder rate-control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RateControlMode {
    Vbr = 0,
    Cbr = 1,
    FixedQp = 2,
}

impl RateControlMode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Vbr),
            1 => Some(Self::Cbr),
            2 => Some(Self::FixedQp),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Recognized auto-instance configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoConfig {
    pub gop_interval_seconds: f64,
    pub bitrate_kbps: u32,
    pub rc_mode: u8,
    pub audio_source: AudioSource,
    pub srt_port: u16,
    pub recording_enabled: bool,
    pub recording_path: String,
    pub autostart_on_ready: bool,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            gop_interval_seconds: 1.0,
            bitrate_kbps: 20_000,
            rc_mode: RateControlMode::Cbr.as_u8(),
            audio_source: AudioSource::PrimaryLoopback,
            srt_port: 8888,
            recording_enabled: false,
            recording_path: "/mnt/sdcard/recordings/capture.ts".to_string(),
            autostart_on_ready: true,
            width: 3840,
            height: 2160,
            framerate: 60,
        }
    }
}

impl AutoConfig {
    /// Validate the enumerated-range fields.
    /// Returns the name of the first field that failed validation.
    pub fn validate(&self) -> Result<(), &'static str> {
        if RateControlMode::from_u8(self.rc_mode).is_none() {
            return Err("rc_mode");
        }
        if self.srt_port == 0 {
            return Err("srt_port");
        }
        if self.gop_interval_seconds <= 0.0 {
            return Err("gop_interval_seconds");
        }
        if self.bitrate_kbps == 0 {
            return Err("bitrate_kbps");
        }
        Ok(())
    }

    /// `gop := round(framerate × gop_interval_seconds)`.
    pub fn gop(&self) -> u32 {
        (self.framerate as f64 * self.gop_interval_seconds).round() as u32
    }

    /// Apply only the recognized option fields from a partial JSON patch,
    /// leaving unrecognized keys and omitted fields untouched. Used by
    /// `Controller::update_config`.
    pub fn apply_partial(&mut self, patch: &serde_json::Value) {
        let serde_json::Value::Object(map) = patch else { return };
        let mut current = serde_json::to_value(&*self).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(ref mut current_map) = current {
            for (k, v) in map {
                if current_map.contains_key(k) {
                    current_map.insert(k.clone(), v.clone());
                }
            }
        }
        if let Ok(updated) = serde_json::from_value(current) {
            *self = updated;
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    crate::setters! {
        set {
            gop_interval_seconds: f64,
            bitrate_kbps: u32,
            rc_mode: u8,
            audio_source: AudioSource,
            srt_port: u16,
            recording_enabled: bool,
            autostart_on_ready: bool,
            width: u32,
            height: u32,
            framerate: u32
        }
        into { recording_path: String }
    }
}

#[cfg(test)]
#[path = "auto_config_tests.rs"]
mod tests;
