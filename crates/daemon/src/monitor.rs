// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal Monitor: adaptive-interval HDMI input polling with a
//! coalesced stream of status changes, using the sysfs attribute names,
//! `parse_hdmi_info` regexes, adaptive poll/stability intervals, and a
//! `v4l2-ctl --query-dv-timings` subprocess fallback. A native
//! capability provider, when available, is represented here by
//! [`crate::collaborators::NativeSignalProvider`].

use gst_manager_core::{Provenance, SignalInfo};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::collaborators::NativeSignalProvider;

pub const POLL_NO_SIGNAL: Duration = Duration::from_secs(2);
pub const POLL_SIGNAL_ACTIVE: Duration = Duration::from_secs(5);
pub const POLL_STABILITY_CHECK: Duration = Duration::from_millis(500);

const HDMIRX_SYSFS_PATHS: &[&str] = &[
    "/sys/class/hdmirx/hdmirx0",
    "/sys/class/hdmirx/hdmirx1",
    "/sys/kernel/debug/hdmirx",
    "/sys/devices/platform/hdmirx",
];

const V4L2_DEVICES: &[&str] = &["/dev/video71", "/dev/video0", "/dev/vdin0"];

#[allow(clippy::expect_used)]
static RESOLUTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)x(\d+)([pi])(\d+)").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static COLOR_FORMAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(rgb|yuv|ycbcr)\d*").expect("constant regex pattern is valid"));

/// Parsed `WIDTHxHEIGHT[p|i]FPS` plus an optional color-format tag, shared by
/// the sysfs `info` attribute and the `v4l2-ctl` parenthetical form.
fn parse_resolution(info: &str) -> (u32, u32, u32, bool, String) {
    let lowered = info.to_lowercase();

    let (mut width, mut height, mut fps, mut interlaced) = (0, 0, 0, false);
    if let Some(caps) = RESOLUTION_PATTERN.captures(&lowered) {
        width = caps[1].parse().unwrap_or(0);
        height = caps[2].parse().unwrap_or(0);
        interlaced = &caps[3] == "i";
        fps = caps[4].parse().unwrap_or(0);
    }

    let color_format =
        COLOR_FORMAT_PATTERN.captures(&lowered).map(|c| c[0].to_uppercase()).unwrap_or_default();

    (width, height, fps, interlaced, color_format)
}

fn read_sysfs_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default().trim().to_string()
}

/// Parse `v4l2-ctl -d <dev> --query-dv-timings` stdout into
/// `(width, height, fps, interlaced)`. Tries the labeled `Width:`/`Height:`/
/// `fps` fields first, falling back to the parenthetical `(WxHp/iFPS)` form.
fn parse_v4l2_output(stdout: &str) -> Option<(u32, u32, u32, bool)> {
    #[allow(clippy::expect_used)]
    static WIDTH_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(?:active\s+)?width:\s*(\d+)").expect("constant regex pattern is valid"));
    #[allow(clippy::expect_used)]
    static HEIGHT_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(?:active\s+)?height:\s*(\d+)").expect("constant regex pattern is valid"));
    #[allow(clippy::expect_used)]
    static FPS_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*fps").expect("constant regex pattern is valid"));
    #[allow(clippy::expect_used)]
    static PAREN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\((\d+)x(\d+)([pi])(\d+(?:\.\d+)?)\)").expect("constant regex pattern is valid")
    });

    let mut width = WIDTH_PATTERN.captures(stdout).and_then(|c| c[1].parse().ok()).unwrap_or(0);
    let mut height = HEIGHT_PATTERN.captures(stdout).and_then(|c| c[1].parse().ok()).unwrap_or(0);
    let mut fps: u32 =
        FPS_PATTERN.captures(stdout).and_then(|c| c[1].parse::<f64>().ok()).map(|f| f as u32).unwrap_or(0);
    let mut interlaced = false;

    if let Some(caps) = PAREN_PATTERN.captures(stdout) {
        if width == 0 || height == 0 {
            width = caps[1].parse().unwrap_or(0);
            height = caps[2].parse().unwrap_or(0);
            interlaced = &caps[3] == "i";
            fps = caps[4].parse::<f64>().unwrap_or(0.0) as u32;
        }
    }

    if width == 0 {
        None
    } else {
        Some((width, height, fps, interlaced))
    }
}

/// Polls HDMI input state and exposes a coalesced stream of changes.
pub struct HdmiMonitor {
    native: Option<Arc<dyn NativeSignalProvider>>,
    sysfs_root_override: Option<PathBuf>,
    cached_sysfs_path: parking_lot::Mutex<Option<PathBuf>>,
}

impl HdmiMonitor {
    pub fn new(native: Option<Arc<dyn NativeSignalProvider>>) -> Self {
        Self { native, sysfs_root_override: None, cached_sysfs_path: parking_lot::Mutex::new(None) }
    }

    /// Restrict sysfs candidate search to a single root, for tests
    /// (`GSTMGR_HDMI_SYSFS_ROOT`).
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root_override = Some(root.into());
        self
    }

    fn candidate_sysfs_paths(&self) -> Vec<PathBuf> {
        match &self.sysfs_root_override {
            Some(root) => vec![root.clone()],
            None => HDMIRX_SYSFS_PATHS.iter().map(PathBuf::from).collect(),
        }
    }

    fn find_sysfs_path(&self) -> Option<PathBuf> {
        if let Some(cached) = self.cached_sysfs_path.lock().clone() {
            if cached.exists() {
                return Some(cached);
            }
        }
        let found = self.candidate_sysfs_paths().into_iter().find(|p| p.exists());
        *self.cached_sysfs_path.lock() = found.clone();
        found
    }

    fn read_sysfs_status(&self, path: &Path) -> SignalInfo {
        let cable = read_sysfs_file(&path.join("cable"));
        let cable_connected = matches!(cable.as_str(), "1" | "connected" | "true");

        let signal = read_sysfs_file(&path.join("signal"));
        let mut signal_locked = matches!(signal.as_str(), "1" | "locked" | "true");

        let raw_info = read_sysfs_file(&path.join("info"));
        let (width, height, fps, interlaced, color_format) =
            if raw_info.is_empty() { (0, 0, 0, false, String::new()) } else { parse_resolution(&raw_info) };
        if width > 0 && height > 0 {
            signal_locked = true;
        }

        SignalInfo {
            cable_connected,
            signal_locked,
            width,
            height,
            fps,
            interlaced,
            color_format,
            raw_source: raw_info,
            provenance: Provenance::Sysfs,
        }
    }

    async fn get_status_v4l2(&self) -> SignalInfo {
        for device in V4L2_DEVICES {
            if !Path::new(device).exists() {
                continue;
            }
            let output = tokio::time::timeout(
                Duration::from_secs(2),
                tokio::process::Command::new("v4l2-ctl").args(["-d", device, "--query-dv-timings"]).output(),
            )
            .await;

            let Ok(Ok(output)) = output else { continue };
            if !output.status.success() {
                continue;
            }
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            if let Some((width, height, fps, interlaced)) = parse_v4l2_output(&stdout) {
                let (_, _, _, _, color_format) = parse_resolution(&stdout);
                return SignalInfo {
                    cable_connected: true,
                    signal_locked: true,
                    width,
                    height,
                    fps,
                    interlaced,
                    color_format,
                    raw_source: stdout,
                    provenance: Provenance::V4l2,
                };
            }
        }
        SignalInfo::disconnected(Provenance::V4l2)
    }

    /// Read current HDMI status: native capability, then sysfs, then the
    /// `v4l2-ctl` subprocess fallback.
    pub async fn get_status(&self) -> SignalInfo {
        if let Some(native) = &self.native {
            if let Ok(info) = native.get_signal_info().await {
                return info;
            }
        }

        if let Some(path) = self.find_sysfs_path() {
            return self.read_sysfs_status(&path);
        }

        self.get_status_v4l2().await
    }

    /// Spawn the adaptive-polling loop. Each significant, debounced change is
    /// sent on the returned channel; the returned token cancels the loop.
    pub fn spawn(self: Arc<Self>) -> (mpsc::Receiver<SignalInfo>, CancellationToken) {
        let (tx, rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        let loop_token = token.clone();

        tokio::spawn(async move {
            let mut last: Option<SignalInfo> = None;
            loop {
                if loop_token.is_cancelled() {
                    break;
                }
                let mut status = self.get_status().await;

                let changed = last.as_ref().map(|l| status.significantly_differs_from(l)).unwrap_or(true);
                if changed {
                    tokio::select! {
                        _ = tokio::time::sleep(POLL_STABILITY_CHECK) => {}
                        _ = loop_token.cancelled() => break,
                    }
                    status = self.get_status().await;
                    let still_changed =
                        last.as_ref().map(|l| status.significantly_differs_from(l)).unwrap_or(true);
                    if still_changed {
                        last = Some(status.clone());
                        if tx.send(status.clone()).await.is_err() {
                            break;
                        }
                    }
                }

                let interval = if status.signal_locked { POLL_SIGNAL_ACTIVE } else { POLL_NO_SIGNAL };
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = loop_token.cancelled() => break,
                }
            }
        });

        (rx, token)
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
