// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_expected_capture_settings() {
    let cfg = AutoConfig::default();
    assert_eq!(cfg.gop_interval_seconds, 1.0);
    assert_eq!(cfg.bitrate_kbps, 20_000);
    assert_eq!(cfg.rc_mode, RateControlMode::Cbr.as_u8());
    assert_eq!(cfg.audio_source, AudioSource::PrimaryLoopback);
    assert_eq!(cfg.srt_port, 8888);
    assert!(!cfg.recording_enabled);
    assert_eq!(cfg.recording_path, "/mnt/sdcard/recordings/capture.ts");
    assert!(cfg.autostart_on_ready);
    assert_eq!((cfg.width, cfg.height, cfg.framerate), (3840, 2160, 60));
}

#[test]
fn gop_boundary_example_from_spec() {
    let mut cfg = AutoConfig::default();
    cfg.gop_interval_seconds = 1.0;
    cfg.framerate = 60;
    assert_eq!(cfg.gop(), 60);
}

#[test]
fn audio_source_devices() {
    assert_eq!(AudioSource::PrimaryLoopback.device(), "hw:0,6");
    assert_eq!(AudioSource::LineIn.device(), "hw:0,0");
}

#[test]
fn validate_rejects_out_of_range_rc_mode() {
    let mut cfg = AutoConfig::default();
    cfg.rc_mode = 9;
    assert_eq!(cfg.validate(), Err("rc_mode"));
}

#[test]
fn validate_rejects_out_of_range_srt_port() {
    let mut cfg = AutoConfig::default();
    cfg.srt_port = 0;
    assert_eq!(cfg.validate(), Err("srt_port"));
}

#[test]
fn validate_accepts_defaults() {
    assert!(AutoConfig::default().validate().is_ok());
}

#[test]
fn apply_partial_only_touches_recognized_fields() {
    let mut cfg = AutoConfig::default();
    let patch = serde_json::json!({ "bitrate_kbps": 5000, "unknown_field": true });
    cfg.apply_partial(&patch);
    assert_eq!(cfg.bitrate_kbps, 5000);
    assert_eq!(cfg.srt_port, 8888);
}
