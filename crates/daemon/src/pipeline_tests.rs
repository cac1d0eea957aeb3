// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gst_manager_core::AutoConfig;

#[test]
fn default_config_produces_srt_only_pipeline() {
    let config = AutoConfig::default();
    let pipeline = build(&config);

    assert!(pipeline.starts_with("v4l2src device=/dev/video71 io-mode=dmabuf do-timestamp=true"));
    assert!(pipeline.contains("width=3840,height=2160,framerate=60/1"));
    assert!(pipeline.contains("gop=60")); // framerate(60) * gop_interval_seconds(1.0)
    assert!(pipeline.contains("bitrate=20000 rc-mode=1"));
    assert!(pipeline.contains("alsasrc device=hw:0,6"));
    assert!(pipeline.contains("mpegtsmux name=mux alignment=7 latency=100000000"));
    assert!(pipeline.ends_with("srtsink uri=\"srt://:8888\" wait-for-connection=false latency=600 sync=false"));
    assert!(!pipeline.contains("tee name=t"));
}

#[test]
fn recording_enabled_tees_to_filesink_and_srtsink() {
    let mut config = AutoConfig::default();
    config.recording_enabled = true;
    config.recording_path = "/mnt/sdcard/recordings/capture.ts".to_string();
    let pipeline = build(&config);

    assert!(pipeline.contains("tee name=t"));
    assert!(pipeline.contains("t. ! queue ! filesink location=\"/mnt/sdcard/recordings/capture.ts\""));
    assert!(pipeline.contains("t. ! queue ! srtsink uri=\"srt://:8888\""));
}

#[test]
fn line_in_audio_source_uses_hw_0_0() {
    let mut config = AutoConfig::default();
    config.audio_source = gst_manager_core::AudioSource::LineIn;
    let pipeline = build(&config);
    assert!(pipeline.contains("alsasrc device=hw:0,0"));
}

#[test]
fn build_preview_breaks_after_every_element() {
    let config = AutoConfig::default();
    let preview = build_preview(&config);
    assert!(preview.contains(" ! \n   "));
    assert!(!preview.contains(" ! v4l2src")); // never reintroduces the raw form mid-line
}
