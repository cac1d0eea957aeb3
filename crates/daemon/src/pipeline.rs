// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline Builder: turns an [`AutoConfig`] into the opaque
//! launcher string handed to the Supervisor. The only part of a pipeline
//! text this daemon ever constructs itself — everything else is passed
//! through unexamined.

use gst_manager_core::AutoConfig;

const VIDEO_DEVICE: &str = "/dev/video71";

/// Build the complete `gst-launch-1.0` pipeline text for `config`.
pub fn build(config: &AutoConfig) -> String {
    let gop = config.gop();
    let audio_device = config.audio_source.device();

    let mut pipeline = format!(
        "v4l2src device={video} io-mode=dmabuf do-timestamp=true ! \
video/x-raw,format=NV21,width={w},height={h},framerate={fps}/1 ! \
queue max-size-buffers=30 max-size-time=0 max-size-bytes=0 ! \
amlvenc gop={gop} gop-pattern=0 framerate={fps} bitrate={bitrate} rc-mode={rc_mode} ! \
video/x-h265 ! \
h265parse config-interval=-1 ! \
queue max-size-buffers=30 max-size-time=0 max-size-bytes=0 ! \
mux. \
alsasrc device={audio_device} buffer-time=50000 provide-clock=false slave-method=re-timestamp ! \
audio/x-raw,rate=48000,channels=2,format=S16LE ! \
queue max-size-buffers=0 max-size-time=500000000 max-size-bytes=0 ! \
audioconvert ! audioresample ! avenc_aac bitrate=128000 ! aacparse ! \
queue max-size-buffers=0 max-size-time=500000000 max-size-bytes=0 ! \
mux. \
mpegtsmux name=mux alignment=7 latency=100000000",
        video = VIDEO_DEVICE,
        w = config.width,
        h = config.height,
        fps = config.framerate,
        bitrate = config.bitrate_kbps,
        rc_mode = config.rc_mode,
    );

    if config.recording_enabled {
        pipeline.push_str(&format!(
            " ! tee name=t \
t. ! queue ! filesink location=\"{path}\" \
t. ! queue ! srtsink uri=\"srt://:{port}\" wait-for-connection=false latency=600 sync=false",
            path = config.recording_path,
            port = config.srt_port,
        ));
    } else {
        pipeline.push_str(&format!(
            " ! srtsink uri=\"srt://:{port}\" wait-for-connection=false latency=600 sync=false",
            port = config.srt_port,
        ));
    }

    pipeline
}

/// Multi-line rendering of [`build`] for display purposes only — never
/// tokenized or executed.
pub fn build_preview(config: &AutoConfig) -> String {
    build(config).replace(" ! ", " ! \n   ")
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
