// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gst-manager-core: domain types shared by the storage, daemon, and CLI
//! crates of the HDMI capture-pipeline supervisor.

pub mod macros;

pub mod auto_config;
pub mod clock;
pub mod error;
pub mod id;
pub mod instance;
pub mod signal;

pub use auto_config::{AudioSource, AutoConfig, RateControlMode};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{Error, ErrorKind};
pub use id::InstanceId;
pub use instance::{
    Instance, InstanceStatus, InstanceType, RecordingConfig, RecoveryConfig, TriggerEvent,
    ERROR_LOG_CAPACITY,
};
pub use signal::{PassthroughState, Provenance, SignalInfo, TxStatus};
