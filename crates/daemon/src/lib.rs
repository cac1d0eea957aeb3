// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gst-manager daemon library: the supervisory core for the `gst-managerd`
//! binary — instance supervision, persistence, HDMI signal monitoring,
//! the auto-instance controller, event fan-out, and the bus façade.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod auto_controller;
pub mod bus;
pub mod collaborators;
pub mod env;
pub mod event;
pub mod event_manager;
pub mod monitor;
pub mod pipeline;
pub mod supervisor;

pub use auto_controller::AutoController;
pub use bus::{BusService, BUS_NAME, OBJECT_PATH};
pub use collaborators::{
    BoardContext, DiscoveryProvider, GenerationAgent, NativeSignalProvider, UnavailableDiscoveryProvider,
    UnavailableGenerationAgent, UnavailableNativeSignalProvider,
};
pub use event::DaemonEvent;
pub use event_manager::EventManager;
pub use monitor::HdmiMonitor;
pub use supervisor::{StatusView, Supervisor};
