// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events fanned out from the Supervisor and Event Manager to anything
//! subscribed — presently just the bus façade, which re-emits each as a
//! zbus signal.

use gst_manager_core::{InstanceId, InstanceStatus, PassthroughState};

#[derive(Debug, Clone)]
pub enum DaemonEvent {
    InstanceStatusChanged { id: InstanceId, status: InstanceStatus },
    HdmiSignalChanged { available: bool, resolution: Option<String> },
    PassthroughStateChanged { can_capture: bool, state: PassthroughState },
}
