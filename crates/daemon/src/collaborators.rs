// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow adapter traits for out-of-scope external collaborators:
//! hardware discovery, a native signal-reading capability, and the
//! natural-language pipeline-generation agent. Each ships only an
//! "unavailable" stub, keeping the daemon compilable with zero native
//! dependencies while leaving a seam for a real binding.

use async_trait::async_trait;
use gst_manager_core::{Error, TxStatus};
use serde::{Deserialize, Serialize};

/// A snapshot of the board's media capabilities, as reported by the
/// hardware-discovery collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardContext {
    pub video_devices: Vec<String>,
    pub audio_devices: Vec<String>,
    pub encoders: Vec<String>,
}

/// Read-only hardware/device enumeration. Out of scope for this daemon;
/// the default binding always reports `UnavailableCollaborator`.
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    async fn get_context(&self) -> Result<BoardContext, Error>;
}

pub struct UnavailableDiscoveryProvider;

#[async_trait]
impl DiscoveryProvider for UnavailableDiscoveryProvider {
    async fn get_context(&self) -> Result<BoardContext, Error> {
        Err(Error::unavailable("hardware discovery provider not configured"))
    }
}

/// A native, in-process way of reading HDMI signal state, preferred over
/// the sysfs/subprocess fallbacks in the Signal Monitor when present.
#[async_trait]
pub trait NativeSignalProvider: Send + Sync {
    async fn get_signal_info(&self) -> Result<gst_manager_core::SignalInfo, Error>;
    async fn get_source_connected(&self) -> Result<bool, Error>;
    async fn get_tx_status(&self) -> Result<TxStatus, Error>;
}

pub struct UnavailableNativeSignalProvider;

#[async_trait]
impl NativeSignalProvider for UnavailableNativeSignalProvider {
    async fn get_signal_info(&self) -> Result<gst_manager_core::SignalInfo, Error> {
        Err(Error::unavailable("native signal provider not configured"))
    }

    async fn get_source_connected(&self) -> Result<bool, Error> {
        Err(Error::unavailable("native signal provider not configured"))
    }

    async fn get_tx_status(&self) -> Result<TxStatus, Error> {
        Err(Error::unavailable("native signal provider not configured"))
    }
}

/// Natural-language pipeline generation/repair, invoked via `AiGeneratePipeline`
/// and `AiFixError`. Out of scope for this daemon; returns opaque text
/// and never touches core state.
#[async_trait]
pub trait GenerationAgent: Send + Sync {
    async fn generate_pipeline(&self, prompt: &str) -> Result<String, Error>;
    async fn fix_error(&self, pipeline: &str, stderr_tail: &str) -> Result<String, Error>;
}

pub struct UnavailableGenerationAgent;

#[async_trait]
impl GenerationAgent for UnavailableGenerationAgent {
    async fn generate_pipeline(&self, _prompt: &str) -> Result<String, Error> {
        Err(Error::unavailable("pipeline generation agent not configured"))
    }

    async fn fix_error(&self, _pipeline: &str, _stderr_tail: &str) -> Result<String, Error> {
        Err(Error::unavailable("pipeline generation agent not configured"))
    }
}
