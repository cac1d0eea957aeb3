// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-local error type. Per the ambient-stack decision to stay
//! `anyhow`-free, every command function returns this
//! concrete enum; only `main` collapses it to an [`crate::exit_error::ExitError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not connect to gst-managerd on the system bus: {0}")]
    Connect(#[source] zbus::Error),

    #[error("{name}: {message}")]
    Daemon { name: String, message: String },

    #[error("bus call failed: {0}")]
    Bus(#[source] zbus::Error),

    #[error("malformed JSON from daemon: {0}")]
    Json(#[source] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<zbus::Error> for CliError {
    fn from(e: zbus::Error) -> Self {
        match &e {
            zbus::Error::MethodError(name, detail, _) => CliError::Daemon {
                name: name.to_string(),
                message: detail.clone().unwrap_or_default(),
            },
            _ => CliError::Bus(e),
        }
    }
}

impl CliError {
    /// Process exit code for this error: every bus error maps to a typed
    /// error with a short, machine-parseable name.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Connect(_) | CliError::Bus(_) => 2,
            CliError::Daemon { .. } => 3,
            CliError::Json(_) => 4,
            CliError::Usage(_) => 64,
        }
    }
}
