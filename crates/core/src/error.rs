// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error *kinds* shared across the Store, Supervisor, Controller, and the
//! bus façade. Independent of transport: the bus façade is the only
//! place that maps these onto typed D-Bus error names.

use thiserror::Error;

/// The reason an operation failed, independent of how it is surfaced.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("instance not found: {0}")]
    NotFound(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O failure: {0}")]
    IoFailure(String),

    #[error("child process failure: {0}")]
    ChildFailure(String),

    #[error("collaborator unavailable: {0}")]
    UnavailableCollaborator(String),
}

/// A boxed, `Send + Sync` error carrying an [`ErrorKind`].
///
/// Kept as a thin newtype (rather than bare `ErrorKind`) so call sites can
/// freely use `?` against `std::io::Error` and `serde_json::Error` via
/// [`From`] without every caller needing to know the underlying cause.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
}

impl Error {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self { kind: ErrorKind::NotFound(id.into()) }
    }

    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::IllegalState(msg.into()) }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::InvalidInput(msg.into()) }
    }

    pub fn io_failure(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::IoFailure(msg.into()) }
    }

    pub fn child_failure(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::ChildFailure(msg.into()) }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::UnavailableCollaborator(msg.into()) }
    }

    /// Short, machine-parseable name for the bus error mapping.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::NotFound(_) => "InstanceNotFound",
            ErrorKind::IllegalState(_) => "InstanceRunning",
            ErrorKind::InvalidInput(_) => "InvalidConfig",
            ErrorKind::IoFailure(_) | ErrorKind::ChildFailure(_) | ErrorKind::UnavailableCollaborator(_) => {
                "Error"
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::io_failure(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::io_failure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
