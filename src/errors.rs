//! Unified error types for kprobe-counter
//!
//! Every failure the worker can hit maps onto one of these variants:
//! daemon channel problems, install/uninstall failures, map path
//! resolution failures, and counter map open/read failures. None of
//! them are retried internally; each is terminal for the current run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("failed to connect to daemon at {socket}: {source}")]
    DaemonConnectionFailed {
        socket: String,
        source: anyhow::Error,
    },

    #[error("daemon is not reachable on this path: {operation}")]
    DaemonUnavailable { operation: &'static str },

    #[error("daemon rejected {operation}: {message}")]
    DaemonRejected {
        operation: &'static str,
        message: String,
    },

    #[error("install call failed: {source}")]
    InstallFailed { source: anyhow::Error },

    #[error("uninstall call failed for program {prog_id}: {source}")]
    UninstallFailed {
        prog_id: u32,
        source: anyhow::Error,
    },

    #[error("could not resolve counter map path: {message}")]
    PathResolutionFailed { message: String },

    #[error("map path lookup failed for program {prog_id}: {source}")]
    PathLookupFailed {
        prog_id: u32,
        source: anyhow::Error,
    },

    #[error("could not open pinned counter map {path}: {source}")]
    MapOpenFailed {
        path: String,
        source: anyhow::Error,
    },

    #[error("failed to read counter map {path}: {source}")]
    MapReadFailed {
        path: String,
        source: anyhow::Error,
    },

    #[error("configuration error: {message}")]
    ConfigError { message: String },
}

pub type Result<T> = std::result::Result<T, CounterError>;
