//! Unix-socket daemon client.
//!
//! Speaks a newline-delimited JSON request/response protocol over the
//! daemon's well-known socket. One request is in flight at a time; the
//! stream is locked per call. No retries here: a failed call is the
//! caller's problem.

use std::path::Path;

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::UnixStream;
use tokio::sync::Mutex;

use super::protocol::{InstallRequest, InstallResponse};
use super::DaemonClient;
use crate::errors::{CounterError, Result};

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct UninstallParams {
    prog_id: u32,
}

#[derive(Serialize)]
struct MapPathParams<'a> {
    prog_id: u32,
    map_name: &'a str,
}

#[derive(Deserialize)]
struct MapPathResult {
    path: String,
}

/// Transport failures and daemon-reported rejections, kept apart so each
/// facade method can attach its own context.
enum CallError {
    Transport(anyhow::Error),
    Rejected(String),
}

#[derive(Debug)]
pub struct SocketClient {
    stream: Mutex<BufStream<UnixStream>>,
}

impl SocketClient {
    /// Returns a connected handle or a descriptive failure; no daemon call
    /// is attempted before this succeeds.
    pub async fn connect<P: AsRef<Path>>(socket_path: P) -> Result<Self> {
        let socket_path = socket_path.as_ref();
        let stream = UnixStream::connect(socket_path).await.map_err(|e| {
            CounterError::DaemonConnectionFailed {
                socket: socket_path.display().to_string(),
                source: e.into(),
            }
        })?;
        Ok(Self {
            stream: Mutex::new(BufStream::new(stream)),
        })
    }

    async fn call<P, R>(&self, method: &str, params: P) -> std::result::Result<R, CallError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let mut line = serde_json::to_string(&RpcRequest { method, params })
            .map_err(|e| CallError::Transport(e.into()))?;
        line.push('\n');

        let mut stream = self.stream.lock().await;
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| CallError::Transport(e.into()))?;
        stream
            .flush()
            .await
            .map_err(|e| CallError::Transport(e.into()))?;

        let mut reply = String::new();
        let n = stream
            .read_line(&mut reply)
            .await
            .map_err(|e| CallError::Transport(e.into()))?;
        if n == 0 {
            return Err(CallError::Transport(anyhow!(
                "daemon closed the connection"
            )));
        }

        let response: RpcResponse =
            serde_json::from_str(&reply).map_err(|e| CallError::Transport(e.into()))?;
        if let Some(message) = response.error {
            return Err(CallError::Rejected(message));
        }
        let value = response.result.ok_or_else(|| {
            CallError::Transport(anyhow!("daemon reply carried neither result nor error"))
        })?;
        serde_json::from_value(value).map_err(|e| CallError::Transport(e.into()))
    }
}

impl DaemonClient for SocketClient {
    async fn install(&self, request: InstallRequest) -> Result<InstallResponse> {
        match self.call("install", request).await {
            Ok(response) => Ok(response),
            Err(CallError::Rejected(message)) => Err(CounterError::DaemonRejected {
                operation: "install",
                message,
            }),
            Err(CallError::Transport(source)) => Err(CounterError::InstallFailed { source }),
        }
    }

    async fn uninstall(&self, prog_id: u32) -> Result<()> {
        match self
            .call::<_, serde_json::Value>("uninstall", UninstallParams { prog_id })
            .await
        {
            Ok(_) => Ok(()),
            Err(CallError::Rejected(message)) => Err(CounterError::DaemonRejected {
                operation: "uninstall",
                message,
            }),
            Err(CallError::Transport(source)) => {
                Err(CounterError::UninstallFailed { prog_id, source })
            }
        }
    }

    async fn resolve_legacy_path(&self, prog_id: u32, map_name: &str) -> Result<String> {
        let result: MapPathResult = match self
            .call("resolve_map_path", MapPathParams { prog_id, map_name })
            .await
        {
            Ok(result) => result,
            Err(CallError::Rejected(message)) => {
                return Err(CounterError::DaemonRejected {
                    operation: "resolve_map_path",
                    message,
                })
            }
            Err(CallError::Transport(source)) => {
                return Err(CounterError::PathLookupFailed { prog_id, source })
            }
        };
        if result.path.is_empty() {
            return Err(CounterError::PathResolutionFailed {
                message: format!("daemon returned an empty map path for program {prog_id}"),
            });
        }
        Ok(result.path)
    }
}

/// Stand-in client for the orchestrated path, where no daemon channel
/// exists. Every call fails; the worker never issues one on that path.
pub struct OfflineClient;

impl DaemonClient for OfflineClient {
    async fn install(&self, _request: InstallRequest) -> Result<InstallResponse> {
        Err(CounterError::DaemonUnavailable {
            operation: "install",
        })
    }

    async fn uninstall(&self, _prog_id: u32) -> Result<()> {
        Err(CounterError::DaemonUnavailable {
            operation: "uninstall",
        })
    }

    async fn resolve_legacy_path(&self, _prog_id: u32, _map_name: &str) -> Result<String> {
        Err(CounterError::DaemonUnavailable {
            operation: "resolve_map_path",
        })
    }
}
