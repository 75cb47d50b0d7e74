//! Daemon client facade
//!
//! The privileged daemon installs and removes kernel probes on our
//! behalf; this module covers exactly the three calls the worker needs.
//! The trait seam lets tests substitute a mock daemon for the socket
//! client.

pub mod client;
pub mod protocol;

pub use client::{OfflineClient, SocketClient};
pub use protocol::{
    AttachInfo, BytecodeLocation, InstallDescriptor, InstallRequest, InstallResponse,
    KPROBE_PROGRAM_TYPE,
};

use crate::errors::Result;

#[allow(async_fn_in_trait)]
pub trait DaemonClient {
    /// Ask the daemon to attach the probe and allocate (or reuse) its
    /// counter map.
    async fn install(&self, request: InstallRequest) -> Result<InstallResponse>;

    /// Detach a program this process installed.
    async fn uninstall(&self, prog_id: u32) -> Result<()>;

    /// Look up the pinned map path for an already-installed program.
    async fn resolve_legacy_path(&self, prog_id: u32, map_name: &str) -> Result<String>;
}
