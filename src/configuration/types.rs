//! Configuration type definitions
//!
//! `ParameterData` carries the mode flags that pick the setup path;
//! `ProbeSettings` carries the conventions shared with the daemon and the
//! orchestrator (socket location, mount point, map and function names).
//! Both are immutable once built.

use std::path::PathBuf;
use std::time::Duration;

/// Well-known socket the daemon listens on.
pub const DEFAULT_SOCKET_PATH: &str = "/run/bpfman-sock/bpfman.sock";

/// Mount point under which an external orchestrator pre-mounts per-probe
/// maps (orchestrated deployments only).
pub const MAPS_MOUNT_POINT: &str = "/run/app/maps";

/// Name of the pinned per-CPU array the probe increments.
pub const KPROBE_STATS_MAP: &str = "kprobe_stats_map";

/// Kernel function the probe attaches to.
pub const KPROBE_ATTACH_FN: &str = "try_to_wake_up";

/// Display name the probe is registered under.
pub const KPROBE_PROGRAM_NAME: &str = "kprobe_counter";

/// Bytecode image pulled when no source is given explicitly.
pub const DEFAULT_BYTECODE_IMAGE: &str = "quay.io/bpfman-bytecode/go-kprobe-counter:latest";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Where the probe bytecode comes from.
///
/// `ProgId` references a program that is already installed and running;
/// the other two point at loadable bytecode the daemon fetches itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BytecodeSource {
    Image(String),
    File(PathBuf),
    ProgId(u32),
}

impl BytecodeSource {
    pub fn is_prog_id(&self) -> bool {
        matches!(self, BytecodeSource::ProgId(_))
    }
}

/// Immutable per-run mode flags, read-only to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterData {
    /// True when running under an orchestrator that has already installed
    /// the probe and mounted its map.
    pub crd_flag: bool,
    pub bytecode: BytecodeSource,
    /// When set, the install request asks the daemon to attach a new probe
    /// that writes into the counter map owned by this program instead of
    /// allocating a fresh one.
    pub map_owner_id: Option<u32>,
}

/// Named constants injected into the resolvers rather than embedded as
/// literals, so tests can override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub socket_path: PathBuf,
    pub maps_mount_point: PathBuf,
    pub map_name: String,
    pub attach_fn_name: String,
    pub program_name: String,
    pub poll_interval: Duration,
}

impl ProbeSettings {
    /// Map location in orchestrated deployments. Deterministic, never
    /// contacts the daemon.
    pub fn orchestrated_map_path(&self) -> PathBuf {
        self.maps_mount_point.join(&self.map_name)
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            maps_mount_point: PathBuf::from(MAPS_MOUNT_POINT),
            map_name: KPROBE_STATS_MAP.to_string(),
            attach_fn_name: KPROBE_ATTACH_FN.to_string(),
            program_name: KPROBE_PROGRAM_NAME.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
