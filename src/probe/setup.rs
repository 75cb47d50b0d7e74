//! Setup path selection
//!
//! Exactly one of four setup paths applies to any `ParameterData`, decided
//! purely from the crd flag, the bytecode provenance, and owner-id
//! presence:
//!
//! - orchestrated: the probe is already installed externally; only the
//!   map path is needed, at a fixed mount location;
//! - self-install-fresh: this process installs the probe and gets a fresh
//!   counter map;
//! - self-install-reuse: same, but the probe writes into the counter map
//!   owned by another installed program;
//! - pre-installed: the probe is referenced by program id and its map path
//!   is looked up from the daemon.

use crate::configuration::{BytecodeSource, ParameterData, ProbeSettings};
use crate::daemon::{
    AttachInfo, BytecodeLocation, InstallRequest, KPROBE_PROGRAM_TYPE,
};
use crate::errors::{CounterError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPath {
    Orchestrated,
    SelfInstallFresh,
    SelfInstallReuse { map_owner_id: u32 },
    PreInstalled { prog_id: u32 },
}

impl SetupPath {
    /// Pure function of the mode flags; total over all inputs.
    pub fn resolve(params: &ParameterData) -> Self {
        if params.crd_flag {
            return SetupPath::Orchestrated;
        }
        if let BytecodeSource::ProgId(prog_id) = params.bytecode {
            return SetupPath::PreInstalled { prog_id };
        }
        match params.map_owner_id {
            Some(map_owner_id) => SetupPath::SelfInstallReuse { map_owner_id },
            None => SetupPath::SelfInstallFresh,
        }
    }

    pub fn is_self_install(&self) -> bool {
        matches!(
            self,
            SetupPath::SelfInstallFresh | SetupPath::SelfInstallReuse { .. }
        )
    }
}

/// Builds the install request for the self-install paths. Called at most
/// once per run.
pub fn install_request(
    params: &ParameterData,
    settings: &ProbeSettings,
    map_owner_id: Option<u32>,
) -> Result<InstallRequest> {
    let bytecode = match &params.bytecode {
        BytecodeSource::Image(image) => BytecodeLocation::Image(image.clone()),
        BytecodeSource::File(file) => BytecodeLocation::File(file.clone()),
        BytecodeSource::ProgId(_) => {
            return Err(CounterError::ConfigError {
                message: "cannot install from a program id".to_string(),
            })
        }
    };
    Ok(InstallRequest {
        bytecode,
        name: settings.program_name.clone(),
        program_type: KPROBE_PROGRAM_TYPE,
        attach: AttachInfo {
            fn_name: settings.attach_fn_name.clone(),
        },
        map_owner_id,
    })
}
