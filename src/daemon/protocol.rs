//! Wire types for daemon requests and responses.
//!
//! The install request mirrors what the daemon needs to attach a kprobe:
//! where the bytecode comes from, a display name, the program type tag,
//! the kernel function to attach to, and optionally the id of a program
//! whose counter map the new probe should write into instead of getting a
//! fresh one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CounterError, Result};

/// BPF_PROG_TYPE_KPROBE
pub const KPROBE_PROGRAM_TYPE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BytecodeLocation {
    Image(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachInfo {
    pub fn_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub bytecode: BytecodeLocation,
    pub name: String,
    pub program_type: u32,
    pub attach: AttachInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_owner_id: Option<u32>,
}

/// Descriptor returned by a successful install, from which the counter
/// map path is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallDescriptor {
    pub map_pin_dir: String,
}

impl InstallDescriptor {
    pub fn map_pin_path(&self, map_name: &str) -> Result<PathBuf> {
        if self.map_pin_dir.is_empty() {
            return Err(CounterError::PathResolutionFailed {
                message: "install response carried no map pin directory".to_string(),
            });
        }
        Ok(Path::new(&self.map_pin_dir).join(map_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResponse {
    /// Kernel-visible id assigned to the installed program.
    pub kernel_id: u32,
    pub info: InstallDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_join_pin_dir_and_map_name() {
        let descriptor = InstallDescriptor {
            map_pin_dir: "/run/bpfman/fs/maps/7".to_string(),
        };
        assert_eq!(
            descriptor.map_pin_path("kprobe_stats_map").unwrap(),
            PathBuf::from("/run/bpfman/fs/maps/7/kprobe_stats_map")
        );
    }

    #[test]
    fn should_reject_empty_pin_dir() {
        let descriptor = InstallDescriptor {
            map_pin_dir: String::new(),
        };
        let err = descriptor.map_pin_path("kprobe_stats_map").unwrap_err();
        assert!(matches!(err, CounterError::PathResolutionFailed { .. }));
    }

    #[test]
    fn should_omit_owner_id_from_wire_when_absent() {
        let request = InstallRequest {
            bytecode: BytecodeLocation::Image("quay.io/x".to_string()),
            name: "kprobe_counter".to_string(),
            program_type: KPROBE_PROGRAM_TYPE,
            attach: AttachInfo {
                fn_name: "try_to_wake_up".to_string(),
            },
            map_owner_id: None,
        };
        let wire = serde_json::to_string(&request).unwrap();
        assert!(!wire.contains("map_owner_id"));

        let with_owner = InstallRequest {
            map_owner_id: Some(9),
            ..request
        };
        let wire = serde_json::to_string(&with_owner).unwrap();
        assert!(wire.contains("\"map_owner_id\":9"));
    }
}
