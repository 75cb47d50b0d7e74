//! Configuration builder
//!
//! Merges defaults, an optional TOML config file, and CLI arguments into a
//! validated `Configuration`. Later sources win over earlier ones.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::types::{BytecodeSource, ParameterData, ProbeSettings, DEFAULT_BYTECODE_IMAGE};
use super::Configuration;
use crate::errors::CounterError;
use crate::Args;

#[derive(Debug)]
pub struct ConfigurationBuilder {
    crd_flag: bool,
    image: Option<String>,
    file: Option<PathBuf>,
    prog_id: Option<u32>,
    map_owner_id: Option<u32>,
    settings: ProbeSettings,
}

/// On-disk shape of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    crd: Option<bool>,
    image: Option<String>,
    file: Option<PathBuf>,
    prog_id: Option<u32>,
    map_owner_id: Option<u32>,
    socket_path: Option<PathBuf>,
    poll_interval_secs: Option<u64>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            crd_flag: false,
            image: None,
            file: None,
            prog_id: None,
            map_owner_id: None,
            settings: ProbeSettings::default(),
        }
    }

    pub fn from_config_file<P: AsRef<Path>>(self, path: P) -> Result<Self, CounterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CounterError::ConfigError {
            message: format!("failed to read config file {}: {}", path.display(), e),
        })?;
        self.from_toml_str(&content)
    }

    pub fn from_toml_str(mut self, content: &str) -> Result<Self, CounterError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| CounterError::ConfigError {
                message: format!("failed to parse TOML config: {}", e),
            })?;

        if let Some(crd) = config.crd {
            self.crd_flag = crd;
        }
        self.image = config.image.or(self.image);
        self.file = config.file.or(self.file);
        self.prog_id = config.prog_id.or(self.prog_id);
        self.map_owner_id = config.map_owner_id.or(self.map_owner_id);
        if let Some(socket) = config.socket_path {
            self.settings.socket_path = socket;
        }
        if let Some(secs) = config.poll_interval_secs {
            self.settings.poll_interval = Duration::from_secs(secs);
        }
        Ok(self)
    }

    /// CLI arguments override anything the config file set.
    pub fn from_cli(mut self, args: &Args) -> Self {
        if args.crd {
            self.crd_flag = true;
        }
        self.image = args.image.clone().or(self.image);
        self.file = args.file.clone().or(self.file);
        self.prog_id = args.id.or(self.prog_id);
        self.map_owner_id = args.map_owner_id.or(self.map_owner_id);
        if let Some(socket) = &args.socket_path {
            self.settings.socket_path = socket.clone();
        }
        if let Some(secs) = args.poll_interval_secs {
            self.settings.poll_interval = Duration::from_secs(secs);
        }
        self
    }

    pub fn build(self) -> Result<Configuration, CounterError> {
        let given = [
            self.image.is_some(),
            self.file.is_some(),
            self.prog_id.is_some(),
        ]
        .into_iter()
        .filter(|g| *g)
        .count();
        if given > 1 {
            return Err(CounterError::ConfigError {
                message: "at most one of image, file, and prog-id may be given".to_string(),
            });
        }

        let bytecode = if let Some(image) = self.image {
            BytecodeSource::Image(image)
        } else if let Some(file) = self.file {
            BytecodeSource::File(file)
        } else if let Some(id) = self.prog_id {
            BytecodeSource::ProgId(id)
        } else {
            BytecodeSource::Image(DEFAULT_BYTECODE_IMAGE.to_string())
        };

        // The daemon treats owner id 0 as "no owner".
        let map_owner_id = match self.map_owner_id {
            Some(0) | None => None,
            Some(id) => Some(id),
        };

        if bytecode.is_prog_id() && map_owner_id.is_some() {
            return Err(CounterError::ConfigError {
                message: "map-owner-id only applies when this process installs the probe"
                    .to_string(),
            });
        }

        if self.settings.poll_interval.is_zero() {
            return Err(CounterError::ConfigError {
                message: "poll interval must be non-zero".to_string(),
            });
        }

        Ok(Configuration {
            params: ParameterData {
                crd_flag: self.crd_flag,
                bytecode,
                map_owner_id,
            },
            settings: self.settings,
        })
    }
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
