//! Run configuration
//!
//! Combines the mode flags that select a setup path with the probe
//! conventions shared with the daemon, built from defaults, an optional
//! TOML config file, and CLI arguments.

pub mod builder;
pub mod types;

pub use builder::ConfigurationBuilder;
pub use types::*;

/// Validated configuration for one probe worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub params: ParameterData,
    pub settings: ProbeSettings,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }
}
