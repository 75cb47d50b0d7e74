//! Probe lifecycle management
//!
//! Setup path selection, the install guard that prevents leaking a probe
//! this process installed, and the worker that ties setup, polling, and
//! teardown together.

pub mod guard;
pub mod setup;
pub mod worker;

pub use guard::InstallGuard;
pub use setup::{install_request, SetupPath};
pub use worker::ProbeWorker;
