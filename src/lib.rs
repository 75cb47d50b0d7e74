use std::path::PathBuf;

use clap::Parser;

pub mod configuration;
pub mod daemon;
pub mod errors;
pub mod poller;
pub mod probe;

pub use configuration::Configuration;
pub use errors::{CounterError, Result};

#[derive(Debug, Clone, Parser)]
#[clap(
    name = "kprobe-counter",
    about = "Reports kernel kprobe hit counts from a daemon-managed eBPF counter map"
)]
pub struct Args {
    #[clap(
        long,
        help = "Run in orchestrated mode: the probe is already installed and its map pre-mounted"
    )]
    pub crd: bool,

    #[clap(long, help = "Bytecode image the daemon should pull and install")]
    pub image: Option<String>,

    #[clap(long, help = "Bytecode object file the daemon should install")]
    pub file: Option<PathBuf>,

    #[clap(long, help = "Id of an already-installed program to report on")]
    pub id: Option<u32>,

    #[clap(
        long,
        help = "Attach a new probe writing into the counter map owned by this program id"
    )]
    pub map_owner_id: Option<u32>,

    #[clap(long, help = "TOML configuration file path")]
    pub config: Option<PathBuf>,

    #[clap(long, help = "Daemon socket path")]
    pub socket_path: Option<PathBuf>,

    #[clap(long, help = "Seconds between counter reports")]
    pub poll_interval_secs: Option<u64>,
}
