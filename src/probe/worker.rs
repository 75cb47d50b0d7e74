//! Probe worker
//!
//! One logical worker per probe: decide the setup path, install the probe
//! if this process owns it, resolve the counter map path, poll until
//! cancelled or a read fails, then release the install guard. The guard
//! release is the single exit point, so the probe is never leaked even
//! when setup fails halfway through.

use std::path::PathBuf;

use log::info;
use tokio::sync::watch;

use super::guard::InstallGuard;
use super::setup::{install_request, SetupPath};
use crate::configuration::{ParameterData, ProbeSettings};
use crate::daemon::DaemonClient;
use crate::errors::Result;
use crate::poller::{CounterPoller, PinnedTableReader};

pub struct ProbeWorker<C> {
    params: ParameterData,
    settings: ProbeSettings,
    client: C,
}

impl<C: DaemonClient> ProbeWorker<C> {
    pub fn new(params: ParameterData, settings: ProbeSettings, client: C) -> Self {
        Self {
            params,
            settings,
            client,
        }
    }

    /// Runs setup, polling, and teardown. Daemon calls happen only during
    /// setup and teardown, never inside the poll loop.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let (guard, setup) = self.set_up().await;
        let result = match setup {
            Ok(map_path) => self.poll(map_path, shutdown).await,
            Err(e) => Err(e),
        };
        guard.release(&self.client).await;
        result
    }

    /// The guard comes back even when setup fails, so an installed probe
    /// is uninstalled when a later step errors out.
    async fn set_up(&self) -> (InstallGuard, Result<PathBuf>) {
        match SetupPath::resolve(&self.params) {
            SetupPath::Orchestrated => {
                let path = self.settings.orchestrated_map_path();
                info!("using orchestrator-mounted map at {}", path.display());
                (InstallGuard::unowned(), Ok(path))
            }
            SetupPath::PreInstalled { prog_id } => {
                let resolved = self
                    .client
                    .resolve_legacy_path(prog_id, &self.settings.map_name)
                    .await
                    .map(PathBuf::from);
                (InstallGuard::unowned(), resolved)
            }
            path @ (SetupPath::SelfInstallFresh | SetupPath::SelfInstallReuse { .. }) => {
                let owner = match path {
                    SetupPath::SelfInstallReuse { map_owner_id } => Some(map_owner_id),
                    _ => None,
                };
                let request = match install_request(&self.params, &self.settings, owner) {
                    Ok(request) => request,
                    Err(e) => return (InstallGuard::unowned(), Err(e)),
                };
                let response = match self.client.install(request).await {
                    Ok(response) => response,
                    Err(e) => return (InstallGuard::unowned(), Err(e)),
                };
                info!("program registered with id {}", response.kernel_id);

                // Owned from this point on; any later failure must still
                // trigger an uninstall.
                let guard = InstallGuard::owned(response.kernel_id);
                let resolved = response.info.map_pin_path(&self.settings.map_name);
                (guard, resolved)
            }
        }
    }

    async fn poll(&self, map_path: PathBuf, shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "polling {} every {:?}",
            map_path.display(),
            self.settings.poll_interval
        );
        let reader = PinnedTableReader::new(map_path);
        CounterPoller::new(reader, self.settings.poll_interval)
            .run(shutdown)
            .await
    }
}
