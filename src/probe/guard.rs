//! Install lifecycle guard
//!
//! Tracks whether this process installed the probe. An owned guard is
//! constructed immediately after a successful self-install, before any
//! further fallible step, and released exactly once at the worker's
//! single exit point. The uninstall RPC is async, so release is an
//! explicit call rather than a Drop impl.

use log::{info, warn};

use crate::daemon::DaemonClient;

#[derive(Debug)]
pub struct InstallGuard {
    owned: Option<u32>,
}

impl InstallGuard {
    /// For the orchestrated and pre-installed paths, where this process
    /// does not own the probe's lifetime.
    pub fn unowned() -> Self {
        Self { owned: None }
    }

    pub fn owned(prog_id: u32) -> Self {
        Self {
            owned: Some(prog_id),
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owned.is_some()
    }

    pub fn owned_id(&self) -> Option<u32> {
        self.owned
    }

    /// Uninstalls the owned program, if any. Runs strictly after the
    /// poller has stopped. A failed uninstall is logged rather than
    /// propagated so it cannot mask an earlier error.
    pub async fn release<C: DaemonClient>(mut self, client: &C) {
        if let Some(prog_id) = self.owned.take() {
            info!("unloading program {prog_id}");
            if let Err(e) = client.uninstall(prog_id).await {
                warn!("failed to unload program {prog_id}: {e}");
            }
        }
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        if let Some(prog_id) = self.owned {
            warn!("install guard dropped without release; program {prog_id} may be leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_track_ownership() {
        let guard = InstallGuard::owned(7);
        assert!(guard.is_owned());
        assert_eq!(guard.owned_id(), Some(7));

        let guard = InstallGuard::unowned();
        assert!(!guard.is_owned());
        assert_eq!(guard.owned_id(), None);
    }
}
