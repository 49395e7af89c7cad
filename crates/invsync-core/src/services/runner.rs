//! Shared sync handle that allows one pass at a time.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::sync::{Store, SyncDirection, SyncResult, SyncService};

/// Thread-safe, cloneable handle around a [`SyncService`].
///
/// A second request made while a pass is running is rejected with
/// [`Error::SyncInProgress`] instead of queueing behind it.
pub struct SyncRunner<C, L> {
    service: Arc<SyncService<C, L>>,
    gate: Arc<Mutex<()>>,
}

impl<C, L> Clone for SyncRunner<C, L> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<C: Store, L: Store> SyncRunner<C, L> {
    /// Wrap a service
    pub fn new(service: SyncService<C, L>) -> Self {
        Self {
            service: Arc::new(service),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// The wrapped service
    pub fn service(&self) -> &SyncService<C, L> {
        &self.service
    }

    /// Check if a pass is currently running
    pub fn is_running(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Run one pass in `direction`, unless another pass holds the gate.
    pub async fn run(&self, direction: SyncDirection) -> Result<SyncResult> {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::warn!("Rejected {direction} sync: another pass is running");
            return Err(Error::SyncInProgress);
        };
        Ok(self.service.sync(direction).await)
    }

    /// Cloud to local pass
    pub async fn pull(&self) -> Result<SyncResult> {
        self.run(SyncDirection::CloudToLocal).await
    }

    /// Local to cloud pass
    pub async fn push(&self) -> Result<SyncResult> {
        self.run(SyncDirection::LocalToCloud).await
    }
}
