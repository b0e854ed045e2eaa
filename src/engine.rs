//! Published engine state.
//!
//! The catalog and the policy set are built off to the side and published
//! together as one immutable [`Snapshot`]. Readers take a cheap `Arc` clone and
//! never observe a half-built state; a reload swaps in a complete new snapshot.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::commands::catalog::Catalog;
use crate::error::Result;
use crate::permissions::{load_policy_dir, LoadReport, PolicySet};

/// Immutable command catalog and policy set.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub catalog: Arc<Catalog>,
    pub policies: Arc<PolicySet>,
}

impl Snapshot {
    pub fn new(catalog: impl Into<Arc<Catalog>>, policies: impl Into<Arc<PolicySet>>) -> Self {
        Self {
            catalog: catalog.into(),
            policies: policies.into(),
        }
    }
}

/// Holder of the current [`Snapshot`].
#[derive(Debug, Default)]
pub struct Engine {
    current: RwLock<Arc<Snapshot>>,
}

impl Engine {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Returns the current snapshot. The lock is held only for the clone.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the current snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }

    /// Reloads policy documents from `dir` and publishes them together with the
    /// current catalog. Documents that fail to parse are left out and reported.
    pub fn reload_policies(&self, dir: &Path, extension: &str) -> Result<LoadReport> {
        let report = load_policy_dir(dir, extension)?;
        let catalog = Arc::clone(&self.snapshot().catalog);

        self.publish(Snapshot::new(catalog, report.policies.clone()));
        info!(
            classes = report.policies.len(),
            failures = report.failures.len(),
            "Published reloaded policies"
        );

        Ok(report)
    }
}
