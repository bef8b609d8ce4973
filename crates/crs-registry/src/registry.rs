//! Shared registry handle with atomic snapshot publication.
//!
//! Readers pin an `Arc<Snapshot>` and query it without locking; a pinned
//! snapshot stays valid however many times the registry is updated after.
//! Writers build a replacement snapshot from the current one and publish it
//! with a compare-and-swap, retrying from the latest snapshot if another
//! writer won first.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{SnapshotError, ValidationError};
use crate::model::Batch;
use crate::store::{EntityStore, LoadReport, Snapshot};

/// The currently published snapshot of a registry.
#[derive(Debug)]
pub struct Registry {
    current: ArcSwap<Snapshot>,
}

impl Default for Registry {
    /// A registry holding only the seeded Earth body.
    fn default() -> Self {
        Self::new(EntityStore::default().publish())
    }
}

impl Registry {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Decodes and validates an encoded snapshot.
    pub fn from_bytes(bytes: &[u8], config: RegistryConfig) -> Result<Self, SnapshotError> {
        Snapshot::from_bytes(bytes, config).map(Self::new)
    }

    /// Pins the current snapshot.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Publishes `snapshot` unconditionally and returns the one it replaced.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let previous = self.current.swap(Arc::new(snapshot));
        info!("replaced registry snapshot");
        previous
    }

    /// Loads a batch on top of the current snapshot and publishes the result.
    ///
    /// The batch is validated against the snapshot it is applied to. If
    /// another update is published meanwhile, the batch is re-applied to the
    /// newer snapshot. On a validation failure nothing is published.
    pub fn apply(&self, batch: Batch) -> Result<LoadReport, ValidationError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let old = self.current.load_full();
            let mut store = EntityStore::from_snapshot(&old);
            let report = store.load(batch.clone())?;
            let new = Arc::new(store.publish());

            let prev = self.current.compare_and_swap(&old, Arc::clone(&new));
            if Arc::ptr_eq(&prev, &old) {
                debug!(batch = %report.batch, loaded = report.loaded, attempt, "applied batch");
                return Ok(report);
            }
            debug!(batch = %report.batch, attempt, "registry changed during apply, retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::model::{BatchBuilder, Kind, UnitKind, UnitOfMeasure};
    use crate::test_support::{epsg, fixture_snapshot};
    use crate::view::CatalogObject;

    fn unit_batch(code: &str) -> Batch {
        BatchBuilder::new(format!("unit {code}"))
            .record(UnitOfMeasure::new(epsg(code), format!("unit {code}"), UnitKind::Length, Some(2.0)))
            .build()
    }

    #[test]
    fn test_pinned_snapshot_survives_updates() {
        let registry = Registry::new(fixture_snapshot());
        let pinned = registry.load();
        let before = pinned.tables().total_len();

        let report = registry.apply(unit_batch("9036")).unwrap();
        assert_eq!(report.loaded, 1);

        assert_eq!(pinned.tables().total_len(), before);
        assert!(pinned.get(Kind::UnitOfMeasure, "EPSG", "9036").is_err());
        let current = registry.load();
        assert_eq!(current.tables().total_len(), before + 1);
        assert_eq!(
            current.get(Kind::UnitOfMeasure, "EPSG", "9036").unwrap().name(),
            Some("unit 9036")
        );
    }

    #[test]
    fn test_failed_apply_publishes_nothing() {
        let registry = Registry::new(fixture_snapshot());
        let before = registry.load();
        let err = registry.apply(unit_batch("9001")).unwrap_err();
        assert_eq!(err.rule, "primary_key_unique");
        assert!(Arc::ptr_eq(&before, &registry.load()));
    }

    #[test]
    fn test_replace_returns_previous() {
        let registry = Registry::default();
        assert_eq!(registry.load().tables().total_len(), 1);
        let previous = registry.replace(fixture_snapshot());
        assert_eq!(previous.tables().total_len(), 1);
        assert!(registry.load().get_crs("EPSG", "4326").is_ok());
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let bytes = fixture_snapshot().to_bytes().unwrap();
        let registry = Registry::from_bytes(&bytes, RegistryConfig::default()).unwrap();
        assert!(registry.load().get_crs("EPSG", "3857").is_ok());
    }

    #[test]
    fn test_concurrent_applies_are_not_lost() {
        let registry = Arc::new(Registry::new(fixture_snapshot()));
        let before = registry.load().tables().total_len();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.apply(unit_batch(&format!("80{i:02}"))).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let after = registry.load();
        assert_eq!(after.tables().total_len(), before + 8);
        for i in 0..8 {
            assert!(after
                .get(Kind::UnitOfMeasure, "EPSG", &format!("80{i:02}"))
                .is_ok());
        }
    }
}
