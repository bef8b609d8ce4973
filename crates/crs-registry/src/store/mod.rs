//! The entity store and its published snapshots.
//!
//! An [`EntityStore`] is the single writer. Records enter it one at a time
//! through [`EntityStore::put`] or in bulk through [`EntityStore::load`],
//! always validated first. [`EntityStore::publish`] freezes the tables,
//! builds the indices and hands out an immutable [`Snapshot`].

mod snapshot;
pub mod tables;

pub use snapshot::Snapshot;
pub use tables::{Checkpoint, NamedTable, Table, Tables, ALL_KINDS};

use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::ValidationError;
use crate::model::{Batch, CelestialBody, Kind, ObjectKey, Record};
use crate::validate::{validate_record, Phase, RuleContext};
use crate::view::AnyObject;

/// Kinds with rules checked once the whole batch is staged.
const DEFERRED_KINDS: [Kind; 4] = [
    Kind::ConcatenatedOperation,
    Kind::AliasName,
    Kind::Supersession,
    Kind::Deprecation,
];

/// Outcome of a successful [`EntityStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Name of the loaded batch.
    pub batch: String,
    /// Records admitted.
    pub loaded: usize,
    /// Records re-checked by the deferred phase.
    pub deferred_checked: usize,
}

/// A mutable registry under construction.
#[derive(Debug, Clone)]
pub struct EntityStore {
    tables: Tables,
    config: RegistryConfig,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl EntityStore {
    /// Creates a store seeded with the Earth celestial body.
    pub fn new(config: RegistryConfig) -> Self {
        let mut store = Self::unseeded(config);
        store.tables.insert(CelestialBody::earth().into());
        store
    }

    /// Creates an empty store.
    pub fn unseeded(config: RegistryConfig) -> Self {
        Self {
            tables: Tables::default(),
            config,
        }
    }

    /// Creates a store holding a copy of the snapshot's records, to build the
    /// next snapshot from.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            tables: snapshot.tables().clone(),
            config: snapshot.config().clone(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.tables.total_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validates a single record against every rule of its kind and admits
    /// it. Deferred rules run against the current contents, so the record
    /// cannot reference anything not yet in the store.
    pub fn put(&mut self, record: impl Into<Record>) -> Result<(), ValidationError> {
        let record = record.into();
        let ctx = RuleContext::new(&self.tables, &self.config.validator);
        validate_record(&record, &ctx, None)?;
        self.tables.insert(record);
        Ok(())
    }

    /// Loads a batch atomically.
    ///
    /// Records are sorted by load rank, then each is checked against the
    /// immediate rules and staged. Once the whole batch is staged the
    /// deferred rules run over the staged records, which lets concatenated
    /// operations and link records reference records later in the batch. On
    /// any failure the store is rolled back to its state before the call.
    pub fn load(&mut self, batch: Batch) -> Result<LoadReport, ValidationError> {
        let Batch { name, mut records } = batch;
        records.sort_by_key(|r| r.kind().load_rank());
        let loaded = records.len();
        let checkpoint = self.tables.checkpoint();

        debug!(batch = %name, records = loaded, "staging batch");
        for record in records {
            let ctx = RuleContext::new(&self.tables, &self.config.validator);
            if let Err(err) = validate_record(&record, &ctx, Some(Phase::Immediate)) {
                self.abort(&checkpoint, &name, &err);
                return Err(err);
            }
            self.tables.insert(record);
        }

        let mut deferred_checked = 0;
        for kind in DEFERRED_KINDS {
            let staged = self.tables.staged_since(kind, &checkpoint);
            if staged.is_empty() {
                continue;
            }
            debug!(batch = %name, %kind, records = staged.len(), "checking deferred rules");
            let ctx = RuleContext::new(&self.tables, &self.config.validator);
            let failure = staged
                .iter()
                .find_map(|record| validate_record(record, &ctx, Some(Phase::Deferred)).err());
            if let Some(err) = failure {
                self.abort(&checkpoint, &name, &err);
                return Err(err);
            }
            deferred_checked += staged.len();
        }

        debug!(batch = %name, loaded, deferred_checked, "batch loaded");
        Ok(LoadReport {
            batch: name,
            loaded,
            deferred_checked,
        })
    }

    fn abort(&mut self, checkpoint: &Checkpoint, batch: &str, err: &ValidationError) {
        let staged = self.tables.total_len() - checkpoint.total_len();
        warn!(batch, staged, rule = err.rule, "rolling back batch");
        self.tables.rollback(checkpoint);
    }

    /// Returns the record of `kind` with the given key.
    pub fn get(&self, kind: Kind, authority: &str, code: &str) -> Option<AnyObject<'_>> {
        self.tables.get(kind, &ObjectKey::new(authority, code))
    }

    /// Freezes the store into an immutable snapshot.
    pub fn publish(self) -> Snapshot {
        let snapshot = Snapshot::new(self.tables, self.config);
        let tables = snapshot.tables();
        info!(
            records = tables.total_len(),
            crs = tables.crs_objects().count(),
            operations = tables.operations().count(),
            aliases = tables.aliases.len(),
            "published snapshot"
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AliasName, ConcatenatedOperation, Deprecation, GeodeticCrs, GeodeticCrsType, ObjectRef,
        UnitKind, UnitOfMeasure,
    };
    use crate::test_support::{epsg, fixture_batch, fixture_store};
    use crate::view::CatalogObject;

    #[test]
    fn test_new_store_is_seeded_with_earth() {
        let store = EntityStore::default();
        assert_eq!(store.len(), 1);
        let earth = store.get(Kind::CelestialBody, "PROJ", "EARTH").unwrap();
        assert_eq!(earth.name(), Some("Earth"));
        assert!(EntityStore::unseeded(RegistryConfig::default()).is_empty());
    }

    #[test]
    fn test_put_validates_before_inserting() {
        let mut store = EntityStore::default();
        store
            .put(UnitOfMeasure::new(epsg("9001"), "metre", UnitKind::Length, Some(1.0)))
            .unwrap();
        let err = store
            .put(UnitOfMeasure::new(epsg("9001"), "meter", UnitKind::Length, Some(1.0)))
            .unwrap_err();
        assert_eq!(err.rule, "primary_key_unique");
        assert_eq!(store.get(Kind::UnitOfMeasure, "EPSG", "9001").unwrap().name(), Some("metre"));
    }

    #[test]
    fn test_load_accepts_forward_references() {
        let mut store = fixture_store();
        let mut batch = Batch::with_name("late");
        // Alias first: it names a CRS that comes later in the same batch.
        batch.push(AliasName {
            object: ObjectRef::new(Kind::GeodeticCrs, epsg("4269")),
            alt_name: "NAD83".to_string(),
            source: None,
        });
        batch.push(GeodeticCrs::structured(
            epsg("4269"),
            "NAD83 (test)",
            GeodeticCrsType::Geographic2D,
            epsg("6422"),
            epsg("6326"),
            epsg("1262"),
        ));
        let report = store.load(batch).unwrap();
        assert_eq!(report.batch, "late");
        assert_eq!(report.loaded, 2);
        assert_eq!(report.deferred_checked, 1);
        assert!(store.get(Kind::GeodeticCrs, "EPSG", "4269").is_some());
    }

    #[test]
    fn test_failed_load_rolls_back_everything() {
        let mut store = fixture_store();
        let before = store.len();

        let mut batch = Batch::with_name("broken");
        batch.push(UnitOfMeasure::new(epsg("9036"), "kilometre", UnitKind::Length, Some(1000.0)));
        batch.push(ConcatenatedOperation {
            key: epsg("9992"),
            name: "Broken chain".to_string(),
            source_crs: epsg("4258"),
            target_crs: epsg("4171"),
            area: epsg("1298"),
            accuracy: None,
            steps: vec![epsg("1149"), epsg("424242")],
            deprecated: false,
        });
        let err = store.load(batch).unwrap_err();
        assert_eq!(err.rule, "concatenated_steps_exist");
        assert_eq!(store.len(), before);
        assert!(store.get(Kind::UnitOfMeasure, "EPSG", "9036").is_none());
        assert!(store.get(Kind::ConcatenatedOperation, "EPSG", "9992").is_none());
    }

    #[test]
    fn test_failed_immediate_rule_rolls_back_earlier_records() {
        let mut store = fixture_store();
        let before = store.len();

        let mut batch = Batch::new();
        batch.push(UnitOfMeasure::new(epsg("9036"), "kilometre", UnitKind::Length, Some(1000.0)));
        batch.push(Deprecation {
            kind: Kind::GeodeticCrs,
            deprecated: epsg("4326"),
            replacement: epsg("4979"),
            source: None,
        });
        batch.push(Deprecation {
            kind: Kind::GeodeticCrs,
            deprecated: epsg("4326"),
            replacement: epsg("4258"),
            source: None,
        });
        let err = store.load(batch).unwrap_err();
        assert_eq!(err.rule, "deprecation_unique");
        assert_eq!(store.len(), before);
        assert!(store.tables().deprecations.is_empty());
    }

    #[test]
    fn test_load_sorts_by_rank() {
        let mut batch = fixture_batch();
        batch.records.reverse();
        let mut store = EntityStore::default();
        store.load(batch).unwrap();
        assert!(store.get(Kind::ProjectedCrs, "EPSG", "3857").is_some());
    }

    #[test]
    fn test_from_snapshot_copies_records() {
        let snapshot = fixture_store().publish();
        let store = EntityStore::from_snapshot(&snapshot);
        assert_eq!(store.len(), snapshot.tables().total_len());
    }
}
