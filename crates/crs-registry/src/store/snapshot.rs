use std::collections::BTreeSet;

use crate::codec::{decode_batch, encode_snapshot};
use crate::config::RegistryConfig;
use crate::error::{EncodeError, QueryError, SnapshotError};
use crate::index::Indices;
use crate::model::{
    content_digest, find_preference, ContentDigest, GridAlternative, GridPackage, Kind, ObjectKey,
    ObjectRef,
};
use crate::resolve::{find_operations, OperationChain, SearchOptions};
use crate::store::{EntityStore, Tables};
use crate::view::{AnyObject, CatalogObject, CrsRef, OperationRef};

/// An immutable, indexed registry.
///
/// Produced by [`EntityStore::publish`]. Nothing in a snapshot changes after
/// it is built, so it can be shared across threads behind an `Arc` (see
/// [`Registry`](crate::Registry)) and queried without locking.
#[derive(Debug, Clone)]
pub struct Snapshot {
    tables: Tables,
    indices: Indices,
    config: RegistryConfig,
}

impl Snapshot {
    pub(crate) fn new(tables: Tables, config: RegistryConfig) -> Self {
        let indices = Indices::build(&tables);
        Self {
            tables,
            indices,
            config,
        }
    }

    /// Decodes a snapshot from its binary encoding, re-validating every
    /// record.
    pub fn from_bytes(bytes: &[u8], config: RegistryConfig) -> Result<Self, SnapshotError> {
        let batch = decode_batch(bytes)?;
        let mut store = EntityStore::unseeded(config);
        store.load(batch)?;
        Ok(store.publish())
    }

    /// Canonical uncompressed encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encode_snapshot(self)
    }

    /// SHA-256 of the canonical encoding.
    pub fn digest(&self) -> Result<ContentDigest, EncodeError> {
        Ok(content_digest(&self.to_bytes()?))
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Returns the record of `kind` with the given key.
    pub fn get(&self, kind: Kind, authority: &str, code: &str) -> Result<AnyObject<'_>, QueryError> {
        let key = ObjectKey::new(authority, code);
        self.tables
            .get(kind, &key)
            .ok_or(QueryError::NotFound { kind, key })
    }

    /// Returns the CRS of any kind with the given key.
    pub fn get_crs(&self, authority: &str, code: &str) -> Result<CrsRef<'_>, QueryError> {
        let key = ObjectKey::new(authority, code);
        self.tables.crs(&key).ok_or(QueryError::CrsNotFound(key))
    }

    /// Returns the coordinate operation of any kind with the given key.
    pub fn get_operation(&self, authority: &str, code: &str) -> Option<OperationRef<'_>> {
        self.tables.operation(&ObjectKey::new(authority, code))
    }

    /// Ranked operations between two CRSs. See [`find_operations`].
    pub fn get_operations_between(
        &self,
        source: &ObjectKey,
        target: &ObjectKey,
        options: &SearchOptions,
    ) -> Result<Vec<OperationChain>, QueryError> {
        find_operations(self, source, target, options)
    }

    /// First record with the given key, searching kinds in
    /// [`Kind::KEYED`] order.
    pub fn object_lookup(&self, authority: &str, code: &str) -> Option<AnyObject<'_>> {
        let key = ObjectKey::new(authority, code);
        Kind::KEYED.iter().find_map(|&kind| self.tables.get(kind, &key))
    }

    /// Every record with the given key, in [`Kind::KEYED`] order.
    pub fn object_lookup_all(&self, authority: &str, code: &str) -> Vec<AnyObject<'_>> {
        let key = ObjectKey::new(authority, code);
        Kind::KEYED
            .iter()
            .filter_map(|&kind| self.tables.get(kind, &key))
            .collect()
    }

    /// Distinct authorities of every keyed record, sorted.
    pub fn authority_list(&self) -> Vec<&str> {
        self.tables
            .objects()
            .map(|o| o.as_object().key().authority.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    // =========================================================================
    // Names and history
    // =========================================================================

    /// Records whose canonical name or alias matches `name`, ignoring case.
    pub fn resolve_alias(&self, name: &str) -> &[ObjectRef] {
        self.indices.resolve_alias(name)
    }

    /// Direct replacements of a superseded record.
    pub fn supersessors_of(&self, kind: Kind, key: &ObjectKey) -> &[ObjectRef] {
        self.indices.supersessors_of(&ObjectRef::new(kind, key.clone()))
    }

    /// Every record transitively replacing the given one.
    pub fn supersession_closure(&self, kind: Kind, key: &ObjectKey) -> Vec<ObjectRef> {
        self.indices
            .supersession_closure(&ObjectRef::new(kind, key.clone()))
    }

    pub fn deprecation_replacement_of(&self, kind: Kind, key: &ObjectKey) -> Option<&ObjectKey> {
        self.indices
            .deprecation_replacement_of(&ObjectRef::new(kind, key.clone()))
    }

    // =========================================================================
    // Grids and preferences
    // =========================================================================

    /// Distribution record of a grid by the name transformations use.
    pub fn lookup_grid(&self, original_name: &str) -> Option<&GridAlternative> {
        self.tables.grid_alternatives.get(original_name)
    }

    pub fn grid_package(&self, name: &str) -> Option<&GridPackage> {
        self.tables.grid_packages.get(name)
    }

    /// Stored authority preference for a pair of CRS authorities, with
    /// `any` wildcards.
    pub fn authority_preference(&self, source: &str, target: &str) -> Option<&[String]> {
        find_preference(&self.tables.authority_preferences, source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{format_digest, BoundingBox, CrsType, Extent};
    use crate::test_support::{epsg, fixture_snapshot, fixture_store};

    #[test]
    fn test_get_crs() {
        let snapshot = fixture_snapshot();
        let crs = snapshot.get_crs("EPSG", "4326").unwrap();
        assert_eq!(crs.name(), Some("WGS 84"));
        assert_eq!(crs.crs_type(), CrsType::Geographic2D);
        assert_eq!(snapshot.get_crs("EPSG", "3857").unwrap().crs_type(), CrsType::Projected);

        let err = snapshot.get_crs("EPSG", "0").unwrap_err();
        assert_eq!(err, QueryError::CrsNotFound(epsg("0")));

        let found = snapshot.get(Kind::Ellipsoid, "EPSG", "7030").map(|o| o.kind());
        assert_eq!(found, Ok(Kind::Ellipsoid));
        let err = snapshot.get(Kind::Ellipsoid, "EPSG", "4326").unwrap_err();
        assert_eq!(
            err,
            QueryError::NotFound {
                kind: Kind::Ellipsoid,
                key: epsg("4326")
            }
        );
    }

    #[test]
    fn test_get_operation() {
        let snapshot = fixture_snapshot();
        let op = snapshot.get_operation("EPSG", "1149").unwrap();
        assert_eq!(op.accuracy(), Some(1.0));
        assert_eq!(op.source_crs(), Some(&epsg("4258")));
        assert!(snapshot.get_operation("EPSG", "4326").is_none());
    }

    #[test]
    fn test_object_lookup_order() {
        let mut store = fixture_store();
        store
            .put(Extent::new(epsg("9001"), "Odd extent", BoundingBox::new(0.0, 1.0, 0.0, 1.0)))
            .unwrap();
        let snapshot = store.publish();

        let first = snapshot.object_lookup("EPSG", "9001").unwrap();
        assert_eq!(first.kind(), Kind::UnitOfMeasure);

        let all: Vec<Kind> = snapshot
            .object_lookup_all("EPSG", "9001")
            .iter()
            .map(|o| o.kind())
            .collect();
        assert_eq!(all, vec![Kind::UnitOfMeasure, Kind::Extent]);

        assert_eq!(snapshot.object_lookup("EPSG", "4326").unwrap().kind(), Kind::GeodeticCrs);
        assert!(snapshot.object_lookup("EPSG", "nope").is_none());
    }

    #[test]
    fn test_authority_list() {
        let snapshot = fixture_snapshot();
        assert_eq!(snapshot.authority_list(), vec!["EPSG", "PROJ"]);
    }

    #[test]
    fn test_alias_and_grid_lookup() {
        let snapshot = fixture_snapshot();
        let hits = snapshot.resolve_alias("wgs84");
        assert_eq!(hits, &[ObjectRef::new(Kind::GeodeticCrs, epsg("4326"))]);

        let grid = snapshot.lookup_grid("WW15MGH.GRD").unwrap();
        assert_eq!(grid.proj_grid_name, "us_nga_egm96_15.tif");
        assert!(snapshot.lookup_grid("missing.gsb").is_none());
    }

    #[test]
    fn test_digest_survives_round_trip() {
        let snapshot = fixture_snapshot();
        let bytes = snapshot.to_bytes().unwrap();
        let decoded = Snapshot::from_bytes(&bytes, RegistryConfig::default()).unwrap();
        assert_eq!(decoded.tables().total_len(), snapshot.tables().total_len());
        assert_eq!(
            format_digest(&decoded.digest().unwrap()),
            format_digest(&snapshot.digest().unwrap())
        );
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = Snapshot::from_bytes(b"nope", RegistryConfig::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }
}
