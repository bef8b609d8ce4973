//! Insertion-ordered record tables.
//!
//! Keyed kinds live in `IndexMap`s keyed by [`ObjectKey`]; link kinds are
//! kept in plain vectors or maps keyed by their natural name. Every table only
//! grows during a load, so a [`Checkpoint`] of table lengths is enough to roll
//! a failed load back.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::model::{
    AliasName, AuthorityPreference, Axis, CelestialBody, CompoundCrs, ConcatenatedOperation,
    Conversion, ConversionMethod, CoordinateOperationMethod, CoordinateSystem, Deprecation,
    Ellipsoid, Extent, GeodeticCrs, GeodeticDatum, GridAlternative, GridPackage,
    GridTransformation, HelmertTransformation, Kind, ObjectKey, OtherTransformation, Parameter,
    PreferredHub, PrimeMeridian, ProjectedCrs, Record, Supersession, UnitOfMeasure, VerticalCrs,
    VerticalDatum,
};
use crate::view::{AnyObject, CatalogObject, CrsRef, OperationRef};

/// A table of keyed records in insertion order.
pub type Table<T> = IndexMap<ObjectKey, T, FxBuildHasher>;

/// A table of link records keyed by name in insertion order.
pub type NamedTable<T> = IndexMap<String, T, FxBuildHasher>;

const KIND_COUNT: usize = Kind::Deprecation as usize;

/// Table lengths captured before a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    lens: [usize; KIND_COUNT],
}

impl Checkpoint {
    /// Table length of `kind` when the checkpoint was taken.
    pub fn len_of(&self, kind: Kind) -> usize {
        self.lens[kind as usize - 1]
    }

    /// Total number of records when the checkpoint was taken.
    pub fn total_len(&self) -> usize {
        self.lens.iter().sum()
    }
}

/// All record tables of a store.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub units: Table<UnitOfMeasure>,
    pub celestial_bodies: Table<CelestialBody>,
    pub ellipsoids: Table<Ellipsoid>,
    pub extents: Table<Extent>,
    pub prime_meridians: Table<PrimeMeridian>,
    pub geodetic_datums: Table<GeodeticDatum>,
    pub vertical_datums: Table<VerticalDatum>,
    pub coordinate_systems: Table<CoordinateSystem>,
    pub axes: Table<Axis>,
    pub geodetic_crs: Table<GeodeticCrs>,
    pub projected_crs: Table<ProjectedCrs>,
    pub vertical_crs: Table<VerticalCrs>,
    pub compound_crs: Table<CompoundCrs>,
    pub conversion_methods: Table<ConversionMethod>,
    pub operation_methods: Table<CoordinateOperationMethod>,
    pub parameters: Table<Parameter>,
    pub conversions: Table<Conversion>,
    pub helmert_transformations: Table<HelmertTransformation>,
    pub grid_transformations: Table<GridTransformation>,
    pub other_transformations: Table<OtherTransformation>,
    pub concatenated_operations: Table<ConcatenatedOperation>,
    pub grid_packages: NamedTable<GridPackage>,
    pub grid_alternatives: NamedTable<GridAlternative>,
    pub preferred_hubs: Vec<PreferredHub>,
    pub authority_preferences: Vec<AuthorityPreference>,
    pub aliases: Vec<AliasName>,
    pub supersessions: Vec<Supersession>,
    pub deprecations: Vec<Deprecation>,
}

impl Tables {
    /// Number of records of `kind`.
    pub fn len_of(&self, kind: Kind) -> usize {
        match kind {
            Kind::UnitOfMeasure => self.units.len(),
            Kind::CelestialBody => self.celestial_bodies.len(),
            Kind::Ellipsoid => self.ellipsoids.len(),
            Kind::Extent => self.extents.len(),
            Kind::PrimeMeridian => self.prime_meridians.len(),
            Kind::GeodeticDatum => self.geodetic_datums.len(),
            Kind::VerticalDatum => self.vertical_datums.len(),
            Kind::CoordinateSystem => self.coordinate_systems.len(),
            Kind::Axis => self.axes.len(),
            Kind::GeodeticCrs => self.geodetic_crs.len(),
            Kind::ProjectedCrs => self.projected_crs.len(),
            Kind::VerticalCrs => self.vertical_crs.len(),
            Kind::CompoundCrs => self.compound_crs.len(),
            Kind::ConversionMethod => self.conversion_methods.len(),
            Kind::CoordinateOperationMethod => self.operation_methods.len(),
            Kind::Parameter => self.parameters.len(),
            Kind::Conversion => self.conversions.len(),
            Kind::HelmertTransformation => self.helmert_transformations.len(),
            Kind::GridTransformation => self.grid_transformations.len(),
            Kind::OtherTransformation => self.other_transformations.len(),
            Kind::ConcatenatedOperation => self.concatenated_operations.len(),
            Kind::GridPackage => self.grid_packages.len(),
            Kind::GridAlternative => self.grid_alternatives.len(),
            Kind::PreferredHub => self.preferred_hubs.len(),
            Kind::AuthorityPreference => self.authority_preferences.len(),
            Kind::AliasName => self.aliases.len(),
            Kind::Supersession => self.supersessions.len(),
            Kind::Deprecation => self.deprecations.len(),
        }
    }

    /// Total number of records.
    pub fn total_len(&self) -> usize {
        ALL_KINDS.iter().map(|&k| self.len_of(k)).sum()
    }

    /// Captures the current table lengths.
    pub fn checkpoint(&self) -> Checkpoint {
        let mut lens = [0; KIND_COUNT];
        for kind in ALL_KINDS {
            lens[kind as usize - 1] = self.len_of(kind);
        }
        Checkpoint { lens }
    }

    /// Drops every record added after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: &Checkpoint) {
        self.units.truncate(checkpoint.len_of(Kind::UnitOfMeasure));
        self.celestial_bodies.truncate(checkpoint.len_of(Kind::CelestialBody));
        self.ellipsoids.truncate(checkpoint.len_of(Kind::Ellipsoid));
        self.extents.truncate(checkpoint.len_of(Kind::Extent));
        self.prime_meridians.truncate(checkpoint.len_of(Kind::PrimeMeridian));
        self.geodetic_datums.truncate(checkpoint.len_of(Kind::GeodeticDatum));
        self.vertical_datums.truncate(checkpoint.len_of(Kind::VerticalDatum));
        self.coordinate_systems.truncate(checkpoint.len_of(Kind::CoordinateSystem));
        self.axes.truncate(checkpoint.len_of(Kind::Axis));
        self.geodetic_crs.truncate(checkpoint.len_of(Kind::GeodeticCrs));
        self.projected_crs.truncate(checkpoint.len_of(Kind::ProjectedCrs));
        self.vertical_crs.truncate(checkpoint.len_of(Kind::VerticalCrs));
        self.compound_crs.truncate(checkpoint.len_of(Kind::CompoundCrs));
        self.conversion_methods.truncate(checkpoint.len_of(Kind::ConversionMethod));
        self.operation_methods
            .truncate(checkpoint.len_of(Kind::CoordinateOperationMethod));
        self.parameters.truncate(checkpoint.len_of(Kind::Parameter));
        self.conversions.truncate(checkpoint.len_of(Kind::Conversion));
        self.helmert_transformations
            .truncate(checkpoint.len_of(Kind::HelmertTransformation));
        self.grid_transformations
            .truncate(checkpoint.len_of(Kind::GridTransformation));
        self.other_transformations
            .truncate(checkpoint.len_of(Kind::OtherTransformation));
        self.concatenated_operations
            .truncate(checkpoint.len_of(Kind::ConcatenatedOperation));
        self.grid_packages.truncate(checkpoint.len_of(Kind::GridPackage));
        self.grid_alternatives.truncate(checkpoint.len_of(Kind::GridAlternative));
        self.preferred_hubs.truncate(checkpoint.len_of(Kind::PreferredHub));
        self.authority_preferences
            .truncate(checkpoint.len_of(Kind::AuthorityPreference));
        self.aliases.truncate(checkpoint.len_of(Kind::AliasName));
        self.supersessions.truncate(checkpoint.len_of(Kind::Supersession));
        self.deprecations.truncate(checkpoint.len_of(Kind::Deprecation));
    }

    /// Inserts a record without validation.
    ///
    /// Callers must have checked key uniqueness; an existing key would
    /// otherwise be overwritten.
    pub(crate) fn insert(&mut self, record: Record) {
        match record {
            Record::UnitOfMeasure(r) => {
                self.units.insert(r.key.clone(), r);
            }
            Record::CelestialBody(r) => {
                self.celestial_bodies.insert(r.key.clone(), r);
            }
            Record::Ellipsoid(r) => {
                self.ellipsoids.insert(r.key.clone(), r);
            }
            Record::Extent(r) => {
                self.extents.insert(r.key.clone(), r);
            }
            Record::PrimeMeridian(r) => {
                self.prime_meridians.insert(r.key.clone(), r);
            }
            Record::GeodeticDatum(r) => {
                self.geodetic_datums.insert(r.key.clone(), r);
            }
            Record::VerticalDatum(r) => {
                self.vertical_datums.insert(r.key.clone(), r);
            }
            Record::CoordinateSystem(r) => {
                self.coordinate_systems.insert(r.key.clone(), r);
            }
            Record::Axis(r) => {
                self.axes.insert(r.key.clone(), r);
            }
            Record::GeodeticCrs(r) => {
                self.geodetic_crs.insert(r.key.clone(), r);
            }
            Record::ProjectedCrs(r) => {
                self.projected_crs.insert(r.key.clone(), r);
            }
            Record::VerticalCrs(r) => {
                self.vertical_crs.insert(r.key.clone(), r);
            }
            Record::CompoundCrs(r) => {
                self.compound_crs.insert(r.key.clone(), r);
            }
            Record::ConversionMethod(r) => {
                self.conversion_methods.insert(r.key.clone(), r);
            }
            Record::CoordinateOperationMethod(r) => {
                self.operation_methods.insert(r.key.clone(), r);
            }
            Record::Parameter(r) => {
                self.parameters.insert(r.key.clone(), r);
            }
            Record::Conversion(r) => {
                self.conversions.insert(r.key.clone(), r);
            }
            Record::HelmertTransformation(r) => {
                self.helmert_transformations.insert(r.key.clone(), r);
            }
            Record::GridTransformation(r) => {
                self.grid_transformations.insert(r.key.clone(), r);
            }
            Record::OtherTransformation(r) => {
                self.other_transformations.insert(r.key.clone(), r);
            }
            Record::ConcatenatedOperation(r) => {
                self.concatenated_operations.insert(r.key.clone(), r);
            }
            Record::GridPackage(r) => {
                self.grid_packages.insert(r.package_name.clone(), r);
            }
            Record::GridAlternative(r) => {
                self.grid_alternatives.insert(r.original_grid_name.clone(), r);
            }
            Record::PreferredHub(r) => self.preferred_hubs.push(r),
            Record::AuthorityPreference(r) => self.authority_preferences.push(r),
            Record::AliasName(r) => self.aliases.push(r),
            Record::Supersession(r) => self.supersessions.push(r),
            Record::Deprecation(r) => self.deprecations.push(r),
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Looks up a keyed record of a given kind.
    pub fn get(&self, kind: Kind, key: &ObjectKey) -> Option<AnyObject<'_>> {
        Some(match kind {
            Kind::UnitOfMeasure => AnyObject::UnitOfMeasure(self.units.get(key)?),
            Kind::CelestialBody => AnyObject::CelestialBody(self.celestial_bodies.get(key)?),
            Kind::Ellipsoid => AnyObject::Ellipsoid(self.ellipsoids.get(key)?),
            Kind::Extent => AnyObject::Extent(self.extents.get(key)?),
            Kind::PrimeMeridian => AnyObject::PrimeMeridian(self.prime_meridians.get(key)?),
            Kind::GeodeticDatum => AnyObject::GeodeticDatum(self.geodetic_datums.get(key)?),
            Kind::VerticalDatum => AnyObject::VerticalDatum(self.vertical_datums.get(key)?),
            Kind::CoordinateSystem => {
                AnyObject::CoordinateSystem(self.coordinate_systems.get(key)?)
            }
            Kind::Axis => AnyObject::Axis(self.axes.get(key)?),
            Kind::GeodeticCrs
            | Kind::ProjectedCrs
            | Kind::VerticalCrs
            | Kind::CompoundCrs => {
                let crs = self.crs(key)?;
                if crs.kind() != kind {
                    return None;
                }
                AnyObject::Crs(crs)
            }
            Kind::ConversionMethod => {
                AnyObject::ConversionMethod(self.conversion_methods.get(key)?)
            }
            Kind::CoordinateOperationMethod => {
                AnyObject::CoordinateOperationMethod(self.operation_methods.get(key)?)
            }
            Kind::Parameter => AnyObject::Parameter(self.parameters.get(key)?),
            Kind::Conversion
            | Kind::HelmertTransformation
            | Kind::GridTransformation
            | Kind::OtherTransformation
            | Kind::ConcatenatedOperation => {
                let op = self.operation(key)?;
                if op.kind() != kind {
                    return None;
                }
                AnyObject::Operation(op)
            }
            Kind::GridPackage
            | Kind::GridAlternative
            | Kind::PreferredHub
            | Kind::AuthorityPreference
            | Kind::AliasName
            | Kind::Supersession
            | Kind::Deprecation => return None,
        })
    }

    /// Every keyed record, in [`Kind::KEYED`] order.
    pub fn objects(&self) -> impl Iterator<Item = AnyObject<'_>> + '_ {
        self.units
            .values()
            .map(AnyObject::UnitOfMeasure)
            .chain(self.celestial_bodies.values().map(AnyObject::CelestialBody))
            .chain(self.ellipsoids.values().map(AnyObject::Ellipsoid))
            .chain(self.extents.values().map(AnyObject::Extent))
            .chain(self.prime_meridians.values().map(AnyObject::PrimeMeridian))
            .chain(self.geodetic_datums.values().map(AnyObject::GeodeticDatum))
            .chain(self.vertical_datums.values().map(AnyObject::VerticalDatum))
            .chain(self.coordinate_systems.values().map(AnyObject::CoordinateSystem))
            .chain(self.axes.values().map(AnyObject::Axis))
            .chain(self.crs_objects().map(AnyObject::Crs))
            .chain(self.conversion_methods.values().map(AnyObject::ConversionMethod))
            .chain(
                self.operation_methods
                    .values()
                    .map(AnyObject::CoordinateOperationMethod),
            )
            .chain(self.parameters.values().map(AnyObject::Parameter))
            .chain(self.operations().map(AnyObject::Operation))
    }

    /// Every CRS, geodetic first, then projected, vertical and compound.
    pub fn crs_objects(&self) -> impl Iterator<Item = CrsRef<'_>> + '_ {
        self.geodetic_crs
            .values()
            .map(CrsRef::Geodetic)
            .chain(self.projected_crs.values().map(CrsRef::Projected))
            .chain(self.vertical_crs.values().map(CrsRef::Vertical))
            .chain(self.compound_crs.values().map(CrsRef::Compound))
    }

    /// Every coordinate operation, in operation kind order.
    pub fn operations(&self) -> impl Iterator<Item = OperationRef<'_>> + '_ {
        self.conversions
            .values()
            .map(OperationRef::Conversion)
            .chain(self.helmert_transformations.values().map(OperationRef::Helmert))
            .chain(self.grid_transformations.values().map(OperationRef::Grid))
            .chain(self.other_transformations.values().map(OperationRef::Other))
            .chain(
                self.concatenated_operations
                    .values()
                    .map(OperationRef::Concatenated),
            )
    }

    /// Returns true if a keyed record of `kind` exists.
    pub fn contains(&self, kind: Kind, key: &ObjectKey) -> bool {
        self.get(kind, key).is_some()
    }

    /// Looks up a key in the unified CRS namespace.
    pub fn crs(&self, key: &ObjectKey) -> Option<CrsRef<'_>> {
        if let Some(crs) = self.geodetic_crs.get(key) {
            return Some(CrsRef::Geodetic(crs));
        }
        if let Some(crs) = self.projected_crs.get(key) {
            return Some(CrsRef::Projected(crs));
        }
        if let Some(crs) = self.vertical_crs.get(key) {
            return Some(CrsRef::Vertical(crs));
        }
        self.compound_crs.get(key).map(CrsRef::Compound)
    }

    /// Looks up a key in the unified operation namespace.
    pub fn operation(&self, key: &ObjectKey) -> Option<OperationRef<'_>> {
        if let Some(op) = self.conversions.get(key) {
            return Some(OperationRef::Conversion(op));
        }
        if let Some(op) = self.helmert_transformations.get(key) {
            return Some(OperationRef::Helmert(op));
        }
        if let Some(op) = self.grid_transformations.get(key) {
            return Some(OperationRef::Grid(op));
        }
        if let Some(op) = self.other_transformations.get(key) {
            return Some(OperationRef::Other(op));
        }
        self.concatenated_operations
            .get(key)
            .map(OperationRef::Concatenated)
    }

    /// Returns the CRS kinds (other than `except`) already using `key`.
    pub fn crs_namespace_conflict(&self, key: &ObjectKey, except: Kind) -> Option<Kind> {
        [
            (Kind::GeodeticCrs, self.geodetic_crs.contains_key(key)),
            (Kind::ProjectedCrs, self.projected_crs.contains_key(key)),
            (Kind::VerticalCrs, self.vertical_crs.contains_key(key)),
            (Kind::CompoundCrs, self.compound_crs.contains_key(key)),
        ]
        .into_iter()
        .find(|&(kind, present)| present && kind != except)
        .map(|(kind, _)| kind)
    }

    /// Returns an operation kind (other than `except`) already using `key`.
    pub fn operation_namespace_conflict(&self, key: &ObjectKey, except: Kind) -> Option<Kind> {
        [
            (Kind::Conversion, self.conversions.contains_key(key)),
            (
                Kind::HelmertTransformation,
                self.helmert_transformations.contains_key(key),
            ),
            (
                Kind::GridTransformation,
                self.grid_transformations.contains_key(key),
            ),
            (
                Kind::OtherTransformation,
                self.other_transformations.contains_key(key),
            ),
            (
                Kind::ConcatenatedOperation,
                self.concatenated_operations.contains_key(key),
            ),
        ]
        .into_iter()
        .find(|&(kind, present)| present && kind != except)
        .map(|(kind, _)| kind)
    }

    /// Records of `kind` added since `checkpoint`, in insertion order.
    pub(crate) fn staged_since(&self, kind: Kind, checkpoint: &Checkpoint) -> Vec<Record> {
        let start = checkpoint.len_of(kind);
        fn tail<T: Clone + Into<Record>>(items: impl Iterator<Item = T>, start: usize) -> Vec<Record> {
            items.skip(start).map(Into::into).collect()
        }
        match kind {
            Kind::UnitOfMeasure => tail(self.units.values().cloned(), start),
            Kind::CelestialBody => tail(self.celestial_bodies.values().cloned(), start),
            Kind::Ellipsoid => tail(self.ellipsoids.values().cloned(), start),
            Kind::Extent => tail(self.extents.values().cloned(), start),
            Kind::PrimeMeridian => tail(self.prime_meridians.values().cloned(), start),
            Kind::GeodeticDatum => tail(self.geodetic_datums.values().cloned(), start),
            Kind::VerticalDatum => tail(self.vertical_datums.values().cloned(), start),
            Kind::CoordinateSystem => tail(self.coordinate_systems.values().cloned(), start),
            Kind::Axis => tail(self.axes.values().cloned(), start),
            Kind::GeodeticCrs => tail(self.geodetic_crs.values().cloned(), start),
            Kind::ProjectedCrs => tail(self.projected_crs.values().cloned(), start),
            Kind::VerticalCrs => tail(self.vertical_crs.values().cloned(), start),
            Kind::CompoundCrs => tail(self.compound_crs.values().cloned(), start),
            Kind::ConversionMethod => tail(self.conversion_methods.values().cloned(), start),
            Kind::CoordinateOperationMethod => {
                tail(self.operation_methods.values().cloned(), start)
            }
            Kind::Parameter => tail(self.parameters.values().cloned(), start),
            Kind::Conversion => tail(self.conversions.values().cloned(), start),
            Kind::HelmertTransformation => {
                tail(self.helmert_transformations.values().cloned(), start)
            }
            Kind::GridTransformation => tail(self.grid_transformations.values().cloned(), start),
            Kind::OtherTransformation => {
                tail(self.other_transformations.values().cloned(), start)
            }
            Kind::ConcatenatedOperation => {
                tail(self.concatenated_operations.values().cloned(), start)
            }
            Kind::GridPackage => tail(self.grid_packages.values().cloned(), start),
            Kind::GridAlternative => tail(self.grid_alternatives.values().cloned(), start),
            Kind::PreferredHub => tail(self.preferred_hubs.iter().cloned(), start),
            Kind::AuthorityPreference => tail(self.authority_preferences.iter().cloned(), start),
            Kind::AliasName => tail(self.aliases.iter().cloned(), start),
            Kind::Supersession => tail(self.supersessions.iter().cloned(), start),
            Kind::Deprecation => tail(self.deprecations.iter().cloned(), start),
        }
    }

    /// Every record in load order.
    pub fn records(&self) -> Vec<Record> {
        let empty = Tables::default().checkpoint();
        let mut kinds = ALL_KINDS;
        kinds.sort_by_key(|k| k.load_rank());
        kinds
            .iter()
            .flat_map(|&kind| self.staged_since(kind, &empty))
            .collect()
    }
}

/// Every kind in tag order.
pub const ALL_KINDS: [Kind; KIND_COUNT] = [
    Kind::UnitOfMeasure,
    Kind::CelestialBody,
    Kind::Ellipsoid,
    Kind::Extent,
    Kind::PrimeMeridian,
    Kind::GeodeticDatum,
    Kind::VerticalDatum,
    Kind::CoordinateSystem,
    Kind::Axis,
    Kind::GeodeticCrs,
    Kind::ProjectedCrs,
    Kind::VerticalCrs,
    Kind::CompoundCrs,
    Kind::ConversionMethod,
    Kind::CoordinateOperationMethod,
    Kind::Parameter,
    Kind::Conversion,
    Kind::HelmertTransformation,
    Kind::GridTransformation,
    Kind::OtherTransformation,
    Kind::ConcatenatedOperation,
    Kind::GridPackage,
    Kind::GridAlternative,
    Kind::PreferredHub,
    Kind::AuthorityPreference,
    Kind::AliasName,
    Kind::Supersession,
    Kind::Deprecation,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{UnitKind, UnitOfMeasure};

    fn metre() -> UnitOfMeasure {
        UnitOfMeasure::new(ObjectKey::new("EPSG", "9001"), "metre", UnitKind::Length, Some(1.0))
    }

    #[test]
    fn test_checkpoint_rollback() {
        let mut tables = Tables::default();
        tables.insert(metre().into());
        let checkpoint = tables.checkpoint();

        let mut foot = metre();
        foot.key = ObjectKey::new("EPSG", "9002");
        tables.insert(foot.into());
        tables.insert(Record::AliasName(AliasName {
            object: crate::model::ObjectRef::new(Kind::UnitOfMeasure, ObjectKey::new("EPSG", "9001")),
            alt_name: "meter".to_string(),
            source: None,
        }));
        assert_eq!(tables.total_len(), 3);
        assert_eq!(tables.staged_since(Kind::UnitOfMeasure, &checkpoint).len(), 1);

        tables.rollback(&checkpoint);
        assert_eq!(tables.total_len(), 1);
        assert!(tables.contains(Kind::UnitOfMeasure, &ObjectKey::new("EPSG", "9001")));
        assert!(!tables.contains(Kind::UnitOfMeasure, &ObjectKey::new("EPSG", "9002")));
    }

    #[test]
    fn test_all_kinds_in_tag_order() {
        for (i, kind) in ALL_KINDS.iter().enumerate() {
            assert_eq!(*kind as usize, i + 1);
        }
    }
}
