//! The record sum type and load batches.
//!
//! A [`Batch`] is the unit of bulk loading: every record in it is admitted or
//! the whole batch is rolled back.

use crate::model::{
    AliasName, AuthorityPreference, Axis, CelestialBody, CompoundCrs, ConcatenatedOperation,
    Conversion, ConversionMethod, CoordinateOperationMethod, CoordinateSystem, Deprecation,
    Ellipsoid, Extent, GeodeticCrs, GeodeticDatum, GridAlternative, GridPackage,
    GridTransformation, HelmertTransformation, Kind, ObjectKey, OtherTransformation, Parameter,
    PreferredHub, PrimeMeridian, ProjectedCrs, Supersession, UnitOfMeasure, VerticalCrs,
    VerticalDatum,
};

/// Any record the registry can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    UnitOfMeasure(UnitOfMeasure),
    CelestialBody(CelestialBody),
    Ellipsoid(Ellipsoid),
    Extent(Extent),
    PrimeMeridian(PrimeMeridian),
    GeodeticDatum(GeodeticDatum),
    VerticalDatum(VerticalDatum),
    CoordinateSystem(CoordinateSystem),
    Axis(Axis),
    GeodeticCrs(GeodeticCrs),
    ProjectedCrs(ProjectedCrs),
    VerticalCrs(VerticalCrs),
    CompoundCrs(CompoundCrs),
    ConversionMethod(ConversionMethod),
    CoordinateOperationMethod(CoordinateOperationMethod),
    Parameter(Parameter),
    Conversion(Conversion),
    HelmertTransformation(HelmertTransformation),
    GridTransformation(GridTransformation),
    OtherTransformation(OtherTransformation),
    ConcatenatedOperation(ConcatenatedOperation),
    GridPackage(GridPackage),
    GridAlternative(GridAlternative),
    PreferredHub(PreferredHub),
    AuthorityPreference(AuthorityPreference),
    AliasName(AliasName),
    Supersession(Supersession),
    Deprecation(Deprecation),
}

macro_rules! record_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Record {
                fn from(r: $variant) -> Self {
                    Record::$variant(r)
                }
            }
        )*

        impl Record {
            /// Returns the kind of this record.
            pub fn kind(&self) -> Kind {
                match self {
                    $(Record::$variant(_) => Kind::$variant,)*
                }
            }
        }
    };
}

record_from!(
    UnitOfMeasure,
    CelestialBody,
    Ellipsoid,
    Extent,
    PrimeMeridian,
    GeodeticDatum,
    VerticalDatum,
    CoordinateSystem,
    Axis,
    GeodeticCrs,
    ProjectedCrs,
    VerticalCrs,
    CompoundCrs,
    ConversionMethod,
    CoordinateOperationMethod,
    Parameter,
    Conversion,
    HelmertTransformation,
    GridTransformation,
    OtherTransformation,
    ConcatenatedOperation,
    GridPackage,
    GridAlternative,
    PreferredHub,
    AuthorityPreference,
    AliasName,
    Supersession,
    Deprecation,
);

impl Record {
    /// Returns the key of keyed records.
    pub fn key(&self) -> Option<&ObjectKey> {
        match self {
            Record::UnitOfMeasure(r) => Some(&r.key),
            Record::CelestialBody(r) => Some(&r.key),
            Record::Ellipsoid(r) => Some(&r.key),
            Record::Extent(r) => Some(&r.key),
            Record::PrimeMeridian(r) => Some(&r.key),
            Record::GeodeticDatum(r) => Some(&r.key),
            Record::VerticalDatum(r) => Some(&r.key),
            Record::CoordinateSystem(r) => Some(&r.key),
            Record::Axis(r) => Some(&r.key),
            Record::GeodeticCrs(r) => Some(&r.key),
            Record::ProjectedCrs(r) => Some(&r.key),
            Record::VerticalCrs(r) => Some(&r.key),
            Record::CompoundCrs(r) => Some(&r.key),
            Record::ConversionMethod(r) => Some(&r.key),
            Record::CoordinateOperationMethod(r) => Some(&r.key),
            Record::Parameter(r) => Some(&r.key),
            Record::Conversion(r) => Some(&r.key),
            Record::HelmertTransformation(r) => Some(&r.key),
            Record::GridTransformation(r) => Some(&r.key),
            Record::OtherTransformation(r) => Some(&r.key),
            Record::ConcatenatedOperation(r) => Some(&r.key),
            Record::GridPackage(_)
            | Record::GridAlternative(_)
            | Record::PreferredHub(_)
            | Record::AuthorityPreference(_)
            | Record::AliasName(_)
            | Record::Supersession(_)
            | Record::Deprecation(_) => None,
        }
    }

    /// Human-readable identity used in diagnostics.
    pub fn label(&self) -> String {
        if let Some(key) = self.key() {
            return key.to_string();
        }
        match self {
            Record::GridPackage(r) => r.package_name.clone(),
            Record::GridAlternative(r) => r.original_grid_name.clone(),
            Record::PreferredHub(r) => format!("{} -> {}", r.source_datum, r.hub_datum),
            Record::AuthorityPreference(r) => {
                format!("{} -> {}", r.source_authority, r.target_authority)
            }
            Record::AliasName(r) => format!("{} '{}'", r.object, r.alt_name),
            Record::Supersession(r) => format!("{} -> {}", r.superseded, r.replacement),
            Record::Deprecation(r) => format!("{} -> {}", r.deprecated, r.replacement),
            _ => String::new(),
        }
    }
}

/// A batch of records to be loaded atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// Optional human-readable name (e.g. the source data set).
    pub name: String,
    pub records: Vec<Record>,
}

impl Batch {
    /// Creates an empty unnamed batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty batch with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: impl Into<Record>) {
        self.records.push(record.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Extend<Record> for Batch {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectRef;

    #[test]
    fn test_record_kind_and_key() {
        let unit = UnitOfMeasure::new(
            ObjectKey::new("EPSG", "9001"),
            "metre",
            crate::model::UnitKind::Length,
            Some(1.0),
        );
        let record = Record::from(unit);
        assert_eq!(record.kind(), Kind::UnitOfMeasure);
        assert_eq!(record.key(), Some(&ObjectKey::new("EPSG", "9001")));
        assert_eq!(record.label(), "EPSG:9001");
    }

    #[test]
    fn test_link_record_label() {
        let alias = Record::from(AliasName {
            object: ObjectRef::new(Kind::GeodeticCrs, ObjectKey::new("EPSG", "4326")),
            alt_name: "WGS84".to_string(),
            source: None,
        });
        assert_eq!(alias.kind(), Kind::AliasName);
        assert!(alias.key().is_none());
        assert_eq!(alias.label(), "geodetic_crs EPSG:4326 'WGS84'");
    }

    #[test]
    fn test_batch_new() {
        let mut batch = Batch::with_name("epsg");
        assert!(batch.is_empty());
        batch.push(PreferredHub::default());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.name, "epsg");
    }
}
