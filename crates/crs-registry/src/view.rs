//! Uniform views over heterogeneous record kinds.
//!
//! [`CrsRef`] and [`OperationRef`] are tagged unions over the CRS and
//! coordinate operation kinds; [`AnyObject`] covers every keyed kind. All
//! three implement [`CatalogObject`], the accessor surface shared by every
//! keyed record.

use crate::model::{
    Axis, CelestialBody, CompoundCrs, ConcatenatedOperation, Conversion, ConversionMethod,
    CoordinateOperationMethod, CoordinateSystem, CrsType, Ellipsoid, Extent, GeodeticCrs,
    GeodeticDatum, GridTransformation, HelmertTransformation, Kind, ObjectKey,
    OtherTransformation, Parameter, PrimeMeridian, ProjectedCrs, UnitOfMeasure, VerticalCrs,
    VerticalDatum,
};

/// Accessors shared by every keyed record.
pub trait CatalogObject {
    fn kind(&self) -> Kind;

    fn key(&self) -> &ObjectKey;

    /// Display name. Coordinate systems have none.
    fn name(&self) -> Option<&str>;

    fn deprecated(&self) -> bool;

    /// Area of use, for kinds that carry one.
    fn area(&self) -> Option<&ObjectKey>;
}

macro_rules! catalog_object {
    ($ty:ident, |$s:ident| name: $name:expr, deprecated: $dep:expr, area: $area:expr) => {
        impl CatalogObject for $ty {
            fn kind(&self) -> Kind {
                Kind::$ty
            }

            fn key(&self) -> &ObjectKey {
                &self.key
            }

            #[allow(unused_variables)]
            fn name(&self) -> Option<&str> {
                let $s = self;
                $name
            }

            #[allow(unused_variables)]
            fn deprecated(&self) -> bool {
                let $s = self;
                $dep
            }

            #[allow(unused_variables)]
            fn area(&self) -> Option<&ObjectKey> {
                let $s = self;
                $area
            }
        }
    };
}

catalog_object!(UnitOfMeasure, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: None);
catalog_object!(CelestialBody, |s| name: Some(s.name.as_str()), deprecated: false, area: None);
catalog_object!(Ellipsoid, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: None);
catalog_object!(Extent, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: None);
catalog_object!(PrimeMeridian, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: None);
catalog_object!(GeodeticDatum, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(VerticalDatum, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(CoordinateSystem, |s| name: None, deprecated: false, area: None);
catalog_object!(Axis, |s| name: Some(s.name.as_str()), deprecated: false, area: None);
catalog_object!(GeodeticCrs, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: s.area.as_ref());
catalog_object!(ProjectedCrs, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: s.area.as_ref());
catalog_object!(VerticalCrs, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(CompoundCrs, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(ConversionMethod, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: None);
catalog_object!(CoordinateOperationMethod, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: None);
catalog_object!(Parameter, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: None);
catalog_object!(Conversion, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(HelmertTransformation, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(GridTransformation, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(OtherTransformation, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));
catalog_object!(ConcatenatedOperation, |s| name: Some(s.name.as_str()), deprecated: s.deprecated, area: Some(&s.area));

macro_rules! delegate_catalog_object {
    ($ty:ident) => {
        impl CatalogObject for $ty<'_> {
            fn kind(&self) -> Kind {
                self.as_object().kind()
            }

            fn key(&self) -> &ObjectKey {
                self.as_object().key()
            }

            fn name(&self) -> Option<&str> {
                self.as_object().name()
            }

            fn deprecated(&self) -> bool {
                self.as_object().deprecated()
            }

            fn area(&self) -> Option<&ObjectKey> {
                self.as_object().area()
            }
        }
    };
}

// =============================================================================
// CRS
// =============================================================================

/// A record of any of the four CRS kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrsRef<'a> {
    Geodetic(&'a GeodeticCrs),
    Projected(&'a ProjectedCrs),
    Vertical(&'a VerticalCrs),
    Compound(&'a CompoundCrs),
}

impl<'a> CrsRef<'a> {
    pub fn as_object(&self) -> &'a dyn CatalogObject {
        match *self {
            CrsRef::Geodetic(c) => c,
            CrsRef::Projected(c) => c,
            CrsRef::Vertical(c) => c,
            CrsRef::Compound(c) => c,
        }
    }

    /// Semantic type of the CRS.
    pub fn crs_type(&self) -> CrsType {
        match self {
            CrsRef::Geodetic(c) => c.crs_type.into(),
            CrsRef::Projected(_) => CrsType::Projected,
            CrsRef::Vertical(_) => CrsType::Vertical,
            CrsRef::Compound(_) => CrsType::Compound,
        }
    }

    /// Opaque text definition, for text-defined geodetic/projected CRSs.
    pub fn text_definition(&self) -> Option<&'a str> {
        match *self {
            CrsRef::Geodetic(c) => c.text_definition.as_deref(),
            CrsRef::Projected(c) => c.text_definition.as_deref(),
            CrsRef::Vertical(_) | CrsRef::Compound(_) => None,
        }
    }
}

delegate_catalog_object!(CrsRef);

// =============================================================================
// COORDINATE OPERATIONS
// =============================================================================

/// A record of any of the five coordinate operation kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationRef<'a> {
    Conversion(&'a Conversion),
    Helmert(&'a HelmertTransformation),
    Grid(&'a GridTransformation),
    Other(&'a OtherTransformation),
    Concatenated(&'a ConcatenatedOperation),
}

impl<'a> OperationRef<'a> {
    pub fn as_object(&self) -> &'a dyn CatalogObject {
        match *self {
            OperationRef::Conversion(o) => o,
            OperationRef::Helmert(o) => o,
            OperationRef::Grid(o) => o,
            OperationRef::Other(o) => o,
            OperationRef::Concatenated(o) => o,
        }
    }

    /// Positional accuracy in metres. Conversions are exact.
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            OperationRef::Conversion(_) => Some(0.0),
            OperationRef::Helmert(o) => o.accuracy,
            OperationRef::Grid(o) => o.accuracy,
            OperationRef::Other(o) => o.accuracy,
            OperationRef::Concatenated(o) => o.accuracy,
        }
    }

    /// Source CRS. Conversions are bound to CRSs through projected CRSs and
    /// have none of their own.
    pub fn source_crs(&self) -> Option<&'a ObjectKey> {
        match *self {
            OperationRef::Conversion(_) => None,
            OperationRef::Helmert(o) => Some(&o.source_crs),
            OperationRef::Grid(o) => Some(&o.source_crs),
            OperationRef::Other(o) => Some(&o.source_crs),
            OperationRef::Concatenated(o) => Some(&o.source_crs),
        }
    }

    /// Target CRS. See [`source_crs`](Self::source_crs).
    pub fn target_crs(&self) -> Option<&'a ObjectKey> {
        match *self {
            OperationRef::Conversion(_) => None,
            OperationRef::Helmert(o) => Some(&o.target_crs),
            OperationRef::Grid(o) => Some(&o.target_crs),
            OperationRef::Other(o) => Some(&o.target_crs),
            OperationRef::Concatenated(o) => Some(&o.target_crs),
        }
    }

    /// Method key. Concatenated operations have no method.
    pub fn method(&self) -> Option<&'a ObjectKey> {
        match *self {
            OperationRef::Conversion(o) => Some(&o.method),
            OperationRef::Helmert(o) => Some(&o.method),
            OperationRef::Grid(o) => Some(&o.method),
            OperationRef::Other(o) => Some(&o.method),
            OperationRef::Concatenated(_) => None,
        }
    }
}

delegate_catalog_object!(OperationRef);

// =============================================================================
// ANY OBJECT
// =============================================================================

/// A keyed record of any kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyObject<'a> {
    UnitOfMeasure(&'a UnitOfMeasure),
    CelestialBody(&'a CelestialBody),
    Ellipsoid(&'a Ellipsoid),
    Extent(&'a Extent),
    PrimeMeridian(&'a PrimeMeridian),
    GeodeticDatum(&'a GeodeticDatum),
    VerticalDatum(&'a VerticalDatum),
    CoordinateSystem(&'a CoordinateSystem),
    Axis(&'a Axis),
    Crs(CrsRef<'a>),
    ConversionMethod(&'a ConversionMethod),
    CoordinateOperationMethod(&'a CoordinateOperationMethod),
    Parameter(&'a Parameter),
    Operation(OperationRef<'a>),
}

impl<'a> AnyObject<'a> {
    pub fn as_object(&self) -> &'a dyn CatalogObject {
        match *self {
            AnyObject::UnitOfMeasure(o) => o,
            AnyObject::CelestialBody(o) => o,
            AnyObject::Ellipsoid(o) => o,
            AnyObject::Extent(o) => o,
            AnyObject::PrimeMeridian(o) => o,
            AnyObject::GeodeticDatum(o) => o,
            AnyObject::VerticalDatum(o) => o,
            AnyObject::CoordinateSystem(o) => o,
            AnyObject::Axis(o) => o,
            AnyObject::Crs(c) => c.as_object(),
            AnyObject::ConversionMethod(o) => o,
            AnyObject::CoordinateOperationMethod(o) => o,
            AnyObject::Parameter(o) => o,
            AnyObject::Operation(o) => o.as_object(),
        }
    }

    pub fn as_crs(&self) -> Option<CrsRef<'a>> {
        match *self {
            AnyObject::Crs(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<OperationRef<'a>> {
        match *self {
            AnyObject::Operation(o) => Some(o),
            _ => None,
        }
    }
}

delegate_catalog_object!(AnyObject);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeodeticCrsType;

    #[test]
    fn test_crs_ref_accessors() {
        let crs = GeodeticCrs::structured(
            ObjectKey::new("EPSG", "4326"),
            "WGS 84",
            GeodeticCrsType::Geographic2D,
            ObjectKey::new("EPSG", "6422"),
            ObjectKey::new("EPSG", "6326"),
            ObjectKey::new("EPSG", "1262"),
        );
        let view = CrsRef::Geodetic(&crs);
        assert_eq!(view.kind(), Kind::GeodeticCrs);
        assert_eq!(view.key(), &ObjectKey::new("EPSG", "4326"));
        assert_eq!(view.name(), Some("WGS 84"));
        assert_eq!(view.crs_type(), CrsType::Geographic2D);
        assert_eq!(view.area(), Some(&ObjectKey::new("EPSG", "1262")));
        assert!(!view.deprecated());

        let any = AnyObject::Crs(view);
        assert_eq!(any.kind(), Kind::GeodeticCrs);
        assert!(any.as_crs().is_some());
        assert!(any.as_operation().is_none());
    }

    #[test]
    fn test_operation_ref_accessors() {
        let conversion = Conversion {
            key: ObjectKey::new("EPSG", "3856"),
            name: "Popular Visualisation Pseudo-Mercator".to_string(),
            method: ObjectKey::new("EPSG", "1024"),
            area: ObjectKey::new("EPSG", "3544"),
            ..Default::default()
        };
        let view = OperationRef::Conversion(&conversion);
        assert_eq!(view.kind(), Kind::Conversion);
        assert_eq!(view.accuracy(), Some(0.0));
        assert_eq!(view.source_crs(), None);
        assert_eq!(view.method(), Some(&ObjectKey::new("EPSG", "1024")));

        let concat = ConcatenatedOperation {
            key: ObjectKey::new("EPSG", "8047"),
            name: "ED50 to WGS 84 (14)".to_string(),
            source_crs: ObjectKey::new("EPSG", "4230"),
            target_crs: ObjectKey::new("EPSG", "4326"),
            ..Default::default()
        };
        let view = OperationRef::Concatenated(&concat);
        assert_eq!(view.accuracy(), None);
        assert_eq!(view.target_crs(), Some(&ObjectKey::new("EPSG", "4326")));
        assert_eq!(view.method(), None);
    }

    #[test]
    fn test_coordinate_system_has_no_name() {
        let cs = CoordinateSystem::new(
            ObjectKey::new("EPSG", "6422"),
            crate::model::CsType::Ellipsoidal,
            2,
        );
        let any = AnyObject::CoordinateSystem(&cs);
        assert_eq!(any.name(), None);
        assert_eq!(any.kind(), Kind::CoordinateSystem);
    }
}
