//! Data model types for the registry.
//!
//! This module contains the record types the registry holds:
//! - Identifiers (authority/code keys, kinds)
//! - Leaf entities (units, bodies, ellipsoids, extents, prime meridians)
//! - Datums, coordinate systems and CRSs
//! - Coordinate operations
//! - Link and distribution metadata
//! - Records, batches and builders

pub mod builder;
pub mod common;
pub mod crs;
pub mod cs;
pub mod datum;
pub mod key;
pub mod metadata;
pub mod operation;
pub mod record;

pub use builder::{BatchBuilder, ConversionBuilder, HelmertBuilder};
pub use common::{
    BoundingBox, CelestialBody, Ellipsoid, Extent, PrimeMeridian, UnitKind, UnitOfMeasure,
};
pub use crs::{CompoundCrs, CrsType, GeodeticCrs, GeodeticCrsType, ProjectedCrs, VerticalCrs};
pub use cs::{Axis, CoordinateSystem, CsType};
pub use datum::{GeodeticDatum, VerticalDatum};
pub use key::{
    content_digest, format_digest, parse_digest, ContentDigest, Kind, ObjectKey, ObjectRef,
    ANY_AUTHORITY,
};
pub use metadata::{
    find_preference, AliasName, AuthorityPreference, Deprecation, GridAlternative, GridFormat,
    GridMethod, GridPackage, PreferredHub, Supersession, NULL_GRID_NAME,
};
pub use operation::{
    is_opaque_method, is_registered_conversion_method, ConcatenatedOperation, Conversion,
    ConversionMethod, CoordinateOperationMethod, GridTransformation, HelmertTransformation,
    OtherTransformation, Parameter, ParameterValue, Quantity, MAX_PARAMETERS, MAX_STEPS,
    MIN_STEPS, PROJ_BASED_METHOD, WKT_BASED_METHOD,
};
pub use record::{Batch, Record};
