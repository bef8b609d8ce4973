//! Identifiers for registry objects.
//!
//! Every keyed object is identified by an authority name and a code within
//! that authority, e.g. `EPSG:4326`. Link records (aliases, supersessions,
//! deprecations) address their targets through an [`ObjectRef`], which pairs
//! the key with the kind of object it names.

use std::fmt;

use sha2::{Digest, Sha256};

/// Authority wildcard used by authority preferences.
pub const ANY_AUTHORITY: &str = "any";

/// An `(authority, code)` identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub authority: String,
    pub code: String,
}

impl ObjectKey {
    /// Creates a key from an authority and a code.
    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            code: code.into(),
        }
    }

    /// Parses `AUTHORITY:CODE`. The code may itself contain colons.
    pub fn parse(s: &str) -> Option<Self> {
        let (authority, code) = s.split_once(':')?;
        if authority.is_empty() || code.is_empty() {
            return None;
        }
        Some(Self::new(authority, code))
    }

    /// Returns true if both parts are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.authority.is_empty() && !self.code.is_empty()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// Kinds of records held by the registry.
///
/// The discriminants double as record tags in the snapshot encoding and must
/// not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    UnitOfMeasure = 1,
    CelestialBody = 2,
    Ellipsoid = 3,
    Extent = 4,
    PrimeMeridian = 5,
    GeodeticDatum = 6,
    VerticalDatum = 7,
    CoordinateSystem = 8,
    Axis = 9,
    GeodeticCrs = 10,
    ProjectedCrs = 11,
    VerticalCrs = 12,
    CompoundCrs = 13,
    ConversionMethod = 14,
    CoordinateOperationMethod = 15,
    Parameter = 16,
    Conversion = 17,
    HelmertTransformation = 18,
    GridTransformation = 19,
    OtherTransformation = 20,
    ConcatenatedOperation = 21,
    GridPackage = 22,
    GridAlternative = 23,
    PreferredHub = 24,
    AuthorityPreference = 25,
    AliasName = 26,
    Supersession = 27,
    Deprecation = 28,
}

impl Kind {
    /// Keyed kinds in lookup order (used by `object_lookup`).
    pub const KEYED: [Kind; 21] = [
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
    ];

    /// Creates a Kind from its wire representation.
    pub fn from_u8(v: u8) -> Option<Kind> {
        match v {
            1 => Some(Kind::UnitOfMeasure),
            2 => Some(Kind::CelestialBody),
            3 => Some(Kind::Ellipsoid),
            4 => Some(Kind::Extent),
            5 => Some(Kind::PrimeMeridian),
            6 => Some(Kind::GeodeticDatum),
            7 => Some(Kind::VerticalDatum),
            8 => Some(Kind::CoordinateSystem),
            9 => Some(Kind::Axis),
            10 => Some(Kind::GeodeticCrs),
            11 => Some(Kind::ProjectedCrs),
            12 => Some(Kind::VerticalCrs),
            13 => Some(Kind::CompoundCrs),
            14 => Some(Kind::ConversionMethod),
            15 => Some(Kind::CoordinateOperationMethod),
            16 => Some(Kind::Parameter),
            17 => Some(Kind::Conversion),
            18 => Some(Kind::HelmertTransformation),
            19 => Some(Kind::GridTransformation),
            20 => Some(Kind::OtherTransformation),
            21 => Some(Kind::ConcatenatedOperation),
            22 => Some(Kind::GridPackage),
            23 => Some(Kind::GridAlternative),
            24 => Some(Kind::PreferredHub),
            25 => Some(Kind::AuthorityPreference),
            26 => Some(Kind::AliasName),
            27 => Some(Kind::Supersession),
            28 => Some(Kind::Deprecation),
            _ => None,
        }
    }

    /// Table name used in diagnostics.
    pub fn table_name(self) -> &'static str {
        match self {
            Kind::UnitOfMeasure => "unit_of_measure",
            Kind::CelestialBody => "celestial_body",
            Kind::Ellipsoid => "ellipsoid",
            Kind::Extent => "extent",
            Kind::PrimeMeridian => "prime_meridian",
            Kind::GeodeticDatum => "geodetic_datum",
            Kind::VerticalDatum => "vertical_datum",
            Kind::CoordinateSystem => "coordinate_system",
            Kind::Axis => "axis",
            Kind::GeodeticCrs => "geodetic_crs",
            Kind::ProjectedCrs => "projected_crs",
            Kind::VerticalCrs => "vertical_crs",
            Kind::CompoundCrs => "compound_crs",
            Kind::ConversionMethod => "conversion_method",
            Kind::CoordinateOperationMethod => "coordinate_operation_method",
            Kind::Parameter => "parameter",
            Kind::Conversion => "conversion",
            Kind::HelmertTransformation => "helmert_transformation",
            Kind::GridTransformation => "grid_transformation",
            Kind::OtherTransformation => "other_transformation",
            Kind::ConcatenatedOperation => "concatenated_operation",
            Kind::GridPackage => "grid_packages",
            Kind::GridAlternative => "grid_alternatives",
            Kind::PreferredHub => "geodetic_datum_preferred_hub",
            Kind::AuthorityPreference => "authority_to_authority_preference",
            Kind::AliasName => "alias_name",
            Kind::Supersession => "supersession",
            Kind::Deprecation => "deprecation",
        }
    }

    /// Position of the kind in the bulk-load order.
    ///
    /// A kind only references kinds of a strictly lower rank, except for the
    /// references checked in the deferred validation phase.
    pub fn load_rank(self) -> u8 {
        match self {
            Kind::UnitOfMeasure => 0,
            Kind::CelestialBody => 1,
            Kind::Ellipsoid | Kind::Extent | Kind::PrimeMeridian => 2,
            Kind::GeodeticDatum | Kind::VerticalDatum => 3,
            Kind::CoordinateSystem => 4,
            Kind::Axis => 5,
            Kind::GeodeticCrs | Kind::VerticalCrs => 6,
            Kind::ConversionMethod | Kind::CoordinateOperationMethod | Kind::Parameter => 7,
            Kind::Conversion => 8,
            Kind::ProjectedCrs => 9,
            Kind::CompoundCrs => 10,
            Kind::HelmertTransformation | Kind::GridTransformation | Kind::OtherTransformation => 11,
            Kind::ConcatenatedOperation => 12,
            Kind::GridPackage => 13,
            Kind::GridAlternative => 14,
            Kind::PreferredHub | Kind::AuthorityPreference => 15,
            Kind::AliasName | Kind::Supersession | Kind::Deprecation => 16,
        }
    }

    /// Returns true for kinds identified by an [`ObjectKey`].
    pub fn is_keyed(self) -> bool {
        (self as u8) <= Kind::ConcatenatedOperation as u8
    }

    /// Returns true for the four CRS kinds.
    pub fn is_crs(self) -> bool {
        matches!(
            self,
            Kind::GeodeticCrs | Kind::ProjectedCrs | Kind::VerticalCrs | Kind::CompoundCrs
        )
    }

    /// Returns true for the five coordinate operation kinds.
    pub fn is_operation(self) -> bool {
        matches!(
            self,
            Kind::Conversion
                | Kind::HelmertTransformation
                | Kind::GridTransformation
                | Kind::OtherTransformation
                | Kind::ConcatenatedOperation
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A keyed object together with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub kind: Kind,
    pub key: ObjectKey,
}

impl ObjectRef {
    pub fn new(kind: Kind, key: ObjectKey) -> Self {
        Self { kind, key }
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self {
            kind: Kind::UnitOfMeasure,
            key: ObjectKey::default(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.key)
    }
}

/// A 32-byte SHA-256 content digest.
pub type ContentDigest = [u8; 32];

/// Computes the SHA-256 digest of the given bytes.
pub fn content_digest(bytes: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// Formats a digest as lowercase hex.
pub fn format_digest(digest: &ContentDigest) -> String {
    let mut s = String::with_capacity(64);
    for byte in digest {
        s.push_str(&format!("{:02x}", byte));
    }
    s
}

/// Parses a digest from 64 hex characters.
pub fn parse_digest(s: &str) -> Option<ContentDigest> {
    if s.len() != 64 {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk).ok()?;
        out[i] = u8::from_str_radix(byte_str, 16).ok()?;
    }
    Some(out)
}
