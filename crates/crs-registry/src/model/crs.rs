//! Coordinate reference systems.
//!
//! Geodetic and projected CRSs are either structured (every component is a
//! reference to another registry object) or opaque (a text definition the
//! registry does not interpret). The validator enforces that exactly one of
//! the two forms is used.

use crate::model::ObjectKey;

/// Subtype of a geodetic CRS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeodeticCrsType {
    #[default]
    Geographic2D = 1,
    Geographic3D = 2,
    Geocentric = 3,
}

impl GeodeticCrsType {
    /// Creates a GeodeticCrsType from its wire representation.
    pub fn from_u8(v: u8) -> Option<GeodeticCrsType> {
        match v {
            1 => Some(GeodeticCrsType::Geographic2D),
            2 => Some(GeodeticCrsType::Geographic3D),
            3 => Some(GeodeticCrsType::Geocentric),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeodeticCrsType::Geographic2D => "geographic 2D",
            GeodeticCrsType::Geographic3D => "geographic 3D",
            GeodeticCrsType::Geocentric => "geocentric",
        }
    }

    pub fn is_geographic(self) -> bool {
        !matches!(self, GeodeticCrsType::Geocentric)
    }
}

/// Semantic type tag shared by all CRS kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrsType {
    Geographic2D,
    Geographic3D,
    Geocentric,
    Projected,
    Vertical,
    Compound,
}

impl From<GeodeticCrsType> for CrsType {
    fn from(t: GeodeticCrsType) -> Self {
        match t {
            GeodeticCrsType::Geographic2D => CrsType::Geographic2D,
            GeodeticCrsType::Geographic3D => CrsType::Geographic3D,
            GeodeticCrsType::Geocentric => CrsType::Geocentric,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeodeticCrs {
    pub key: ObjectKey,
    pub name: String,
    pub crs_type: GeodeticCrsType,
    pub coordinate_system: Option<ObjectKey>,
    pub datum: Option<ObjectKey>,
    pub area: Option<ObjectKey>,
    pub text_definition: Option<String>,
    pub deprecated: bool,
}

impl GeodeticCrs {
    /// Creates a structured geodetic CRS.
    pub fn structured(
        key: ObjectKey,
        name: impl Into<String>,
        crs_type: GeodeticCrsType,
        coordinate_system: ObjectKey,
        datum: ObjectKey,
        area: ObjectKey,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            crs_type,
            coordinate_system: Some(coordinate_system),
            datum: Some(datum),
            area: Some(area),
            text_definition: None,
            deprecated: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedCrs {
    pub key: ObjectKey,
    pub name: String,
    /// Base geographic CRS. Optional for text-defined CRSs.
    pub geodetic_crs: Option<ObjectKey>,
    pub conversion: Option<ObjectKey>,
    pub coordinate_system: Option<ObjectKey>,
    pub area: Option<ObjectKey>,
    pub text_definition: Option<String>,
    pub deprecated: bool,
}

impl ProjectedCrs {
    /// Creates a structured projected CRS.
    pub fn structured(
        key: ObjectKey,
        name: impl Into<String>,
        geodetic_crs: ObjectKey,
        conversion: ObjectKey,
        coordinate_system: ObjectKey,
        area: ObjectKey,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            geodetic_crs: Some(geodetic_crs),
            conversion: Some(conversion),
            coordinate_system: Some(coordinate_system),
            area: Some(area),
            text_definition: None,
            deprecated: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalCrs {
    pub key: ObjectKey,
    pub name: String,
    pub coordinate_system: ObjectKey,
    pub datum: ObjectKey,
    pub area: ObjectKey,
    pub deprecated: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundCrs {
    pub key: ObjectKey,
    pub name: String,
    /// Geographic 2D or projected CRS.
    pub horizontal_crs: ObjectKey,
    pub vertical_crs: ObjectKey,
    pub area: ObjectKey,
    pub deprecated: bool,
}
