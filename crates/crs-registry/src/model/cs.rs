//! Coordinate systems and their axes.

use crate::model::ObjectKey;

/// Coordinate system type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CsType {
    #[default]
    Cartesian = 1,
    Vertical = 2,
    Ellipsoidal = 3,
    Spherical = 4,
}

impl CsType {
    /// Creates a CsType from its wire representation.
    pub fn from_u8(v: u8) -> Option<CsType> {
        match v {
            1 => Some(CsType::Cartesian),
            2 => Some(CsType::Vertical),
            3 => Some(CsType::Ellipsoidal),
            4 => Some(CsType::Spherical),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CsType::Cartesian => "Cartesian",
            CsType::Vertical => "vertical",
            CsType::Ellipsoidal => "ellipsoidal",
            CsType::Spherical => "spherical",
        }
    }

    /// Dimensions a system of this type may have.
    pub fn allowed_dimensions(self) -> &'static [u8] {
        match self {
            CsType::Vertical => &[1],
            CsType::Cartesian | CsType::Ellipsoidal | CsType::Spherical => &[2, 3],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateSystem {
    pub key: ObjectKey,
    pub cs_type: CsType,
    pub dimension: u8,
}

impl CoordinateSystem {
    pub fn new(key: ObjectKey, cs_type: CsType, dimension: u8) -> Self {
        Self {
            key,
            cs_type,
            dimension,
        }
    }
}

/// One axis of a coordinate system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axis {
    pub key: ObjectKey,
    pub name: String,
    pub abbreviation: String,
    /// e.g. `north`, `east`, `up`.
    pub orientation: String,
    pub coordinate_system: ObjectKey,
    /// 1-based position within the coordinate system.
    pub order: u8,
    pub unit: ObjectKey,
}
