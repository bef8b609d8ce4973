//! Geodetic and vertical datums.

use crate::model::ObjectKey;

/// A geodetic reference frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeodeticDatum {
    pub key: ObjectKey,
    pub name: String,
    pub ellipsoid: ObjectKey,
    pub prime_meridian: ObjectKey,
    pub area: ObjectKey,
    /// ISO 8601 date, informational.
    pub publication_date: Option<String>,
    /// Frame reference epoch of a dynamic datum, as a decimal year.
    pub frame_reference_epoch: Option<f64>,
    pub deprecated: bool,
}

impl GeodeticDatum {
    /// Returns true for dynamic (time-dependent) reference frames.
    pub fn is_dynamic(&self) -> bool {
        self.frame_reference_epoch.is_some()
    }
}

/// A vertical reference frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalDatum {
    pub key: ObjectKey,
    pub name: String,
    pub area: ObjectKey,
    pub publication_date: Option<String>,
    pub frame_reference_epoch: Option<f64>,
    pub deprecated: bool,
}
