//! Coordinate operations: conversions, transformations and concatenations.
//!
//! Conversions carry no source/target CRS of their own; they are bound to a
//! pair of CRSs by the projected CRSs that use them (base CRS to projected
//! CRS). Transformations and concatenated operations name both ends.

use lazy_static::lazy_static;
use rustc_hash::FxHashSet;

use crate::model::ObjectKey;

/// Maximum number of parameters on a conversion or other transformation.
pub const MAX_PARAMETERS: usize = 7;

/// Minimum number of steps in a concatenated operation.
pub const MIN_STEPS: usize = 2;

/// Maximum number of steps in a concatenated operation.
pub const MAX_STEPS: usize = 3;

/// Method name marking an operation whose definition is an opaque PROJ string.
pub const PROJ_BASED_METHOD: &str = "PROJ-based operation method";

/// Method name marking an operation whose definition is opaque WKT.
pub const WKT_BASED_METHOD: &str = "WKT-based operation method";

lazy_static! {
    /// Names accepted for conversion methods.
    static ref CONVERSION_METHOD_NAMES: FxHashSet<&'static str> = [
        "Albers Equal Area",
        "American Polyconic",
        "Azimuthal Equidistant",
        "Bonne",
        "Cassini-Soldner",
        "Equidistant Cylindrical",
        "Equidistant Cylindrical (Spherical)",
        "Geographic/geocentric conversions",
        "Geographic3D to 2D conversion",
        "Hotine Oblique Mercator (variant A)",
        "Hotine Oblique Mercator (variant B)",
        "Krovak",
        "Lambert Azimuthal Equal Area",
        "Lambert Azimuthal Equal Area (Spherical)",
        "Lambert Conic Conformal (1SP)",
        "Lambert Conic Conformal (2SP)",
        "Lambert Conic Conformal (2SP Belgium)",
        "Lambert Cylindrical Equal Area",
        "Mercator (variant A)",
        "Mercator (variant B)",
        "Mercator (variant C)",
        "Mercator (Spherical)",
        "Miller Cylindrical",
        "Mollweide",
        "Nell-Hammer",
        "New Zealand Map Grid",
        "Oblique Stereographic",
        "Orthographic",
        "Polar Stereographic (variant A)",
        "Polar Stereographic (variant B)",
        "Polar Stereographic (variant C)",
        "Popular Visualisation Pseudo Mercator",
        "Robinson",
        "Sinusoidal",
        "Transverse Mercator",
        "Transverse Mercator (South Orientated)",
        "Van Der Grinten",
        "Vertical Perspective",
        PROJ_BASED_METHOD,
        WKT_BASED_METHOD,
    ]
    .into_iter()
    .collect();
}

/// Returns true if `name` is a registered conversion method name.
pub fn is_registered_conversion_method(name: &str) -> bool {
    CONVERSION_METHOD_NAMES.contains(name)
}

/// Returns true if the method name marks an opaque definition.
pub fn is_opaque_method(name: &str) -> bool {
    name == PROJ_BASED_METHOD || name == WKT_BASED_METHOD
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionMethod {
    pub key: ObjectKey,
    pub name: String,
    pub deprecated: bool,
}

/// Method shared by Helmert, grid and other transformations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateOperationMethod {
    pub key: ObjectKey,
    pub name: String,
    pub deprecated: bool,
}

/// An operation parameter (e.g. "False easting").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    pub key: ObjectKey,
    pub name: String,
    pub deprecated: bool,
}

/// A parameter value with its unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValue {
    pub parameter: ObjectKey,
    pub value: f64,
    pub unit: ObjectKey,
}

impl ParameterValue {
    pub fn new(parameter: ObjectKey, value: f64, unit: ObjectKey) -> Self {
        Self {
            parameter,
            value,
            unit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    pub key: ObjectKey,
    pub name: String,
    pub method: ObjectKey,
    pub params: Vec<ParameterValue>,
    pub area: ObjectKey,
    pub deprecated: bool,
}

/// A numeric value (scalar or vector) tagged with its unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quantity<T> {
    pub value: T,
    pub unit: ObjectKey,
}

impl<T> Quantity<T> {
    pub fn new(value: T, unit: ObjectKey) -> Self {
        Self { value, unit }
    }
}

/// A 3- or 7- (or 15-) parameter Helmert transformation between two
/// geodetic CRSs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HelmertTransformation {
    pub key: ObjectKey,
    pub name: String,
    pub method: ObjectKey,
    pub source_crs: ObjectKey,
    pub target_crs: ObjectKey,
    pub area: ObjectKey,
    /// Accuracy in metres, `None` if unknown.
    pub accuracy: Option<f64>,
    pub translation: Quantity<[f64; 3]>,
    pub rotation: Option<Quantity<[f64; 3]>>,
    pub scale_difference: Option<Quantity<f64>>,
    pub rate_translation: Option<Quantity<[f64; 3]>>,
    pub rate_rotation: Option<Quantity<[f64; 3]>>,
    pub rate_scale_difference: Option<Quantity<f64>>,
    pub epoch: Option<Quantity<f64>>,
    pub pivot: Option<Quantity<[f64; 3]>>,
    pub deprecated: bool,
}

impl HelmertTransformation {
    /// Number of defining parameters (3, 7 or 15, plus pivot/epoch extras).
    pub fn parameter_count(&self) -> usize {
        let mut n = 3;
        if self.rotation.is_some() {
            n += 3;
        }
        if self.scale_difference.is_some() {
            n += 1;
        }
        if self.rate_translation.is_some() {
            n += 3;
        }
        if self.rate_rotation.is_some() {
            n += 3;
        }
        if self.rate_scale_difference.is_some() {
            n += 1;
        }
        if self.epoch.is_some() {
            n += 1;
        }
        if self.pivot.is_some() {
            n += 3;
        }
        n
    }
}

/// A transformation whose corrections come from one or two grid files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridTransformation {
    pub key: ObjectKey,
    pub name: String,
    pub method: ObjectKey,
    pub source_crs: ObjectKey,
    pub target_crs: ObjectKey,
    pub area: ObjectKey,
    pub accuracy: Option<f64>,
    /// Authority's native grid file name.
    pub grid_name: String,
    pub grid2_name: Option<String>,
    pub interpolation_crs: Option<ObjectKey>,
    pub deprecated: bool,
}

impl GridTransformation {
    /// Grid file names referenced by this transformation.
    pub fn grid_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.grid_name.as_str()).chain(self.grid2_name.as_deref())
    }
}

/// Any other parameterised transformation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OtherTransformation {
    pub key: ObjectKey,
    pub name: String,
    pub method: ObjectKey,
    pub source_crs: ObjectKey,
    pub target_crs: ObjectKey,
    pub area: ObjectKey,
    pub accuracy: Option<f64>,
    pub params: Vec<ParameterValue>,
    pub deprecated: bool,
}

/// An ordered chain of two or three non-concatenated operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcatenatedOperation {
    pub key: ObjectKey,
    pub name: String,
    pub source_crs: ObjectKey,
    pub target_crs: ObjectKey,
    pub area: ObjectKey,
    pub accuracy: Option<f64>,
    pub steps: Vec<ObjectKey>,
    pub deprecated: bool,
}
