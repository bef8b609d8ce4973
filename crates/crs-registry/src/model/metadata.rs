//! Link and distribution records: aliases, version history, grid
//! distribution metadata and resolver hints.

use serde::Deserialize;

use crate::model::{Kind, ObjectKey, ObjectRef, ANY_AUTHORITY};

/// Grid name used by transformations that need no grid.
pub const NULL_GRID_NAME: &str = "null";

/// An alternate name for a keyed object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasName {
    pub object: ObjectRef,
    pub alt_name: String,
    /// Where the alias comes from (e.g. `ESRI`, `OGC`).
    pub source: Option<String>,
}

/// `superseded` was replaced by `replacement` (both of `kind`).
#[derive(Debug, Clone, PartialEq)]
pub struct Supersession {
    pub kind: Kind,
    pub superseded: ObjectKey,
    pub replacement: ObjectKey,
    pub source: Option<String>,
    /// True when both operations connect the same pair of CRSs.
    pub same_source_target_crs: bool,
}

impl Supersession {
    pub fn superseded_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind, self.superseded.clone())
    }

    pub fn replacement_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind, self.replacement.clone())
    }
}

/// `deprecated` is retired in favour of `replacement` (both of `kind`).
#[derive(Debug, Clone, PartialEq)]
pub struct Deprecation {
    pub kind: Kind,
    pub deprecated: ObjectKey,
    pub replacement: ObjectKey,
    pub source: Option<String>,
}

impl Deprecation {
    pub fn deprecated_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind, self.deprecated.clone())
    }

    pub fn replacement_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind, self.replacement.clone())
    }
}

/// A downloadable bundle of grid files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridPackage {
    pub package_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub direct_download: Option<bool>,
    pub open_license: Option<bool>,
}

/// File format of a distributable grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GridFormat {
    CTable2 = 1,
    NTv1 = 2,
    #[default]
    NTv2 = 3,
    Gtx = 4,
    GTiff = 5,
    Json = 6,
}

impl GridFormat {
    /// Creates a GridFormat from its wire representation.
    pub fn from_u8(v: u8) -> Option<GridFormat> {
        match v {
            1 => Some(GridFormat::CTable2),
            2 => Some(GridFormat::NTv1),
            3 => Some(GridFormat::NTv2),
            4 => Some(GridFormat::Gtx),
            5 => Some(GridFormat::GTiff),
            6 => Some(GridFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GridFormat::CTable2 => "CTable2",
            GridFormat::NTv1 => "NTv1",
            GridFormat::NTv2 => "NTv2",
            GridFormat::Gtx => "GTX",
            GridFormat::GTiff => "GTiff",
            GridFormat::Json => "JSON",
        }
    }

    /// Grid methods this format can carry.
    pub fn compatible_methods(self) -> &'static [GridMethod] {
        match self {
            GridFormat::CTable2 | GridFormat::NTv1 | GridFormat::NTv2 => &[GridMethod::HGridShift],
            GridFormat::Gtx => &[GridMethod::VGridShift],
            GridFormat::GTiff => &[
                GridMethod::HGridShift,
                GridMethod::VGridShift,
                GridMethod::GeocentricShift,
                GridMethod::VelocityGrid,
            ],
            GridFormat::Json => &[GridMethod::TinShift],
        }
    }
}

/// PROJ operation used to apply a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GridMethod {
    #[default]
    HGridShift = 1,
    VGridShift = 2,
    GeocentricShift = 3,
    VelocityGrid = 4,
    TinShift = 5,
}

impl GridMethod {
    /// Creates a GridMethod from its wire representation.
    pub fn from_u8(v: u8) -> Option<GridMethod> {
        match v {
            1 => Some(GridMethod::HGridShift),
            2 => Some(GridMethod::VGridShift),
            3 => Some(GridMethod::GeocentricShift),
            4 => Some(GridMethod::VelocityGrid),
            5 => Some(GridMethod::TinShift),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GridMethod::HGridShift => "hgridshift",
            GridMethod::VGridShift => "vgridshift",
            GridMethod::GeocentricShift => "geocentricshift",
            GridMethod::VelocityGrid => "velocity_grid",
            GridMethod::TinShift => "tinshift",
        }
    }
}

/// Maps an authority's native grid name to a locally distributable grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridAlternative {
    pub original_grid_name: String,
    pub proj_grid_name: String,
    pub old_proj_grid_name: Option<String>,
    pub format: GridFormat,
    pub method: GridMethod,
    /// The distributed grid must be applied in reverse.
    pub inverse_direction: bool,
    pub package_name: Option<String>,
    pub url: Option<String>,
    pub direct_download: Option<bool>,
    pub open_license: Option<bool>,
    pub directory: Option<String>,
}

/// Resolver hint: route transformations from `source_datum` through
/// `hub_datum` when no direct operation exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferredHub {
    pub source_datum: ObjectKey,
    pub hub_datum: ObjectKey,
}

/// Ordered authority list used to rank operations between CRSs of the given
/// authorities. Either side may be [`ANY_AUTHORITY`](crate::model::ANY_AUTHORITY).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorityPreference {
    pub source_authority: String,
    pub target_authority: String,
    pub allowed_authorities: Vec<String>,
}

impl AuthorityPreference {
    pub fn new(
        source_authority: impl Into<String>,
        target_authority: impl Into<String>,
        allowed_authorities: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            source_authority: source_authority.into(),
            target_authority: target_authority.into(),
            allowed_authorities: allowed_authorities.into_iter().map(Into::into).collect(),
        }
    }
}

/// Finds the preference for an authority pair in `prefs`.
///
/// Lookup order is `(source, target)`, `(source, any)`, `(any, target)`,
/// `(any, any)`.
pub fn find_preference<'a>(
    prefs: &'a [AuthorityPreference],
    source: &str,
    target: &str,
) -> Option<&'a [String]> {
    [
        (source, target),
        (source, ANY_AUTHORITY),
        (ANY_AUTHORITY, target),
        (ANY_AUTHORITY, ANY_AUTHORITY),
    ]
    .into_iter()
    .find_map(|(s, t)| {
        prefs
            .iter()
            .find(|p| p.source_authority == s && p.target_authority == t)
            .map(|p| p.allowed_authorities.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preference_wildcards() {
        let prefs = vec![
            AuthorityPreference::new("any", "any", ["EPSG"]),
            AuthorityPreference::new("IGNF", "any", ["IGNF", "EPSG"]),
            AuthorityPreference::new("IGNF", "EPSG", ["EPSG", "IGNF"]),
        ];
        assert_eq!(find_preference(&prefs, "IGNF", "EPSG").unwrap(), ["EPSG", "IGNF"]);
        assert_eq!(find_preference(&prefs, "IGNF", "ESRI").unwrap(), ["IGNF", "EPSG"]);
        assert_eq!(find_preference(&prefs, "ESRI", "ESRI").unwrap(), ["EPSG"]);
        assert_eq!(find_preference(&[], "EPSG", "EPSG"), None);
    }

    #[test]
    fn test_format_method_pairing() {
        for format in [GridFormat::CTable2, GridFormat::NTv1, GridFormat::NTv2] {
            assert_eq!(format.compatible_methods(), &[GridMethod::HGridShift]);
        }
        assert_eq!(GridFormat::Gtx.compatible_methods(), &[GridMethod::VGridShift]);
        assert!(GridFormat::GTiff.compatible_methods().contains(&GridMethod::VGridShift));
        assert!(!GridFormat::GTiff.compatible_methods().contains(&GridMethod::TinShift));
    }

    #[test]
    fn test_wire_values() {
        for v in 1..=6u8 {
            assert_eq!(GridFormat::from_u8(v).map(|f| f as u8), Some(v));
        }
        for v in 1..=5u8 {
            assert_eq!(GridMethod::from_u8(v).map(|m| m as u8), Some(v));
        }
        assert!(GridFormat::from_u8(7).is_none());
        assert!(GridMethod::from_u8(0).is_none());
    }
}
