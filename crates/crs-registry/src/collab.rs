//! Interfaces to the components that execute operations.
//!
//! The registry never evaluates projection formulas or reads grid files.
//! It assembles what an implementation needs (method, parameters with
//! their units, ellipsoid, distributable grid names) and hands it to a
//! [`ProjectionFactory`] or a [`GridCodec`] supplied by the caller.

use crate::error::{CollaboratorError, QueryError};
use crate::model::{
    GridAlternative, Kind, ObjectKey, ParameterValue, UnitKind, NULL_GRID_NAME,
};
use crate::store::Snapshot;
use crate::view::{CrsRef, OperationRef};

/// A map projection ready to convert coordinates.
///
/// Angles are in radians, projected coordinates in metres.
pub trait Projection: Send + Sync {
    /// Geographic `(lam, phi)` to projected `(x, y)`.
    fn forward(&self, lam: f64, phi: f64) -> Result<(f64, f64), CollaboratorError>;

    /// Projected `(x, y)` to geographic `(lam, phi)`.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), CollaboratorError>;
}

/// Builds projections from conversion requests.
pub trait ProjectionFactory {
    fn create(&self, request: &ConversionRequest) -> Result<Box<dyn Projection>, CollaboratorError>;
}

/// An opened correction grid.
pub trait GridModel: Send + Sync {
    /// Correction at a geographic position in degrees.
    fn shift(&self, lon: f64, lat: f64) -> Result<(f64, f64), CollaboratorError>;
}

/// Opens distributable grids.
pub trait GridCodec {
    fn open(&self, grid: &GridAlternative) -> Result<Box<dyn GridModel>, CollaboratorError>;
}

/// A parameter value together with what its unit means.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameter {
    pub parameter: ObjectKey,
    pub name: String,
    pub value: f64,
    pub unit: ObjectKey,
    pub unit_kind: UnitKind,
    /// Factor from `unit` to the SI unit of its kind, if fixed.
    pub conv_factor: Option<f64>,
}

impl RequestParameter {
    /// The value in metres, radians, unity or seconds.
    pub fn si_value(&self) -> Option<f64> {
        self.conv_factor.map(|f| self.value * f)
    }
}

/// Ellipsoid shape in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsoidShape {
    pub semi_major_axis: f64,
    /// Infinite for a sphere.
    pub inverse_flattening: f64,
}

/// Everything a [`ProjectionFactory`] needs to instantiate a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub conversion: ObjectKey,
    pub method: ObjectKey,
    pub method_name: String,
    pub parameters: Vec<RequestParameter>,
    /// Ellipsoid of the base CRS, when the request was built for a
    /// projected CRS.
    pub ellipsoid: Option<EllipsoidShape>,
}

impl ConversionRequest {
    /// Builds the request for a stored conversion.
    pub fn for_conversion(snapshot: &Snapshot, key: &ObjectKey) -> Result<Self, QueryError> {
        let tables = snapshot.tables();
        let conversion = tables.conversions.get(key).ok_or_else(|| QueryError::NotFound {
            kind: Kind::Conversion,
            key: key.clone(),
        })?;
        let method = tables
            .conversion_methods
            .get(&conversion.method)
            .ok_or_else(|| QueryError::NotFound {
                kind: Kind::ConversionMethod,
                key: conversion.method.clone(),
            })?;
        let parameters = conversion
            .params
            .iter()
            .map(|p| request_parameter(snapshot, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            conversion: key.clone(),
            method: method.key.clone(),
            method_name: method.name.clone(),
            parameters,
            ellipsoid: None,
        })
    }

    /// Builds the request for the conversion of a structured projected
    /// CRS, including the ellipsoid of its base CRS.
    pub fn for_projected_crs(snapshot: &Snapshot, key: &ObjectKey) -> Result<Self, QueryError> {
        let tables = snapshot.tables();
        let Some(CrsRef::Projected(crs)) = tables.crs(key) else {
            return Err(QueryError::NotFound {
                kind: Kind::ProjectedCrs,
                key: key.clone(),
            });
        };
        let conversion = crs.conversion.as_ref().ok_or_else(|| QueryError::NotFound {
            kind: Kind::Conversion,
            key: key.clone(),
        })?;
        let mut request = Self::for_conversion(snapshot, conversion)?;
        request.ellipsoid = crs
            .geodetic_crs
            .as_ref()
            .and_then(|base| ellipsoid_of(snapshot, base));
        Ok(request)
    }

    /// Looks a parameter up by name.
    pub fn parameter(&self, name: &str) -> Option<&RequestParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

fn request_parameter(snapshot: &Snapshot, value: &ParameterValue) -> Result<RequestParameter, QueryError> {
    let tables = snapshot.tables();
    let parameter = tables
        .parameters
        .get(&value.parameter)
        .ok_or_else(|| QueryError::NotFound {
            kind: Kind::Parameter,
            key: value.parameter.clone(),
        })?;
    let unit = tables.units.get(&value.unit).ok_or_else(|| QueryError::NotFound {
        kind: Kind::UnitOfMeasure,
        key: value.unit.clone(),
    })?;
    Ok(RequestParameter {
        parameter: parameter.key.clone(),
        name: parameter.name.clone(),
        value: value.value,
        unit: unit.key.clone(),
        unit_kind: unit.unit_kind,
        conv_factor: unit.conv_factor,
    })
}

fn ellipsoid_of(snapshot: &Snapshot, geodetic_crs: &ObjectKey) -> Option<EllipsoidShape> {
    let tables = snapshot.tables();
    let datum = tables.geodetic_crs.get(geodetic_crs)?.datum.as_ref()?;
    let ellipsoid = tables.ellipsoids.get(&tables.geodetic_datums.get(datum)?.ellipsoid)?;
    let factor = tables.units.get(&ellipsoid.unit)?.conv_factor?;
    Some(EllipsoidShape {
        semi_major_axis: ellipsoid.semi_major_axis * factor,
        inverse_flattening: ellipsoid.inverse_flattening()?,
    })
}

/// Instantiates the projection of a projected CRS.
pub fn create_projection(
    snapshot: &Snapshot,
    factory: &dyn ProjectionFactory,
    projected_crs: &ObjectKey,
) -> Result<Box<dyn Projection>, CollaboratorError> {
    let request = ConversionRequest::for_projected_crs(snapshot, projected_crs)?;
    factory.create(&request)
}

/// Opens every grid a grid transformation needs, in the order the
/// transformation names them. The `null` grid needs no file and is skipped.
pub fn open_grids(
    snapshot: &Snapshot,
    codec: &dyn GridCodec,
    operation: &ObjectKey,
) -> Result<Vec<Box<dyn GridModel>>, CollaboratorError> {
    let Some(OperationRef::Grid(op)) = snapshot.tables().operation(operation) else {
        return Err(QueryError::NotFound {
            kind: Kind::GridTransformation,
            key: operation.clone(),
        }
        .into());
    };
    op.grid_names()
        .filter(|name| *name != NULL_GRID_NAME)
        .map(|name| {
            let grid = snapshot
                .lookup_grid(name)
                .ok_or_else(|| CollaboratorError::GridUnavailable(name.to_string()))?;
            codec.open(grid)
        })
        .collect()
}
