//! A small, valid registry shared by unit tests.
//!
//! WGS 84 in 2D, 3D and geocentric form, ETRS89, RGF93 v1, Pseudo-Mercator,
//! EGM96 heights and their compound, plus the operations between them:
//!
//! - 3856: conversion binding 4326 to 3857
//! - 1149: ETRS89 to WGS 84, Europe, 1 m
//! - 1671: RGF93 v1 to WGS 84, France, 1 m
//! - 10084: WGS 84 to EGM96 height, grid based
//!
//! RGF93 prefers WGS 84 as hub datum, and WGS 84 has the alias `WGS84`.

use crate::model::{
    Axis, Batch, BatchBuilder, BoundingBox, CompoundCrs, ConversionMethod, CoordinateOperationMethod,
    CoordinateSystem, CsType, Ellipsoid, Extent, GeodeticCrs, GeodeticCrsType, GeodeticDatum,
    GridAlternative, GridFormat, GridMethod, GridTransformation, Kind, ObjectKey, Parameter,
    PrimeMeridian, ProjectedCrs, Record, UnitKind, UnitOfMeasure, VerticalCrs, VerticalDatum,
};
use crate::store::{EntityStore, Snapshot, Tables};

pub(crate) fn epsg(code: &str) -> ObjectKey {
    ObjectKey::new("EPSG", code)
}

fn earth() -> ObjectKey {
    ObjectKey::new("PROJ", "EARTH")
}

fn units() -> Vec<Record> {
    vec![
        UnitOfMeasure::new(epsg("9001"), "metre", UnitKind::Length, Some(1.0)).into(),
        UnitOfMeasure::new(epsg("9122"), "degree", UnitKind::Angle, Some(0.017453292519943295))
            .into(),
        UnitOfMeasure::new(epsg("9201"), "unity", UnitKind::Scale, Some(1.0)).into(),
        UnitOfMeasure::new(epsg("9202"), "parts per million", UnitKind::Scale, Some(1e-6)).into(),
        UnitOfMeasure::new(epsg("9104"), "arc-second", UnitKind::Angle, Some(4.84813681109536e-6))
            .into(),
        UnitOfMeasure::new(epsg("1029"), "year", UnitKind::Time, Some(31_556_925.445)).into(),
    ]
}

fn ellipsoid(code: &str, name: &str, inv_flattening: Option<f64>, semi_minor_axis: Option<f64>) -> Record {
    Ellipsoid {
        key: epsg(code),
        name: name.to_string(),
        celestial_body: earth(),
        semi_major_axis: 6_378_137.0,
        unit: epsg("9001"),
        inv_flattening,
        semi_minor_axis,
        deprecated: false,
    }
    .into()
}

fn leaves() -> Vec<Record> {
    vec![
        ellipsoid("7030", "WGS 84", Some(298.257223563), None),
        ellipsoid("7019", "GRS 1980", Some(298.257222101), None),
        ellipsoid("7059", "Popular Visualisation Sphere", None, Some(6_378_137.0)),
        PrimeMeridian {
            key: epsg("8901"),
            name: "Greenwich".to_string(),
            longitude: 0.0,
            unit: epsg("9122"),
            deprecated: false,
        }
        .into(),
        Extent::new(epsg("1262"), "World", BoundingBox::world()).into(),
        Extent::new(epsg("1298"), "Europe - ETRF by country", BoundingBox::new(32.88, 84.73, -16.1, 40.18))
            .into(),
        Extent::new(epsg("1096"), "France", BoundingBox::new(41.15, 51.56, -9.86, 10.38)).into(),
        Extent::new(
            epsg("3544"),
            "World between 85.06 S and 85.06 N",
            BoundingBox::new(-85.06, 85.06, -180.0, 180.0),
        )
        .into(),
    ]
}

fn geodetic_datum(code: &str, name: &str, ellipsoid: &str, area: &str) -> Record {
    GeodeticDatum {
        key: epsg(code),
        name: name.to_string(),
        ellipsoid: epsg(ellipsoid),
        prime_meridian: epsg("8901"),
        area: epsg(area),
        publication_date: None,
        frame_reference_epoch: None,
        deprecated: false,
    }
    .into()
}

fn datums() -> Vec<Record> {
    vec![
        geodetic_datum("6326", "World Geodetic System 1984", "7030", "1262"),
        geodetic_datum("6258", "European Terrestrial Reference System 1989", "7019", "1298"),
        geodetic_datum("6171", "Reseau Geodesique Francais 1993 v1", "7019", "1096"),
        VerticalDatum {
            key: epsg("5171"),
            name: "EGM96 geoid".to_string(),
            area: epsg("1262"),
            publication_date: None,
            frame_reference_epoch: None,
            deprecated: false,
        }
        .into(),
    ]
}

fn axis(code: &str, name: &str, abbreviation: &str, orientation: &str, cs: &str, order: u8, unit: &str) -> Record {
    Axis {
        key: epsg(code),
        name: name.to_string(),
        abbreviation: abbreviation.to_string(),
        orientation: orientation.to_string(),
        coordinate_system: epsg(cs),
        order,
        unit: epsg(unit),
    }
    .into()
}

fn coordinate_systems() -> Vec<Record> {
    vec![
        CoordinateSystem::new(epsg("6422"), CsType::Ellipsoidal, 2).into(),
        CoordinateSystem::new(epsg("6423"), CsType::Ellipsoidal, 3).into(),
        CoordinateSystem::new(epsg("6500"), CsType::Cartesian, 3).into(),
        CoordinateSystem::new(epsg("4499"), CsType::Cartesian, 2).into(),
        CoordinateSystem::new(epsg("6499"), CsType::Vertical, 1).into(),
        axis("106", "Geodetic latitude", "Lat", "north", "6422", 1, "9122"),
        axis("107", "Geodetic longitude", "Lon", "east", "6422", 2, "9122"),
        axis("108", "Geodetic latitude", "Lat", "north", "6423", 1, "9122"),
        axis("109", "Geodetic longitude", "Lon", "east", "6423", 2, "9122"),
        axis("110", "Ellipsoidal height", "h", "up", "6423", 3, "9001"),
        axis("115", "Geocentric X", "X", "geocentricX", "6500", 1, "9001"),
        axis("116", "Geocentric Y", "Y", "geocentricY", "6500", 2, "9001"),
        axis("117", "Geocentric Z", "Z", "geocentricZ", "6500", 3, "9001"),
        axis("1", "Easting", "X", "east", "4499", 1, "9001"),
        axis("2", "Northing", "Y", "north", "4499", 2, "9001"),
        axis("114", "Gravity-related height", "H", "up", "6499", 1, "9001"),
    ]
}

fn crs() -> Vec<Record> {
    use GeodeticCrsType::*;
    vec![
        GeodeticCrs::structured(epsg("4326"), "WGS 84", Geographic2D, epsg("6422"), epsg("6326"), epsg("1262")).into(),
        GeodeticCrs::structured(epsg("4979"), "WGS 84", Geographic3D, epsg("6423"), epsg("6326"), epsg("1262")).into(),
        GeodeticCrs::structured(epsg("4978"), "WGS 84", Geocentric, epsg("6500"), epsg("6326"), epsg("1262")).into(),
        GeodeticCrs::structured(epsg("4258"), "ETRS89", Geographic2D, epsg("6422"), epsg("6258"), epsg("1298")).into(),
        GeodeticCrs::structured(epsg("4171"), "RGF93 v1", Geographic2D, epsg("6422"), epsg("6171"), epsg("1096")).into(),
        VerticalCrs {
            key: epsg("5773"),
            name: "EGM96 height".to_string(),
            coordinate_system: epsg("6499"),
            datum: epsg("5171"),
            area: epsg("1262"),
            deprecated: false,
        }
        .into(),
        ProjectedCrs::structured(
            epsg("3857"),
            "WGS 84 / Pseudo-Mercator",
            epsg("4326"),
            epsg("3856"),
            epsg("4499"),
            epsg("3544"),
        )
        .into(),
        CompoundCrs {
            key: epsg("9707"),
            name: "WGS 84 + EGM96 height".to_string(),
            horizontal_crs: epsg("4326"),
            vertical_crs: epsg("5773"),
            area: epsg("1262"),
            deprecated: false,
        }
        .into(),
    ]
}

fn methods() -> Vec<Record> {
    let parameter = |code: &str, name: &str| -> Record {
        Parameter {
            key: epsg(code),
            name: name.to_string(),
            deprecated: false,
        }
        .into()
    };
    let method = |code: &str, name: &str| -> Record {
        CoordinateOperationMethod {
            key: epsg(code),
            name: name.to_string(),
            deprecated: false,
        }
        .into()
    };
    vec![
        ConversionMethod {
            key: epsg("1024"),
            name: "Popular Visualisation Pseudo Mercator".to_string(),
            deprecated: false,
        }
        .into(),
        method("9603", "Geocentric translations (geog2D domain)"),
        method("9606", "Position Vector transformation (geog2D domain)"),
        method("9661", "Geographic3D to GravityRelatedHeight (EGM)"),
        parameter("8801", "Latitude of natural origin"),
        parameter("8802", "Longitude of natural origin"),
        parameter("8806", "False easting"),
        parameter("8807", "False northing"),
    ]
}

/// Every fixture record except the seeded Earth body.
pub(crate) fn fixture_batch() -> Batch {
    BatchBuilder::new("fixture")
        .records(units())
        .records(leaves())
        .records(datums())
        .records(coordinate_systems())
        .records(crs())
        .records(methods())
        .conversion(
            epsg("3856"),
            "Popular Visualisation Pseudo-Mercator",
            epsg("1024"),
            epsg("3544"),
            |c| {
                c.param(epsg("8801"), 0.0, epsg("9122"))
                    .param(epsg("8802"), 0.0, epsg("9122"))
                    .param(epsg("8806"), 0.0, epsg("9001"))
                    .param(epsg("8807"), 0.0, epsg("9001"))
            },
        )
        .helmert(
            epsg("1149"),
            "ETRS89 to WGS 84 (1)",
            epsg("9606"),
            (epsg("4258"), epsg("4326")),
            epsg("1298"),
            |h| {
                h.translation([0.0, 0.0, 0.0], epsg("9001"))
                    .rotation([0.0, 0.0, 0.0], epsg("9104"))
                    .scale_difference(0.0, epsg("9202"))
                    .accuracy(1.0)
            },
        )
        .helmert(
            epsg("1671"),
            "RGF93 v1 to WGS 84 (1)",
            epsg("9603"),
            (epsg("4171"), epsg("4326")),
            epsg("1096"),
            |h| h.translation([0.0, 0.0, 0.0], epsg("9001")).accuracy(1.0),
        )
        .record(GridTransformation {
            key: epsg("10084"),
            name: "WGS 84 to EGM96 height (1)".to_string(),
            method: epsg("9661"),
            source_crs: epsg("4979"),
            target_crs: epsg("5773"),
            area: epsg("1262"),
            accuracy: Some(1.0),
            grid_name: "WW15MGH.GRD".to_string(),
            grid2_name: None,
            interpolation_crs: None,
            deprecated: false,
        })
        .record(GridAlternative {
            original_grid_name: "WW15MGH.GRD".to_string(),
            proj_grid_name: "us_nga_egm96_15.tif".to_string(),
            old_proj_grid_name: Some("egm96_15.gtx".to_string()),
            format: GridFormat::GTiff,
            method: GridMethod::VGridShift,
            inverse_direction: false,
            package_name: None,
            url: Some("https://cdn.proj.org/us_nga_egm96_15.tif".to_string()),
            direct_download: Some(true),
            open_license: Some(true),
            directory: None,
        })
        .hub(epsg("6171"), epsg("6326"))
        .alias(Kind::GeodeticCrs, epsg("4326"), "WGS84")
        .build()
}

/// A seeded store holding the fixture.
pub(crate) fn fixture_store() -> EntityStore {
    let mut store = EntityStore::default();
    if let Err(err) = store.load(fixture_batch()) {
        panic!("fixture does not validate: {err}");
    }
    store
}

pub(crate) fn fixture_tables() -> Tables {
    fixture_store().tables().clone()
}

pub(crate) fn fixture_snapshot() -> Snapshot {
    fixture_store().publish()
}
