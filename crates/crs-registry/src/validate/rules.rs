//! Named validation rules, grouped per record kind.
//!
//! Each rule is a pure function of the candidate record and the store
//! contents. Rules that only read the record itself or records of a lower
//! load rank run immediately; rules whose targets may be forward references
//! within the same batch are deferred to the second load phase.

use crate::model::{
    AliasName, AuthorityPreference, Axis, CelestialBody, CompoundCrs, ConcatenatedOperation,
    Conversion, ConversionMethod, CoordinateOperationMethod, CoordinateSystem, CrsType, CsType,
    Deprecation, Ellipsoid, Extent, GeodeticCrs, GeodeticCrsType, GeodeticDatum,
    GridAlternative, GridPackage, GridTransformation, HelmertTransformation, Kind, ObjectKey,
    OtherTransformation, Parameter, ParameterValue, PreferredHub, PrimeMeridian, ProjectedCrs,
    Quantity, Supersession, UnitKind, UnitOfMeasure, VerticalCrs, VerticalDatum,
    is_opaque_method, is_registered_conversion_method, MAX_PARAMETERS, MAX_STEPS, MIN_STEPS,
    NULL_GRID_NAME,
};
use crate::validate::{Phase, Rule, RuleContext};
use crate::view::CatalogObject;

type Outcome = Result<(), String>;

const fn immediate<T>(name: &'static str, check: fn(&T, &RuleContext<'_>) -> Outcome) -> Rule<T> {
    Rule {
        name,
        phase: Phase::Immediate,
        check,
    }
}

const fn deferred<T>(name: &'static str, check: fn(&T, &RuleContext<'_>) -> Outcome) -> Rule<T> {
    Rule {
        name,
        phase: Phase::Deferred,
        check,
    }
}

// =============================================================================
// SHARED RULES
// =============================================================================

fn identity_complete<T: CatalogObject>(r: &T, _: &RuleContext<'_>) -> Outcome {
    if r.key().is_complete() {
        Ok(())
    } else {
        Err("auth_name and code must not be empty".to_string())
    }
}

fn name_min_length<T: CatalogObject>(r: &T, _: &RuleContext<'_>) -> Outcome {
    match r.name() {
        Some(name) if name.chars().count() < 2 => {
            Err(format!("name '{name}' must be at least 2 characters"))
        }
        _ => Ok(()),
    }
}

fn key_unique<T: CatalogObject>(r: &T, ctx: &RuleContext<'_>) -> Outcome {
    if ctx.tables.contains(r.kind(), r.key()) {
        Err(format!("duplicate key {}", r.key()))
    } else {
        Ok(())
    }
}

fn crs_namespace_unique<T: CatalogObject>(r: &T, ctx: &RuleContext<'_>) -> Outcome {
    match ctx.tables.crs_namespace_conflict(r.key(), r.kind()) {
        Some(other) => Err(format!("code {} is already used by a {other}", r.key())),
        None => Ok(()),
    }
}

fn operation_namespace_unique<T: CatalogObject>(r: &T, ctx: &RuleContext<'_>) -> Outcome {
    match ctx.tables.operation_namespace_conflict(r.key(), r.kind()) {
        Some(other) => Err(format!("code {} is already used by a {other}", r.key())),
        None => Ok(()),
    }
}

fn area_exists<T: CatalogObject>(r: &T, ctx: &RuleContext<'_>) -> Outcome {
    match r.area() {
        Some(area) => ctx.require(Kind::Extent, area, "extent"),
        None => Ok(()),
    }
}

fn area_not_deprecated<T: CatalogObject>(r: &T, ctx: &RuleContext<'_>) -> Outcome {
    match r.area() {
        Some(area) => ctx.require_not_deprecated(r, Kind::Extent, area, "extent"),
        None => Ok(()),
    }
}

fn check_accuracy(accuracy: Option<f64>) -> Outcome {
    match accuracy {
        Some(a) if !(a >= 0.0) || a.is_infinite() => {
            Err(format!("accuracy {a} must be a finite value >= 0"))
        }
        _ => Ok(()),
    }
}

fn check_unit_kind(
    ctx: &RuleContext<'_>,
    unit: &ObjectKey,
    expected: UnitKind,
    role: &str,
) -> Outcome {
    match ctx.tables.units.get(unit) {
        None => Err(format!("{role} unit {unit} does not exist")),
        Some(u) if u.unit_kind != expected => Err(format!(
            "{role} unit {unit} must be of type {}, not {}",
            expected.as_str(),
            u.unit_kind.as_str()
        )),
        Some(_) => Ok(()),
    }
}

fn check_parameter_values(ctx: &RuleContext<'_>, params: &[ParameterValue]) -> Outcome {
    if params.len() > MAX_PARAMETERS {
        return Err(format!(
            "{} parameter values given, at most {MAX_PARAMETERS} allowed",
            params.len()
        ));
    }
    for (i, p) in params.iter().enumerate() {
        let slot = i + 1;
        if !ctx.tables.parameters.contains_key(&p.parameter) {
            return Err(format!("param{slot} parameter {} does not exist", p.parameter));
        }
        if params[..i].iter().any(|q| q.parameter == p.parameter) {
            return Err(format!("param{slot} repeats parameter {}", p.parameter));
        }
        if !p.value.is_finite() {
            return Err(format!("param{slot} value must be finite"));
        }
        if !ctx.tables.units.contains_key(&p.unit) {
            return Err(format!("param{slot} unit {} does not exist", p.unit));
        }
    }
    Ok(())
}

fn check_crs_exists(ctx: &RuleContext<'_>, key: &ObjectKey, role: &str) -> Outcome {
    if ctx.tables.crs(key).is_some() {
        Ok(())
    } else {
        Err(format!("{role} {key} does not exist"))
    }
}

fn check_geodetic_crs_exists(ctx: &RuleContext<'_>, key: &ObjectKey, role: &str) -> Outcome {
    if ctx.tables.geodetic_crs.contains_key(key) {
        Ok(())
    } else {
        Err(format!("{role} {key} must be an existing geodetic_crs"))
    }
}

fn check_crs_not_deprecated<T: CatalogObject>(
    ctx: &RuleContext<'_>,
    owner: &T,
    key: &ObjectKey,
    role: &str,
) -> Outcome {
    match ctx.tables.crs(key) {
        Some(crs) => ctx.require_not_deprecated(owner, crs.kind(), key, role),
        None => Ok(()),
    }
}

// =============================================================================
// UNITS, BODIES, ELLIPSOIDS, EXTENTS, PRIME MERIDIANS
// =============================================================================

fn unit_conv_factor_positive(r: &UnitOfMeasure, _: &RuleContext<'_>) -> Outcome {
    match r.conv_factor {
        Some(f) if !(f > 0.0) || f.is_infinite() => {
            Err(format!("conv_factor {f} must be a finite value > 0"))
        }
        _ => Ok(()),
    }
}

pub(crate) const UNIT_OF_MEASURE: &[Rule<UnitOfMeasure>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("unit_conv_factor_positive", unit_conv_factor_positive),
];

fn body_semi_major_axis_positive(r: &CelestialBody, _: &RuleContext<'_>) -> Outcome {
    if r.semi_major_axis > 0.0 && r.semi_major_axis.is_finite() {
        Ok(())
    } else {
        Err("semi_major_axis must be > 0".to_string())
    }
}

pub(crate) const CELESTIAL_BODY: &[Rule<CelestialBody>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("celestial_body_semi_major_axis_positive", body_semi_major_axis_positive),
];

fn ellipsoid_celestial_body_exists(r: &Ellipsoid, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::CelestialBody, &r.celestial_body, "celestial_body")
}

fn ellipsoid_semi_major_axis_positive(r: &Ellipsoid, _: &RuleContext<'_>) -> Outcome {
    if r.semi_major_axis > 0.0 && r.semi_major_axis.is_finite() {
        Ok(())
    } else {
        Err("semi_major_axis must be > 0".to_string())
    }
}

fn ellipsoid_shape_exclusive(r: &Ellipsoid, _: &RuleContext<'_>) -> Outcome {
    if r.inv_flattening.is_some() != r.semi_minor_axis.is_some() {
        Ok(())
    } else {
        Err("exactly one of inv_flattening or semi_minor_axis must be set".to_string())
    }
}

fn ellipsoid_shape_values(r: &Ellipsoid, _: &RuleContext<'_>) -> Outcome {
    if let Some(rf) = r.inv_flattening {
        if rf == 0.0 || !rf.is_finite() {
            return Err("inv_flattening must be a finite non-zero value".to_string());
        }
    }
    if let Some(b) = r.semi_minor_axis {
        if !(b > 0.0) || b > r.semi_major_axis {
            return Err("semi_minor_axis must be > 0 and <= semi_major_axis".to_string());
        }
    }
    Ok(())
}

fn ellipsoid_unit_is_length(r: &Ellipsoid, ctx: &RuleContext<'_>) -> Outcome {
    check_unit_kind(ctx, &r.unit, UnitKind::Length, "ellipsoid")
}

pub(crate) const ELLIPSOID: &[Rule<Ellipsoid>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("ellipsoid_celestial_body_exists", ellipsoid_celestial_body_exists),
    immediate("ellipsoid_semi_major_axis_positive", ellipsoid_semi_major_axis_positive),
    immediate("ellipsoid_shape_exclusive", ellipsoid_shape_exclusive),
    immediate("ellipsoid_shape_values", ellipsoid_shape_values),
    immediate("ellipsoid_unit_is_length", ellipsoid_unit_is_length),
];

fn extent_latitude_range(r: &Extent, _: &RuleContext<'_>) -> Outcome {
    let b = &r.bbox;
    if (-90.0..=90.0).contains(&b.south) && (-90.0..=90.0).contains(&b.north) {
        Ok(())
    } else {
        Err("south_lat and north_lat must be in [-90,90]".to_string())
    }
}

fn extent_longitude_range(r: &Extent, _: &RuleContext<'_>) -> Outcome {
    let b = &r.bbox;
    if (-180.0..=180.0).contains(&b.west) && (-180.0..=180.0).contains(&b.east) {
        Ok(())
    } else {
        Err("west_lon and east_lon must be in [-180,180]".to_string())
    }
}

fn extent_south_le_north(r: &Extent, _: &RuleContext<'_>) -> Outcome {
    if r.bbox.south <= r.bbox.north {
        Ok(())
    } else {
        Err(format!(
            "south_lat ({}) must be <= north_lat ({})",
            r.bbox.south, r.bbox.north
        ))
    }
}

fn extent_antimeridian_wrap(r: &Extent, _: &RuleContext<'_>) -> Outcome {
    let b = &r.bbox;
    if b.west <= b.east || b.east + 360.0 - b.west <= 200.0 {
        Ok(())
    } else {
        Err(format!(
            "west_lon ({}) > east_lon ({}) spans more than 200 degrees",
            b.west, b.east
        ))
    }
}

pub(crate) const EXTENT: &[Rule<Extent>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("extent_latitude_range", extent_latitude_range),
    immediate("extent_longitude_range", extent_longitude_range),
    immediate("extent_south_le_north", extent_south_le_north),
    immediate("extent_antimeridian_wrap", extent_antimeridian_wrap),
];

fn prime_meridian_longitude_range(r: &PrimeMeridian, _: &RuleContext<'_>) -> Outcome {
    if (-180.0..=180.0).contains(&r.longitude) {
        Ok(())
    } else {
        Err("longitude must be in [-180,180]".to_string())
    }
}

fn prime_meridian_unit_is_angle(r: &PrimeMeridian, ctx: &RuleContext<'_>) -> Outcome {
    check_unit_kind(ctx, &r.unit, UnitKind::Angle, "prime_meridian")
}

pub(crate) const PRIME_MERIDIAN: &[Rule<PrimeMeridian>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("prime_meridian_longitude_range", prime_meridian_longitude_range),
    immediate("prime_meridian_unit_is_angle", prime_meridian_unit_is_angle),
];

// =============================================================================
// DATUMS, COORDINATE SYSTEMS, AXES
// =============================================================================

fn check_frame_epoch(epoch: Option<f64>) -> Outcome {
    match epoch {
        Some(e) if !e.is_finite() => Err("frame_reference_epoch must be finite".to_string()),
        _ => Ok(()),
    }
}

fn geodetic_datum_references_exist(r: &GeodeticDatum, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::Ellipsoid, &r.ellipsoid, "ellipsoid")?;
    ctx.require(Kind::PrimeMeridian, &r.prime_meridian, "prime_meridian")
}

fn geodetic_datum_frame_epoch(r: &GeodeticDatum, _: &RuleContext<'_>) -> Outcome {
    check_frame_epoch(r.frame_reference_epoch)
}

fn geodetic_datum_components_not_deprecated(r: &GeodeticDatum, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require_not_deprecated(r, Kind::Ellipsoid, &r.ellipsoid, "ellipsoid")?;
    ctx.require_not_deprecated(r, Kind::PrimeMeridian, &r.prime_meridian, "prime_meridian")
}

pub(crate) const GEODETIC_DATUM: &[Rule<GeodeticDatum>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("geodetic_datum_references_exist", geodetic_datum_references_exist),
    immediate("area_exists", area_exists),
    immediate("geodetic_datum_frame_epoch", geodetic_datum_frame_epoch),
    immediate(
        "geodetic_datum_components_not_deprecated",
        geodetic_datum_components_not_deprecated,
    ),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn vertical_datum_frame_epoch(r: &VerticalDatum, _: &RuleContext<'_>) -> Outcome {
    check_frame_epoch(r.frame_reference_epoch)
}

pub(crate) const VERTICAL_DATUM: &[Rule<VerticalDatum>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("area_exists", area_exists),
    immediate("vertical_datum_frame_epoch", vertical_datum_frame_epoch),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn coordinate_system_dimension(r: &CoordinateSystem, _: &RuleContext<'_>) -> Outcome {
    if r.cs_type.allowed_dimensions().contains(&r.dimension) {
        Ok(())
    } else {
        Err(format!(
            "{} coordinate system cannot have dimension {}",
            r.cs_type.as_str(),
            r.dimension
        ))
    }
}

pub(crate) const COORDINATE_SYSTEM: &[Rule<CoordinateSystem>] = &[
    immediate("identity_complete", identity_complete),
    immediate("primary_key_unique", key_unique),
    immediate("coordinate_system_dimension", coordinate_system_dimension),
];

fn axis_references_exist(r: &Axis, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::CoordinateSystem, &r.coordinate_system, "coordinate_system")?;
    ctx.require(Kind::UnitOfMeasure, &r.unit, "unit_of_measure")
}

fn axis_order_range(r: &Axis, ctx: &RuleContext<'_>) -> Outcome {
    let dimension = ctx
        .tables
        .coordinate_systems
        .get(&r.coordinate_system)
        .map_or(3, |cs| cs.dimension);
    if (1..=dimension.min(3)).contains(&r.order) {
        Ok(())
    } else {
        Err(format!(
            "coordinate_system_order {} must be in [1,{dimension}]",
            r.order
        ))
    }
}

fn axis_order_unique(r: &Axis, ctx: &RuleContext<'_>) -> Outcome {
    let taken = ctx
        .tables
        .axes
        .values()
        .any(|a| a.coordinate_system == r.coordinate_system && a.order == r.order && a.key != r.key);
    if taken {
        Err(format!(
            "coordinate_system {} already has an axis with order {}",
            r.coordinate_system, r.order
        ))
    } else {
        Ok(())
    }
}

pub(crate) const AXIS: &[Rule<Axis>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("axis_references_exist", axis_references_exist),
    immediate("axis_order_range", axis_order_range),
    immediate("axis_order_unique", axis_order_unique),
];

// =============================================================================
// CRS
// =============================================================================

fn geodetic_crs_definition_exclusive(r: &GeodeticCrs, _: &RuleContext<'_>) -> Outcome {
    let structured = r.coordinate_system.is_some() && r.datum.is_some() && r.area.is_some();
    let any_component = r.coordinate_system.is_some() || r.datum.is_some();
    match (&r.text_definition, structured) {
        (None, true) => Ok(()),
        (Some(_), _) if !any_component => Ok(()),
        (Some(_), _) => {
            Err("text_definition and coordinate_system/datum are mutually exclusive".to_string())
        }
        (None, false) => {
            Err("coordinate_system, datum and area are required without text_definition".to_string())
        }
    }
}

fn geodetic_crs_references_exist(r: &GeodeticCrs, ctx: &RuleContext<'_>) -> Outcome {
    if let Some(cs) = &r.coordinate_system {
        ctx.require(Kind::CoordinateSystem, cs, "coordinate_system")?;
    }
    if let Some(datum) = &r.datum {
        ctx.require(Kind::GeodeticDatum, datum, "geodetic_datum")?;
    }
    Ok(())
}

fn geodetic_crs_cs_matches_type(r: &GeodeticCrs, ctx: &RuleContext<'_>) -> Outcome {
    let Some(cs) = r
        .coordinate_system
        .as_ref()
        .and_then(|k| ctx.tables.coordinate_systems.get(k))
    else {
        return Ok(());
    };
    let expected = match r.crs_type {
        GeodeticCrsType::Geographic2D => (CsType::Ellipsoidal, 2),
        GeodeticCrsType::Geographic3D => (CsType::Ellipsoidal, 3),
        GeodeticCrsType::Geocentric => (CsType::Cartesian, 3),
    };
    if (cs.cs_type, cs.dimension) == expected {
        Ok(())
    } else {
        Err(format!(
            "coordinate_system must be {} {}D for a {} crs, got {} {}D",
            expected.0.as_str(),
            expected.1,
            r.crs_type.as_str(),
            cs.cs_type.as_str(),
            cs.dimension
        ))
    }
}

fn geodetic_crs_datum_not_deprecated(r: &GeodeticCrs, ctx: &RuleContext<'_>) -> Outcome {
    match &r.datum {
        Some(datum) => ctx.require_not_deprecated(r, Kind::GeodeticDatum, datum, "geodetic_datum"),
        None => Ok(()),
    }
}

pub(crate) const GEODETIC_CRS: &[Rule<GeodeticCrs>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("crs_namespace_unique", crs_namespace_unique),
    immediate("geodetic_crs_definition_exclusive", geodetic_crs_definition_exclusive),
    immediate("geodetic_crs_references_exist", geodetic_crs_references_exist),
    immediate("area_exists", area_exists),
    immediate("geodetic_crs_cs_matches_type", geodetic_crs_cs_matches_type),
    immediate("geodetic_crs_datum_not_deprecated", geodetic_crs_datum_not_deprecated),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn projected_crs_definition_exclusive(r: &ProjectedCrs, _: &RuleContext<'_>) -> Outcome {
    let structured = r.geodetic_crs.is_some()
        && r.conversion.is_some()
        && r.coordinate_system.is_some()
        && r.area.is_some();
    let any_component = r.conversion.is_some() || r.coordinate_system.is_some();
    match (&r.text_definition, structured) {
        (None, true) => Ok(()),
        (Some(_), _) if !any_component => Ok(()),
        (Some(_), _) => Err(
            "text_definition and conversion/coordinate_system are mutually exclusive".to_string(),
        ),
        (None, false) => Err(
            "geodetic_crs, conversion, coordinate_system and area are required without \
             text_definition"
                .to_string(),
        ),
    }
}

fn projected_crs_references_exist(r: &ProjectedCrs, ctx: &RuleContext<'_>) -> Outcome {
    if let Some(base) = &r.geodetic_crs {
        let Some(crs) = ctx.tables.geodetic_crs.get(base) else {
            return Err(format!("geodetic_crs {base} does not exist"));
        };
        if !crs.crs_type.is_geographic() {
            return Err(format!("geodetic_crs {base} must be a geographic crs"));
        }
    }
    if let Some(conversion) = &r.conversion {
        ctx.require(Kind::Conversion, conversion, "conversion")?;
    }
    if let Some(cs_key) = &r.coordinate_system {
        let Some(cs) = ctx.tables.coordinate_systems.get(cs_key) else {
            return Err(format!("coordinate_system {cs_key} does not exist"));
        };
        if cs.cs_type != CsType::Cartesian || cs.dimension != 2 {
            return Err(format!(
                "coordinate_system {cs_key} must be Cartesian 2D, got {} {}D",
                cs.cs_type.as_str(),
                cs.dimension
            ));
        }
    }
    Ok(())
}

fn projected_crs_components_not_deprecated(r: &ProjectedCrs, ctx: &RuleContext<'_>) -> Outcome {
    if let Some(base) = &r.geodetic_crs {
        ctx.require_not_deprecated(r, Kind::GeodeticCrs, base, "geodetic_crs")?;
    }
    if let Some(conversion) = &r.conversion {
        ctx.require_not_deprecated(r, Kind::Conversion, conversion, "conversion")?;
    }
    Ok(())
}

pub(crate) const PROJECTED_CRS: &[Rule<ProjectedCrs>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("crs_namespace_unique", crs_namespace_unique),
    immediate("projected_crs_definition_exclusive", projected_crs_definition_exclusive),
    immediate("projected_crs_references_exist", projected_crs_references_exist),
    immediate("area_exists", area_exists),
    immediate(
        "projected_crs_components_not_deprecated",
        projected_crs_components_not_deprecated,
    ),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn vertical_crs_references_exist(r: &VerticalCrs, ctx: &RuleContext<'_>) -> Outcome {
    let Some(cs) = ctx.tables.coordinate_systems.get(&r.coordinate_system) else {
        return Err(format!("coordinate_system {} does not exist", r.coordinate_system));
    };
    if cs.cs_type != CsType::Vertical || cs.dimension != 1 {
        return Err(format!(
            "coordinate_system {} must be vertical 1D",
            r.coordinate_system
        ));
    }
    ctx.require(Kind::VerticalDatum, &r.datum, "vertical_datum")
}

fn vertical_crs_datum_not_deprecated(r: &VerticalCrs, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require_not_deprecated(r, Kind::VerticalDatum, &r.datum, "vertical_datum")
}

pub(crate) const VERTICAL_CRS: &[Rule<VerticalCrs>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("crs_namespace_unique", crs_namespace_unique),
    immediate("vertical_crs_references_exist", vertical_crs_references_exist),
    immediate("area_exists", area_exists),
    immediate("vertical_crs_datum_not_deprecated", vertical_crs_datum_not_deprecated),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn compound_crs_components_valid(r: &CompoundCrs, ctx: &RuleContext<'_>) -> Outcome {
    match ctx.tables.crs(&r.horizontal_crs).map(|c| c.crs_type()) {
        Some(CrsType::Geographic2D | CrsType::Projected) => {}
        Some(other) => {
            return Err(format!(
                "horizontal_crs {} must be geographic 2D or projected, got {other:?}",
                r.horizontal_crs
            ))
        }
        None => return Err(format!("horizontal_crs {} does not exist", r.horizontal_crs)),
    }
    if !ctx.tables.vertical_crs.contains_key(&r.vertical_crs) {
        return Err(format!(
            "vertical_crs {} must be an existing vertical_crs",
            r.vertical_crs
        ));
    }
    Ok(())
}

fn compound_crs_components_not_deprecated(r: &CompoundCrs, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_not_deprecated(ctx, r, &r.horizontal_crs, "horizontal_crs")?;
    ctx.require_not_deprecated(r, Kind::VerticalCrs, &r.vertical_crs, "vertical_crs")
}

pub(crate) const COMPOUND_CRS: &[Rule<CompoundCrs>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("crs_namespace_unique", crs_namespace_unique),
    immediate("compound_crs_components_valid", compound_crs_components_valid),
    immediate("area_exists", area_exists),
    immediate(
        "compound_crs_components_not_deprecated",
        compound_crs_components_not_deprecated,
    ),
    immediate("area_not_deprecated", area_not_deprecated),
];

// =============================================================================
// METHODS AND PARAMETERS
// =============================================================================

fn conversion_method_registered(r: &ConversionMethod, _: &RuleContext<'_>) -> Outcome {
    if is_registered_conversion_method(&r.name) {
        Ok(())
    } else {
        Err(format!("method name '{}' is not a registered conversion method", r.name))
    }
}

pub(crate) const CONVERSION_METHOD: &[Rule<ConversionMethod>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("conversion_method_registered", conversion_method_registered),
];

pub(crate) const COORDINATE_OPERATION_METHOD: &[Rule<CoordinateOperationMethod>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
];

pub(crate) const PARAMETER: &[Rule<Parameter>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
];

// =============================================================================
// OPERATIONS
// =============================================================================

fn conversion_method_exists(r: &Conversion, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::ConversionMethod, &r.method, "conversion_method")
}

fn conversion_parameters_valid(r: &Conversion, ctx: &RuleContext<'_>) -> Outcome {
    check_parameter_values(ctx, &r.params)
}

fn conversion_method_not_deprecated(r: &Conversion, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require_not_deprecated(r, Kind::ConversionMethod, &r.method, "conversion_method")
}

pub(crate) const CONVERSION: &[Rule<Conversion>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("operation_namespace_unique", operation_namespace_unique),
    immediate("conversion_method_exists", conversion_method_exists),
    immediate("conversion_parameters_valid", conversion_parameters_valid),
    immediate("area_exists", area_exists),
    immediate("conversion_method_not_deprecated", conversion_method_not_deprecated),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn helmert_method_exists(r: &HelmertTransformation, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::CoordinateOperationMethod, &r.method, "method")
}

fn helmert_crs_are_geodetic(r: &HelmertTransformation, ctx: &RuleContext<'_>) -> Outcome {
    check_geodetic_crs_exists(ctx, &r.source_crs, "source_crs")?;
    check_geodetic_crs_exists(ctx, &r.target_crs, "target_crs")
}

fn helmert_accuracy(r: &HelmertTransformation, _: &RuleContext<'_>) -> Outcome {
    check_accuracy(r.accuracy)
}

fn helmert_values_finite(r: &HelmertTransformation, _: &RuleContext<'_>) -> Outcome {
    let triples = [
        Some(&r.translation),
        r.rotation.as_ref(),
        r.rate_translation.as_ref(),
        r.rate_rotation.as_ref(),
        r.pivot.as_ref(),
    ];
    let scalars = [
        r.scale_difference.as_ref(),
        r.rate_scale_difference.as_ref(),
        r.epoch.as_ref(),
    ];
    let finite = triples
        .iter()
        .flatten()
        .all(|q| q.value.iter().all(|v| v.is_finite()))
        && scalars.iter().flatten().all(|q| q.value.is_finite());
    if finite {
        Ok(())
    } else {
        Err("helmert parameter values must be finite".to_string())
    }
}

fn helmert_unit_kinds(r: &HelmertTransformation, ctx: &RuleContext<'_>) -> Outcome {
    fn check<T>(
        ctx: &RuleContext<'_>,
        q: Option<&Quantity<T>>,
        expected: UnitKind,
        role: &str,
    ) -> Outcome {
        match q {
            Some(q) => check_unit_kind(ctx, &q.unit, expected, role),
            None => Ok(()),
        }
    }
    check(ctx, Some(&r.translation), UnitKind::Length, "translation")?;
    check(ctx, r.rotation.as_ref(), UnitKind::Angle, "rotation")?;
    check(ctx, r.scale_difference.as_ref(), UnitKind::Scale, "scale_difference")?;
    check(ctx, r.rate_translation.as_ref(), UnitKind::Length, "rate_translation")?;
    check(ctx, r.rate_rotation.as_ref(), UnitKind::Angle, "rate_rotation")?;
    check(
        ctx,
        r.rate_scale_difference.as_ref(),
        UnitKind::Scale,
        "rate_scale_difference",
    )?;
    check(ctx, r.epoch.as_ref(), UnitKind::Time, "epoch")?;
    check(ctx, r.pivot.as_ref(), UnitKind::Length, "pivot")
}

fn helmert_crs_not_deprecated(r: &HelmertTransformation, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_not_deprecated(ctx, r, &r.source_crs, "source_crs")?;
    check_crs_not_deprecated(ctx, r, &r.target_crs, "target_crs")
}

pub(crate) const HELMERT_TRANSFORMATION: &[Rule<HelmertTransformation>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("operation_namespace_unique", operation_namespace_unique),
    immediate("helmert_method_exists", helmert_method_exists),
    immediate("helmert_crs_are_geodetic", helmert_crs_are_geodetic),
    immediate("area_exists", area_exists),
    immediate("accuracy_non_negative", helmert_accuracy),
    immediate("helmert_values_finite", helmert_values_finite),
    immediate("helmert_unit_kinds", helmert_unit_kinds),
    immediate("transformation_crs_not_deprecated", helmert_crs_not_deprecated),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn grid_method_exists(r: &GridTransformation, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::CoordinateOperationMethod, &r.method, "method")
}

fn grid_crs_exist(r: &GridTransformation, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_exists(ctx, &r.source_crs, "source_crs")?;
    check_crs_exists(ctx, &r.target_crs, "target_crs")?;
    match &r.interpolation_crs {
        Some(crs) => check_geodetic_crs_exists(ctx, crs, "interpolation_crs"),
        None => Ok(()),
    }
}

fn grid_names_present(r: &GridTransformation, _: &RuleContext<'_>) -> Outcome {
    if r.grid_names().any(str::is_empty) {
        Err("grid names must not be empty".to_string())
    } else {
        Ok(())
    }
}

fn grid_accuracy(r: &GridTransformation, _: &RuleContext<'_>) -> Outcome {
    check_accuracy(r.accuracy)
}

fn grid_crs_not_deprecated(r: &GridTransformation, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_not_deprecated(ctx, r, &r.source_crs, "source_crs")?;
    check_crs_not_deprecated(ctx, r, &r.target_crs, "target_crs")
}

pub(crate) const GRID_TRANSFORMATION: &[Rule<GridTransformation>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("operation_namespace_unique", operation_namespace_unique),
    immediate("grid_method_exists", grid_method_exists),
    immediate("grid_crs_exist", grid_crs_exist),
    immediate("grid_names_present", grid_names_present),
    immediate("area_exists", area_exists),
    immediate("accuracy_non_negative", grid_accuracy),
    immediate("transformation_crs_not_deprecated", grid_crs_not_deprecated),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn other_method_exists(r: &OtherTransformation, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::CoordinateOperationMethod, &r.method, "method")
}

fn other_crs_exist(r: &OtherTransformation, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_exists(ctx, &r.source_crs, "source_crs")?;
    check_crs_exists(ctx, &r.target_crs, "target_crs")
}

fn other_parameters_valid(r: &OtherTransformation, ctx: &RuleContext<'_>) -> Outcome {
    let opaque = ctx
        .tables
        .operation_methods
        .get(&r.method)
        .is_some_and(|m| is_opaque_method(&m.name));
    if opaque && !r.params.is_empty() {
        return Err("opaque method definitions take no parameter values".to_string());
    }
    check_parameter_values(ctx, &r.params)
}

fn other_accuracy(r: &OtherTransformation, _: &RuleContext<'_>) -> Outcome {
    check_accuracy(r.accuracy)
}

fn other_crs_not_deprecated(r: &OtherTransformation, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_not_deprecated(ctx, r, &r.source_crs, "source_crs")?;
    check_crs_not_deprecated(ctx, r, &r.target_crs, "target_crs")
}

pub(crate) const OTHER_TRANSFORMATION: &[Rule<OtherTransformation>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("operation_namespace_unique", operation_namespace_unique),
    immediate("other_method_exists", other_method_exists),
    immediate("other_crs_exist", other_crs_exist),
    immediate("other_parameters_valid", other_parameters_valid),
    immediate("area_exists", area_exists),
    immediate("accuracy_non_negative", other_accuracy),
    immediate("transformation_crs_not_deprecated", other_crs_not_deprecated),
    immediate("area_not_deprecated", area_not_deprecated),
];

fn concatenated_crs_exist(r: &ConcatenatedOperation, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_exists(ctx, &r.source_crs, "source_crs")?;
    check_crs_exists(ctx, &r.target_crs, "target_crs")
}

fn concatenated_step_count(r: &ConcatenatedOperation, _: &RuleContext<'_>) -> Outcome {
    if (MIN_STEPS..=MAX_STEPS).contains(&r.steps.len()) {
        Ok(())
    } else {
        Err(format!(
            "concatenated operation has {} steps, expected {MIN_STEPS} to {MAX_STEPS}",
            r.steps.len()
        ))
    }
}

fn concatenated_accuracy(r: &ConcatenatedOperation, _: &RuleContext<'_>) -> Outcome {
    check_accuracy(r.accuracy)
}

fn concatenated_steps_exist(r: &ConcatenatedOperation, ctx: &RuleContext<'_>) -> Outcome {
    for (i, step) in r.steps.iter().enumerate() {
        if ctx.tables.operation(step).is_none() {
            return Err(format!("step{} {step} does not exist", i + 1));
        }
    }
    Ok(())
}

fn concatenated_steps_not_nested(r: &ConcatenatedOperation, ctx: &RuleContext<'_>) -> Outcome {
    for (i, step) in r.steps.iter().enumerate() {
        if ctx.tables.concatenated_operations.contains_key(step) {
            return Err(format!(
                "step{} {step} must not be a concatenated_operation",
                i + 1
            ));
        }
    }
    Ok(())
}

fn concatenated_crs_not_deprecated(r: &ConcatenatedOperation, ctx: &RuleContext<'_>) -> Outcome {
    check_crs_not_deprecated(ctx, r, &r.source_crs, "source_crs")?;
    check_crs_not_deprecated(ctx, r, &r.target_crs, "target_crs")
}

pub(crate) const CONCATENATED_OPERATION: &[Rule<ConcatenatedOperation>] = &[
    immediate("identity_complete", identity_complete),
    immediate("name_min_length", name_min_length),
    immediate("primary_key_unique", key_unique),
    immediate("operation_namespace_unique", operation_namespace_unique),
    immediate("concatenated_crs_exist", concatenated_crs_exist),
    immediate("concatenated_step_count", concatenated_step_count),
    immediate("area_exists", area_exists),
    immediate("accuracy_non_negative", concatenated_accuracy),
    immediate("transformation_crs_not_deprecated", concatenated_crs_not_deprecated),
    immediate("area_not_deprecated", area_not_deprecated),
    deferred("concatenated_steps_exist", concatenated_steps_exist),
    deferred("concatenated_steps_not_nested", concatenated_steps_not_nested),
];

// =============================================================================
// GRID DISTRIBUTION
// =============================================================================

fn check_download_flags(
    url: Option<&str>,
    direct_download: Option<bool>,
    open_license: Option<bool>,
) -> Outcome {
    if url.is_some() && (direct_download.is_none() || open_license.is_none()) {
        Err("direct_download and open_license must be set when url is set".to_string())
    } else {
        Ok(())
    }
}

fn grid_package_identity(r: &GridPackage, ctx: &RuleContext<'_>) -> Outcome {
    if r.package_name.is_empty() {
        return Err("package_name must not be empty".to_string());
    }
    if ctx.tables.grid_packages.contains_key(&r.package_name) {
        return Err(format!("duplicate package_name {}", r.package_name));
    }
    Ok(())
}

fn grid_package_download_flags(r: &GridPackage, _: &RuleContext<'_>) -> Outcome {
    check_download_flags(r.url.as_deref(), r.direct_download, r.open_license)
}

pub(crate) const GRID_PACKAGE: &[Rule<GridPackage>] = &[
    immediate("grid_package_identity", grid_package_identity),
    immediate("grid_package_download_flags", grid_package_download_flags),
];

fn grid_alternative_identity(r: &GridAlternative, ctx: &RuleContext<'_>) -> Outcome {
    if r.original_grid_name.is_empty() || r.proj_grid_name.is_empty() {
        return Err("original_grid_name and proj_grid_name must not be empty".to_string());
    }
    if ctx.tables.grid_alternatives.contains_key(&r.original_grid_name) {
        return Err(format!("duplicate original_grid_name {}", r.original_grid_name));
    }
    Ok(())
}

fn grid_alternative_format_method(r: &GridAlternative, _: &RuleContext<'_>) -> Outcome {
    if r.format.compatible_methods().contains(&r.method) {
        Ok(())
    } else {
        Err(format!(
            "proj_method {} is not compatible with proj_grid_format {}",
            r.method.as_str(),
            r.format.as_str()
        ))
    }
}

fn grid_alternative_referenced(r: &GridAlternative, ctx: &RuleContext<'_>) -> Outcome {
    if r.original_grid_name == NULL_GRID_NAME {
        return Ok(());
    }
    let referenced = ctx
        .tables
        .grid_transformations
        .values()
        .any(|t| t.grid_names().any(|g| g == r.original_grid_name));
    if referenced {
        Ok(())
    } else {
        Err(format!(
            "original_grid_name {} is not referenced by any grid_transformation",
            r.original_grid_name
        ))
    }
}

fn grid_alternative_direction(r: &GridAlternative, _: &RuleContext<'_>) -> Outcome {
    if r.original_grid_name == r.proj_grid_name && r.inverse_direction {
        Err("inverse_direction must be false when original_grid_name = proj_grid_name".to_string())
    } else {
        Ok(())
    }
}

fn grid_alternative_download_flags(r: &GridAlternative, _: &RuleContext<'_>) -> Outcome {
    check_download_flags(r.url.as_deref(), r.direct_download, r.open_license)
}

fn grid_alternative_package(r: &GridAlternative, ctx: &RuleContext<'_>) -> Outcome {
    let Some(package) = &r.package_name else {
        return Ok(());
    };
    if r.url.is_some() {
        return Err("url must not be set when package_name is set".to_string());
    }
    if !ctx.tables.grid_packages.contains_key(package) {
        return Err(format!("grid package {package} does not exist"));
    }
    Ok(())
}

pub(crate) const GRID_ALTERNATIVE: &[Rule<GridAlternative>] = &[
    immediate("grid_alternative_identity", grid_alternative_identity),
    immediate("grid_alternative_format_method", grid_alternative_format_method),
    immediate("grid_alternative_referenced", grid_alternative_referenced),
    immediate("grid_alternative_direction", grid_alternative_direction),
    immediate("grid_alternative_download_flags", grid_alternative_download_flags),
    immediate("grid_alternative_package", grid_alternative_package),
];

// =============================================================================
// RESOLVER HINTS
// =============================================================================

fn preferred_hub_datums_exist(r: &PreferredHub, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(Kind::GeodeticDatum, &r.source_datum, "source geodetic_datum")?;
    ctx.require(Kind::GeodeticDatum, &r.hub_datum, "hub geodetic_datum")?;
    if r.source_datum == r.hub_datum {
        return Err(format!("datum {} cannot be its own hub", r.source_datum));
    }
    Ok(())
}

pub(crate) const PREFERRED_HUB: &[Rule<PreferredHub>] =
    &[immediate("preferred_hub_datums_exist", preferred_hub_datums_exist)];

fn authority_preference_valid(r: &AuthorityPreference, ctx: &RuleContext<'_>) -> Outcome {
    if r.source_authority.is_empty() || r.target_authority.is_empty() {
        return Err("source and target authority must not be empty".to_string());
    }
    if r.allowed_authorities.is_empty() || r.allowed_authorities.iter().any(String::is_empty) {
        return Err("allowed_authorities must be a non-empty list of authorities".to_string());
    }
    let duplicate = ctx.tables.authority_preferences.iter().any(|p| {
        p.source_authority == r.source_authority && p.target_authority == r.target_authority
    });
    if duplicate {
        return Err(format!(
            "preference {} -> {} already exists",
            r.source_authority, r.target_authority
        ));
    }
    Ok(())
}

pub(crate) const AUTHORITY_PREFERENCE: &[Rule<AuthorityPreference>] =
    &[immediate("authority_preference_valid", authority_preference_valid)];

// =============================================================================
// LINKS
// =============================================================================

fn alias_name_present(r: &AliasName, _: &RuleContext<'_>) -> Outcome {
    if r.alt_name.is_empty() {
        Err("alt_name must not be empty".to_string())
    } else {
        Ok(())
    }
}

fn alias_target_exists(r: &AliasName, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(r.object.kind, &r.object.key, r.object.kind.table_name())
}

pub(crate) const ALIAS_NAME: &[Rule<AliasName>] = &[
    immediate("alias_name_present", alias_name_present),
    deferred("alias_target_exists", alias_target_exists),
];

fn link_kind_keyed(kind: Kind) -> Outcome {
    if kind.is_keyed() {
        Ok(())
    } else {
        Err(format!("{kind} records cannot be linked"))
    }
}

fn supersession_kind_keyed(r: &Supersession, _: &RuleContext<'_>) -> Outcome {
    link_kind_keyed(r.kind)
}

fn supersession_ends_exist(r: &Supersession, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(r.kind, &r.superseded, "superseded")?;
    ctx.require(r.kind, &r.replacement, "replacement")
}

pub(crate) const SUPERSESSION: &[Rule<Supersession>] = &[
    immediate("supersession_kind_keyed", supersession_kind_keyed),
    deferred("supersession_ends_exist", supersession_ends_exist),
];

fn deprecation_kind_keyed(r: &Deprecation, _: &RuleContext<'_>) -> Outcome {
    link_kind_keyed(r.kind)
}

fn deprecation_unique(r: &Deprecation, ctx: &RuleContext<'_>) -> Outcome {
    let duplicate = ctx
        .tables
        .deprecations
        .iter()
        .any(|d| d.kind == r.kind && d.deprecated == r.deprecated);
    if duplicate {
        Err(format!("{} {} already has a deprecation record", r.kind, r.deprecated))
    } else {
        Ok(())
    }
}

fn deprecation_ends_exist(r: &Deprecation, ctx: &RuleContext<'_>) -> Outcome {
    ctx.require(r.kind, &r.deprecated, "deprecated")?;
    ctx.require(r.kind, &r.replacement, "replacement")
}

pub(crate) const DEPRECATION: &[Rule<Deprecation>] = &[
    immediate("deprecation_kind_keyed", deprecation_kind_keyed),
    immediate("deprecation_unique", deprecation_unique),
    deferred("deprecation_ends_exist", deprecation_ends_exist),
];
