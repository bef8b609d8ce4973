//! Record validation.
//!
//! Every record kind has an ordered list of named rules (see [`rules`]).
//! Evaluation stops at the first failing rule and reports its name together
//! with the offending record.
//!
//! Rules run in one of two phases. Immediate rules only look at the record
//! itself and at records of a lower load rank, so they can run as soon as the
//! record is staged. Deferred rules check references that may point forward
//! within the same batch (concatenation steps, alias, supersession and
//! deprecation targets) and run once the whole batch is staged.

mod rules;

use tracing::warn;

use crate::config::ValidatorConfig;
use crate::error::ValidationError;
use crate::model::{Kind, ObjectKey, Record};
use crate::store::Tables;
use crate::view::CatalogObject;

/// When a rule is evaluated during a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the record is staged.
    Immediate,
    /// After the whole batch is staged.
    Deferred,
}

/// A named validation rule for records of type `T`.
pub struct Rule<T> {
    pub name: &'static str,
    pub phase: Phase,
    pub check: fn(&T, &RuleContext<'_>) -> Result<(), String>,
}

/// What rules can see: the store contents and the validator settings.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub tables: &'a Tables,
    pub config: &'a ValidatorConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(tables: &'a Tables, config: &'a ValidatorConfig) -> Self {
        Self { tables, config }
    }

    /// Fails unless a record of `kind` with `key` exists.
    pub fn require(&self, kind: Kind, key: &ObjectKey, what: &str) -> Result<(), String> {
        if self.tables.contains(kind, key) {
            Ok(())
        } else {
            Err(format!("{what} {key} does not exist"))
        }
    }

    /// Fails if `owner` is not deprecated but references a deprecated record.
    ///
    /// Owners whose authority is listed in
    /// [`ValidatorConfig::deprecation_exempt_authorities`] always pass, as do
    /// references to records that do not exist.
    pub fn require_not_deprecated<T: CatalogObject + ?Sized>(
        &self,
        owner: &T,
        kind: Kind,
        key: &ObjectKey,
        what: &str,
    ) -> Result<(), String> {
        if owner.deprecated() || self.config.is_deprecation_exempt(&owner.key().authority) {
            return Ok(());
        }
        match self.tables.get(kind, key) {
            Some(target) if target.deprecated() => Err(format!(
                "{what} {key} must not be deprecated when {} is not deprecated",
                owner.kind()
            )),
            _ => Ok(()),
        }
    }
}

fn run<T>(
    rules: &[Rule<T>],
    record: &T,
    kind: Kind,
    label: impl FnOnce() -> String,
    ctx: &RuleContext<'_>,
    phase: Option<Phase>,
) -> Result<(), ValidationError> {
    for rule in rules {
        if phase.is_some_and(|p| p != rule.phase) {
            continue;
        }
        if let Err(message) = (rule.check)(record, ctx) {
            let err = ValidationError {
                rule: rule.name,
                kind,
                key: label(),
                message,
            };
            warn!(rule = err.rule, kind = %kind, key = %err.key, "{}", err.message);
            return Err(err);
        }
    }
    Ok(())
}

fn names<T>(rules: &[Rule<T>]) -> Vec<&'static str> {
    rules.iter().map(|r| r.name).collect()
}

macro_rules! dispatch {
    ($record:expr, |$rules:ident, $r:ident| $body:expr) => {
        match $record {
            Record::UnitOfMeasure($r) => { let $rules = rules::UNIT_OF_MEASURE; $body }
            Record::CelestialBody($r) => { let $rules = rules::CELESTIAL_BODY; $body }
            Record::Ellipsoid($r) => { let $rules = rules::ELLIPSOID; $body }
            Record::Extent($r) => { let $rules = rules::EXTENT; $body }
            Record::PrimeMeridian($r) => { let $rules = rules::PRIME_MERIDIAN; $body }
            Record::GeodeticDatum($r) => { let $rules = rules::GEODETIC_DATUM; $body }
            Record::VerticalDatum($r) => { let $rules = rules::VERTICAL_DATUM; $body }
            Record::CoordinateSystem($r) => { let $rules = rules::COORDINATE_SYSTEM; $body }
            Record::Axis($r) => { let $rules = rules::AXIS; $body }
            Record::GeodeticCrs($r) => { let $rules = rules::GEODETIC_CRS; $body }
            Record::ProjectedCrs($r) => { let $rules = rules::PROJECTED_CRS; $body }
            Record::VerticalCrs($r) => { let $rules = rules::VERTICAL_CRS; $body }
            Record::CompoundCrs($r) => { let $rules = rules::COMPOUND_CRS; $body }
            Record::ConversionMethod($r) => { let $rules = rules::CONVERSION_METHOD; $body }
            Record::CoordinateOperationMethod($r) => {
                let $rules = rules::COORDINATE_OPERATION_METHOD;
                $body
            }
            Record::Parameter($r) => { let $rules = rules::PARAMETER; $body }
            Record::Conversion($r) => { let $rules = rules::CONVERSION; $body }
            Record::HelmertTransformation($r) => {
                let $rules = rules::HELMERT_TRANSFORMATION;
                $body
            }
            Record::GridTransformation($r) => { let $rules = rules::GRID_TRANSFORMATION; $body }
            Record::OtherTransformation($r) => { let $rules = rules::OTHER_TRANSFORMATION; $body }
            Record::ConcatenatedOperation($r) => {
                let $rules = rules::CONCATENATED_OPERATION;
                $body
            }
            Record::GridPackage($r) => { let $rules = rules::GRID_PACKAGE; $body }
            Record::GridAlternative($r) => { let $rules = rules::GRID_ALTERNATIVE; $body }
            Record::PreferredHub($r) => { let $rules = rules::PREFERRED_HUB; $body }
            Record::AuthorityPreference($r) => { let $rules = rules::AUTHORITY_PREFERENCE; $body }
            Record::AliasName($r) => { let $rules = rules::ALIAS_NAME; $body }
            Record::Supersession($r) => { let $rules = rules::SUPERSESSION; $body }
            Record::Deprecation($r) => { let $rules = rules::DEPRECATION; $body }
        }
    };
}

/// Validates a record against the store.
///
/// With `phase` set, only rules of that phase run.
pub fn validate_record(
    record: &Record,
    ctx: &RuleContext<'_>,
    phase: Option<Phase>,
) -> Result<(), ValidationError> {
    let kind = record.kind();
    let label = || record.label();
    dispatch!(record, |set, r| run(set, r, kind, label, ctx, phase))
}

/// Names of the rules that apply to records of the same kind as `record`,
/// in evaluation order.
pub fn rule_names(record: &Record) -> Vec<&'static str> {
    dispatch!(record, |set, _r| names(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::model::{
        BoundingBox, ConcatenatedOperation, Ellipsoid, Extent, GridAlternative, GridFormat,
        GridMethod, Kind, ObjectKey, UnitKind, UnitOfMeasure,
    };
    use crate::model::{
        AliasName, Axis, CoordinateSystem, CsType, Deprecation, GeodeticCrs, GeodeticCrsType,
        ObjectRef, Quantity, Supersession, VerticalDatum,
    };
    use crate::test_support::{epsg, fixture_tables};
    use proptest::prelude::*;

    fn check(tables: &Tables, record: impl Into<Record>) -> Result<(), ValidationError> {
        let config = ValidatorConfig::default();
        validate_record(&record.into(), &RuleContext::new(tables, &config), None)
    }

    fn sphere_like(inv_flattening: Option<f64>, semi_minor_axis: Option<f64>) -> Ellipsoid {
        Ellipsoid {
            key: epsg("7999"),
            name: "Test ellipsoid".to_string(),
            celestial_body: ObjectKey::new("PROJ", "EARTH"),
            semi_major_axis: 6378137.0,
            unit: epsg("9001"),
            inv_flattening,
            semi_minor_axis,
            deprecated: false,
        }
    }

    #[test]
    fn test_ellipsoid_requires_exactly_one_shape_parameter() {
        let tables = fixture_tables();

        let err = check(&tables, sphere_like(None, None)).unwrap_err();
        assert_eq!(err.rule, "ellipsoid_shape_exclusive");
        assert_eq!(err.kind, Kind::Ellipsoid);
        assert_eq!(err.key, "EPSG:7999");

        let err = check(&tables, sphere_like(Some(298.257223563), Some(6356752.314245))).unwrap_err();
        assert_eq!(err.rule, "ellipsoid_shape_exclusive");

        check(&tables, sphere_like(Some(298.257223563), None)).unwrap();
        check(&tables, sphere_like(None, Some(6356752.314245))).unwrap();
    }

    #[test]
    fn test_ellipsoid_unit_must_be_length() {
        let tables = fixture_tables();
        let mut ellipsoid = sphere_like(Some(300.0), None);
        ellipsoid.unit = epsg("9122");
        let err = check(&tables, ellipsoid).unwrap_err();
        assert_eq!(err.rule, "ellipsoid_unit_is_length");
        assert!(err.message.contains("must be of type length"));
    }

    #[test]
    fn test_extent_south_above_north_rejected() {
        let tables = fixture_tables();
        let extent = Extent::new(epsg("9990"), "Inverted", BoundingBox::new(10.0, 5.0, 0.0, 10.0));
        let err = check(&tables, extent).unwrap_err();
        assert_eq!(err.rule, "extent_south_le_north");
        assert!(err.to_string().starts_with("insert on extent violates constraint"));
    }

    #[test]
    fn test_extent_antimeridian_wrap_bound() {
        let tables = fixture_tables();
        let pacific = Extent::new(epsg("9991"), "Pacific", BoundingBox::new(-50.0, 0.0, 160.0, -170.0));
        check(&tables, pacific).unwrap();

        let too_wide = Extent::new(epsg("9992"), "Too wide", BoundingBox::new(-50.0, 0.0, 10.0, -170.0));
        assert_eq!(check(&tables, too_wide).unwrap_err().rule, "extent_antimeridian_wrap");
    }

    #[test]
    fn test_datum_referencing_deprecated_ellipsoid_rejected() {
        let mut tables = fixture_tables();
        let mut old = tables.ellipsoids[&epsg("7030")].clone();
        old.key = epsg("7001");
        old.name = "Airy 1830".to_string();
        old.deprecated = true;
        tables.ellipsoids.insert(old.key.clone(), old);

        let mut datum = tables.geodetic_datums[&epsg("6326")].clone();
        datum.key = epsg("6277");
        datum.name = "Ordnance Survey of Great Britain 1936".to_string();
        datum.ellipsoid = epsg("7001");
        let err = check(&tables, datum.clone()).unwrap_err();
        assert_eq!(err.rule, "geodetic_datum_components_not_deprecated");
        assert!(err.message.contains("must not be deprecated"));

        datum.deprecated = true;
        check(&tables, datum.clone()).unwrap();

        datum.deprecated = false;
        datum.key = ObjectKey::new("ESRI", "106277");
        check(&tables, datum).unwrap();
    }

    #[test]
    fn test_exemption_list_is_configurable() {
        let mut tables = fixture_tables();
        let mut old = tables.ellipsoids[&epsg("7030")].clone();
        old.key = epsg("7001");
        old.deprecated = true;
        tables.ellipsoids.insert(old.key.clone(), old);

        let mut datum = tables.geodetic_datums[&epsg("6326")].clone();
        datum.key = ObjectKey::new("ESRI", "106277");
        datum.ellipsoid = epsg("7001");

        let config = ValidatorConfig {
            deprecation_exempt_authorities: Vec::new(),
        };
        let err = validate_record(&datum.into(), &RuleContext::new(&tables, &config), None)
            .unwrap_err();
        assert_eq!(err.rule, "geodetic_datum_components_not_deprecated");
    }

    #[test]
    fn test_crs_namespace_shared_across_kinds() {
        let tables = fixture_tables();
        let mut vertical = tables.vertical_crs[&epsg("5773")].clone();
        vertical.key = epsg("4326");
        let err = check(&tables, vertical).unwrap_err();
        assert_eq!(err.rule, "crs_namespace_unique");
        assert!(err.message.contains("geodetic_crs"));
    }

    #[test]
    fn test_operation_namespace_shared_across_kinds() {
        let tables = fixture_tables();
        let mut helmert = tables.helmert_transformations[&epsg("1149")].clone();
        helmert.key = epsg("3856");
        let err = check(&tables, helmert).unwrap_err();
        assert_eq!(err.rule, "operation_namespace_unique");
    }

    #[test]
    fn test_primary_key_unique() {
        let tables = fixture_tables();
        let metre = UnitOfMeasure::new(epsg("9001"), "metre", UnitKind::Length, Some(1.0));
        assert_eq!(check(&tables, metre).unwrap_err().rule, "primary_key_unique");
    }

    #[test]
    fn test_concatenated_step_must_not_be_concatenated() {
        let mut tables = fixture_tables();
        let inner = ConcatenatedOperation {
            key: epsg("9990"),
            name: "ETRS89 to RGF93 (1)".to_string(),
            source_crs: epsg("4258"),
            target_crs: epsg("4171"),
            area: epsg("1096"),
            accuracy: Some(2.0),
            steps: vec![epsg("1149"), epsg("1671")],
            deprecated: false,
        };
        check(&tables, inner.clone()).unwrap();
        tables.concatenated_operations.insert(inner.key.clone(), inner);

        let nested = ConcatenatedOperation {
            key: epsg("9991"),
            name: "Nested".to_string(),
            source_crs: epsg("4258"),
            target_crs: epsg("4326"),
            area: epsg("1096"),
            accuracy: None,
            steps: vec![epsg("9990"), epsg("1671")],
            deprecated: false,
        };
        let err = check(&tables, nested).unwrap_err();
        assert_eq!(err.rule, "concatenated_steps_not_nested");
    }

    #[test]
    fn test_deferred_rules_skipped_in_immediate_phase() {
        let tables = fixture_tables();
        let forward = ConcatenatedOperation {
            key: epsg("9992"),
            name: "Forward reference".to_string(),
            source_crs: epsg("4258"),
            target_crs: epsg("4326"),
            area: epsg("1298"),
            accuracy: None,
            steps: vec![epsg("1149"), epsg("99999")],
            deprecated: false,
        };
        let config = ValidatorConfig::default();
        let ctx = RuleContext::new(&tables, &config);
        let record = Record::from(forward);
        validate_record(&record, &ctx, Some(Phase::Immediate)).unwrap();
        let err = validate_record(&record, &ctx, Some(Phase::Deferred)).unwrap_err();
        assert_eq!(err.rule, "concatenated_steps_exist");
    }

    #[test]
    fn test_grid_alternative_format_method_pairing() {
        let tables = fixture_tables();
        let mut alt = GridAlternative {
            original_grid_name: "WW15MGH.GRD".to_string(),
            proj_grid_name: "egm96_15.gtx".to_string(),
            format: GridFormat::NTv2,
            method: GridMethod::VGridShift,
            ..Default::default()
        };
        let mut empty = tables.clone();
        empty.grid_alternatives.clear();

        let err = check(&empty, alt.clone()).unwrap_err();
        assert_eq!(err.rule, "grid_alternative_format_method");

        alt.format = GridFormat::Gtx;
        check(&empty, alt.clone()).unwrap();

        alt.method = GridMethod::HGridShift;
        assert_eq!(
            check(&empty, alt).unwrap_err().rule,
            "grid_alternative_format_method"
        );
    }

    #[test]
    fn test_grid_alternative_url_requires_flags() {
        let mut tables = fixture_tables();
        tables.grid_alternatives.clear();
        let mut alt = GridAlternative {
            original_grid_name: "WW15MGH.GRD".to_string(),
            proj_grid_name: "us_nga_egm96_15.tif".to_string(),
            format: GridFormat::GTiff,
            method: GridMethod::VGridShift,
            url: Some("https://cdn.proj.org/us_nga_egm96_15.tif".to_string()),
            ..Default::default()
        };
        assert_eq!(
            check(&tables, alt.clone()).unwrap_err().rule,
            "grid_alternative_download_flags"
        );
        alt.direct_download = Some(true);
        alt.open_license = Some(true);
        check(&tables, alt.clone()).unwrap();

        alt.package_name = Some("proj-datumgrid".to_string());
        assert_eq!(check(&tables, alt).unwrap_err().rule, "grid_alternative_package");
    }

    #[test]
    fn test_grid_alternative_must_be_referenced() {
        let tables = fixture_tables();
        let alt = GridAlternative {
            original_grid_name: "unknown.gsb".to_string(),
            proj_grid_name: "unknown.tif".to_string(),
            format: GridFormat::GTiff,
            method: GridMethod::HGridShift,
            ..Default::default()
        };
        assert_eq!(check(&tables, alt).unwrap_err().rule, "grid_alternative_referenced");

        let null = GridAlternative {
            original_grid_name: "null".to_string(),
            proj_grid_name: "null".to_string(),
            format: GridFormat::CTable2,
            method: GridMethod::HGridShift,
            ..Default::default()
        };
        check(&tables, null).unwrap();
    }

    #[test]
    fn test_vertical_coordinate_system_is_one_dimensional() {
        let tables = fixture_tables();
        let mut cs = CoordinateSystem::new(epsg("6498"), CsType::Vertical, 2);
        let err = check(&tables, cs.clone()).unwrap_err();
        assert_eq!(err.rule, "coordinate_system_dimension");
        assert!(err.message.contains("dimension 2"));

        cs.dimension = 1;
        check(&tables, cs).unwrap();
    }

    #[test]
    fn test_axis_order_within_dimension_and_unique() {
        let mut tables = fixture_tables();
        tables.coordinate_systems.insert(
            epsg("6424"),
            CoordinateSystem::new(epsg("6424"), CsType::Ellipsoidal, 2),
        );
        let mut axis = Axis {
            key: epsg("220"),
            name: "Geodetic latitude".to_string(),
            abbreviation: "Lat".to_string(),
            orientation: "north".to_string(),
            coordinate_system: epsg("6424"),
            order: 3,
            unit: epsg("9122"),
        };
        assert_eq!(check(&tables, axis.clone()).unwrap_err().rule, "axis_order_range");

        axis.order = 1;
        check(&tables, axis.clone()).unwrap();

        // 6422 already has its latitude axis at order 1.
        axis.coordinate_system = epsg("6422");
        assert_eq!(check(&tables, axis).unwrap_err().rule, "axis_order_unique");
    }

    #[test]
    fn test_geodetic_crs_text_and_structure_exclusive() {
        let tables = fixture_tables();
        let mut crs = tables.geodetic_crs[&epsg("4326")].clone();
        crs.key = epsg("4937");
        crs.text_definition = Some("+proj=longlat +ellps=GRS80".to_string());
        let err = check(&tables, crs.clone()).unwrap_err();
        assert_eq!(err.rule, "geodetic_crs_definition_exclusive");
        assert!(err.message.contains("mutually exclusive"));

        crs.coordinate_system = None;
        crs.datum = None;
        crs.area = None;
        check(&tables, crs.clone()).unwrap();

        crs.text_definition = None;
        assert_eq!(
            check(&tables, crs).unwrap_err().rule,
            "geodetic_crs_definition_exclusive"
        );
    }

    #[test]
    fn test_geodetic_crs_cs_must_match_type() {
        let tables = fixture_tables();
        let mut crs = GeodeticCrs::structured(
            epsg("4937"),
            "ETRS89",
            GeodeticCrsType::Geographic3D,
            epsg("6422"),
            epsg("6258"),
            epsg("1298"),
        );
        let err = check(&tables, crs.clone()).unwrap_err();
        assert_eq!(err.rule, "geodetic_crs_cs_matches_type");
        assert!(err.message.contains("ellipsoidal 3D"));

        crs.coordinate_system = Some(epsg("6423"));
        check(&tables, crs.clone()).unwrap();

        crs.crs_type = GeodeticCrsType::Geocentric;
        crs.coordinate_system = Some(epsg("6500"));
        check(&tables, crs).unwrap();
    }

    #[test]
    fn test_helmert_units_must_match_role() {
        let tables = fixture_tables();
        let mut helmert = tables.helmert_transformations[&epsg("1149")].clone();
        helmert.key = epsg("9998");
        check(&tables, helmert.clone()).unwrap();

        helmert.rotation = Some(Quantity::new([0.0, 0.0, 0.0], epsg("9001")));
        let err = check(&tables, helmert.clone()).unwrap_err();
        assert_eq!(err.rule, "helmert_unit_kinds");
        assert!(err.message.contains("rotation unit EPSG:9001 must be of type angle"));

        helmert.rotation = Some(Quantity::new([0.0, 0.0, 0.0], epsg("9104")));
        helmert.translation.unit = epsg("9122");
        let err = check(&tables, helmert).unwrap_err();
        assert_eq!(err.rule, "helmert_unit_kinds");
        assert!(err.message.contains("translation"));
    }

    #[test]
    fn test_grid_alternative_same_name_is_forward() {
        let mut tables = fixture_tables();
        tables.grid_alternatives.clear();
        let mut alt = GridAlternative {
            original_grid_name: "WW15MGH.GRD".to_string(),
            proj_grid_name: "WW15MGH.GRD".to_string(),
            format: GridFormat::GTiff,
            method: GridMethod::VGridShift,
            inverse_direction: true,
            ..Default::default()
        };
        assert_eq!(
            check(&tables, alt.clone()).unwrap_err().rule,
            "grid_alternative_direction"
        );

        alt.inverse_direction = false;
        check(&tables, alt.clone()).unwrap();

        alt.proj_grid_name = "us_nga_egm96_15.tif".to_string();
        alt.inverse_direction = true;
        check(&tables, alt).unwrap();
    }

    #[test]
    fn test_vertical_datum_and_crs_reject_deprecated_references() {
        let mut tables = fixture_tables();
        let mut old_area = Extent::new(epsg("2000"), "Retired area", BoundingBox::world());
        old_area.deprecated = true;
        tables.extents.insert(old_area.key.clone(), old_area);

        let mut datum = tables.vertical_datums[&epsg("5171")].clone();
        datum.key = epsg("5100");
        datum.name = "Mean Sea Level".to_string();
        datum.area = epsg("2000");
        assert_eq!(check(&tables, datum.clone()).unwrap_err().rule, "area_not_deprecated");

        datum.deprecated = true;
        check(&tables, datum.clone()).unwrap();
        tables.vertical_datums.insert(datum.key.clone(), datum);

        let mut crs = tables.vertical_crs[&epsg("5773")].clone();
        crs.key = epsg("5714");
        crs.name = "MSL height".to_string();
        crs.datum = epsg("5100");
        let err = check(&tables, crs.clone()).unwrap_err();
        assert_eq!(err.rule, "vertical_crs_datum_not_deprecated");
        assert!(err.message.contains("vertical_datum EPSG:5100"));

        crs.datum = epsg("5171");
        check(&tables, crs).unwrap();

        let fresh = VerticalDatum {
            key: epsg("5101"),
            name: "Ordnance Datum Newlyn".to_string(),
            area: epsg("1262"),
            ..Default::default()
        };
        check(&tables, fresh).unwrap();
    }

    #[test]
    fn test_compound_horizontal_must_be_2d() {
        let tables = fixture_tables();
        let mut compound = tables.compound_crs[&epsg("9707")].clone();
        compound.key = epsg("9708");
        compound.horizontal_crs = epsg("4979");
        let err = check(&tables, compound.clone()).unwrap_err();
        assert_eq!(err.rule, "compound_crs_components_valid");
        assert!(err.message.contains("geographic 2D or projected"));

        compound.horizontal_crs = epsg("3857");
        check(&tables, compound.clone()).unwrap();

        compound.vertical_crs = epsg("4326");
        assert_eq!(
            check(&tables, compound).unwrap_err().rule,
            "compound_crs_components_valid"
        );
    }

    #[test]
    fn test_link_targets_must_exist() {
        let tables = fixture_tables();
        let helmert = |code: &str| ObjectRef::new(Kind::HelmertTransformation, epsg(code));

        let mut alias = AliasName {
            object: helmert("1149"),
            alt_name: "ETRS89 to WGS 84 (1)".to_string(),
            source: None,
        };
        check(&tables, alias.clone()).unwrap();
        alias.object = helmert("1234");
        assert_eq!(check(&tables, alias).unwrap_err().rule, "alias_target_exists");

        let mut supersession = Supersession {
            kind: Kind::HelmertTransformation,
            superseded: epsg("1149"),
            replacement: epsg("1671"),
            source: None,
            same_source_target_crs: false,
        };
        check(&tables, supersession.clone()).unwrap();
        supersession.replacement = epsg("1234");
        let err = check(&tables, supersession).unwrap_err();
        assert_eq!(err.rule, "supersession_ends_exist");
        assert!(err.message.contains("replacement EPSG:1234"));

        let mut deprecation = Deprecation {
            kind: Kind::HelmertTransformation,
            deprecated: epsg("1149"),
            replacement: epsg("1671"),
            source: None,
        };
        check(&tables, deprecation.clone()).unwrap();
        deprecation.deprecated = epsg("1234");
        assert_eq!(
            check(&tables, deprecation).unwrap_err().rule,
            "deprecation_ends_exist"
        );
    }

    #[test]
    fn test_rule_order_is_stable() {
        let names = rule_names(&Record::from(sphere_like(None, None)));
        assert_eq!(names[0], "identity_complete");
        assert!(names.contains(&"ellipsoid_shape_exclusive"));
    }

    proptest! {
        #[test]
        fn prop_ellipsoid_shape_is_exclusive(
            rf in proptest::option::of(1.0f64..1000.0),
            b in proptest::option::of(6_000_000.0f64..6_378_137.0),
        ) {
            let tables = fixture_tables();
            let result = check(&tables, sphere_like(rf, b));
            prop_assert_eq!(result.is_ok(), rf.is_some() != b.is_some());
            if let Err(err) = result {
                prop_assert_eq!(err.rule, "ellipsoid_shape_exclusive");
            }
        }
    }
}
