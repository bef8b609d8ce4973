//! Benchmark for the registry using a synthetic catalog.
//!
//! Builds `N` zones (default 2000), each with its own datum, geographic CRS,
//! Helmert transformation to WGS 84, Transverse Mercator projected CRS and
//! preferred hub, then times loading, publishing, snapshot encoding and
//! decoding, and operation resolution. A JSON report is printed last.

use std::time::{Duration, Instant};

use crs_registry::model::{
    Axis, BatchBuilder, BoundingBox, ConversionMethod, CoordinateOperationMethod, CoordinateSystem,
    CsType, Ellipsoid, Extent, GeodeticCrs, GeodeticCrsType, GeodeticDatum, ObjectKey, Parameter,
    PrimeMeridian, ProjectedCrs, UnitKind, UnitOfMeasure,
};
use crs_registry::{
    Batch, EntityStore, RegistryConfig, SearchOptions, Snapshot, decode_batch,
    encode_snapshot_compressed,
};
use serde::Serialize;
use tracing::{info, Level};

// =============================================================================
// SYNTHETIC CATALOG
// =============================================================================

fn epsg(code: &str) -> ObjectKey {
    ObjectKey::new("EPSG", code)
}

fn bench(kind: &str, i: usize) -> ObjectKey {
    ObjectKey::new("BENCH", format!("{kind}{i}"))
}

fn axis(code: &str, name: &str, cs: &str, order: u8, unit: &str) -> Axis {
    Axis {
        key: epsg(code),
        name: name.to_string(),
        abbreviation: name[..1].to_string(),
        orientation: if order == 1 { "north" } else { "east" }.to_string(),
        coordinate_system: epsg(cs),
        order,
        unit: epsg(unit),
    }
}

/// Units, WGS 84 and the methods every zone shares.
fn base_catalog() -> Batch {
    let method = |code: &str, name: &str| CoordinateOperationMethod {
        key: epsg(code),
        name: name.to_string(),
        deprecated: false,
    };
    let parameter = |code: &str, name: &str| Parameter {
        key: epsg(code),
        name: name.to_string(),
        deprecated: false,
    };

    BatchBuilder::new("base")
        .record(UnitOfMeasure::new(epsg("9001"), "metre", UnitKind::Length, Some(1.0)))
        .record(UnitOfMeasure::new(epsg("9122"), "degree", UnitKind::Angle, Some(0.017453292519943295)))
        .record(UnitOfMeasure::new(epsg("9201"), "unity", UnitKind::Scale, Some(1.0)))
        .record(Ellipsoid {
            key: epsg("7030"),
            name: "WGS 84".to_string(),
            celestial_body: ObjectKey::new("PROJ", "EARTH"),
            semi_major_axis: 6_378_137.0,
            unit: epsg("9001"),
            inv_flattening: Some(298.257223563),
            semi_minor_axis: None,
            deprecated: false,
        })
        .record(PrimeMeridian {
            key: epsg("8901"),
            name: "Greenwich".to_string(),
            longitude: 0.0,
            unit: epsg("9122"),
            deprecated: false,
        })
        .record(Extent::new(epsg("1262"), "World", BoundingBox::world()))
        .record(GeodeticDatum {
            key: epsg("6326"),
            name: "World Geodetic System 1984".to_string(),
            ellipsoid: epsg("7030"),
            prime_meridian: epsg("8901"),
            area: epsg("1262"),
            publication_date: None,
            frame_reference_epoch: None,
            deprecated: false,
        })
        .record(CoordinateSystem::new(epsg("6422"), CsType::Ellipsoidal, 2))
        .record(CoordinateSystem::new(epsg("4400"), CsType::Cartesian, 2))
        .record(axis("106", "Latitude", "6422", 1, "9122"))
        .record(axis("107", "Longitude", "6422", 2, "9122"))
        .record(axis("1", "Northing", "4400", 1, "9001"))
        .record(axis("2", "Easting", "4400", 2, "9001"))
        .record(GeodeticCrs::structured(
            epsg("4326"),
            "WGS 84",
            GeodeticCrsType::Geographic2D,
            epsg("6422"),
            epsg("6326"),
            epsg("1262"),
        ))
        .record(ConversionMethod {
            key: epsg("9807"),
            name: "Transverse Mercator".to_string(),
            deprecated: false,
        })
        .record(method("9603", "Geocentric translations (geog2D domain)"))
        .record(parameter("8801", "Latitude of natural origin"))
        .record(parameter("8802", "Longitude of natural origin"))
        .record(parameter("8805", "Scale factor at natural origin"))
        .record(parameter("8806", "False easting"))
        .record(parameter("8807", "False northing"))
        .build()
}

/// Zone `i` spans 30 degrees of longitude, so neighbouring zones overlap
/// and can be joined through the WGS 84 hub.
fn zone_catalog(zones: usize) -> Batch {
    let mut builder = BatchBuilder::new("zones");
    for i in 0..zones {
        let west = -180.0 + (i % 150) as f64;
        let area = bench("area", i);
        builder = builder
            .record(Extent::new(
                area.clone(),
                format!("Zone {i}"),
                BoundingBox::new(-80.0, 84.0, west, west + 30.0),
            ))
            .record(GeodeticDatum {
                key: bench("datum", i),
                name: format!("Synthetic datum {i}"),
                ellipsoid: epsg("7030"),
                prime_meridian: epsg("8901"),
                area: area.clone(),
                publication_date: None,
                frame_reference_epoch: None,
                deprecated: false,
            })
            .record(GeodeticCrs::structured(
                bench("geog", i),
                format!("Synthetic {i}"),
                GeodeticCrsType::Geographic2D,
                epsg("6422"),
                bench("datum", i),
                area.clone(),
            ))
            .helmert(
                bench("helmert", i),
                format!("Synthetic {i} to WGS 84"),
                epsg("9603"),
                (bench("geog", i), epsg("4326")),
                area.clone(),
                |h| {
                    h.translation([i as f64 * 0.01, -1.5, 2.0], epsg("9001"))
                        .accuracy(1.0 + (i % 7) as f64)
                },
            )
            .conversion(
                bench("tm", i),
                format!("Synthetic TM zone {i}"),
                epsg("9807"),
                area.clone(),
                |c| {
                    c.param(epsg("8801"), 0.0, epsg("9122"))
                        .param(epsg("8802"), west + 15.0, epsg("9122"))
                        .param(epsg("8805"), 0.9996, epsg("9201"))
                        .param(epsg("8806"), 500_000.0, epsg("9001"))
                        .param(epsg("8807"), 0.0, epsg("9001"))
                },
            )
            .record(ProjectedCrs::structured(
                bench("proj", i),
                format!("Synthetic {i} / TM zone {i}"),
                bench("geog", i),
                bench("tm", i),
                epsg("4400"),
                area,
            ))
            .hub(bench("datum", i), epsg("6326"))
            .alias(crs_registry::Kind::GeodeticCrs, bench("geog", i), format!("SYN{i}"));
    }
    builder.build()
}

// =============================================================================
// REPORT
// =============================================================================

#[derive(Debug, Serialize)]
struct Report {
    zones: usize,
    records: usize,
    load_ms: f64,
    publish_ms: f64,
    encode: CodecReport,
    resolve: ResolveReport,
}

#[derive(Debug, Serialize)]
struct CodecReport {
    uncompressed_bytes: usize,
    compressed_bytes: usize,
    encode_ms: f64,
    compress_ms: f64,
    decode_ms: f64,
    reload_ms: f64,
    digest: String,
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    requests: usize,
    chains: usize,
    total_ms: f64,
    mean_us: f64,
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn resolve_all(snapshot: &Snapshot, zones: usize) -> ResolveReport {
    let options = SearchOptions::default();
    let mut requests = 0;
    let mut chains = 0;
    let start = Instant::now();
    for i in 0..zones.saturating_sub(1) {
        let pairs = [
            (bench("geog", i), bench("geog", i + 1)),
            (bench("geog", i), bench("proj", i)),
            (bench("proj", i), epsg("4326")),
        ];
        for (source, target) in &pairs {
            let found = snapshot
                .get_operations_between(source, target, &options)
                .expect("Failed to resolve");
            requests += 1;
            chains += found.len();
        }
    }
    let total = start.elapsed();
    ResolveReport {
        requests,
        chains,
        total_ms: ms(total),
        mean_us: total.as_secs_f64() * 1e6 / requests.max(1) as f64,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let zones: usize = std::env::args()
        .nth(1)
        .map(|s| s.parse().expect("zone count must be a number"))
        .unwrap_or(2000);

    let base = base_catalog();
    let catalog = zone_catalog(zones);
    let records = base.len() + catalog.len();
    println!("Synthetic catalog: {zones} zones, {records} records");

    // Load
    let load_start = Instant::now();
    let mut store = EntityStore::new(RegistryConfig::default());
    store.load(base).expect("Failed to load base catalog");
    let report = store.load(catalog).expect("Failed to load zones");
    let load_time = load_start.elapsed();
    info!(loaded = report.loaded, deferred = report.deferred_checked, "catalog loaded");
    println!(
        "\nLoad: {} records in {:?} ({:.0} records/s)",
        store.len(),
        load_time,
        store.len() as f64 / load_time.as_secs_f64()
    );

    // Publish
    let publish_start = Instant::now();
    let snapshot = store.publish();
    let publish_time = publish_start.elapsed();
    println!("Publish (indices): {:?}", publish_time);

    // Encode
    let encode_start = Instant::now();
    let encoded = snapshot.to_bytes().expect("Failed to encode");
    let encode_time = encode_start.elapsed();
    println!(
        "\nUncompressed: {} bytes in {:?}\n  Throughput: {:.2} MB/s",
        encoded.len(),
        encode_time,
        (encoded.len() as f64 / 1_000_000.0) / encode_time.as_secs_f64()
    );

    let compress_start = Instant::now();
    let compressed = encode_snapshot_compressed(&snapshot, 3).expect("Failed to compress");
    let compress_time = compress_start.elapsed();
    println!(
        "Compressed (level 3): {} bytes in {:?}\n  Compression ratio: {:.1}x",
        compressed.len(),
        compress_time,
        encoded.len() as f64 / compressed.len() as f64
    );

    // Decode
    let decode_start = Instant::now();
    let batch = decode_batch(&compressed).expect("Failed to decode");
    let decode_time = decode_start.elapsed();
    assert_eq!(batch.len(), snapshot.tables().total_len());
    println!("\nDecode (compressed): {:?}", decode_time);

    let reload_start = Instant::now();
    let reloaded =
        Snapshot::from_bytes(&encoded, RegistryConfig::default()).expect("Failed to reload");
    let reload_time = reload_start.elapsed();
    println!("Decode + validate + publish: {:?}", reload_time);

    let digest = crs_registry::model::format_digest(&snapshot.digest().expect("Failed to digest"));
    let reloaded_digest =
        crs_registry::model::format_digest(&reloaded.digest().expect("Failed to digest"));
    assert_eq!(digest, reloaded_digest, "Reloaded snapshot should have the same digest");

    // Resolve
    let resolve = resolve_all(&snapshot, zones);
    println!(
        "\nResolve: {} requests, {} chains in {:.1} ms ({:.1} us/request)",
        resolve.requests, resolve.chains, resolve.total_ms, resolve.mean_us
    );

    let report = Report {
        zones,
        records: snapshot.tables().total_len(),
        load_ms: ms(load_time),
        publish_ms: ms(publish_time),
        encode: CodecReport {
            uncompressed_bytes: encoded.len(),
            compressed_bytes: compressed.len(),
            encode_ms: ms(encode_time),
            compress_ms: ms(compress_time),
            decode_ms: ms(decode_time),
            reload_ms: ms(reload_time),
            digest,
        },
        resolve,
    };
    println!("\n=== Report ===");
    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("Failed to serialize report")
    );
}
