//! Prints a summary of an encoded registry snapshot.
//!
//! Usage: `cargo run --example inspect_snapshot -- <snapshot.crsr> [AUTH:CODE AUTH:CODE]`
//!
//! With a source and target CRS, also lists the ranked operations between them.

use std::fs;

use crs_registry::model::{format_digest, ObjectKey};
use crs_registry::store::ALL_KINDS;
use crs_registry::{CatalogObject, RegistryConfig, SearchOptions, Snapshot};

fn parse_key(s: &str) -> ObjectKey {
    ObjectKey::parse(s).unwrap_or_else(|| panic!("expected AUTH:CODE, got {s}"))
}

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().expect("usage: inspect_snapshot <file> [source target]");

    println!("Reading: {}", path);
    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let snapshot = Snapshot::from_bytes(&data, RegistryConfig::default()).expect("Failed to load");
    let digest = snapshot.digest().expect("Failed to digest");

    println!("\n=== Snapshot ===");
    println!("Digest: {}", format_digest(&digest));
    println!("Authorities: {}", snapshot.authority_list().join(", "));

    println!("\n=== Records ({}) ===", snapshot.tables().total_len());
    for kind in ALL_KINDS {
        let n = snapshot.tables().len_of(kind);
        if n > 0 {
            println!("  {:<28} {}", kind, n);
        }
    }

    if let (Some(source), Some(target)) = (args.next(), args.next()) {
        let (source, target) = (parse_key(&source), parse_key(&target));
        let chains = snapshot
            .get_operations_between(&source, &target, &SearchOptions::default())
            .expect("Failed to resolve");

        println!("\n=== Operations {} -> {} ({}) ===", source, target, chains.len());
        for chain in &chains {
            let accuracy = chain
                .accuracy
                .map_or_else(|| "unknown".to_string(), |a| format!("{a} m"));
            println!("  {:?} (accuracy {}, deprecated: {})", chain.origin, accuracy, chain.deprecated);
            for step in &chain.steps {
                let name = snapshot
                    .get(step.operation.kind, &step.operation.key.authority, &step.operation.key.code)
                    .ok()
                    .and_then(|op| op.name().map(str::to_string))
                    .unwrap_or_default();
                let direction = if step.reversed { "reversed" } else { "forward" };
                println!("    {} \"{}\" {} -> {} ({})", step.operation, name, step.source, step.target, direction);
            }
        }
    }
}
