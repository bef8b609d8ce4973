//! Geodetic reference-system registry.
//!
//! This crate holds a validated catalog of coordinate reference systems,
//! datums, ellipsoids, prime meridians, units, areas of use and the
//! coordinate operations relating CRSs, and resolves the ranked set of
//! operations between any two CRSs.
//!
//! # Overview
//!
//! The registry is bulk-loaded and read-mostly:
//! - **Validated**: every record passes the named rules of its kind before
//!   it is admitted; a batch is admitted whole or not at all
//! - **Immutable snapshots**: publishing freezes the tables and builds the
//!   lookup indices; snapshots are shared across threads without locking
//! - **Explicit ranking**: authority preferences are resolver inputs, never
//!   global state
//!
//! # Quick Start
//!
//! ```rust
//! use crs_registry::model::{BatchBuilder, Kind, ObjectKey, UnitKind, UnitOfMeasure};
//! use crs_registry::EntityStore;
//!
//! let epsg = |code: &str| ObjectKey::new("EPSG", code);
//! let batch = BatchBuilder::new("units")
//!     .record(UnitOfMeasure::new(epsg("9001"), "metre", UnitKind::Length, Some(1.0)))
//!     .alias(Kind::UnitOfMeasure, epsg("9001"), "meter")
//!     .build();
//!
//! let mut store = EntityStore::default();
//! store.load(batch).unwrap();
//! let snapshot = store.publish();
//!
//! assert_eq!(snapshot.resolve_alias("METER")[0].key, epsg("9001"));
//! let bytes = snapshot.to_bytes().unwrap();
//! assert_eq!(&bytes[..4], b"CRSR");
//! ```
//!
//! # Modules
//!
//! - [`model`]: Record types, keys, kinds and batches
//! - [`validate`]: Per-kind validation rules
//! - [`store`]: The entity store and published snapshots
//! - [`view`]: Polymorphic views over CRSs, operations and any keyed record
//! - [`index`]: Name, history and resolver graph indices
//! - [`resolve`]: Operation resolution and ranking
//! - [`codec`]: Binary snapshot encoding/decoding with compression support
//! - [`registry`]: Atomically swappable shared registry handle
//! - [`collab`]: Interfaces to projection and grid implementations
//! - [`config`]: Registry configuration
//! - [`error`]: Error types
//! - [`limits`]: Security limits for decoding
//!
//! # Security
//!
//! The snapshot decoder is designed to safely handle untrusted input:
//! - All allocations are bounded by configurable limits
//! - Varints are limited to prevent overflow
//! - Every decoded record is re-validated before it is published
//!
//! # Wire Format
//!
//! Snapshots use a binary format with optional zstd compression:
//! - Uncompressed: `CRSR` magic + version + authority dictionary + records
//! - Compressed: `CRSRZ` magic + uncompressed size + zstd data
//!
//! The decoder automatically detects and handles both formats.

pub mod codec;
pub mod collab;
pub mod config;
pub mod error;
pub mod index;
pub mod limits;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod validate;
pub mod view;

#[cfg(test)]
mod test_support;

// Re-export commonly used types at crate root
pub use codec::{decode_batch, encode_snapshot, encode_snapshot_compressed};
pub use config::{RegistryConfig, ResolverConfig, ValidatorConfig};
pub use error::{
    CollaboratorError, ConfigError, DecodeError, EncodeError, QueryError, SnapshotError,
    ValidationError,
};
pub use model::{Batch, BoundingBox, Kind, ObjectKey, ObjectRef, Record};
pub use registry::Registry;
pub use resolve::{find_operations, ChainOrigin, ChainStep, OperationChain, SearchOptions};
pub use store::{EntityStore, LoadReport, Snapshot};
pub use view::{AnyObject, CatalogObject, CrsRef, OperationRef};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the snapshot wire format this crate reads and writes.
pub const FORMAT_VERSION: u8 = limits::FORMAT_VERSION;
