//! Format constants and decoder limits for registry snapshots.
//!
//! Every length read from untrusted input is checked against one of these
//! bounds before anything is allocated.

/// Magic bytes of an uncompressed snapshot.
pub const MAGIC_UNCOMPRESSED: &[u8; 4] = b"CRSR";

/// Magic bytes of a zstd-compressed snapshot.
pub const MAGIC_COMPRESSED: &[u8; 5] = b"CRSRZ";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

/// Oldest format version the decoder accepts.
pub const MIN_FORMAT_VERSION: u8 = 1;

/// Maximum bytes in a varint.
pub const MAX_VARINT_BYTES: usize = 10;

/// Maximum uncompressed snapshot size (256 MiB).
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;

/// Maximum number of records in one snapshot.
pub const MAX_RECORDS: usize = 4_000_000;

/// Maximum string length. Text definitions (WKT/PROJ strings) are the
/// longest strings in the catalog.
pub const MAX_STRING_LEN: usize = 1024 * 1024;

/// Maximum number of entries in the authority dictionary.
pub const MAX_DICT_SIZE: usize = 65_536;

/// Maximum allowed authorities in one preference record.
pub const MAX_ALLOWED_AUTHORITIES: usize = 64;
