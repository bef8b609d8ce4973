//! Error types for loading, querying and snapshot encoding/decoding.

use thiserror::Error;

use crate::model::{Kind, ObjectKey};

/// A record was rejected by a validation rule.
///
/// Any validation error aborts the load it occurred in; the store never
/// publishes a partially valid snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("insert on {kind} violates constraint: {message} [rule `{rule}`, record {key}]")]
pub struct ValidationError {
    /// Name of the violated rule.
    pub rule: &'static str,
    /// Kind of the rejected record.
    pub kind: Kind,
    /// Identity of the rejected record.
    pub key: String,
    pub message: String,
}

/// Errors returned by read-only queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{kind} {key} not found")]
    NotFound { kind: Kind, key: ObjectKey },

    #[error("CRS {0} not found")]
    CrsNotFound(ObjectKey),
}

/// Snapshot decode error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Invalid magic/version
    InvalidMagicOrVersion,
    /// E002: Index out of bounds
    IndexOutOfBounds,
    /// E004: Invalid UTF-8 encoding
    InvalidUtf8,
    /// E005: Malformed varint/length/tag/encoding
    MalformedEncoding,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMagicOrVersion => "E001",
            ErrorCode::IndexOutOfBounds => "E002",
            ErrorCode::InvalidUtf8 => "E004",
            ErrorCode::MalformedEncoding => "E005",
        }
    }
}

/// Error while decoding a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === E001: Invalid magic/version ===
    #[error("[E001] invalid magic bytes: expected CRSR or CRSRZ, found {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("[E001] unsupported version: {version}")]
    UnsupportedVersion { version: u8 },

    // === E002: Index out of bounds ===
    #[error("[E002] {dict} index {index} out of bounds (size: {size})")]
    IndexOutOfBounds {
        dict: &'static str,
        index: usize,
        size: usize,
    },

    // === E004: Invalid UTF-8 ===
    #[error("[E004] invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    // === E005: Malformed encoding ===
    #[error("[E005] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[E005] varint exceeds maximum length (10 bytes)")]
    VarintTooLong,

    #[error("[E005] varint overflow (value exceeds u64)")]
    VarintOverflow,

    #[error("[E005] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[E005] invalid record kind: {tag}")]
    InvalidRecordKind { tag: u8 },

    #[error("[E005] invalid {field} value: {value}")]
    InvalidEnumValue { field: &'static str, value: u8 },

    #[error("[E005] invalid presence tag {tag} for {field}")]
    InvalidPresenceTag { field: &'static str, tag: u8 },

    #[error("[E005] duplicate entry {value:?} in {dict} dictionary")]
    DuplicateDictionaryEntry { dict: &'static str, value: String },

    #[error("[E005] float value is NaN")]
    FloatIsNan,

    #[error("[E005] {count} trailing bytes after last record")]
    TrailingBytes { count: usize },

    // === Compression errors ===
    #[error("[E005] zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("[E005] decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::InvalidMagic { .. } | DecodeError::UnsupportedVersion { .. } => {
                ErrorCode::InvalidMagicOrVersion
            }
            DecodeError::IndexOutOfBounds { .. } => ErrorCode::IndexOutOfBounds,
            DecodeError::InvalidUtf8 { .. } => ErrorCode::InvalidUtf8,
            _ => ErrorCode::MalformedEncoding,
        }
    }
}

/// Error while encoding a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),
}

/// Error while turning snapshot bytes into a published snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Error reported by a projection or grid collaborator, or while assembling
/// the request handed to one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    #[error("no implementation for method '{0}'")]
    UnsupportedMethod(String),

    #[error("parameter '{0}' is missing or has no unit factor")]
    MissingParameter(String),

    #[error("point ({x}, {y}) is outside the domain of the operation")]
    OutOfDomain { x: f64, y: f64 },

    #[error("grid {0} has no distributable alternative")]
    GridUnavailable(String),

    #[error("grid {name} could not be opened: {reason}")]
    GridOpenFailed { name: String, reason: String },

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Error while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
