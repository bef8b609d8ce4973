//! Binary encoding/decoding of registry snapshots.

pub mod primitives;
pub mod snapshot;

pub use primitives::{Reader, Writer};
pub use snapshot::{decode_batch, decompress, encode_snapshot, encode_snapshot_compressed};
