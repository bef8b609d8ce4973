//! Snapshot encoding/decoding.
//!
//! Layout of an uncompressed snapshot:
//!
//! ```text
//! "CRSR" version:u8
//! authority_count:varint authority:string*
//! record_count:varint (tag:u8 payload)*
//! ```
//!
//! Keys are written as an index into the authority dictionary followed by
//! the code. Optional fields carry a presence byte; optional flags are a
//! single byte (0 absent, 1 false, 2 true). Records appear in load order,
//! so decoding yields a batch the store can load as is.
//!
//! A compressed snapshot is `"CRSRZ"`, the uncompressed size as a varint,
//! then the zstd-compressed uncompressed snapshot.

use std::io::Read;

use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::debug;

use crate::codec::primitives::{Reader, Writer, ABSENT, PRESENT};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    FORMAT_VERSION, MAGIC_COMPRESSED, MAGIC_UNCOMPRESSED, MAX_ALLOWED_AUTHORITIES, MAX_DICT_SIZE,
    MAX_RECORDS, MAX_SNAPSHOT_SIZE, MAX_STRING_LEN, MIN_FORMAT_VERSION,
};
use crate::model::{
    AliasName, AuthorityPreference, Axis, Batch, BoundingBox, CelestialBody, CompoundCrs,
    ConcatenatedOperation, Conversion, ConversionMethod, CoordinateOperationMethod,
    CoordinateSystem, CsType, Deprecation, Ellipsoid, Extent, GeodeticCrs, GeodeticCrsType,
    GeodeticDatum, GridAlternative, GridFormat, GridMethod, GridPackage, GridTransformation,
    HelmertTransformation, Kind, ObjectKey, ObjectRef, OtherTransformation, Parameter,
    ParameterValue, PreferredHub, PrimeMeridian, ProjectedCrs, Quantity, Record, Supersession,
    UnitKind, UnitOfMeasure, VerticalCrs, VerticalDatum, MAX_PARAMETERS, MAX_STEPS,
};
use crate::store::Snapshot;

// =============================================================================
// DECODING
// =============================================================================

/// Decompresses a `CRSRZ` snapshot, returning the uncompressed bytes.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if input.len() < MAGIC_COMPRESSED.len() {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }
    if &input[..MAGIC_COMPRESSED.len()] != MAGIC_COMPRESSED {
        return Err(invalid_magic(input));
    }
    decompress_zstd(&input[MAGIC_COMPRESSED.len()..])
}

/// Decodes a snapshot, compressed or not, into a batch of records in load
/// order.
///
/// The records are not validated; load the batch into a store for that.
pub fn decode_batch(input: &[u8]) -> Result<Batch, DecodeError> {
    if input.len() < MAGIC_UNCOMPRESSED.len() {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }

    if input.starts_with(MAGIC_COMPRESSED) {
        let decompressed = decompress_zstd(&input[MAGIC_COMPRESSED.len()..])?;
        decode_uncompressed(&decompressed)
    } else if input.starts_with(MAGIC_UNCOMPRESSED) {
        if input.len() > MAX_SNAPSHOT_SIZE {
            return Err(DecodeError::LengthExceedsLimit {
                field: "snapshot",
                len: input.len(),
                max: MAX_SNAPSHOT_SIZE,
            });
        }
        decode_uncompressed(input)
    } else {
        Err(invalid_magic(input))
    }
}

fn invalid_magic(input: &[u8]) -> DecodeError {
    let mut found = [0u8; 4];
    found.copy_from_slice(&input[..4]);
    DecodeError::InvalidMagic { found }
}

fn decompress_zstd(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(compressed);
    let declared_size = reader.read_len(MAX_SNAPSHOT_SIZE, "uncompressed_size")?;

    let mut decoder = zstd::Decoder::new(reader.remaining())
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    // One byte past the declared size is enough to detect a lying header.
    let mut decompressed = Vec::with_capacity(declared_size);
    (&mut decoder)
        .take(declared_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}

fn decode_uncompressed(input: &[u8]) -> Result<Batch, DecodeError> {
    if input.len() < MAGIC_UNCOMPRESSED.len() {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }
    if !input.starts_with(MAGIC_UNCOMPRESSED) {
        return Err(invalid_magic(input));
    }
    let mut reader = Reader::new(input);
    reader.read_bytes(MAGIC_UNCOMPRESSED.len(), "magic")?;

    let version = reader.read_byte("version")?;
    if !(MIN_FORMAT_VERSION..=FORMAT_VERSION).contains(&version) {
        return Err(DecodeError::UnsupportedVersion { version });
    }

    let authority_count = reader.read_len(MAX_DICT_SIZE, "authorities")?;
    let mut authorities = Vec::with_capacity(authority_count);
    let mut seen = FxHashSet::with_capacity_and_hasher(authority_count, Default::default());
    for _ in 0..authority_count {
        let authority = reader.read_string(MAX_STRING_LEN, "authority")?;
        if !seen.insert(authority.clone()) {
            return Err(DecodeError::DuplicateDictionaryEntry {
                dict: "authorities",
                value: authority,
            });
        }
        authorities.push(authority);
    }

    let record_count = reader.read_len(MAX_RECORDS, "records")?;
    let mut decoder = Decoder {
        reader,
        authorities,
    };
    // Every record takes at least two bytes; don't trust the count beyond that.
    let mut batch = Batch::with_name("snapshot");
    batch
        .records
        .reserve(record_count.min(decoder.reader.remaining_len() / 2));
    for _ in 0..record_count {
        batch.records.push(decoder.record()?);
    }

    if !decoder.reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            count: decoder.reader.remaining_len(),
        });
    }

    debug!(
        records = batch.len(),
        authorities = decoder.authorities.len(),
        "decoded snapshot"
    );
    Ok(batch)
}

struct Decoder<'a> {
    reader: Reader<'a>,
    authorities: Vec<String>,
}

impl Decoder<'_> {
    fn key(&mut self, field: &'static str) -> Result<ObjectKey, DecodeError> {
        let index = self.reader.read_len(usize::MAX, field)?;
        let authority = self
            .authorities
            .get(index)
            .ok_or(DecodeError::IndexOutOfBounds {
                dict: "authorities",
                index,
                size: self.authorities.len(),
            })?
            .clone();
        let code = self.string(field)?;
        Ok(ObjectKey { authority, code })
    }

    fn opt_key(&mut self, field: &'static str) -> Result<Option<ObjectKey>, DecodeError> {
        if self.reader.read_presence(field)? {
            self.key(field).map(Some)
        } else {
            Ok(None)
        }
    }

    fn string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        self.reader.read_string(MAX_STRING_LEN, field)
    }

    fn opt_string(&mut self, field: &'static str) -> Result<Option<String>, DecodeError> {
        self.reader.read_opt_string(MAX_STRING_LEN, field)
    }

    fn f64(&mut self, field: &'static str) -> Result<f64, DecodeError> {
        self.reader.read_f64(field)
    }

    fn opt_f64(&mut self, field: &'static str) -> Result<Option<f64>, DecodeError> {
        self.reader.read_opt_f64(field)
    }

    fn bool(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        self.reader.read_bool(field)
    }

    fn opt_bool(&mut self, field: &'static str) -> Result<Option<bool>, DecodeError> {
        self.reader.read_opt_bool(field)
    }

    fn enum_value<T>(
        &mut self,
        field: &'static str,
        from_u8: fn(u8) -> Option<T>,
    ) -> Result<T, DecodeError> {
        let value = self.reader.read_byte(field)?;
        from_u8(value).ok_or(DecodeError::InvalidEnumValue { field, value })
    }

    fn kind(&mut self) -> Result<Kind, DecodeError> {
        self.enum_value("kind", Kind::from_u8)
    }

    fn vec3(&mut self, field: &'static str) -> Result<[f64; 3], DecodeError> {
        Ok([self.f64(field)?, self.f64(field)?, self.f64(field)?])
    }

    fn quantity3(&mut self, field: &'static str) -> Result<Quantity<[f64; 3]>, DecodeError> {
        let value = self.vec3(field)?;
        Ok(Quantity::new(value, self.key(field)?))
    }

    fn quantity1(&mut self, field: &'static str) -> Result<Quantity<f64>, DecodeError> {
        let value = self.f64(field)?;
        Ok(Quantity::new(value, self.key(field)?))
    }

    fn opt_quantity3(&mut self, field: &'static str) -> Result<Option<Quantity<[f64; 3]>>, DecodeError> {
        if self.reader.read_presence(field)? {
            self.quantity3(field).map(Some)
        } else {
            Ok(None)
        }
    }

    fn opt_quantity1(&mut self, field: &'static str) -> Result<Option<Quantity<f64>>, DecodeError> {
        if self.reader.read_presence(field)? {
            self.quantity1(field).map(Some)
        } else {
            Ok(None)
        }
    }

    fn params(&mut self) -> Result<Vec<ParameterValue>, DecodeError> {
        let count = self.reader.read_len(MAX_PARAMETERS, "params")?;
        let mut params = Vec::with_capacity(count);
        for _ in 0..count {
            let parameter = self.key("parameter")?;
            let value = self.f64("parameter_value")?;
            let unit = self.key("parameter_unit")?;
            params.push(ParameterValue::new(parameter, value, unit));
        }
        Ok(params)
    }

    fn record(&mut self) -> Result<Record, DecodeError> {
        let tag = self.reader.read_byte("record_kind")?;
        let kind = Kind::from_u8(tag).ok_or(DecodeError::InvalidRecordKind { tag })?;
        let record = match kind {
            Kind::UnitOfMeasure => UnitOfMeasure {
                key: self.key("key")?,
                name: self.string("name")?,
                unit_kind: self.enum_value("unit_kind", UnitKind::from_u8)?,
                conv_factor: self.opt_f64("conv_factor")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::CelestialBody => CelestialBody {
                key: self.key("key")?,
                name: self.string("name")?,
                semi_major_axis: self.f64("semi_major_axis")?,
            }
            .into(),
            Kind::Ellipsoid => Ellipsoid {
                key: self.key("key")?,
                name: self.string("name")?,
                celestial_body: self.key("celestial_body")?,
                semi_major_axis: self.f64("semi_major_axis")?,
                unit: self.key("unit")?,
                inv_flattening: self.opt_f64("inv_flattening")?,
                semi_minor_axis: self.opt_f64("semi_minor_axis")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::Extent => Extent {
                key: self.key("key")?,
                name: self.string("name")?,
                description: self.string("description")?,
                bbox: BoundingBox {
                    south: self.f64("south_lat")?,
                    north: self.f64("north_lat")?,
                    west: self.f64("west_lon")?,
                    east: self.f64("east_lon")?,
                },
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::PrimeMeridian => PrimeMeridian {
                key: self.key("key")?,
                name: self.string("name")?,
                longitude: self.f64("longitude")?,
                unit: self.key("unit")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::GeodeticDatum => GeodeticDatum {
                key: self.key("key")?,
                name: self.string("name")?,
                ellipsoid: self.key("ellipsoid")?,
                prime_meridian: self.key("prime_meridian")?,
                area: self.key("area")?,
                publication_date: self.opt_string("publication_date")?,
                frame_reference_epoch: self.opt_f64("frame_reference_epoch")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::VerticalDatum => VerticalDatum {
                key: self.key("key")?,
                name: self.string("name")?,
                area: self.key("area")?,
                publication_date: self.opt_string("publication_date")?,
                frame_reference_epoch: self.opt_f64("frame_reference_epoch")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::CoordinateSystem => CoordinateSystem {
                key: self.key("key")?,
                cs_type: self.enum_value("cs_type", CsType::from_u8)?,
                dimension: self.reader.read_byte("dimension")?,
            }
            .into(),
            Kind::Axis => Axis {
                key: self.key("key")?,
                name: self.string("name")?,
                abbreviation: self.string("abbreviation")?,
                orientation: self.string("orientation")?,
                coordinate_system: self.key("coordinate_system")?,
                order: self.reader.read_byte("order")?,
                unit: self.key("unit")?,
            }
            .into(),
            Kind::GeodeticCrs => GeodeticCrs {
                key: self.key("key")?,
                name: self.string("name")?,
                crs_type: self.enum_value("crs_type", GeodeticCrsType::from_u8)?,
                coordinate_system: self.opt_key("coordinate_system")?,
                datum: self.opt_key("datum")?,
                area: self.opt_key("area")?,
                text_definition: self.opt_string("text_definition")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::ProjectedCrs => ProjectedCrs {
                key: self.key("key")?,
                name: self.string("name")?,
                geodetic_crs: self.opt_key("geodetic_crs")?,
                conversion: self.opt_key("conversion")?,
                coordinate_system: self.opt_key("coordinate_system")?,
                area: self.opt_key("area")?,
                text_definition: self.opt_string("text_definition")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::VerticalCrs => VerticalCrs {
                key: self.key("key")?,
                name: self.string("name")?,
                coordinate_system: self.key("coordinate_system")?,
                datum: self.key("datum")?,
                area: self.key("area")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::CompoundCrs => CompoundCrs {
                key: self.key("key")?,
                name: self.string("name")?,
                horizontal_crs: self.key("horizontal_crs")?,
                vertical_crs: self.key("vertical_crs")?,
                area: self.key("area")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::ConversionMethod => ConversionMethod {
                key: self.key("key")?,
                name: self.string("name")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::CoordinateOperationMethod => CoordinateOperationMethod {
                key: self.key("key")?,
                name: self.string("name")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::Parameter => Parameter {
                key: self.key("key")?,
                name: self.string("name")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::Conversion => Conversion {
                key: self.key("key")?,
                name: self.string("name")?,
                method: self.key("method")?,
                params: self.params()?,
                area: self.key("area")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::HelmertTransformation => HelmertTransformation {
                key: self.key("key")?,
                name: self.string("name")?,
                method: self.key("method")?,
                source_crs: self.key("source_crs")?,
                target_crs: self.key("target_crs")?,
                area: self.key("area")?,
                accuracy: self.opt_f64("accuracy")?,
                translation: self.quantity3("translation")?,
                rotation: self.opt_quantity3("rotation")?,
                scale_difference: self.opt_quantity1("scale_difference")?,
                rate_translation: self.opt_quantity3("rate_translation")?,
                rate_rotation: self.opt_quantity3("rate_rotation")?,
                rate_scale_difference: self.opt_quantity1("rate_scale_difference")?,
                epoch: self.opt_quantity1("epoch")?,
                pivot: self.opt_quantity3("pivot")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::GridTransformation => GridTransformation {
                key: self.key("key")?,
                name: self.string("name")?,
                method: self.key("method")?,
                source_crs: self.key("source_crs")?,
                target_crs: self.key("target_crs")?,
                area: self.key("area")?,
                accuracy: self.opt_f64("accuracy")?,
                grid_name: self.string("grid_name")?,
                grid2_name: self.opt_string("grid2_name")?,
                interpolation_crs: self.opt_key("interpolation_crs")?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::OtherTransformation => OtherTransformation {
                key: self.key("key")?,
                name: self.string("name")?,
                method: self.key("method")?,
                source_crs: self.key("source_crs")?,
                target_crs: self.key("target_crs")?,
                area: self.key("area")?,
                accuracy: self.opt_f64("accuracy")?,
                params: self.params()?,
                deprecated: self.bool("deprecated")?,
            }
            .into(),
            Kind::ConcatenatedOperation => {
                let key = self.key("key")?;
                let name = self.string("name")?;
                let source_crs = self.key("source_crs")?;
                let target_crs = self.key("target_crs")?;
                let area = self.key("area")?;
                let accuracy = self.opt_f64("accuracy")?;
                let count = self.reader.read_len(MAX_STEPS, "steps")?;
                let mut steps = Vec::with_capacity(count);
                for _ in 0..count {
                    steps.push(self.key("step")?);
                }
                ConcatenatedOperation {
                    key,
                    name,
                    source_crs,
                    target_crs,
                    area,
                    accuracy,
                    steps,
                    deprecated: self.bool("deprecated")?,
                }
                .into()
            }
            Kind::GridPackage => GridPackage {
                package_name: self.string("package_name")?,
                description: self.opt_string("description")?,
                url: self.opt_string("url")?,
                direct_download: self.opt_bool("direct_download")?,
                open_license: self.opt_bool("open_license")?,
            }
            .into(),
            Kind::GridAlternative => GridAlternative {
                original_grid_name: self.string("original_grid_name")?,
                proj_grid_name: self.string("proj_grid_name")?,
                old_proj_grid_name: self.opt_string("old_proj_grid_name")?,
                format: self.enum_value("proj_grid_format", GridFormat::from_u8)?,
                method: self.enum_value("proj_method", GridMethod::from_u8)?,
                inverse_direction: self.bool("inverse_direction")?,
                package_name: self.opt_string("package_name")?,
                url: self.opt_string("url")?,
                direct_download: self.opt_bool("direct_download")?,
                open_license: self.opt_bool("open_license")?,
                directory: self.opt_string("directory")?,
            }
            .into(),
            Kind::PreferredHub => PreferredHub {
                source_datum: self.key("source_datum")?,
                hub_datum: self.key("hub_datum")?,
            }
            .into(),
            Kind::AuthorityPreference => {
                let source_authority = self.string("source_authority")?;
                let target_authority = self.string("target_authority")?;
                let count = self
                    .reader
                    .read_len(MAX_ALLOWED_AUTHORITIES, "allowed_authorities")?;
                let mut allowed_authorities = Vec::with_capacity(count);
                for _ in 0..count {
                    allowed_authorities.push(self.string("allowed_authority")?);
                }
                AuthorityPreference {
                    source_authority,
                    target_authority,
                    allowed_authorities,
                }
                .into()
            }
            Kind::AliasName => {
                let kind = self.kind()?;
                AliasName {
                    object: ObjectRef::new(kind, self.key("object")?),
                    alt_name: self.string("alt_name")?,
                    source: self.opt_string("source")?,
                }
                .into()
            }
            Kind::Supersession => Supersession {
                kind: self.kind()?,
                superseded: self.key("superseded")?,
                replacement: self.key("replacement")?,
                source: self.opt_string("source")?,
                same_source_target_crs: self.bool("same_source_target_crs")?,
            }
            .into(),
            Kind::Deprecation => Deprecation {
                kind: self.kind()?,
                deprecated: self.key("deprecated")?,
                replacement: self.key("replacement")?,
                source: self.opt_string("source")?,
            }
            .into(),
        };
        Ok(record)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a snapshot to its canonical uncompressed form.
///
/// The output only depends on the snapshot's records and their order, so
/// equal snapshots encode to equal bytes.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, EncodeError> {
    let records = snapshot.tables().records();
    if records.len() > MAX_RECORDS {
        return Err(EncodeError::LengthExceedsLimit {
            field: "records",
            len: records.len(),
            max: MAX_RECORDS,
        });
    }

    let mut encoder = Encoder::default();
    for record in &records {
        encoder.record(record)?;
    }
    if encoder.authorities.len() > MAX_DICT_SIZE {
        return Err(EncodeError::LengthExceedsLimit {
            field: "authorities",
            len: encoder.authorities.len(),
            max: MAX_DICT_SIZE,
        });
    }

    let mut writer = Writer::with_capacity(encoder.body.len() + 64);
    writer.write_bytes(MAGIC_UNCOMPRESSED);
    writer.write_byte(FORMAT_VERSION);
    writer.write_varint(encoder.authorities.len() as u64);
    for authority in &encoder.authorities {
        writer.write_string(authority);
    }
    writer.write_varint(records.len() as u64);
    writer.write_bytes(encoder.body.as_bytes());

    debug!(
        records = records.len(),
        authorities = encoder.authorities.len(),
        bytes = writer.len(),
        "encoded snapshot"
    );
    Ok(writer.into_bytes())
}

/// Encodes a snapshot with zstd compression at the given level.
pub fn encode_snapshot_compressed(snapshot: &Snapshot, level: i32) -> Result<Vec<u8>, EncodeError> {
    let uncompressed = encode_snapshot(snapshot)?;
    if uncompressed.len() > MAX_SNAPSHOT_SIZE {
        return Err(EncodeError::LengthExceedsLimit {
            field: "snapshot",
            len: uncompressed.len(),
            max: MAX_SNAPSHOT_SIZE,
        });
    }

    let compressed = zstd::encode_all(uncompressed.as_slice(), level)
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;

    let mut writer = Writer::with_capacity(MAGIC_COMPRESSED.len() + 10 + compressed.len());
    writer.write_bytes(MAGIC_COMPRESSED);
    writer.write_varint(uncompressed.len() as u64);
    writer.write_bytes(&compressed);

    Ok(writer.into_bytes())
}

#[derive(Default)]
struct Encoder {
    body: Writer,
    /// Authorities in first-use order; the position is the wire index.
    authorities: IndexSet<String, FxBuildHasher>,
}

fn check_len(field: &'static str, len: usize, max: usize) -> Result<(), EncodeError> {
    if len > max {
        Err(EncodeError::LengthExceedsLimit { field, len, max })
    } else {
        Ok(())
    }
}

impl Encoder {
    fn key(&mut self, key: &ObjectKey) -> Result<(), EncodeError> {
        let index = match self.authorities.get_index_of(key.authority.as_str()) {
            Some(index) => index,
            None => self.authorities.insert_full(key.authority.clone()).0,
        };
        self.body.write_varint(index as u64);
        self.string("code", &key.code)
    }

    fn opt_key(&mut self, key: Option<&ObjectKey>) -> Result<(), EncodeError> {
        match key {
            Some(key) => {
                self.body.write_byte(PRESENT);
                self.key(key)
            }
            None => {
                self.body.write_byte(ABSENT);
                Ok(())
            }
        }
    }

    fn string(&mut self, field: &'static str, s: &str) -> Result<(), EncodeError> {
        check_len(field, s.len(), MAX_STRING_LEN)?;
        self.body.write_string(s);
        Ok(())
    }

    fn opt_string(&mut self, field: &'static str, s: Option<&str>) -> Result<(), EncodeError> {
        match s {
            Some(s) => {
                self.body.write_byte(PRESENT);
                self.string(field, s)
            }
            None => {
                self.body.write_byte(ABSENT);
                Ok(())
            }
        }
    }

    fn f64(&mut self, value: f64) {
        self.body.write_f64(value);
    }

    fn opt_f64(&mut self, value: Option<f64>) {
        self.body.write_opt_f64(value);
    }

    fn bool(&mut self, value: bool) {
        self.body.write_bool(value);
    }

    fn opt_bool(&mut self, value: Option<bool>) {
        self.body.write_opt_bool(value);
    }

    fn quantity3(&mut self, q: &Quantity<[f64; 3]>) -> Result<(), EncodeError> {
        for v in q.value {
            self.f64(v);
        }
        self.key(&q.unit)
    }

    fn quantity1(&mut self, q: &Quantity<f64>) -> Result<(), EncodeError> {
        self.f64(q.value);
        self.key(&q.unit)
    }

    fn opt_quantity3(&mut self, q: Option<&Quantity<[f64; 3]>>) -> Result<(), EncodeError> {
        match q {
            Some(q) => {
                self.body.write_byte(PRESENT);
                self.quantity3(q)
            }
            None => {
                self.body.write_byte(ABSENT);
                Ok(())
            }
        }
    }

    fn opt_quantity1(&mut self, q: Option<&Quantity<f64>>) -> Result<(), EncodeError> {
        match q {
            Some(q) => {
                self.body.write_byte(PRESENT);
                self.quantity1(q)
            }
            None => {
                self.body.write_byte(ABSENT);
                Ok(())
            }
        }
    }

    fn params(&mut self, params: &[ParameterValue]) -> Result<(), EncodeError> {
        check_len("params", params.len(), MAX_PARAMETERS)?;
        self.body.write_varint(params.len() as u64);
        for p in params {
            self.key(&p.parameter)?;
            self.f64(p.value);
            self.key(&p.unit)?;
        }
        Ok(())
    }

    fn record(&mut self, record: &Record) -> Result<(), EncodeError> {
        self.body.write_byte(record.kind() as u8);
        match record {
            Record::UnitOfMeasure(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.body.write_byte(r.unit_kind as u8);
                self.opt_f64(r.conv_factor);
                self.bool(r.deprecated);
            }
            Record::CelestialBody(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.f64(r.semi_major_axis);
            }
            Record::Ellipsoid(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.celestial_body)?;
                self.f64(r.semi_major_axis);
                self.key(&r.unit)?;
                self.opt_f64(r.inv_flattening);
                self.opt_f64(r.semi_minor_axis);
                self.bool(r.deprecated);
            }
            Record::Extent(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.string("description", &r.description)?;
                self.f64(r.bbox.south);
                self.f64(r.bbox.north);
                self.f64(r.bbox.west);
                self.f64(r.bbox.east);
                self.bool(r.deprecated);
            }
            Record::PrimeMeridian(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.f64(r.longitude);
                self.key(&r.unit)?;
                self.bool(r.deprecated);
            }
            Record::GeodeticDatum(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.ellipsoid)?;
                self.key(&r.prime_meridian)?;
                self.key(&r.area)?;
                self.opt_string("publication_date", r.publication_date.as_deref())?;
                self.opt_f64(r.frame_reference_epoch);
                self.bool(r.deprecated);
            }
            Record::VerticalDatum(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.area)?;
                self.opt_string("publication_date", r.publication_date.as_deref())?;
                self.opt_f64(r.frame_reference_epoch);
                self.bool(r.deprecated);
            }
            Record::CoordinateSystem(r) => {
                self.key(&r.key)?;
                self.body.write_byte(r.cs_type as u8);
                self.body.write_byte(r.dimension);
            }
            Record::Axis(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.string("abbreviation", &r.abbreviation)?;
                self.string("orientation", &r.orientation)?;
                self.key(&r.coordinate_system)?;
                self.body.write_byte(r.order);
                self.key(&r.unit)?;
            }
            Record::GeodeticCrs(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.body.write_byte(r.crs_type as u8);
                self.opt_key(r.coordinate_system.as_ref())?;
                self.opt_key(r.datum.as_ref())?;
                self.opt_key(r.area.as_ref())?;
                self.opt_string("text_definition", r.text_definition.as_deref())?;
                self.bool(r.deprecated);
            }
            Record::ProjectedCrs(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.opt_key(r.geodetic_crs.as_ref())?;
                self.opt_key(r.conversion.as_ref())?;
                self.opt_key(r.coordinate_system.as_ref())?;
                self.opt_key(r.area.as_ref())?;
                self.opt_string("text_definition", r.text_definition.as_deref())?;
                self.bool(r.deprecated);
            }
            Record::VerticalCrs(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.coordinate_system)?;
                self.key(&r.datum)?;
                self.key(&r.area)?;
                self.bool(r.deprecated);
            }
            Record::CompoundCrs(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.horizontal_crs)?;
                self.key(&r.vertical_crs)?;
                self.key(&r.area)?;
                self.bool(r.deprecated);
            }
            Record::ConversionMethod(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.bool(r.deprecated);
            }
            Record::CoordinateOperationMethod(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.bool(r.deprecated);
            }
            Record::Parameter(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.bool(r.deprecated);
            }
            Record::Conversion(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.method)?;
                self.params(&r.params)?;
                self.key(&r.area)?;
                self.bool(r.deprecated);
            }
            Record::HelmertTransformation(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.method)?;
                self.key(&r.source_crs)?;
                self.key(&r.target_crs)?;
                self.key(&r.area)?;
                self.opt_f64(r.accuracy);
                self.quantity3(&r.translation)?;
                self.opt_quantity3(r.rotation.as_ref())?;
                self.opt_quantity1(r.scale_difference.as_ref())?;
                self.opt_quantity3(r.rate_translation.as_ref())?;
                self.opt_quantity3(r.rate_rotation.as_ref())?;
                self.opt_quantity1(r.rate_scale_difference.as_ref())?;
                self.opt_quantity1(r.epoch.as_ref())?;
                self.opt_quantity3(r.pivot.as_ref())?;
                self.bool(r.deprecated);
            }
            Record::GridTransformation(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.method)?;
                self.key(&r.source_crs)?;
                self.key(&r.target_crs)?;
                self.key(&r.area)?;
                self.opt_f64(r.accuracy);
                self.string("grid_name", &r.grid_name)?;
                self.opt_string("grid2_name", r.grid2_name.as_deref())?;
                self.opt_key(r.interpolation_crs.as_ref())?;
                self.bool(r.deprecated);
            }
            Record::OtherTransformation(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.method)?;
                self.key(&r.source_crs)?;
                self.key(&r.target_crs)?;
                self.key(&r.area)?;
                self.opt_f64(r.accuracy);
                self.params(&r.params)?;
                self.bool(r.deprecated);
            }
            Record::ConcatenatedOperation(r) => {
                self.key(&r.key)?;
                self.string("name", &r.name)?;
                self.key(&r.source_crs)?;
                self.key(&r.target_crs)?;
                self.key(&r.area)?;
                self.opt_f64(r.accuracy);
                check_len("steps", r.steps.len(), MAX_STEPS)?;
                self.body.write_varint(r.steps.len() as u64);
                for step in &r.steps {
                    self.key(step)?;
                }
                self.bool(r.deprecated);
            }
            Record::GridPackage(r) => {
                self.string("package_name", &r.package_name)?;
                self.opt_string("description", r.description.as_deref())?;
                self.opt_string("url", r.url.as_deref())?;
                self.opt_bool(r.direct_download);
                self.opt_bool(r.open_license);
            }
            Record::GridAlternative(r) => {
                self.string("original_grid_name", &r.original_grid_name)?;
                self.string("proj_grid_name", &r.proj_grid_name)?;
                self.opt_string("old_proj_grid_name", r.old_proj_grid_name.as_deref())?;
                self.body.write_byte(r.format as u8);
                self.body.write_byte(r.method as u8);
                self.bool(r.inverse_direction);
                self.opt_string("package_name", r.package_name.as_deref())?;
                self.opt_string("url", r.url.as_deref())?;
                self.opt_bool(r.direct_download);
                self.opt_bool(r.open_license);
                self.opt_string("directory", r.directory.as_deref())?;
            }
            Record::PreferredHub(r) => {
                self.key(&r.source_datum)?;
                self.key(&r.hub_datum)?;
            }
            Record::AuthorityPreference(r) => {
                self.string("source_authority", &r.source_authority)?;
                self.string("target_authority", &r.target_authority)?;
                check_len(
                    "allowed_authorities",
                    r.allowed_authorities.len(),
                    MAX_ALLOWED_AUTHORITIES,
                )?;
                self.body.write_varint(r.allowed_authorities.len() as u64);
                for authority in &r.allowed_authorities {
                    self.string("allowed_authority", authority)?;
                }
            }
            Record::AliasName(r) => {
                self.body.write_byte(r.object.kind as u8);
                self.key(&r.object.key)?;
                self.string("alt_name", &r.alt_name)?;
                self.opt_string("source", r.source.as_deref())?;
            }
            Record::Supersession(r) => {
                self.body.write_byte(r.kind as u8);
                self.key(&r.superseded)?;
                self.key(&r.replacement)?;
                self.opt_string("source", r.source.as_deref())?;
                self.bool(r.same_source_target_crs);
            }
            Record::Deprecation(r) => {
                self.body.write_byte(r.kind as u8);
                self.key(&r.deprecated)?;
                self.key(&r.replacement)?;
                self.opt_string("source", r.source.as_deref())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::store::EntityStore;
    use crate::test_support::fixture_snapshot;

    #[test]
    fn test_snapshot_reloads_to_same_records() {
        let snapshot = fixture_snapshot();
        let encoded = encode_snapshot(&snapshot).unwrap();
        let batch = decode_batch(&encoded).unwrap();
        assert_eq!(batch.records, snapshot.tables().records());

        let mut store = EntityStore::unseeded(RegistryConfig::default());
        store.load(batch).unwrap();
        assert_eq!(encode_snapshot(&store.publish()).unwrap(), encoded);
    }

    #[test]
    fn test_compressed_snapshot() {
        let snapshot = fixture_snapshot();
        let plain = encode_snapshot(&snapshot).unwrap();
        let compressed = encode_snapshot_compressed(&snapshot, 3).unwrap();

        assert_eq!(&plain[0..4], b"CRSR");
        assert_eq!(&compressed[0..5], b"CRSRZ");
        assert_eq!(decompress(&compressed).unwrap(), plain);
        assert_eq!(
            decode_batch(&compressed).unwrap().records,
            decode_batch(&plain).unwrap().records
        );
    }

    #[test]
    fn test_authority_dictionary_is_shared() {
        let snapshot = fixture_snapshot();
        let encoded = encode_snapshot(&snapshot).unwrap();
        let mut reader = Reader::new(&encoded);
        reader.read_bytes(5, "header").unwrap();
        assert_eq!(reader.read_varint("authorities").unwrap(), 2);
        // Units come first in load order, then the seeded Earth body.
        assert_eq!(reader.read_string(16, "authority").unwrap(), "EPSG");
        assert_eq!(reader.read_string(16, "authority").unwrap(), "PROJ");
    }

    #[test]
    fn test_invalid_magic() {
        assert!(matches!(
            decode_batch(b"XXXXXXXX"),
            Err(DecodeError::InvalidMagic { found }) if &found == b"XXXX"
        ));
        assert!(matches!(
            decode_batch(b"CR"),
            Err(DecodeError::UnexpectedEof { context: "magic" })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC_UNCOMPRESSED);
        data.push(99);
        data.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            decode_batch(&data),
            Err(DecodeError::UnsupportedVersion { version: 99 })
        ));
    }

    fn header(authorities: &[&str], records: u64) -> Writer {
        let mut writer = Writer::new();
        writer.write_bytes(MAGIC_UNCOMPRESSED);
        writer.write_byte(FORMAT_VERSION);
        writer.write_varint(authorities.len() as u64);
        for a in authorities {
            writer.write_string(a);
        }
        writer.write_varint(records);
        writer
    }

    #[test]
    fn test_duplicate_authority_rejected() {
        let data = header(&["EPSG", "EPSG"], 0).into_bytes();
        assert!(matches!(
            decode_batch(&data),
            Err(DecodeError::DuplicateDictionaryEntry { dict: "authorities", .. })
        ));
    }

    #[test]
    fn test_authority_index_out_of_bounds() {
        let mut writer = header(&["EPSG"], 1);
        writer.write_byte(Kind::PreferredHub as u8);
        writer.write_varint(3);
        writer.write_string("6171");
        let data = writer.into_bytes();
        assert!(matches!(
            decode_batch(&data),
            Err(DecodeError::IndexOutOfBounds { index: 3, size: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_record_kind() {
        let mut writer = header(&[], 1);
        writer.write_byte(0);
        assert!(matches!(
            decode_batch(writer.as_bytes()),
            Err(DecodeError::InvalidRecordKind { tag: 0 })
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut writer = header(&[], 0);
        writer.write_bytes(&[1, 2, 3]);
        assert!(matches!(
            decode_batch(writer.as_bytes()),
            Err(DecodeError::TrailingBytes { count: 3 })
        ));
    }

    #[test]
    fn test_record_count_limit() {
        let data = header(&[], MAX_RECORDS as u64 + 1).into_bytes();
        assert!(matches!(
            decode_batch(&data),
            Err(DecodeError::LengthExceedsLimit { field: "records", .. })
        ));
    }

    #[test]
    fn test_lying_size_header() {
        let compressed = zstd::encode_all(&b"CRSR\x01\x00\x00"[..], 3).unwrap();
        let mut writer = Writer::new();
        writer.write_bytes(MAGIC_COMPRESSED);
        writer.write_varint(3);
        writer.write_bytes(&compressed);
        assert!(matches!(
            decode_batch(writer.as_bytes()),
            Err(DecodeError::UncompressedSizeMismatch { declared: 3, actual: 4 })
        ));
    }
}
