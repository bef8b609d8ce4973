//! Primitive encoding/decoding for the snapshot format.
//!
//! Varints (LEB128), little-endian floats, length-prefixed strings and the
//! presence-tagged optionals used by record payloads.

use crate::error::DecodeError;
use crate::limits::MAX_VARINT_BYTES;

/// Presence tag of an absent optional field.
pub const ABSENT: u8 = 0;

/// Presence tag of a present optional field.
pub const PRESENT: u8 = 1;

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEof { context })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads an unsigned varint (LEB128).
    #[inline]
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = (byte & 0x7F) as u64;

            if shift == 63 && value > 1 {
                return Err(DecodeError::VarintOverflow);
            }
            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }

        Err(DecodeError::VarintTooLong)
    }

    /// Reads a varint length and checks it against `max`.
    pub fn read_len(&mut self, max: usize, field: &'static str) -> Result<usize, DecodeError> {
        let len = self.read_varint(field)?;
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        if len > max {
            return Err(DecodeError::LengthExceedsLimit { field, len, max });
        }
        Ok(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    #[inline]
    pub fn read_string(&mut self, max_len: usize, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_len(max_len, field)?;
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Reads a little-endian f64, rejecting NaN.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.read_bytes(8, context)?);
        let value = f64::from_le_bytes(buf);
        if value.is_nan() {
            return Err(DecodeError::FloatIsNan);
        }
        Ok(value)
    }

    /// Reads a 0/1 byte.
    pub fn read_bool(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        match self.read_byte(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidEnumValue { field, value }),
        }
    }

    /// Reads a presence tag.
    pub fn read_presence(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        match self.read_byte(field)? {
            ABSENT => Ok(false),
            PRESENT => Ok(true),
            tag => Err(DecodeError::InvalidPresenceTag { field, tag }),
        }
    }

    /// Reads a tri-state flag: 0 absent, 1 false, 2 true.
    pub fn read_opt_bool(&mut self, field: &'static str) -> Result<Option<bool>, DecodeError> {
        match self.read_byte(field)? {
            0 => Ok(None),
            1 => Ok(Some(false)),
            2 => Ok(Some(true)),
            tag => Err(DecodeError::InvalidPresenceTag { field, tag }),
        }
    }

    pub fn read_opt_f64(&mut self, field: &'static str) -> Result<Option<f64>, DecodeError> {
        if self.read_presence(field)? {
            self.read_f64(field).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_opt_string(
        &mut self,
        max_len: usize,
        field: &'static str,
    ) -> Result<Option<String>, DecodeError> {
        if self.read_presence(field)? {
            self.read_string(max_len, field).map(Some)
        } else {
            Ok(None)
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned varint (LEB128).
    #[inline]
    pub fn write_varint(&mut self, mut value: u64) {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) {
        self.write_varint(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(value as u8);
    }

    pub fn write_opt_bool(&mut self, value: Option<bool>) {
        self.write_byte(match value {
            None => 0,
            Some(false) => 1,
            Some(true) => 2,
        });
    }

    pub fn write_opt_f64(&mut self, value: Option<f64>) {
        match value {
            Some(v) => {
                self.write_byte(PRESENT);
                self.write_f64(v);
            }
            None => self.write_byte(ABSENT),
        }
    }
}
