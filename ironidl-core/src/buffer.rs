//! Byte buffers for the IDL wire format.
//!
//! This module provides:
//! - [`WriteBuffer`] - growable output buffer with LEB128 and little-endian writers
//! - [`ReadBuffer`] - bounds-checked cursor over an input slice
//!
//! Variable-length integers use LEB128: unsigned values are split into 7-bit
//! groups, least significant first, with the high bit set on every byte but
//! the last; signed values use the sign-extending variant of the same scheme.

use crate::error::BufferError;

/// Longest LEB128 encoding accepted for a 128-bit quantity.
pub const MAX_LEB128_LEN: usize = 19;

/// Growable output buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBuffer {
    bytes: Vec<u8>,
}

impl WriteBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer, returning the written bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    /// Writes a single byte.
    #[inline]
    pub fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn put_bytes(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Writes a u16 in little-endian.
    #[inline]
    pub fn put_u16_le(&mut self, value: u16) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Writes a u32 in little-endian.
    #[inline]
    pub fn put_u32_le(&mut self, value: u32) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Writes a u64 in little-endian.
    #[inline]
    pub fn put_u64_le(&mut self, value: u64) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Writes an f32 in little-endian.
    #[inline]
    pub fn put_f32_le(&mut self, value: f32) {
        self.put_u32_le(value.to_bits());
    }

    /// Writes an f64 in little-endian.
    #[inline]
    pub fn put_f64_le(&mut self, value: f64) {
        self.put_u64_le(value.to_bits());
    }

    /// Writes an unsigned LEB128 integer.
    pub fn put_uleb128(&mut self, mut value: u128) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.bytes.push(byte);
                return;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    /// Writes a signed LEB128 integer.
    pub fn put_sleb128(&mut self, mut value: i128) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
            if done {
                self.bytes.push(byte);
                return;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    /// Writes a length prefix followed by the bytes.
    pub fn put_blob(&mut self, data: &[u8]) {
        self.put_uleb128(data.len() as u128);
        self.put_bytes(data);
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn put_text(&mut self, text: &str) {
        self.put_blob(text.as_bytes());
    }
}

/// Bounds-checked read cursor.
///
/// Every read either advances the cursor or fails with a [`BufferError`];
/// no read ever panics on short input.
#[derive(Debug, Clone)]
pub struct ReadBuffer<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ReadBuffer<'a> {
    /// Wraps a byte slice.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Returns the current read position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Returns true once every byte has been read.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `len` raw bytes.
    ///
    /// # Errors
    /// Returns [`BufferError::UnexpectedEof`] if fewer bytes remain.
    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], BufferError> {
        if len > self.remaining() {
            return Err(BufferError::UnexpectedEof {
                offset: self.position,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&self.bytes[start..self.position])
    }

    /// Reads a fixed-size array.
    fn get_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    /// Returns [`BufferError::UnexpectedEof`] at end of input.
    #[inline]
    pub fn get_u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.get_array::<1>()?[0])
    }

    /// Reads a u16 in little-endian.
    ///
    /// # Errors
    /// Returns [`BufferError::UnexpectedEof`] on short input.
    #[inline]
    pub fn get_u16_le(&mut self) -> Result<u16, BufferError> {
        self.get_array().map(u16::from_le_bytes)
    }

    /// Reads a u32 in little-endian.
    ///
    /// # Errors
    /// Returns [`BufferError::UnexpectedEof`] on short input.
    #[inline]
    pub fn get_u32_le(&mut self) -> Result<u32, BufferError> {
        self.get_array().map(u32::from_le_bytes)
    }

    /// Reads a u64 in little-endian.
    ///
    /// # Errors
    /// Returns [`BufferError::UnexpectedEof`] on short input.
    #[inline]
    pub fn get_u64_le(&mut self) -> Result<u64, BufferError> {
        self.get_array().map(u64::from_le_bytes)
    }

    /// Reads an f32 in little-endian.
    ///
    /// # Errors
    /// Returns [`BufferError::UnexpectedEof`] on short input.
    #[inline]
    pub fn get_f32_le(&mut self) -> Result<f32, BufferError> {
        self.get_u32_le().map(f32::from_bits)
    }

    /// Reads an f64 in little-endian.
    ///
    /// # Errors
    /// Returns [`BufferError::UnexpectedEof`] on short input.
    #[inline]
    pub fn get_f64_le(&mut self) -> Result<f64, BufferError> {
        self.get_u64_le().map(f64::from_bits)
    }

    /// Reads an unsigned LEB128 integer of at most 128 bits.
    ///
    /// # Errors
    /// Returns [`BufferError::MalformedLeb128`] if no terminating byte appears
    /// within [`MAX_LEB128_LEN`] bytes or the value exceeds 128 bits.
    pub fn get_uleb128(&mut self) -> Result<u128, BufferError> {
        let start = self.position;
        let mut result: u128 = 0;
        for index in 0..MAX_LEB128_LEN {
            let byte = self.get_u8()?;
            let low = byte & 0x7f;
            if index == MAX_LEB128_LEN - 1 && low > 0b11 {
                return Err(BufferError::MalformedLeb128 { offset: start });
            }
            result |= u128::from(low) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(BufferError::MalformedLeb128 { offset: start })
    }

    /// Reads a signed LEB128 integer of at most 128 bits.
    ///
    /// # Errors
    /// Returns [`BufferError::MalformedLeb128`] if no terminating byte appears
    /// within [`MAX_LEB128_LEN`] bytes or the value exceeds 128 bits.
    pub fn get_sleb128(&mut self) -> Result<i128, BufferError> {
        let start = self.position;
        let mut result: i128 = 0;
        for index in 0..MAX_LEB128_LEN {
            let byte = self.get_u8()?;
            let low = byte & 0x7f;
            let shift = 7 * index;
            if index == MAX_LEB128_LEN - 1 {
                // bits above 127 must repeat the sign bit
                let high = low >> 1;
                if high != 0 && high != 0x3f {
                    return Err(BufferError::MalformedLeb128 { offset: start });
                }
            }
            result |= i128::from(low) << shift;
            if byte & 0x80 == 0 {
                let shift = shift + 7;
                if shift < 128 && byte & 0x40 != 0 {
                    result |= -1i128 << shift;
                }
                return Ok(result);
            }
        }
        Err(BufferError::MalformedLeb128 { offset: start })
    }

    /// Reads an unsigned LEB128 integer that must fit in a `u32`.
    ///
    /// # Errors
    /// Returns [`BufferError::IntegerOverflow`] for larger values.
    pub fn get_uleb128_u32(&mut self) -> Result<u32, BufferError> {
        let offset = self.position;
        let value = self.get_uleb128()?;
        u32::try_from(value).map_err(|_| BufferError::IntegerOverflow { offset, bits: 32 })
    }

    /// Reads a signed LEB128 integer that must fit in an `i64`.
    ///
    /// # Errors
    /// Returns [`BufferError::IntegerOverflow`] for larger magnitudes.
    pub fn get_sleb128_i64(&mut self) -> Result<i64, BufferError> {
        let offset = self.position;
        let value = self.get_sleb128()?;
        i64::try_from(value).map_err(|_| BufferError::IntegerOverflow { offset, bits: 64 })
    }

    /// Reads a length prefix that must not exceed the remaining bytes.
    ///
    /// # Errors
    /// Returns [`BufferError::LengthOverflow`] if the length is larger than
    /// what is left in the buffer.
    pub fn get_len(&mut self) -> Result<usize, BufferError> {
        let offset = self.position;
        let length = self.get_uleb128()?;
        match usize::try_from(length) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(BufferError::LengthOverflow {
                offset,
                length,
                remaining: self.remaining(),
            }),
        }
    }

    /// Reads a length-prefixed byte string.
    ///
    /// # Errors
    /// Returns a [`BufferError`] on a bad prefix or short input.
    pub fn get_blob(&mut self) -> Result<&'a [u8], BufferError> {
        let len = self.get_len()?;
        self.get_bytes(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns [`BufferError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn get_text(&mut self) -> Result<&'a str, BufferError> {
        let offset = self.position;
        let bytes = self.get_blob()?;
        std::str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8 { offset })
    }
}
