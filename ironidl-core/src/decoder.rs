//! Message decoder.
//!
//! A [`Decoder`] reads the header once, then decodes each argument against
//! the type the caller expects. Every argument is checked for subtyping
//! against its wire type before any of its value bytes are read, so a
//! mismatch never produces a partial value.
//!
//! # Example
//!
//! ```
//! use ironidl_core::{Decoder, Type, TypeTable, Value};
//!
//! let table = TypeTable::new();
//! let mut decoder = Decoder::new(b"DIDL\x00\x01\x7d\x2a").unwrap();
//! assert_eq!(decoder.next_value(&table, &Type::Nat).unwrap(), Value::Nat(42));
//! decoder.finish().unwrap();
//! ```

use tracing::trace;

use crate::buffer::ReadBuffer;
use crate::error::{BufferError, EncodingError, Error, FieldPath, SubtypeError};
use crate::header::MessageHeader;
use crate::principal::Principal;
use crate::subtype::SubtypeChecker;
use crate::types::{Type, TypeTable};
use crate::value::{FuncRef, Value, ValueField};

/// Default bound on type table entries.
pub const DEFAULT_MAX_TYPE_TABLE_LEN: usize = 10_000;
/// Default bound on value nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;
/// Default bound on `vec` lengths whose elements occupy no bytes.
pub const DEFAULT_MAX_ZERO_SIZED_ELEMENTS: usize = 2_000_000;

/// Decoder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    max_type_table_len: usize,
    max_depth: usize,
    max_zero_sized_elements: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_type_table_len: DEFAULT_MAX_TYPE_TABLE_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            max_zero_sized_elements: DEFAULT_MAX_ZERO_SIZED_ELEMENTS,
        }
    }
}

impl DecoderConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of type table entries.
    #[must_use]
    pub const fn with_max_type_table_len(mut self, len: usize) -> Self {
        self.max_type_table_len = len;
        self
    }

    /// Sets the maximum value nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the maximum length of a `vec` of zero-sized elements.
    #[must_use]
    pub const fn with_max_zero_sized_elements(mut self, count: usize) -> Self {
        self.max_zero_sized_elements = count;
        self
    }

    /// Returns the maximum number of type table entries.
    #[must_use]
    pub const fn max_type_table_len(&self) -> usize {
        self.max_type_table_len
    }

    /// Returns the maximum value nesting depth.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the maximum length of a `vec` of zero-sized elements.
    #[must_use]
    pub const fn max_zero_sized_elements(&self) -> usize {
        self.max_zero_sized_elements
    }
}

/// Reads the arguments of one message.
#[derive(Debug)]
pub struct Decoder<'a> {
    reader: ReadBuffer<'a>,
    header: MessageHeader,
    config: DecoderConfig,
    next_arg: usize,
}

impl<'a> Decoder<'a> {
    /// Parses the message header with default limits.
    ///
    /// # Errors
    /// See [`MessageHeader::decode`].
    pub fn new(bytes: &'a [u8]) -> Result<Self, Error> {
        Self::with_config(bytes, DecoderConfig::default())
    }

    /// Parses the message header with the given limits.
    ///
    /// # Errors
    /// See [`MessageHeader::decode`].
    pub fn with_config(bytes: &'a [u8], config: DecoderConfig) -> Result<Self, Error> {
        let mut reader = ReadBuffer::new(bytes);
        let header = MessageHeader::decode(&mut reader, &config)?;
        Ok(Self {
            reader,
            header,
            config,
            next_arg: 0,
        })
    }

    /// Returns the decoded header.
    #[must_use]
    pub const fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// Returns the number of arguments not yet decoded.
    #[must_use]
    pub fn remaining_args(&self) -> usize {
        self.header.args.len().saturating_sub(self.next_arg)
    }

    /// Decodes the next argument as `expected`, whose references live in `table`.
    ///
    /// If the message has no arguments left, a defaultable `expected`
    /// decodes to its default.
    ///
    /// # Errors
    /// Returns [`SubtypeError`] if the wire type is not a subtype of
    /// `expected`, and [`BufferError`] for malformed value bytes.
    pub fn next_value(&mut self, table: &TypeTable, expected: &Type) -> Result<Value, Error> {
        let index = self.next_arg;
        self.next_arg += 1;

        let Some(actual) = self.header.args.get(index) else {
            return Value::default_for(table, expected).ok_or_else(|| {
                let mut path = FieldPath::new();
                path.push(format!("arg{index}"));
                SubtypeError::new(&path, "required argument is missing").into()
            });
        };

        SubtypeChecker::new(&self.header.table, table).check_arg(index, actual, expected)?;

        let mut walker = Walker {
            reader: &mut self.reader,
            actual: &self.header.table,
            expected: table,
            config: &self.config,
            depth: 0,
            path: FieldPath::new(),
        };
        walker.path.push(format!("arg{index}"));
        walker.decode(actual, expected)
    }

    /// Decodes the next argument as its own wire type.
    ///
    /// # Errors
    /// Returns [`BufferError`] for malformed value bytes, or
    /// [`SubtypeError`] if no arguments are left.
    pub fn next_self_described(&mut self) -> Result<(Type, Value), Error> {
        let index = self.next_arg;
        let actual = self.header.args.get(index).cloned().ok_or_else(|| {
            let mut path = FieldPath::new();
            path.push(format!("arg{index}"));
            SubtypeError::new(&path, "no argument left")
        })?;
        self.next_arg += 1;

        let mut walker = Walker {
            reader: &mut self.reader,
            actual: &self.header.table,
            expected: &self.header.table,
            config: &self.config,
            depth: 0,
            path: FieldPath::new(),
        };
        walker.path.push(format!("arg{index}"));
        let value = walker.decode(&actual, &actual)?;
        Ok((actual, value))
    }

    /// Skips the remaining arguments and checks that nothing follows them.
    ///
    /// # Errors
    /// Returns [`BufferError::TrailingBytes`] if bytes are left over.
    pub fn finish(mut self) -> Result<MessageHeader, Error> {
        while self.next_arg < self.header.args.len() {
            let actual = self.header.args[self.next_arg].clone();
            let mut walker = Walker {
                reader: &mut self.reader,
                actual: &self.header.table,
                expected: &self.header.table,
                config: &self.config,
                depth: 0,
                path: FieldPath::new(),
            };
            walker.skip(&actual)?;
            self.next_arg += 1;
        }
        if !self.reader.is_exhausted() {
            return Err(BufferError::TrailingBytes {
                count: self.reader.remaining(),
            }
            .into());
        }
        Ok(self.header)
    }
}

/// Decodes a message against the expected argument types.
///
/// # Errors
/// See [`Decoder::next_value`] and [`Decoder::finish`].
pub fn decode_args(bytes: &[u8], table: &TypeTable, types: &[Type]) -> Result<Vec<Value>, Error> {
    let mut decoder = Decoder::new(bytes)?;
    let values = types
        .iter()
        .map(|ty| decoder.next_value(table, ty))
        .collect::<Result<Vec<_>, _>>()?;
    decoder.finish()?;
    Ok(values)
}

/// Decodes a message using only the types it carries.
///
/// # Errors
/// See [`Decoder::next_self_described`] and [`Decoder::finish`].
pub fn decode_self_describing(bytes: &[u8]) -> Result<(TypeTable, Vec<Type>, Vec<Value>), Error> {
    let mut decoder = Decoder::new(bytes)?;
    let mut values = Vec::with_capacity(decoder.remaining_args());
    while decoder.remaining_args() > 0 {
        let (_, value) = decoder.next_self_described()?;
        values.push(value);
    }
    let header = decoder.finish()?;
    Ok((header.table, header.args, values))
}

/// Walks value bytes guided by a wire type and an expected type.
struct Walker<'r, 'a, 't> {
    reader: &'r mut ReadBuffer<'a>,
    actual: &'t TypeTable,
    expected: &'t TypeTable,
    config: &'t DecoderConfig,
    depth: usize,
    path: FieldPath,
}

impl Walker<'_, '_, '_> {
    fn enter(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config.max_depth() {
            return Err(BufferError::DepthLimit {
                limit: self.config.max_depth(),
            }
            .into());
        }
        Ok(())
    }

    fn decode(&mut self, actual: &Type, expected: &Type) -> Result<Value, Error> {
        self.enter()?;
        let value = self.decode_inner(actual, expected);
        self.depth -= 1;
        value
    }

    fn mismatch(&self, actual: &Type, expected: &Type) -> Error {
        SubtypeError::new(
            &self.path,
            format!(
                "{} cannot be read as {}",
                actual.kind_name(),
                expected.kind_name()
            ),
        )
        .into()
    }

    fn decode_inner(&mut self, actual: &Type, expected: &Type) -> Result<Value, Error> {
        let actual_table = self.actual;
        let expected_table = self.expected;
        let actual = actual_table.resolve(actual)?;
        let expected = expected_table.resolve(expected)?;

        match expected {
            Type::Reserved => {
                self.skip(actual)?;
                return Ok(Value::Reserved);
            }
            Type::Opt(inner) => {
                return match actual {
                    Type::Null => Ok(Value::Opt(None)),
                    Type::Opt(actual_inner) => match self.read_flag("opt")? {
                        false => Ok(Value::Opt(None)),
                        true => Ok(Value::some(self.decode(actual_inner, inner)?)),
                    },
                    _ => Ok(Value::some(self.decode(actual, inner)?)),
                };
            }
            _ => {}
        }

        let value = match (actual, expected) {
            (Type::Empty, _) => {
                return Err(EncodingError::EmptyValue {
                    path: self.path.clone(),
                }
                .into());
            }
            (Type::Null, Type::Null) => Value::Null,
            (Type::Bool, Type::Bool) => Value::Bool(self.read_flag("bool")?),
            (Type::Nat, Type::Nat) => Value::Nat(self.reader.get_uleb128()?),
            (Type::Int, Type::Int) => Value::Int(self.reader.get_sleb128()?),
            (Type::Nat8, Type::Nat8) => Value::Nat8(self.reader.get_u8()?),
            (Type::Nat16, Type::Nat16) => Value::Nat16(self.reader.get_u16_le()?),
            (Type::Nat32, Type::Nat32) => Value::Nat32(self.reader.get_u32_le()?),
            (Type::Nat64, Type::Nat64) => Value::Nat64(self.reader.get_u64_le()?),
            (Type::Int8, Type::Int8) => Value::Int8(i8::from_le_bytes([self.reader.get_u8()?])),
            (Type::Int16, Type::Int16) => {
                Value::Int16(i16::from_le_bytes(self.reader.get_u16_le()?.to_le_bytes()))
            }
            (Type::Int32, Type::Int32) => {
                Value::Int32(i32::from_le_bytes(self.reader.get_u32_le()?.to_le_bytes()))
            }
            (Type::Int64, Type::Int64) => {
                Value::Int64(i64::from_le_bytes(self.reader.get_u64_le()?.to_le_bytes()))
            }
            (Type::Float32, Type::Float32) => Value::Float32(self.reader.get_f32_le()?),
            (Type::Float64, Type::Float64) => Value::Float64(self.reader.get_f64_le()?),
            (Type::Text, Type::Text) => Value::Text(self.reader.get_text()?.to_string()),
            (Type::Principal, Type::Principal) => Value::Principal(self.read_principal()?),
            (Type::Service(_), Type::Service(_)) => Value::Service(self.read_principal()?),
            (Type::Func(_), Type::Func(_)) => {
                if !self.read_flag("func")? {
                    return Err(self.invalid_byte("func reference", 0));
                }
                let principal = self.read_principal()?;
                let method = self.reader.get_text()?.to_string();
                Value::Func(FuncRef { principal, method })
            }
            (Type::Vec(actual_inner), Type::Vec(expected_inner)) => {
                let count = self.read_count(actual_inner)?;
                let bytes = matches!(actual_table.resolve(actual_inner)?, Type::Nat8)
                    && matches!(expected_table.resolve(expected_inner)?, Type::Nat8);
                if bytes {
                    Value::Blob(self.reader.get_bytes(count)?.to_vec())
                } else {
                    let mut items = Vec::with_capacity(count.min(self.reader.remaining()));
                    for i in 0..count {
                        self.path.push(i.to_string());
                        items.push(self.decode(actual_inner, expected_inner)?);
                        self.path.pop();
                    }
                    Value::Vec(items)
                }
            }
            (Type::Record(actual_fields), Type::Record(expected_fields)) => {
                let mut decoded: Vec<Option<Value>> = vec![None; expected_fields.len()];
                for field in actual_fields {
                    match expected_fields.iter().position(|e| e.label == field.label) {
                        Some(slot) => {
                            self.path.push(expected_fields[slot].label.to_string());
                            decoded[slot] =
                                Some(self.decode(&field.ty, &expected_fields[slot].ty)?);
                            self.path.pop();
                        }
                        None => {
                            trace!(field = field.id(), path = %self.path, "skipping unknown field");
                            self.skip(&field.ty)?;
                        }
                    }
                }
                let mut fields = Vec::with_capacity(expected_fields.len());
                for (field, value) in expected_fields.iter().zip(decoded) {
                    let value = match value {
                        Some(value) => value,
                        None => {
                            trace!(field = field.id(), path = %self.path, "defaulting absent field");
                            Value::default_for(expected_table, &field.ty).ok_or_else(|| {
                                SubtypeError::new(&self.path, "required field is missing")
                            })?
                        }
                    };
                    fields.push(ValueField {
                        label: field.label.clone(),
                        value,
                    });
                }
                Value::Record(fields)
            }
            (Type::Variant(actual_fields), Type::Variant(expected_fields)) => {
                let offset = self.reader.position();
                let index = self.reader.get_uleb128()?;
                let field = usize::try_from(index)
                    .ok()
                    .and_then(|i| actual_fields.get(i))
                    .ok_or(BufferError::InvalidVariantIndex {
                        index,
                        len: actual_fields.len(),
                        offset,
                    })?;
                let target = expected_fields
                    .iter()
                    .find(|e| e.label == field.label)
                    .ok_or_else(|| SubtypeError::new(&self.path, "variant tag is not known"))?;
                self.path.push(target.label.to_string());
                let value = self.decode(&field.ty, &target.ty)?;
                self.path.pop();
                Value::Variant(Box::new(ValueField {
                    label: target.label.clone(),
                    value,
                }))
            }
            (a, e) => return Err(self.mismatch(a, e)),
        };
        Ok(value)
    }

    /// Consumes the bytes of a value of wire type `actual`.
    fn skip(&mut self, actual: &Type) -> Result<(), Error> {
        self.enter()?;
        let result = self.skip_inner(actual);
        self.depth -= 1;
        result
    }

    fn skip_inner(&mut self, actual: &Type) -> Result<(), Error> {
        let table = self.actual;
        match table.resolve(actual)? {
            Type::Null | Type::Reserved => {}
            Type::Empty => {
                return Err(EncodingError::EmptyValue {
                    path: self.path.clone(),
                }
                .into());
            }
            Type::Bool => {
                self.read_flag("bool")?;
            }
            Type::Nat => {
                self.reader.get_uleb128()?;
            }
            Type::Int => {
                self.reader.get_sleb128()?;
            }
            Type::Nat8 | Type::Int8 => {
                self.reader.get_bytes(1)?;
            }
            Type::Nat16 | Type::Int16 => {
                self.reader.get_bytes(2)?;
            }
            Type::Nat32 | Type::Int32 | Type::Float32 => {
                self.reader.get_bytes(4)?;
            }
            Type::Nat64 | Type::Int64 | Type::Float64 => {
                self.reader.get_bytes(8)?;
            }
            Type::Text => {
                self.reader.get_text()?;
            }
            Type::Principal | Type::Service(_) => {
                self.read_principal()?;
            }
            Type::Func(_) => {
                if !self.read_flag("func")? {
                    return Err(self.invalid_byte("func reference", 0));
                }
                self.read_principal()?;
                self.reader.get_text()?;
            }
            Type::Opt(inner) => {
                if self.read_flag("opt")? {
                    self.skip(inner)?;
                }
            }
            Type::Vec(inner) => {
                let count = self.read_count(inner)?;
                if matches!(table.resolve(inner)?, Type::Nat8) {
                    self.reader.get_bytes(count)?;
                } else {
                    for _ in 0..count {
                        self.skip(inner)?;
                    }
                }
            }
            Type::Record(fields) => {
                for field in fields {
                    self.skip(&field.ty)?;
                }
            }
            Type::Variant(fields) => {
                let offset = self.reader.position();
                let index = self.reader.get_uleb128()?;
                let field = usize::try_from(index)
                    .ok()
                    .and_then(|i| fields.get(i))
                    .ok_or(BufferError::InvalidVariantIndex {
                        index,
                        len: fields.len(),
                        offset,
                    })?;
                self.skip(&field.ty)?;
            }
            Type::Ref(_) => {}
        }
        Ok(())
    }

    /// Reads a `vec` element count, bounding counts of zero-sized elements.
    fn read_count(&mut self, element: &Type) -> Result<usize, Error> {
        if !self.is_zero_sized(element, 0)? {
            return Ok(self.reader.get_len()?);
        }
        let offset = self.reader.position();
        let count = self.reader.get_uleb128()?;
        let limit = self.config.max_zero_sized_elements();
        match usize::try_from(count) {
            Ok(count) if count <= limit => Ok(count),
            _ => Err(BufferError::LengthOverflow {
                offset,
                length: count,
                remaining: limit,
            }
            .into()),
        }
    }

    /// Returns true if values of wire type `ty` occupy no bytes.
    fn is_zero_sized(&self, ty: &Type, depth: usize) -> Result<bool, Error> {
        if depth > self.config.max_depth() {
            return Err(BufferError::DepthLimit {
                limit: self.config.max_depth(),
            }
            .into());
        }
        Ok(match self.actual.resolve(ty)? {
            Type::Null | Type::Reserved => true,
            Type::Record(fields) => {
                for field in fields {
                    if !self.is_zero_sized(&field.ty, depth + 1)? {
                        return Ok(false);
                    }
                }
                true
            }
            _ => false,
        })
    }

    fn read_flag(&mut self, what: &'static str) -> Result<bool, Error> {
        let offset = self.reader.position();
        match self.reader.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(BufferError::InvalidByte {
                what,
                value,
                offset,
            }
            .into()),
        }
    }

    fn invalid_byte(&self, what: &'static str, value: u8) -> Error {
        BufferError::InvalidByte {
            what,
            value,
            offset: self.reader.position().saturating_sub(1),
        }
        .into()
    }

    fn read_principal(&mut self) -> Result<Principal, Error> {
        if !self.read_flag("principal")? {
            return Err(self.invalid_byte("principal reference", 0));
        }
        let bytes = self.reader.get_blob()?;
        Ok(Principal::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_args;
    use crate::error::SchemaError;

    #[test]
    fn test_decode_primitives() {
        let table = TypeTable::new();
        let values = decode_args(
            b"DIDL\x00\x03\x7d\x76\x71\xe5\x8e\x26\xfe\xff\x02hi",
            &table,
            &[Type::Nat, Type::Int16, Type::Text],
        )
        .unwrap();
        assert_eq!(
            values,
            vec![
                Value::Nat(624_485),
                Value::Int16(-2),
                Value::Text("hi".to_string())
            ]
        );
    }

    #[test]
    fn test_record_field_skipped_and_defaulted() {
        let table = TypeTable::new();
        let wide = Type::record([("a", Type::Nat), ("b", Type::opt(Type::Text))]);
        let bytes = encode_args(
            &table,
            &[(
                wide,
                Value::record([
                    ("a", Value::Nat(42)),
                    ("b", Value::some(Value::Text("x".to_string()))),
                ]),
            )],
        )
        .unwrap();

        let narrow = Type::record([("a", Type::Nat), ("c", Type::opt(Type::Nat))]);
        let values = decode_args(&bytes, &table, &[narrow]).unwrap();
        assert_eq!(
            values,
            vec![Value::record([
                ("a", Value::Nat(42)),
                ("c", Value::Opt(None))
            ])]
        );
    }

    #[test]
    fn test_bare_value_read_as_opt() {
        let table = TypeTable::new();
        let values = decode_args(b"DIDL\x00\x01\x7d\x05", &table, &[Type::opt(Type::Nat)]).unwrap();
        assert_eq!(values, vec![Value::some(Value::Nat(5))]);
    }

    #[test]
    fn test_reserved_skips_value() {
        let table = TypeTable::new();
        let values = decode_args(b"DIDL\x00\x01\x71\x02hi", &table, &[Type::Reserved]).unwrap();
        assert_eq!(values, vec![Value::Reserved]);
    }

    #[test]
    fn test_missing_trailing_argument() {
        let table = TypeTable::new();
        let values = decode_args(
            b"DIDL\x00\x01\x7d\x01",
            &table,
            &[Type::Nat, Type::opt(Type::Text)],
        )
        .unwrap();
        assert_eq!(values, vec![Value::Nat(1), Value::Opt(None)]);

        let err = decode_args(b"DIDL\x00\x01\x7d\x01", &table, &[Type::Nat, Type::Text])
            .unwrap_err();
        assert!(matches!(err, Error::Subtype(_)));
    }

    #[test]
    fn test_extra_arguments_skipped() {
        let table = TypeTable::new();
        let values = decode_args(b"DIDL\x00\x02\x7d\x71\x01\x02hi", &table, &[Type::Nat]).unwrap();
        assert_eq!(values, vec![Value::Nat(1)]);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let table = TypeTable::new();
        let err = decode_args(b"DIDL\x00\x01\x7d\x01\xff", &table, &[Type::Nat]).unwrap_err();
        assert_eq!(err, Error::Buffer(BufferError::TrailingBytes { count: 1 }));
    }

    #[test]
    fn test_nat_is_not_int() {
        let table = TypeTable::new();
        let err = decode_args(b"DIDL\x00\x01\x7d\x01", &table, &[Type::Int]).unwrap_err();
        assert!(matches!(err, Error::Subtype(_)));
    }

    #[test]
    fn test_invalid_bool_and_flags() {
        let table = TypeTable::new();
        let err = decode_args(b"DIDL\x00\x01\x7e\x02", &table, &[Type::Bool]).unwrap_err();
        assert!(matches!(
            err,
            Error::Buffer(BufferError::InvalidByte { what: "bool", value: 2, .. })
        ));
        let err = decode_args(b"DIDL\x01\x6e\x7d\x01\x00\x07", &table, &[Type::opt(Type::Nat)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Buffer(BufferError::InvalidByte { what: "opt", .. })
        ));
    }

    #[test]
    fn test_text_length_overflow() {
        let table = TypeTable::new();
        let err = decode_args(b"DIDL\x00\x01\x71\x10ab", &table, &[Type::Text]).unwrap_err();
        assert!(matches!(
            err,
            Error::Buffer(BufferError::LengthOverflow { length: 16, .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let table = TypeTable::new();
        let err = decode_args(b"DIDL\x00\x01\x71\x02\xff\xfe", &table, &[Type::Text]).unwrap_err();
        assert!(matches!(err, Error::Buffer(BufferError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_variant_index_out_of_range() {
        let table = TypeTable::new();
        // variant { 0 : null }, index 3
        let err = decode_args(
            b"DIDL\x01\x6b\x01\x00\x7f\x01\x00\x03",
            &table,
            &[Type::Variant(vec![crate::types::Field {
                label: crate::types::Label::Id(0),
                ty: Type::Null,
            }])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Buffer(BufferError::InvalidVariantIndex { index: 3, len: 1, .. })
        ));
    }

    #[test]
    fn test_zero_sized_vec_bound() {
        let table = TypeTable::new();
        // vec null with a count of 5 and no element bytes
        let bytes = b"DIDL\x01\x6d\x7f\x01\x00\x05";
        let values = decode_args(bytes, &table, &[Type::vec(Type::Null)]).unwrap();
        assert_eq!(values, vec![Value::Vec(vec![Value::Null; 5])]);

        let config = DecoderConfig::new().with_max_zero_sized_elements(4);
        let mut decoder = Decoder::with_config(bytes, config).unwrap();
        let err = decoder.next_value(&table, &Type::vec(Type::Null)).unwrap_err();
        assert!(matches!(
            err,
            Error::Buffer(BufferError::LengthOverflow { length: 5, .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut table = TypeTable::new();
        let nested = table.reserve_named("Nested").unwrap();
        table.set(nested, Type::opt(Type::Ref(nested))).unwrap();
        let mut value = Value::Opt(None);
        for _ in 0..20 {
            value = Value::some(value);
        }
        let bytes = encode_args(&table, &[(Type::Ref(nested), value.clone())]).unwrap();

        let config = DecoderConfig::new().with_max_depth(8);
        let mut decoder = Decoder::with_config(&bytes, config).unwrap();
        let err = decoder.next_value(&table, &Type::Ref(nested)).unwrap_err();
        assert_eq!(err, Error::Buffer(BufferError::DepthLimit { limit: 8 }));

        let values = decode_args(&bytes, &table, &[Type::Ref(nested)]).unwrap();
        assert_eq!(values, vec![value]);
    }

    #[test]
    fn test_self_describing() {
        let table = TypeTable::new();
        let ty = Type::record([("a", Type::Nat), ("b", Type::vec(Type::Nat8))]);
        let bytes = encode_args(
            &table,
            &[(
                ty,
                Value::record([("a", Value::Nat(1)), ("b", Value::Blob(vec![7]))]),
            )],
        )
        .unwrap();
        let (wire, types, values) = decode_self_describing(&bytes).unwrap();
        assert_eq!(types.len(), 1);
        assert!(matches!(wire.resolve(&types[0]).unwrap(), Type::Record(_)));
        assert_eq!(values[0].field(97), Some(&Value::Nat(1)));
        assert_eq!(values[0].field(98), Some(&Value::Blob(vec![7])));
    }

    #[test]
    fn test_dangling_arg_reference() {
        let err = Decoder::new(b"DIDL\x00\x01\x00").unwrap_err();
        assert_eq!(
            err,
            Error::Schema(SchemaError::DanglingReference { index: 0, len: 0 })
        );
    }
}
