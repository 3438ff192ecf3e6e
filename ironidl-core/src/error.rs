//! Error types for IronIDL core operations.
//!
//! Every failure is fatal for the operation that raised it: an encode or
//! decode never returns a partial result.

use std::fmt;
use thiserror::Error;

/// Malformed, truncated or over-long wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Buffer ended before the requested bytes could be read.
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Byte offset of the read.
        offset: usize,
        /// Bytes requested.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A length or count prefix exceeds what the buffer can hold.
    #[error("length {length} at offset {offset} exceeds {remaining} remaining bytes")]
    LengthOverflow {
        /// Byte offset of the prefix.
        offset: usize,
        /// Declared length.
        length: u128,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// LEB128 continuation without termination within the encoding's bound.
    #[error("malformed LEB128 at offset {offset}")]
    MalformedLeb128 {
        /// Byte offset where the number starts.
        offset: usize,
    },

    /// A well-formed integer does not fit the target width.
    #[error("integer at offset {offset} does not fit in {bits} bits")]
    IntegerOverflow {
        /// Byte offset where the number starts.
        offset: usize,
        /// Width of the target integer.
        bits: u32,
    },

    /// The message does not start with the format tag.
    #[error("invalid magic number: expected \"DIDL\", found {found:?}")]
    InvalidMagic {
        /// Bytes found instead.
        found: Vec<u8>,
    },

    /// A tag or flag byte outside its allowed range.
    #[error("invalid {what} byte {value:#04x} at offset {offset}")]
    InvalidByte {
        /// What the byte encodes (bool, opt flag, ...).
        what: &'static str,
        /// Byte value found.
        value: u8,
        /// Byte offset.
        offset: usize,
    },

    /// A variant index outside the tag list of its type.
    #[error("variant index {index} at offset {offset} out of range for {len} tags")]
    InvalidVariantIndex {
        /// Index read from the wire.
        index: u128,
        /// Number of tags in the type.
        len: usize,
        /// Byte offset.
        offset: usize,
    },

    /// Text payload is not valid UTF-8.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where the text starts.
        offset: usize,
    },

    /// Bytes left over after the last argument.
    #[error("{count} trailing bytes after the last argument")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },

    /// Value nesting exceeds the decoder's depth limit.
    #[error("value nesting exceeds depth limit {limit}")]
    DepthLimit {
        /// Configured limit.
        limit: usize,
    },
}

/// Dangling or unguarded-cyclic type references and malformed type tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A reference points outside the type table.
    #[error("type reference {index} out of range for table of {len} entries")]
    DanglingReference {
        /// Referenced index.
        index: usize,
        /// Table length.
        len: usize,
    },

    /// A type refers to itself without going through a constructor.
    #[error("type '{name}' refers to itself without indirection")]
    UnguardedCycle {
        /// Name (or table position) of the offending entry.
        name: String,
    },

    /// Two fields of one record or variant share an id.
    #[error("duplicate field id {id} ('{first}' and '{second}')")]
    DuplicateFieldId {
        /// The shared id.
        id: u32,
        /// First label carrying the id.
        first: String,
        /// Second label carrying the id.
        second: String,
    },

    /// Wire field or method list not strictly ascending.
    #[error("fields of type table entry {index} are not strictly ascending")]
    UnsortedFields {
        /// Table entry.
        index: usize,
    },

    /// Unknown type constructor code.
    #[error("unknown type opcode {opcode}")]
    UnknownOpcode {
        /// Opcode read from the wire.
        opcode: i128,
    },

    /// Unknown function annotation code.
    #[error("unknown function annotation {code}")]
    UnknownAnnotation {
        /// Annotation byte.
        code: u8,
    },

    /// A name that is not defined in the schema.
    #[error("unknown type '{name}'")]
    UnknownType {
        /// The unresolved name.
        name: String,
    },

    /// A name defined twice.
    #[error("duplicate definition of {kind} '{name}'")]
    DuplicateDefinition {
        /// Kind of definition (type, method, ...).
        kind: &'static str,
        /// Duplicated name.
        name: String,
    },

    /// A service method whose type is not a function.
    #[error("method '{name}' is not a function type")]
    InvalidMethodType {
        /// Method name.
        name: String,
    },

    /// A service definition whose type is not a service.
    #[error("actor type is not a service")]
    InvalidActorType,

    /// Type table larger than the decoder's limit.
    #[error("type table of {len} entries exceeds limit {limit}")]
    TableTooLarge {
        /// Declared length.
        len: u128,
        /// Configured limit.
        limit: usize,
    },

    /// A construct this implementation refuses to handle.
    #[error("unsupported: {message}")]
    Unsupported {
        /// Description.
        message: String,
    },
}

/// Path to the field, tag or argument an error refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Creates an empty (root) path.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Descends into a segment.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// Leaves the innermost segment.
    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

/// Structural mismatch between wire data and the type it is read as.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("subtype mismatch at {path}: {reason}")]
pub struct SubtypeError {
    /// Field path of the mismatch.
    pub path: FieldPath,
    /// Human-readable reason.
    pub reason: String,
}

impl SubtypeError {
    /// Creates a subtype error at `path`.
    pub fn new(path: &FieldPath, reason: impl Into<String>) -> Self {
        Self {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

/// A value that does not conform to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Value kind differs from the type kind.
    #[error("expected {expected} at {path}, found {found}")]
    KindMismatch {
        /// Field path.
        path: FieldPath,
        /// Expected type, in IDL syntax.
        expected: String,
        /// Kind of the value found.
        found: &'static str,
    },

    /// Required record field missing from the value.
    #[error("missing field {id} at {path}")]
    MissingField {
        /// Field path of the record.
        path: FieldPath,
        /// Missing field id.
        id: u32,
    },

    /// Record value carries a field its type does not declare.
    #[error("unknown field {id} at {path}")]
    UnknownField {
        /// Field path of the record.
        path: FieldPath,
        /// Unknown field id.
        id: u32,
    },

    /// Record value carries the same field twice.
    #[error("duplicate field {id} at {path}")]
    DuplicateField {
        /// Field path of the record.
        path: FieldPath,
        /// Duplicated field id.
        id: u32,
    },

    /// Variant value selects a tag its type does not declare.
    #[error("unknown variant tag {id} at {path}")]
    UnknownVariantTag {
        /// Field path of the variant.
        path: FieldPath,
        /// Selected tag id.
        id: u32,
    },

    /// Numeric literal outside the range of its annotated type.
    #[error("value {value} out of range for {ty} at {path}")]
    OutOfRange {
        /// Field path.
        path: FieldPath,
        /// Literal as text.
        value: String,
        /// Target type.
        ty: &'static str,
    },

    /// Argument count differs from the expected count.
    #[error("expected {expected} arguments, found {found}")]
    ArityMismatch {
        /// Expected count.
        expected: usize,
        /// Count found.
        found: usize,
    },

    /// An attempt to produce a value of type `empty`.
    #[error("type empty has no values (at {path})")]
    EmptyValue {
        /// Field path.
        path: FieldPath,
    },

    /// Encoder finished after one of its arguments failed.
    #[error("argument {arg} failed to encode, the message is incomplete")]
    IncompleteMessage {
        /// Position of the first failed argument.
        arg: usize,
    },

    /// Malformed principal text or bytes.
    #[error("invalid principal '{text}': {reason}")]
    InvalidPrincipal {
        /// Offending input.
        text: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl EncodingError {
    /// Kind mismatch at the root path.
    pub fn kind_mismatch(expected: impl Into<String>, found: &crate::value::Value) -> Self {
        Self::KindMismatch {
            path: FieldPath::new(),
            expected: expected.into(),
            found: found.kind_name(),
        }
    }
}

/// Core error type for IronIDL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Wire data error.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Type table error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Subtyping failure.
    #[error(transparent)]
    Subtype(#[from] SubtypeError),

    /// Value does not match its type.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Result type alias for IronIDL core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_display() {
        let mut path = FieldPath::new();
        assert_eq!(path.to_string(), "<root>");
        path.push("arg0");
        path.push("owner");
        assert_eq!(path.to_string(), "arg0.owner");
        path.pop();
        assert_eq!(path.to_string(), "arg0");
    }

    #[test]
    fn test_subtype_error_display() {
        let mut path = FieldPath::new();
        path.push("err");
        let err = SubtypeError::new(&path, "variant tag not known to the expected type");
        let msg = err.to_string();
        assert!(msg.contains("err"));
        assert!(msg.contains("subtype mismatch"));
    }

    #[test]
    fn test_buffer_error_display() {
        let err = BufferError::LengthOverflow {
            offset: 7,
            length: 1000,
            remaining: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("1000"));
        assert!(msg.contains("3 remaining"));
    }

    #[test]
    fn test_error_from_conversions() {
        let err: Error = SchemaError::InvalidActorType.into();
        assert!(matches!(err, Error::Schema(_)));

        let err: Error = BufferError::TrailingBytes { count: 2 }.into();
        assert!(matches!(err, Error::Buffer(BufferError::TrailingBytes { count: 2 })));
    }
}
