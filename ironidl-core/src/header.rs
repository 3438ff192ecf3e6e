//! Message header: format tag, type table and argument type list.
//!
//! Every message starts with the 4-byte tag `DIDL`, followed by the type
//! table (entry count, then one constructor per entry) and the list of
//! argument type references. Values follow the header.

use tracing::debug;

use crate::buffer::ReadBuffer;
use crate::decoder::DecoderConfig;
use crate::error::{BufferError, Error, SchemaError};
use crate::types::{Field, FuncMode, FuncType, Label, Type, TypeTable};

/// Format tag opening every message.
pub const MAGIC: &[u8; 4] = b"DIDL";

/// Constructor codes of composite type table entries.
pub mod opcode {
    /// `opt T`
    pub const OPT: i64 = -18;
    /// `vec T`
    pub const VEC: i64 = -19;
    /// `record { ... }`
    pub const RECORD: i64 = -20;
    /// `variant { ... }`
    pub const VARIANT: i64 = -21;
    /// `func (...) -> (...)`
    pub const FUNC: i64 = -22;
    /// `service { ... }`
    pub const SERVICE: i64 = -23;
}

/// Decoded message header.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    /// Type table sent by the producer.
    pub table: TypeTable,
    /// Argument types, referring into `table`.
    pub args: Vec<Type>,
}

impl MessageHeader {
    /// Reads the tag, type table and argument list.
    ///
    /// The table is built in two passes: one placeholder per entry is
    /// allocated first so entries may refer forward, then the bodies are
    /// filled in and the whole table is validated.
    ///
    /// # Errors
    /// Returns [`BufferError`] for malformed bytes and [`SchemaError`] for a
    /// malformed table.
    pub fn decode(reader: &mut ReadBuffer<'_>, config: &DecoderConfig) -> Result<Self, Error> {
        let magic = reader.get_bytes(MAGIC.len()).map_err(|_| BufferError::InvalidMagic {
            found: reader.get_bytes(reader.remaining()).unwrap_or_default().to_vec(),
        })?;
        if magic != MAGIC {
            return Err(BufferError::InvalidMagic {
                found: magic.to_vec(),
            }
            .into());
        }

        let start = reader.position();
        let declared = reader.get_uleb128()?;
        if declared > config.max_type_table_len() as u128 {
            return Err(SchemaError::TableTooLarge {
                len: declared,
                limit: config.max_type_table_len(),
            }
            .into());
        }
        if declared > reader.remaining() as u128 {
            return Err(BufferError::LengthOverflow {
                offset: start,
                length: declared,
                remaining: reader.remaining(),
            }
            .into());
        }
        #[allow(clippy::cast_possible_truncation)]
        let len = declared as usize;

        let mut table = TypeTable::with_placeholders(len);
        for index in 0..len {
            let entry = read_entry(reader, index, len)?;
            table.set(index, entry)?;
        }
        table.validate()?;

        let count = reader.get_len()?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            args.push(read_type_ref(reader, len)?);
        }

        debug!(
            table_len = len,
            arg_count = args.len(),
            "decoded message header"
        );
        Ok(Self { table, args })
    }
}

/// Reads a type reference: a primitive opcode or a table index.
fn read_type_ref(reader: &mut ReadBuffer<'_>, len: usize) -> Result<Type, Error> {
    let code = reader.get_sleb128()?;
    if code >= 0 {
        return match usize::try_from(code) {
            Ok(index) if index < len => Ok(Type::Ref(index)),
            _ => Err(SchemaError::DanglingReference {
                index: usize::try_from(code).unwrap_or(usize::MAX),
                len,
            }
            .into()),
        };
    }
    Type::from_opcode(code).ok_or_else(|| SchemaError::UnknownOpcode { opcode: code }.into())
}

fn read_entry(reader: &mut ReadBuffer<'_>, index: usize, len: usize) -> Result<Type, Error> {
    let code = reader.get_sleb128()?;
    let ty = match i64::try_from(code) {
        Ok(opcode::OPT) => Type::opt(read_type_ref(reader, len)?),
        Ok(opcode::VEC) => Type::vec(read_type_ref(reader, len)?),
        Ok(opcode::RECORD) => Type::Record(read_fields(reader, index, len)?),
        Ok(opcode::VARIANT) => Type::Variant(read_fields(reader, index, len)?),
        Ok(opcode::FUNC) => Type::Func(read_func(reader, len)?),
        Ok(opcode::SERVICE) => {
            let count = reader.get_len()?;
            let mut methods: Vec<(String, Type)> = Vec::with_capacity(count);
            for _ in 0..count {
                let name = reader.get_text()?.to_string();
                if methods.last().is_some_and(|(prev, _)| *prev >= name) {
                    return Err(SchemaError::UnsortedFields { index }.into());
                }
                let ty = read_type_ref(reader, len)?;
                methods.push((name, ty));
            }
            Type::Service(methods)
        }
        _ => return Err(SchemaError::UnknownOpcode { opcode: code }.into()),
    };
    Ok(ty)
}

fn read_fields(reader: &mut ReadBuffer<'_>, index: usize, len: usize) -> Result<Vec<Field>, Error> {
    let count = reader.get_len()?;
    let mut fields: Vec<Field> = Vec::with_capacity(count);
    for _ in 0..count {
        let id = reader.get_uleb128_u32()?;
        if fields.last().is_some_and(|prev| prev.id() >= id) {
            return Err(SchemaError::UnsortedFields { index }.into());
        }
        let ty = read_type_ref(reader, len)?;
        fields.push(Field {
            label: Label::Id(id),
            ty,
        });
    }
    Ok(fields)
}

fn read_func(reader: &mut ReadBuffer<'_>, len: usize) -> Result<FuncType, Error> {
    let mut func = FuncType::default();
    for _ in 0..reader.get_len()? {
        func.args.push(read_type_ref(reader, len)?);
    }
    for _ in 0..reader.get_len()? {
        func.rets.push(read_type_ref(reader, len)?);
    }
    for _ in 0..reader.get_len()? {
        let code = reader.get_u8()?;
        let mode = FuncMode::from_code(code).ok_or(SchemaError::UnknownAnnotation { code })?;
        func.modes.push(mode);
    }
    Ok(func)
}
