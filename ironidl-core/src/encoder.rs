//! Message encoder.
//!
//! [`Encoder`] collects typed arguments and produces a complete message:
//! format tag, the type table of every type the arguments reach, the
//! argument type list and finally the argument values.
//!
//! # Example
//!
//! ```
//! use ironidl_core::{Encoder, Type, TypeTable, Value};
//!
//! let table = TypeTable::new();
//! let mut encoder = Encoder::new(&table);
//! encoder.arg(&Type::Nat, &Value::Nat(42)).unwrap();
//! let bytes = encoder.finish().unwrap();
//! assert_eq!(bytes, b"DIDL\x00\x01\x7d\x2a");
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::buffer::WriteBuffer;
use crate::error::{EncodingError, Error, FieldPath};
use crate::header::{MAGIC, opcode};
use crate::types::{Field, Type, TypeTable};
use crate::value::{Value, ValueField};

/// Builds a message from typed arguments.
#[derive(Debug)]
pub struct Encoder<'a> {
    table: &'a TypeTable,
    types: TypeSerializer<'a>,
    args: Vec<i128>,
    values: WriteBuffer,
    failed: Option<usize>,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder for types living in `table`.
    #[must_use]
    pub fn new(table: &'a TypeTable) -> Self {
        Self {
            table,
            types: TypeSerializer::new(table),
            args: Vec::new(),
            values: WriteBuffer::with_capacity(64),
            failed: None,
        }
    }

    /// Appends an argument.
    ///
    /// After an error the encoder is poisoned: later arguments are
    /// rejected and [`Encoder::finish`] fails.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if `value` does not conform to `ty`, or
    /// [`crate::SchemaError`] for a malformed table.
    pub fn arg(&mut self, ty: &Type, value: &Value) -> Result<&mut Self, Error> {
        if let Some(arg) = self.failed {
            return Err(EncodingError::IncompleteMessage { arg }.into());
        }
        match self.write_arg(ty, value) {
            Ok(()) => Ok(self),
            Err(err) => {
                self.failed = Some(self.args.len());
                Err(err)
            }
        }
    }

    fn write_arg(&mut self, ty: &Type, value: &Value) -> Result<(), Error> {
        let type_ref = self.types.type_ref(ty)?;
        let mut path = FieldPath::new();
        path.push(format!("arg{}", self.args.len()));
        let mut writer = ValueWriter {
            table: self.table,
            out: &mut self.values,
            path,
        };
        writer.write(ty, value)?;
        self.args.push(type_ref);
        Ok(())
    }

    /// Returns the number of arguments added so far.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Assembles the message.
    ///
    /// # Errors
    /// Returns [`EncodingError::IncompleteMessage`] if an argument failed.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        if let Some(arg) = self.failed {
            return Err(EncodingError::IncompleteMessage { arg }.into());
        }
        let table_len: usize = self.types.entries.iter().map(Vec::len).sum();
        let mut out = WriteBuffer::with_capacity(
            MAGIC.len() + table_len + self.args.len() * 2 + self.values.len() + 4,
        );
        out.put_bytes(MAGIC);
        out.put_uleb128(self.types.entries.len() as u128);
        for entry in &self.types.entries {
            out.put_bytes(entry);
        }
        out.put_uleb128(self.args.len() as u128);
        for type_ref in &self.args {
            out.put_sleb128(*type_ref);
        }
        out.put_bytes(self.values.as_slice());

        debug!(
            table_len = self.types.entries.len(),
            arg_count = self.args.len(),
            bytes = out.len(),
            "encoded message"
        );
        Ok(out.into_inner())
    }
}

/// Encodes `(type, value)` pairs as one message.
///
/// # Errors
/// See [`Encoder::arg`].
pub fn encode_args(table: &TypeTable, args: &[(Type, Value)]) -> Result<Vec<u8>, Error> {
    let mut encoder = Encoder::new(table);
    for (ty, value) in args {
        encoder.arg(ty, value)?;
    }
    encoder.finish()
}

/// Serializes the wire type table.
///
/// Each local table entry maps to at most one wire entry. A wire slot is
/// reserved before the entry body is written, so recursive entries refer to
/// their own slot. Anonymous inline composites are deduplicated by their
/// encoded bytes.
#[derive(Debug)]
struct TypeSerializer<'a> {
    table: &'a TypeTable,
    entries: Vec<Vec<u8>>,
    by_index: HashMap<usize, i128>,
    by_bytes: HashMap<Vec<u8>, i128>,
}

impl<'a> TypeSerializer<'a> {
    fn new(table: &'a TypeTable) -> Self {
        Self {
            table,
            entries: Vec::new(),
            by_index: HashMap::new(),
            by_bytes: HashMap::new(),
        }
    }

    /// Returns the wire reference for `ty`, serializing entries as needed.
    fn type_ref(&mut self, ty: &Type) -> Result<i128, Error> {
        if let Some(code) = ty.opcode() {
            return Ok(i128::from(code));
        }
        match ty {
            Type::Ref(index) => {
                if let Some(wire) = self.by_index.get(index) {
                    return Ok(*wire);
                }
                let table = self.table;
                let entry = table.entry(*index)?;
                if matches!(entry, Type::Ref(_)) || entry.is_primitive() {
                    table.resolve(entry)?;
                    let wire = self.type_ref(entry)?;
                    self.by_index.insert(*index, wire);
                    return Ok(wire);
                }
                let slot = self.entries.len();
                self.entries.push(Vec::new());
                self.by_index.insert(*index, slot as i128);
                self.entries[slot] = self.entry_bytes(entry)?;
                Ok(slot as i128)
            }
            composite => {
                let body = self.entry_bytes(composite)?;
                if let Some(wire) = self.by_bytes.get(&body) {
                    return Ok(*wire);
                }
                let slot = self.entries.len() as i128;
                self.entries.push(body.clone());
                self.by_bytes.insert(body, slot);
                Ok(slot)
            }
        }
    }

    fn entry_bytes(&mut self, ty: &Type) -> Result<Vec<u8>, Error> {
        let mut out = WriteBuffer::new();
        match ty {
            Type::Opt(inner) => {
                let inner = self.type_ref(inner)?;
                out.put_sleb128(i128::from(opcode::OPT));
                out.put_sleb128(inner);
            }
            Type::Vec(inner) => {
                let inner = self.type_ref(inner)?;
                out.put_sleb128(i128::from(opcode::VEC));
                out.put_sleb128(inner);
            }
            Type::Record(fields) => self.write_fields(&mut out, opcode::RECORD, fields)?,
            Type::Variant(fields) => self.write_fields(&mut out, opcode::VARIANT, fields)?,
            Type::Func(func) => {
                let args = self.type_refs(&func.args)?;
                let rets = self.type_refs(&func.rets)?;
                out.put_sleb128(i128::from(opcode::FUNC));
                for refs in [&args, &rets] {
                    out.put_uleb128(refs.len() as u128);
                    for type_ref in refs {
                        out.put_sleb128(*type_ref);
                    }
                }
                out.put_uleb128(func.modes.len() as u128);
                for mode in &func.modes {
                    out.put_u8(mode.code());
                }
            }
            Type::Service(methods) => {
                let mut sorted: Vec<&(String, Type)> = methods.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                let mut refs = Vec::with_capacity(sorted.len());
                for (_, ty) in &sorted {
                    refs.push(self.type_ref(ty)?);
                }
                out.put_sleb128(i128::from(opcode::SERVICE));
                out.put_uleb128(sorted.len() as u128);
                for ((name, _), type_ref) in sorted.iter().zip(refs) {
                    out.put_text(name);
                    out.put_sleb128(type_ref);
                }
            }
            primitive => {
                let code = primitive.opcode().unwrap_or_default();
                out.put_sleb128(i128::from(code));
            }
        }
        Ok(out.into_inner())
    }

    fn type_refs(&mut self, types: &[Type]) -> Result<Vec<i128>, Error> {
        types.iter().map(|ty| self.type_ref(ty)).collect()
    }

    fn write_fields(
        &mut self,
        out: &mut WriteBuffer,
        code: i64,
        fields: &[Field],
    ) -> Result<(), Error> {
        let mut sorted: Vec<&Field> = fields.iter().collect();
        sorted.sort_by_key(|field| field.id());
        let refs = sorted
            .iter()
            .map(|field| self.type_ref(&field.ty))
            .collect::<Result<Vec<_>, _>>()?;
        out.put_sleb128(i128::from(code));
        out.put_uleb128(sorted.len() as u128);
        for (field, type_ref) in sorted.iter().zip(refs) {
            out.put_uleb128(u128::from(field.id()));
            out.put_sleb128(type_ref);
        }
        Ok(())
    }
}

/// Writes values against their declared types.
struct ValueWriter<'a, 'b> {
    table: &'a TypeTable,
    out: &'b mut WriteBuffer,
    path: FieldPath,
}

impl ValueWriter<'_, '_> {
    fn mismatch(&self, ty: &Type, value: &Value) -> Error {
        EncodingError::KindMismatch {
            path: self.path.clone(),
            expected: self.table.display(ty).to_string(),
            found: value.kind_name(),
        }
        .into()
    }

    fn write(&mut self, ty: &Type, value: &Value) -> Result<(), Error> {
        let resolved = self.table.resolve(ty)?;
        match (resolved, value) {
            (Type::Reserved, _) | (Type::Null, Value::Null) => {}
            (Type::Empty, _) => {
                return Err(EncodingError::EmptyValue {
                    path: self.path.clone(),
                }
                .into());
            }
            (Type::Bool, Value::Bool(b)) => self.out.put_u8(u8::from(*b)),
            (Type::Nat, Value::Nat(n)) => self.out.put_uleb128(*n),
            (Type::Int, Value::Int(i)) => self.out.put_sleb128(*i),
            (Type::Nat8, Value::Nat8(n)) => self.out.put_u8(*n),
            (Type::Nat16, Value::Nat16(n)) => self.out.put_u16_le(*n),
            (Type::Nat32, Value::Nat32(n)) => self.out.put_u32_le(*n),
            (Type::Nat64, Value::Nat64(n)) => self.out.put_u64_le(*n),
            (Type::Int8, Value::Int8(i)) => self.out.put_bytes(&i.to_le_bytes()),
            (Type::Int16, Value::Int16(i)) => self.out.put_bytes(&i.to_le_bytes()),
            (Type::Int32, Value::Int32(i)) => self.out.put_bytes(&i.to_le_bytes()),
            (Type::Int64, Value::Int64(i)) => self.out.put_bytes(&i.to_le_bytes()),
            (Type::Float32, Value::Float32(x)) => self.out.put_f32_le(*x),
            (Type::Float64, Value::Float64(x)) => self.out.put_f64_le(*x),
            (Type::Text, Value::Text(s)) => self.out.put_text(s),
            (Type::Principal, Value::Principal(p)) | (Type::Service(_), Value::Service(p)) => {
                self.out.put_u8(1);
                self.out.put_blob(p.as_slice());
            }
            (Type::Func(_), Value::Func(func)) => {
                self.out.put_u8(1);
                self.out.put_u8(1);
                self.out.put_blob(func.principal.as_slice());
                self.out.put_text(&func.method);
            }
            (Type::Opt(_), Value::Null | Value::Opt(None)) => self.out.put_u8(0),
            (Type::Opt(inner), Value::Opt(Some(v))) => {
                self.out.put_u8(1);
                self.write(inner, v)?;
            }
            (Type::Vec(inner), Value::Blob(bytes)) => {
                if !matches!(self.table.resolve(inner)?, Type::Nat8) {
                    return Err(self.mismatch(resolved, value));
                }
                self.out.put_blob(bytes);
            }
            (Type::Vec(inner), Value::Vec(items)) => {
                self.out.put_uleb128(items.len() as u128);
                for (i, item) in items.iter().enumerate() {
                    self.path.push(i.to_string());
                    self.write(inner, item)?;
                    self.path.pop();
                }
            }
            (Type::Record(fields), Value::Record(values)) => self.write_record(fields, values)?,
            (Type::Variant(fields), Value::Variant(chosen)) => {
                let mut sorted: Vec<&Field> = fields.iter().collect();
                sorted.sort_by_key(|field| field.id());
                let index = sorted
                    .iter()
                    .position(|field| field.label == chosen.label)
                    .ok_or_else(|| EncodingError::UnknownVariantTag {
                        path: self.path.clone(),
                        id: chosen.label.id(),
                    })?;
                self.out.put_uleb128(index as u128);
                self.path.push(sorted[index].label.to_string());
                self.write(&sorted[index].ty, &chosen.value)?;
                self.path.pop();
            }
            _ => return Err(self.mismatch(resolved, value)),
        }
        Ok(())
    }

    fn write_record(&mut self, fields: &[Field], values: &[ValueField]) -> Result<(), Error> {
        for (i, value) in values.iter().enumerate() {
            if values[..i].iter().any(|prev| prev.label == value.label) {
                return Err(EncodingError::DuplicateField {
                    path: self.path.clone(),
                    id: value.label.id(),
                }
                .into());
            }
            if !fields.iter().any(|field| field.label == value.label) {
                return Err(EncodingError::UnknownField {
                    path: self.path.clone(),
                    id: value.label.id(),
                }
                .into());
            }
        }

        let mut sorted: Vec<&Field> = fields.iter().collect();
        sorted.sort_by_key(|field| field.id());
        for field in sorted {
            self.path.push(field.label.to_string());
            match values.iter().find(|value| value.label == field.label) {
                Some(value) => self.write(&field.ty, &value.value)?,
                None => {
                    let default = Value::default_for(self.table, &field.ty).ok_or_else(|| {
                        EncodingError::MissingField {
                            path: self.path.clone(),
                            id: field.id(),
                        }
                    })?;
                    self.write(&field.ty, &default)?;
                }
            }
            self.path.pop();
        }
        Ok(())
    }
}
