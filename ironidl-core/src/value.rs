//! Dynamically typed IDL values.
//!
//! This module provides:
//! - [`Value`], the value tree produced by the decoder and the value parser
//! - [`Value::annotate`], coercion of untyped literals to a declared type
//! - `Display` in the textual value syntax

use std::fmt;

use crate::error::{EncodingError, FieldPath};
use crate::principal::Principal;
use crate::types::{Label, Type, TypeTable, is_valid_identifier, write_quoted};

/// A labelled record field or chosen variant tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueField {
    /// Field label; only its id is significant.
    pub label: Label,
    /// Field value.
    pub value: Value,
}

impl ValueField {
    /// Creates a field named `name`.
    pub fn named(name: impl Into<String>, value: Value) -> Self {
        Self {
            label: Label::Named(name.into()),
            value,
        }
    }
}

/// Reference to a method of a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncRef {
    /// Service principal.
    pub principal: Principal,
    /// Method name.
    pub method: String,
}

impl FuncRef {
    /// Creates a method reference.
    pub fn new(principal: Principal, method: impl Into<String>) -> Self {
        Self {
            principal,
            method: method.into(),
        }
    }
}

/// An IDL value.
///
/// Equality follows the wire model: records compare as id to value maps
/// regardless of field order, and [`Value::Blob`] equals the matching
/// [`Value::Vec`] of [`Value::Nat8`].
#[derive(Debug, Clone)]
pub enum Value {
    /// `null`
    Null,
    /// `bool`
    Bool(bool),
    /// `nat`
    Nat(u128),
    /// `int`
    Int(i128),
    /// `nat8`
    Nat8(u8),
    /// `nat16`
    Nat16(u16),
    /// `nat32`
    Nat32(u32),
    /// `nat64`
    Nat64(u64),
    /// `int8`
    Int8(i8),
    /// `int16`
    Int16(i16),
    /// `int32`
    Int32(i32),
    /// `int64`
    Int64(i64),
    /// `float32`
    Float32(f32),
    /// `float64`
    Float64(f64),
    /// `text`
    Text(String),
    /// Placeholder for a value of type `reserved`.
    Reserved,
    /// `principal`
    Principal(Principal),
    /// `opt T`; `None` is the absent value.
    Opt(Option<Box<Value>>),
    /// `vec T`
    Vec(Vec<Value>),
    /// `vec nat8` in compact form.
    Blob(Vec<u8>),
    /// `record { ... }`, in any field order.
    Record(Vec<ValueField>),
    /// `variant { ... }` with the chosen tag.
    Variant(Box<ValueField>),
    /// `func` reference.
    Func(FuncRef),
    /// `service` reference.
    Service(Principal),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Reserved, Self::Reserved) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Nat(a), Self::Nat(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Nat8(a), Self::Nat8(b)) => a == b,
            (Self::Nat16(a), Self::Nat16(b)) => a == b,
            (Self::Nat32(a), Self::Nat32(b)) => a == b,
            (Self::Nat64(a), Self::Nat64(b)) => a == b,
            (Self::Int8(a), Self::Int8(b)) => a == b,
            (Self::Int16(a), Self::Int16(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float32(a), Self::Float32(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Principal(a), Self::Principal(b)) | (Self::Service(a), Self::Service(b)) => {
                a == b
            }
            (Self::Opt(a), Self::Opt(b)) => a == b,
            (Self::Vec(a), Self::Vec(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            (Self::Blob(bytes), Self::Vec(items)) | (Self::Vec(items), Self::Blob(bytes)) => {
                bytes.len() == items.len()
                    && bytes
                        .iter()
                        .zip(items)
                        .all(|(byte, item)| matches!(item, Self::Nat8(n) if n == byte))
            }
            (Self::Record(a), Self::Record(b)) => {
                a.len() == b.len()
                    && a.iter().all(|field| {
                        b.iter()
                            .find(|other| other.label == field.label)
                            .is_some_and(|other| other.value == field.value)
                    })
            }
            (Self::Variant(a), Self::Variant(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Wraps `value` as a present `opt`.
    #[must_use]
    pub fn some(value: Self) -> Self {
        Self::Opt(Some(Box::new(value)))
    }

    /// Builds a record from `(name, value)` pairs.
    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Self)>) -> Self {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, value)| ValueField::named(name, value))
                .collect(),
        )
    }

    /// Builds a variant value selecting tag `name`.
    pub fn variant(name: impl Into<String>, value: Self) -> Self {
        Self::Variant(Box::new(ValueField::named(name, value)))
    }

    /// Returns the kind name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Nat(_) => "nat",
            Self::Int(_) => "int",
            Self::Nat8(_) => "nat8",
            Self::Nat16(_) => "nat16",
            Self::Nat32(_) => "nat32",
            Self::Nat64(_) => "nat64",
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Text(_) => "text",
            Self::Reserved => "reserved",
            Self::Principal(_) => "principal",
            Self::Opt(_) => "opt",
            Self::Vec(_) => "vec",
            Self::Blob(_) => "blob",
            Self::Record(_) => "record",
            Self::Variant(_) => "variant",
            Self::Func(_) => "func",
            Self::Service(_) => "service",
        }
    }

    /// Returns the field with id `id` of a record value.
    #[must_use]
    pub fn field(&self, id: u32) -> Option<&Self> {
        match self {
            Self::Record(fields) => fields
                .iter()
                .find(|field| field.label.id() == id)
                .map(|field| &field.value),
            _ => None,
        }
    }

    /// Returns the default value of a defaultable type.
    ///
    /// `null` defaults to `null`, `opt T` to absent and `reserved` to
    /// [`Value::Reserved`]; every other type has no default.
    #[must_use]
    pub fn default_for(table: &TypeTable, ty: &Type) -> Option<Self> {
        match table.resolve(ty).ok()? {
            Type::Null => Some(Self::Null),
            Type::Opt(_) => Some(Self::Opt(None)),
            Type::Reserved => Some(Self::Reserved),
            _ => None,
        }
    }

    /// Coerces an untyped literal to `ty`.
    ///
    /// Numbers are narrowed or widened to the declared numeric kind, `null`
    /// becomes an absent `opt`, any value becomes [`Value::Reserved`] under
    /// `reserved`, and composite values are coerced field by field.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if the value cannot represent `ty`.
    pub fn annotate(self, table: &TypeTable, ty: &Type) -> Result<Self, EncodingError> {
        let mut path = FieldPath::new();
        annotate_at(self, table, ty, &mut path)
    }
}

fn annotate_at(
    value: Value,
    table: &TypeTable,
    ty: &Type,
    path: &mut FieldPath,
) -> Result<Value, EncodingError> {
    let resolved = table.resolve(ty).map_err(|_| EncodingError::KindMismatch {
        path: path.clone(),
        expected: table.display(ty).to_string(),
        found: value.kind_name(),
    })?;
    let mismatch = |value: &Value, path: &FieldPath| EncodingError::KindMismatch {
        path: path.clone(),
        expected: table.display(resolved).to_string(),
        found: value.kind_name(),
    };

    let coerced = match (resolved, value) {
        (Type::Reserved, _) => Value::Reserved,
        (Type::Empty, _) => return Err(EncodingError::EmptyValue { path: path.clone() }),
        (Type::Nat, Value::Nat(n)) => Value::Nat(n),
        (Type::Nat, Value::Int(i)) => Value::Nat(narrow(i, "nat", path)?),
        (Type::Int, Value::Int(i)) => Value::Int(i),
        (Type::Int, Value::Nat(n)) => Value::Int(narrow(n, "int", path)?),
        (Type::Nat8, v @ (Value::Nat(_) | Value::Int(_) | Value::Nat8(_))) => {
            Value::Nat8(narrow(integer(&v), "nat8", path)?)
        }
        (Type::Nat16, v @ (Value::Nat(_) | Value::Int(_) | Value::Nat16(_))) => {
            Value::Nat16(narrow(integer(&v), "nat16", path)?)
        }
        (Type::Nat32, v @ (Value::Nat(_) | Value::Int(_) | Value::Nat32(_))) => {
            Value::Nat32(narrow(integer(&v), "nat32", path)?)
        }
        (Type::Nat64, v @ (Value::Nat(_) | Value::Int(_) | Value::Nat64(_))) => {
            Value::Nat64(narrow(integer(&v), "nat64", path)?)
        }
        (Type::Int8, v @ (Value::Nat(_) | Value::Int(_) | Value::Int8(_))) => {
            Value::Int8(narrow(integer(&v), "int8", path)?)
        }
        (Type::Int16, v @ (Value::Nat(_) | Value::Int(_) | Value::Int16(_))) => {
            Value::Int16(narrow(integer(&v), "int16", path)?)
        }
        (Type::Int32, v @ (Value::Nat(_) | Value::Int(_) | Value::Int32(_))) => {
            Value::Int32(narrow(integer(&v), "int32", path)?)
        }
        (Type::Int64, v @ (Value::Nat(_) | Value::Int(_) | Value::Int64(_))) => {
            Value::Int64(narrow(integer(&v), "int64", path)?)
        }
        #[allow(clippy::cast_possible_truncation)]
        (Type::Float32, Value::Float64(x)) => Value::Float32(x as f32),
        #[allow(clippy::cast_precision_loss)]
        (Type::Float32, v @ (Value::Nat(_) | Value::Int(_))) => Value::Float32(integer(&v) as f32),
        (Type::Float32, Value::Float32(x)) => Value::Float32(x),
        (Type::Float64, Value::Float32(x)) => Value::Float64(f64::from(x)),
        #[allow(clippy::cast_precision_loss)]
        (Type::Float64, v @ (Value::Nat(_) | Value::Int(_))) => Value::Float64(integer(&v) as f64),
        (Type::Float64, Value::Float64(x)) => Value::Float64(x),
        (Type::Null, Value::Null) => Value::Null,
        (Type::Bool, Value::Bool(b)) => Value::Bool(b),
        (Type::Text, Value::Text(s)) => Value::Text(s),
        (Type::Principal, Value::Principal(p)) => Value::Principal(p),
        (Type::Opt(_), Value::Null | Value::Opt(None)) => Value::Opt(None),
        (Type::Opt(inner), Value::Opt(Some(v))) => {
            Value::some(annotate_at(*v, table, inner, path)?)
        }
        (Type::Vec(inner), Value::Blob(bytes)) => {
            if matches!(table.resolve(inner), Ok(Type::Nat8)) {
                Value::Blob(bytes)
            } else {
                let items = bytes.into_iter().map(|b| Value::Nat(u128::from(b)));
                Value::Vec(annotate_items(items, table, inner, path)?)
            }
        }
        (Type::Vec(inner), Value::Vec(items)) => {
            Value::Vec(annotate_items(items.into_iter(), table, inner, path)?)
        }
        (Type::Record(fields), Value::Record(values)) => {
            let mut out = Vec::with_capacity(values.len());
            for field in values {
                let value = match fields.iter().find(|f| f.label == field.label) {
                    Some(declared) => {
                        path.push(declared.label.to_string());
                        let value = annotate_at(field.value, table, &declared.ty, path)?;
                        path.pop();
                        value
                    }
                    None => field.value,
                };
                out.push(ValueField {
                    label: field.label,
                    value,
                });
            }
            Value::Record(out)
        }
        (Type::Variant(fields), Value::Variant(chosen)) => {
            let ValueField { label, value } = *chosen;
            let declared = fields
                .iter()
                .find(|f| f.label == label)
                .ok_or_else(|| EncodingError::UnknownVariantTag {
                    path: path.clone(),
                    id: label.id(),
                })?;
            path.push(declared.label.to_string());
            let value = annotate_at(value, table, &declared.ty, path)?;
            path.pop();
            Value::Variant(Box::new(ValueField { label, value }))
        }
        (Type::Func(_), Value::Func(f)) => Value::Func(f),
        (Type::Service(_), Value::Service(p)) => Value::Service(p),
        (_, other) => return Err(mismatch(&other, path)),
    };
    Ok(coerced)
}

fn annotate_items(
    items: impl Iterator<Item = Value>,
    table: &TypeTable,
    inner: &Type,
    path: &mut FieldPath,
) -> Result<Vec<Value>, EncodingError> {
    items
        .enumerate()
        .map(|(i, item)| {
            path.push(i.to_string());
            let item = annotate_at(item, table, inner, path);
            path.pop();
            item
        })
        .collect()
}

fn integer(value: &Value) -> i128 {
    match value {
        Value::Nat(n) => i128::try_from(*n).unwrap_or(i128::MAX),
        Value::Int(i) => *i,
        Value::Nat8(n) => i128::from(*n),
        Value::Nat16(n) => i128::from(*n),
        Value::Nat32(n) => i128::from(*n),
        Value::Nat64(n) => i128::from(*n),
        Value::Int8(i) => i128::from(*i),
        Value::Int16(i) => i128::from(*i),
        Value::Int32(i) => i128::from(*i),
        Value::Int64(i) => i128::from(*i),
        _ => 0,
    }
}

fn narrow<S, T>(value: S, ty: &'static str, path: &FieldPath) -> Result<T, EncodingError>
where
    S: Copy + fmt::Display,
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| EncodingError::OutOfRange {
        path: path.clone(),
        value: value.to_string(),
        ty,
    })
}

/// Writes a float so the value grammar reads it back, `nan` and `inf` included.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        write!(f, "{x:?}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nat(n) => write!(f, "{n}"),
            Self::Int(i) => write!(f, "{i:+}"),
            Self::Nat8(n) => write!(f, "({n} : nat8)"),
            Self::Nat16(n) => write!(f, "({n} : nat16)"),
            Self::Nat32(n) => write!(f, "({n} : nat32)"),
            Self::Nat64(n) => write!(f, "({n} : nat64)"),
            Self::Int8(i) => write!(f, "({i:+} : int8)"),
            Self::Int16(i) => write!(f, "({i:+} : int16)"),
            Self::Int32(i) => write!(f, "({i:+} : int32)"),
            Self::Int64(i) => write!(f, "({i:+} : int64)"),
            Self::Float32(x) => {
                if x.is_finite() {
                    write!(f, "({x:?} : float32)")
                } else {
                    f.write_str("(")?;
                    write_float(f, f64::from(*x))?;
                    f.write_str(" : float32)")
                }
            }
            Self::Float64(x) => write_float(f, *x),
            Self::Text(s) => write_quoted(f, s),
            Self::Reserved => f.write_str("(null : reserved)"),
            Self::Principal(p) => write!(f, "principal \"{p}\""),
            Self::Opt(None) => f.write_str("null"),
            Self::Opt(Some(v)) => write!(f, "opt {v}"),
            Self::Vec(items) => {
                if items.is_empty() {
                    return f.write_str("vec {}");
                }
                f.write_str("vec { ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(" }")
            }
            Self::Blob(bytes) => {
                f.write_str("blob \"")?;
                for &b in bytes {
                    if b.is_ascii_graphic() && b != b'"' && b != b'\\' || b == b' ' {
                        write!(f, "{}", char::from(b))?;
                    } else {
                        write!(f, "\\{b:02x}")?;
                    }
                }
                f.write_str("\"")
            }
            Self::Record(fields) => {
                if fields.is_empty() {
                    return f.write_str("record {}");
                }
                let tuple = fields
                    .iter()
                    .zip(0u32..)
                    .all(|(field, i)| matches!(field.label, Label::Unnamed(n) if n == i));
                f.write_str("record { ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if tuple {
                        write!(f, "{}", field.value)?;
                    } else {
                        write!(f, "{} = {}", field.label, field.value)?;
                    }
                }
                f.write_str(" }")
            }
            Self::Variant(field) => match field.value {
                Self::Null => write!(f, "variant {{ {} }}", field.label),
                ref value => write!(f, "variant {{ {} = {value} }}", field.label),
            },
            Self::Func(func) => {
                write!(f, "func \"{}\".", func.principal)?;
                if is_valid_identifier(&func.method) {
                    f.write_str(&func.method)
                } else {
                    write_quoted(f, &func.method)
                }
            }
            Self::Service(p) => write!(f, "service \"{p}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_narrows_numbers() {
        let table = TypeTable::new();
        assert_eq!(
            Value::Nat(42).annotate(&table, &Type::Nat8).unwrap(),
            Value::Nat8(42)
        );
        assert_eq!(
            Value::Int(-3).annotate(&table, &Type::Int16).unwrap(),
            Value::Int16(-3)
        );
        assert_eq!(
            Value::Nat(7).annotate(&table, &Type::Int).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            Value::Nat(2).annotate(&table, &Type::Float64).unwrap(),
            Value::Float64(2.0)
        );
    }

    #[test]
    fn test_annotate_out_of_range() {
        let table = TypeTable::new();
        let err = Value::Nat(256).annotate(&table, &Type::Nat8).unwrap_err();
        assert!(matches!(err, EncodingError::OutOfRange { ty: "nat8", .. }));
        let err = Value::Int(-1).annotate(&table, &Type::Nat).unwrap_err();
        assert!(matches!(err, EncodingError::OutOfRange { ty: "nat", .. }));
    }

    #[test]
    fn test_annotate_composites() {
        let mut table = TypeTable::new();
        let small = table.define("Small", Type::Nat16).unwrap();
        let ty = Type::record([
            ("a", Type::opt(Type::Ref(small))),
            ("b", Type::vec(Type::Int8)),
            ("c", Type::Reserved),
        ]);
        let value = Value::record([
            ("a", Value::some(Value::Nat(5))),
            ("b", Value::Vec(vec![Value::Int(-1), Value::Nat(1)])),
            ("c", Value::Text("ignored".to_string())),
        ]);
        let annotated = value.annotate(&table, &ty).unwrap();
        assert_eq!(
            annotated,
            Value::record([
                ("a", Value::some(Value::Nat16(5))),
                ("b", Value::Vec(vec![Value::Int8(-1), Value::Int8(1)])),
                ("c", Value::Reserved),
            ])
        );
    }

    #[test]
    fn test_annotate_reports_path() {
        let table = TypeTable::new();
        let ty = Type::record([("owner", Type::record([("age", Type::Nat8)]))]);
        let value = Value::record([("owner", Value::record([("age", Value::Nat(300))]))]);
        match value.annotate(&table, &ty).unwrap_err() {
            EncodingError::OutOfRange { path, .. } => assert_eq!(path.to_string(), "owner.age"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_annotate_unknown_variant_tag() {
        let table = TypeTable::new();
        let ty = Type::variant([("ok", Type::Nat)]);
        let err = Value::variant("err", Value::Text("boom".to_string()))
            .annotate(&table, &ty)
            .unwrap_err();
        assert!(matches!(err, EncodingError::UnknownVariantTag { .. }));
    }

    #[test]
    fn test_default_for() {
        let table = TypeTable::new();
        assert_eq!(
            Value::default_for(&table, &Type::opt(Type::Nat)),
            Some(Value::Opt(None))
        );
        assert_eq!(Value::default_for(&table, &Type::Null), Some(Value::Null));
        assert_eq!(
            Value::default_for(&table, &Type::Reserved),
            Some(Value::Reserved)
        );
        assert_eq!(Value::default_for(&table, &Type::Nat), None);
    }

    #[test]
    fn test_display_value_syntax() {
        let value = Value::record([
            ("name", Value::Text("a\"b".to_string())),
            ("age", Value::Nat8(7)),
            ("delta", Value::Int(-2)),
            ("tags", Value::Vec(vec![Value::Nat(1), Value::Nat(2)])),
            ("raw", Value::Blob(vec![b'h', b'i', 0x00])),
        ]);
        assert_eq!(
            value.to_string(),
            r#"record { name = "a\"b"; age = (7 : nat8); delta = -2; tags = vec { 1; 2 }; raw = blob "hi\00" }"#
        );
        assert_eq!(
            Value::variant("none", Value::Null).to_string(),
            "variant { none }"
        );
        assert_eq!(Value::Int(5).to_string(), "+5");
        assert_eq!(Value::Float64(f64::NAN).to_string(), "nan");
        assert_eq!(Value::Float64(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(
            Value::Float32(f32::INFINITY).to_string(),
            "(inf : float32)"
        );
        assert_eq!(Value::Float32(0.5).to_string(), "(0.5 : float32)");
        assert_eq!(
            Value::Principal(Principal::anonymous()).to_string(),
            "principal \"2vxsx-fae\""
        );
    }

    #[test]
    fn test_record_equality_ignores_field_order() {
        let ab = Value::record([("a", Value::Nat(1)), ("b", Value::Text("x".to_string()))]);
        let ba = Value::record([("b", Value::Text("x".to_string())), ("a", Value::Nat(1))]);
        assert_eq!(ab, ba);
        assert_ne!(ab, Value::record([("a", Value::Nat(1))]));
        assert_ne!(ab, Value::record([("a", Value::Nat(2)), ("b", Value::Text("x".to_string()))]));
    }

    #[test]
    fn test_blob_equals_nat8_vector() {
        let blob = Value::Blob(vec![1, 2]);
        let items = Value::Vec(vec![Value::Nat8(1), Value::Nat8(2)]);
        assert_eq!(blob, items);
        assert_eq!(items, blob);
        assert_eq!(Value::Blob(Vec::new()), Value::Vec(Vec::new()));
        assert_ne!(blob, Value::Vec(vec![Value::Nat(1), Value::Nat(2)]));
        assert_ne!(blob, Value::Vec(vec![Value::Nat8(1)]));
    }
}
