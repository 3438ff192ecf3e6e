//! Static Rust types with an IDL counterpart.
//!
//! [`IdlType`] connects a Rust type to its IDL type and converts values in
//! both directions. Types register themselves in a [`TypeBuilder`], which
//! assigns each nominal Rust type one table entry, so recursive Rust types
//! map to recursive table entries.

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::EncodingError;
use crate::principal::Principal;
use crate::types::{Type, TypeTable};
use crate::value::{FuncRef, Value, ValueField};

/// A Rust type with an IDL representation.
pub trait IdlType: Sized {
    /// Returns the IDL type, registering named entries in `builder`.
    fn idl_type(builder: &mut TypeBuilder) -> Type;

    /// Converts to a dynamic value.
    fn to_value(&self) -> Value;

    /// Converts from a decoded value.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if `value` has the wrong shape.
    fn from_value(value: Value) -> Result<Self, EncodingError>;
}

/// Collects the table entries of Rust types.
#[derive(Debug, Default)]
pub struct TypeBuilder {
    table: TypeTable,
    registered: HashMap<TypeId, usize>,
}

impl TypeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the IDL type of `T`.
    pub fn add<T: IdlType>(&mut self) -> Type {
        T::idl_type(self)
    }

    /// Registers the nominal type `T` under `name`, returning a reference.
    ///
    /// `body` runs once per type; recursive occurrences of `T` inside the
    /// body resolve to the same reference. If `name` is already taken by a
    /// different type the entry stays anonymous.
    pub fn register<T: 'static>(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self) -> Type,
    ) -> Type {
        let key = TypeId::of::<T>();
        if let Some(index) = self.registered.get(&key) {
            return Type::Ref(*index);
        }
        let index = self.table.reserve();
        self.table.try_name(index, name);
        self.registered.insert(key, index);
        let ty = body(self);
        let filled = self.table.set(index, ty);
        debug_assert!(filled.is_ok(), "reserved index {index} out of range");
        Type::Ref(index)
    }

    /// Returns the table built so far.
    #[must_use]
    pub const fn table(&self) -> &TypeTable {
        &self.table
    }

    /// Consumes the builder, returning its table.
    #[must_use]
    pub fn into_table(self) -> TypeTable {
        self.table
    }
}

/// Sentinel for the IDL type `reserved`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Reserved;

/// Sentinel for the IDL type `empty`; has no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Empty {}

/// Takes the field with id `id` out of a record value.
///
/// Absent fields are read from `null`, which succeeds for `Option`,
/// [`Reserved`] and `()`.
///
/// # Errors
/// Returns [`EncodingError`] if the field fails to convert.
pub fn take_field<T: IdlType>(fields: &mut Vec<ValueField>, id: u32) -> Result<T, EncodingError> {
    match fields.iter().position(|field| field.label.id() == id) {
        Some(index) => T::from_value(fields.swap_remove(index).value),
        None => T::from_value(Value::Null).map_err(|_| EncodingError::MissingField {
            path: crate::error::FieldPath::new(),
            id,
        }),
    }
}

macro_rules! impl_primitive {
    ($($rust:ty => $idl:ident),* $(,)?) => {
        $(
            impl IdlType for $rust {
                fn idl_type(_: &mut TypeBuilder) -> Type {
                    Type::$idl
                }

                fn to_value(&self) -> Value {
                    Value::$idl(self.clone())
                }

                fn from_value(value: Value) -> Result<Self, EncodingError> {
                    match value {
                        Value::$idl(v) => Ok(v),
                        other => Err(EncodingError::kind_mismatch(stringify!($idl), &other)),
                    }
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    u128 => Nat,
    i128 => Int,
    u8 => Nat8,
    u16 => Nat16,
    u32 => Nat32,
    u64 => Nat64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    Principal => Principal,
}

impl IdlType for () {
    fn idl_type(_: &mut TypeBuilder) -> Type {
        Type::Null
    }

    fn to_value(&self) -> Value {
        Value::Null
    }

    fn from_value(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Null => Ok(()),
            other => Err(EncodingError::kind_mismatch("null", &other)),
        }
    }
}

impl IdlType for Reserved {
    fn idl_type(_: &mut TypeBuilder) -> Type {
        Type::Reserved
    }

    fn to_value(&self) -> Value {
        Value::Reserved
    }

    fn from_value(_: Value) -> Result<Self, EncodingError> {
        Ok(Self)
    }
}

impl IdlType for Empty {
    fn idl_type(_: &mut TypeBuilder) -> Type {
        Type::Empty
    }

    fn to_value(&self) -> Value {
        match *self {}
    }

    fn from_value(_: Value) -> Result<Self, EncodingError> {
        Err(EncodingError::EmptyValue {
            path: crate::error::FieldPath::new(),
        })
    }
}

impl<T: IdlType> IdlType for Option<T> {
    fn idl_type(builder: &mut TypeBuilder) -> Type {
        Type::opt(T::idl_type(builder))
    }

    fn to_value(&self) -> Value {
        Value::Opt(self.as_ref().map(|v| Box::new(v.to_value())))
    }

    fn from_value(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Null | Value::Opt(None) | Value::Reserved => Ok(None),
            Value::Opt(Some(inner)) => T::from_value(*inner).map(Some),
            other => Err(EncodingError::kind_mismatch("opt", &other)),
        }
    }
}

impl<T: IdlType> IdlType for Vec<T> {
    fn idl_type(builder: &mut TypeBuilder) -> Type {
        Type::vec(T::idl_type(builder))
    }

    fn to_value(&self) -> Value {
        Value::Vec(self.iter().map(IdlType::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Vec(items) => items.into_iter().map(T::from_value).collect(),
            Value::Blob(bytes) => bytes
                .into_iter()
                .map(|b| T::from_value(Value::Nat8(b)))
                .collect(),
            other => Err(EncodingError::kind_mismatch("vec", &other)),
        }
    }
}

impl<T: IdlType> IdlType for Box<T> {
    fn idl_type(builder: &mut TypeBuilder) -> Type {
        T::idl_type(builder)
    }

    fn to_value(&self) -> Value {
        self.as_ref().to_value()
    }

    fn from_value(value: Value) -> Result<Self, EncodingError> {
        T::from_value(value).map(Box::new)
    }
}

impl IdlType for FuncRef {
    /// A bare reference has no signature; generated bindings wrap it in a
    /// newtype that supplies one.
    fn idl_type(_: &mut TypeBuilder) -> Type {
        Type::Func(crate::types::FuncType::default())
    }

    fn to_value(&self) -> Value {
        Value::Func(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Func(func) => Ok(func),
            other => Err(EncodingError::kind_mismatch("func", &other)),
        }
    }
}
