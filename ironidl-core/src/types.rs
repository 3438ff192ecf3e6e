//! IDL type representation.
//!
//! Types live in a [`TypeTable`]: an append-only arena addressed by index.
//! Composite types hold their children inline, and every named or recursive
//! type is reached through [`Type::Ref`], so recursive shapes never embed
//! themselves directly.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::SchemaError;
use crate::hash::idl_hash;

/// Reserved words of the IDL grammar.
pub const KEYWORDS: &[&str] = &[
    "blob",
    "bool",
    "composite_query",
    "empty",
    "false",
    "float32",
    "float64",
    "func",
    "import",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "nat",
    "nat8",
    "nat16",
    "nat32",
    "nat64",
    "null",
    "oneway",
    "opt",
    "principal",
    "query",
    "record",
    "reserved",
    "service",
    "text",
    "true",
    "type",
    "variant",
    "vec",
];

/// Returns true if `name` can be written unquoted in IDL source.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !KEYWORDS.contains(&name)
}

/// Record field or variant tag label.
///
/// Labels compare, order and hash by their field id only, so a label parsed
/// from source (`Named`) equals the bare id decoded from the wire.
#[derive(Debug, Clone)]
pub enum Label {
    /// Textual name; the id is its hash.
    Named(String),
    /// Explicit numeric id.
    Id(u32),
    /// Positional (tuple) field.
    Unnamed(u32),
}

impl Label {
    /// Returns the canonical field id.
    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Self::Named(name) => idl_hash(name),
            Self::Id(id) | Self::Unnamed(id) => *id,
        }
    }

    /// Returns the textual name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Id(_) | Self::Unnamed(_) => None,
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) if is_valid_identifier(name) => f.write_str(name),
            Self::Named(name) => write_quoted(f, name),
            Self::Id(id) | Self::Unnamed(id) => write!(f, "{id}"),
        }
    }
}

/// Writes `text` as a quoted IDL string literal.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{{{:x}}}", u32::from(c))?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// A labelled record field or variant tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field label.
    pub label: Label,
    /// Field type.
    pub ty: Type,
}

impl Field {
    /// Creates a field named `name`.
    pub fn named(name: impl Into<String>, ty: Type) -> Self {
        Self {
            label: Label::Named(name.into()),
            ty,
        }
    }

    /// Creates a positional field.
    #[must_use]
    pub const fn unnamed(index: u32, ty: Type) -> Self {
        Self {
            label: Label::Unnamed(index),
            ty,
        }
    }

    /// Returns the field id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.label.id()
    }
}

/// Function annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FuncMode {
    /// Read-only call.
    Query,
    /// Fire-and-forget call without a reply.
    Oneway,
    /// Query that may call other queries.
    CompositeQuery,
}

impl FuncMode {
    /// Returns the wire annotation byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Query => 1,
            Self::Oneway => 2,
            Self::CompositeQuery => 3,
        }
    }

    /// Parses a wire annotation byte.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Query),
            2 => Some(Self::Oneway),
            3 => Some(Self::CompositeQuery),
            _ => None,
        }
    }

    /// Returns the IDL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Oneway => "oneway",
            Self::CompositeQuery => "composite_query",
        }
    }
}

/// Function signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuncType {
    /// Annotations.
    pub modes: Vec<FuncMode>,
    /// Argument types.
    pub args: Vec<Type>,
    /// Return types.
    pub rets: Vec<Type>,
}

impl FuncType {
    /// Returns true if the function is annotated `oneway`.
    #[must_use]
    pub fn is_oneway(&self) -> bool {
        self.modes.contains(&FuncMode::Oneway)
    }
}

/// An IDL type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// `null`
    Null,
    /// `bool`
    Bool,
    /// `nat`, unbounded natural number.
    Nat,
    /// `int`, unbounded integer.
    Int,
    /// `nat8`
    Nat8,
    /// `nat16`
    Nat16,
    /// `nat32`
    Nat32,
    /// `nat64`
    Nat64,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `text`
    Text,
    /// `reserved`, supertype of every type.
    Reserved,
    /// `empty`, subtype of every type; has no values.
    Empty,
    /// `principal`
    Principal,
    /// `opt T`
    Opt(Box<Type>),
    /// `vec T`
    Vec(Box<Type>),
    /// `record { ... }`
    Record(Vec<Field>),
    /// `variant { ... }`
    Variant(Vec<Field>),
    /// `func (...) -> (...)`
    Func(FuncType),
    /// `service { ... }`, methods by name.
    Service(Vec<(String, Type)>),
    /// Reference to a type table entry.
    Ref(usize),
}

impl Type {
    /// Builds `opt inner`.
    #[must_use]
    pub fn opt(inner: Self) -> Self {
        Self::Opt(Box::new(inner))
    }

    /// Builds `vec inner`.
    #[must_use]
    pub fn vec(inner: Self) -> Self {
        Self::Vec(Box::new(inner))
    }

    /// Builds a record from `(name, type)` pairs.
    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Self)>) -> Self {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, ty)| Field::named(name, ty))
                .collect(),
        )
    }

    /// Builds a variant from `(name, type)` pairs.
    pub fn variant<'a>(fields: impl IntoIterator<Item = (&'a str, Self)>) -> Self {
        Self::Variant(
            fields
                .into_iter()
                .map(|(name, ty)| Field::named(name, ty))
                .collect(),
        )
    }

    /// Builds a tuple record with positional fields `0..n`.
    pub fn tuple(types: impl IntoIterator<Item = Self>) -> Self {
        Self::Record(
            types
                .into_iter()
                .zip(0u32..)
                .map(|(ty, index)| Field::unnamed(index, ty))
                .collect(),
        )
    }

    /// Returns the wire opcode of a primitive type.
    #[must_use]
    pub const fn opcode(&self) -> Option<i64> {
        let code = match self {
            Self::Null => -1,
            Self::Bool => -2,
            Self::Nat => -3,
            Self::Int => -4,
            Self::Nat8 => -5,
            Self::Nat16 => -6,
            Self::Nat32 => -7,
            Self::Nat64 => -8,
            Self::Int8 => -9,
            Self::Int16 => -10,
            Self::Int32 => -11,
            Self::Int64 => -12,
            Self::Float32 => -13,
            Self::Float64 => -14,
            Self::Text => -15,
            Self::Reserved => -16,
            Self::Empty => -17,
            Self::Principal => -24,
            _ => return None,
        };
        Some(code)
    }

    /// Returns the primitive type for a wire opcode.
    #[must_use]
    pub const fn from_opcode(code: i128) -> Option<Self> {
        let ty = match code {
            -1 => Self::Null,
            -2 => Self::Bool,
            -3 => Self::Nat,
            -4 => Self::Int,
            -5 => Self::Nat8,
            -6 => Self::Nat16,
            -7 => Self::Nat32,
            -8 => Self::Nat64,
            -9 => Self::Int8,
            -10 => Self::Int16,
            -11 => Self::Int32,
            -12 => Self::Int64,
            -13 => Self::Float32,
            -14 => Self::Float64,
            -15 => Self::Text,
            -16 => Self::Reserved,
            -17 => Self::Empty,
            -24 => Self::Principal,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns the primitive type for an IDL keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let ty = match keyword {
            "null" => Self::Null,
            "bool" => Self::Bool,
            "nat" => Self::Nat,
            "int" => Self::Int,
            "nat8" => Self::Nat8,
            "nat16" => Self::Nat16,
            "nat32" => Self::Nat32,
            "nat64" => Self::Nat64,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "text" => Self::Text,
            "reserved" => Self::Reserved,
            "empty" => Self::Empty,
            "principal" => Self::Principal,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns true for primitive (non-composite, non-reference) types.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        self.opcode().is_some()
    }

    /// Returns the kind name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Nat => "nat",
            Self::Int => "int",
            Self::Nat8 => "nat8",
            Self::Nat16 => "nat16",
            Self::Nat32 => "nat32",
            Self::Nat64 => "nat64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Reserved => "reserved",
            Self::Empty => "empty",
            Self::Principal => "principal",
            Self::Opt(_) => "opt",
            Self::Vec(_) => "vec",
            Self::Record(_) => "record",
            Self::Variant(_) => "variant",
            Self::Func(_) => "func",
            Self::Service(_) => "service",
            Self::Ref(_) => "reference",
        }
    }

    /// Returns true if `fields` are positional `0..n`.
    #[must_use]
    pub fn is_tuple(fields: &[Field]) -> bool {
        fields
            .iter()
            .zip(0u32..)
            .all(|(field, index)| matches!(field.label, Label::Unnamed(i) if i == index))
    }
}

/// Append-only table of types with a name index.
///
/// A table is built once per schema or decoded message and is read-only
/// afterwards; it can be shared by reference across concurrent callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTable {
    entries: Vec<Type>,
    names: Vec<Option<String>>,
    by_name: BTreeMap<String, usize>,
}

impl TypeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table of `len` placeholder entries to be filled with [`Self::set`].
    #[must_use]
    pub fn with_placeholders(len: usize) -> Self {
        Self {
            entries: vec![Type::Reserved; len],
            names: vec![None; len],
            by_name: BTreeMap::new(),
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an anonymous entry, returning its index.
    pub fn push(&mut self, ty: Type) -> usize {
        self.entries.push(ty);
        self.names.push(None);
        self.entries.len() - 1
    }

    /// Appends a placeholder entry, returning its index.
    pub fn reserve(&mut self) -> usize {
        self.push(Type::Reserved)
    }

    /// Appends a named placeholder entry.
    ///
    /// # Errors
    /// Returns [`SchemaError::DuplicateDefinition`] if the name is taken.
    pub fn reserve_named(&mut self, name: &str) -> Result<usize, SchemaError> {
        if self.by_name.contains_key(name) {
            return Err(SchemaError::DuplicateDefinition {
                kind: "type",
                name: name.to_string(),
            });
        }
        let index = self.reserve();
        self.names[index] = Some(name.to_string());
        self.by_name.insert(name.to_string(), index);
        Ok(index)
    }

    /// Appends a named entry.
    ///
    /// # Errors
    /// Returns [`SchemaError::DuplicateDefinition`] if the name is taken.
    pub fn define(&mut self, name: &str, ty: Type) -> Result<usize, SchemaError> {
        let index = self.reserve_named(name)?;
        self.entries[index] = ty;
        Ok(index)
    }

    /// Attaches `name` to an existing entry if the name is still free.
    pub fn try_name(&mut self, index: usize, name: &str) -> bool {
        if index >= self.entries.len() || self.by_name.contains_key(name) {
            return false;
        }
        self.names[index] = Some(name.to_string());
        self.by_name.insert(name.to_string(), index);
        true
    }

    /// Fills an entry created by [`Self::reserve`] or [`Self::with_placeholders`].
    ///
    /// # Errors
    /// Returns [`SchemaError::DanglingReference`] for an out-of-range index.
    pub fn set(&mut self, index: usize, ty: Type) -> Result<(), SchemaError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(SchemaError::DanglingReference { index, len })?;
        *slot = ty;
        Ok(())
    }

    /// Returns the entry at `index`.
    ///
    /// # Errors
    /// Returns [`SchemaError::DanglingReference`] for an out-of-range index.
    pub fn entry(&self, index: usize) -> Result<&Type, SchemaError> {
        self.entries.get(index).ok_or(SchemaError::DanglingReference {
            index,
            len: self.entries.len(),
        })
    }

    /// Looks up an entry index by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the name of an entry.
    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).and_then(|name| name.as_deref())
    }

    /// Iterates over `(index, name, type)` in table order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&str>, &Type)> {
        self.entries
            .iter()
            .zip(&self.names)
            .enumerate()
            .map(|(index, (ty, name))| (index, name.as_deref(), ty))
    }

    /// Follows `Ref` chains to a structural type.
    ///
    /// # Errors
    /// Returns [`SchemaError::DanglingReference`] or
    /// [`SchemaError::UnguardedCycle`].
    pub fn resolve<'a>(&'a self, ty: &'a Type) -> Result<&'a Type, SchemaError> {
        self.resolve_indexed(ty).map(|(_, ty)| ty)
    }

    /// Like [`Self::resolve`], also returning the last table index visited.
    ///
    /// # Errors
    /// Returns [`SchemaError::DanglingReference`] or
    /// [`SchemaError::UnguardedCycle`].
    pub fn resolve_indexed<'a>(
        &'a self,
        ty: &'a Type,
    ) -> Result<(Option<usize>, &'a Type), SchemaError> {
        let mut current = ty;
        let mut last = None;
        let mut hops = 0usize;
        while let Type::Ref(index) = current {
            if hops > self.entries.len() {
                return Err(SchemaError::UnguardedCycle {
                    name: self.describe(*index),
                });
            }
            last = Some(*index);
            current = self.entry(*index)?;
            hops += 1;
        }
        Ok((last, current))
    }

    /// Returns true if values of `ty` may be omitted (`null`, `opt`, `reserved`).
    ///
    /// # Errors
    /// Propagates resolution errors.
    pub fn is_defaultable(&self, ty: &Type) -> Result<bool, SchemaError> {
        Ok(matches!(
            self.resolve(ty)?,
            Type::Null | Type::Opt(_) | Type::Reserved
        ))
    }

    /// Checks the table invariants.
    ///
    /// Every reference must be in range, no entry may reach itself through
    /// bare references only, field ids must be unique per record/variant and
    /// service methods must be functions.
    ///
    /// # Errors
    /// Returns the first [`SchemaError`] found.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for index in 0..self.entries.len() {
            self.resolve(&Type::Ref(index))?;
        }
        for ty in &self.entries {
            self.validate_type(ty)?;
        }
        Ok(())
    }

    /// Checks a type that lives outside the table (e.g. an argument type).
    ///
    /// # Errors
    /// Returns the first [`SchemaError`] found.
    pub fn validate_type(&self, ty: &Type) -> Result<(), SchemaError> {
        match ty {
            Type::Ref(index) => {
                self.entry(*index)?;
            }
            Type::Opt(inner) | Type::Vec(inner) => self.validate_type(inner)?,
            Type::Record(fields) | Type::Variant(fields) => {
                let mut seen: BTreeMap<u32, &Label> = BTreeMap::new();
                for field in fields {
                    if let Some(first) = seen.insert(field.id(), &field.label) {
                        return Err(SchemaError::DuplicateFieldId {
                            id: field.id(),
                            first: first.to_string(),
                            second: field.label.to_string(),
                        });
                    }
                    self.validate_type(&field.ty)?;
                }
            }
            Type::Func(func) => {
                for ty in func.args.iter().chain(&func.rets) {
                    self.validate_type(ty)?;
                }
            }
            Type::Service(methods) => {
                let mut seen = HashSet::new();
                for (name, ty) in methods {
                    if !seen.insert(name.as_str()) {
                        return Err(SchemaError::DuplicateDefinition {
                            kind: "method",
                            name: name.clone(),
                        });
                    }
                    self.validate_type(ty)?;
                    if !matches!(self.resolve(ty)?, Type::Func(_)) {
                        return Err(SchemaError::InvalidMethodType { name: name.clone() });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns an IDL-syntax display adapter for `ty`, naming references.
    #[must_use]
    pub fn display<'a>(&'a self, ty: &'a Type) -> TypeDisplay<'a> {
        TypeDisplay {
            table: Some(self),
            ty,
        }
    }

    fn describe(&self, index: usize) -> String {
        self.name_of(index)
            .map_or_else(|| format!("table{index}"), str::to_string)
    }
}

/// Display adapter writing a type in IDL syntax.
#[derive(Debug, Clone, Copy)]
pub struct TypeDisplay<'a> {
    table: Option<&'a TypeTable>,
    ty: &'a Type,
}

impl<'a> TypeDisplay<'a> {
    const fn child(&self, ty: &'a Type) -> Self {
        TypeDisplay {
            table: self.table,
            ty,
        }
    }

    fn write_fields(
        &self,
        f: &mut fmt::Formatter<'_>,
        fields: &'a [Field],
        variant: bool,
    ) -> fmt::Result {
        if fields.is_empty() {
            return f.write_str("{}");
        }
        let tuple = !variant && Type::is_tuple(fields);
        f.write_str("{ ")?;
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            if tuple {
                write!(f, "{}", self.child(&field.ty))?;
            } else if variant && field.ty == Type::Null {
                write!(f, "{}", field.label)?;
            } else {
                write!(f, "{} : {}", field.label, self.child(&field.ty))?;
            }
        }
        f.write_str(" }")
    }

    fn write_func(&self, f: &mut fmt::Formatter<'_>, func: &'a FuncType) -> fmt::Result {
        self.write_tuple(f, &func.args)?;
        f.write_str(" -> ")?;
        self.write_tuple(f, &func.rets)?;
        for mode in &func.modes {
            write!(f, " {}", mode.keyword())?;
        }
        Ok(())
    }

    fn write_tuple(&self, f: &mut fmt::Formatter<'_>, types: &'a [Type]) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.child(ty))?;
        }
        f.write_str(")")
    }

    fn write_service(
        &self,
        f: &mut fmt::Formatter<'_>,
        methods: &'a [(String, Type)],
    ) -> fmt::Result {
        if methods.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for (i, (name, ty)) in methods.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            if is_valid_identifier(name) {
                f.write_str(name)?;
            } else {
                write_quoted(f, name)?;
            }
            f.write_str(" : ")?;
            match ty {
                Type::Func(func) => self.write_func(f, func)?,
                other => write!(f, "{}", self.child(other))?,
            }
        }
        f.write_str(" }")
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Type::Opt(inner) => write!(f, "opt {}", self.child(inner)),
            Type::Vec(inner) if **inner == Type::Nat8 => f.write_str("blob"),
            Type::Vec(inner) => write!(f, "vec {}", self.child(inner)),
            Type::Record(fields) => {
                f.write_str("record ")?;
                self.write_fields(f, fields, false)
            }
            Type::Variant(fields) => {
                f.write_str("variant ")?;
                self.write_fields(f, fields, true)
            }
            Type::Func(func) => {
                f.write_str("func ")?;
                self.write_func(f, func)
            }
            Type::Service(methods) => {
                f.write_str("service ")?;
                self.write_service(f, methods)
            }
            Type::Ref(index) => match self.table.and_then(|table| table.name_of(*index)) {
                Some(name) => f.write_str(name),
                None => write!(f, "table{index}"),
            },
            primitive => f.write_str(primitive.kind_name()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TypeDisplay {
            table: None,
            ty: self,
        }
        .fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_equality_by_id() {
        assert_eq!(Label::Named("a".to_string()), Label::Id(97));
        assert_ne!(Label::Named("a".to_string()), Label::Id(98));
        assert_eq!(Label::Unnamed(3), Label::Id(3));
    }

    #[test]
    fn test_label_display_quotes_non_identifiers() {
        assert_eq!(Label::Named("owner".to_string()).to_string(), "owner");
        assert_eq!(
            Label::Named("sub-account".to_string()).to_string(),
            "\"sub-account\""
        );
        assert_eq!(Label::Named("record".to_string()).to_string(), "\"record\"");
        assert_eq!(Label::Id(42).to_string(), "42");
    }

    #[test]
    fn test_opcode_round_trip() {
        for code in -24..0 {
            if let Some(ty) = Type::from_opcode(code) {
                assert_eq!(ty.opcode(), Some(code as i64));
            }
        }
        assert!(Type::from_opcode(-18).is_none());
        assert!(Type::opt(Type::Nat).opcode().is_none());
    }

    #[test]
    fn test_define_and_lookup() {
        let mut table = TypeTable::new();
        let index = table.define("Amount", Type::Nat).unwrap();
        assert_eq!(table.lookup("Amount"), Some(index));
        assert_eq!(table.name_of(index), Some("Amount"));
        assert!(matches!(
            table.define("Amount", Type::Int),
            Err(SchemaError::DuplicateDefinition { .. })
        ));
    }

    #[test]
    fn test_resolve_follows_aliases() {
        let mut table = TypeTable::new();
        let a = table.define("A", Type::Text).unwrap();
        let b = table.define("B", Type::Ref(a)).unwrap();
        assert_eq!(table.resolve(&Type::Ref(b)).unwrap(), &Type::Text);
        let (last, _) = table.resolve_indexed(&Type::Ref(b)).unwrap();
        assert_eq!(last, Some(a));
    }

    #[test]
    fn test_unguarded_cycle_rejected() {
        let mut table = TypeTable::new();
        let a = table.reserve_named("A").unwrap();
        let b = table.define("B", Type::Ref(a)).unwrap();
        table.set(a, Type::Ref(b)).unwrap();
        assert!(matches!(
            table.validate(),
            Err(SchemaError::UnguardedCycle { .. })
        ));
    }

    #[test]
    fn test_guarded_cycle_accepted() {
        let mut table = TypeTable::new();
        let list = table.reserve_named("List").unwrap();
        table
            .set(
                list,
                Type::opt(Type::record([("head", Type::Nat), ("tail", Type::Ref(list))])),
            )
            .unwrap();
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut table = TypeTable::new();
        table.define("A", Type::vec(Type::Ref(7))).unwrap();
        assert_eq!(
            table.validate(),
            Err(SchemaError::DanglingReference { index: 7, len: 1 })
        );
    }

    #[test]
    fn test_duplicate_field_id_rejected() {
        let mut table = TypeTable::new();
        table
            .define(
                "R",
                Type::Record(vec![
                    Field::named("a", Type::Nat),
                    Field {
                        label: Label::Id(97),
                        ty: Type::Text,
                    },
                ]),
            )
            .unwrap();
        assert!(matches!(
            table.validate(),
            Err(SchemaError::DuplicateFieldId { id: 97, .. })
        ));
    }

    #[test]
    fn test_service_method_must_be_func() {
        let mut table = TypeTable::new();
        table
            .define("S", Type::Service(vec![("m".to_string(), Type::Nat)]))
            .unwrap();
        assert!(matches!(
            table.validate(),
            Err(SchemaError::InvalidMethodType { .. })
        ));
    }

    #[test]
    fn test_display_idl_syntax() {
        let mut table = TypeTable::new();
        let node = table.reserve_named("Node").unwrap();
        let ty = Type::record([
            ("head", Type::Nat),
            ("tail", Type::opt(Type::Ref(node))),
            ("data", Type::vec(Type::Nat8)),
        ]);
        assert_eq!(
            table.display(&ty).to_string(),
            "record { head : nat; tail : opt Node; data : blob }"
        );

        let variant = Type::variant([("ok", Type::Nat), ("none", Type::Null)]);
        assert_eq!(variant.to_string(), "variant { ok : nat; none }");

        let tuple = Type::tuple([Type::Nat, Type::Text]);
        assert_eq!(tuple.to_string(), "record { nat; text }");

        let func = Type::Func(FuncType {
            modes: vec![FuncMode::Query],
            args: vec![Type::Text],
            rets: vec![Type::Nat],
        });
        assert_eq!(func.to_string(), "func (text) -> (nat) query");
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("foo_bar1"));
        assert!(is_valid_identifier("_x"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier("vec"));
        assert!(!is_valid_identifier(""));
    }
}
