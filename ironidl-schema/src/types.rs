//! Syntax tree of IDL schema source.
//!
//! The parser produces these types; [`crate::ir::IdlProg::from_ast`]
//! resolves them into a [`ironidl_core::TypeTable`].

use ironidl_core::{FuncMode, Label};

/// A type expression as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Reference to a defined type by name.
    Named(String),
    /// A primitive keyword (`nat`, `text`, `principal`, ...).
    Primitive(ironidl_core::Type),
    /// `opt T`
    Opt(Box<TypeExpr>),
    /// `vec T`; `blob` parses as `vec nat8`.
    Vec(Box<TypeExpr>),
    /// `record { ... }`
    Record(Vec<FieldExpr>),
    /// `variant { ... }`
    Variant(Vec<FieldExpr>),
    /// `func (...) -> (...) ann*`
    Func(FuncExpr),
    /// `service { ... }`
    Service(Vec<MethodExpr>),
}

/// A record field or variant tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpr {
    /// Field label.
    pub label: Label,
    /// Field type.
    pub ty: TypeExpr,
}

/// A function argument or result, optionally named.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgExpr {
    /// Documentation name of the argument.
    pub name: Option<String>,
    /// Argument type.
    pub ty: TypeExpr,
}

/// A function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncExpr {
    /// Arguments.
    pub args: Vec<ArgExpr>,
    /// Results.
    pub rets: Vec<ArgExpr>,
    /// Annotations in source order.
    pub modes: Vec<FuncMode>,
}

/// A service method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodExpr {
    /// Method name.
    pub name: String,
    /// Either [`TypeExpr::Func`] or a name bound to a function type.
    pub ty: TypeExpr,
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// `type name = T`
    Type {
        /// Defined name.
        name: String,
        /// Body.
        ty: TypeExpr,
        /// Byte offset of the definition.
        offset: usize,
    },
    /// `import "file"`
    Import {
        /// Imported path.
        path: String,
        /// Byte offset of the definition.
        offset: usize,
    },
}

/// The `service` declaration closing a program.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorExpr {
    /// Optional service name.
    pub name: Option<String>,
    /// Initialisation arguments of a service class (`service : (A) -> {...}`).
    pub init_args: Option<Vec<ArgExpr>>,
    /// Either [`TypeExpr::Service`] or a name bound to a service type.
    pub ty: TypeExpr,
}

/// A parsed schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Definitions in source order.
    pub definitions: Vec<Definition>,
    /// Main service, if declared.
    pub actor: Option<ActorExpr>,
}
