//! # IronIDL Schema
//!
//! Parser and resolver for IDL schema source.
//!
//! This crate provides:
//! - A tokenizer shared by the schema and value grammars
//! - Schema parsing into a syntax tree
//! - Resolution of the syntax tree into a type table
//! - Program validation
//! - Value literal parsing for fixtures and tests
//! - Printing programs back to IDL source

pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod validation;

pub use error::{Error, GrammarError};
pub use ir::{IdlProg, ServiceDef, resolve_type};
pub use parser::{
    parse_idl, parse_program, parse_type_expr, parse_value, parse_values, parse_values_with,
};
pub use types::{
    ActorExpr, ArgExpr, Definition, FieldExpr, FuncExpr, MethodExpr, Program, TypeExpr,
};
pub use validation::validate_prog;
