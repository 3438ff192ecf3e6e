//! # IronIDL
//!
//! Self-describing interface description language for cross-boundary
//! remote calls.
//!
//! IronIDL parses interface schemas, encodes and decodes argument lists in
//! a self-describing binary format with structural subtyping, and generates
//! statically typed Rust client bindings from a schema.
//!
//! ## Features
//!
//! - **Self-describing wire format** - Every message carries its own type table
//! - **Structural subtyping** - Old readers accept new writers and the reverse
//! - **Schema parsing** - IDL schemas and textual values with precise errors
//! - **Derive support** - `#[derive(IdlType)]` for structs and enums
//! - **Code generation** - Rust bindings with a typed client per service
//!
//! ## Quick Start
//!
//! ```
//! use ironidl::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, IdlType)]
//! struct Transfer {
//!     to: Principal,
//!     amount: u64,
//! }
//!
//! let transfer = Transfer { to: Principal::management(), amount: 10 };
//! let bytes = ArgBuilder::new().arg(&transfer).encode().unwrap();
//!
//! let mut reply = ReplyDecoder::new(&bytes).unwrap();
//! assert_eq!(reply.read::<Transfer>().unwrap(), transfer);
//! reply.finish().unwrap();
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Types, values, hashing, subtyping and the wire codec
//! - [`schema`] - Schema and value parsing, resolution and printing
//! - [`codegen`] - Rust binding generation

pub mod prelude;

/// Types, values and the wire codec.
pub mod core {
    pub use ironidl_core::*;
}

/// Schema parsing and validation.
pub mod schema {
    pub use ironidl_schema::*;
}

/// Rust binding generation from schemas.
pub mod codegen {
    pub use ironidl_codegen::*;
}

// Re-export commonly used items at the crate root; generated bindings and
// derived impls refer to these paths.
pub use ironidl_core::{
    Agent, ArgBuilder, CallError, CallMode, Decoder, DecoderConfig, Empty, EncodingError,
    Encoder, Error, Field, FieldPath, FuncMode, FuncRef, FuncType, IdlType, Label, Principal,
    ReplyDecoder, Reserved, SchemaError, Type, TypeBuilder, TypeTable, Value, ValueField,
    decode_args, encode_args, idl_hash, is_subtype, take_field,
};
pub use ironidl_derive::IdlType;
pub use ironidl_schema::{IdlProg, parse_idl, parse_value, parse_values};
