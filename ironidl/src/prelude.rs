//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```
//! use ironidl::prelude::*;
//! ```

// Core types
pub use ironidl_core::error::{Error as CoreError, Result as CoreResult};
pub use ironidl_core::{
    ArgBuilder, Empty, FuncRef, IdlType, Principal, ReplyDecoder, Reserved, Type, TypeTable,
    Value,
};

// Transport seam
pub use ironidl_core::{Agent, CallError, CallMode};

// Derive macro
pub use ironidl_derive::IdlType;

// Schema and code generation
pub use ironidl_codegen::{Config as CodegenConfig, generate_from_idl};
pub use ironidl_schema::{IdlProg, parse_idl, parse_value, parse_values};
