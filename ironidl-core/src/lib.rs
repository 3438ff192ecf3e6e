//! # IronIDL Core
//!
//! Core types for a self-describing interface description language and its
//! binary wire format.
//!
//! This crate provides:
//! - Field-id hashing for record fields and variant tags
//! - Type tables with reference resolution and validation
//! - Structural subtyping between wire types and expected types
//! - Dynamic values and principal identifiers
//! - The message encoder and decoder
//! - The `IdlType` trait, typed argument lists and the `Agent` transport seam

pub mod agent;
pub mod args;
pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod hash;
pub mod header;
pub mod idl_type;
pub mod principal;
pub mod subtype;
pub mod types;
pub mod value;

pub use agent::{Agent, CallError, CallMode};
pub use args::{ArgBuilder, ReplyDecoder};
pub use buffer::{ReadBuffer, WriteBuffer};
pub use decoder::{Decoder, DecoderConfig, decode_args, decode_self_describing};
pub use encoder::{Encoder, encode_args};
pub use error::{
    BufferError, EncodingError, Error, FieldPath, Result, SchemaError, SubtypeError,
};
pub use hash::idl_hash;
pub use header::{MAGIC, MessageHeader};
pub use idl_type::{Empty, IdlType, Reserved, TypeBuilder, take_field};
pub use principal::Principal;
pub use subtype::{check_args, is_subtype};
pub use types::{Field, FuncMode, FuncType, Label, Type, TypeTable};
pub use value::{FuncRef, Value, ValueField};
