//! # IronIDL Codegen
//!
//! Rust binding generation from IDL schemas.
//!
//! This crate provides:
//! - Struct, enum and alias declarations for every named IDL type
//! - Hoisting of anonymous records and variants into named declarations
//! - A typed client for the main service, generic over an `Agent`
//! - Build script integration through [`generate_to_file`]
//!
//! ## Example
//! ```
//! use ironidl_codegen::{Config, generate_from_idl};
//!
//! let source = "type Pair = record { nat; text }; service : { get : () -> (Pair) query }";
//! let code = generate_from_idl(source, &Config::new().binding_name("Store")).unwrap();
//! assert!(code.contains("pub struct Pair(pub u128, pub String);"));
//! assert!(code.contains("pub struct Store<Transport: Agent>"));
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod rust;

use std::path::Path;

use tracing::info;

pub use config::Config;
pub use error::CodegenError;
pub use generator::Generator;

/// Generates Rust bindings from IDL schema source.
///
/// # Errors
/// Returns `CodegenError` if parsing, resolution or generation fails.
pub fn generate_from_idl(source: &str, config: &Config) -> Result<String, CodegenError> {
    let prog = ironidl_schema::parse_idl(source)?;
    Generator::new(&prog, config).generate()
}

/// Generates Rust bindings from an IDL schema file.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing or generation fails.
pub fn generate_from_file(path: &Path, config: &Config) -> Result<String, CodegenError> {
    let source = std::fs::read_to_string(path)?;
    generate_from_idl(&source, config)
}

/// Generates Rust bindings from IDL schema source and writes them to
/// `out_path`, typically under `OUT_DIR` from a build script.
///
/// # Errors
/// Returns `CodegenError` if generation or writing fails.
pub fn generate_to_file(source: &str, config: &Config, out_path: &Path) -> Result<(), CodegenError> {
    let code = generate_from_idl(source, config)?;
    std::fs::write(out_path, &code)?;
    info!(path = %out_path.display(), bytes = code.len(), "wrote Rust bindings");
    Ok(())
}
