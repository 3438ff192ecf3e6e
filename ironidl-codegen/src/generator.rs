//! Assembles generated declarations and the service client into one module.

use std::fmt::Write as _;

use ironidl_schema::IdlProg;
use tracing::debug;

use crate::config::Config;
use crate::error::CodegenError;
use crate::rust::names::escape_identifier;
use crate::rust::{ServiceGenerator, TypeGenerator};

/// Rust binding generator for a resolved IDL program.
pub struct Generator<'a> {
    prog: &'a IdlProg,
    config: &'a Config,
}

impl<'a> Generator<'a> {
    /// Creates a new generator.
    #[must_use]
    pub const fn new(prog: &'a IdlProg, config: &'a Config) -> Self {
        Self { prog, config }
    }

    /// Generates the bindings module source.
    ///
    /// Output is deterministic: the same program and configuration always
    /// produce the same text.
    ///
    /// # Errors
    /// Returns `CodegenError` if the configuration names are not Rust
    /// identifiers or the program's type table is invalid.
    pub fn generate(&self) -> Result<String, CodegenError> {
        check_identifier("binding name", &self.config.binding_name)?;
        check_identifier("agent name", &self.config.agent_name)?;

        let mut types = TypeGenerator::new(&self.prog.table, self.config)?;
        let declarations = types.generate()?;
        let client = ServiceGenerator::new(self.prog, self.config).generate(&mut types)?;
        let hoisted = types.generate_pending()?;

        let mut output = self.header();
        let imports = types.imports();
        if !imports.is_empty() {
            let _ = writeln!(output, "use ironidl::{{{}}};\n", imports.join(", "));
        }
        output.push_str(&declarations);
        output.push_str(&hoisted);
        output.push_str(&client);
        while output.ends_with("\n\n") {
            output.pop();
        }

        debug!(
            declarations = types.declaration_count(),
            methods = self.prog.methods().len(),
            bytes = output.len(),
            "generated Rust bindings"
        );
        Ok(output)
    }

    fn header(&self) -> String {
        let mut output = String::new();
        match &self.config.package_name {
            Some(package) => {
                let _ = writeln!(output, "// Rust bindings for the `{package}` interface.");
            }
            None => output.push_str("// Rust bindings for an IDL interface.\n"),
        }
        output.push_str("// This file is auto-generated by ironidl-codegen. Do not edit manually.\n\n");
        output
    }
}

fn check_identifier(what: &str, name: &str) -> Result<(), CodegenError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid = valid_start
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && escape_identifier(name) == name
        && !matches!(name, "_" | "Transport");
    if valid {
        Ok(())
    } else {
        Err(CodegenError::generation(format!(
            "{what} '{name}' is not a Rust identifier"
        )))
    }
}
