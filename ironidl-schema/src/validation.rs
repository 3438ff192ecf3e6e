//! Program validation utilities.
//!
//! This module checks a resolved program for consistency before it is used
//! by the codec or the code generator.

use ironidl_core::{SchemaError, Type};

use crate::ir::IdlProg;

/// Validates a resolved program.
///
/// # Arguments
/// * `prog` - The program to validate
///
/// # Returns
/// Ok(()) if valid, or SchemaError describing the issue.
///
/// # Errors
/// Returns `SchemaError` if the type table is invalid, the service
/// declaration is not a service, or a service method is duplicated or not a
/// function.
pub fn validate_prog(prog: &IdlProg) -> Result<(), SchemaError> {
    prog.table.validate()?;
    validate_service(prog)?;
    Ok(())
}

/// Validates the main service declaration.
fn validate_service(prog: &IdlProg) -> Result<(), SchemaError> {
    let Some(service) = &prog.service else {
        return Ok(());
    };
    for arg in &service.init_args {
        prog.table.validate_type(arg)?;
    }
    prog.table.validate_type(&service.ty)?;
    match prog.table.resolve(&service.ty)? {
        Type::Service(_) => Ok(()),
        _ => Err(SchemaError::InvalidActorType),
    }
}
