//! Resolved representation of an IDL program.
//!
//! The parser's syntax tree refers to types by name; this module turns it
//! into a [`TypeTable`] where every definition owns one entry and names have
//! become [`Type::Ref`] indices.

use std::fmt::{self, Write as _};

use ironidl_core::{Field, FuncType, Label, SchemaError, Type, TypeTable};
use tracing::debug;

use crate::error::Error;
use crate::types::{ActorExpr, ArgExpr, Definition, FuncExpr, Program, TypeExpr};
use crate::validation::validate_prog;

/// The main service of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDef {
    /// Optional service name.
    pub name: Option<String>,
    /// Initialisation arguments; empty for a plain service.
    pub init_args: Vec<Type>,
    /// True if the declaration had an initialisation argument list.
    pub is_class: bool,
    /// Service type, inline or a reference to a service definition.
    pub ty: Type,
}

/// A resolved program: its type table and optional main service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdlProg {
    /// One entry per `type` definition, in source order.
    pub table: TypeTable,
    /// The closing `service` declaration.
    pub service: Option<ServiceDef>,
}

impl IdlProg {
    /// Resolves a parsed program.
    ///
    /// Names are allocated before any body is resolved, so definitions may
    /// refer to later ones and to themselves.
    ///
    /// # Errors
    /// Returns [`Error::Schema`] for imports, unknown names, duplicate
    /// definitions and invalid type tables.
    pub fn from_ast(program: &Program) -> Result<Self, Error> {
        let mut table = TypeTable::new();
        let mut bodies = Vec::with_capacity(program.definitions.len());
        for definition in &program.definitions {
            match definition {
                Definition::Type { name, ty, .. } => {
                    bodies.push((table.reserve_named(name)?, ty));
                }
                Definition::Import { path, .. } => {
                    return Err(SchemaError::Unsupported {
                        message: format!("import of \"{path}\""),
                    }
                    .into());
                }
            }
        }
        for (index, expr) in bodies {
            let ty = resolve_type(expr, &table)?;
            table.set(index, ty)?;
        }

        let service = program
            .actor
            .as_ref()
            .map(|actor| resolve_actor(actor, &table))
            .transpose()?;
        let prog = Self { table, service };
        validate_prog(&prog)?;

        debug!(
            definitions = prog.table.len(),
            methods = prog.methods().len(),
            "resolved IDL program"
        );
        Ok(prog)
    }

    /// Returns the service methods sorted by name.
    #[must_use]
    pub fn methods(&self) -> Vec<(&str, &FuncType)> {
        let Some(service) = &self.service else {
            return Vec::new();
        };
        let Ok(Type::Service(methods)) = self.table.resolve(&service.ty) else {
            return Vec::new();
        };
        let mut resolved: Vec<(&str, &FuncType)> = methods
            .iter()
            .filter_map(|(name, ty)| match self.table.resolve(ty) {
                Ok(Type::Func(func)) => Some((name.as_str(), func)),
                _ => None,
            })
            .collect();
        resolved.sort_by(|a, b| a.0.cmp(b.0));
        resolved
    }

    /// Returns the type defined as `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.table
            .lookup(name)
            .and_then(|index| self.table.entry(index).ok())
    }

    /// Prints the program in IDL syntax.
    ///
    /// The output parses back to an equivalent program.
    #[must_use]
    pub fn to_idl(&self) -> String {
        let mut out = String::new();
        for (_, name, ty) in self.table.iter() {
            if let Some(name) = name {
                let _ = writeln!(out, "type {name} = {};", self.table.display(ty));
            }
        }
        if let Some(service) = &self.service {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("service ");
            if let Some(name) = &service.name {
                out.push_str(name);
                out.push(' ');
            }
            out.push_str(": ");
            if service.is_class {
                self.write_types(&mut out, &service.init_args);
                out.push_str(" -> ");
            }
            match &service.ty {
                Type::Service(methods) => {
                    out.push_str("{\n");
                    for (name, ty) in methods {
                        let _ = write!(out, "  {} : ", Label::Named(name.clone()));
                        match ty {
                            Type::Func(func) => self.write_signature(&mut out, func),
                            other => {
                                let _ = write!(out, "{}", self.table.display(other));
                            }
                        }
                        out.push_str(";\n");
                    }
                    out.push_str("}\n");
                }
                other => {
                    let _ = writeln!(out, "{};", self.table.display(other));
                }
            }
        }
        out
    }

    fn write_signature(&self, out: &mut String, func: &FuncType) {
        self.write_types(out, &func.args);
        out.push_str(" -> ");
        self.write_types(out, &func.rets);
        for mode in &func.modes {
            out.push(' ');
            out.push_str(mode.keyword());
        }
    }

    fn write_types(&self, out: &mut String, types: &[Type]) {
        out.push('(');
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", self.table.display(ty));
        }
        out.push(')');
    }
}

impl fmt::Display for IdlProg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_idl())
    }
}

/// Resolves a type expression against `table`.
///
/// Names become references; inline composites stay inline.
///
/// # Errors
/// Returns [`SchemaError::UnknownType`] for a name not defined in `table`.
pub fn resolve_type(expr: &TypeExpr, table: &TypeTable) -> Result<Type, SchemaError> {
    let ty = match expr {
        TypeExpr::Named(name) => table
            .lookup(name)
            .map(Type::Ref)
            .ok_or_else(|| SchemaError::UnknownType { name: name.clone() })?,
        TypeExpr::Primitive(primitive) => primitive.clone(),
        TypeExpr::Opt(inner) => Type::opt(resolve_type(inner, table)?),
        TypeExpr::Vec(inner) => Type::vec(resolve_type(inner, table)?),
        TypeExpr::Record(fields) => Type::Record(resolve_fields(fields, table)?),
        TypeExpr::Variant(fields) => Type::Variant(resolve_fields(fields, table)?),
        TypeExpr::Func(func) => Type::Func(resolve_func(func, table)?),
        TypeExpr::Service(methods) => Type::Service(
            methods
                .iter()
                .map(|method| Ok((method.name.clone(), resolve_type(&method.ty, table)?)))
                .collect::<Result<_, SchemaError>>()?,
        ),
    };
    Ok(ty)
}

fn resolve_fields(
    fields: &[crate::types::FieldExpr],
    table: &TypeTable,
) -> Result<Vec<Field>, SchemaError> {
    fields
        .iter()
        .map(|field| {
            Ok(Field {
                label: field.label.clone(),
                ty: resolve_type(&field.ty, table)?,
            })
        })
        .collect()
}

fn resolve_func(func: &FuncExpr, table: &TypeTable) -> Result<FuncType, SchemaError> {
    let mut modes = func.modes.clone();
    modes.sort();
    modes.dedup();
    Ok(FuncType {
        modes,
        args: resolve_args(&func.args, table)?,
        rets: resolve_args(&func.rets, table)?,
    })
}

fn resolve_args(args: &[ArgExpr], table: &TypeTable) -> Result<Vec<Type>, SchemaError> {
    args.iter().map(|arg| resolve_type(&arg.ty, table)).collect()
}

fn resolve_actor(actor: &ActorExpr, table: &TypeTable) -> Result<ServiceDef, SchemaError> {
    let init_args = actor
        .init_args
        .as_deref()
        .map(|args| resolve_args(args, table))
        .transpose()?;
    Ok(ServiceDef {
        name: actor.name.clone(),
        is_class: init_args.is_some(),
        init_args: init_args.unwrap_or_default(),
        ty: resolve_type(&actor.ty, table)?,
    })
}
