//! Type declaration generation.
//!
//! Every named type table entry becomes one Rust declaration. Anonymous
//! records, variants, functions and services nested inside a declaration
//! are hoisted into their own declarations named after their parent.

use std::collections::{BTreeSet, VecDeque};
use std::fmt::Write as _;

use ironidl_core::{Field, FuncType, Label, Type, TypeTable};

use super::names::{NameAllocator, escape_identifier, to_pascal_case, to_snake_case};
use crate::config::Config;
use crate::error::CodegenError;

/// Names imported from the facade crate by generated code.
pub(crate) const IMPORTABLE: &[&str] = &[
    "Agent",
    "ArgBuilder",
    "CallError",
    "CallMode",
    "Empty",
    "EncodingError",
    "FuncMode",
    "FuncRef",
    "FuncType",
    "IdlType",
    "Principal",
    "ReplyDecoder",
    "Reserved",
    "Type",
    "TypeBuilder",
    "Value",
];

/// Names of the prelude and generated items that user types must not shadow.
const RESERVED_NAMES: &[&str] = &[
    "Box",
    "Option",
    "Result",
    "String",
    "Vec",
    "Transport",
    "DESTINATION",
];

const DERIVES: &str = "#[derive(Debug, Clone, PartialEq, IdlType)]\n";

/// A declaration waiting to be emitted.
#[derive(Debug)]
struct Pending {
    name: String,
    ty: Type,
    owner: Option<usize>,
    doc: String,
}

/// Generator for type declarations.
pub struct TypeGenerator<'a> {
    pub(super) table: &'a TypeTable,
    pub(super) config: &'a Config,
    names: Vec<String>,
    allocator: NameAllocator,
    reach: Vec<BTreeSet<usize>>,
    pending: VecDeque<Pending>,
    imports: BTreeSet<&'static str>,
    declarations: usize,
    unboxed: Option<String>,
}

impl<'a> TypeGenerator<'a> {
    /// Creates a type generator, assigning a Rust name to every entry.
    ///
    /// # Errors
    /// Returns `CodegenError` if the table is invalid.
    pub fn new(table: &'a TypeTable, config: &'a Config) -> Result<Self, CodegenError> {
        table.validate()?;
        let mut allocator = NameAllocator::with_reserved(
            IMPORTABLE
                .iter()
                .chain(RESERVED_NAMES)
                .copied()
                .chain([config.binding_name.as_str()]),
        );
        let names = (0..table.len())
            .map(|index| {
                let base = table
                    .name_of(index)
                    .map_or_else(|| format!("Table{index}"), to_pascal_case);
                allocator.allocate(&escape_identifier(&base))
            })
            .collect();
        let reach = (0..table.len()).map(|index| reachable(table, index)).collect();
        Ok(Self {
            table,
            config,
            names,
            allocator,
            reach,
            pending: VecDeque::new(),
            imports: BTreeSet::new(),
            declarations: 0,
            unboxed: None,
        })
    }

    /// Generates declarations for every table entry and the types hoisted
    /// out of them.
    ///
    /// # Errors
    /// Returns `CodegenError` if a reference cannot be resolved.
    pub fn generate(&mut self) -> Result<String, CodegenError> {
        let mut output = String::new();
        for index in 0..self.table.len() {
            let ty = self.table.entry(index)?.clone();
            let name = self.names[index].clone();
            let idl_name = self.table.name_of(index).unwrap_or(name.as_str()).to_string();
            let doc = format!("IDL type `{idl_name}`.");
            let attr = (idl_name != name).then_some(idl_name);
            output.push_str(&self.declaration(&name, attr.as_deref(), &ty, Some(index), &doc)?);
        }
        output.push_str(&self.generate_pending()?);
        Ok(output)
    }

    /// Emits declarations hoisted since the last call.
    ///
    /// # Errors
    /// Returns `CodegenError` if a reference cannot be resolved, or if a
    /// recursive reference outside `vec` was emitted without `Box`.
    pub fn generate_pending(&mut self) -> Result<String, CodegenError> {
        let mut output = String::new();
        while let Some(pending) = self.pending.pop_front() {
            output.push_str(&self.declaration(
                &pending.name,
                None,
                &pending.ty,
                pending.owner,
                &pending.doc,
            )?);
        }
        if let Some(name) = self.unboxed.take() {
            return Err(CodegenError::generation(format!(
                "type `{name}` is recursive outside `vec` and needs box_recursive"
            )));
        }
        Ok(output)
    }

    /// Returns the facade items used so far, sorted.
    #[must_use]
    pub fn imports(&self) -> Vec<&'static str> {
        self.imports.iter().copied().collect()
    }

    /// Records that generated code uses `name` from the facade.
    pub fn import(&mut self, name: &'static str) {
        self.imports.insert(name);
    }

    /// Returns the number of declarations emitted so far.
    #[must_use]
    pub const fn declaration_count(&self) -> usize {
        self.declarations
    }

    /// Returns the Rust type for `ty`, hoisting anonymous composites.
    ///
    /// `owner` is the table entry whose declaration contains `ty`; references
    /// that lead back to it are boxed. `hint` names hoisted declarations.
    pub fn rust_type(&mut self, ty: &Type, owner: Option<usize>, hint: &str) -> String {
        self.rust_type_in(ty, owner, hint, false)
    }

    fn rust_type_in(&mut self, ty: &Type, owner: Option<usize>, hint: &str, in_vec: bool) -> String {
        let primitive = match ty {
            Type::Null => "()",
            Type::Bool => "bool",
            Type::Nat => "u128",
            Type::Int => "i128",
            Type::Nat8 => "u8",
            Type::Nat16 => "u16",
            Type::Nat32 => "u32",
            Type::Nat64 => "u64",
            Type::Int8 => "i8",
            Type::Int16 => "i16",
            Type::Int32 => "i32",
            Type::Int64 => "i64",
            Type::Float32 => "f32",
            Type::Float64 => "f64",
            Type::Text => "String",
            Type::Reserved => return self.imported("Reserved"),
            Type::Empty => return self.imported("Empty"),
            Type::Principal => return self.imported("Principal"),
            Type::Opt(inner) => {
                return format!("Option<{}>", self.rust_type_in(inner, owner, hint, false));
            }
            Type::Vec(inner) => {
                return format!("Vec<{}>", self.rust_type_in(inner, owner, hint, true));
            }
            Type::Record(_) | Type::Variant(_) | Type::Func(_) | Type::Service(_) => {
                return self.hoist(ty, owner, hint);
            }
            Type::Ref(index) => {
                let name = self.names.get(*index).cloned().unwrap_or_default();
                let recursive = owner.is_some_and(|owner| {
                    self.reach
                        .get(*index)
                        .is_some_and(|reach| reach.contains(&owner))
                });
                if !recursive || in_vec {
                    return name;
                }
                if !self.config.box_recursive {
                    self.unboxed.get_or_insert_with(|| name.clone());
                    return name;
                }
                return format!("Box<{name}>");
            }
        };
        primitive.to_string()
    }

    fn imported(&mut self, name: &'static str) -> String {
        self.import(name);
        name.to_string()
    }

    fn hoist(&mut self, ty: &Type, owner: Option<usize>, hint: &str) -> String {
        let name = self.allocator.allocate(&escape_identifier(&to_pascal_case(hint)));
        let kind = match ty {
            Type::Record(_) => "record",
            Type::Variant(_) => "variant",
            Type::Func(_) => "function",
            _ => "service",
        };
        self.pending.push_back(Pending {
            name: name.clone(),
            ty: ty.clone(),
            owner,
            doc: format!("Inline {kind} `{name}`."),
        });
        name
    }

    fn declaration(
        &mut self,
        name: &str,
        idl_name: Option<&str>,
        ty: &Type,
        owner: Option<usize>,
        doc: &str,
    ) -> Result<String, CodegenError> {
        self.declarations += 1;
        let output = match ty {
            Type::Record(fields) => self.record_decl(name, idl_name, fields, owner, doc),
            Type::Variant(fields) => self.variant_decl(name, idl_name, fields, owner, doc),
            Type::Func(func) => self.func_decl(name, idl_name, func, owner, doc),
            Type::Service(methods) => self.service_decl(name, idl_name, methods, owner, doc)?,
            other => self.alias_decl(name, idl_name, other, owner, doc),
        };
        Ok(output)
    }

    /// Generates a struct for a record.
    fn record_decl(
        &mut self,
        name: &str,
        idl_name: Option<&str>,
        fields: &[Field],
        owner: Option<usize>,
        doc: &str,
    ) -> String {
        self.import("IdlType");
        let mut output = format!("/// {doc}\n{DERIVES}");
        if let Some(idl_name) = idl_name {
            let _ = writeln!(output, "#[idl(name = {idl_name:?})]");
        }

        if fields.is_empty() {
            let _ = writeln!(output, "pub struct {name} {{}}\n");
            return output;
        }

        if Type::is_tuple(fields) {
            let types: Vec<String> = fields
                .iter()
                .map(|field| {
                    let hint = format!("{name}{}", field.id());
                    format!("pub {}", self.rust_type(&field.ty, owner, &hint))
                })
                .collect();
            let _ = writeln!(output, "pub struct {name}({});\n", types.join(", "));
            return output;
        }

        let _ = writeln!(output, "pub struct {name} {{");
        let mut field_names = NameAllocator::default();
        for field in fields {
            let base = match &field.label {
                Label::Named(label) => to_snake_case(label),
                Label::Id(id) | Label::Unnamed(id) => format!("field_{id}"),
            };
            let rust_name = escape_identifier(&field_names.allocate(&base));
            let hint = format!("{name}{}", to_pascal_case(&base));
            let rust_type = self.rust_type(&field.ty, owner, &hint);
            let _ = writeln!(output, "    {}", label_attr(&field.label));
            let _ = writeln!(output, "    pub {rust_name}: {rust_type},");
        }
        output.push_str("}\n\n");
        output
    }

    /// Generates an alias, or a transparent newtype when the alias refers
    /// to itself.
    fn alias_decl(
        &mut self,
        name: &str,
        idl_name: Option<&str>,
        ty: &Type,
        owner: Option<usize>,
        doc: &str,
    ) -> String {
        let cyclic = owner.is_some_and(|index| alias_cycle(self.table, ty, index));
        let rust_type = self.rust_type(ty, owner, &format!("{name}Inner"));
        if !cyclic {
            return format!("/// {doc}\npub type {name} = {rust_type};\n\n");
        }
        self.import("IdlType");
        let attr = match idl_name {
            Some(idl_name) => format!("#[idl(transparent, name = {idl_name:?})]\n"),
            None => "#[idl(transparent)]\n".to_string(),
        };
        format!("/// {doc}\n{DERIVES}{attr}pub struct {name}(pub {rust_type});\n\n")
    }

    /// Generates a newtype over [`FuncRef`] carrying the function signature.
    ///
    /// [`FuncRef`]: ironidl_core::FuncRef
    fn func_decl(
        &mut self,
        name: &str,
        idl_name: Option<&str>,
        func: &FuncType,
        owner: Option<usize>,
        doc: &str,
    ) -> String {
        for item in ["FuncRef", "FuncType", "IdlType", "Type", "TypeBuilder", "Value", "EncodingError"] {
            self.import(item);
        }
        let signature = self.func_signature(func, owner, name, "            ");
        let registered = idl_name.unwrap_or(name);

        let mut output = format!("/// {doc}\n#[derive(Debug, Clone, PartialEq)]\n");
        let _ = writeln!(output, "pub struct {name}(pub FuncRef);\n");
        let _ = writeln!(output, "impl IdlType for {name} {{");
        output.push_str("    fn idl_type(builder: &mut TypeBuilder) -> Type {\n");
        let _ = writeln!(
            output,
            "        builder.register::<Self>({registered:?}, |builder| {{"
        );
        let _ = writeln!(output, "            Type::Func({signature})");
        output.push_str("        })\n    }\n\n");
        output.push_str("    fn to_value(&self) -> Value {\n");
        output.push_str("        self.0.to_value()\n    }\n\n");
        output.push_str("    fn from_value(value: Value) -> Result<Self, EncodingError> {\n");
        output.push_str("        FuncRef::from_value(value).map(Self)\n    }\n}\n\n");
        output
    }

    /// Generates a newtype over [`Principal`] carrying the service type.
    ///
    /// [`Principal`]: ironidl_core::Principal
    fn service_decl(
        &mut self,
        name: &str,
        idl_name: Option<&str>,
        methods: &[(String, Type)],
        owner: Option<usize>,
        doc: &str,
    ) -> Result<String, CodegenError> {
        for item in ["Principal", "IdlType", "Type", "TypeBuilder", "Value", "EncodingError"] {
            self.import(item);
        }
        let mut sorted: Vec<&(String, Type)> = methods.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = String::new();
        for (method, ty) in sorted {
            let hint = format!("{name}{}", to_pascal_case(method));
            let method_type = match ty {
                Type::Func(func) => {
                    self.import("FuncType");
                    format!(
                        "Type::Func({})",
                        self.func_signature(func, owner, &hint, "                    ")
                    )
                }
                Type::Ref(_) => format!("builder.add::<{}>()", self.rust_type(ty, None, &hint)),
                _ => {
                    return Err(CodegenError::generation(format!(
                        "method '{method}' of '{name}' is not a function"
                    )));
                }
            };
            let _ = writeln!(
                entries,
                "                ({method:?}.to_string(), {method_type}),"
            );
        }

        let registered = idl_name.unwrap_or(name);
        let mut output = format!("/// {doc}\n#[derive(Debug, Clone, PartialEq)]\n");
        let _ = writeln!(output, "pub struct {name}(pub Principal);\n");
        let _ = writeln!(output, "impl IdlType for {name} {{");
        output.push_str("    fn idl_type(builder: &mut TypeBuilder) -> Type {\n");
        let _ = writeln!(
            output,
            "        builder.register::<Self>({registered:?}, |builder| {{"
        );
        if entries.is_empty() {
            output.push_str("            Type::Service(Vec::new())\n");
        } else {
            output.push_str("            Type::Service(vec![\n");
            output.push_str(&entries);
            output.push_str("            ])\n");
        }
        output.push_str("        })\n    }\n\n");
        output.push_str("    fn to_value(&self) -> Value {\n");
        output.push_str("        Value::Service(self.0.clone())\n    }\n\n");
        output.push_str("    fn from_value(value: Value) -> Result<Self, EncodingError> {\n");
        output.push_str("        match value {\n");
        output.push_str("            Value::Service(principal) => Ok(Self(principal)),\n");
        output.push_str(
            "            other => Err(EncodingError::kind_mismatch(\"service\", &other)),\n",
        );
        output.push_str("        }\n    }\n}\n\n");
        Ok(output)
    }

    /// Renders a `FuncType { .. }` expression building `func`'s signature.
    fn func_signature(
        &mut self,
        func: &FuncType,
        owner: Option<usize>,
        hint: &str,
        indent: &str,
    ) -> String {
        let modes = if func.modes.is_empty() {
            "Vec::new()".to_string()
        } else {
            self.import("FuncMode");
            let modes: Vec<String> = func
                .modes
                .iter()
                .map(|mode| format!("FuncMode::{mode:?}"))
                .collect();
            format!("vec![{}]", modes.join(", "))
        };
        let args = self.type_list(&func.args, owner, &format!("{hint}Arg"));
        let rets = self.type_list(&func.rets, owner, &format!("{hint}Ret"));
        format!(
            "FuncType {{\n{indent}    modes: {modes},\n{indent}    args: {args},\n{indent}    rets: {rets},\n{indent}}}"
        )
    }

    fn type_list(&mut self, types: &[Type], owner: Option<usize>, hint: &str) -> String {
        if types.is_empty() {
            return "Vec::new()".to_string();
        }
        let items: Vec<String> = types
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                let rust_type = self.rust_type(ty, owner, &format!("{hint}{i}"));
                format!("builder.add::<{rust_type}>()")
            })
            .collect();
        format!("vec![{}]", items.join(", "))
    }
}

/// Returns the `#[idl(..)]` attribute carrying a field label.
pub(super) fn label_attr(label: &Label) -> String {
    match label {
        Label::Named(name) => format!("#[idl(id = {}, name = {name:?})]", label.id()),
        Label::Id(id) | Label::Unnamed(id) => format!("#[idl(id = {id})]"),
    }
}

/// Entries reachable from `start` through references, transitively.
fn reachable(table: &TypeTable, start: usize) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack = Vec::new();
    if let Ok(ty) = table.entry(start) {
        collect_refs(ty, &mut stack);
    }
    while let Some(index) = stack.pop() {
        if seen.insert(index) {
            if let Ok(ty) = table.entry(index) {
                collect_refs(ty, &mut stack);
            }
        }
    }
    seen
}

fn collect_refs(ty: &Type, out: &mut Vec<usize>) {
    match ty {
        Type::Ref(index) => out.push(*index),
        Type::Opt(inner) | Type::Vec(inner) => collect_refs(inner, out),
        Type::Record(fields) | Type::Variant(fields) => {
            for field in fields {
                collect_refs(&field.ty, out);
            }
        }
        Type::Func(func) => {
            for ty in func.args.iter().chain(&func.rets) {
                collect_refs(ty, out);
            }
        }
        Type::Service(methods) => {
            for (_, ty) in methods {
                collect_refs(ty, out);
            }
        }
        _ => {}
    }
}

/// Returns true if alias body `ty` of entry `owner` reaches `owner` again
/// without passing through a nominal declaration.
fn alias_cycle(table: &TypeTable, ty: &Type, owner: usize) -> bool {
    let mut visited = BTreeSet::new();
    alias_reaches(table, ty, owner, &mut visited)
}

fn alias_reaches(table: &TypeTable, ty: &Type, owner: usize, visited: &mut BTreeSet<usize>) -> bool {
    match ty {
        Type::Ref(index) if *index == owner => true,
        Type::Ref(index) => {
            if !visited.insert(*index) {
                return false;
            }
            match table.entry(*index) {
                Ok(Type::Record(_) | Type::Variant(_) | Type::Func(_) | Type::Service(_)) | Err(_) => {
                    false
                }
                Ok(body) => alias_reaches(table, body, owner, visited),
            }
        }
        Type::Opt(inner) | Type::Vec(inner) => alias_reaches(table, inner, owner, visited),
        _ => false,
    }
}
