//! Variant code generation.

use std::fmt::Write as _;

use ironidl_core::{Field, Label, Type};

use super::names::{NameAllocator, escape_identifier, to_pascal_case};
use super::types::{TypeGenerator, label_attr};

impl TypeGenerator<'_> {
    /// Generates an enum for a variant.
    ///
    /// Tags with a `null` payload become unit variants; every other tag
    /// carries its payload as a single tuple field.
    pub(super) fn variant_decl(
        &mut self,
        name: &str,
        idl_name: Option<&str>,
        fields: &[Field],
        owner: Option<usize>,
        doc: &str,
    ) -> String {
        self.import("IdlType");
        let mut output = format!("/// {doc}\n#[derive(Debug, Clone, PartialEq, IdlType)]\n");
        if let Some(idl_name) = idl_name {
            let _ = writeln!(output, "#[idl(name = {idl_name:?})]");
        }
        let _ = writeln!(output, "pub enum {name} {{");

        let mut tags = NameAllocator::default();
        for field in fields {
            let base = match &field.label {
                Label::Named(label) => to_pascal_case(label),
                Label::Id(id) | Label::Unnamed(id) => format!("Tag{id}"),
            };
            let tag = escape_identifier(&tags.allocate(&base));
            let _ = writeln!(output, "    {}", label_attr(&field.label));
            if field.ty == Type::Null {
                let _ = writeln!(output, "    {tag},");
            } else {
                let hint = format!("{name}{}", tag.trim_end_matches('_'));
                let payload = self.rust_type(&field.ty, owner, &hint);
                let _ = writeln!(output, "    {tag}({payload}),");
            }
        }
        output.push_str("}\n\n");
        output
    }
}
