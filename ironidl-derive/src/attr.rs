//! Parsing of `#[idl(..)]` attributes.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, Ident, LitInt, LitStr};

/// Attributes on the deriving struct or enum.
#[derive(Debug, Default)]
pub struct ContainerAttrs {
    /// Name the type registers under; defaults to the Rust ident.
    pub name: Option<String>,
    /// Encode as the single wrapped field.
    pub transparent: bool,
}

/// Attributes on a field or variant.
#[derive(Debug, Default)]
struct LabelAttrs {
    id: Option<(u32, Span)>,
    name: Option<String>,
}

/// A resolved field label.
#[derive(Debug, Clone)]
pub enum LabelSpec {
    /// Named label with its hashed id.
    Named(String, u32),
    /// Explicit numeric id.
    Id(u32),
    /// Positional field.
    Unnamed(u32),
}

impl LabelSpec {
    /// Returns the field id.
    pub const fn id(&self) -> u32 {
        match self {
            Self::Named(_, id) | Self::Id(id) | Self::Unnamed(id) => *id,
        }
    }

    /// Returns an expression constructing the label.
    pub fn tokens(&self) -> TokenStream {
        match self {
            Self::Named(name, _) => {
                quote!(::ironidl::Label::Named(::std::string::String::from(#name)))
            }
            Self::Id(id) => quote!(::ironidl::Label::Id(#id)),
            Self::Unnamed(id) => quote!(::ironidl::Label::Unnamed(#id)),
        }
    }
}

fn idl_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("idl"))
}

/// Parses container attributes.
pub fn container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in idl_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                out.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("transparent") {
                out.transparent = true;
                Ok(())
            } else {
                Err(meta.error("expected `name` or `transparent`"))
            }
        })?;
    }
    Ok(out)
}

fn label_attrs(attrs: &[Attribute]) -> syn::Result<LabelAttrs> {
    let mut out = LabelAttrs::default();
    for attr in idl_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let lit: LitInt = meta.value()?.parse()?;
                out.id = Some((lit.base10_parse()?, lit.span()));
                Ok(())
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                out.name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `id` or `name`"))
            }
        })?;
    }
    Ok(out)
}

/// Resolves the label of a field or variant.
///
/// An explicit `name` wins and must agree with an explicit `id`; an `id`
/// alone gives a numeric label; otherwise the Rust ident names the label,
/// or the position does for tuple fields.
pub fn label(attrs: &[Attribute], ident: Option<&Ident>, index: u32) -> syn::Result<LabelSpec> {
    let parsed = label_attrs(attrs)?;
    if let Some(name) = parsed.name {
        let hashed = ironidl_core::idl_hash(&name);
        if let Some((id, span)) = parsed.id {
            if id != hashed {
                return Err(syn::Error::new(
                    span,
                    format!("id {id} does not match the hash of \"{name}\" ({hashed})"),
                ));
            }
        }
        return Ok(LabelSpec::Named(name, hashed));
    }
    if let Some((id, _)) = parsed.id {
        return Ok(LabelSpec::Id(id));
    }
    Ok(match ident {
        Some(ident) => {
            let name = ident.to_string();
            let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
            let id = ironidl_core::idl_hash(&name);
            LabelSpec::Named(name, id)
        }
        None => LabelSpec::Unnamed(index),
    })
}
