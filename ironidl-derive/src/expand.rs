//! Expansion of `#[derive(IdlType)]`.

use std::collections::BTreeMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Member, parse_quote};

use crate::attr::{self, LabelSpec};

/// A struct or variant field with its resolved label.
struct FieldInfo {
    member: Member,
    ty: syn::Type,
    label: LabelSpec,
}

fn fields_info(fields: &Fields) -> syn::Result<Vec<FieldInfo>> {
    let mut out = Vec::with_capacity(fields.len());
    let mut seen = BTreeMap::new();
    for (index, field) in fields.iter().enumerate() {
        let position = u32::try_from(index)
            .map_err(|_| syn::Error::new_spanned(field, "too many fields"))?;
        let label = attr::label(&field.attrs, field.ident.as_ref(), position)?;
        if let Some(previous) = seen.insert(label.id(), index) {
            return Err(syn::Error::new_spanned(
                field,
                format!("field id {} is already used by field {previous}", label.id()),
            ));
        }
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        };
        out.push(FieldInfo {
            member,
            ty: field.ty.clone(),
            label,
        });
    }
    Ok(out)
}

/// Expands the derive for `input`.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let container = attr::container_attrs(&input.attrs)?;
    let ident = &input.ident;
    let name = container.name.unwrap_or_else(|| ident.to_string());

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::ironidl::IdlType));
        param.bounds.push(parse_quote!('static));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expansion = match &input.data {
        Data::Struct(data) if container.transparent => transparent(input, &data.fields)?,
        Data::Struct(data) => {
            let fields = fields_info(&data.fields)?;
            let record = record_type(&fields);
            let access: Vec<TokenStream> = fields
                .iter()
                .map(|field| {
                    let member = &field.member;
                    quote!(&self.#member)
                })
                .collect();
            let to_value = record_value(&fields, &access);
            Expansion {
                idl_type: record,
                to_value,
                from_value: record_from(&fields, &quote!(Self), &quote!(value)),
                uses_builder: !fields.is_empty(),
            }
        }
        Data::Enum(data) => variants(data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(ident, "unions cannot derive IdlType"));
        }
    };

    let Expansion {
        idl_type,
        to_value,
        from_value,
        uses_builder,
    } = expansion;
    let builder = if uses_builder {
        quote!(builder)
    } else {
        quote!(_)
    };

    Ok(quote! {
        impl #impl_generics ::ironidl::IdlType for #ident #ty_generics #where_clause {
            fn idl_type(builder: &mut ::ironidl::TypeBuilder) -> ::ironidl::Type {
                builder.register::<Self>(#name, |#builder| #idl_type)
            }

            fn to_value(&self) -> ::ironidl::Value {
                #to_value
            }

            fn from_value(
                value: ::ironidl::Value,
            ) -> ::std::result::Result<Self, ::ironidl::EncodingError> {
                #from_value
            }
        }
    })
}

/// Bodies of the three trait methods.
struct Expansion {
    idl_type: TokenStream,
    to_value: TokenStream,
    from_value: TokenStream,
    uses_builder: bool,
}

fn transparent(input: &DeriveInput, fields: &Fields) -> syn::Result<Expansion> {
    let mut iter = fields.iter();
    let (Some(field), None) = (iter.next(), iter.next()) else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "`transparent` requires exactly one field",
        ));
    };
    let ty = &field.ty;
    let member = match &field.ident {
        Some(ident) => Member::Named(ident.clone()),
        None => Member::Unnamed(0.into()),
    };
    Ok(Expansion {
        idl_type: quote!(builder.add::<#ty>()),
        to_value: quote!(::ironidl::IdlType::to_value(&self.#member)),
        from_value: quote!(::std::result::Result::Ok(Self {
            #member: ::ironidl::IdlType::from_value(value)?,
        })),
        uses_builder: true,
    })
}

fn record_type(fields: &[FieldInfo]) -> TokenStream {
    let entries = fields.iter().map(|field| {
        let label = field.label.tokens();
        let ty = &field.ty;
        quote!(::ironidl::Field { label: #label, ty: builder.add::<#ty>() })
    });
    quote!(::ironidl::Type::Record(::std::vec![#(#entries),*]))
}

fn record_value(fields: &[FieldInfo], access: &[TokenStream]) -> TokenStream {
    let entries = fields.iter().zip(access).map(|(field, access)| {
        let label = field.label.tokens();
        quote!(::ironidl::ValueField {
            label: #label,
            value: ::ironidl::IdlType::to_value(#access),
        })
    });
    quote!(::ironidl::Value::Record(::std::vec![#(#entries),*]))
}

/// Builds `ctor { .. }` from the record value in `source`.
fn record_from(fields: &[FieldInfo], ctor: &TokenStream, source: &TokenStream) -> TokenStream {
    if fields.is_empty() {
        return quote! {
            match #source {
                ::ironidl::Value::Record(_) => ::std::result::Result::Ok(#ctor {}),
                other => ::std::result::Result::Err(
                    ::ironidl::EncodingError::kind_mismatch("record", &other),
                ),
            }
        };
    }
    let inits = fields.iter().map(|field| {
        let member = &field.member;
        let id = field.label.id();
        quote!(#member: ::ironidl::take_field(&mut fields, #id)?)
    });
    quote! {
        match #source {
            ::ironidl::Value::Record(mut fields) => ::std::result::Result::Ok(#ctor { #(#inits),* }),
            other => ::std::result::Result::Err(
                ::ironidl::EncodingError::kind_mismatch("record", &other),
            ),
        }
    }
}

fn variants(data: &syn::DataEnum) -> syn::Result<Expansion> {
    let mut types = Vec::new();
    let mut to_arms = Vec::new();
    let mut from_arms = Vec::new();
    let mut seen = BTreeMap::new();
    let mut any_payload = false;
    let mut uses_builder = false;

    for (index, variant) in data.variants.iter().enumerate() {
        let position = u32::try_from(index)
            .map_err(|_| syn::Error::new_spanned(variant, "too many variants"))?;
        let label = attr::label(&variant.attrs, Some(&variant.ident), position)?;
        let id = label.id();
        if let Some(previous) = seen.insert(id, variant.ident.to_string()) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("tag id {id} is already used by `{previous}`"),
            ));
        }
        let tag = &variant.ident;
        let label_tokens = label.tokens();

        let (payload_type, pattern, value, build) = match &variant.fields {
            Fields::Unit => (
                quote!(::ironidl::Type::Null),
                quote!(Self::#tag),
                quote!(::ironidl::Value::Null),
                quote!(::std::result::Result::Ok(Self::#tag)),
            ),
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                any_payload = true;
                uses_builder = true;
                let ty = &unnamed.unnamed[0].ty;
                (
                    quote!(builder.add::<#ty>()),
                    quote!(Self::#tag(inner)),
                    quote!(::ironidl::IdlType::to_value(inner)),
                    quote!(::std::result::Result::Ok(Self::#tag(
                        ::ironidl::IdlType::from_value(payload)?
                    ))),
                )
            }
            fields => {
                any_payload = true;
                let infos = fields_info(fields)?;
                uses_builder |= !infos.is_empty();
                let bindings: Vec<_> = (0..infos.len()).map(|i| format_ident!("field_{i}")).collect();
                let members = infos.iter().map(|field| &field.member);
                let access: Vec<TokenStream> = bindings.iter().map(|b| quote!(#b)).collect();
                (
                    record_type(&infos),
                    quote!(Self::#tag { #(#members: #bindings),* }),
                    record_value(&infos, &access),
                    record_from(&infos, &quote!(Self::#tag), &quote!(payload)),
                )
            }
        };

        types.push(quote!(::ironidl::Field { label: #label_tokens, ty: #payload_type }));
        to_arms.push(quote! {
            #pattern => ::ironidl::Value::Variant(::std::boxed::Box::new(::ironidl::ValueField {
                label: #label_tokens,
                value: #value,
            }))
        });
        from_arms.push(quote!(#id => #build));
    }

    let idl_type = quote!(::ironidl::Type::Variant(::std::vec![#(#types),*]));
    let to_value = if to_arms.is_empty() {
        quote!(match *self {})
    } else {
        quote!(match self { #(#to_arms),* })
    };
    let payload = if any_payload { quote!(payload) } else { quote!(_) };
    let from_value = quote! {
        match value {
            ::ironidl::Value::Variant(field) => {
                let ::ironidl::ValueField { label, value: #payload } = *field;
                match label.id() {
                    #(#from_arms,)*
                    id => ::std::result::Result::Err(::ironidl::EncodingError::UnknownVariantTag {
                        path: ::ironidl::FieldPath::new(),
                        id,
                    }),
                }
            }
            other => ::std::result::Result::Err(
                ::ironidl::EncodingError::kind_mismatch("variant", &other),
            ),
        }
    };
    Ok(Expansion {
        idl_type,
        to_value,
        from_value,
        uses_builder,
    })
}
