//! # IronIDL Derive
//!
//! Derive macro implementing `IdlType` for Rust structs and enums.
//!
//! Structs map to records and enums to variants. Generated code refers to
//! the `ironidl` facade crate, so depend on it rather than on the
//! component crates directly.

mod attr;
mod expand;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives the `IdlType` trait.
///
/// Container attributes:
/// - `#[idl(name = "Account")]` registers the type under another name
/// - `#[idl(transparent)]` encodes a single-field struct as its field
///
/// Field and variant attributes:
/// - `#[idl(name = "subAccount")]` sets the label, hashed to the field id
/// - `#[idl(id = 42)]` sets a numeric label; with `name` both must agree
///
/// Unlabelled named fields and variants use their Rust ident as label;
/// tuple fields are positional. Unit variants carry `null`, single-field
/// tuple variants carry their field, and other variants carry a record.
///
/// # Example
/// ```ignore
/// #[derive(IdlType)]
/// struct Account {
///     owner: Principal,
///     #[idl(name = "subAccount")]
///     sub_account: Option<Vec<u8>>,
/// }
///
/// #[derive(IdlType)]
/// enum TransferResult {
///     Ok(u128),
///     Err { reason: String },
/// }
/// ```
#[proc_macro_derive(IdlType, attributes(idl))]
pub fn derive_idl_type(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
