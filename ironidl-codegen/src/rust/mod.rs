//! Rust code generation modules.

pub mod enums;
pub mod names;
pub mod service;
pub mod types;

pub use names::{NameAllocator, escape_identifier, to_pascal_case, to_snake_case};
pub use service::ServiceGenerator;
pub use types::TypeGenerator;
