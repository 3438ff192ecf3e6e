//! Example encoding textual IDL values and decoding them against an
//! older version of the schema.
//!
//! Run with: `cargo run --example values`

use ironidl::{Type, decode_args, encode_args, parse_idl};
use ironidl::schema::parse_values_with;

const PROFILE_V2: &str = r"
    type Profile = record { id : nat64; name : text; tags : vec text };
";

const PROFILE_V1: &str = r"
    type Profile = record { id : nat64; name : text };
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let v2 = parse_idl(PROFILE_V2)?;
    let profile = Type::Ref(v2.table.lookup("Profile").ok_or("missing Profile")?);
    let values = parse_values_with(
        r#"(record { id = (7 : nat64); name = "ada"; tags = vec { "admin" } })"#,
        &v2.table,
    )?;

    let args: Vec<(Type, _)> = values.into_iter().map(|v| (profile.clone(), v)).collect();
    let bytes = encode_args(&v2.table, &args)?;
    println!("Encoded {} bytes: {bytes:02x?}", bytes.len());

    // A reader built against the first version skips the extra field.
    let v1 = parse_idl(PROFILE_V1)?;
    let decoded = decode_args(&bytes, &v1.table, &[Type::Ref(0)])?;
    for value in &decoded {
        println!("Decoded: {value}");
    }
    Ok(())
}
