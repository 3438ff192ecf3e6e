//! Example generating Rust bindings from an IDL schema.
//!
//! Run with: `cargo run --example generate`
//!
//! Set `RUST_LOG=debug` to see the resolver and generator diagnostics.

use ironidl::Principal;
use ironidl::codegen::{Config, generate_from_idl};

const LEDGER: &str = r#"
    type Tokens = record { e8s : nat64 };
    type Account = record { owner : principal; subaccount : opt blob };
    type TransferError = variant {
        insufficient_funds : record { balance : Tokens };
        bad_fee : record { expected_fee : Tokens };
        temporarily_unavailable;
    };
    type TransferResult = variant { Ok : nat; Err : TransferError };
    service ledger : {
        account_balance : (Account) -> (Tokens) query;
        transfer : (Account, Tokens) -> (TransferResult);
        notify : (text) -> () oneway;
    }
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let prog = ironidl::parse_idl(LEDGER)?;
    println!("Resolved schema:\n{prog}");

    let config = Config::new()
        .binding_name("Ledger")
        .package_name("ledger")
        .destination(Principal::management());
    let code = generate_from_idl(LEDGER, &config)?;

    println!("Generated bindings:\n{code}");
    tracing::info!(bytes = code.len(), "done");
    Ok(())
}
