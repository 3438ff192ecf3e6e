//! Shared benchmark workloads.

use ironidl_core::{Error, Principal, Type, TypeTable, Value, encode_args};
use ironidl_schema::parse_idl;

/// Schema used by every workload.
pub const LEDGER_SCHEMA: &str = r#"
    type Tokens = record { e8s : nat64 };
    type Account = record { owner : principal; subaccount : opt blob };
    type Transfer = record {
        from : Account;
        to : Account;
        amount : Tokens;
        fee : opt Tokens;
        memo : opt text;
        created_at : nat64;
    };
    type TransferResult = variant { Ok : nat; Err : text };
    type Batch = vec Transfer;
    service ledger : {
        transfer : (Transfer) -> (TransferResult);
        batch : (Batch) -> (vec TransferResult);
        balance : (Account) -> (Tokens) query;
    }
"#;

/// A resolved schema and a batch of transfers to encode.
#[derive(Debug, Clone)]
pub struct Workload {
    /// Type table of [`LEDGER_SCHEMA`].
    pub table: TypeTable,
    /// The `Batch` type.
    pub batch: Type,
    /// A `Batch` value.
    pub value: Value,
}

impl Workload {
    /// Builds a workload holding `count` transfers.
    ///
    /// # Errors
    /// Returns an error if the schema fails to resolve.
    pub fn transfers(count: usize) -> Result<Self, ironidl_schema::Error> {
        let prog = parse_idl(LEDGER_SCHEMA)?;
        let batch = prog.table.lookup("Batch").map(Type::Ref).ok_or_else(|| {
            ironidl_core::SchemaError::UnknownType {
                name: "Batch".to_string(),
            }
        })?;
        let value = Value::Vec((0..count).map(transfer).collect());
        Ok(Self {
            table: prog.table,
            batch,
            value,
        })
    }

    /// Encodes the batch as a single argument.
    ///
    /// # Errors
    /// Returns an error if the value does not match the schema.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        encode_args(&self.table, &[(self.batch.clone(), self.value.clone())])
    }
}

fn account(seed: u8) -> Value {
    let owner = Principal::from_slice(&[seed, 0x01, 0x02, 0x03]).unwrap_or_default();
    let subaccount = if seed % 2 == 0 {
        Value::Opt(None)
    } else {
        Value::some(Value::Blob(vec![seed; 32]))
    };
    Value::record([("owner", Value::Principal(owner)), ("subaccount", subaccount)])
}

fn tokens(e8s: u64) -> Value {
    Value::record([("e8s", Value::Nat64(e8s))])
}

fn transfer(index: usize) -> Value {
    let seed = (index % 251) as u8;
    let memo = if index % 3 == 0 {
        Value::some(Value::Text(format!("payment #{index}")))
    } else {
        Value::Opt(None)
    };
    Value::record([
        ("from", account(seed)),
        ("to", account(seed.wrapping_add(1))),
        ("amount", tokens(index as u64 * 1_000)),
        ("fee", Value::some(tokens(10_000))),
        ("memo", memo),
        ("created_at", Value::Nat64(1_700_000_000 + index as u64)),
    ])
}

/// Renders `count` transfers in the textual value syntax.
#[must_use]
pub fn transfers_text(count: usize) -> String {
    let items: Vec<String> = (0..count).map(|index| transfer(index).to_string()).collect();
    format!("(vec {{ {} }})", items.join("; "))
}
