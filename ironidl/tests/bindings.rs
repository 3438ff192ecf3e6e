use std::cell::RefCell;
use std::collections::BTreeMap;

use ironidl::codegen::{Config, generate_from_idl};
use ironidl::{ArgBuilder, CallError, CallMode, Principal, ReplyDecoder, Value, decode_args};

const LEDGER: &str = r#"
    type Tokens = record { e8s : nat64 };
    type Account = record { owner : principal; subaccount : opt blob };
    type TransferResult = variant { Ok : nat; Err : text };
    type History = opt record { amount : Tokens; previous : History };
    service ledger : {
        balance : (Account) -> (Tokens) query;
        history : (Account) -> (History) query;
        notify : (text) -> () oneway;
        transfer : (Account, Tokens) -> (TransferResult);
    }
"#;

/// Checked-in output of the generator for `LEDGER`.
const GENERATED: &str = include_str!("generated/ledger.rs");

mod ledger {
    include!("generated/ledger.rs");
}

fn ledger_config() -> Config {
    Config::new().binding_name("Ledger").package_name("ledger")
}

use ledger::{Account, History, HistoryInner, Ledger, Tokens, TransferResult};

/// Records every call and answers from canned replies.
#[derive(Default)]
struct MockAgent {
    replies: BTreeMap<&'static str, Vec<u8>>,
    calls: RefCell<Vec<(String, CallMode, Vec<u8>)>>,
}

impl ironidl::Agent for MockAgent {
    type Error = std::io::Error;

    fn call(
        &self,
        _destination: &Principal,
        method: &str,
        mode: CallMode,
        args: Vec<u8>,
    ) -> Result<Vec<u8>, Self::Error> {
        self.calls.borrow_mut().push((method.to_string(), mode, args));
        self.replies.get(method).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("no reply for {method}"))
        })
    }
}

fn account() -> Account {
    Account {
        owner: Principal::management(),
        subaccount: None,
    }
}

#[test]
fn test_checked_in_bindings_are_current() {
    let code = generate_from_idl(LEDGER, &ledger_config()).unwrap();
    assert_eq!(code, GENERATED);
}

#[test]
fn test_query_call_decodes_reply() {
    let mut agent = MockAgent::default();
    agent.replies.insert(
        "balance",
        ArgBuilder::new().arg(&Tokens { e8s: 250 }).encode().unwrap(),
    );
    let ledger = Ledger::new(agent, Principal::management());

    let tokens = ledger.balance(&account()).unwrap();
    assert_eq!(tokens, Tokens { e8s: 250 });

    let calls = ledger.agent().calls.borrow();
    assert_eq!(calls.len(), 1);
    let (method, mode, args) = &calls[0];
    assert_eq!(method, "balance");
    assert_eq!(*mode, CallMode::Query);

    let mut decoded = ReplyDecoder::new(args).unwrap();
    assert_eq!(decoded.read::<Account>().unwrap(), account());
    decoded.finish().unwrap();
}

#[test]
fn test_update_call_with_variant_reply() {
    let mut agent = MockAgent::default();
    agent.replies.insert(
        "transfer",
        ArgBuilder::new()
            .arg(&TransferResult::Err("insufficient funds".to_string()))
            .encode()
            .unwrap(),
    );
    let ledger = Ledger::new(agent, Principal::management());
    let result = ledger.transfer(&account(), &Tokens { e8s: 10 }).unwrap();
    assert_eq!(result, TransferResult::Err("insufficient funds".to_string()));

    let calls = ledger.agent().calls.borrow();
    let (_, mode, args) = &calls[0];
    assert_eq!(*mode, CallMode::Update);

    // the arguments are readable without the Rust types
    let prog = ironidl::parse_idl(LEDGER).unwrap();
    let types = [
        ironidl::Type::Ref(prog.table.lookup("Account").unwrap()),
        ironidl::Type::Ref(prog.table.lookup("Tokens").unwrap()),
    ];
    let values = decode_args(args, &prog.table, &types).unwrap();
    assert_eq!(values[1], Value::record([("e8s", Value::Nat64(10))]));
}

#[test]
fn test_oneway_ignores_reply() {
    let mut agent = MockAgent::default();
    agent.replies.insert("notify", Vec::new());
    let ledger = Ledger::new(agent, Principal::management());
    ledger.notify(&"hello".to_string()).unwrap();
    assert_eq!(ledger.agent().calls.borrow()[0].1, CallMode::Oneway);
}

#[test]
fn test_transport_and_codec_errors() {
    let ledger = Ledger::new(MockAgent::default(), Principal::management());
    let err = ledger.balance(&account()).unwrap_err();
    assert!(matches!(err, CallError::Transport(_)));

    let mut agent = MockAgent::default();
    agent
        .replies
        .insert("balance", ArgBuilder::new().arg(&"oops".to_string()).encode().unwrap());
    let ledger = Ledger::new(agent, Principal::management());
    let err = ledger.balance(&account()).unwrap_err();
    assert!(matches!(err, CallError::Codec(_)));
    assert_eq!(ledger.destination(), &Principal::management());
}

#[test]
fn test_recursive_reply_decodes() {
    let history: History = Some(HistoryInner {
        amount: Tokens { e8s: 2 },
        previous: Box::new(Some(HistoryInner {
            amount: Tokens { e8s: 1 },
            previous: Box::new(None),
        })),
    });
    let mut agent = MockAgent::default();
    agent
        .replies
        .insert("history", ArgBuilder::new().arg(&history).encode().unwrap());
    let ledger = Ledger::new(agent, Principal::management());
    assert_eq!(ledger.history(&account()).unwrap(), history);
    assert_eq!(ledger.agent().calls.borrow()[0].1, CallMode::Query);

    // the Rust types describe the same wire shape as the schema
    let prog = ironidl::parse_idl(LEDGER).unwrap();
    let schema = ironidl::Type::Ref(prog.table.lookup("History").unwrap());
    let bytes = ArgBuilder::new().arg(&history).encode().unwrap();
    let values = decode_args(&bytes, &prog.table, &[schema]).unwrap();
    let Value::Opt(Some(latest)) = &values[0] else {
        panic!("expected a present history");
    };
    assert_eq!(
        latest.field(ironidl::idl_hash("amount")),
        Some(&Value::record([("e8s", Value::Nat64(2))]))
    );
}
