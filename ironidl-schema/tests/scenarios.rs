use ironidl_core::{Error as CodecError, Principal, Type, Value, decode_args, encode_args};
use ironidl_schema::{Error, parse_idl, parse_value, parse_values, parse_values_with};
use proptest::prelude::*;

const PROFILE: &str = r"
    // user profiles
    type Profile = record {
        id : nat64;
        name : text;
        tags : vec text;
        owner : opt principal;
    };
    type ProfileV1 = record { id : nat64; name : text };
    type Status = variant { active; suspended : text; /* reserved for later */ deleted };
";

#[test]
fn test_scenario_text_values_through_codec() {
    let prog = parse_idl(PROFILE).unwrap();
    let profile = Type::Ref(prog.table.lookup("Profile").unwrap());
    let v1 = Type::Ref(prog.table.lookup("ProfileV1").unwrap());

    let values = parse_values_with(
        r#"(record { id = (9 : nat64); name = "ada"; tags = vec { "x"; "y" }; owner = null })"#,
        &prog.table,
    )
    .unwrap();
    let bytes = encode_args(&prog.table, &[(profile.clone(), values[0].clone())]).unwrap();

    let decoded = decode_args(&bytes, &prog.table, &[v1]).unwrap();
    assert_eq!(
        decoded,
        vec![Value::record([
            ("id", Value::Nat64(9)),
            ("name", Value::Text("ada".to_string())),
        ])]
    );

    let full = decode_args(&bytes, &prog.table, &[profile]).unwrap();
    assert_eq!(
        full[0].field(ironidl_core::idl_hash("owner")),
        Some(&Value::Opt(None))
    );
}

#[test]
fn test_scenario_variant_narrowing() {
    let prog = parse_idl(PROFILE).unwrap();
    let status = Type::Ref(prog.table.lookup("Status").unwrap());
    let value = parse_value(r#"variant { suspended = "spam" }"#).unwrap();
    let bytes = encode_args(&prog.table, &[(status, value)]).unwrap();

    let narrow = parse_idl("type S = variant { active; deleted };").unwrap();
    let err = decode_args(&bytes, &narrow.table, &[Type::Ref(0)]).unwrap_err();
    assert!(matches!(err, CodecError::Subtype(_)));
}

#[test]
fn test_recursive_schema_round_trip() {
    let prog = parse_idl("type List = opt record { head : int; tail : List };").unwrap();
    let list = Type::Ref(0);
    let value = parse_value("opt record { head = +1; tail = opt record { head = -2; tail = null } }")
        .unwrap()
        .annotate(&prog.table, &list)
        .unwrap();
    let bytes = encode_args(&prog.table, &[(list.clone(), value.clone())]).unwrap();
    assert_eq!(decode_args(&bytes, &prog.table, &[list]).unwrap(), vec![value]);
}

#[test]
fn test_error_is_all_or_nothing() {
    let err = parse_idl("type A = nat; type B = vec;").unwrap_err();
    let Error::Grammar(err) = err else {
        panic!("expected grammar error");
    };
    assert_eq!(err.line, 1);
    assert_eq!(err.found, "`;`");
}

#[test]
fn test_printed_values_reparse() {
    let source = r#"(record { 0 = "a"; name = blob "\00hi"; flag = variant { on } }, principal "aaaaa-aa", (5 : nat8), -3)"#;
    let values = parse_values(source).unwrap();
    for value in &values {
        assert_eq!(&parse_value(&value.to_string()).unwrap(), value);
    }
    assert_eq!(values[1], Value::Principal(Principal::management()));
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        Just(Value::Reserved),
        any::<bool>().prop_map(Value::Bool),
        any::<u128>().prop_map(Value::Nat),
        any::<i128>().prop_map(Value::Int),
        any::<u8>().prop_map(Value::Nat8),
        any::<i16>().prop_map(Value::Int16),
        any::<u64>().prop_map(Value::Nat64),
        any::<i64>().prop_map(Value::Int64),
        (-1.0e9f64..1.0e9).prop_map(Value::Float64),
        "\\PC{0,8}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Blob),
        prop::collection::vec(any::<u8>(), 0..29)
            .prop_map(|bytes| Value::Principal(Principal::from_slice(&bytes).unwrap_or_default())),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Value::some),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Vec),
            prop::collection::vec(("[a-z][a-z0-9_]{0,6}", inner.clone()), 0..4).prop_map(
                |fields| {
                    let mut seen = std::collections::HashSet::new();
                    Value::Record(
                        fields
                            .into_iter()
                            .filter(|(name, _)| seen.insert(name.clone()))
                            .map(|(name, value)| ironidl_core::ValueField::named(name, value))
                            .collect(),
                    )
                }
            ),
            ("[a-z]{1,6}", inner).prop_map(|(tag, value)| Value::variant(tag, value)),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_print_parse_is_identity(value in arb_value()) {
        let once = parse_value(&value.to_string()).unwrap();
        let twice = parse_value(&once.to_string()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
