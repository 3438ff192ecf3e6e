use ironidl_core::{
    Error, Principal, ReadBuffer, Type, TypeTable, Value, ValueField, WriteBuffer, decode_args,
    encode_args, idl_hash, is_subtype,
};
use proptest::prelude::*;

fn arb_leaf() -> impl Strategy<Value = (Type, Value)> {
    prop_oneof![
        Just((Type::Null, Value::Null)),
        Just((Type::Reserved, Value::Reserved)),
        any::<bool>().prop_map(|b| (Type::Bool, Value::Bool(b))),
        any::<u128>().prop_map(|n| (Type::Nat, Value::Nat(n))),
        any::<i128>().prop_map(|i| (Type::Int, Value::Int(i))),
        any::<u8>().prop_map(|n| (Type::Nat8, Value::Nat8(n))),
        any::<u16>().prop_map(|n| (Type::Nat16, Value::Nat16(n))),
        any::<u64>().prop_map(|n| (Type::Nat64, Value::Nat64(n))),
        any::<i32>().prop_map(|i| (Type::Int32, Value::Int32(i))),
        any::<i64>().prop_map(|i| (Type::Int64, Value::Int64(i))),
        (-1.0e6f64..1.0e6).prop_map(|x| (Type::Float64, Value::Float64(x))),
        "[a-z0-9 ]{0,12}".prop_map(|s| (Type::Text, Value::Text(s))),
        prop::collection::vec(any::<u8>(), 0..29).prop_map(|bytes| {
            let principal = Principal::from_slice(&bytes).unwrap_or_default();
            (Type::Principal, Value::Principal(principal))
        }),
    ]
}

fn arb_typed() -> impl Strategy<Value = (Type, Value)> {
    arb_leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (inner.clone(), any::<bool>()).prop_map(|((ty, value), present)| {
                let value = if present {
                    Value::some(value)
                } else {
                    Value::Opt(None)
                };
                (Type::opt(ty), value)
            }),
            (inner.clone(), 0..4usize).prop_map(|((ty, value), count)| {
                (Type::vec(ty), Value::Vec(vec![value; count]))
            }),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_flat_map(|fields| {
                    let names: Vec<String> =
                        (0..fields.len()).map(|i| format!("field{i}")).collect();
                    let ty = Type::record(
                        names
                            .iter()
                            .zip(&fields)
                            .map(|(name, (ty, _))| (name.as_str(), ty.clone())),
                    );
                    let values: Vec<ValueField> = names
                        .iter()
                        .zip(fields)
                        .map(|(name, (_, value))| ValueField::named(name.clone(), value))
                        .collect();
                    // any field order is a valid record value
                    (Just(ty), Just(values).prop_shuffle())
                })
                .prop_map(|(ty, values)| (ty, Value::Record(values))),
            (prop::collection::vec(inner, 1..4), any::<prop::sample::Index>()).prop_map(
                |(tags, pick)| {
                    let chosen = pick.index(tags.len());
                    let names: Vec<String> = (0..tags.len()).map(|i| format!("tag{i}")).collect();
                    let ty = Type::variant(
                        names
                            .iter()
                            .zip(&tags)
                            .map(|(name, (ty, _))| (name.as_str(), ty.clone())),
                    );
                    let value = Value::variant(names[chosen].clone(), tags[chosen].1.clone());
                    (ty, value)
                }
            ),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_round_trip((ty, value) in arb_typed()) {
        let table = TypeTable::new();
        let bytes = encode_args(&table, &[(ty.clone(), value.clone())]).unwrap();
        let decoded = decode_args(&bytes, &table, &[ty]).unwrap();
        prop_assert_eq!(decoded, vec![value]);
    }

    #[test]
    fn prop_uleb128_round_trip(n in any::<u128>()) {
        let mut out = WriteBuffer::new();
        out.put_uleb128(n);
        let bytes = out.into_inner();
        prop_assert!(bytes.len() <= 19);
        let mut reader = ReadBuffer::new(&bytes);
        prop_assert_eq!(reader.get_uleb128().unwrap(), n);
        prop_assert!(reader.is_exhausted());
    }

    #[test]
    fn prop_sleb128_round_trip(i in any::<i128>()) {
        let mut out = WriteBuffer::new();
        out.put_sleb128(i);
        let bytes = out.into_inner();
        let mut reader = ReadBuffer::new(&bytes);
        prop_assert_eq!(reader.get_sleb128().unwrap(), i);
        prop_assert!(reader.is_exhausted());
    }

    #[test]
    fn prop_hash_is_deterministic(name in ".{0,32}") {
        prop_assert_eq!(idl_hash(&name), idl_hash(&name.clone()));
    }

    #[test]
    fn prop_truncated_messages_fail((ty, value) in arb_typed(), cut in any::<prop::sample::Index>()) {
        let table = TypeTable::new();
        let bytes = encode_args(&table, &[(ty.clone(), value)]).unwrap();
        let len = cut.index(bytes.len());
        // every strict prefix is rejected, never silently accepted
        prop_assert!(decode_args(&bytes[..len], &table, &[ty]).is_err());
    }
}

#[test]
fn test_scenario_record_with_absent_opt() {
    let table = TypeTable::new();
    let ty = Type::record([("a", Type::Nat), ("b", Type::opt(Type::Text))]);
    let value = Value::record([("a", Value::Nat(42)), ("b", Value::Null)]);
    let bytes = encode_args(&table, &[(ty, value)]).unwrap();
    assert!(bytes.ends_with(&[0x2a, 0x00]));

    let narrow = Type::record([("a", Type::Nat)]);
    let decoded = decode_args(&bytes, &table, &[narrow]).unwrap();
    assert_eq!(decoded, vec![Value::record([("a", Value::Nat(42))])]);
}

#[test]
fn test_scenario_variant_superset_and_subset() {
    let table = TypeTable::new();
    let ty = Type::variant([("ok", Type::Nat), ("err", Type::Text)]);
    let value = Value::variant("err", Value::Text("boom".to_string()));
    let bytes = encode_args(&table, &[(ty, value.clone())]).unwrap();

    let superset = Type::variant([
        ("ok", Type::Nat),
        ("err", Type::Text),
        ("other", Type::Null),
    ]);
    assert_eq!(decode_args(&bytes, &table, &[superset]).unwrap(), vec![value]);

    let subset = Type::variant([("ok", Type::Nat)]);
    let err = decode_args(&bytes, &table, &[subset]).unwrap_err();
    assert!(matches!(err, Error::Subtype(_)));
}

#[test]
fn test_subtype_monotonicity() {
    // a value encoded under a wider record reads under the narrower one
    let table = TypeTable::new();
    let t2 = Type::record([
        ("id", Type::Nat64),
        ("name", Type::Text),
        ("tags", Type::vec(Type::Text)),
    ]);
    let t1 = Type::record([
        ("id", Type::Nat64),
        ("name", Type::Text),
        ("owner", Type::opt(Type::Principal)),
    ]);
    assert!(is_subtype(&table, &t2, &table, &t1).is_ok());

    let value = Value::record([
        ("id", Value::Nat64(9)),
        ("name", Value::Text("n".to_string())),
        ("tags", Value::Vec(vec![Value::Text("t".to_string())])),
    ]);
    let bytes = encode_args(&table, &[(t2, value)]).unwrap();
    let decoded = decode_args(&bytes, &table, &[t1]).unwrap();
    assert_eq!(
        decoded,
        vec![Value::record([
            ("id", Value::Nat64(9)),
            ("name", Value::Text("n".to_string())),
            ("owner", Value::Opt(None)),
        ])]
    );
}

#[test]
fn test_recursive_list_round_trip() {
    let mut table = TypeTable::new();
    let list = table.reserve_named("List").unwrap();
    table
        .set(
            list,
            Type::opt(Type::record([("head", Type::Int), ("tail", Type::Ref(list))])),
        )
        .unwrap();

    let mut value = Value::Opt(None);
    for i in 0..5 {
        value = Value::some(Value::record([("head", Value::Int(i)), ("tail", value)]));
    }
    let bytes = encode_args(&table, &[(Type::Ref(list), value.clone())]).unwrap();
    let decoded = decode_args(&bytes, &table, &[Type::Ref(list)]).unwrap();
    assert_eq!(decoded, vec![value]);
}

#[test]
fn test_malformed_leb128_rejected() {
    let table = TypeTable::new();
    let mut bytes = b"DIDL\x00\x01\x7d".to_vec();
    bytes.extend_from_slice(&[0x80; 20]);
    assert!(matches!(
        decode_args(&bytes, &table, &[Type::Nat]),
        Err(Error::Buffer(_))
    ));
}

#[test]
fn test_reordered_record_round_trip() {
    let table = TypeTable::new();
    let ty = Type::record([("a", Type::Nat), ("b", Type::Text)]);
    let value = Value::record([("b", Value::Text("second".to_string())), ("a", Value::Nat(1))]);
    let bytes = encode_args(&table, &[(ty.clone(), value.clone())]).unwrap();
    let decoded = decode_args(&bytes, &table, &[ty]).unwrap();
    assert_eq!(decoded, vec![value]);
    let Value::Record(fields) = &decoded[0] else {
        panic!("expected a record");
    };
    // wire order is ascending id
    let ids: Vec<u32> = fields.iter().map(|field| field.label.id()).collect();
    assert_eq!(ids, vec![idl_hash("a"), idl_hash("b")]);
}

#[test]
fn test_nat8_vector_round_trip() {
    let table = TypeTable::new();
    let ty = Type::vec(Type::Nat8);
    let value = Value::Vec(vec![Value::Nat8(1), Value::Nat8(2)]);
    let bytes = encode_args(&table, &[(ty.clone(), value.clone())]).unwrap();
    let decoded = decode_args(&bytes, &table, &[ty]).unwrap();
    assert_eq!(decoded, vec![value]);
    assert_eq!(decoded, vec![Value::Blob(vec![1, 2])]);
}
