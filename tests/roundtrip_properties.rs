//! Round-trip properties over generated documents.

use na_json::{OwnedValue, Value, encode, parse, pretty_print};
use proptest::prelude::*;

fn utf8_scalar() -> BoxedStrategy<OwnedValue> {
    prop_oneof![
        Just(Value::null()),
        any::<bool>().prop_map(Value::bool),
        any::<i64>().prop_map(Value::from_i64),
        any::<u64>().prop_map(Value::from_u64),
        (-1e300f64..1e300).prop_map(|f| Value::from_f64(f).unwrap_or_else(Value::null)),
        ".*".prop_map(Value::string),
    ]
    .boxed()
}

fn scalar() -> BoxedStrategy<OwnedValue> {
    prop_oneof![
        4 => utf8_scalar(),
        1 => prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::string_bytes),
    ]
    .boxed()
}

fn nested(leaf: BoxedStrategy<OwnedValue>) -> impl Strategy<Value = OwnedValue> {
    leaf.prop_recursive(6, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::array),
            prop::collection::vec(("[a-z\"\\\\]{0,4}", inner), 0..8).prop_map(Value::object),
        ]
    })
}

fn document() -> impl Strategy<Value = OwnedValue> {
    nested(scalar())
}

/// Documents whose strings are all UTF-8.
fn utf8_document() -> impl Strategy<Value = OwnedValue> {
    nested(utf8_scalar())
}

// Encodes, parses the text back and encodes again
fn reencoded(text: &[u8]) -> Vec<u8> {
    let mut data = text.to_vec();
    let mut value = parse(&mut data).unwrap();
    let out = encode(&value).unwrap();
    value.recycle();
    out
}

proptest! {
    #[test]
    fn prop_encode_parse_encode_is_stable(value in document()) {
        let text = encode(&value).unwrap();
        let once = reencoded(&text);
        prop_assert_eq!(reencoded(&once), once);
    }

    #[test]
    fn prop_utf8_documents_round_trip_exactly(value in utf8_document()) {
        let text = encode(&value).unwrap();
        prop_assert_eq!(reencoded(&text), text);
    }

    #[test]
    fn prop_output_is_valid_json(value in document()) {
        let text = encode(&value).unwrap();
        prop_assert!(serde_json::from_slice::<serde_json::Value>(&text).is_ok());
        prop_assert!(std::str::from_utf8(&text).is_ok());
    }

    #[test]
    fn prop_valid_utf8_strings_survive(s in ".*") {
        let text = encode(&Value::string(s.as_str())).unwrap();
        let mut data = text.clone();
        let value = parse(&mut data).unwrap();
        prop_assert_eq!(value.as_str(), Some(s.as_str()));
    }

    #[test]
    fn prop_pretty_print_is_idempotent(value in document()) {
        let text = encode(&value).unwrap();
        let once = pretty_print(&text, "\t").unwrap();
        let twice = pretty_print(once.as_bytes(), "\t").unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(reencoded(once.as_bytes()), reencoded(&text));
    }

    #[test]
    fn prop_parse_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut data = data;
        let _ = parse(&mut data);
    }
}
