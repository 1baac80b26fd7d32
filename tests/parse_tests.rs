use na_json::{Error, Kind, ParseError, ParseOptions, Parser, Pools, Value, parse, parse_into};

// Parses a copy of `input` and returns an owned tree
fn parsed(input: &str) -> Value<'static> {
    let mut data = input.as_bytes().to_vec();
    let mut value = parse(&mut data).unwrap();
    let owned = value.to_owned_value();
    value.recycle();
    owned
}

// Parses a copy of `input` and returns the parse error
fn parse_error(input: &str) -> ParseError {
    let mut data = input.as_bytes().to_vec();
    match parse(&mut data) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected a parse error for {input:?}, got {other:?}"),
    }
}

#[test]
fn test_parse_literals() {
    assert_eq!(parsed("true").kind(), Kind::True);
    assert_eq!(parsed("false").kind(), Kind::False);
    assert_eq!(parsed("null").kind(), Kind::Null);
    assert_eq!(parsed(" \t\r\nnull \n").kind(), Kind::Null);
}

#[test]
fn test_parse_literal_errors() {
    let e = parse_error("nul");
    assert_eq!(e.reason, "not enough characters for null/true");
    assert_eq!(e.pos, 0);

    let e = parse_error("nope");
    assert_eq!(e.reason, "expected one of 'true', 'null'");

    let e = parse_error("fals");
    assert_eq!(e.reason, "not enough characters for false");

    let e = parse_error("falsy");
    assert_eq!(e.reason, "expected 'false'");
    assert_eq!(e.byte, b'f');
}

#[test]
fn test_parse_numbers_keep_literal() {
    for literal in ["0", "-0", "3.14", "1e10", "1E-5", "-12.5e+3", "123456789012345678901234567890"] {
        let value = parsed(literal);
        assert_eq!(value.kind(), Kind::Number, "{literal}");
        assert_eq!(value.raw(), literal.as_bytes());
    }
}

#[test]
fn test_parse_number_errors_point_at_first_invalid_byte() {
    let cases = [("01", 1), ("1.", 1), ("-", 0), ("1e", 1), ("1.x", 2), ("-a", 1), ("1e+", 2)];
    for (input, pos) in cases {
        let e = parse_error(input);
        assert_eq!(e.kind, Kind::Number, "{input}");
        assert_eq!(e.pos, pos, "{input}");
    }
}

#[test]
fn test_parse_leading_dot_is_not_a_value() {
    let e = parse_error(".5");
    assert_eq!(e.kind, Kind::Invalid);
    assert_eq!(e.pos, 0);
    assert_eq!(e.byte, b'.');
    assert_eq!(e.reason, "unhandleable token");
}

#[test]
fn test_parse_number_in_container() {
    let value = parsed("[0,-1.5e3]");
    assert_eq!(value[0].raw(), b"0");
    assert_eq!(value[1].raw(), b"-1.5e3");
    assert_eq!(value[1].as_f64(), Some(-1500.0));

    let e = parse_error("[01]");
    assert_eq!(e.pos, 2);
}

#[test]
fn test_parse_empty_input() {
    let mut data = Vec::new();
    assert!(matches!(parse(&mut data), Err(Error::EmptyInput)));
}

#[test]
fn test_parse_whitespace_only() {
    let e = parse_error("  \n");
    assert_eq!(e.reason, "no JSON value found");
    assert_eq!(e.pos, 2);
}

#[test]
fn test_parse_leftover() {
    let mut data = b"[1] x y".to_vec();
    match parse(&mut data) {
        Err(Error::Leftover(e)) => assert_eq!(e.bytes(), b"x y"),
        other => panic!("unexpected result: {other:?}"),
    }

    let mut data = b"{} {}".to_vec();
    assert!(matches!(parse(&mut data), Err(Error::Leftover(_))));
}

#[test]
fn test_parse_trailing_whitespace_is_allowed() {
    let value = parsed("[1] \t\r\n");
    assert_eq!(value.len(), 1);
}

#[test]
fn test_parse_arrays() {
    let value = parsed("[ 1 , [ ] , [true] ]");
    assert_eq!(value.kind(), Kind::Array);
    assert_eq!(value.len(), 3);
    assert!(value[1].is_empty());
    assert_eq!(value[2][0].as_bool(), Some(true));
}

#[test]
fn test_parse_array_errors() {
    let e = parse_error("[1 1]");
    assert_eq!(e.kind, Kind::Array);
    assert_eq!(e.pos, 3);
    assert_eq!(e.byte, b'1');
    assert_eq!(e.reason, "invalid char after value");

    let e = parse_error("[1,2");
    assert_eq!(e.kind, Kind::Array);
    assert_eq!(e.pos, 3);
    assert_eq!(e.reason, "missing closing bracket ']' for array");

    let e = parse_error("[1,]");
    assert_eq!(e.kind, Kind::Invalid);
    assert_eq!(e.pos, 3);
    assert_eq!(e.byte, b']');
}

#[test]
fn test_parse_objects() {
    let value = parsed(r#"{ "a" : 1 , "b" : { } , "c" : [null] }"#);
    assert_eq!(value.kind(), Kind::Object);
    assert_eq!(value.len(), 3);
    assert_eq!(value.children()[0].key(), b"a");
    assert_eq!(value["a"].raw(), b"1");
    assert_eq!(value["b"].kind(), Kind::Object);
    assert!(value["c"][0].is_null());
}

#[test]
fn test_parse_object_keeps_document_order() {
    let value = parsed(r#"{"z":1,"a":2,"m":3}"#);
    let keys: Vec<_> = value.entries().map(|(key, _)| key.to_vec()).collect();
    assert_eq!(keys, [b"z".to_vec(), b"a".to_vec(), b"m".to_vec()]);
}

#[test]
fn test_parse_object_missing_close() {
    let e = parse_error(r#"{"k":1"#);
    assert_eq!(e.kind, Kind::Object);
    assert_eq!(e.pos, 5);
    assert_eq!(e.reason, "missing closing bracket '}' for object");
}

#[test]
fn test_parse_object_state_errors() {
    let e = parse_error(r#"{"a":1,}"#);
    assert_eq!(e.pos, 7);
    assert_eq!(e.reason, "can't close object after key");

    let e = parse_error(r#"{"a"}"#);
    assert_eq!(e.reason, "can't close object after colon");

    let e = parse_error(r#"{"a":}"#);
    assert_eq!(e.reason, "can't close object after value");

    let e = parse_error(r#"{"a" 1}"#);
    assert_eq!(e.reason, "unexpected value, expecting colon");

    let e = parse_error(r#"{"a"::1}"#);
    assert_eq!(e.reason, "unexpected colon, expecting value");

    let e = parse_error(r#"{"a":1 "b":2}"#);
    assert_eq!(e.reason, "unexpected value, expecting comma");
    assert_eq!(e.pos, 7);

    let e = parse_error(r#"{,}"#);
    assert_eq!(e.reason, "unexpected comma, expecting key");

    let e = parse_error(r#"{a:1}"#);
    assert_eq!(e.kind, Kind::Object);
    assert_eq!(e.reason, "unexpected value, expecting key");
}

#[test]
fn test_duplicate_keys_last_wins() {
    let value = parsed(r#"{"a":1,"a":2}"#);
    assert_eq!(value.len(), 2);
    assert_eq!(value.children()[0].raw(), b"1");
    assert_eq!(value["a"].raw(), b"2");

    let mut data = br#"{"a":1,"b":0,"a":2,"a":3}"#.to_vec();
    let value = parse(&mut data).unwrap();
    assert_eq!(value.property("a").unwrap().raw(), b"3");
    assert_eq!(value.property("b").unwrap().raw(), b"0");
}

#[test]
fn test_lookup_first_child_of_indexed_object() {
    let mut data = br#"{"first":1,"second":2,"third":3}"#.to_vec();
    let mut value = parse(&mut data).unwrap();
    assert_eq!(value.property("first").unwrap().raw(), b"1");
    assert_eq!(value.property("third").unwrap().raw(), b"3");
    assert!(value.property("fourth").is_none());
    assert!(value.property("First").is_none());
    value.recycle();
}

#[test]
fn test_lookup_single_child_object() {
    let mut data = br#"{"only":true}"#.to_vec();
    let value = parse(&mut data).unwrap();
    assert_eq!(value["only"].as_bool(), Some(true));
    assert!(value.get("other").is_none());
}

#[test]
fn test_lookup_on_hand_built_object() {
    let value = Value::object([
        ("a", Value::from_i64(1)),
        ("b", Value::from_i64(2)),
        ("a", Value::from_i64(3)),
    ]);
    assert_eq!(value["a"].as_i64(), Some(3));
    assert_eq!(value["b"].as_i64(), Some(2));
}

#[test]
fn test_get_by_position_and_missing() {
    let value = parsed(r#"[{"a":[10,20]}]"#);
    assert_eq!(value.get(0).and_then(|v| v.get("a")).and_then(|v| v.get(1)).unwrap().raw(), b"20");
    assert!(value.get(5).is_none());
    assert!(value[0]["a"][9].is_null());
    assert!(value[0]["missing"]["deeper"].is_null());
    assert!(parsed("1").get(0).is_none());
}

#[test]
fn test_get_mut_updates_child() {
    let mut data = br#"{"a":1,"b":2}"#.to_vec();
    let mut value = parse(&mut data).unwrap();
    value.get_mut("b").unwrap().replace(Value::bool(true));
    assert_eq!(value.children()[1].kind(), Kind::True);
    assert_eq!(value["b"].as_bool(), Some(true));
}

#[test]
fn test_parse_into_reuses_destination() {
    let pools = Pools::default();
    let parser = Parser::with_pools(&pools);

    let mut first = br#"[1,2,3]"#.to_vec();
    let mut second = br#"{"k":"v"}"#.to_vec();

    let mut value = Value::default();
    parser.parse_into(&mut value, &mut first).unwrap();
    assert_eq!(value.len(), 3);
    assert_eq!(pools.stats().node_arrays.misses, 1);

    parser.parse_into(&mut value, &mut second).unwrap();
    assert_eq!(pools.stats().node_arrays.hits, 1);
    assert_eq!(value.kind(), Kind::Object);
    assert_eq!(value["k"].as_str(), Some("v"));
    value.recycle_into(&pools);
}

#[test]
fn test_parse_into_resets_on_error() {
    let mut data = b"[1,2".to_vec();
    let mut value = Value::null();
    assert!(parse_into(&mut value, &mut data).is_err());
    assert_eq!(value.kind(), Kind::Invalid);
    assert!(value.is_empty());
}

#[test]
fn test_max_depth() {
    let parser = Parser::new().options(ParseOptions::new().max_depth(3));

    let mut ok = b"[[[1]]]".to_vec();
    assert!(parser.parse(&mut ok).is_ok());

    let mut deep = br#"[[{"a":[1]}]]"#.to_vec();
    match parser.parse(&mut deep) {
        Err(Error::Parse(e)) => {
            assert_eq!(e.kind, Kind::Array);
            assert_eq!(e.pos, 7);
            assert_eq!(e.reason, "maximum nesting depth exceeded");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_default_depth_limit_stops_runaway_nesting() {
    let mut data = vec![b'['; 100_000];
    let e = parse(&mut data).unwrap_err();
    assert_eq!(e.as_parse().unwrap().pos, ParseOptions::DEFAULT_MAX_DEPTH);
}

#[test]
fn test_siblings_do_not_accumulate_depth() {
    let parser = Parser::new().options(ParseOptions::new().max_depth(2));
    let mut data = b"[[1],[2],[3],{},{}]".to_vec();
    assert_eq!(parser.parse(&mut data).unwrap().len(), 5);
}

#[test]
fn test_full_document() {
    let mut data = br#"{
        "op": "hello",
        "d": {"heartbeat_interval": 41250, "_trace": ["gateway-prd-1", "session-prd-2"]},
        "s": null,
        "t": false
    }"#
    .to_vec();
    let mut value = parse(&mut data).unwrap();
    assert_eq!(value["op"].as_str(), Some("hello"));
    assert_eq!(value["d"]["heartbeat_interval"].as_u64(), Some(41250));
    assert_eq!(value["d"]["_trace"][1].as_str(), Some("session-prd-2"));
    assert!(value["s"].is_null());
    assert_eq!(value["t"].as_bool(), Some(false));
    value.recycle();
}
