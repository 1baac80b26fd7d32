use std::io::{self, Write};

use na_json::{
    EncodeOptions, Encoder, Error, Kind, Pools, Value, encode, encode_pretty, parse, pretty_print,
};

// Parses `input` and encodes it back as compact JSON
fn reencode(input: &str) -> String {
    let mut data = input.as_bytes().to_vec();
    let mut value = parse(&mut data).unwrap();
    let out = encode(&value).unwrap();
    value.recycle();
    String::from_utf8(out).unwrap()
}

fn encoded(value: &Value<'_>) -> String {
    String::from_utf8(encode(value).unwrap()).unwrap()
}

fn encoded_with(value: &Value<'_>, options: EncodeOptions) -> String {
    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out).options(options);
    encoder.encode(value).unwrap();
    encoder.finish().unwrap();
    String::from_utf8(out).unwrap()
}

/// Accepts everything and counts the calls to `write`.
#[derive(Default)]
struct CountingWriter {
    data: Vec<u8>,
    writes: usize,
    flushes: usize,
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_round_trip_canonical() {
    let inputs = [
        r#"[1,2,3,1.33e4,true,null,"abc",{"key":13,"key2":false}]"#,
        r#"{}"#,
        r#"[]"#,
        r#"[[],{},[{}]]"#,
        r#""""#,
        r#"-0"#,
        r#"{"a":{"b":{"c":[1.5e-300,123456789012345678901234567890]}}}"#,
        r#"["1337çé7331"]"#,
    ];
    for input in inputs {
        assert_eq!(reencode(input), input);
    }
}

#[test]
fn test_whitespace_is_dropped() {
    assert_eq!(reencode(" [ 1 , { \"a\" : null } ] "), r#"[1,{"a":null}]"#);
}

#[test]
fn test_number_literal_is_replayed() {
    assert_eq!(reencode("[1.000,1E+2,-0.0e-0]"), "[1.000,1E+2,-0.0e-0]");
}

#[test]
fn test_escapes_shortest_form() {
    assert_eq!(
        reencode(r#""\/ \' A \b\f""#),
        r#""/ ' A \u0008\u000c""#
    );
}

#[test]
fn test_escape_rules() {
    let value = Value::string("q\"b\\n\nr\rt\tc\u{1}\u{1f} <&> é/");
    assert_eq!(
        encoded(&value),
        r#""q\"b\\n\nr\rt\tc\u0001\u001f <&> é/""#
    );
}

#[test]
fn test_line_separators_are_escaped() {
    let value = Value::string("a\u{2028}b\u{2029}c");
    assert_eq!(encoded(&value), r#""a\u2028b\u2029c""#);
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let value = Value::string_bytes(vec![b'a', 0xff, 0xfe, b'b', 0xe2, 0x82]);
    assert_eq!(encoded(&value), r#""a\ufffd\ufffdb\ufffd""#);
}

#[test]
fn test_escape_html() {
    let value = Value::string("<a href=\"x\">&</a>");
    assert_eq!(encoded(&value), r#""<a href=\"x\">&</a>""#);
    assert_eq!(
        encoded_with(&value, EncodeOptions::new().escape_html(true)),
        r#""\u003ca href=\"x\"\u003e\u0026\u003c/a\u003e""#
    );
}

#[test]
fn test_keys_are_escaped() {
    let value = Value::object([("a\"b", Value::null()), ("\n", Value::bool(false))]);
    assert_eq!(encoded(&value), r#"{"a\"b":null,"\n":false}"#);
}

#[test]
fn test_hand_built_tree() {
    let value = Value::object([
        ("name", Value::string("na_json")),
        ("n", Value::from_i64(-3)),
        ("u", Value::from_u64(u64::MAX)),
        ("f", Value::from_f64(0.5).unwrap()),
        ("list", [Value::from(true), Value::null()].into_iter().collect()),
    ]);
    assert_eq!(
        value.to_string(),
        r#"{"name":"na_json","n":-3,"u":18446744073709551615,"f":0.5,"list":[true,null]}"#
    );
    assert!(Value::from_f64(f64::NAN).is_none());
    assert!(Value::from_f64(f64::INFINITY).is_none());
}

#[test]
fn test_invalid_value_is_an_error() {
    let value = Value::array(vec![Value::default()]);
    assert!(matches!(encode(&value), Err(Error::InvalidValue(_))));

    let value = Value::number(Vec::new());
    assert!(matches!(encode(&value), Err(Error::InvalidValue(_))));
}

#[test]
fn test_writes_are_batched() {
    let mut data = format!(
        "[{}]",
        (0..2000).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    )
    .into_bytes();
    let expected = data.clone();
    let value = parse(&mut data).unwrap();

    let mut writer = CountingWriter::default();
    let written = value.encode(&mut writer).unwrap();

    assert_eq!(writer.data, expected);
    assert_eq!(written, expected.len());
    assert!(writer.writes <= expected.len() / 200 + 1);
    assert_eq!(writer.flushes, 1);
}

#[test]
fn test_small_value_is_one_write() {
    let mut writer = CountingWriter::default();
    Value::object([("a", Value::from_i64(1))])
        .encode(&mut writer)
        .unwrap();
    assert_eq!(writer.writes, 1);
    assert_eq!(writer.data, br#"{"a":1}"#);
}

#[test]
fn test_long_string_passes_through() {
    let long = "x".repeat(10_000);
    let value = Value::array(vec![Value::string(long.as_str()), Value::from_i64(1)]);
    let out = encoded(&value);
    assert_eq!(out.len(), long.len() + 6);
    assert!(out.ends_with("\",1]"));
}

#[test]
fn test_sink_errors_surface_as_io() {
    let value = Value::string("x".repeat(1000));
    assert!(matches!(value.encode(FailingWriter), Err(Error::Io(_))));
}

#[test]
fn test_encoder_returns_scratch_to_its_pool() {
    let pools = Pools::default();
    let mut out = Vec::new();
    {
        let mut encoder = Encoder::with_pools(&mut out, &pools);
        encoder.encode(&Value::null()).unwrap();
        encoder.finish().unwrap();
    }
    {
        // dropped without finishing
        let mut encoder = Encoder::with_pools(Vec::new(), &pools);
        encoder.encode(&Value::null()).unwrap();
    }
    let stats = pools.stats().scratch;
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.idle, 1);
    assert_eq!(out, b"null");
}

#[test]
fn test_encoder_writes_several_values() {
    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out);
    encoder.encode(&Value::from_i64(1)).unwrap();
    encoder.encode(&Value::string("a")).unwrap();
    assert_eq!(encoder.finish().unwrap(), 4);
    assert_eq!(out, br#"1"a""#);
}

#[test]
fn test_pretty_layout() {
    let mut data = br#"{"a":[1,2],"b":{},"c":[],"d":{"only":[true]}}"#.to_vec();
    let value = parse(&mut data).unwrap();
    let pretty = String::from_utf8(encode_pretty(&value, "  ").unwrap()).unwrap();
    assert_eq!(
        pretty,
        "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {},\n  \"c\": [],\n  \"d\": {\"only\": [true]}\n}"
    );
}

#[test]
fn test_pretty_scalars_and_small_containers() {
    let pretty = |input: &str| pretty_print(input.as_bytes(), "\t").unwrap();
    assert_eq!(pretty("1"), "1");
    assert_eq!(pretty("[]"), "[]");
    assert_eq!(pretty("{}"), "{}");
    assert_eq!(pretty("[1]"), "[1]");
    assert_eq!(pretty(r#"{"a":1}"#), r#"{"a": 1}"#);
    assert_eq!(pretty("[[1,2]]"), "[[\n\t1,\n\t2\n]]");
}

#[test]
fn test_pretty_print_message() {
    let input = br#"{"op":"hello","d":{"v":1}}"#;
    let text = pretty_print(input, "\t").unwrap();
    assert_eq!(text, "{\n\t\"op\": \"hello\",\n\t\"d\": {\"v\": 1}\n}");
}

#[test]
fn test_pretty_print_is_idempotent() {
    let input = br#"{"list":[1,[2,3],{"k":"v","k2":[]}],"s":"a\nb","n":null}"#;
    let once = pretty_print(input, "    ").unwrap();
    let twice = pretty_print(once.as_bytes(), "    ").unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_pretty_print_leaves_input_alone_on_error() {
    let input = br#"{"a":"\n",}"#;
    let copy = input.to_vec();
    assert!(pretty_print(input, "\t").is_err());
    assert_eq!(input.as_slice(), copy.as_slice());
}

#[test]
fn test_pretty_print_rejects_leftover() {
    assert!(matches!(
        pretty_print(b"[1] [2]", "\t"),
        Err(Error::Leftover(_))
    ));
}

#[test]
fn test_display_matches_encode() {
    let mut data = br#"{"a" : [ true ]}"#.to_vec();
    let value = parse(&mut data).unwrap();
    assert_eq!(value.to_string(), r#"{"a":[true]}"#);
    assert_eq!(value.kind(), Kind::Object);
}

#[cfg(feature = "bytes")]
#[test]
fn test_encode_to_bytes() {
    let value = Value::array(vec![Value::from_i64(1), Value::string("x")]);
    let bytes = na_json::encode_to_bytes(&value).unwrap();
    assert_eq!(&bytes[..], br#"[1,"x"]"#);
}

#[test]
fn test_pretty_vec_of_hand_built_value() {
    let value = Value::object([
        ("a", Value::from_i64(1)),
        ("b", Value::array(vec![Value::null(), Value::bool(true)])),
    ]);
    assert_eq!(
        value.to_pretty_vec("\t").unwrap(),
        b"{\n\t\"a\": 1,\n\t\"b\": [\n\t\tnull,\n\t\ttrue\n\t]\n}"
    );
}
