use std::collections::BTreeMap;

use na_json::{Fields, OwnedValue, Record, Value, bind, bind_record, encode, parse, pretty_print};
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
struct Loose {
    id: i64,
    name: String,
    ratio: f64,
    flags: Vec<bool>,
    extra: BTreeMap<String, OwnedValue>,
    child: Option<Box<Loose>>,
}

#[derive(Debug, Default)]
struct Quoted {
    count: u32,
    on: bool,
}

impl Record for Loose {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("id", |l| &mut l.id);
        fields.field("name", |l| &mut l.name);
        fields.field("ratio", |l| &mut l.ratio);
        fields.field("flags", |l| &mut l.flags);
        fields.field("extra", |l| &mut l.extra);
        fields.field("child", |l| &mut l.child);
    }
}

impl Record for Quoted {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("count", |q| &mut q.count).string();
        fields.field("on", |q| &mut q.on).string();
    }
}

bind_record!(Loose, Quoted);

fn reencode(text: &[u8]) -> Vec<u8> {
    let mut data = text.to_vec();
    let mut value = parse(&mut data).expect("encoder output must parse");
    let out = encode(&value).expect("parsed value must encode");
    value.recycle();
    out
}

/// Parses `data`, encodes it and checks the output is stable after one
/// more parse and encode.
pub fn test_round_trip(data: &[u8]) {
    let mut input = data.to_vec();
    let Ok(mut value) = parse(&mut input) else {
        return;
    };
    let text = encode(&value).expect("parsed value must encode");
    value.recycle();

    let once = reencode(&text);
    assert_eq!(reencode(&once), once);

    let pretty = pretty_print(&text, "\t").expect("encoder output must pretty print");
    assert_eq!(reencode(pretty.as_bytes()), once);
}

/// Binds `data` into records; only errors are allowed, never panics.
pub fn test_bind(data: &[u8]) {
    let mut loose = Loose::default();
    if bind(data, &mut loose).is_ok() {
        let value = na_json::to_value(&loose).expect("bound record must serialize");
        let text = value.to_vec().expect("serialized record must encode");
        assert_eq!(na_json::to_vec(&loose).expect("bound record must serialize"), text);
    }

    let mut quoted = Quoted::default();
    let _ = bind(data, &mut quoted);

    let mut any = Value::default();
    let _ = bind(data, &mut any);
}

pub fn test(data: &[u8]) {
    test_round_trip(data);
    test_bind(data);
}
