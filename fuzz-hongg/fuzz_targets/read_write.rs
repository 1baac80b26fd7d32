use honggfuzz::fuzz;
use na_json::{Parser, Pools, encode_pretty, parse};

fn main() {
    let pools = Pools::default();
    let parser = Parser::with_pools(&pools);
    loop {
        fuzz!(|data: &[u8]| {
            let mut input = data.to_vec();
            let Ok(mut value) = parser.parse(&mut input) else {
                return;
            };
            let compact = value.to_vec().expect("parsed value must encode");
            let pretty = encode_pretty(&value, "  ").expect("parsed value must encode");
            value.recycle_into(&pools);

            let mut compact_again = compact.clone();
            let mut pretty_again = pretty.clone();
            let a = parse(&mut compact_again).expect("compact output must parse");
            let b = parse(&mut pretty_again).expect("pretty output must parse");
            assert_eq!(a, b);
        });
    }
}
