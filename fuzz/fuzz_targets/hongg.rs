use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            na_json_fuzz::test(data);
        });
    }
}
