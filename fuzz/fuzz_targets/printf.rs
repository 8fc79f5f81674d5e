#![no_main]

use arbitrary::Arbitrary;
use furry_core::string::Arg;
use furry_core::{Error, FurryString};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum FuzzArg {
    Int(i64),
    Uint(u64),
    Float(f64),
    Char(char),
    Str(Vec<u8>),
}

#[derive(Debug, Arbitrary)]
struct PrintfInput {
    prefix: Vec<u8>,
    format: Vec<u8>,
    args: Vec<FuzzArg>,
}

fuzz_target!(|input: PrintfInput| {
    let args: Vec<Arg<'_>> = input
        .args
        .iter()
        .map(|arg| match arg {
            FuzzArg::Int(v) => Arg::Int(*v),
            FuzzArg::Uint(v) => Arg::Uint(*v),
            FuzzArg::Float(v) => Arg::Float(*v),
            FuzzArg::Char(c) => Arg::Char(*c),
            FuzzArg::Str(s) => Arg::Str(s),
        })
        .collect();

    let mut s = FurryString::from_bytes(&input.prefix);
    let before = s.clone();
    match s.cat_printf(&input.format, &args) {
        Ok(written) => {
            assert!(s.starts_with(before.as_bytes()));
            assert_eq!(s.len(), before.len() + written);
        }
        Err(err) => {
            assert_eq!(err, Error::InvalidFormat);
            assert_eq!(s, before, "failed format modified the string");
        }
    }
});
