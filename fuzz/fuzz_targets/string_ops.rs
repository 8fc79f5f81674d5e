#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use furry_core::FurryString;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum StringOperation {
    PushBack(u8),
    Concat(Vec<u8>),
    Left(u8),
    Right(u8),
    Mid { index: u8, size: u8 },
    Trim,
    SetChar { index: u8, c: u8 },
    ReplaceRange { pos: u8, len: u8, with: Vec<u8> },
    ReplaceFirst { needle: Vec<u8>, with: Vec<u8> },
    ReplaceAll { needle: Vec<u8>, with: Vec<u8> },
    Utf8Push(char),
    Reset,
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    let operations: Result<Vec<StringOperation>, _> = (0..64)
        .map(|_| StringOperation::arbitrary(&mut u))
        .collect();

    if let Ok(ops) = operations {
        fuzz_string_ops(ops);
    }
});

/// Apply `ops` to a `FurryString` and to a plain byte vector, checking they agree.
fn fuzz_string_ops(operations: Vec<StringOperation>) {
    let mut s = FurryString::new();
    let mut model: Vec<u8> = Vec::new();

    for op in operations {
        match op {
            StringOperation::PushBack(c) => {
                s.push_back(c);
                model.push(c);
            }
            StringOperation::Concat(bytes) => {
                s.concat(&FurryString::from_bytes(&bytes));
                model.extend_from_slice(&bytes);
            }
            StringOperation::Left(n) => {
                s.left(n.into());
                model.truncate(n.into());
            }
            StringOperation::Right(n) => {
                s.right(n.into());
                let n = usize::from(n).min(model.len());
                model.drain(..model.len() - n);
            }
            StringOperation::Mid { index, size } => {
                s.mid(index.into(), size.into());
                let start = usize::from(index).min(model.len());
                let end = start + usize::from(size).min(model.len() - start);
                model = model[start..end].to_vec();
            }
            StringOperation::Trim => {
                let once = {
                    s.trim_whitespace();
                    s.clone()
                };
                s.trim_whitespace();
                assert_eq!(s, once, "trim is not idempotent");
                model = s.as_bytes().to_vec();
            }
            StringOperation::SetChar { index, c } => {
                let index = usize::from(index);
                let result = s.set_char(index, c);
                assert_eq!(result.is_ok(), index < model.len());
                if let Some(slot) = model.get_mut(index) {
                    *slot = c;
                }
            }
            StringOperation::ReplaceRange { pos, len, with } => {
                let pos = usize::from(pos);
                if s.replace_range(pos, len.into(), &with).is_ok() {
                    let end = pos + usize::from(len).min(model.len() - pos);
                    model.splice(pos..end, with);
                } else {
                    assert!(pos > model.len());
                }
            }
            StringOperation::ReplaceFirst { needle, with } => {
                if let Some(pos) = s.replace_first(&needle, &with, 0) {
                    model.splice(pos..pos + needle.len(), with);
                }
            }
            StringOperation::ReplaceAll { needle, with } => {
                s.replace_all(&needle, &with);
                model = s.as_bytes().to_vec();
            }
            StringOperation::Utf8Push(c) => {
                s.utf8_push(c);
                let mut encoded = [0u8; 4];
                model.extend_from_slice(c.encode_utf8(&mut encoded).as_bytes());
            }
            StringOperation::Reset => {
                s.reset();
                model.clear();
            }
        }

        assert_eq!(s.as_bytes(), model.as_slice());
        assert_eq!(s.len(), model.len());
        assert_eq!(s.as_bytes_with_nul().last(), Some(&0));
        assert_eq!(s.hash(), FurryString::from_bytes(&model).hash());
    }
}
