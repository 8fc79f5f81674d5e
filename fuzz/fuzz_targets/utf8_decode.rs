#![no_main]

use furry_core::string::{utf8_decode_step, Utf8State};
use furry_core::FurryString;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The step decoder must agree with std on valid input.
    if let Ok(text) = std::str::from_utf8(data) {
        let mut state = Utf8State::Starting;
        let mut unicode = 0;
        let mut decoded = Vec::new();
        for &byte in data {
            utf8_decode_step(byte, &mut state, &mut unicode);
            assert_ne!(state, Utf8State::Error, "valid input rejected");
            if state == Utf8State::Starting {
                decoded.push(unicode);
            }
        }
        assert_eq!(state, Utf8State::Starting);
        let expected: Vec<u32> = text.chars().map(u32::from).collect();
        assert_eq!(decoded, expected);
    }

    // Arbitrary bytes: the iterator never panics and never yields more
    // code points than there are bytes.
    let s = FurryString::from_bytes(data);
    let count = s.utf8_length();
    assert!(count <= data.len());
    assert_eq!(count, s.utf8_chars().count());
});
