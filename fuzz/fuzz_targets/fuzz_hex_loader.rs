//! Fuzz target for the Intel HEX loader.
//!
//! Arbitrary text must either load or produce an error, never panic.

#![no_main]

use idis::HexLoader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(space) = HexLoader::parse(text) {
            // Highest record address plus the longest record
            assert!(space.size() <= 0xFFFF + 0xFF);
        }
    }
});
