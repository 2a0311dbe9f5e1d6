//! Fuzz target for the disassembly engine.
//!
//! Feeds arbitrary images and annotations to both decoders and walks the
//! whole image, checking that stepping always makes progress.

#![no_main]

use arbitrary::Arbitrary;
use idis::{AddressSpace, AnnotationStore, Architecture, DisassemblyEngine};
use libfuzzer_sys::fuzz_target;

/// A directive to place before walking
#[derive(Debug, Arbitrary)]
struct FuzzDirective {
    offset: u16,
    count: u8,
    word: bool,
}

/// Complete fuzz input
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    i8080: bool,
    origin: u16,
    bytes: Vec<u8>,
    directives: Vec<FuzzDirective>,
}

fuzz_target!(|input: FuzzInput| {
    // Limit input size to prevent OOM
    if input.bytes.len() > 65536 || input.directives.len() > 64 {
        return;
    }

    let arch = if input.i8080 {
        Architecture::I8080
    } else {
        Architecture::Cdp1802
    };
    let mut space = AddressSpace::from_bytes(input.bytes.clone());
    let origin = input.origin as u32;
    space.set_origin(origin);

    let mut annotations = AnnotationStore::new();
    for d in &input.directives {
        let addr = origin + d.offset as u32;
        if d.word {
            annotations.set_dw(addr, d.count as usize);
        } else {
            annotations.set_db(addr, d.count as usize);
        }
    }

    let mut engine = DisassemblyEngine::from_parts(arch, space, annotations);

    // Walk from the origin; every step must move forward by the line length
    let mut addr = origin;
    let mut steps = 0usize;
    while engine.in_range(addr) {
        let line = engine.get_line(addr).expect("in-range address has a line");
        assert!(line.length >= 1);
        assert_eq!(line.bytes.len(), line.length);

        match engine.next_addr(addr) {
            Ok(next) => {
                assert!(next > addr);
                addr = next;
            }
            Err(_) => break,
        }

        steps += 1;
        assert!(steps <= input.bytes.len());
    }
});
