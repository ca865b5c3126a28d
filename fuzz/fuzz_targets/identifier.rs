#![no_main]

use libfuzzer_sys::fuzz_target;
use systest_core::TestDescriptor;

fuzz_target!(|data: &[u8]| {
    // Engine identifiers are text; ignore invalid UTF-8
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must survive the canonical form unchanged
        if let Ok(descriptor) = TestDescriptor::parse(s) {
            let reparsed = TestDescriptor::parse(&descriptor.to_string());
            assert_eq!(reparsed.ok(), Some(descriptor));
        }
    }
});
