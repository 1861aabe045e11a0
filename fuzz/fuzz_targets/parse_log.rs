#![no_main]

use libfuzzer_sys::fuzz_target;
use systest_core::{LogLayout, parse_log};

fuzz_target!(|data: &[u8]| {
    // Arbitrary logs may be rejected but must never panic
    if let Ok(s) = std::str::from_utf8(data) {
        let (log, queries) = s.split_once('\0').unwrap_or((s, ""));
        let _ = parse_log(log, Some(queries), &LogLayout::default());
    }
});
