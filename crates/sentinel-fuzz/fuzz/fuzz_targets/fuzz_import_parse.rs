#![no_main]

use libfuzzer_sys::fuzz_target;
use litreview_dedup::import::{self, SourceHint};

fuzz_target!(|data: &[u8]| {
    // Import sources are text; anything else is rejected before parsing
    let Ok(raw) = std::str::from_utf8(data) else { return };

    let _ = import::parse(raw, SourceHint::PlainText);
    let _ = import::parse(raw, SourceHint::CSV);
    let _ = import::parse(raw, SourceHint::TSV);
});
