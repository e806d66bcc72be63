#![no_main]

use libfuzzer_sys::fuzz_target;
use litreview_dedup::models::{Paper, SearchResult};

fuzz_target!(|data: &[u8]| {
    // Should never panic, only return Ok or Err
    if let Ok(paper) = serde_json::from_slice::<Paper>(data) {
        let _ = paper.into_partial_record();
    }
    let _ = serde_json::from_slice::<SearchResult>(data);
});
