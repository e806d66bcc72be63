#![no_main]

use libfuzzer_sys::fuzz_target;
use litreview_dedup::models::{PartialRecord, Record};

fuzz_target!(|data: &[u8]| {
    // A corpus file is a JSON array of records
    let _ = serde_json::from_slice::<Vec<Record>>(data);

    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = serde_json::from_value::<Record>(json.clone());
        let _ = serde_json::from_value::<PartialRecord>(json);
    }
});
