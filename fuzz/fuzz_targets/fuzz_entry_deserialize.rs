//! Fuzz target: record JSON deserialization
//!
//! Feeds arbitrary bytes to serde_json for the persisted record
//! types. Must not panic on any input.
//!
//! Run: cargo +nightly fuzz run fuzz_entry_deserialize -- -max_len=4096

#![no_main]
use draw_core::{DrawingInstance, Entry, Winner};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _: Result<Entry, _> = serde_json::from_slice(data);
    let _: Result<Winner, _> = serde_json::from_slice(data);
    let _: Result<DrawingInstance, _> = serde_json::from_slice(data);

    if let Ok(s) = std::str::from_utf8(data) {
        let _: Result<Entry, _> = serde_json::from_str(s);
    }
});
