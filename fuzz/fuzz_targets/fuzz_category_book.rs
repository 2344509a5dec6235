//! Fuzz target: category book TOML parsing
//!
//! Feeds arbitrary bytes to the CategoryBook deserializer. Config
//! files are operator-supplied, so malformed input must fail cleanly.
//!
//! Run: cargo +nightly fuzz run fuzz_category_book -- -max_len=8192

#![no_main]
use draw_core::CategoryBook;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse must not panic; a parsed book must also survive
        // validation without panicking.
        if let Ok(book) = toml::from_str::<CategoryBook>(s) {
            let _ = book.validate();
        }
    }
});
