//! Fuzz testing for query validation and pagination.
//!
//! Checks that arbitrary query strings never panic the validator, and that
//! whatever it accepts never panics the paginator.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use arbitrary::Arbitrary;
use dev_quotes_api::models::Quote;
use dev_quotes_api::services::paginate;
use dev_quotes_api::validation::{validate_quote_id, validate_quote_query};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    author: &'a str,
    tag: &'a str,
    page: &'a str,
    per_page: &'a str,
    id: &'a str,
    dataset_len: u8,
}

fuzz_target!(|input: Input<'_>| {
    let _ = validate_quote_id(input.id);

    let Ok(params) = validate_quote_query(input.author, input.tag, input.page, input.per_page)
    else {
        return;
    };

    let quotes: Vec<Quote> = (0..input.dataset_len)
        .map(|i| Quote {
            id: i.to_string(),
            author: "fuzz".to_string(),
            text: String::new(),
            tags: Vec::new(),
        })
        .collect();

    if let Ok(page) = paginate(quotes, params.page, params.per_page) {
        assert!(page.quotes.len() <= params.per_page as usize);
        assert_eq!(page.total, usize::from(input.dataset_len));
    }
});
