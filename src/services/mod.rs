//! Domain services sitting between the HTTP handlers and the dataset.

pub mod quotes;

pub use quotes::{QuoteService, paginate};
