mod health;
mod quotes;

pub use health::{health_check, readiness_check};
pub use quotes::{get_quote, get_quote_empty_id, list_quotes, not_found, random_quote};
