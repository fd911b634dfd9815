mod api;
mod quote;

pub use api::{HealthResponse, PaginatedQuotes, QuoteListQuery};
pub use quote::Quote;
