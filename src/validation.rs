//! Query-string and path validation for the quote endpoints.
//!
//! Validation only checks shape and bounds. Case folding and matching happen
//! in the query engine.

use crate::error::{AppError, AppResult};

// =============================================================================
// Validation Constants
// =============================================================================

/// Page used when `page` is absent.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when `per_page` is absent.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest accepted `per_page`.
pub const MAX_PER_PAGE: u32 = 100;

/// Maximum length of the author filter, in characters.
pub const MAX_AUTHOR_LENGTH: usize = 100;

/// Maximum length of the tag filter, in characters.
pub const MAX_TAG_LENGTH: usize = 50;

/// Validated parameters for listing quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteQueryParams {
    /// Author substring filter (`None` when absent or empty)
    pub author: Option<String>,
    /// Tag filter (`None` when absent or empty)
    pub tag: Option<String>,
    /// 1-indexed page
    pub page: u32,
    /// Page size in `1..=MAX_PER_PAGE`
    pub per_page: u32,
}

impl Default for QuoteQueryParams {
    fn default() -> Self {
        Self {
            author: None,
            tag: None,
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Validate the raw query parameters of `GET /v1/quotes`.
///
/// Empty strings mean "not provided". Rules are checked in order and the first
/// breach is returned:
///
/// 1. `page` must be an integer >= 1
/// 2. `per_page` must be an integer in `1..=100`
/// 3. `author` must not exceed 100 characters
/// 4. `tag` must not exceed 50 characters
pub fn validate_quote_query(
    author: &str,
    tag: &str,
    page: &str,
    per_page: &str,
) -> AppResult<QuoteQueryParams> {
    let mut params = QuoteQueryParams::default();

    if !page.is_empty() {
        params.page = parse_positive(page).ok_or_else(|| {
            AppError::Validation("page must be a positive integer".to_string())
        })?;
    }

    if !per_page.is_empty() {
        let value = parse_positive(per_page).ok_or_else(|| {
            AppError::Validation("per_page must be a positive integer".to_string())
        })?;
        if value > MAX_PER_PAGE {
            return Err(AppError::Validation(format!(
                "per_page cannot exceed {MAX_PER_PAGE}"
            )));
        }
        params.per_page = value;
    }

    if author.chars().count() > MAX_AUTHOR_LENGTH {
        return Err(AppError::Validation(format!(
            "author name too long (max {MAX_AUTHOR_LENGTH} characters)"
        )));
    }

    if tag.chars().count() > MAX_TAG_LENGTH {
        return Err(AppError::Validation(format!(
            "tag name too long (max {MAX_TAG_LENGTH} characters)"
        )));
    }

    params.author = non_empty(author);
    params.tag = non_empty(tag);

    Ok(params)
}

/// Validate a quote id taken from the request path.
pub fn validate_quote_id(id: &str) -> AppResult<()> {
    if id.is_empty() {
        return Err(AppError::Validation("quote ID is required".to_string()));
    }
    Ok(())
}

/// Parse a decimal integer and accept it only if it is >= 1.
///
/// Signed parsing lets "-3" and "0" fail the same way as "abc". Values past
/// `u32::MAX` saturate, so an oversized page reaches the page-range check and
/// an oversized `per_page` reaches the maximum check. Input that does not fit
/// in `i64` is rejected.
fn parse_positive(raw: &str) -> Option<u32> {
    let value: i64 = raw.parse().ok()?;
    if value < 1 {
        return None;
    }
    Some(u32::try_from(value).unwrap_or(u32::MAX))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
