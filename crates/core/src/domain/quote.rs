use serde::{Deserialize, Serialize};

/// Name shown (and spoken) for a ticker whose lookup failed.
pub const FETCH_FAILED_NAME: &str = "取得失敗";

/// One row of the quote table. Built fresh every cycle and dropped after
/// rendering. `price` is `None` (never zero) when the lookup failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerQuote {
    pub ticker: String,
    pub name: String,
    pub price: Option<f64>,
    pub currency: String,
}

impl TickerQuote {
    /// Placeholder row for a symbol the provider could not resolve.
    pub fn fetch_failed(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: FETCH_FAILED_NAME.to_string(),
            price: None,
            currency: String::new(),
        }
    }
}

/// Split a comma-separated ticker list: trim, drop empty entries, upper-case.
/// Duplicates and input order are preserved.
pub fn parse_ticker_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}
