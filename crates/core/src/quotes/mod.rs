pub mod yahoo;

use crate::domain::quote::{parse_ticker_list, TickerQuote};
use anyhow::Result;

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_quote(&self, ticker: &str) -> Result<TickerQuote>;
}

/// Fetch every symbol of a comma-separated list, in input order. A symbol the
/// provider cannot resolve becomes a placeholder row; the operation as a
/// whole never fails. No retries, no caching.
pub async fn fetch_ticker_table(
    provider: &dyn QuoteProvider,
    tickers_text: &str,
) -> Vec<TickerQuote> {
    let tickers = parse_ticker_list(tickers_text);
    let mut rows = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        match provider.fetch_quote(&ticker).await {
            Ok(row) => rows.push(row),
            Err(err) => {
                tracing::warn!(
                    provider = provider.provider_name(),
                    %ticker,
                    error = %err,
                    "quote fetch failed; substituting placeholder row"
                );
                rows.push(TickerQuote::fetch_failed(ticker));
            }
        }
    }

    rows
}
