use crate::config::Settings;
use crate::domain::quote::TickerQuote;
use crate::quotes::QuoteProvider;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const QUOTE_PATH: &str = "/v7/finance/quote";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct YahooQuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooQuoteClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .quote_api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("QUOTE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build quote http client")?;

        Ok(Self { http, base_url })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), QUOTE_PATH)
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooQuoteClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<TickerQuote> {
        let res = self
            .http
            .get(self.url())
            .query(&[("symbols", ticker)])
            .send()
            .await
            .context("quote request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read quote response")?;
        if !status.is_success() {
            anyhow::bail!("quote provider HTTP {status}: {text}");
        }

        let envelope = serde_json::from_str::<QuoteEnvelope>(&text)
            .with_context(|| format!("quote response is not the expected JSON shape: {text}"))?;

        let result = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .with_context(|| format!("no market data returned for {ticker}"))?;

        result.into_quote(ticker)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    symbol: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
}

impl QuoteResult {
    fn into_quote(self, requested: &str) -> Result<TickerQuote> {
        // An entry without a regular market price counts as a failed lookup,
        // not a zero-priced row.
        let price = self
            .regular_market_price
            .with_context(|| format!("no regular market price for {requested}"))?;

        let ticker = self.symbol.unwrap_or_else(|| requested.to_string());
        let name = self
            .short_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| ticker.clone());

        Ok(TickerQuote {
            ticker,
            name,
            price: Some(price),
            currency: self.currency.unwrap_or_default(),
        })
    }
}
