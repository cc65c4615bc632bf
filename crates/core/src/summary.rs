use crate::domain::quote::{TickerQuote, FETCH_FAILED_NAME};
use chrono::{NaiveTime, Timelike};

/// Render the spoken summary for one cycle: a zero-padded time prefix, then
/// one sentence fragment per row in order, joined with single spaces.
/// Deterministic given the rows and the supplied wall-clock reading.
pub fn summarize_quotes(rows: &[TickerQuote], now: NaiveTime) -> String {
    let mut parts = vec![format!("{:02}時{:02}分。", now.hour(), now.minute())];

    for row in rows {
        match row.price {
            Some(price) => parts.push(format!("{} {:.2} {}。", row.name, price, row.currency)),
            None => parts.push(format!("{} {}。", row.ticker, FETCH_FAILED_NAME)),
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn quoted(ticker: &str, name: &str, price: f64, currency: &str) -> TickerQuote {
        TickerQuote {
            ticker: ticker.to_string(),
            name: name.to_string(),
            price: Some(price),
            currency: currency.to_string(),
        }
    }

    #[test]
    fn starts_with_zero_padded_time_prefix() {
        let summary = summarize_quotes(&[], at(7, 5));
        assert_eq!(summary, "07時05分。");
    }

    #[test]
    fn rounds_prices_to_two_decimals() {
        let rows = vec![quoted("NVDA", "NVIDIA Corp", 123.456, "USD")];
        let summary = summarize_quotes(&rows, at(9, 30));
        assert_eq!(summary, "09時30分。 NVIDIA Corp 123.46 USD。");
    }

    #[test]
    fn absent_price_speaks_the_failure_marker() {
        let rows = vec![TickerQuote::fetch_failed("XXX")];
        let summary = summarize_quotes(&rows, at(9, 30));
        assert_eq!(summary, "09時30分。 XXX 取得失敗。");
    }

    #[test]
    fn one_fragment_per_row_in_order() {
        let rows = vec![
            quoted("BTC-USD", "Bitcoin USD", 51234.5, "USD"),
            TickerQuote::fetch_failed("XXX"),
            quoted("7203.T", "Toyota Motor", 2500.0, "JPY"),
        ];
        let summary = summarize_quotes(&rows, at(15, 0));
        assert_eq!(
            summary,
            "15時00分。 Bitcoin USD 51234.50 USD。 XXX 取得失敗。 Toyota Motor 2500.00 JPY。"
        );
    }
}
