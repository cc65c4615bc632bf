use crate::domain::quote::TickerQuote;
use crate::quotes::{self, QuoteProvider};
use crate::speech::{SpeechClip, SpeechSynthesizer};
use crate::summary;
use anyhow::Result;
use chrono::NaiveTime;

/// Output of one fetch-summarize-speak cycle. Rendered once, then dropped;
/// nothing survives into the next cycle.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub rows: Vec<TickerQuote>,
    pub summary: String,
    pub clip: SpeechClip,
}

/// Run one cycle. Quote failures degrade to placeholder rows and the cycle
/// always reaches summarization; a speech-synthesis failure fails the whole
/// cycle. The caller supplies the wall-clock reading.
pub async fn run_cycle(
    quotes: &dyn QuoteProvider,
    speech: &dyn SpeechSynthesizer,
    tickers_text: &str,
    lang: &str,
    now: NaiveTime,
) -> Result<CycleOutput> {
    let rows = quotes::fetch_ticker_table(quotes, tickers_text).await;
    let summary = summary::summarize_quotes(&rows, now);

    tracing::info!(
        rows = rows.len(),
        summary_chars = summary.chars().count(),
        "cycle summarized"
    );

    let clip = speech.synthesize(&summary, lang).await?;

    Ok(CycleOutput {
        rows,
        summary,
        clip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quote::FETCH_FAILED_NAME;
    use std::sync::Mutex;

    struct StubQuotes;

    #[async_trait::async_trait]
    impl QuoteProvider for StubQuotes {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_quote(&self, ticker: &str) -> Result<TickerQuote> {
            if ticker == "XXX" {
                anyhow::bail!("no market data returned for {ticker}");
            }
            Ok(TickerQuote {
                ticker: ticker.to_string(),
                name: "NVIDIA Corp".to_string(),
                price: Some(123.456),
                currency: "USD".to_string(),
            })
        }
    }

    struct StubSpeech {
        fail: bool,
        spoken: Mutex<Option<String>>,
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for StubSpeech {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn synthesize(&self, text: &str, _lang: &str) -> Result<SpeechClip> {
            if self.fail {
                anyhow::bail!("tts unavailable");
            }
            *self.spoken.lock().unwrap() = Some(text.to_string());
            Ok(SpeechClip {
                audio: vec![0xff, 0xfb],
                clip_id: "stub".to_string(),
            })
        }
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn cycle_speaks_the_rendered_summary() {
        let speech = StubSpeech {
            fail: false,
            spoken: Mutex::new(None),
        };

        let output = run_cycle(&StubQuotes, &speech, "NVDA, XXX", "ja", noon())
            .await
            .unwrap();

        assert_eq!(output.rows.len(), 2);
        assert_eq!(output.rows[1].name, FETCH_FAILED_NAME);
        assert_eq!(
            output.summary,
            "12時00分。 NVIDIA Corp 123.46 USD。 XXX 取得失敗。"
        );
        assert_eq!(
            speech.spoken.lock().unwrap().as_deref(),
            Some(output.summary.as_str())
        );
        assert!(!output.clip.audio.is_empty());
    }

    #[tokio::test]
    async fn speech_failure_fails_the_cycle() {
        let speech = StubSpeech {
            fail: true,
            spoken: Mutex::new(None),
        };

        let res = run_cycle(&StubQuotes, &speech, "NVDA", "ja", noon()).await;
        assert!(res.is_err());
    }
}
