use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kabuyomi_core::quotes::yahoo::YahooQuoteClient;
use kabuyomi_core::speech::google::GoogleTranslateTts;
use kabuyomi_core::speech::SpeechSynthesizer;

#[derive(Debug, Parser)]
#[command(name = "kabuyomi")]
struct Args {
    /// Comma-separated ticker list.
    #[arg(long, default_value = "BTC-USD, NVDA")]
    tickers: String,

    /// Narration language code.
    #[arg(long, default_value = kabuyomi_core::speech::DEFAULT_LANG)]
    lang: String,

    /// Write the synthesized MP3 to this path.
    #[arg(long)]
    out: Option<std::path::PathBuf>,

    /// Fetch and summarize only; skip speech synthesis.
    #[arg(long)]
    no_speech: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = kabuyomi_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let quotes = YahooQuoteClient::from_settings(&settings)?;
    let rows = kabuyomi_core::quotes::fetch_ticker_table(&quotes, &args.tickers).await;

    for row in &rows {
        match row.price {
            Some(price) => tracing::info!(
                ticker = %row.ticker,
                name = %row.name,
                price,
                currency = %row.currency,
                "quote"
            ),
            None => tracing::warn!(ticker = %row.ticker, "quote unavailable"),
        }
    }

    let now = chrono::Local::now().time();
    let summary = kabuyomi_core::summary::summarize_quotes(&rows, now);
    println!("{summary}");

    if args.no_speech {
        return Ok(());
    }

    let speech = GoogleTranslateTts::from_settings(&settings)?;
    let clip = match speech.synthesize(&summary, &args.lang).await {
        Ok(clip) => clip,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "speech synthesis failed");
            return Err(err);
        }
    };

    tracing::info!(clip_id = %clip.clip_id, bytes = clip.audio.len(), "narration synthesized");

    if let Some(path) = &args.out {
        std::fs::write(path, &clip.audio)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "narration written");
    }

    Ok(())
}

fn init_sentry(settings: &kabuyomi_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
