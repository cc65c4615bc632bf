use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kabuyomi_core::audio;
use kabuyomi_core::domain::quote::TickerQuote;
use kabuyomi_core::domain::refresh::RefreshInterval;
use kabuyomi_core::pipeline;
use kabuyomi_core::quotes::yahoo::YahooQuoteClient;
use kabuyomi_core::quotes::QuoteProvider;
use kabuyomi_core::speech::google::GoogleTranslateTts;
use kabuyomi_core::speech::SpeechSynthesizer;

const DEFAULT_TICKERS: &str = "BTC-USD, NVDA";

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

    let quotes = YahooQuoteClient::from_settings(&settings)?;
    let speech = GoogleTranslateTts::from_settings(&settings)?;

    let state = AppState {
        quotes: Arc::new(quotes),
        speech: Arc::new(speech),
        speech_lang: settings.speech_lang().to_string(),
        playback_rate: settings.playback_rate(),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(dashboard))
        .route("/cycle", post(run_cycle))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    quotes: Arc<dyn QuoteProvider>,
    speech: Arc<dyn SpeechSynthesizer>,
    speech_lang: String,
    playback_rate: f64,
}

async fn dashboard() -> Html<String> {
    Html(dashboard_page())
}

#[derive(Debug, Deserialize)]
struct CycleRequest {
    tickers: String,
    #[serde(default)]
    lang: Option<String>,
}

/// One fetch-summarize-speak cycle, rendered as an HTML fragment the page
/// swaps into its output area. A failed cycle maps to a plain 500; the next
/// trigger starts clean.
async fn run_cycle(
    State(state): State<AppState>,
    Json(req): Json<CycleRequest>,
) -> Result<Html<String>, StatusCode> {
    let lang = req.lang.as_deref().unwrap_or(&state.speech_lang);
    let now = chrono::Local::now().time();

    let output = pipeline::run_cycle(
        state.quotes.as_ref(),
        state.speech.as_ref(),
        &req.tickers,
        lang,
        now,
    )
    .await
    .map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "cycle failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut html = render_quote_table(&output.rows);
    html.push_str(&format!(
        "<p class=\"summary\">🗣️ {}</p>\n",
        escape_html(&output.summary)
    ));
    html.push_str(&audio::autoplay_fragment(&output.clip, state.playback_rate));

    Ok(Html(html))
}

fn render_quote_table(rows: &[TickerQuote]) -> String {
    let mut out = String::from(
        "<table>\n  <thead><tr><th>ticker</th><th>name</th><th>price</th><th>currency</th></tr></thead>\n  <tbody>\n",
    );
    for row in rows {
        let price = row.price.map(|p| format!("{p:.2}")).unwrap_or_default();
        out.push_str(&format!(
            "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&row.ticker),
            escape_html(&row.name),
            price,
            escape_html(&row.currency),
        ));
    }
    out.push_str("  </tbody>\n</table>\n");
    out
}

// Names and currencies come from an external API; keep them inert in markup.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn dashboard_page() -> String {
    let options = RefreshInterval::ALL
        .iter()
        .map(|interval| {
            let selected = if *interval == RefreshInterval::OneMinute {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                interval.seconds(),
                selected,
                interval.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n      ");

    PAGE_TEMPLATE
        .replace("__INTERVAL_OPTIONS__", &options)
        .replace("__DEFAULT_TICKERS__", DEFAULT_TICKERS)
}

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="ja">
<head>
  <meta charset="utf-8">
  <title>📈 株価読み上げ</title>
  <style>
    body { font-family: sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; }
    table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
    th, td { border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; }
    .summary { margin-top: 1rem; }
    .error { color: #b00020; margin-top: 1rem; }
    label { display: block; margin-top: 0.8rem; }
    input[type="text"] { width: 100%; padding: 0.4rem; }
  </style>
</head>
<body>
  <h1>📈 株価読み上げ</h1>

  <label for="tickers">ティッカー（例：BTC-USD, NVDA, 7203.T）</label>
  <input type="text" id="tickers" value="__DEFAULT_TICKERS__">

  <label for="interval">自動更新間隔</label>
  <select id="interval">
      __INTERVAL_OPTIONS__
  </select>

  <p><button id="fetch">最新価格を取得</button></p>

  <div id="output"></div>

  <script>
    (function() {
      const output = document.getElementById("output");
      let timer = null;
      let tick = 0;
      let running = false;

      // One trigger runs to completion before the next is accepted.
      async function runCycle() {
        if (running) return;
        running = true;
        try {
          const tickers = document.getElementById("tickers").value;
          const res = await fetch("/cycle", {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify({ tickers: tickers }),
          });
          if (!res.ok) {
            showError();
            return;
          }
          mount(await res.text());
        } catch (e) {
          showError();
        } finally {
          running = false;
        }
      }

      // innerHTML never executes script tags; re-create them so the
      // autoplay script in the fragment runs.
      function mount(html) {
        output.innerHTML = html;
        output.querySelectorAll("script").forEach((stale) => {
          const fresh = document.createElement("script");
          fresh.textContent = stale.textContent;
          stale.replaceWith(fresh);
        });
      }

      function showError() {
        output.innerHTML = "";
        const p = document.createElement("p");
        p.className = "error";
        p.textContent = "取得に失敗しました。もう一度お試しください。";
        output.appendChild(p);
      }

      // Timer edge: 0 disables the timer entirely. Each fire bumps the tick
      // counter and runs a cycle; the first page render never auto-runs.
      function applyInterval() {
        if (timer !== null) {
          clearInterval(timer);
          timer = null;
        }
        tick = 0;
        const seconds = parseInt(document.getElementById("interval").value, 10);
        if (seconds > 0) {
          timer = setInterval(() => {
            tick += 1;
            if (tick > 0) runCycle();
          }, seconds * 1000);
        }
      }

      document.getElementById("fetch").addEventListener("click", runCycle);
      document.getElementById("interval").addEventListener("change", applyInterval);
      applyInterval();
    })();
  </script>
</body>
</html>
"#;

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_provider_supplied_markup() {
        assert_eq!(
            escape_html(r#"<b>&"quoted"'</b>"#),
            "&lt;b&gt;&amp;&quot;quoted&quot;&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn table_renders_failed_rows_with_empty_price_cell() {
        let rows = vec![
            TickerQuote {
                ticker: "NVDA".to_string(),
                name: "NVIDIA Corp".to_string(),
                price: Some(123.456),
                currency: "USD".to_string(),
            },
            TickerQuote::fetch_failed("XXX"),
        ];

        let html = render_quote_table(&rows);
        assert!(html.contains("<td>NVDA</td><td>NVIDIA Corp</td><td>123.46</td><td>USD</td>"));
        assert!(html.contains("<td>XXX</td><td>取得失敗</td><td></td><td></td>"));
    }

    #[test]
    fn page_offers_every_refresh_interval() {
        let page = dashboard_page();
        assert!(page.contains(r#"<option value="0">手動のみ</option>"#));
        assert!(page.contains(r#"<option value="60" selected>1分</option>"#));
        assert!(page.contains(r#"<option value="180">3分</option>"#));
        assert!(page.contains(r#"<option value="300">5分</option>"#));
    }

    #[test]
    fn page_seeds_the_default_ticker_list() {
        let page = dashboard_page();
        assert!(page.contains(r#"value="BTC-USD, NVDA""#));
    }
}
