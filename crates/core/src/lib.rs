pub mod audio;
pub mod domain;
pub mod pipeline;
pub mod quotes;
pub mod speech;
pub mod summary;

pub mod config {
    #[derive(Debug, Clone)]
    pub struct Settings {
        pub quote_api_base_url: Option<String>,
        pub tts_base_url: Option<String>,
        pub tts_lang: Option<String>,
        pub playback_rate: Option<f64>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        /// Every knob has a built-in default; the environment only overrides.
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                quote_api_base_url: std::env::var("QUOTE_API_BASE_URL").ok(),
                tts_base_url: std::env::var("TTS_BASE_URL").ok(),
                tts_lang: std::env::var("TTS_LANG").ok(),
                playback_rate: std::env::var("PLAYBACK_RATE")
                    .ok()
                    .and_then(|s| s.parse::<f64>().ok()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn speech_lang(&self) -> &str {
            self.tts_lang.as_deref().unwrap_or(crate::speech::DEFAULT_LANG)
        }

        pub fn playback_rate(&self) -> f64 {
            self.playback_rate
                .unwrap_or(crate::audio::DEFAULT_PLAYBACK_RATE)
        }
    }
}
