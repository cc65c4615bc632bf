use crate::config::Settings;
use crate::speech::error::SpeechDiagnosticsError;
use crate::speech::{SpeechClip, SpeechSynthesizer};
use anyhow::{Context, Result};
use std::time::Duration;

const PROVIDER_NAME: &str = "google_translate_tts";
const DEFAULT_BASE_URL: &str = "https://translate.google.com";
const TTS_PATH: &str = "/translate_tts";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

// The endpoint truncates long q values; requests stay below this many
// characters and the MP3 streams are concatenated in order.
const MAX_UTTERANCE_CHARS: usize = 180;

// Appended before synthesis so the engine does not clip the tail of the
// audible audio.
const TRAILING_FILLER: &str = " 。";

#[derive(Debug, Clone)]
pub struct GoogleTranslateTts {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateTts {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .tts_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("TTS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build tts http client")?;

        Ok(Self { http, base_url })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), TTS_PATH)
    }

    async fn fetch_utterance(
        &self,
        utterance: &str,
        lang: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = utterance.chars().count().to_string();

        let res = self
            .http
            .get(self.url())
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("q", utterance),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .context("tts request failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.ok();
            return Err(SpeechDiagnosticsError {
                provider: PROVIDER_NAME,
                stage: "http",
                detail: format!("status={status}"),
                raw_body: body,
            }
            .into());
        }

        let bytes = res.bytes().await.context("failed to read tts audio body")?;
        anyhow::ensure!(!bytes.is_empty(), "tts returned an empty audio body");
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn synthesize(&self, text: &str, lang: &str) -> Result<SpeechClip> {
        let padded = format!("{text}{TRAILING_FILLER}");
        let utterances = split_into_utterances(&padded, MAX_UTTERANCE_CHARS);
        anyhow::ensure!(!utterances.is_empty(), "nothing to synthesize");

        let total = utterances.len();
        let mut audio = Vec::new();
        for (idx, utterance) in utterances.iter().enumerate() {
            let part = self.fetch_utterance(utterance, lang, idx, total).await?;
            audio.extend_from_slice(&part);
        }

        let clip_id = uuid::Uuid::new_v4().simple().to_string();
        tracing::debug!(
            provider = PROVIDER_NAME,
            %clip_id,
            bytes = audio.len(),
            parts = total,
            "narration synthesized"
        );

        Ok(SpeechClip { audio, clip_id })
    }
}

/// Split text into whole-sentence utterances of at most `max_chars`
/// characters each. A single sentence longer than the ceiling is emitted on
/// its own rather than cut mid-sentence.
fn split_into_utterances(text: &str, max_chars: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_keeping_terminator(text) {
        let len = sentence.chars().count();
        if current_len > 0 && current_len + len > max_chars {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(sentence);
        current_len += len;
    }
    out.push(current);

    out.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_keeping_terminator(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if ch == '。' {
            let end = i + ch.len_utf8();
            parts.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}
