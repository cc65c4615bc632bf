pub mod error;
pub mod google;

use anyhow::Result;

/// Default narration language. The dashboard speaks Japanese.
pub const DEFAULT_LANG: &str = "ja";

/// One synthesized narration: MP3 bytes held in memory plus a
/// collision-resistant id used to key the audio element in the page.
#[derive(Debug, Clone)]
pub struct SpeechClip {
    pub audio: Vec<u8>,
    pub clip_id: String,
}

#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn synthesize(&self, text: &str, lang: &str) -> Result<SpeechClip>;
}
