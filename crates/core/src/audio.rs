use crate::speech::SpeechClip;
use base64::Engine;

/// Default playback speed multiplier for the narration.
pub const DEFAULT_PLAYBACK_RATE: f64 = 1.2;

/// Self-contained markup: an autoplaying audio element with the clip embedded
/// as a base64 data URI, plus a script that sets the playback rate and keeps
/// retrying play() on readiness events and on the first click, which is what
/// browser autoplay policies require.
pub fn autoplay_fragment(clip: &SpeechClip, playback_rate: f64) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(&clip.audio);
    let audio_id = format!("auto_audio_{}", clip.clip_id);

    format!(
        r#"<audio id="{audio_id}" autoplay>
  <source src="data:audio/mp3;base64,{b64}" type="audio/mpeg">
</audio>
<script>
  (function() {{
    const a = document.getElementById("{audio_id}");
    if (!a) return;
    a.playbackRate = {playback_rate};
    const tryPlay = () => a.play().catch(() => {{}});
    a.addEventListener('canplaythrough', tryPlay);
    a.addEventListener('loadeddata', tryPlay);
    document.addEventListener('click', tryPlay, {{ once: true }});
    tryPlay();
  }})();
</script>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> SpeechClip {
        SpeechClip {
            audio: b"not really mp3".to_vec(),
            clip_id: "cafebabe".to_string(),
        }
    }

    #[test]
    fn embeds_clip_as_base64_data_uri() {
        let fragment = autoplay_fragment(&clip(), DEFAULT_PLAYBACK_RATE);
        let expected = base64::engine::general_purpose::STANDARD.encode(b"not really mp3");
        assert!(fragment.contains(&format!("data:audio/mp3;base64,{expected}")));
        assert!(fragment.contains(r#"<audio id="auto_audio_cafebabe" autoplay>"#));
    }

    #[test]
    fn carries_the_configured_playback_rate() {
        let fragment = autoplay_fragment(&clip(), 1.2);
        assert!(fragment.contains("a.playbackRate = 1.2;"));

        let fragment = autoplay_fragment(&clip(), 0.75);
        assert!(fragment.contains("a.playbackRate = 0.75;"));
    }

    #[test]
    fn retries_play_on_readiness_and_first_click() {
        let fragment = autoplay_fragment(&clip(), DEFAULT_PLAYBACK_RATE);
        assert!(fragment.contains("addEventListener('canplaythrough', tryPlay)"));
        assert!(fragment.contains("addEventListener('loadeddata', tryPlay)"));
        assert!(fragment.contains("addEventListener('click', tryPlay, { once: true })"));
    }
}
