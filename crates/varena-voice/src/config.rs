//! Speech backend configuration.

use std::time::Duration;

use varena_core::ports::Emotion;

/// Environment variable overriding the audio endpoint base URL.
pub const ENV_BASE_URL: &str = "VARENA_VOICE_BASE_URL";
/// Environment variable carrying the API key.
pub const ENV_API_KEY: &str = "VARENA_VOICE_API_KEY";
/// Environment variable overriding the synthesis model.
pub const ENV_TTS_MODEL: &str = "VARENA_VOICE_TTS_MODEL";
/// Environment variable overriding the transcription model.
pub const ENV_STT_MODEL: &str = "VARENA_VOICE_STT_MODEL";

const DEFAULT_BASE_URL: &str = "http://localhost:8880/v1";
const DEFAULT_TTS_MODEL: &str = "edge-tts";
const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Settings for the HTTP speech adapter.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// OpenAI-compatible audio endpoint base (no trailing slash).
    pub base_url: String,
    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,
    /// Synthesis model identifier.
    pub tts_model: String,
    /// Transcription model identifier.
    pub stt_model: String,
    /// Budget for one synthesis request.
    pub synthesis_timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            stt_model: DEFAULT_STT_MODEL.to_string(),
            synthesis_timeout: Duration::from_secs(60),
        }
    }
}

impl SpeechConfig {
    /// Build from the environment, defaulting anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var(ENV_TTS_MODEL) {
            config.tts_model = model;
        }
        if let Ok(model) = std::env::var(ENV_STT_MODEL) {
            config.stt_model = model;
        }
        config
    }

    #[must_use]
    pub fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.base_url.trim_end_matches('/'))
    }

    #[must_use]
    pub fn transcriptions_url(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }
}

/// The Mandarin voice used for each reply emotion.
#[must_use]
pub const fn voice_for(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "zh-CN-XiaoxiaoNeural",
        Emotion::Neutral => "zh-CN-YunxiNeural",
        Emotion::Angry => "zh-CN-YunjianNeural",
        Emotion::Sad => "zh-CN-YunyangNeural",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_derived_from_base() {
        let config = SpeechConfig::default();
        assert_eq!(config.speech_url(), "http://localhost:8880/v1/audio/speech");
        assert_eq!(
            config.transcriptions_url(),
            "http://localhost:8880/v1/audio/transcriptions"
        );
    }

    #[test]
    fn each_emotion_has_a_distinct_voice() {
        let voices = [
            voice_for(Emotion::Happy),
            voice_for(Emotion::Neutral),
            voice_for(Emotion::Angry),
            voice_for(Emotion::Sad),
        ];
        for (i, a) in voices.iter().enumerate() {
            for b in &voices[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
