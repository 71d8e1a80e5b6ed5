//! Speech gateway port: text-to-speech and speech-to-text.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Emotion hint for speech synthesis, derived from the judge's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Neutral,
    Angry,
    Sad,
}

impl Emotion {
    /// Map a judge score delta to the voice emotion.
    ///
    /// The delta is user-positive, so a swing against the user means the AI
    /// is pressing its advantage and gets the angry voice. A swing the
    /// user's way gets the pleased voice.
    #[must_use]
    pub const fn from_delta(delta: i32) -> Self {
        if delta < -5 {
            Self::Angry
        } else if delta > 5 {
            Self::Happy
        } else {
            Self::Neutral
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Angry => "angry",
            Self::Sad => "sad",
        }
    }
}

/// Errors that can occur in speech operations.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech backend is not initialized")]
    NotInitialized,

    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("could not understand audio: {0}")]
    TranscriptionFailed(String),

    #[error("speech request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for speech synthesis and transcription.
#[async_trait]
pub trait SpeechGateway: Send + Sync {
    /// Synthesize `text` with the given emotion.
    ///
    /// Returns `Ok(None)` when the backend degrades (synthesis is always
    /// non-fatal to a turn); `Err` is reserved for conditions the caller may
    /// want to surface, which today none of the orchestrator paths do.
    async fn synthesize(&self, text: &str, emotion: Emotion)
    -> Result<Option<Vec<u8>>, SpeechError>;

    /// Transcribe an audio file to text.
    ///
    /// Unlike synthesis, transcription failures are fatal to the request
    /// that needed them: when voice is the only input for a turn there is no
    /// text to fall back to.
    async fn transcribe(&self, audio_path: &Path) -> Result<String, SpeechError>;
}

/// No-op speech gateway for voice-disabled runs.
///
/// Synthesis silently degrades; transcription reports the backend as
/// uninitialized.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpeech;

#[async_trait]
impl SpeechGateway for NoopSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        _emotion: Emotion,
    ) -> Result<Option<Vec<u8>>, SpeechError> {
        Ok(None)
    }

    async fn transcribe(&self, _audio_path: &Path) -> Result<String, SpeechError> {
        Err(SpeechError::NotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_from_delta_boundaries() {
        assert_eq!(Emotion::from_delta(-25), Emotion::Angry);
        assert_eq!(Emotion::from_delta(-6), Emotion::Angry);
        assert_eq!(Emotion::from_delta(-5), Emotion::Neutral);
        assert_eq!(Emotion::from_delta(0), Emotion::Neutral);
        assert_eq!(Emotion::from_delta(5), Emotion::Neutral);
        assert_eq!(Emotion::from_delta(6), Emotion::Happy);
        assert_eq!(Emotion::from_delta(25), Emotion::Happy);
    }
}
