//! HTTP speech adapter.
//!
//! Synthesis posts to an OpenAI-compatible `/audio/speech` endpoint and
//! degrades to `Ok(None)` on any failure, since a turn must never die for
//! want of audio. Transcription posts multipart to `/audio/transcriptions`
//! and does propagate its errors, because the caller has nothing to show
//! without the text.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use varena_core::ports::{Emotion, SpeechError, SpeechGateway};

use crate::config::{SpeechConfig, voice_for};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP speech adapter.
pub struct HttpSpeech {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl HttpSpeech {
    /// Build the client. Fails only on TLS/backend initialization problems.
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        let client = reqwest::Client::builder()
            .timeout(config.synthesis_timeout)
            .build()
            .map_err(|e| SpeechError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn request_synthesis(
        &self,
        text: &str,
        emotion: Emotion,
    ) -> Result<Vec<u8>, SpeechError> {
        let voice = voice_for(emotion);
        let body = SpeechRequest {
            model: &self.config.tts_model,
            input: text,
            voice,
            response_format: "wav",
        };
        let mut request = self.client.post(self.config.speech_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SpeechError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SpeechError::SynthesisFailed(format!(
                "status {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Http(e.to_string()))?;
        debug!(voice, bytes = bytes.len(), "synthesized reply audio");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechGateway for HttpSpeech {
    async fn synthesize(
        &self,
        text: &str,
        emotion: Emotion,
    ) -> Result<Option<Vec<u8>>, SpeechError> {
        match self.request_synthesis(text, emotion).await {
            Ok(bytes) if !bytes.is_empty() => Ok(Some(bytes)),
            Ok(_) => {
                warn!("synthesis returned no audio");
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, "synthesis failed, continuing without audio");
                Ok(None)
            }
        }
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<String, SpeechError> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map_or_else(|| "audio.wav".to_string(), |n| n.to_string_lossy().into_owned());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("model", self.config.stt_model.clone())
            .part("file", part);

        let mut request = self
            .client
            .post(self.config.transcriptions_url())
            .multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SpeechError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SpeechError::TranscriptionFailed(format!(
                "status {}",
                response.status()
            )));
        }
        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::TranscriptionFailed(e.to_string()))?;
        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(SpeechError::TranscriptionFailed(
                "empty transcript".to_string(),
            ));
        }
        Ok(text)
    }
}
