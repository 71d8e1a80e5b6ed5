//! OpenAI-compatible chat completion client with model rotation.
//!
//! A fixed candidate list is probed once at startup; the first model that
//! answers becomes the active one. Generation retries against the active
//! model with short back-offs and rotates to the next candidate when the
//! retries are exhausted. Streaming parses SSE `data:` lines; back-ends
//! that refuse to stream degrade to replaying a full response chunk by
//! chunk.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use varena_core::ports::{GenerationError, GenerationGateway, TextStream};

use crate::config::GenerationConfig;

const PROBE_PROMPT: &str = "你好";
const PROBE_MAX_TOKENS: u32 = 8;
const EMPTY_RETRY_DELAY: Duration = Duration::from_secs(2);
const ERROR_RETRY_DELAY: Duration = Duration::from_secs(1);
const REPLAY_CHUNK_DELAY: Duration = Duration::from_millis(20);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// One parsed SSE line.
enum SseData {
    Chunk(String),
    Done,
}

fn parse_sse_line(line: &str) -> Option<SseData> {
    let data = line.strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseData::Done);
    }
    let chunk: StreamChunk = serde_json::from_str(data).ok()?;
    let content = chunk.choices.into_iter().next()?.delta.content?;
    if content.is_empty() {
        None
    } else {
        Some(SseData::Chunk(content))
    }
}

/// Short display form of a registry model id (`Qwen/Qwen3-8B` -> `Qwen3-8B`).
fn short_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

/// HTTP generation adapter.
pub struct HttpGeneration {
    client: reqwest::Client,
    config: GenerationConfig,
    active: AtomicUsize,
}

impl HttpGeneration {
    /// Build the client. Fails only on TLS/backend initialization problems.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::Http(e.to_string()))?;
        Ok(Self {
            client,
            config,
            active: AtomicUsize::new(0),
        })
    }

    /// Probe the candidate list in order and pin the first model that
    /// answers within the probe budget.
    pub async fn probe(&self) -> Result<(), GenerationError> {
        for (index, model) in self.config.models.iter().enumerate() {
            debug!(model = %model, "probing model");
            let attempt = tokio::time::timeout(
                self.config.probe_timeout,
                self.complete(model, PROBE_PROMPT, PROBE_MAX_TOKENS, 0.1),
            )
            .await;
            match attempt {
                Ok(Ok(_)) => {
                    info!(model = %model, "model probe succeeded, pinned");
                    self.active.store(index, Ordering::Relaxed);
                    return Ok(());
                }
                Ok(Err(err)) => warn!(model = %model, error = %err, "model probe failed"),
                Err(_) => warn!(model = %model, timeout = ?self.config.probe_timeout, "model probe timed out"),
            }
        }
        Err(GenerationError::AllBackendsFailed(
            self.config.models.join(", "),
        ))
    }

    fn active_model(&self) -> &str {
        let index = self.active.load(Ordering::Relaxed) % self.config.models.len();
        &self.config.models[index]
    }

    fn rotate(&self) {
        let next = (self.active.load(Ordering::Relaxed) + 1) % self.config.models.len();
        self.active.store(next, Ordering::Relaxed);
        warn!(model = %self.config.models[next], "rotated to next model");
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            max_tokens,
            temperature,
        };
        let mut request = self.client.post(self.config.completions_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.config.request_timeout))?;
        if !response.status().is_success() {
            return Err(GenerationError::Http(format!(
                "status {} from {}",
                response.status(),
                model
            )));
        }
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            Err(GenerationError::EmptyResponse)
        } else {
            Ok(text.to_string())
        }
    }
}

fn map_reqwest_error(err: reqwest::Error, budget: Duration) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(budget)
    } else {
        GenerationError::Http(err.to_string())
    }
}

#[async_trait]
impl GenerationGateway for HttpGeneration {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let model = self.active_model().to_string();
        let mut last_err = GenerationError::EmptyResponse;
        for attempt in 1..=self.config.max_attempts {
            match self.complete(&model, prompt, max_tokens, temperature).await {
                Ok(text) => return Ok(text),
                Err(GenerationError::EmptyResponse) => {
                    warn!(model = %model, attempt, "empty completion, retrying");
                    last_err = GenerationError::EmptyResponse;
                    tokio::time::sleep(EMPTY_RETRY_DELAY).await;
                }
                Err(err) => {
                    warn!(model = %model, attempt, error = %err, "completion failed, retrying");
                    last_err = err;
                    tokio::time::sleep(ERROR_RETRY_DELAY).await;
                }
            }
        }
        // The active model is persistently failing; move on for the
        // next caller.
        self.rotate();
        Err(last_err)
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TextStream, GenerationError> {
        let model = self.active_model().to_string();
        let body = ChatRequest {
            model: &model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: true,
            max_tokens,
            temperature,
        };
        let mut request = self.client.post(self.config.completions_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await;
        match response {
            Ok(response) if response.status().is_success() => {
                Ok(Box::pin(stream! {
                    use futures_util::StreamExt;
                    let mut bytes = response.bytes_stream();
                    let mut buffer = String::new();
                    while let Some(chunk) = bytes.next().await {
                        let chunk = match chunk {
                            Ok(chunk) => chunk,
                            Err(err) => {
                                yield Err(GenerationError::Stream(err.to_string()));
                                return;
                            }
                        };
                        buffer.push_str(&String::from_utf8_lossy(&chunk));
                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].to_string();
                            buffer.drain(..=newline);
                            match parse_sse_line(&line) {
                                Some(SseData::Chunk(text)) => yield Ok(text),
                                Some(SseData::Done) => return,
                                None => {}
                            }
                        }
                    }
                }))
            }
            _ => {
                // The backend will not stream; replay a full completion so
                // consumers still see incremental text.
                debug!(model = %model, "streaming unavailable, replaying full completion");
                let full = self.generate(prompt, max_tokens, temperature).await?;
                Ok(Box::pin(stream! {
                    for ch in full.chars() {
                        tokio::time::sleep(REPLAY_CHUNK_DELAY).await;
                        yield Ok(ch.to_string());
                    }
                }))
            }
        }
    }

    fn model_name(&self) -> String {
        short_model_name(self.active_model()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_chunk_lines_parse() {
        let line = r#"data: {"choices":[{"delta":{"content":"你好"}}]}"#;
        match parse_sse_line(line) {
            Some(SseData::Chunk(text)) => assert_eq!(text, "你好"),
            _ => panic!("expected chunk"),
        }
    }

    #[test]
    fn sse_done_marker_parses() {
        assert!(matches!(parse_sse_line("data: [DONE]"), Some(SseData::Done)));
    }

    #[test]
    fn non_data_lines_are_ignored() {
        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line("data: {\"choices\":[]}").is_none());
        assert!(
            parse_sse_line(r#"data: {"choices":[{"delta":{}}]}"#).is_none()
        );
    }

    #[test]
    fn model_names_shorten_to_the_last_segment() {
        assert_eq!(short_model_name("Qwen/Qwen3-8B"), "Qwen3-8B");
        assert_eq!(short_model_name("local-model"), "local-model");
    }

    #[tokio::test]
    async fn rotation_wraps_around() {
        let client = HttpGeneration::new(GenerationConfig::default()).expect("client builds");
        assert_eq!(client.model_name(), "GLM-4.7-Flash");
        for _ in 0..client.config.models.len() {
            client.rotate();
        }
        assert_eq!(client.model_name(), "GLM-4.7-Flash");
    }
}
