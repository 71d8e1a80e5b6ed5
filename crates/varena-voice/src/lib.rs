//! HTTP speech adapter.
//!
//! Implements the core crate's `SpeechGateway` against OpenAI-compatible
//! `/audio/speech` and `/audio/transcriptions` endpoints, with a Mandarin
//! voice per reply emotion.

mod client;
pub mod config;

pub use client::HttpSpeech;
pub use config::{SpeechConfig, voice_for};
