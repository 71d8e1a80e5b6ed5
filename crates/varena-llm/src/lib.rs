//! HTTP text-generation adapter.
//!
//! Implements the core crate's `GenerationGateway` against any
//! OpenAI-compatible chat completions endpoint, with a startup health probe
//! and model rotation on persistent failure.

mod client;
pub mod config;

pub use client::HttpGeneration;
pub use config::GenerationConfig;
