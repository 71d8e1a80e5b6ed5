//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core expects from model back-ends and
//! persistence. They contain no implementation details and use only domain
//! types.
//!
//! # Design Rules
//!
//! - No `reqwest` types in any signature
//! - Raw model text is converted to domain shapes before leaving the
//!   adapter boundary
//! - Degraded results (`Ok(None)`, empty text) are distinct from transport
//!   failures

pub mod archive;
pub mod generation;
pub mod speech;

pub use archive::{ArchiveError, SummaryArchive, SummaryRecord};
pub use generation::{GenerationError, GenerationGateway, TextStream};
pub use speech::{Emotion, NoopSpeech, SpeechError, SpeechGateway};
