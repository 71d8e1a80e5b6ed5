//! Summary archive port: the persisted end-of-session artifact.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{SessionId, TranscriptLine};

/// Errors that can occur when persisting a session record.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to persist session record: {0}")]
    Io(#[from] std::io::Error),
}

/// Self-contained end-of-session record.
///
/// Every field listed here must survive into the persisted artifact; the
/// concrete format (file layout, markup) is the adapter's choice.
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    /// Scenario display name.
    pub scenario_name: String,
    /// AI side display name (persona or combined roster).
    pub speaker_name: String,
    /// Completed user turns.
    pub turn_count: u32,
    /// Final user dominance.
    pub user_dominance: u8,
    /// Final AI dominance.
    pub ai_dominance: u8,
    /// Human-readable result line.
    pub result: String,
    /// Full chronological transcript.
    pub transcript: Vec<TranscriptLine>,
    /// Generated closing narrative.
    pub narrative: String,
}

/// Port for persisting end-of-session summaries.
#[async_trait]
pub trait SummaryArchive: Send + Sync {
    /// Persist `record` keyed by `session_id`.
    ///
    /// Returns a caller-displayable key for later retrieval (for the
    /// filesystem adapter, the path written).
    async fn persist(
        &self,
        session_id: &SessionId,
        record: &SummaryRecord,
    ) -> Result<String, ArchiveError>;
}
