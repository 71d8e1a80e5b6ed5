//! End-of-session summary: closing narrative, persisted record, teardown.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::SessionId;
use crate::ports::{ArchiveError, GenerationGateway, SummaryArchive, SummaryRecord};
use crate::services::prompt;
use crate::services::store::{SessionError, SessionStore};

const SUMMARY_MAX_TOKENS: u32 = 500;
const SUMMARY_TEMPERATURE: f32 = 0.7;

const FALLBACK_NARRATIVE: &str = "（点评生成失败，完整对话已记录在案。）";

/// Errors that can end an end-of-session request.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// What the caller gets back when a session is closed.
#[derive(Debug, Clone)]
pub struct EndOfSession {
    pub scenario_name: String,
    pub turn_count: u32,
    pub user_dominance: u8,
    pub ai_dominance: u8,
    /// Human-readable result line.
    pub result: String,
    /// Generated coaching narrative.
    pub narrative: String,
    /// Where the record was persisted (adapter-defined key).
    pub archive_key: String,
}

/// Closes sessions: judges the overall result, generates the coaching
/// narrative, persists the record, removes the session.
pub struct SummaryService {
    store: Arc<SessionStore>,
    generation: Arc<dyn GenerationGateway>,
    archive: Arc<dyn SummaryArchive>,
}

impl SummaryService {
    pub fn new(
        store: Arc<SessionStore>,
        generation: Arc<dyn GenerationGateway>,
        archive: Arc<dyn SummaryArchive>,
    ) -> Self {
        Self {
            store,
            generation,
            archive,
        }
    }

    /// Close `session_id`.
    ///
    /// The session is removed only after the record has been persisted, so
    /// an archive failure leaves it intact and retryable. A narrative
    /// generation failure is non-fatal and substitutes a placeholder.
    pub async fn end_session(&self, session_id: &SessionId) -> Result<EndOfSession, SummaryError> {
        let handle = self.store.get(session_id)?;
        let session = handle.lock().await;

        let dominance = session.dominance();
        let result = result_line(dominance.user());
        let narrative = match self
            .generation
            .generate(
                &prompt::summary(&session, &result),
                SUMMARY_MAX_TOKENS,
                SUMMARY_TEMPERATURE,
            )
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => FALLBACK_NARRATIVE.to_string(),
            Err(err) => {
                warn!(session = %session_id, error = %err, "summary generation failed");
                FALLBACK_NARRATIVE.to_string()
            }
        };

        let record = SummaryRecord {
            scenario_name: session.scenario.display_name.clone(),
            speaker_name: session.speaker_name.clone(),
            turn_count: session.turn_count,
            user_dominance: dominance.user(),
            ai_dominance: dominance.ai(),
            result: result.clone(),
            transcript: session.transcript.clone(),
            narrative: narrative.clone(),
        };
        let archive_key = self.archive.persist(session_id, &record).await?;

        let summary = EndOfSession {
            scenario_name: record.scenario_name,
            turn_count: record.turn_count,
            user_dominance: record.user_dominance,
            ai_dominance: record.ai_dominance,
            result,
            narrative,
            archive_key,
        };

        drop(session);
        self.store.remove(session_id);
        info!(
            session = %session_id,
            user = summary.user_dominance,
            turns = summary.turn_count,
            "session closed"
        );
        Ok(summary)
    }
}

/// The one-line verdict shown at the top of the summary.
#[must_use]
pub fn result_line(user_dominance: u8) -> String {
    if user_dominance > 60 {
        format!("🏆 你赢了！气场 {user_dominance} 压制对方")
    } else if user_dominance < 40 {
        format!("💢 你输了，气场被压制在 {user_dominance}")
    } else {
        format!("🤝 势均力敌，气场 {user_dominance}")
    }
}
