//! The application facade.
//!
//! [`ArenaCore`] is the composition point: it wires the catalog, store,
//! judge, orchestrator, summary, and report services around the injected
//! ports and exposes the operations front-ends call. Nothing below this
//! layer knows which concrete back-ends are in play.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{CatalogError, ScenarioCatalog};
use crate::domain::{SessionId, TranscriptLine};
use crate::events::ScoreSnapshot;
use crate::ports::{
    ArchiveError, GenerationError, GenerationGateway, SpeechError, SpeechGateway, SummaryArchive,
};
use crate::services::judge::DominanceJudge;
use crate::services::orchestrator::{TurnEvents, TurnOrchestrator};
use crate::services::prompt;
use crate::services::report::{GameReport, ReportService};
use crate::services::store::{SessionError, SessionStore};
use crate::services::summary::{EndOfSession, SummaryError, SummaryService};

const SUGGESTION_MAX_TOKENS: u32 = 150;
const SUGGESTION_TEMPERATURE: f32 = 0.7;

/// Errors surfaced to front-ends.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Speech(#[from] SpeechError),
}

impl From<SummaryError> for ArenaError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::Session(e) => Self::Session(e),
            SummaryError::Archive(e) => Self::Archive(e),
        }
    }
}

/// What a front-end needs to render a freshly opened session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOpened {
    pub session_id: SessionId,
    pub scenario_name: String,
    pub theme_color: String,
    pub speaker_name: String,
    pub opening: Vec<TranscriptLine>,
    #[serde(flatten)]
    pub scores: ScoreSnapshot,
}

/// The wired-up engine.
pub struct ArenaCore {
    catalog: Arc<ScenarioCatalog>,
    store: Arc<SessionStore>,
    orchestrator: TurnOrchestrator,
    summary: SummaryService,
    report: ReportService,
    generation: Arc<dyn GenerationGateway>,
    speech: Arc<dyn SpeechGateway>,
}

impl ArenaCore {
    /// Wire the engine around the injected back-ends.
    ///
    /// `audio_dir` is where per-session synthesized audio lands.
    pub fn new(
        generation: Arc<dyn GenerationGateway>,
        speech: Arc<dyn SpeechGateway>,
        archive: Arc<dyn SummaryArchive>,
        audio_dir: PathBuf,
    ) -> Self {
        let catalog = Arc::new(ScenarioCatalog::builtin());
        let store = Arc::new(SessionStore::new(Arc::clone(&catalog)));
        let judge = Arc::new(DominanceJudge::new(Arc::clone(&generation)));
        let orchestrator = TurnOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&generation),
            judge,
            Arc::clone(&speech),
            audio_dir,
        );
        let summary = SummaryService::new(
            Arc::clone(&store),
            Arc::clone(&generation),
            archive,
        );
        let report = ReportService::new(Arc::clone(&store), Arc::clone(&generation));
        Self {
            catalog,
            store,
            orchestrator,
            summary,
            report,
            generation,
            speech,
        }
    }

    /// `(id, display_name)` pairs of the available scenarios, menu order.
    #[must_use]
    pub fn scenarios(&self) -> Vec<(String, String)> {
        self.catalog.list()
    }

    /// Open a session for `scenario_id`.
    pub async fn create_session(&self, scenario_id: &str) -> Result<SessionOpened, ArenaError> {
        let handle = self.store.create(scenario_id)?;
        let session = handle.lock().await;
        Ok(SessionOpened {
            session_id: session.id.clone(),
            scenario_name: session.scenario.display_name.clone(),
            theme_color: session.scenario.theme_color.clone(),
            speaker_name: session.speaker_name.clone(),
            opening: session.transcript.clone(),
            scores: session.dominance().into(),
        })
    }

    /// Run one turn; events arrive on the returned stream.
    pub fn submit_turn(
        &self,
        session_id: &SessionId,
        user_text: &str,
    ) -> Result<TurnEvents, ArenaError> {
        Ok(self.orchestrator.process_turn(session_id, user_text)?)
    }

    /// Generate a first-person line the user can send as-is.
    pub async fn rescue_suggestion(&self, session_id: &SessionId) -> Result<String, ArenaError> {
        let handle = self.store.get(session_id)?;
        let session = handle.lock().await;
        let suggestion_prompt = prompt::rescue_suggestion(&session);
        drop(session);
        let text = self
            .generation
            .generate(
                &suggestion_prompt,
                SUGGESTION_MAX_TOKENS,
                SUGGESTION_TEMPERATURE,
            )
            .await?;
        Ok(text.trim().to_string())
    }

    /// Run a rescue turn: the expert's line is delivered and the opponent
    /// reacts to the intervention.
    pub fn process_rescue_turn(
        &self,
        session_id: &SessionId,
        rescue_text: &str,
    ) -> Result<TurnEvents, ArenaError> {
        Ok(self
            .orchestrator
            .process_rescue_turn(session_id, rescue_text)?)
    }

    /// Close a session: narrative, persisted record, teardown.
    pub async fn end_session(&self, session_id: &SessionId) -> Result<EndOfSession, ArenaError> {
        Ok(self.summary.end_session(session_id).await?)
    }

    /// Build the five-dimension review report for an active session.
    pub async fn game_report(&self, session_id: &SessionId) -> Result<GameReport, ArenaError> {
        Ok(self.report.game_report(session_id).await?)
    }

    /// Transcribe recorded user audio via the speech back-end.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, ArenaError> {
        Ok(self.speech.transcribe(audio_path).await?)
    }
}
