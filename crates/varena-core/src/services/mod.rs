//! Core services - the application's business logic layer.
//!
//! This module contains the services that orchestrate between ports (trait
//! interfaces) and domain logic. Services here are pure orchestrators and
//! never know about concrete back-end implementations.

mod app;
mod judge;
mod orchestrator;
mod prompt;
mod report;
mod store;
mod summary;

pub use app::{ArenaCore, ArenaError, SessionOpened};
pub use judge::{DominanceJudge, JudgeVerdict, NEUTRAL_VERDICT};
pub use orchestrator::{
    FALLBACK_REPLY, RESCUE_FALLBACK_REPLY, RESCUE_SPEAKER, TurnEvents, TurnOrchestrator,
};
pub use report::{DimensionScores, GameReport, NpcInnerVoice, ReportService, medal_for};
pub use store::{SessionError, SessionStore};
pub use summary::{EndOfSession, SummaryError, SummaryService};
