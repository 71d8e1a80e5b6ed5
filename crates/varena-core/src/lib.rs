//! Core domain types, ports, and services for the varena sparring engine.
//!
//! Varena stages a zero-sum "dominance" duel between a human and one or more
//! LLM-driven personas. This crate owns everything with real behavior: the
//! scenario catalog, the in-memory session store, the turn pipeline state
//! machine, and the dominance judge. Model back-ends (text generation,
//! speech) are reached exclusively through the port traits in [`ports`];
//! concrete HTTP adapters live in `varena-llm` and `varena-voice`.

pub mod catalog;
pub mod domain;
pub mod events;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use catalog::{CatalogError, ScenarioCatalog};
pub use domain::{
    Dominance, GameOutcome, Persona, ScenarioDefinition, Session, SessionId, TranscriptLine,
    clean_reply, hesitation_penalty, split_script, strip_stage_directions, thinking_gain,
};
pub use events::{ScoreSnapshot, StageEvent};
pub use ports::{
    ArchiveError, Emotion, GenerationError, GenerationGateway, NoopSpeech, SpeechError,
    SpeechGateway, SummaryArchive, SummaryRecord, TextStream,
};
pub use services::{
    ArenaCore, ArenaError, DimensionScores, DominanceJudge, EndOfSession, GameReport, JudgeVerdict,
    NpcInnerVoice, ReportService, SessionError, SessionOpened, SessionStore, SummaryService,
    TurnEvents, TurnOrchestrator,
};
