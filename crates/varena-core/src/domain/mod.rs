//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (HTTP back-ends, filesystem, etc.).
//!
//! # Structure
//!
//! - `scenario` - Immutable scenario and persona definitions
//! - `session` - Mutable per-game session state
//! - `score` - The zero-sum dominance pair and penalty step functions
//! - `dialogue` - The tagged-line parsing boundary for model output

pub mod dialogue;
pub mod scenario;
pub mod score;
pub mod session;

// Re-export scenario types at the domain level for convenience
pub use scenario::{Persona, ScenarioDefinition};

// Re-export session types at the domain level for convenience
pub use session::{Session, SessionId, USER_SPEAKER};

// Re-export score types at the domain level for convenience
pub use score::{
    DOMINANCE_CEIL, DOMINANCE_FLOOR, Dominance, GameOutcome, JUDGE_DELTA_MAX, hesitation_penalty,
    thinking_gain,
};

// Re-export dialogue boundary functions at the domain level for convenience
pub use dialogue::{TranscriptLine, clean_reply, split_script, strip_stage_directions};
