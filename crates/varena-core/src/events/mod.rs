//! Stage events emitted during a turn.
//!
//! One `process_turn` call produces one ordered stream of these events:
//! `user_sent → ai_thinking → ai_responded → complete`. Every event carries
//! a score snapshot so consumers can animate the dominance bar without
//! waiting for the terminal event.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag for frontend compatibility:
//!
//! ```json
//! { "type": "complete", "userDominance": 62, "aiDominance": 38, "gameOver": false, ... }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Dominance, GameOutcome};
use crate::services::JudgeVerdict;

/// Point-in-time view of the zero-sum pair.
///
/// Snapshots are taken from [`Dominance`], so the two fields always sum
/// to 100 by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub user_dominance: u8,
    pub ai_dominance: u8,
}

impl From<Dominance> for ScoreSnapshot {
    fn from(d: Dominance) -> Self {
        Self {
            user_dominance: d.user(),
            ai_dominance: d.ai(),
        }
    }
}

/// Ordered stage events for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StageEvent {
    /// The user's line has been accepted (hesitation penalty applied).
    UserSent {
        #[serde(flatten)]
        scores: ScoreSnapshot,
        /// Human-readable note (e.g. the hesitation penalty), if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    /// Generation has been dispatched to the model backend.
    AiThinking {
        #[serde(flatten)]
        scores: ScoreSnapshot,
        /// Name of the active generation backend, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },

    /// The reply is in and the thinking gain has been applied.
    AiResponded {
        #[serde(flatten)]
        scores: ScoreSnapshot,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    /// Terminal event: judged, scored, synthesized, recorded.
    Complete {
        #[serde(flatten)]
        scores: ScoreSnapshot,
        /// The AI's cleaned reply text.
        ai_text: String,
        /// Path to synthesized audio, absent when synthesis was skipped or
        /// degraded.
        #[serde(skip_serializing_if = "Option::is_none")]
        audio_path: Option<PathBuf>,
        /// The judge's commentary for this exchange.
        verdict: String,
        /// The judge's signed score shift, already folded into `scores`.
        score_delta: i32,
        /// Whether a win condition was reached this turn.
        game_over: bool,
        /// Which side won, when `game_over` is set.
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<GameOutcome>,
    },
}

impl StageEvent {
    /// Create a user-sent event.
    pub fn user_sent(scores: impl Into<ScoreSnapshot>, note: Option<String>) -> Self {
        Self::UserSent {
            scores: scores.into(),
            note,
        }
    }

    /// Create an AI-thinking event.
    pub fn ai_thinking(scores: impl Into<ScoreSnapshot>, model: Option<String>) -> Self {
        Self::AiThinking {
            scores: scores.into(),
            model,
        }
    }

    /// Create an AI-responded event.
    pub fn ai_responded(scores: impl Into<ScoreSnapshot>, note: Option<String>) -> Self {
        Self::AiResponded {
            scores: scores.into(),
            note,
        }
    }

    /// Create the terminal event for a turn.
    pub fn complete(
        scores: impl Into<ScoreSnapshot>,
        ai_text: String,
        audio_path: Option<PathBuf>,
        verdict: &JudgeVerdict,
        outcome: Option<GameOutcome>,
    ) -> Self {
        Self::Complete {
            scores: scores.into(),
            ai_text,
            audio_path,
            verdict: verdict.commentary.clone(),
            score_delta: verdict.delta,
            game_over: outcome.is_some(),
            outcome,
        }
    }

    /// The score snapshot carried by any event variant.
    #[must_use]
    pub const fn scores(&self) -> ScoreSnapshot {
        match self {
            Self::UserSent { scores, .. }
            | Self::AiThinking { scores, .. }
            | Self::AiResponded { scores, .. }
            | Self::Complete { scores, .. } => *scores,
        }
    }
}
