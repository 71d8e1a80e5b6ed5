//! Per-game session state.
//!
//! A [`Session`] is created by the session store, mutated exclusively by the
//! turn orchestrator (single writer, enforced by the store's per-session
//! mutex), and destroyed on explicit end. Dominance is stored only as the
//! user's side; see [`Dominance`](super::score::Dominance).

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dialogue::{TranscriptLine, split_script};
use super::scenario::ScenarioDefinition;
use super::score::Dominance;

/// The user's transcript name in the built-in (Chinese) scenarios.
pub const USER_SPEAKER: &str = "你";

/// Opaque session identifier.
///
/// A short prefix of a v4 UUID: long enough to avoid collisions in an
/// in-memory table, short enough to read back in logs and file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(uuid[..8].to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Mutable state of one active game.
#[derive(Debug)]
pub struct Session {
    /// Opaque unique id, also the key in the session store.
    pub id: SessionId,
    /// The immutable scenario this game plays out.
    pub scenario: Arc<ScenarioDefinition>,
    /// Display name of the AI side (persona name or combined roster).
    pub speaker_name: String,
    /// User's side of the zero-sum pair; AI side is derived.
    dominance: Dominance,
    /// Append-only conversation log, chronological order.
    pub transcript: Vec<TranscriptLine>,
    /// Completed user turns.
    pub turn_count: u32,
    /// Start of the current idle period; drives the hesitation penalty.
    pub last_activity: Instant,
}

impl Session {
    /// Create a session seeded at 50/50 with the opening script applied.
    #[must_use]
    pub fn new(scenario: Arc<ScenarioDefinition>) -> Self {
        let speaker_name = scenario.speaker_name();
        let transcript = split_script(
            &scenario.opening_script,
            &scenario.persona_names(),
            &speaker_name,
        );
        Self {
            id: SessionId::generate(),
            scenario,
            speaker_name,
            dominance: Dominance::OPENING,
            transcript,
            turn_count: 0,
            last_activity: Instant::now(),
        }
    }

    /// Current score pair.
    #[must_use]
    pub const fn dominance(&self) -> Dominance {
        self.dominance
    }

    /// Apply a signed, band-clamped score adjustment.
    pub fn shift_dominance(&mut self, delta: i32) {
        self.dominance = self.dominance.apply(delta);
    }

    /// Append a line to the transcript.
    pub fn record(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.transcript.push(TranscriptLine::new(speaker, text));
    }

    /// Reset the idle timer (start and end of each turn).
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// The last `n` transcript lines rendered as `speaker: text`, for
    /// prompt context windows.
    #[must_use]
    pub fn recent_context(&self, n: usize) -> String {
        let start = self.transcript.len().saturating_sub(n);
        self.transcript[start..]
            .iter()
            .map(|l| format!("{}: {}", l.speaker, l.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The full transcript rendered as `speaker: text`, for summaries and
    /// reports.
    #[must_use]
    pub fn transcript_text(&self) -> String {
        self.recent_context(self.transcript.len())
    }

    /// The most recent line spoken by the user, if any.
    #[must_use]
    pub fn last_user_line(&self) -> Option<&TranscriptLine> {
        self.transcript.iter().rev().find(|l| l.speaker == USER_SPEAKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::Persona;

    fn scenario(opening: &str, personas: Vec<Persona>) -> Arc<ScenarioDefinition> {
        Arc::new(ScenarioDefinition {
            id: "t".into(),
            display_name: "测试".into(),
            theme_color: "#ffffff".into(),
            personas,
            system_prompt: "无".into(),
            opening_script: opening.into(),
        })
    }

    #[test]
    fn new_session_is_seeded() {
        let s = Session::new(scenario(
            "你来了。",
            vec![Persona::new("王总", "👔", "采购总监")],
        ));
        assert_eq!(s.dominance().user(), 50);
        assert_eq!(s.dominance().ai(), 50);
        assert_eq!(s.turn_count, 0);
        assert_eq!(s.transcript.len(), 1);
        assert_eq!(s.transcript[0].speaker, "王总");
    }

    #[test]
    fn multi_line_opening_is_split() {
        let s = Session::new(scenario(
            "大舅: 坐坐坐\n表哥: 来了昂",
            vec![
                Persona::new("大舅", "👴", "主陪"),
                Persona::new("表哥", "👨", "副陪"),
            ],
        ));
        assert_eq!(s.speaker_name, "大舅 / 表哥");
        assert_eq!(s.transcript.len(), 2);
        assert_eq!(s.transcript[1].speaker, "表哥");
    }

    #[test]
    fn recent_context_windows_the_tail() {
        let mut s = Session::new(scenario(
            "开场",
            vec![Persona::new("王总", "👔", "采购总监")],
        ));
        for i in 0..10 {
            s.record(USER_SPEAKER, format!("第{i}句"));
        }
        let ctx = s.recent_context(3);
        assert_eq!(ctx.lines().count(), 3);
        assert!(ctx.ends_with("第9句"));
    }

    #[test]
    fn session_ids_are_unique_and_short() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 8);
    }
}
