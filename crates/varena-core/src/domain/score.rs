//! Zero-sum dominance scoring.
//!
//! The dominance pair always sums to 100. Only the user's side is stored;
//! the AI's side is derived on read, so the invariant cannot drift. Every
//! mutation goes through [`Dominance::apply`], which clamps to the playable
//! band immediately. The three per-turn adjustments (hesitation penalty,
//! thinking gain, judge delta) compose additively but each clamps at its own
//! stage, in that order.

use serde::{Deserialize, Serialize};

/// Neither side's score ever drops below this; a losing player always keeps
/// a visibly recoverable position.
pub const DOMINANCE_FLOOR: i32 = 5;

/// Mirror of the floor: reaching it means the other side hit the floor.
pub const DOMINANCE_CEIL: i32 = 95;

/// Largest swing the judge may award in a single turn, either direction.
pub const JUDGE_DELTA_MAX: i32 = 25;

const HESITATION_STEP_SECS: u64 = 3;
const HESITATION_CAP: u8 = 15;
const THINKING_STEP_SECS: u64 = 2;
const THINKING_CAP: u8 = 10;

/// Terminal result of a game, detected when a score touches the band edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    UserWin,
    AiWin,
}

/// The user's side of the zero-sum dominance pair.
///
/// Construct via [`Dominance::OPENING`] and evolve via [`Dominance::apply`];
/// there is no way to hold a value outside `[5, 95]` after the first
/// mutation, and no second field for the AI side to disagree with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dominance(u8);

impl Dominance {
    /// Both sides start level.
    pub const OPENING: Self = Self(50);

    /// The user's score.
    #[must_use]
    pub const fn user(self) -> u8 {
        self.0
    }

    /// The AI's score, always derived and never stored.
    #[must_use]
    pub const fn ai(self) -> u8 {
        100 - self.0
    }

    /// Apply a signed adjustment, clamped to the playable band `[5, 95]`.
    #[must_use]
    pub fn apply(self, delta: i32) -> Self {
        let next = (i32::from(self.0) + delta).clamp(DOMINANCE_FLOOR, DOMINANCE_CEIL);
        // Clamp guarantees the u8 range.
        Self(next as u8)
    }

    /// Terminal-state check: the band edges are the win conditions.
    #[must_use]
    pub const fn outcome(self) -> Option<GameOutcome> {
        if self.0 <= DOMINANCE_FLOOR as u8 {
            Some(GameOutcome::AiWin)
        } else if self.0 >= DOMINANCE_CEIL as u8 {
            Some(GameOutcome::UserWin)
        } else {
            None
        }
    }
}

/// Penalty for idle time before the user's turn.
///
/// A step function: 3 points per full 3-second interval of delay, capped at
/// 15. Purely a function of elapsed wall-clock time, so a replay with the
/// same timestamps produces the same penalty.
#[must_use]
pub fn hesitation_penalty(elapsed_secs: u64) -> u8 {
    let steps = elapsed_secs / HESITATION_STEP_SECS;
    let penalty = steps.saturating_mul(HESITATION_STEP_SECS);
    (penalty.min(u64::from(HESITATION_CAP))) as u8
}

/// Ground the user gains while the AI deliberates.
///
/// Symmetric counterpart of the hesitation penalty: 2 points per full
/// 2-second interval of model latency, capped at 10.
#[must_use]
pub fn thinking_gain(think_secs: u64) -> u8 {
    let steps = think_secs / THINKING_STEP_SECS;
    let gain = steps.saturating_mul(THINKING_STEP_SECS);
    (gain.min(u64::from(THINKING_CAP))) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_is_level() {
        let d = Dominance::OPENING;
        assert_eq!(d.user(), 50);
        assert_eq!(d.ai(), 50);
    }

    #[test]
    fn pair_always_sums_to_100() {
        let mut d = Dominance::OPENING;
        for delta in [-30, 12, -7, 90, -200, 3] {
            d = d.apply(delta);
            assert_eq!(u16::from(d.user()) + u16::from(d.ai()), 100);
        }
    }

    #[test]
    fn apply_clamps_to_band() {
        assert_eq!(Dominance::OPENING.apply(-100).user(), 5);
        assert_eq!(Dominance::OPENING.apply(100).user(), 95);
        assert_eq!(Dominance::OPENING.apply(0).user(), 50);
    }

    #[test]
    fn outcome_at_band_edges() {
        assert_eq!(Dominance::OPENING.outcome(), None);
        assert_eq!(
            Dominance::OPENING.apply(45).outcome(),
            Some(GameOutcome::UserWin)
        );
        assert_eq!(
            Dominance::OPENING.apply(-45).outcome(),
            Some(GameOutcome::AiWin)
        );
    }

    #[test]
    fn hesitation_penalty_table() {
        let table = [(0, 0), (2, 0), (3, 3), (6, 6), (9, 9), (15, 15), (30, 15)];
        for (elapsed, expected) in table {
            assert_eq!(
                hesitation_penalty(elapsed),
                expected,
                "elapsed {elapsed}s"
            );
        }
    }

    #[test]
    fn thinking_gain_table() {
        let table = [(0, 0), (1, 0), (2, 2), (4, 4), (6, 6), (10, 10), (20, 10)];
        for (think, expected) in table {
            assert_eq!(thinking_gain(think), expected, "think {think}s");
        }
    }
}
