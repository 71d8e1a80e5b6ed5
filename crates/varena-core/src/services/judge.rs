//! Dominance judging for a completed exchange.
//!
//! The judge asks the generation backend for a two-line labeled verdict and
//! parses it leniently: any well-formed delta is clamped to the allowed
//! band, and anything unparsable degrades to a neutral verdict instead of
//! failing the turn.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{JUDGE_DELTA_MAX, Session};
use crate::ports::GenerationGateway;
use crate::services::prompt;

/// Commentary used when the judge output cannot be parsed.
pub const NEUTRAL_VERDICT: &str = "势均力敌";

const JUDGE_MAX_TOKENS: u32 = 100;
const JUDGE_TEMPERATURE: f32 = 0.3;

static FIRST_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?\d+").expect("valid regex"));

/// Parsed judging result for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeVerdict {
    /// Signed dominance shift from the user's perspective, in
    /// `[-JUDGE_DELTA_MAX, JUDGE_DELTA_MAX]`.
    pub delta: i32,
    /// One-line commentary on the exchange.
    pub commentary: String,
}

impl JudgeVerdict {
    /// Zero shift with neutral commentary.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            delta: 0,
            commentary: NEUTRAL_VERDICT.to_string(),
        }
    }
}

impl Default for JudgeVerdict {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Scores each user/AI exchange via the generation backend.
pub struct DominanceJudge {
    generation: Arc<dyn GenerationGateway>,
}

impl DominanceJudge {
    pub fn new(generation: Arc<dyn GenerationGateway>) -> Self {
        Self { generation }
    }

    /// Judge one exchange.
    ///
    /// Never fails: backend errors and malformed output both degrade to
    /// [`JudgeVerdict::neutral`], keeping the turn pipeline alive.
    pub async fn judge(&self, session: &Session, user_text: &str, ai_text: &str) -> JudgeVerdict {
        let prompt = prompt::judge(session, user_text, ai_text);
        match self
            .generation
            .generate(&prompt, JUDGE_MAX_TOKENS, JUDGE_TEMPERATURE)
            .await
        {
            Ok(raw) => {
                let verdict = parse_verdict(&raw);
                debug!(delta = verdict.delta, "judged exchange");
                verdict
            }
            Err(err) => {
                warn!(error = %err, "judge call failed, scoring neutral");
                JudgeVerdict::neutral()
            }
        }
    }
}

/// Parse the judge's labeled two-line output.
///
/// The delta comes from the first integer on the `气场转移:` line, clamped
/// to the allowed band. Missing or malformed lines fall back to the
/// neutral values independently of each other.
#[must_use]
pub fn parse_verdict(raw: &str) -> JudgeVerdict {
    let mut verdict = JudgeVerdict::neutral();
    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = strip_label(line, "气场转移") {
            if let Some(m) = FIRST_INT.find(rest) {
                if let Ok(n) = m.as_str().parse::<i32>() {
                    verdict.delta = n.clamp(-JUDGE_DELTA_MAX, JUDGE_DELTA_MAX);
                }
            }
        } else if let Some(rest) = strip_label(line, "点评") {
            let rest = rest.trim();
            if !rest.is_empty() {
                verdict.commentary = rest.to_string();
            }
        }
    }
    verdict
}

/// Strip `label:` or `label：` from the start of a line.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(label)?;
    rest.strip_prefix(':').or_else(|| rest.strip_prefix('：'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labeled_output() {
        let v = parse_verdict("气场转移: +12\n点评: 反击有力，数据扎实。");
        assert_eq!(v.delta, 12);
        assert_eq!(v.commentary, "反击有力，数据扎实。");
    }

    #[test]
    fn parses_negative_delta_and_wide_colon() {
        let v = parse_verdict("气场转移：-8\n点评：被对方抓住了漏洞。");
        assert_eq!(v.delta, -8);
        assert_eq!(v.commentary, "被对方抓住了漏洞。");
    }

    #[test]
    fn clamps_out_of_band_delta() {
        assert_eq!(parse_verdict("气场转移: 99\n点评: 碾压").delta, 25);
        assert_eq!(parse_verdict("气场转移: -40\n点评: 崩盘").delta, -25);
    }

    #[test]
    fn garbage_degrades_to_neutral() {
        let v = parse_verdict("我认为这轮很精彩，双方各有千秋。");
        assert_eq!(v.delta, 0);
        assert_eq!(v.commentary, NEUTRAL_VERDICT);
    }

    #[test]
    fn missing_commentary_keeps_parsed_delta() {
        let v = parse_verdict("气场转移: 5");
        assert_eq!(v.delta, 5);
        assert_eq!(v.commentary, NEUTRAL_VERDICT);
    }

    #[test]
    fn surrounding_chatter_is_ignored() {
        let v = parse_verdict("好的，我来评判。\n气场转移: [-3]\n点评: 略显被动。\n以上。");
        assert_eq!(v.delta, -3);
        assert_eq!(v.commentary, "略显被动。");
    }
}
