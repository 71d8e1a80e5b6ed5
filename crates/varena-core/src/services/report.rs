//! Post-game review report.
//!
//! Three generation calls build the report: five-dimension scores (JSON),
//! the medal-aware narrative (plain text), and per-persona inner voices
//! plus one suggestion (JSON). Each JSON call parses leniently: code fences
//! are stripped, and a failed parse substitutes typed defaults rather than
//! failing the report.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::SessionId;
use crate::ports::GenerationGateway;
use crate::services::prompt;
use crate::services::store::{SessionError, SessionStore};

const SCORES_MAX_TOKENS: u32 = 200;
const NARRATIVE_MAX_TOKENS: u32 = 300;
const NPC_MAX_TOKENS: u32 = 500;
const REPORT_TEMPERATURE: f32 = 0.7;

const DEFAULT_INNER_VOICE: &str = "表现一般";
const DEFAULT_NARRATIVE: &str = "表现平平，无功无过。";
const DEFAULT_SUGGESTION: &str = "多观察，少说话。";

/// Five-dimension performance scores, each 0-100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionScores {
    pub oily: u8,
    pub friendliness: u8,
    pub logic: u8,
    pub humor: u8,
    pub respect: u8,
}

impl Default for DimensionScores {
    fn default() -> Self {
        Self {
            oily: 50,
            friendliness: 50,
            logic: 50,
            humor: 50,
            respect: 50,
        }
    }
}

impl DimensionScores {
    #[must_use]
    pub fn average(&self) -> f32 {
        f32::from(
            u16::from(self.oily)
                + u16::from(self.friendliness)
                + u16::from(self.logic)
                + u16::from(self.humor)
                + u16::from(self.respect),
        ) / 5.0
    }
}

/// A persona's private reaction to the user's performance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcInnerVoice {
    pub name: String,
    pub os: String,
    /// Attached from the scenario roster after parsing.
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
struct ScoresEnvelope {
    #[serde(default)]
    metrics: DimensionScores,
}

#[derive(Deserialize)]
struct NpcEnvelope {
    #[serde(default)]
    npc_inner_voice: Vec<NpcInnerVoice>,
    #[serde(default = "missing_suggestion")]
    high_light_suggestion: String,
}

fn missing_suggestion() -> String {
    "没有具体建议".to_string()
}

/// The assembled review report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReport {
    pub scenario_name: String,
    pub medal: String,
    pub scores: DimensionScores,
    pub narrative: String,
    pub npc_inner_voices: Vec<NpcInnerVoice>,
    pub suggestion: String,
}

/// Builds review reports for active sessions.
pub struct ReportService {
    store: Arc<SessionStore>,
    generation: Arc<dyn GenerationGateway>,
}

impl ReportService {
    pub fn new(store: Arc<SessionStore>, generation: Arc<dyn GenerationGateway>) -> Self {
        Self { store, generation }
    }

    /// Build the full report for `session_id`.
    ///
    /// Only a missing session fails; every generation or parse failure
    /// degrades to its typed default.
    pub async fn game_report(&self, session_id: &SessionId) -> Result<GameReport, SessionError> {
        let handle = self.store.get(session_id)?;
        let session = handle.lock().await;
        let scene_name = session.scenario.display_name.clone();
        let personas = session.scenario.personas.clone();
        let npc_json = prompt::persona_roster_json(&personas);
        let history = session.transcript_text();
        drop(session);

        info!(session = %session_id, "building review report");

        let scores = match self
            .generate(&prompt::report_scores(&scene_name, &npc_json, &history), SCORES_MAX_TOKENS)
            .await
        {
            Some(raw) => parse_scores(&raw),
            None => DimensionScores::default(),
        };
        let medal = medal_for(&scores).to_string();

        let narrative = self
            .generate(
                &prompt::report_narrative(&scene_name, &npc_json, &history, &medal),
                NARRATIVE_MAX_TOKENS,
            )
            .await
            .unwrap_or_else(|| DEFAULT_NARRATIVE.to_string());

        let (mut npc_inner_voices, suggestion) = match self
            .generate(
                &prompt::report_npc_voices(&scene_name, &npc_json, &history, &medal),
                NPC_MAX_TOKENS,
            )
            .await
            .and_then(|raw| parse_npc_envelope(&raw))
        {
            Some(envelope) => (envelope.npc_inner_voice, envelope.high_light_suggestion),
            None => (
                personas
                    .iter()
                    .take(3)
                    .map(|p| NpcInnerVoice {
                        name: p.name.clone(),
                        os: DEFAULT_INNER_VOICE.to_string(),
                        avatar: Some(p.avatar.clone()),
                    })
                    .collect(),
                DEFAULT_SUGGESTION.to_string(),
            ),
        };

        // Attach avatars from the roster.
        for voice in &mut npc_inner_voices {
            if voice.avatar.is_none() {
                voice.avatar = personas
                    .iter()
                    .find(|p| p.name == voice.name)
                    .map(|p| p.avatar.clone());
            }
        }

        Ok(GameReport {
            scenario_name: scene_name,
            medal,
            scores,
            narrative,
            npc_inner_voices,
            suggestion,
        })
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Option<String> {
        match self
            .generation
            .generate(prompt, max_tokens, REPORT_TEMPERATURE)
            .await
        {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "report generation call failed");
                None
            }
        }
    }
}

fn parse_scores(raw: &str) -> DimensionScores {
    serde_json::from_str::<ScoresEnvelope>(strip_code_fences(raw)).map_or_else(
        |err| {
            warn!(error = %err, "score JSON unparsable, using defaults");
            DimensionScores::default()
        },
        |envelope| envelope.metrics,
    )
}

fn parse_npc_envelope(raw: &str) -> Option<NpcEnvelope> {
    match serde_json::from_str::<NpcEnvelope>(strip_code_fences(raw)) {
        Ok(envelope) if !envelope.npc_inner_voice.is_empty() => Some(envelope),
        Ok(_) => None,
        Err(err) => {
            warn!(error = %err, "inner-voice JSON unparsable, using defaults");
            None
        }
    }
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Map the five-dimension scores to a medal title.
///
/// Extreme combinations take priority over the plain average tiers.
#[must_use]
pub fn medal_for(scores: &DimensionScores) -> &'static str {
    let avg = scores.average();

    if scores.oily < 15 && scores.respect < 15 {
        return "社交拆迁队";
    }
    if scores.logic > 80 && scores.friendliness < 20 {
        return "职场大炸弹";
    }
    if scores.friendliness > 85 && scores.respect < 20 {
        return "气氛终结者";
    }
    if avg < 20.0 {
        return "饭局背景板";
    }

    if scores.respect > 85 && scores.logic < 40 {
        return "倒酒工具人";
    }
    if scores.logic > 85 && scores.friendliness > 70 {
        return "接话小天才";
    }
    if scores.oily > 85 && scores.friendliness > 80 {
        return "圆场大师";
    }

    if avg >= 85.0 {
        "酒桌老狐狸"
    } else if avg >= 70.0 {
        "饭局操盘手"
    } else if avg >= 50.0 {
        "点头专业户"
    } else if avg >= 30.0 {
        "饭桌木头人"
    } else {
        "初出茅庐"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(oily: u8, friendliness: u8, logic: u8, humor: u8, respect: u8) -> DimensionScores {
        DimensionScores {
            oily,
            friendliness,
            logic,
            humor,
            respect,
        }
    }

    #[test]
    fn extreme_medals_take_priority() {
        assert_eq!(medal_for(&scores(10, 90, 90, 90, 10)), "社交拆迁队");
        assert_eq!(medal_for(&scores(50, 10, 90, 50, 50)), "职场大炸弹");
        assert_eq!(medal_for(&scores(50, 90, 50, 50, 10)), "气氛终结者");
        assert_eq!(medal_for(&scores(16, 16, 16, 16, 16)), "饭局背景板");
    }

    #[test]
    fn specialty_medals() {
        assert_eq!(medal_for(&scores(50, 50, 30, 50, 90)), "倒酒工具人");
        assert_eq!(medal_for(&scores(50, 75, 90, 50, 50)), "接话小天才");
        assert_eq!(medal_for(&scores(90, 85, 50, 50, 50)), "圆场大师");
    }

    #[test]
    fn average_tiers() {
        assert_eq!(medal_for(&scores(85, 85, 85, 85, 85)), "酒桌老狐狸");
        assert_eq!(medal_for(&scores(70, 70, 70, 70, 70)), "饭局操盘手");
        assert_eq!(medal_for(&DimensionScores::default()), "点头专业户");
        assert_eq!(medal_for(&scores(30, 30, 30, 30, 30)), "饭桌木头人");
        assert_eq!(medal_for(&scores(25, 25, 25, 20, 25)), "初出茅庐");
    }

    #[test]
    fn parses_scores_with_code_fence() {
        let raw = "```json\n{\"metrics\": {\"oily\": 72, \"friendliness\": 61, \"logic\": 55, \"humor\": 40, \"respect\": 80}}\n```";
        let s = parse_scores(raw);
        assert_eq!(s.oily, 72);
        assert_eq!(s.respect, 80);
    }

    #[test]
    fn garbage_scores_fall_back_to_defaults() {
        let s = parse_scores("这位玩家表现不错。");
        assert_eq!(s.oily, 50);
        assert_eq!(s.logic, 50);
    }

    #[test]
    fn npc_envelope_missing_suggestion_uses_placeholder() {
        let raw = r#"{"npc_inner_voice": [{"name": "大舅", "os": "这孩子上道。"}]}"#;
        let envelope = parse_npc_envelope(raw).expect("parses");
        assert_eq!(envelope.high_light_suggestion, "没有具体建议");
        assert!(envelope.npc_inner_voice[0].avatar.is_none());
    }
}
