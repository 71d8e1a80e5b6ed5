//! Scenario and persona definitions.
//!
//! Scenarios are immutable: built once at startup by the
//! [`ScenarioCatalog`](crate::catalog::ScenarioCatalog) and shared read-only
//! by every session.

use serde::{Deserialize, Serialize};

/// An AI-controlled character within a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Speaker name as it appears in the transcript (e.g. "王总", "大舅").
    pub name: String,
    /// Avatar glyph shown by UI layers.
    pub avatar: String,
    /// Short character brief, fed into prompts for multi-persona scenarios.
    pub bio: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        avatar: impl Into<String>,
        bio: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
            bio: bio.into(),
        }
    }
}

/// An immutable scenario definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// Unique catalog key (e.g. `"negotiation"`).
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Theme color hint for UI layers (hex string).
    pub theme_color: String,
    /// One or more AI personas; multi-persona scenarios require the model
    /// to pick exactly one speaker per turn.
    pub personas: Vec<Persona>,
    /// System prompt template. Score and transcript context are appended by
    /// the prompt builder at generation time.
    pub system_prompt: String,
    /// Opening script: a single line spoken by the sole persona, or a
    /// multi-line `Name: text` script for multi-persona scenarios.
    pub opening_script: String,
}

impl ScenarioDefinition {
    /// Whether this scenario fields more than one persona.
    #[must_use]
    pub fn is_multi_persona(&self) -> bool {
        self.personas.len() > 1
    }

    /// Display name for the AI side as a whole.
    ///
    /// Single-persona scenarios use the persona's name; multi-persona
    /// scenarios use the combined roster (e.g. `"大舅 / 大妗子 / 表哥"`),
    /// which also serves as the attribution for opening-script lines that
    /// carry no recognized speaker prefix.
    #[must_use]
    pub fn speaker_name(&self) -> String {
        self.personas
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Roster block listed in generation prompts so the model cannot invent
    /// speakers. `None` for single-persona scenarios.
    #[must_use]
    pub fn roster_block(&self) -> Option<String> {
        if !self.is_multi_persona() {
            return None;
        }
        let mut block =
            String::from("【可用角色列表】（你只能扮演以下角色，不能编造其他角色）\n");
        for p in &self.personas {
            block.push_str(&format!("- {} {}\n", p.avatar, p.name));
        }
        Some(block)
    }

    /// Names of all personas, for prefix recognition at the parsing boundary.
    #[must_use]
    pub fn persona_names(&self) -> Vec<&str> {
        self.personas.iter().map(|p| p.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi() -> ScenarioDefinition {
        ScenarioDefinition {
            id: "t".into(),
            display_name: "test".into(),
            theme_color: "#000000".into(),
            personas: vec![
                Persona::new("大舅", "👴", "主陪"),
                Persona::new("表哥", "👨", "副陪"),
            ],
            system_prompt: String::new(),
            opening_script: String::new(),
        }
    }

    #[test]
    fn combined_speaker_name() {
        assert_eq!(multi().speaker_name(), "大舅 / 表哥");
    }

    #[test]
    fn roster_only_for_multi_persona() {
        let mut s = multi();
        let block = s.roster_block().unwrap();
        assert!(block.contains("- 👴 大舅"));
        assert!(block.contains("- 👨 表哥"));

        s.personas.truncate(1);
        assert!(s.roster_block().is_none());
        assert_eq!(s.speaker_name(), "大舅");
    }
}
