//! Tagged-line parsing boundary for model output and opening scripts.
//!
//! All fragile `"Name: text"` string scanning lives in this one module. The
//! orchestrator and session store only ever see attributed
//! [`TranscriptLine`] records or already-cleaned reply text; nothing
//! downstream re-parses raw model output.
//!
//! Both ASCII (`:`) and full-width (`：`) colons are recognized everywhere,
//! since the built-in scenarios are Chinese and models mix the two freely.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One attributed line of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Speaker name (a persona, the combined roster name, or the user).
    pub speaker: String,
    /// Spoken text, may include parenthetical stage directions.
    pub text: String,
}

impl TranscriptLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Parenthetical stage directions, both ASCII and full-width brackets.
static STAGE_DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[（(][^）)]*[）)]").expect("static pattern"));

/// Split a speaker prefix off a line, if one is present.
///
/// Returns `(speaker, rest)` for `"Name: text"` / `"Name：text"` shapes.
fn split_prefix(line: &str) -> Option<(&str, &str)> {
    let idx_ascii = line.find(':');
    let idx_wide = line.find('：');
    let (idx, len) = match (idx_ascii, idx_wide) {
        (Some(a), Some(w)) if w < a => (w, '：'.len_utf8()),
        (Some(a), _) => (a, 1),
        (None, Some(w)) => (w, '：'.len_utf8()),
        (None, None) => return None,
    };
    let speaker = line[..idx].trim();
    if speaker.is_empty() {
        return None;
    }
    Some((speaker, line[idx + len..].trim()))
}

/// Split an opening script into attributed transcript lines.
///
/// Lines whose prefix names a known persona are attributed to that persona
/// (prefix stripped); every other non-empty line is attributed to
/// `fallback_speaker`, the synthetic combined roster name.
#[must_use]
pub fn split_script(
    script: &str,
    persona_names: &[&str],
    fallback_speaker: &str,
) -> Vec<TranscriptLine> {
    script
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            if let Some((speaker, text)) = split_prefix(line.trim()) {
                if persona_names.contains(&speaker) {
                    return TranscriptLine::new(speaker, text);
                }
            }
            TranscriptLine::new(fallback_speaker, line.trim())
        })
        .collect()
}

/// Clean a raw model reply before it enters the transcript.
///
/// Two cases:
///
/// 1. **Multi-persona reply**: at least two non-empty lines and every one
///    carries a colon. The reply is already in `Name: text` form for several
///    speakers; it is preserved verbatim (trimmed), stripping nothing.
/// 2. **Single reply**: one leading self-identification prefix is stripped,
///    the active speaker's own name, the user (`你`), or a generic
///    assistant label.
///
/// An empty result is returned as-is; the caller substitutes its fallback
/// line. Cleaning never fails.
#[must_use]
pub fn clean_reply(raw: &str, speaker_name: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() > 1
        && lines
            .iter()
            .all(|l| l.contains(':') || l.contains('：'))
    {
        // Multi-persona reply: every line is already attributed.
        return text.to_string();
    }

    let own_ascii = format!("{speaker_name}:");
    let own_wide = format!("{speaker_name}：");
    let prefixes: [&str; 8] = [
        &own_ascii,
        &own_wide,
        "你:",
        "你：",
        "助手:",
        "助手：",
        "AI:",
        "Assistant:",
    ];

    let mut cleaned = text;
    for prefix in prefixes {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.trim();
        }
    }
    cleaned.to_string()
}

/// Strip parenthetical stage directions (`(...)` / `（...）`) from reply
/// text before speech synthesis.
#[must_use]
pub fn strip_stage_directions(text: &str) -> String {
    STAGE_DIRECTION.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_persona_reply_preserved_verbatim() {
        let raw = "大舅: 来一个\n表哥: 对对对";
        assert_eq!(clean_reply(raw, "大舅 / 大妗子 / 表哥"), raw);
    }

    #[test]
    fn strips_own_name_prefix() {
        assert_eq!(clean_reply("王总: 你这个价格不行。", "王总"), "你这个价格不行。");
        assert_eq!(clean_reply("王总：你这个价格不行。", "王总"), "你这个价格不行。");
    }

    #[test]
    fn strips_generic_assistant_labels() {
        assert_eq!(clean_reply("Assistant: 好的。", "王总"), "好的。");
        assert_eq!(clean_reply("助手：好的。", "王总"), "好的。");
    }

    #[test]
    fn plain_reply_untouched() {
        assert_eq!(clean_reply("（冷笑）就这？", "王总"), "（冷笑）就这？");
    }

    #[test]
    fn empty_reply_stays_empty() {
        assert_eq!(clean_reply("   \n ", "王总"), "");
    }

    #[test]
    fn stage_directions_removed_for_speech() {
        assert_eq!(
            strip_stage_directions("（拍桌子）行，就这么定了。(sighs)"),
            "行，就这么定了。"
        );
        assert_eq!(strip_stage_directions("（沉默）"), "");
    }

    #[test]
    fn script_lines_attributed_to_known_personas() {
        let lines = split_script(
            "大舅: 先干一个\n旁白君: 气氛凝固了\n表哥: 我陪一个",
            &["大舅", "表哥"],
            "大舅 / 表哥",
        );
        assert_eq!(lines[0], TranscriptLine::new("大舅", "先干一个"));
        assert_eq!(
            lines[1],
            TranscriptLine::new("大舅 / 表哥", "旁白君: 气氛凝固了")
        );
        assert_eq!(lines[2], TranscriptLine::new("表哥", "我陪一个"));
    }

    #[test]
    fn single_line_script_goes_to_fallback() {
        let lines = split_script("行，你说吧。", &["王总"], "王总");
        assert_eq!(lines, vec![TranscriptLine::new("王总", "行，你说吧。")]);
    }
}
