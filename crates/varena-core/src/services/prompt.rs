//! Prompt assembly for every generation call the engine makes.
//!
//! All prompt text lives here so the orchestrator, judge, and report
//! services stay free of string templates. Prompts are Chinese because the
//! built-in scenarios are; the structure (system prompt + situation block +
//! context window + format constraints) is scenario-independent.

use crate::domain::{Persona, Session};

/// Transcript lines included as generation context.
pub const CONTEXT_WINDOW: usize = 8;

/// Wider window used for rescue suggestions, which benefit from more of the
/// exchange.
const RESCUE_CONTEXT_WINDOW: usize = 10;

/// The reply prompt for a standard turn.
#[must_use]
pub fn turn_reply(session: &Session) -> String {
    reply_prompt(session, None)
}

/// The reply prompt for a rescue turn: the opponent is reacting to an
/// outside expert who just spoke on the user's behalf.
#[must_use]
pub fn rescue_reply(session: &Session) -> String {
    reply_prompt(
        session,
        Some(
            "【特别说明】\n刚才有一位“救场大师”介入帮助对方说话了。你需要回应这位救场大师的发言。\n可以表现出对外援介入的不满，继续保持攻势。\n",
        ),
    )
}

fn reply_prompt(session: &Session, extra: Option<&str>) -> String {
    let scenario = &session.scenario;
    let dominance = session.dominance();

    let roster = scenario
        .roster_block()
        .map(|block| format!("\n{block}"))
        .unwrap_or_default();

    let cue = if scenario.is_multi_persona() {
        "请根据场景角色进行回复".to_string()
    } else {
        session.speaker_name.clone()
    };

    format!(
        r"{system}
{roster}
【当前局势】
你的气场: {ai}/100
对方气场: {user}/100
（气场越高越占优势，总和为100）

【对话记录】
{context}

{extra}【本轮回复要求】
1. **只能1个角色说话！严禁多个角色！**
2. **只能使用场景设定中的角色名，不能编造其他角色**
3. **绝对禁止替用户说话，不能出现“你:”开头的内容**
4. 完全进入角色，保持强势和攻击性
5. 针对对方刚才说的内容进行反驳、质疑或施压
6. 只输出对话内容，可含动作描写（用括号）
7. 格式：“角色名: 内容”

{cue}:",
        system = scenario.system_prompt,
        roster = roster,
        ai = dominance.ai(),
        user = dominance.user(),
        context = session.recent_context(CONTEXT_WINDOW),
        extra = extra.unwrap_or(""),
        cue = cue,
    )
}

/// The judging prompt: two labeled output lines, nothing else.
#[must_use]
pub fn judge(session: &Session, user_text: &str, ai_text: &str) -> String {
    let dominance = session.dominance();
    format!(
        r#"你是专业的辩论/谈判裁判。分析这轮交锋，判断气场转移。

【场景】{scene}
【当前气场】用户 {user} vs AI {ai}（总和100）

【用户发言】
"{user_text}"

【{speaker}回应】
"{ai_text}"

【评判维度】
1. 论点强度：论据充分性、逻辑严密性
2. 气势表现：语气自信度、压迫感
3. 反击有效性：是否有效回应对方攻击
4. 心理战术：是否动摇对方信心

【输出格式】（严格按此格式，只输出两行）
气场转移: [整数，-25到+25，正数表示用户占优，负数表示AI占优]
点评: [一句话点评]"#,
        scene = session.scenario.display_name,
        user = dominance.user(),
        ai = dominance.ai(),
        speaker = session.speaker_name,
    )
}

/// First-person rescue suggestion for the user.
#[must_use]
pub fn rescue_suggestion(session: &Session) -> String {
    let dominance = session.dominance();
    format!(
        r"你是一位顶尖的沟通专家。用户在以下场景中需要帮助，请你以用户的身份（晚辈/下属）生成一段高情商回复供其参考。

【场景】{scene}
【对手】{speaker}
【当前气场】用户 {user} vs AI {ai}

【对话历史】
{context}

【任务】
你要以用户（晚辈/下属）的第一人称身份生成一条得体的回复，用户可以直接复制发送。
要求：
1. 必须以第一人称说话（“我...”），不能用第三人称（禁止“你应该...”“可以说...”）
2. 简短有力，直击要害，不超过50字
3. 符合晚辈/下属身份，谦逊但不失气场
4. 能化解困境或扶回局势

请直接输出台词，不要有任何解释。",
        scene = session.scenario.display_name,
        speaker = session.speaker_name,
        user = dominance.user(),
        ai = dominance.ai(),
        context = session.recent_context(RESCUE_CONTEXT_WINDOW),
    )
}

/// Closing narrative for the end-of-session summary.
#[must_use]
pub fn summary(session: &Session, result_line: &str) -> String {
    let dominance = session.dominance();
    format!(
        r"你是一位专业的沟通教练。分析以下对决并给出详细点评和改进建议。

【场景】{scene}
【对手】{speaker}
【最终气场】用户 {user} vs AI {ai}
【回合数】{turns}

【对话记录】
{dialogue}

请严格按以下格式输出：

## 🎯 对决结果
[{result}，最终气场比分]

## 📊 表现分析
- 优势: [列举2-3个亮点]
- 不足: [列举2-3个问题]

## 🔑 关键回合复盘
[指出1-2个关键转折点，分析为什么赢/输]

## 💡 改进建议
[给出3条具体可操作的建议]",
        scene = session.scenario.display_name,
        speaker = session.speaker_name,
        user = dominance.user(),
        ai = dominance.ai(),
        turns = session.turn_count,
        dialogue = session.transcript_text(),
        result = result_line,
    )
}

/// Report call 1: five-dimension scoring, JSON only.
#[must_use]
pub fn report_scores(scene_name: &str, npc_json: &str, history: &str) -> String {
    format!(
        r#"# Role
你是“饭局情商大挑战”的打分裁判，负责给玩家在对话中的表现从五个维度打分。

# Input
- 场景描述：{scene_name}
- NPC设定列表：{npc_json}
- 历史对话：
{history}

# Task
分析对话，给出玩家在五个维度的客观得分，输出从0-100的数值。5个指标如下：
1. "oily": 圆滑度：避重就轻、推诿话题的能力,
2. "friendliness": 亲和力：共情与情绪价值提供,
3. "logic": 逻辑性：论据支撑与表达条理,
4. "humor": 幽默感：破冰与自嘲能力,
5. "respect": 懂规矩：礼仪遵守与分寸感。

# Output Format (JSON Only)
{{
  "metrics": {{
    "oily": int,
    "friendliness": int,
    "logic": int,
    "humor": int,
    "respect": int
  }}
}}

# Constraints
只输出 JSON格式，不得输出任何额外解释文字"#
    )
}

/// Report call 2: the medal-aware narrative paragraph.
#[must_use]
pub fn report_narrative(scene_name: &str, npc_json: &str, history: &str, medal: &str) -> String {
    format!(
        r"# Role
你是一位在饭局混迹三十年、眼光毒辣的人情世故宗师。你的任务是根据玩家在“饭局情商大挑战”中的对话表现，给出一份既专业又扎心的总结陈词。

# Input
- 场景描述：{scene_name}
- NPC设定列表：{npc_json}
- 历史对话：
{history}
- 玩家称号：{medal}

# Task
分析对话历史，撰写一段 100 字以内的玩家表现综合点评。

# Writing Constraints
- 犀利度：不要客气，要像一位严厉的长辈或刻薄的职场前辈。如果表现差，请使用“社交自杀”、“拆迁队”、“冷场王”等词汇。
- 专业深度：点评必须基于真实的社交潜规则。
- 称号挂钩：点评必须匹配生成的玩家称号。
- 结构化：第一句：定性评价；中间语句：逻辑分析；结尾句：总结。

# Constraints
直接输出总结陈词内容，不得输出任何额外解释文字"
    )
}

/// Report call 3: per-NPC inner voice plus one improvement suggestion,
/// strict JSON.
#[must_use]
pub fn report_npc_voices(scene_name: &str, npc_json: &str, history: &str, medal: &str) -> String {
    format!(
        r#"# Role
你是一位在饭局混迹三十年、毒舌且看透世事的“人情世故大宗师”。

# Input Data
- 场景描述：{scene_name}
- NPC设定列表：{npc_json}
- 历史对话：
{history}
- 玩家称号：{medal}

# Tasks
1. 生成 NPC 内心 OS：为 NPC 列表中的每人生成一段 20 字以内的心理活动。要求口语化，符合人设。
2. 生成改进建议：针对玩家最不合时宜的一句话，给出高情商台词改写及避坑逻辑。

# Output Format (Strict JSON)
{{
  "npc_inner_voice": [
    {{"name": "...", "os": "..."}},
    {{"name": "...", "os": "..."}}
  ],
  "high_light_suggestion": "..."
}}

# Constraints
只输出 JSON格式，不得输出任何额外解释文字"#
    )
}

/// Serialize a persona roster for report prompts.
#[must_use]
pub fn persona_roster_json(personas: &[Persona]) -> String {
    serde_json::to_string(personas).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScenarioCatalog;
    use crate::domain::{Session, USER_SPEAKER};

    fn session(id: &str) -> Session {
        let catalog = ScenarioCatalog::builtin();
        Session::new(catalog.get(id).expect("built in"))
    }

    #[test]
    fn turn_prompt_carries_scores_and_context() {
        let mut s = session("negotiation");
        s.record(USER_SPEAKER, "这个价格已经很有诚意了。");
        let prompt = turn_reply(&s);
        assert!(prompt.contains("你的气场: 50/100"));
        assert!(prompt.contains("对方气场: 50/100"));
        assert!(prompt.contains("这个价格已经很有诚意了。"));
        assert!(prompt.ends_with("王总:"));
    }

    #[test]
    fn multi_persona_prompt_lists_roster() {
        let prompt = turn_reply(&session("shandong_dinner"));
        assert!(prompt.contains("【可用角色列表】"));
        assert!(prompt.contains("- 👴 大舅"));
        assert!(prompt.ends_with("请根据场景角色进行回复:"));
    }

    #[test]
    fn rescue_reply_adds_framing() {
        let prompt = rescue_reply(&session("negotiation"));
        assert!(prompt.contains("救场大师"));
    }

    #[test]
    fn judge_prompt_embeds_both_sides() {
        let s = session("debate");
        let prompt = judge(&s, "我的论点是……", "漏洞百出。");
        assert!(prompt.contains("我的论点是……"));
        assert!(prompt.contains("漏洞百出。"));
        assert!(prompt.contains("气场转移:"));
        assert!(prompt.contains("点评:"));
    }
}
