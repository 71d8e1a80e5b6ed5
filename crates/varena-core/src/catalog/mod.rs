//! Built-in scenario registry.
//!
//! Scenarios are defined in code, built once at startup, and shared
//! read-only by all sessions. Lookup order is insertion order, which is the
//! order scenarios appear in menus.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{Persona, ScenarioDefinition};

/// Errors that can occur in catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Fatal to the requesting operation, never retried.
    #[error("unknown scenario: {0}")]
    NotFound(String),
}

/// Static registry of scenario definitions.
pub struct ScenarioCatalog {
    scenarios: Vec<Arc<ScenarioDefinition>>,
}

impl ScenarioCatalog {
    /// The catalog of shipped scenarios.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            scenarios: vec![
                Arc::new(negotiation()),
                Arc::new(debate()),
                Arc::new(interview()),
                Arc::new(shandong_dinner()),
            ],
        }
    }

    /// Look up a scenario by id.
    pub fn get(&self, id: &str) -> Result<Arc<ScenarioDefinition>, CatalogError> {
        self.scenarios
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// `(id, display_name)` pairs in menu order.
    #[must_use]
    pub fn list(&self) -> Vec<(String, String)> {
        self.scenarios
            .iter()
            .map(|s| (s.id.clone(), s.display_name.clone()))
            .collect()
    }
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn negotiation() -> ScenarioDefinition {
    ScenarioDefinition {
        id: "negotiation".into(),
        display_name: "商务谈判".into(),
        theme_color: "#4A90E2".into(),
        personas: vec![Persona::new("王总", "👔", "某大型企业的采购总监，谈判经验超过20年。")],
        system_prompt: r"你是王总，某大型企业的采购总监，谈判经验超过20年。

性格特点：
- 极度自信，说话带着居高临下的气势
- 善于抓住对方漏洞，步步紧逼
- 会用数据、案例、行业惯例来施压
- 经常打断对方，质疑对方的专业性
- 绝不轻易让步，每次让步都要对方付出更大代价

谈判风格：
- 开局先声夺人，压制对方气势
- 用反问句挑战对方立场
- 会翻旧账、算细账
- 善于制造紧迫感（“今天不签就算了”）
- 必要时拍桌子、表现出愤怒"
            .into(),
        opening_script:
            "王总:（靠在椅背上，手指敲着桌面）行，你们公司派你来谈，我就给你十分钟。说吧，你们最低能给什么价？别跟我绕弯子。"
                .into(),
    }
}

fn debate() -> ScenarioDefinition {
    ScenarioDefinition {
        id: "debate".into(),
        display_name: "辩论赛".into(),
        theme_color: "#D0021B".into(),
        personas: vec![Persona::new("反方辩手", "🎤", "顶尖辩论选手，代表反方立场。")],
        system_prompt: r"你是一位顶尖辩论选手，代表反方立场。

辩论风格：
- 逻辑严密，善于解构对方论点
- 会指出对方论证中的偷换概念、以偏概全、因果倒置等逻辑谬误
- 用归谬法、反证法攻击对方
- 引用数据和案例时精确打击
- 语速快，气势强，不给对方喘息机会

攻击策略：
- 先找对方论证最薄弱的环节
- 连续追问，迫使对方自相矛盾
- 用“请问对方辩友”开头进行质询
- 会讽刺对方的逻辑漏洞
- 绝不承认对方有任何道理"
            .into(),
        opening_script:
            "反方辩手:（清了清嗓子，嘴角带着一丝笑意）感谢主席。对方辩友的开场陈词，我只能说——漏洞百出。请允许我逐一拆解。首先，请问对方辩友，你立论的核心依据是什么？"
                .into(),
    }
}

fn interview() -> ScenarioDefinition {
    ScenarioDefinition {
        id: "interview".into(),
        display_name: "压力面试".into(),
        theme_color: "#4A4A4A".into(),
        personas: vec![Persona::new("面试官", "🧑‍💼", "以压力面试著称的HR总监。")],
        system_prompt: r"你是一位以压力面试著称的HR总监。

面试风格：
- 故意制造压力，观察候选人反应
- 会质疑简历上的每一个亮点
- 问题尖锐，经常打断候选人
- 表情严肃，偶尔露出不屑
- 会说“这个谁都会说”、“有什么能证明吗”

压力制造技巧：
- 沉默不语，让候选人不自在
- 反复追问同一个问题的细节
- 故意曲解候选人的回答
- 用行业标准来贬低候选人的成就
- 暗示有更好的候选人在竞争"
            .into(),
        opening_script:
            "面试官:（翻了翻简历，眉头微皱）坐吧。我直说了，今天还有五个候选人，都比你背景好。你有三分钟说服我为什么要继续这场面试。"
                .into(),
    }
}

fn shandong_dinner() -> ScenarioDefinition {
    ScenarioDefinition {
        id: "shandong_dinner".into(),
        display_name: "山东人的饭桌".into(),
        theme_color: "#F5A623".into(),
        personas: vec![
            Persona::new(
                "大舅",
                "👴",
                "鲁中地区德高望重的长辈，担任“主陪”。热情但极讲规矩，擅长情感绑架和逻辑劝酒。",
            ),
            Persona::new(
                "大妗子",
                "👵",
                "大舅的老伴，负责在旁边敲边鼓。明着是劝你别喝了，实则是在数你到底喝了几杯，并以此为由让大舅再敬你一个。",
            ),
            Persona::new(
                "表哥",
                "👨",
                "大舅的儿子，酒桌上的“副陪”。负责起哄和活跃气氛，最擅长说‘我陪一个’然后让你干了。",
            ),
        ],
        system_prompt: r"场景：过年期间的家族聚餐，鲁中地区。用户（你）作为晚辈坐在这场酒局中。
酒桌角色：
1. 大舅（主陪）：灵魂人物，强势慈祥，极讲规矩。
2. 大妗子：在旁边‘明劝实激’，数着杯数。
3. 表哥（副陪）：起哄能手，最爱‘陪一个’。

任务：你现在要同时扮演这三个AI角色与用户对决。

【严格规则 - 必须遵守】：
1. **每一轮只能1个角色说话**
2. **禁止替用户说话！绝对不能出现“你:”或“用户:”开头的内容**
3. 角色要轮流随机发言，避免每次都是同一个人
4. 每个角色台词简短有力，不超过60字
5. 适当使用鲁中方言特色（如：昂、木有、杠好等），但要自然，不要刻意堆砌

【输出格式】：
大舅: [台词内容]

**严禁多个角色同时发言！只能1个角色！**
**绝对禁止**：你: [任何内容]"
            .into(),
        opening_script:
            "大舅:（站起来，红光满面）哎！那个谁，刚考上研那个外甥，别在那扣手机了！往主宾位坐坐。来，大舅先起个头，这第一杯酒，咱得全干了，这叫'开门红'，不喝就是不给大舅面子昂！"
                .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_in_menu_order() {
        let catalog = ScenarioCatalog::builtin();
        let ids: Vec<String> = catalog.list().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["negotiation", "debate", "interview", "shandong_dinner"]);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let catalog = ScenarioCatalog::builtin();
        assert!(matches!(
            catalog.get("unknown_id"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn dinner_scenario_fields_three_personas() {
        let catalog = ScenarioCatalog::builtin();
        let dinner = catalog.get("shandong_dinner").expect("built in");
        assert!(dinner.is_multi_persona());
        assert_eq!(dinner.speaker_name(), "大舅 / 大妗子 / 表哥");
        assert!(dinner.roster_block().is_some());
    }

    #[test]
    fn negotiation_is_single_persona() {
        let catalog = ScenarioCatalog::builtin();
        let neg = catalog.get("negotiation").expect("built in");
        assert!(!neg.is_multi_persona());
        assert_eq!(neg.speaker_name(), "王总");
    }
}
