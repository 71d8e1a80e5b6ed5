//! Filesystem summary archive.
//!
//! One markdown file per session under `<data>/sessions/`, written
//! atomically enough for a single-writer CLI (plain write, no temp file).

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;

use varena_core::domain::SessionId;
use varena_core::ports::{ArchiveError, SummaryArchive, SummaryRecord};

/// Writes end-of-session records as markdown files.
pub struct FsSummaryArchive {
    sessions_dir: PathBuf,
}

impl FsSummaryArchive {
    #[must_use]
    pub const fn new(sessions_dir: PathBuf) -> Self {
        Self { sessions_dir }
    }

    fn render(record: &SummaryRecord) -> String {
        let mut out = String::new();
        out.push_str(&format!("# 对决总结 - {}\n\n", record.scenario_name));
        out.push_str(&format!(
            "- 时间: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("- 对手: {}\n", record.speaker_name));
        out.push_str(&format!("- 回合数: {}\n", record.turn_count));
        out.push_str(&format!(
            "- 最终气场: 你 {} vs 对方 {}\n",
            record.user_dominance, record.ai_dominance
        ));
        out.push_str(&format!("- 结果: {}\n\n", record.result));

        out.push_str("## 对话记录\n\n");
        for line in &record.transcript {
            out.push_str(&format!("**{}**: {}\n\n", line.speaker, line.text));
        }

        out.push_str("## 教练点评\n\n");
        out.push_str(&record.narrative);
        out.push('\n');
        out
    }
}

#[async_trait]
impl SummaryArchive for FsSummaryArchive {
    async fn persist(
        &self,
        session_id: &SessionId,
        record: &SummaryRecord,
    ) -> Result<String, ArchiveError> {
        tokio::fs::create_dir_all(&self.sessions_dir).await?;
        let path = self
            .sessions_dir
            .join(format!("{}_summary.md", session_id.as_str()));
        tokio::fs::write(&path, Self::render(record)).await?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varena_core::domain::TranscriptLine;

    fn record() -> SummaryRecord {
        SummaryRecord {
            scenario_name: "商务谈判".to_string(),
            speaker_name: "王总".to_string(),
            turn_count: 3,
            user_dominance: 72,
            ai_dominance: 28,
            result: "🏆 你赢了！气场 72 压制对方".to_string(),
            transcript: vec![
                TranscriptLine::new("王总", "说吧。"),
                TranscriptLine::new("你", "我们谈谈价格。"),
            ],
            narrative: "整体表现稳健。".to_string(),
        }
    }

    #[tokio::test]
    async fn persists_a_readable_markdown_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let archive = FsSummaryArchive::new(dir.path().join("sessions"));
        let id = SessionId::from("abc12345");

        let key = archive.persist(&id, &record()).await.expect("persists");
        assert!(key.ends_with("abc12345_summary.md"));

        let content = std::fs::read_to_string(&key).expect("file exists");
        assert!(content.contains("# 对决总结 - 商务谈判"));
        assert!(content.contains("**王总**: 说吧。"));
        assert!(content.contains("整体表现稳健。"));
        assert!(content.contains("你 72 vs 对方 28"));
    }

    #[tokio::test]
    async fn persisting_twice_overwrites() {
        let dir = tempfile::tempdir().expect("temp dir");
        let archive = FsSummaryArchive::new(dir.path().to_path_buf());
        let id = SessionId::from("dupdupdu");

        archive.persist(&id, &record()).await.expect("persists");
        let mut second = record();
        second.narrative = "第二次写入。".to_string();
        let key = archive.persist(&id, &second).await.expect("persists");

        let content = std::fs::read_to_string(&key).expect("file exists");
        assert!(content.contains("第二次写入。"));
        assert!(!content.contains("整体表现稳健。"));
    }
}
