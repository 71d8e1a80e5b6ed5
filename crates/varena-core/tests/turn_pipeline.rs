//! End-to-end tests of the turn pipeline against mock back-ends.
//!
//! Each test queues the generation backend's replies in call order (the
//! persona reply, then the judge verdict, per turn) and drives the pipeline
//! through its event stream.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;
use tempfile::TempDir;

use varena_core::events::StageEvent;
use varena_core::ports::{
    Emotion, GenerationError, GenerationGateway, SpeechError, SpeechGateway, TextStream,
};
use varena_core::ports::{ArchiveError, SummaryArchive, SummaryRecord};
use varena_core::services::{
    DominanceJudge, FALLBACK_REPLY, NEUTRAL_VERDICT, RESCUE_FALLBACK_REPLY, RESCUE_SPEAKER,
    SessionError, SessionStore, SummaryError, SummaryService, TurnOrchestrator,
};
use varena_core::{GameOutcome, NoopSpeech, ScenarioCatalog, SessionId};

struct MockGeneration {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
}

impl MockGeneration {
    fn queued(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
        })
    }

    fn ok(replies: &[&str]) -> Arc<Self> {
        Self::queued(replies.iter().map(|r| Ok((*r).to_string())).collect())
    }
}

#[async_trait]
impl GenerationGateway for MockGeneration {
    async fn generate(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, GenerationError> {
        self.replies
            .lock()
            .expect("mock lock")
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::AllBackendsFailed("queue empty".into())))
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TextStream, GenerationError> {
        let text = self.generate(prompt, max_tokens, temperature).await?;
        Ok(Box::pin(futures_util::stream::iter(vec![Ok(text)])))
    }

    fn model_name(&self) -> String {
        "mock".to_string()
    }
}

enum MockSpeech {
    Bytes(Vec<u8>),
    Fails,
}

#[async_trait]
impl SpeechGateway for MockSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        _emotion: Emotion,
    ) -> Result<Option<Vec<u8>>, SpeechError> {
        match self {
            Self::Bytes(bytes) => Ok(Some(bytes.clone())),
            Self::Fails => Err(SpeechError::SynthesisFailed("mock failure".into())),
        }
    }

    async fn transcribe(&self, _audio_path: &Path) -> Result<String, SpeechError> {
        Err(SpeechError::NotInitialized)
    }
}

struct Harness {
    store: Arc<SessionStore>,
    orchestrator: TurnOrchestrator,
    _audio: TempDir,
}

impl Harness {
    fn new(generation: Arc<MockGeneration>, speech: Arc<dyn SpeechGateway>) -> Self {
        let store = Arc::new(SessionStore::new(Arc::new(ScenarioCatalog::builtin())));
        let judge = Arc::new(DominanceJudge::new(generation.clone()));
        let audio = TempDir::new().expect("temp dir");
        let orchestrator = TurnOrchestrator::new(
            Arc::clone(&store),
            generation,
            judge,
            speech,
            audio.path().to_path_buf(),
        );
        Self {
            store,
            orchestrator,
            _audio: audio,
        }
    }

    fn silent(generation: Arc<MockGeneration>) -> Self {
        Self::new(generation, Arc::new(NoopSpeech))
    }

    async fn open(&self, scenario: &str) -> SessionId {
        let handle = self.store.create(scenario).expect("built-in scenario");
        let id = handle.lock().await.id.clone();
        id
    }

    async fn turn(&self, id: &SessionId, text: &str) -> Vec<StageEvent> {
        self.orchestrator
            .process_turn(id, text)
            .expect("session exists")
            .collect()
            .await
    }
}

fn last_complete(events: &[StageEvent]) -> &StageEvent {
    let event = events.last().expect("at least one event");
    assert!(matches!(event, StageEvent::Complete { .. }));
    event
}

#[tokio::test]
async fn turn_emits_the_four_stages_in_order() {
    let h = Harness::silent(MockGeneration::ok(&[
        "王总: 这个价格不可能。",
        "气场转移: +10\n点评: 反击有力。",
    ]));
    let id = h.open("negotiation").await;
    let events = h.turn(&id, "我们的成本摆在这里。").await;

    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], StageEvent::UserSent { .. }));
    assert!(matches!(events[1], StageEvent::AiThinking { .. }));
    assert!(matches!(events[2], StageEvent::AiResponded { .. }));
    match last_complete(&events) {
        StageEvent::Complete {
            ai_text,
            verdict,
            score_delta,
            game_over,
            ..
        } => {
            assert_eq!(ai_text, "这个价格不可能。");
            assert_eq!(verdict, "反击有力。");
            assert_eq!(*score_delta, 10);
            assert!(!game_over);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn every_snapshot_sums_to_100() {
    let h = Harness::silent(MockGeneration::ok(&[
        "王总: 哼。",
        "气场转移: -18\n点评: 被动了。",
    ]));
    let id = h.open("negotiation").await;
    for event in h.turn(&id, "这个嘛……").await {
        let scores = event.scores();
        assert_eq!(
            u16::from(scores.user_dominance) + u16::from(scores.ai_dominance),
            100
        );
    }
}

#[tokio::test]
async fn user_wins_at_the_ceiling() {
    let h = Harness::silent(MockGeneration::ok(&[
        "王总: 你……",
        "气场转移: +25\n点评: 完胜。",
        "王总: 好吧，你赢了。",
        "气场转移: +25\n点评: 彻底压制。",
    ]));
    let id = h.open("negotiation").await;

    let events = h.turn(&id, "第一击。").await;
    assert_eq!(last_complete(&events).scores().user_dominance, 75);

    let events = h.turn(&id, "第二击。").await;
    match last_complete(&events) {
        StageEvent::Complete {
            scores,
            game_over,
            outcome,
            ..
        } => {
            assert_eq!(scores.user_dominance, 95);
            assert!(game_over);
            assert_eq!(*outcome, Some(GameOutcome::UserWin));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn ai_wins_at_the_floor() {
    let h = Harness::silent(MockGeneration::ok(&[
        "反方辩手: 漏洞百出。",
        "气场转移: -25\n点评: 崩了。",
        "反方辩手: 无话可说了吧。",
        "气场转移: -25\n点评: 完败。",
    ]));
    let id = h.open("debate").await;

    h.turn(&id, "我觉得……").await;
    let events = h.turn(&id, "呃……").await;
    match last_complete(&events) {
        StageEvent::Complete {
            scores, outcome, ..
        } => {
            assert_eq!(scores.user_dominance, 5);
            assert_eq!(*outcome, Some(GameOutcome::AiWin));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn whitespace_input_is_a_no_op() {
    let h = Harness::silent(MockGeneration::ok(&[]));
    let id = h.open("interview").await;

    let events = h.turn(&id, "   \n\t").await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StageEvent::UserSent { .. }));
    assert_eq!(events[0].scores().user_dominance, 50);

    let session = h.store.get(&id).expect("still present");
    let session = session.lock().await;
    assert_eq!(session.turn_count, 0);
    assert_eq!(session.transcript.len(), 1);
}

#[tokio::test]
async fn unknown_session_fails_before_any_event() {
    let h = Harness::silent(MockGeneration::ok(&[]));
    let result = h.orchestrator.process_turn(&SessionId::from("missing"), "在吗");
    assert!(matches!(result, Err(SessionError::NotFound(_))));
}

#[tokio::test]
async fn generation_failure_uses_the_fallback_reply() {
    let h = Harness::silent(MockGeneration::queued(vec![
        Err(GenerationError::EmptyResponse),
        Ok("气场转移: 0\n点评: 对方沉默。".to_string()),
    ]));
    let id = h.open("negotiation").await;
    let events = h.turn(&id, "怎么不说话了？").await;
    match last_complete(&events) {
        StageEvent::Complete { ai_text, .. } => assert_eq!(ai_text, FALLBACK_REPLY),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn unparsable_verdict_scores_neutral() {
    let h = Harness::silent(MockGeneration::ok(&[
        "面试官: 继续。",
        "这轮双方表现都还行，我不好说。",
    ]));
    let id = h.open("interview").await;
    let events = h.turn(&id, "我有三年相关经验。").await;
    match last_complete(&events) {
        StageEvent::Complete {
            scores,
            verdict,
            score_delta,
            ..
        } => {
            assert_eq!(*score_delta, 0);
            assert_eq!(verdict, NEUTRAL_VERDICT);
            assert_eq!(scores.user_dominance, 50);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn multi_persona_reply_is_preserved_verbatim() {
    let h = Harness::silent(MockGeneration::ok(&[
        "大舅: 来一个\n表哥: 对对对",
        "气场转移: -5\n点评: 被围攻了。",
    ]));
    let id = h.open("shandong_dinner").await;
    let events = h.turn(&id, "我真不能喝了。").await;
    match last_complete(&events) {
        StageEvent::Complete { ai_text, .. } => {
            assert_eq!(ai_text, "大舅: 来一个\n表哥: 对对对");
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn synthesis_failure_degrades_to_text_only() {
    let h = Harness::new(
        MockGeneration::ok(&["王总: 哼。", "气场转移: 0\n点评: 平手。"]),
        Arc::new(MockSpeech::Fails),
    );
    let id = h.open("negotiation").await;
    let events = h.turn(&id, "您再考虑考虑。").await;
    match last_complete(&events) {
        StageEvent::Complete { audio_path, .. } => assert!(audio_path.is_none()),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn synthesized_audio_is_written_per_turn() {
    let h = Harness::new(
        MockGeneration::ok(&["王总: 最多让两个点。", "气场转移: +3\n点评: 有进展。"]),
        Arc::new(MockSpeech::Bytes(vec![1, 2, 3, 4])),
    );
    let id = h.open("negotiation").await;
    let events = h.turn(&id, "各退一步？").await;
    match last_complete(&events) {
        StageEvent::Complete { audio_path, .. } => {
            let path = audio_path.as_ref().expect("audio written");
            assert!(path.ends_with(format!("{}/turn_1.wav", id.as_str())));
            assert_eq!(std::fs::read(path).expect("file exists"), vec![1, 2, 3, 4]);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn rescue_turn_is_reduced_and_leaves_scores_alone() {
    let h = Harness::silent(MockGeneration::ok(&[
        "王总:（皱眉）请高人了？那也改变不了成本结构。",
    ]));
    let id = h.open("negotiation").await;
    let events = h
        .orchestrator
        .process_rescue_turn(&id, "王总，我们不妨先谈交付节奏。")
        .expect("session exists")
        .collect::<Vec<_>>()
        .await;

    // No user_sent, no ai_responded, no judge call.
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], StageEvent::AiThinking { .. }));
    match last_complete(&events) {
        StageEvent::Complete {
            scores,
            ai_text,
            score_delta,
            game_over,
            ..
        } => {
            assert_eq!(scores.user_dominance, 50);
            assert_eq!(*score_delta, 0);
            assert!(!game_over);
            assert_eq!(ai_text, "（皱眉）请高人了？那也改变不了成本结构。");
        }
        _ => unreachable!(),
    }

    let session = h.store.get(&id).expect("still present");
    let session = session.lock().await;
    assert_eq!(session.turn_count, 0);
    let expert_line = session
        .transcript
        .iter()
        .find(|l| l.speaker == RESCUE_SPEAKER)
        .expect("expert line recorded");
    assert_eq!(expert_line.text, "王总，我们不妨先谈交付节奏。");
}

#[derive(Default)]
struct MockArchive {
    records: Mutex<Vec<(SessionId, SummaryRecord)>>,
}

#[async_trait]
impl SummaryArchive for MockArchive {
    async fn persist(
        &self,
        session_id: &SessionId,
        record: &SummaryRecord,
    ) -> Result<String, ArchiveError> {
        self.records
            .lock()
            .expect("mock lock")
            .push((session_id.clone(), record.clone()));
        Ok(format!("mem://{session_id}"))
    }
}

#[tokio::test]
async fn ending_twice_is_not_found() {
    let store = Arc::new(SessionStore::new(Arc::new(ScenarioCatalog::builtin())));
    let generation = MockGeneration::ok(&["这局打得有来有回，整体表现尚可。"]);
    let archive = Arc::new(MockArchive::default());
    let summary = SummaryService::new(
        Arc::clone(&store),
        generation,
        Arc::clone(&archive) as Arc<dyn SummaryArchive>,
    );

    let handle = store.create("negotiation").expect("built-in scenario");
    let id = handle.lock().await.id.clone();
    drop(handle);

    let closed = summary.end_session(&id).await.expect("first end succeeds");
    assert_eq!(closed.user_dominance, 50);
    assert_eq!(closed.narrative, "这局打得有来有回，整体表现尚可。");
    assert_eq!(closed.archive_key, format!("mem://{id}"));
    assert!(store.is_empty());

    let records = archive.records.lock().expect("mock lock");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, id);
    assert!(!records[0].1.transcript.is_empty());
    drop(records);

    assert!(matches!(
        summary.end_session(&id).await,
        Err(SummaryError::Session(SessionError::NotFound(_)))
    ));
}

#[tokio::test]
async fn rescue_turn_has_its_own_fallback() {
    let h = Harness::silent(MockGeneration::queued(vec![Err(
        GenerationError::Http("backend down".into()),
    )]));
    let id = h.open("negotiation").await;
    let events = h
        .orchestrator
        .process_rescue_turn(&id, "这个方案对双方都有利。")
        .expect("session exists")
        .collect::<Vec<_>>()
        .await;
    match last_complete(&events) {
        StageEvent::Complete { ai_text, .. } => assert_eq!(ai_text, RESCUE_FALLBACK_REPLY),
        _ => unreachable!(),
    }
}
