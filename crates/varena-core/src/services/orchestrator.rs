//! The turn pipeline.
//!
//! One user line drives one pass through the stages, emitted as an ordered
//! event stream: accept the line (hesitation penalty), generate the reply,
//! apply the thinking gain, judge the exchange, fold in the verdict, check
//! for a win, synthesize speech, record the reply. The session lock is held
//! for the whole pass, so turns within a session never interleave.
//!
//! Model failures never kill a turn: generation degrades to a canned reply,
//! judging degrades to neutral, synthesis degrades to text-only.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures_util::stream::BoxStream;
use tracing::{info, warn};

use crate::domain::{
    GameOutcome, SessionId, USER_SPEAKER, clean_reply, hesitation_penalty,
    strip_stage_directions, thinking_gain,
};
use crate::events::StageEvent;
use crate::ports::{Emotion, GenerationGateway, SpeechGateway};
use crate::services::judge::{DominanceJudge, JudgeVerdict};
use crate::services::prompt;
use crate::services::store::{SessionError, SessionStore};

/// Reply substituted when generation produces nothing usable.
pub const FALLBACK_REPLY: &str = "（沉默片刻）你说得很有意思，但我不同意。";

/// Fallback for the rescue variant, where the opponent is reacting to the
/// outside expert.
pub const RESCUE_FALLBACK_REPLY: &str = "（冷笑）哦？还请外援了？那也没用。";

/// Transcript name of the outside expert in rescue turns.
pub const RESCUE_SPEAKER: &str = "救场大师";

const REPLY_MAX_TOKENS: u32 = 400;
const REPLY_TEMPERATURE: f32 = 0.7;

/// The ordered events of one turn.
pub type TurnEvents = BoxStream<'static, StageEvent>;

/// Drives sessions through the turn pipeline.
pub struct TurnOrchestrator {
    store: Arc<SessionStore>,
    generation: Arc<dyn GenerationGateway>,
    judge: Arc<DominanceJudge>,
    speech: Arc<dyn SpeechGateway>,
    audio_dir: PathBuf,
}

impl TurnOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        generation: Arc<dyn GenerationGateway>,
        judge: Arc<DominanceJudge>,
        speech: Arc<dyn SpeechGateway>,
        audio_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            generation,
            judge,
            speech,
            audio_dir,
        }
    }

    /// Run one standard turn.
    ///
    /// The session is looked up eagerly, so an unknown id fails before any
    /// event is emitted. The returned stream yields `user_sent`,
    /// `ai_thinking`, `ai_responded`, then `complete`; a whitespace-only
    /// line yields a single `user_sent` echo and mutates nothing.
    pub fn process_turn(
        &self,
        session_id: &SessionId,
        user_text: &str,
    ) -> Result<TurnEvents, SessionError> {
        let handle = self.store.get(session_id)?;
        let generation = Arc::clone(&self.generation);
        let judge = Arc::clone(&self.judge);
        let speech = Arc::clone(&self.speech);
        let audio_dir = self.audio_dir.clone();
        let session_id = session_id.clone();
        let user_text = user_text.trim().to_string();

        Ok(Box::pin(stream! {
            let mut session = handle.lock().await;

            if user_text.is_empty() {
                yield StageEvent::user_sent(session.dominance(), None);
                return;
            }

            // Accept the user's line.
            let elapsed = session.last_activity.elapsed().as_secs();
            let penalty = hesitation_penalty(elapsed);
            let note = if penalty > 0 {
                session.shift_dominance(-i32::from(penalty));
                Some(format!("犹豫惩罚 -{penalty}"))
            } else {
                None
            };
            session.touch();
            session.turn_count += 1;
            session.record(USER_SPEAKER, user_text.clone());
            yield StageEvent::user_sent(session.dominance(), note);

            // Generate the reply.
            yield StageEvent::ai_thinking(session.dominance(), Some(generation.model_name()));
            let reply_prompt = prompt::turn_reply(&session);
            let started = Instant::now();
            let ai_text = generate_reply(
                generation.as_ref(),
                &session_id,
                &reply_prompt,
                &session.speaker_name,
                FALLBACK_REPLY,
            )
            .await;

            // The user gains ground while the model deliberates.
            let think_secs = started.elapsed().as_secs();
            let gain = thinking_gain(think_secs);
            let note = if gain > 0 {
                session.shift_dominance(i32::from(gain));
                Some(format!("思考收益 +{gain}"))
            } else {
                None
            };
            yield StageEvent::ai_responded(session.dominance(), note);

            // Judge the exchange and fold in the verdict.
            let verdict = judge.judge(&session, &user_text, &ai_text).await;
            session.shift_dominance(verdict.delta);
            let outcome = session.dominance().outcome();
            if let Some(outcome) = outcome {
                info!(
                    session = %session_id,
                    user = session.dominance().user(),
                    user_win = matches!(outcome, GameOutcome::UserWin),
                    "win condition reached"
                );
            }

            let audio_path = synthesize_reply(
                speech.as_ref(),
                &audio_dir,
                &session_id,
                session.turn_count,
                &ai_text,
                Emotion::from_delta(verdict.delta),
            )
            .await;

            let speaker_name = session.speaker_name.clone();
            session.record(speaker_name, ai_text.clone());
            session.touch();
            yield StageEvent::complete(
                session.dominance(),
                ai_text,
                audio_path,
                &verdict,
                outcome,
            );
        }))
    }

    /// Run a rescue turn: the outside expert's line is delivered on the
    /// user's behalf and the opponent reacts to the intervention.
    ///
    /// Reduced pipeline: no hesitation penalty, no thinking gain, no judge
    /// call, no score change. The reply is voiced angry, since an outsider
    /// just interfered. Yields `ai_thinking` then `complete`.
    pub fn process_rescue_turn(
        &self,
        session_id: &SessionId,
        rescue_text: &str,
    ) -> Result<TurnEvents, SessionError> {
        let handle = self.store.get(session_id)?;
        let generation = Arc::clone(&self.generation);
        let speech = Arc::clone(&self.speech);
        let audio_dir = self.audio_dir.clone();
        let session_id = session_id.clone();
        let rescue_text = rescue_text.trim().to_string();

        Ok(Box::pin(stream! {
            let mut session = handle.lock().await;

            if rescue_text.is_empty() {
                yield StageEvent::user_sent(session.dominance(), None);
                return;
            }

            session.record(RESCUE_SPEAKER, rescue_text);
            session.touch();
            yield StageEvent::ai_thinking(session.dominance(), Some(generation.model_name()));

            let reply_prompt = prompt::rescue_reply(&session);
            let ai_text = generate_reply(
                generation.as_ref(),
                &session_id,
                &reply_prompt,
                &session.speaker_name,
                RESCUE_FALLBACK_REPLY,
            )
            .await;

            let audio_path = synthesize_reply(
                speech.as_ref(),
                &audio_dir,
                &session_id,
                session.turn_count,
                &ai_text,
                Emotion::Angry,
            )
            .await;

            let speaker_name = session.speaker_name.clone();
            session.record(speaker_name, ai_text.clone());
            session.touch();
            yield StageEvent::complete(
                session.dominance(),
                ai_text,
                audio_path,
                &JudgeVerdict::neutral(),
                None,
            );
        }))
    }
}

/// Generate and clean one reply, substituting `fallback` for any failure
/// or empty result.
async fn generate_reply(
    generation: &dyn GenerationGateway,
    session_id: &SessionId,
    reply_prompt: &str,
    speaker_name: &str,
    fallback: &str,
) -> String {
    let raw = match generation
        .generate(reply_prompt, REPLY_MAX_TOKENS, REPLY_TEMPERATURE)
        .await
    {
        Ok(text) => text,
        Err(err) => {
            warn!(session = %session_id, error = %err, "generation failed, using fallback");
            return fallback.to_string();
        }
    };
    let cleaned = clean_reply(&raw, speaker_name);
    if cleaned.trim().is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Synthesize the reply and write it under the session's audio directory.
///
/// Stage directions are stripped first; an empty remainder skips synthesis.
/// Any failure (synthesis or write) degrades to `None`.
async fn synthesize_reply(
    speech: &dyn SpeechGateway,
    audio_dir: &std::path::Path,
    session_id: &SessionId,
    turn: u32,
    ai_text: &str,
    emotion: Emotion,
) -> Option<PathBuf> {
    let spoken = strip_stage_directions(ai_text);
    if spoken.trim().is_empty() {
        return None;
    }
    let bytes = match speech.synthesize(&spoken, emotion).await {
        Ok(Some(bytes)) if !bytes.is_empty() => bytes,
        Ok(_) => return None,
        Err(err) => {
            warn!(session = %session_id, error = %err, "speech synthesis failed");
            return None;
        }
    };

    let dir = audio_dir.join(session_id.as_str());
    let path = dir.join(format!("turn_{turn}.wav"));
    if let Err(err) = tokio::fs::create_dir_all(&dir).await {
        warn!(session = %session_id, error = %err, "could not create audio directory");
        return None;
    }
    if let Err(err) = tokio::fs::write(&path, &bytes).await {
        warn!(session = %session_id, error = %err, "could not write audio file");
        return None;
    }
    Some(path)
}
