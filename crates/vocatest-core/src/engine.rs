//! Central session engine.
//!
//! Runs one independent [`QuizSession`] per owner, optionally with
//! per-question wall-clock deadlines. All timers run as lightweight sleep
//! tasks on the shared tokio worker pool; the pool size is independent of
//! the number of active sessions.
//!
//! The one genuine concurrent hazard is the race between an owner's answer
//! and the deadline for the same question. It is arbitrated by a single-use
//! atomic claim per timer: only the first of {cancel, fire} to win the
//! compare-and-swap proceeds, and the phase check under the session lock
//! guarantees the question is resolved exactly once. Timeout notices are
//! delivered through a [`SessionEventSink`] off the thread that started the
//! timer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{EngineError, SessionError};
use crate::model::{AnswerLetter, OwnerId, QuestionRecord, SessionSummary};
use crate::session::{AnswerFeedback, ExpiredQuestion, QuizSession};

/// Deadline for answering a question, derived from its point value.
///
/// The default for unknown weights is a safety net, not an error path.
pub fn deadline_for_points(point_value: u32) -> Duration {
    match point_value {
        2 => Duration::from_secs(10),
        3 => Duration::from_secs(20),
        _ => Duration::from_secs(5),
    }
}

/// Sent to the event sink when a question deadline fires unanswered.
#[derive(Debug, Clone)]
pub struct TimeoutNotice {
    /// Index of the expired question within its session.
    pub question_index: usize,
    /// What the user should have answered.
    pub correct_answer: AnswerLetter,
    /// What the question would have been worth.
    pub point_value: u32,
}

/// Consumer of asynchronous session events.
///
/// Answers and advances return their results directly; timeouts originate on
/// a pool task and are pushed through this trait instead.
pub trait SessionEventSink: Send + Sync {
    fn on_question_timeout(&self, owner: OwnerId, notice: &TimeoutNotice);
}

/// Sink that discards all events. Suitable for untimed use.
pub struct NoopSink;

impl SessionEventSink for NoopSink {
    fn on_question_timeout(&self, _: OwnerId, _: &TimeoutNotice) {}
}

/// Result of submitting an answer.
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    /// The answer arrived in time and was scored.
    Scored(AnswerFeedback),
    /// The deadline fired first; the answer was rejected and the question
    /// was already consumed by the timeout.
    TimeExpired {
        correct_answer: AnswerLetter,
        point_value: u32,
    },
}

/// Result of advancing a session.
#[derive(Debug, Clone)]
pub enum SessionProgress {
    /// Display text of the next (or re-issued current) question.
    Next(String),
    /// The session is complete; it has been removed and all its resources
    /// released.
    Finished(SessionSummary),
}

/// A scheduled deadline for the current question of one owner.
///
/// Destroyed exactly once: either by a successful cancellation (the answer
/// arrived first) or by firing. Dropping the handle cancels it, so a removed
/// session can never leak a live timer.
struct TimerHandle {
    question_index: usize,
    claimed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Try to win the claim. Returns `false` if the timer already fired.
    fn cancel(&self) -> bool {
        let won = self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.task.abort();
        }
        won
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        let _ = self.cancel();
    }
}

/// How the current question stands.
enum Phase {
    /// Waiting for the owner's answer (timer outstanding in timed mode).
    AwaitingAnswer,
    /// The question is resolved; waiting for an advance.
    AwaitingAdvance(Resolution),
}

enum Resolution {
    Answered,
    Expired(ExpiredQuestion),
}

struct SessionEntry {
    session: QuizSession,
    timed: bool,
    phase: Phase,
    timer: Option<TimerHandle>,
}

struct EngineInner {
    sessions: Mutex<HashMap<OwnerId, SessionEntry>>,
    sink: Arc<dyn SessionEventSink>,
}

/// The session engine exposed to chat-platform adapters.
///
/// Cheap to clone; all clones share the same session table.
#[derive(Clone)]
pub struct AssessmentEngine {
    inner: Arc<EngineInner>,
}

impl Default for AssessmentEngine {
    fn default() -> Self {
        Self::new(Arc::new(NoopSink))
    }
}

impl AssessmentEngine {
    pub fn new(sink: Arc<dyn SessionEventSink>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                sessions: Mutex::new(HashMap::new()),
                sink,
            }),
        }
    }

    /// Start a session over `questions`, replacing any session the owner
    /// already has (the old timer is cancelled deterministically).
    ///
    /// Returns the first question's display text. An empty question list is
    /// rejected without creating a session.
    pub async fn start_session(
        &self,
        owner: OwnerId,
        questions: Vec<QuestionRecord>,
        timed: bool,
    ) -> Result<String, EngineError> {
        let session = QuizSession::new(owner, questions)?;

        let mut sessions = self.inner.sessions.lock().await;
        if sessions.remove(&owner).is_some() {
            tracing::info!(owner, "replacing an abandoned session");
        }

        let mut entry = SessionEntry {
            session,
            timed,
            phase: Phase::AwaitingAnswer,
            timer: None,
        };
        if timed {
            entry.timer = Some(self.schedule_timer(owner, &entry.session));
        }
        let text = entry.session.current_question_text();
        sessions.insert(owner, entry);
        Ok(text)
    }

    /// Submit an answer for the owner's current question.
    ///
    /// In timed mode this first races the outstanding timer: if the deadline
    /// already fired, the answer is rejected with
    /// [`AnswerOutcome::TimeExpired`] instead of being scored. Exactly one of
    /// {answer scored, timeout processed} occurs per question.
    pub async fn submit_answer(
        &self,
        owner: OwnerId,
        letter: AnswerLetter,
    ) -> Result<AnswerOutcome, EngineError> {
        let mut sessions = self.inner.sessions.lock().await;
        let entry = sessions
            .get_mut(&owner)
            .ok_or(EngineError::SessionNotStarted)?;

        match &entry.phase {
            Phase::AwaitingAdvance(Resolution::Expired(expired)) => {
                // Late answer after an already-delivered timeout.
                return Ok(AnswerOutcome::TimeExpired {
                    correct_answer: expired.correct_answer,
                    point_value: expired.point_value,
                });
            }
            Phase::AwaitingAdvance(Resolution::Answered) => {
                return Err(EngineError::QuestionResolved);
            }
            Phase::AwaitingAnswer => {}
        }

        if let Some(timer) = entry.timer.take() {
            if !timer.cancel() {
                // The deadline won the claim. Resolve the timeout here, under
                // the same lock, so the racing pool task becomes a no-op.
                let notice = resolve_timeout(entry)?;
                let outcome = AnswerOutcome::TimeExpired {
                    correct_answer: notice.correct_answer,
                    point_value: notice.point_value,
                };
                drop(sessions);
                self.inner.sink.on_question_timeout(owner, &notice);
                return Ok(outcome);
            }
        }

        let feedback = entry.session.submit_answer(letter)?;
        entry.phase = Phase::AwaitingAdvance(Resolution::Answered);
        Ok(AnswerOutcome::Scored(feedback))
    }

    /// Move the owner's session forward.
    ///
    /// If the session is complete, returns its summary and releases every
    /// resource it held (map entry and timer, unconditionally). Otherwise
    /// (re-)issues the current question, restarting its timer in timed mode.
    pub async fn advance(&self, owner: OwnerId) -> Result<SessionProgress, EngineError> {
        let mut sessions = self.inner.sessions.lock().await;
        let entry = sessions
            .get_mut(&owner)
            .ok_or(EngineError::SessionNotStarted)?;

        if entry.session.is_complete() {
            let summary = entry.session.summary()?;
            tracing::info!(
                owner,
                session = %summary.session_id,
                score = summary.score,
                percentage = summary.percentage,
                "quiz session finished"
            );
            sessions.remove(&owner);
            return Ok(SessionProgress::Finished(summary));
        }

        entry.phase = Phase::AwaitingAnswer;
        entry.timer = None; // drop cancels any outstanding deadline
        if entry.timed {
            entry.timer = Some(self.schedule_timer(owner, &entry.session));
        }
        Ok(SessionProgress::Next(entry.session.current_question_text()))
    }

    pub async fn is_active(&self, owner: OwnerId) -> bool {
        self.inner.sessions.lock().await.contains_key(&owner)
    }

    /// Abandon the owner's session, cancelling its timer. Returns whether a
    /// session existed.
    pub async fn cancel_session(&self, owner: OwnerId) -> bool {
        let removed = self.inner.sessions.lock().await.remove(&owner).is_some();
        if removed {
            tracing::info!(owner, "quiz session cancelled");
        }
        removed
    }

    /// Schedule the deadline for the session's current question.
    fn schedule_timer(&self, owner: OwnerId, session: &QuizSession) -> TimerHandle {
        let question_index = session.position();
        let duration = session
            .current_question()
            .map(|q| deadline_for_points(q.point_value))
            .unwrap_or_else(|| deadline_for_points(0));
        let claimed = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn({
            let inner = Arc::clone(&self.inner);
            let claimed = Arc::clone(&claimed);
            async move {
                tokio::time::sleep(duration).await;
                if claimed
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // An answer cancelled this deadline first.
                    return;
                }
                fire_timeout(&inner, owner, question_index).await;
            }
        });

        TimerHandle {
            question_index,
            claimed,
            task,
        }
    }
}

/// Timeout path taken on the pool task that won the claim.
async fn fire_timeout(inner: &Arc<EngineInner>, owner: OwnerId, question_index: usize) {
    let notice = {
        let mut sessions = inner.sessions.lock().await;
        let Some(entry) = sessions.get_mut(&owner) else {
            return; // session already cleaned up
        };
        let still_pending = matches!(entry.phase, Phase::AwaitingAnswer)
            && entry.session.position() == question_index
            && entry
                .timer
                .as_ref()
                .map_or(true, |t| t.question_index == question_index);
        if !still_pending {
            // A racing submit already resolved this question on our behalf.
            return;
        }
        match resolve_timeout(entry) {
            Ok(notice) => notice,
            Err(_) => return,
        }
    };

    tracing::debug!(owner, question_index, "question deadline fired");
    inner.sink.on_question_timeout(owner, &notice);
}

/// Consume the current question as expired. Caller must hold the session
/// lock and have established that the question is unresolved.
fn resolve_timeout(entry: &mut SessionEntry) -> Result<TimeoutNotice, SessionError> {
    let question_index = entry.session.position();
    let expired = entry.session.expire_current()?;
    let notice = TimeoutNotice {
        question_index,
        correct_answer: expired.correct_answer,
        point_value: expired.point_value,
    };
    entry.phase = Phase::AwaitingAdvance(Resolution::Expired(expired));
    entry.timer = None;
    Ok(notice)
}
