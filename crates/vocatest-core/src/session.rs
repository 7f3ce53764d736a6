//! Quiz session state machine.
//!
//! One [`QuizSession`] is an owner's sequential traversal of a fixed question
//! list: ACTIVE while questions remain, COMPLETE once the index reaches the
//! end. Sessions are created when a quiz starts, mutated only by
//! [`QuizSession::submit_answer`] / [`QuizSession::expire_current`], and
//! discarded after the summary is delivered.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{
    AnswerLetter, OutcomeBuckets, OwnerId, PerformanceTier, QuestionRecord, SessionSummary,
    WordPair,
};

/// Shown in place of a question once the session is complete.
const COMPLETE_PLACEHOLDER: &str = "The quiz is finished.";

/// Feedback for one scored answer.
#[derive(Debug, Clone)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: AnswerLetter,
    /// Points added to the score (zero when incorrect).
    pub points_awarded: u32,
}

/// What an expired question would have been worth. Reported to the user
/// without touching the score.
#[derive(Debug, Clone)]
pub struct ExpiredQuestion {
    pub correct_answer: AnswerLetter,
    pub point_value: u32,
}

/// An owner's in-progress traversal of an ordered question list.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    owner: OwnerId,
    questions: Vec<QuestionRecord>,
    current: usize,
    score: u32,
    correct_count: usize,
    buckets: OutcomeBuckets,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Create a session over a non-empty question list.
    ///
    /// A zero-question list is a caller-facing precondition failure, not a
    /// runtime state.
    pub fn new(owner: OwnerId, questions: Vec<QuestionRecord>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }
        let session = Self {
            id: Uuid::new_v4(),
            owner,
            questions,
            current: 0,
            score: 0,
            correct_count: 0,
            buckets: OutcomeBuckets::default(),
            started_at: Utc::now(),
        };
        tracing::info!(
            session = %session.id,
            owner = session.owner,
            questions = session.questions.len(),
            "quiz session started"
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Zero-based index of the question awaiting resolution.
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty lists, so a session always has questions.
        false
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.current == self.questions.len()
    }

    /// The question awaiting resolution, if any.
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.current)
    }

    /// Display text for the current question, always carrying the
    /// "Question i of N" position header.
    pub fn current_question_text(&self) -> String {
        match self.current_question() {
            Some(q) => format!(
                "Question {} of {}:\n\n{}",
                self.current + 1,
                self.questions.len(),
                q.question_text
            ),
            None => COMPLETE_PLACEHOLDER.to_string(),
        }
    }

    /// Score an answer to the current question and advance.
    ///
    /// Routes the word into exactly one outcome bucket, adds the point value
    /// iff correct, and consumes the question.
    pub fn submit_answer(&mut self, letter: AnswerLetter) -> Result<AnswerFeedback, SessionError> {
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::AlreadyComplete)?;

        let correct = letter == question.correct_answer;
        let points_awarded = if correct { question.point_value } else { 0 };
        let feedback = AnswerFeedback {
            correct,
            correct_answer: question.correct_answer,
            points_awarded,
        };

        self.buckets.record(
            question.word_kind,
            correct,
            WordPair::new(question.word.clone(), question.translation.clone()),
        );
        self.score += points_awarded;
        if correct {
            self.correct_count += 1;
        }
        self.current += 1;

        tracing::debug!(
            session = %self.id,
            position = self.current,
            correct,
            score = self.score,
            "answer recorded"
        );
        Ok(feedback)
    }

    /// Consume the current question as if it had been answered incorrectly,
    /// without awarding points. This is the timeout path: the question still
    /// counts toward completion, never toward the score.
    pub fn expire_current(&mut self) -> Result<ExpiredQuestion, SessionError> {
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::AlreadyComplete)?;

        let expired = ExpiredQuestion {
            correct_answer: question.correct_answer,
            point_value: question.point_value,
        };
        self.buckets.record(
            question.word_kind,
            false,
            WordPair::new(question.word.clone(), question.translation.clone()),
        );
        self.current += 1;

        tracing::debug!(session = %self.id, position = self.current, "question expired");
        Ok(expired)
    }

    /// Final result; valid only once every question is consumed.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::NotComplete);
        }

        let total = self.questions.len();
        debug_assert_eq!(self.correct_count, self.buckets.correct_count());
        let percentage = (100 * self.correct_count as u32) / total as u32;

        Ok(SessionSummary {
            session_id: self.id,
            score: self.score,
            total_points: self.questions.iter().map(|q| q.point_value).sum(),
            correct: self.correct_count,
            total,
            percentage,
            tier: PerformanceTier::from_percentage(percentage),
            buckets: self.buckets.clone(),
            started_at: self.started_at,
        })
    }
}
