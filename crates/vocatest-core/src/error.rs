//! Engine error types.
//!
//! The split matters for callers: `ParseError` is a hard failure of strict
//! single-question parsing, while `EngineError` variants are recoverable
//! user-input conditions the chat layer turns into plain replies.

use thiserror::Error;

/// Errors from strict single-question parsing.
///
/// Best-effort list parsing never returns these; malformed blocks there are
/// skipped instead.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The generated text has no answer marker, so no correct option can be
    /// determined. The caller must not proceed with a guessed answer.
    #[error("generated question has no answer marker")]
    MissingAnswerMarker,

    /// An answer marker was present but what follows is not one of A-D.
    #[error("unusable answer letter after marker: {0:?}")]
    InvalidAnswerLetter(String),
}

/// Errors from the quiz session state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Zero-question lists must not create a session.
    #[error("a quiz needs at least one question")]
    EmptyQuiz,

    /// `submit_answer` on a session that already consumed every question.
    #[error("the quiz is already complete")]
    AlreadyComplete,

    /// `summary` before the last question was consumed.
    #[error("the quiz is still in progress")]
    NotComplete,
}

/// Errors surfaced by the session engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No active session for this owner. Recoverable: tell the user to
    /// start a test first.
    #[error("no active quiz for this user, start a test first")]
    SessionNotStarted,

    /// The current question is already resolved (answered or timed out);
    /// the session is waiting for an advance.
    #[error("this question is already resolved, advance to the next one")]
    QuestionResolved,

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl EngineError {
    /// Returns `true` when the error is an ordinary user-input condition
    /// rather than a misuse of the API.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::SessionNotStarted | EngineError::QuestionResolved
        )
    }
}
