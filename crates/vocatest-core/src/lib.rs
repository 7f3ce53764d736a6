//! vocatest-core — Assessment engine for vocabulary quizzes.
//!
//! This crate defines the data model, the generator-text parser, the quiz
//! session state machine with per-question deadlines, and the
//! spaced-repetition priority scheduler that the rest of vocatest builds on.

pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod scheduler;
pub mod session;
pub mod traits;
