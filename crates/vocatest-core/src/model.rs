//! Core data model types for vocatest.
//!
//! These are the fundamental types the whole assessment engine uses to
//! represent quiz questions, vocabulary entries, and session results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat-platform user identity. Matches the signed 64-bit ids used by the
/// messaging adapters that sit above this engine.
pub type OwnerId = i64;

/// Lowest possible vocabulary priority ("well known").
pub const PRIORITY_MIN: u8 = 0;
/// Highest possible vocabulary priority ("needs the most review").
pub const PRIORITY_MAX: u8 = 10;

/// One of the four multiple-choice answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    /// Parse a letter from user or generator input.
    ///
    /// Case-insensitive, and tolerant of the Cyrillic lookalikes a user on a
    /// Russian keyboard layout is likely to type (А, В, С, Д).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a' | 'A' | 'А' | 'а' => Some(AnswerLetter::A),
            'b' | 'B' | 'В' | 'в' => Some(AnswerLetter::B),
            'c' | 'C' | 'С' | 'с' => Some(AnswerLetter::C),
            'd' | 'D' | 'Д' | 'д' => Some(AnswerLetter::D),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerLetter::A => write!(f, "A"),
            AnswerLetter::B => write!(f, "B"),
            AnswerLetter::C => write!(f, "C"),
            AnswerLetter::D => write!(f, "D"),
        }
    }
}

impl FromStr for AnswerLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let first = chars.next().ok_or_else(|| "empty answer".to_string())?;
        AnswerLetter::from_char(first).ok_or_else(|| format!("unknown answer letter: {s}"))
    }
}

/// Whether a question targets a word already in the review queue or a word
/// the user has not been tested on before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordKind {
    Priority,
    #[default]
    New,
}

impl fmt::Display for WordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordKind::Priority => write!(f, "priority"),
            WordKind::New => write!(f, "new"),
        }
    }
}

impl FromStr for WordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" | "приоритетное" | "приоритет" => Ok(WordKind::Priority),
            "new" | "новое" => Ok(WordKind::New),
            other => Err(format!("unknown word kind: {other}")),
        }
    }
}

/// A single quiz question produced by the text parser. Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Display-ready question stem plus the four answer options.
    pub question_text: String,
    /// The correct option.
    pub correct_answer: AnswerLetter,
    /// Caller-defined weight; also drives the per-question deadline in timed mode.
    pub point_value: u32,
    /// Review-queue word or first-exposure word.
    #[serde(default)]
    pub word_kind: WordKind,
    /// The vocabulary word this question tests.
    pub word: String,
    /// Its translation.
    pub translation: String,
}

/// A (word, translation) pair, as routed into the session outcome buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    pub word: String,
    pub translation: String,
}

impl WordPair {
    pub fn new(word: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
        }
    }
}

/// Per-session classification of every answered question by
/// (correct/incorrect) x (priority-word/new-word). Used to batch-update the
/// vocabulary store once the session completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeBuckets {
    pub priority_correct: Vec<WordPair>,
    pub priority_wrong: Vec<WordPair>,
    pub new_correct: Vec<WordPair>,
    pub new_wrong: Vec<WordPair>,
}

impl OutcomeBuckets {
    /// Route one answered question into exactly one bucket.
    pub fn record(&mut self, kind: WordKind, correct: bool, pair: WordPair) {
        match (kind, correct) {
            (WordKind::Priority, true) => self.priority_correct.push(pair),
            (WordKind::Priority, false) => self.priority_wrong.push(pair),
            (WordKind::New, true) => self.new_correct.push(pair),
            (WordKind::New, false) => self.new_wrong.push(pair),
        }
    }

    /// Number of correctly answered questions.
    pub fn correct_count(&self) -> usize {
        self.priority_correct.len() + self.new_correct.len()
    }

    /// Total questions recorded across all four buckets.
    pub fn total(&self) -> usize {
        self.correct_count() + self.priority_wrong.len() + self.new_wrong.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate all recorded pairs with their correctness flag.
    pub fn iter_outcomes(&self) -> impl Iterator<Item = (&WordPair, bool)> {
        self.priority_correct
            .iter()
            .chain(self.new_correct.iter())
            .map(|p| (p, true))
            .chain(
                self.priority_wrong
                    .iter()
                    .chain(self.new_wrong.iter())
                    .map(|p| (p, false)),
            )
    }
}

/// A vocabulary word as stored by the vocabulary-store collaborator.
///
/// The engine consumes and updates these records but does not own their
/// persistence. `priority` is always within `[PRIORITY_MIN, PRIORITY_MAX]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: i64,
    pub owner: OwnerId,
    pub word: String,
    pub translation: String,
    pub priority: u8,
}

/// Performance tier of a completed session.
///
/// The thresholds (80, 50) and their evaluation order are contractual: the
/// excellent tier is checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Developing,
}

impl PerformanceTier {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 80 {
            PerformanceTier::Excellent
        } else if percentage >= 50 {
            PerformanceTier::Good
        } else {
            PerformanceTier::Developing
        }
    }

    /// Short encouragement line shown alongside the raw score.
    pub fn message(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Excellent work! Your vocabulary is in great shape.",
            PerformanceTier::Good => "Good result! Keep reviewing and it will stick.",
            PerformanceTier::Developing => "Still developing. These words will come back soon.",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceTier::Excellent => write!(f, "excellent"),
            PerformanceTier::Good => write!(f, "good"),
            PerformanceTier::Developing => write!(f, "developing"),
        }
    }
}

/// Final result of a completed quiz session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session id, for correlating log lines.
    pub session_id: uuid::Uuid,
    /// Sum of point values of correctly answered questions.
    pub score: u32,
    /// Sum of point values of all questions.
    pub total_points: u32,
    /// Correctly answered question count.
    pub correct: usize,
    /// Total question count.
    pub total: usize,
    /// `100 * correct / total`, integer truncation.
    pub percentage: u32,
    pub tier: PerformanceTier,
    pub buckets: OutcomeBuckets,
    pub started_at: chrono::DateTime<chrono::Utc>,
}
