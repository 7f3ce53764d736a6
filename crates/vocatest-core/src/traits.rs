//! Vocabulary store abstraction.
//!
//! The engine reads and reprioritizes vocabulary through this trait; actual
//! persistence (a bot database, a file, an in-memory table for tests) lives
//! behind it.

use async_trait::async_trait;

use crate::model::{OwnerId, VocabularyEntry};

/// Per-owner vocabulary persistence.
///
/// Implementations must keep `priority` within the model bounds; the
/// scheduler clamps before every write but stored data is trusted on read.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// All vocabulary entries of one owner, in storage order.
    async fn list_words(&self, owner: OwnerId) -> anyhow::Result<Vec<VocabularyEntry>>;

    /// Look up one word (case-insensitive) for an owner.
    async fn find_word(&self, owner: OwnerId, word: &str)
        -> anyhow::Result<Option<VocabularyEntry>>;

    /// Insert a word with an initial priority.
    async fn add_word(
        &self,
        owner: OwnerId,
        word: &str,
        translation: &str,
        priority: u8,
    ) -> anyhow::Result<VocabularyEntry>;

    /// Overwrite the priority of an existing entry.
    async fn set_priority(&self, owner: OwnerId, word_id: i64, priority: u8) -> anyhow::Result<()>;
}
