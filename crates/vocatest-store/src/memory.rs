//! In-memory vocabulary store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use vocatest_core::model::{OwnerId, VocabularyEntry};
use vocatest_core::traits::VocabularyStore;

/// A vocabulary store backed by a per-owner table in process memory.
///
/// Backs the CLI (one process, one run) and serves as a deterministic test
/// double for the engine: writes are counted, and failure injection makes
/// every subsequent write return an error.
#[derive(Default)]
pub struct MemoryVocabularyStore {
    /// Per-owner entries, in insertion order.
    entries: Mutex<HashMap<OwnerId, Vec<VocabularyEntry>>>,
    /// Next entry id, unique across owners.
    next_id: AtomicI64,
    /// Number of write operations attempted.
    write_calls: AtomicU32,
    /// When set, every write fails.
    fail_writes: AtomicBool,
}

impl MemoryVocabularyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(word, translation, priority)`
    /// rows for one owner.
    pub fn with_entries(owner: OwnerId, rows: &[(&str, &str, u8)]) -> Self {
        let store = Self::default();
        let mut entries = store.entries.lock().unwrap();
        let list = entries.entry(owner).or_default();
        for (word, translation, priority) in rows {
            let id = store.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            list.push(VocabularyEntry {
                id,
                owner,
                word: (*word).to_string(),
                translation: (*translation).to_string(),
                priority: *priority,
            });
        }
        drop(entries);
        store
    }

    /// Number of write operations attempted so far.
    pub fn write_calls(&self) -> u32 {
        self.write_calls.load(Ordering::Relaxed)
    }

    /// Toggle write-failure injection.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn check_write(&self) -> anyhow::Result<()> {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            anyhow::bail!("vocabulary store is unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl VocabularyStore for MemoryVocabularyStore {
    async fn list_words(&self, owner: OwnerId) -> anyhow::Result<Vec<VocabularyEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_word(
        &self,
        owner: OwnerId,
        word: &str,
    ) -> anyhow::Result<Option<VocabularyEntry>> {
        // Case-insensitive over the full alphabet, not just ASCII: the
        // vocabulary is typically Russian/English mixed.
        let needle = word.to_lowercase();
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&owner)
            .and_then(|list| list.iter().find(|e| e.word.to_lowercase() == needle))
            .cloned())
    }

    async fn add_word(
        &self,
        owner: OwnerId,
        word: &str,
        translation: &str,
        priority: u8,
    ) -> anyhow::Result<VocabularyEntry> {
        self.check_write()?;
        let entry = VocabularyEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            owner,
            word: word.to_string(),
            translation: translation.to_string(),
            priority,
        };
        self.entries
            .lock()
            .unwrap()
            .entry(owner)
            .or_default()
            .push(entry.clone());
        tracing::debug!(owner, word, priority, "word added");
        Ok(entry)
    }

    async fn set_priority(&self, owner: OwnerId, word_id: i64, priority: u8) -> anyhow::Result<()> {
        self.check_write()?;
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .get_mut(&owner)
            .and_then(|list| list.iter_mut().find(|e| e.id == word_id))
            .ok_or_else(|| anyhow::anyhow!("no vocabulary entry with id {word_id}"))?;
        entry.priority = priority;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_list_preserves_insertion_order() {
        let store = MemoryVocabularyStore::new();
        store.add_word(1, "cat", "кот", 3).await.unwrap();
        store.add_word(1, "dog", "собака", 6).await.unwrap();

        let words = store.list_words(1).await.unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].word, "cat");
        assert_eq!(words[1].word, "dog");
        assert_ne!(words[0].id, words[1].id);
    }

    #[tokio::test]
    async fn owners_are_isolated() {
        let store = MemoryVocabularyStore::new();
        store.add_word(1, "cat", "кот", 3).await.unwrap();
        store.add_word(2, "dog", "собака", 6).await.unwrap();

        assert_eq!(store.list_words(1).await.unwrap().len(), 1);
        assert_eq!(store.list_words(2).await.unwrap().len(), 1);
        assert!(store.find_word(2, "cat").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_is_case_insensitive_including_cyrillic() {
        let store = MemoryVocabularyStore::with_entries(1, &[("Cat", "КОТ", 3)]);
        assert!(store.find_word(1, "cat").await.unwrap().is_some());
        assert!(store.find_word(1, "CAT").await.unwrap().is_some());

        let store = MemoryVocabularyStore::with_entries(1, &[("Собака", "dog", 3)]);
        assert!(store.find_word(1, "собака").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn set_priority_rewrites_one_entry() {
        let store = MemoryVocabularyStore::with_entries(1, &[("cat", "кот", 3)]);
        let id = store.find_word(1, "cat").await.unwrap().unwrap().id;
        store.set_priority(1, id, 9).await.unwrap();
        assert_eq!(store.find_word(1, "cat").await.unwrap().unwrap().priority, 9);

        assert!(store.set_priority(1, id + 100, 5).await.is_err());
    }

    #[tokio::test]
    async fn failure_injection_rejects_writes_and_counts_them() {
        let store = MemoryVocabularyStore::with_entries(1, &[("cat", "кот", 3)]);
        store.set_fail_writes(true);

        assert!(store.add_word(1, "dog", "собака", 6).await.is_err());
        let id = store.find_word(1, "cat").await.unwrap().unwrap().id;
        assert!(store.set_priority(1, id, 2).await.is_err());
        assert_eq!(store.write_calls(), 2);

        // Reads still work and reflect no mutation.
        assert_eq!(store.list_words(1).await.unwrap().len(), 1);
        store.set_fail_writes(false);
        assert!(store.set_priority(1, id, 2).await.is_ok());
        assert_eq!(store.write_calls(), 3);
    }
}
