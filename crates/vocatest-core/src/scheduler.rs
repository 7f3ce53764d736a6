//! Spaced-repetition priority scheduling.
//!
//! Priorities are integers in `[PRIORITY_MIN, PRIORITY_MAX]`: higher means
//! "needs more review". The scheduler selects words to test and nudges
//! priorities after each answer; all persistence goes through the
//! [`VocabularyStore`] collaborator.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::model::{OutcomeBuckets, OwnerId, VocabularyEntry, PRIORITY_MAX, PRIORITY_MIN};
use crate::traits::VocabularyStore;

/// Seed priority for a word first answered correctly: moderately reviewable.
const SEED_CORRECT: u8 = 3;
/// Seed priority for a word first answered incorrectly: resurfaces soon.
const SEED_WRONG: u8 = 6;

/// Result of one priority adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorityChange {
    /// The word existed; its priority moved (or stayed at a clamp bound).
    Updated { word_id: i64, from: u8, to: u8 },
    /// The word was not in the store and was inserted with a seed priority.
    Seeded { word_id: i64, priority: u8 },
}

/// Tally of a batch of post-session priority updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeApplication {
    pub applied: usize,
    pub failed: usize,
}

/// Selection and adjustment over one owner's vocabulary.
#[derive(Clone)]
pub struct PriorityScheduler {
    store: Arc<dyn VocabularyStore>,
}

impl PriorityScheduler {
    pub fn new(store: Arc<dyn VocabularyStore>) -> Self {
        Self { store }
    }

    /// Pick one word at the minimum priority, uniformly at random among ties.
    ///
    /// Randomizing the tie-break keeps review varied when several words share
    /// the minimum. Returns `None` for an owner with no vocabulary.
    pub async fn select_lowest_priority_word(
        &self,
        owner: OwnerId,
    ) -> anyhow::Result<Option<VocabularyEntry>> {
        let words = self.store.list_words(owner).await?;
        let Some(min) = words.iter().map(|w| w.priority).min() else {
            return Ok(None);
        };
        let ties: Vec<&VocabularyEntry> = words.iter().filter(|w| w.priority == min).collect();
        Ok(ties.choose(&mut rand::thread_rng()).map(|w| (*w).clone()))
    }

    /// Up to `k` words with the highest priorities, sorted descending.
    ///
    /// Ties keep their storage order. Unlike the lowest-priority selector
    /// this is deterministic, so repeated test-generation prompts for the
    /// same vocabulary stay reproducible.
    pub async fn select_top_priority_words(
        &self,
        owner: OwnerId,
        k: usize,
    ) -> anyhow::Result<Vec<VocabularyEntry>> {
        let mut words = self.store.list_words(owner).await?;
        words.sort_by(|a, b| b.priority.cmp(&a.priority));
        words.truncate(k);
        Ok(words)
    }

    /// Move a word's priority one step after an answer, clamped to the
    /// `[PRIORITY_MIN, PRIORITY_MAX]` bounds.
    ///
    /// A word not yet in the store is inserted with an asymmetric seed:
    /// moderate after a correct first exposure, high after a miss.
    pub async fn adjust_priority(
        &self,
        owner: OwnerId,
        word: &str,
        translation: &str,
        was_correct: bool,
    ) -> anyhow::Result<PriorityChange> {
        match self.store.find_word(owner, word).await? {
            Some(entry) => {
                let to = if was_correct {
                    entry.priority.saturating_sub(1).max(PRIORITY_MIN)
                } else {
                    entry.priority.saturating_add(1).min(PRIORITY_MAX)
                };
                self.store.set_priority(owner, entry.id, to).await?;
                tracing::debug!(owner, word, from = entry.priority, to, "priority adjusted");
                Ok(PriorityChange::Updated {
                    word_id: entry.id,
                    from: entry.priority,
                    to,
                })
            }
            None => {
                let seed = if was_correct { SEED_CORRECT } else { SEED_WRONG };
                let entry = self.store.add_word(owner, word, translation, seed).await?;
                tracing::debug!(owner, word, priority = seed, "word seeded");
                Ok(PriorityChange::Seeded {
                    word_id: entry.id,
                    priority: seed,
                })
            }
        }
    }

    /// Apply a completed session's outcome buckets to the store.
    ///
    /// Strictly best-effort: a failed write is logged and counted, never
    /// propagated, and never touches the already-delivered score.
    pub async fn apply_outcomes(
        &self,
        owner: OwnerId,
        buckets: &OutcomeBuckets,
    ) -> OutcomeApplication {
        let mut tally = OutcomeApplication::default();
        for (pair, correct) in buckets.iter_outcomes() {
            match self
                .adjust_priority(owner, &pair.word, &pair.translation, correct)
                .await
            {
                Ok(_) => tally.applied += 1,
                Err(err) => {
                    tracing::warn!(owner, word = %pair.word, error = %err, "priority update failed");
                    tally.failed += 1;
                }
            }
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WordPair;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Mutex;

    /// In-memory store for scheduler tests, with a write-failure toggle.
    #[derive(Default)]
    struct TestStore {
        entries: Mutex<Vec<VocabularyEntry>>,
        next_id: AtomicI64,
        fail_writes: AtomicBool,
    }

    impl TestStore {
        fn seeded(words: &[(&str, &str, u8)]) -> Self {
            let store = Self::default();
            {
                let mut entries = store.entries.lock().unwrap();
                for (word, translation, priority) in words {
                    let id = store.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                    entries.push(VocabularyEntry {
                        id,
                        owner: 1,
                        word: (*word).into(),
                        translation: (*translation).into(),
                        priority: *priority,
                    });
                }
            }
            store
        }

        fn priority_of(&self, word: &str) -> u8 {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.word == word)
                .map(|e| e.priority)
                .unwrap()
        }
    }

    #[async_trait]
    impl VocabularyStore for TestStore {
        async fn list_words(&self, owner: OwnerId) -> anyhow::Result<Vec<VocabularyEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.owner == owner)
                .cloned()
                .collect())
        }

        async fn find_word(
            &self,
            owner: OwnerId,
            word: &str,
        ) -> anyhow::Result<Option<VocabularyEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.owner == owner && e.word.eq_ignore_ascii_case(word))
                .cloned())
        }

        async fn add_word(
            &self,
            owner: OwnerId,
            word: &str,
            translation: &str,
            priority: u8,
        ) -> anyhow::Result<VocabularyEntry> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("store unavailable");
            }
            let entry = VocabularyEntry {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                owner,
                word: word.into(),
                translation: translation.into(),
                priority,
            };
            self.entries.lock().unwrap().push(entry.clone());
            Ok(entry)
        }

        async fn set_priority(
            &self,
            owner: OwnerId,
            word_id: i64,
            priority: u8,
        ) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("store unavailable");
            }
            let mut entries = self.entries.lock().unwrap();
            let entry = entries
                .iter_mut()
                .find(|e| e.owner == owner && e.id == word_id)
                .ok_or_else(|| anyhow::anyhow!("no such word id {word_id}"))?;
            entry.priority = priority;
            Ok(())
        }
    }

    fn scheduler(store: TestStore) -> (PriorityScheduler, Arc<TestStore>) {
        let store = Arc::new(store);
        (PriorityScheduler::new(store.clone()), store)
    }

    #[tokio::test]
    async fn lowest_priority_selection_is_empty_for_no_vocabulary() {
        let (scheduler, _) = scheduler(TestStore::default());
        assert_eq!(scheduler.select_lowest_priority_word(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lowest_priority_selection_finds_the_true_minimum() {
        let (scheduler, _) = scheduler(TestStore::seeded(&[
            ("cat", "кот", 4),
            ("dog", "собака", 2),
            ("sun", "солнце", 7),
        ]));
        let chosen = scheduler
            .select_lowest_priority_word(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chosen.word, "dog");
        assert_eq!(chosen.priority, 2);
    }

    #[tokio::test]
    async fn lowest_priority_ties_are_randomized() {
        let (scheduler, _) = scheduler(TestStore::seeded(&[
            ("cat", "кот", 1),
            ("dog", "собака", 1),
            ("sun", "солнце", 1),
            ("moon", "луна", 5),
        ]));
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let chosen = scheduler
                .select_lowest_priority_word(1)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(chosen.priority, 1);
            seen.insert(chosen.word);
        }
        // 200 draws over three uniform ties miss one with probability ~1e-35.
        assert_eq!(seen.len(), 3, "tie-break never picked: {seen:?}");
    }

    #[tokio::test]
    async fn top_k_is_descending_and_stable_on_ties() {
        let (scheduler, _) = scheduler(TestStore::seeded(&[
            ("cat", "кот", 5),
            ("dog", "собака", 9),
            ("sun", "солнце", 5),
            ("moon", "луна", 2),
        ]));
        let top = scheduler.select_top_priority_words(1, 3).await.unwrap();
        let words: Vec<&str> = top.iter().map(|w| w.word.as_str()).collect();
        // "cat" precedes "sun": equal priorities keep storage order.
        assert_eq!(words, ["dog", "cat", "sun"]);
    }

    #[tokio::test]
    async fn top_k_larger_than_vocabulary_returns_everything() {
        let (scheduler, _) = scheduler(TestStore::seeded(&[
            ("cat", "кот", 5),
            ("dog", "собака", 9),
        ]));
        let top = scheduler.select_top_priority_words(1, 10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].word, "dog");
    }

    #[tokio::test]
    async fn correct_answer_at_the_floor_stays_clamped() {
        let (scheduler, store) = scheduler(TestStore::seeded(&[("cat", "кот", 0)]));
        let change = scheduler.adjust_priority(1, "cat", "кот", true).await.unwrap();
        assert!(matches!(change, PriorityChange::Updated { from: 0, to: 0, .. }));
        assert_eq!(store.priority_of("cat"), 0);
    }

    #[tokio::test]
    async fn wrong_answer_at_the_ceiling_stays_clamped() {
        let (scheduler, store) = scheduler(TestStore::seeded(&[("cat", "кот", 10)]));
        let change = scheduler
            .adjust_priority(1, "cat", "кот", false)
            .await
            .unwrap();
        assert!(matches!(change, PriorityChange::Updated { from: 10, to: 10, .. }));
        assert_eq!(store.priority_of("cat"), 10);
    }

    #[tokio::test]
    async fn adjustment_moves_one_step_inside_the_bounds() {
        let (scheduler, store) = scheduler(TestStore::seeded(&[("cat", "кот", 5)]));
        scheduler.adjust_priority(1, "cat", "кот", true).await.unwrap();
        assert_eq!(store.priority_of("cat"), 4);
        scheduler.adjust_priority(1, "cat", "кот", false).await.unwrap();
        scheduler.adjust_priority(1, "cat", "кот", false).await.unwrap();
        assert_eq!(store.priority_of("cat"), 6);
    }

    #[tokio::test]
    async fn unknown_words_are_seeded_asymmetrically() {
        let (scheduler, store) = scheduler(TestStore::default());
        let change = scheduler.adjust_priority(1, "cat", "кот", true).await.unwrap();
        assert!(matches!(change, PriorityChange::Seeded { priority: 3, .. }));
        let change = scheduler
            .adjust_priority(1, "dog", "собака", false)
            .await
            .unwrap();
        assert!(matches!(change, PriorityChange::Seeded { priority: 6, .. }));
        assert_eq!(store.priority_of("cat"), 3);
        assert_eq!(store.priority_of("dog"), 6);
    }

    #[tokio::test]
    async fn outcome_application_is_best_effort() {
        let (scheduler, store) = scheduler(TestStore::seeded(&[("cat", "кот", 5)]));
        let mut buckets = OutcomeBuckets::default();
        buckets.record(
            crate::model::WordKind::Priority,
            true,
            WordPair::new("cat", "кот"),
        );
        buckets.record(
            crate::model::WordKind::New,
            false,
            WordPair::new("dog", "собака"),
        );

        let tally = scheduler.apply_outcomes(1, &buckets).await;
        assert_eq!(tally, OutcomeApplication { applied: 2, failed: 0 });
        assert_eq!(store.priority_of("cat"), 4);
        assert_eq!(store.priority_of("dog"), 6);

        store.fail_writes.store(true, Ordering::SeqCst);
        let tally = scheduler.apply_outcomes(1, &buckets).await;
        // Both writes fail, neither aborts the batch.
        assert_eq!(tally, OutcomeApplication { applied: 0, failed: 2 });
    }
}
