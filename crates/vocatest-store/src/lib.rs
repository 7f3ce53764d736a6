//! vocatest-store — Vocabulary store implementations.
//!
//! Backends for the [`vocatest_core::traits::VocabularyStore`] trait. The
//! in-memory store backs the CLI and doubles as a deterministic test double,
//! with write counting and failure injection.

pub mod memory;

pub use memory::MemoryVocabularyStore;
