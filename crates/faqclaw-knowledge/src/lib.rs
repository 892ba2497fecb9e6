//! # FaqClaw Knowledge
//!
//! Question/answer records and everything that reads them.
//!
//! ## Design
//! - **KnowledgeBase** — ordered records, case-insensitive unique questions
//! - **KnowledgeStore** — owns the base, every mutation persists immediately
//! - **Persistence** — JSON flat file (default) or SQLite, swappable via trait
//! - **Matcher** — substring scoring first, Ratcliff/Obershelp fuzzy fallback
//! - **Formatter** — renders `Sintesi:` / `Approfondimento:` tagged answers
//!
//! ## How a question is answered
//! ```text
//! "cos'è il tuel?"
//!   ↓ Matcher::find_best_match
//! Phase 1: 5·[in question] + 3·[in answers] − len/200   → best > 0 ?
//!   ↓ no
//! Phase 2: similarity ratio ≥ cutoff                     → best ?
//!   ↓
//! record.answers → format_answers → reply text
//! ```

pub mod formatter;
pub mod matcher;
pub mod persistence;
pub mod record;
pub mod similarity;
pub mod sqlite;
pub mod store;
pub mod tags;

pub use formatter::format_answers;
pub use matcher::Matcher;
pub use persistence::{JsonFileStore, KnowledgePersistence, MemoryPersistence};
pub use record::{KnowledgeBase, QuestionRecord};
pub use sqlite::SqliteStore;
pub use store::{AppendOutcome, KnowledgeStore, SharedStore};
pub use tags::{AnswerTag, TaggedAnswers};
