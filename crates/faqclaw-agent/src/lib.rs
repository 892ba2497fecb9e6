//! # FaqClaw Agent
//! The conversation engine: turns each incoming message into replies and
//! knowledge store updates.
//!
//! ## Pieces
//! - **commands** — slash command vocabulary with Italian/English aliases
//! - **session** — per-user `SessionState` machine and numbered listings
//! - **engine** — `ConversationEngine::handle`, the single entry point
//! - **quiz** — seeded or entropy-backed random question picker
//! - **replies** — reply type and line-aware chunking for long texts
//! - **lookup** — `/cerca` topic summaries behind the `TopicLookup` trait

pub mod commands;
pub mod engine;
pub mod lookup;
pub mod quiz;
pub mod replies;
pub mod session;

pub use commands::Command;
pub use engine::ConversationEngine;
pub use lookup::{DisabledLookup, TopicLookup, TopicSummary, WikipediaLookup};
pub use quiz::QuizPicker;
pub use replies::{Reply, chunk_reply};
pub use session::{Session, SessionState};
