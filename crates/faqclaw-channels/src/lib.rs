//! # FaqClaw Channels
//! Transports that feed the conversation engine.
//!
//! - **telegram** — Bot API long polling, text replies, backup documents
//! - **cli** — one interactive session on stdin/stdout

pub mod cli;
pub mod telegram;

pub use cli::CliChannel;
pub use telegram::TelegramChannel;
