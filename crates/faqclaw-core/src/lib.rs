//! # FaqClaw Core
//! Shared building blocks for every FaqClaw crate: the error type,
//! configuration, channel message types and the `Channel` trait.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::FaqClawConfig;
pub use error::{FaqClawError, Result};
