//! Channel abstraction shared by every transport.

use async_trait::async_trait;
use futures::stream::Stream;

use crate::error::Result;
use crate::types::{IncomingMessage, OutgoingMessage};

/// A messaging transport (Telegram, terminal, ...).
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    async fn connect(&mut self) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Deliver one message (text or document).
    async fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Typing indicator; channels without one ignore it.
    async fn send_typing(&self, _thread_id: &str) -> Result<()> {
        Ok(())
    }

    /// Stream of incoming messages. Ends when the transport closes.
    async fn listen(&self) -> Result<Box<dyn Stream<Item = IncomingMessage> + Send + Unpin>>;
}
