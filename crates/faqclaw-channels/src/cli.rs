//! Terminal channel — one conversation on stdin/stdout.

use async_trait::async_trait;
use faqclaw_core::error::{FaqClawError, Result};
use faqclaw_core::traits::Channel;
use faqclaw_core::types::{IncomingMessage, OutgoingMessage, ThreadType};
use futures::stream::Stream;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;

pub const CLI_THREAD: &str = "cli";

pub struct CliChannel {
    sender_id: String,
    /// Where document replies are written.
    output_dir: PathBuf,
    connected: bool,
}

impl CliChannel {
    pub fn new() -> Self {
        Self::with_output_dir(PathBuf::from("."))
    }

    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sender_id: uuid::Uuid::new_v4().to_string(),
            output_dir: output_dir.into(),
            connected: false,
        }
    }

    fn incoming(&self, line: String) -> IncomingMessage {
        IncomingMessage {
            channel: "cli".into(),
            thread_id: CLI_THREAD.into(),
            sender_id: self.sender_id.clone(),
            sender_name: None,
            content: line,
            thread_type: ThreadType::Direct,
            timestamp: chrono::Utc::now(),
            reply_to: None,
        }
    }

    /// Write a document reply to the output directory, returning its path.
    pub fn save_document(&self, filename: &str, content: &[u8]) -> Result<PathBuf> {
        let name = std::path::Path::new(filename)
            .file_name()
            .ok_or_else(|| FaqClawError::Channel(format!("Invalid file name: {filename}")))?;
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        println!("💬 FaqClaw: scrivi una domanda (/help per i comandi, Ctrl+D per uscire)");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        match message.attachment {
            Some(attachment) => {
                let path = self.save_document(&attachment.filename, &attachment.content)?;
                println!("{}\n📎 {}", message.content, path.display());
            }
            None => println!("{}", message.content),
        }
        print!("> ");
        std::io::stdout().flush()?;
        Ok(())
    }

    async fn listen(&self) -> Result<Box<dyn Stream<Item = IncomingMessage> + Send + Unpin>> {
        let template = self.incoming(String::new());
        print!("> ");
        std::io::stdout().flush()?;

        let stream = async_stream::stream! {
            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let mut msg = template.clone();
                        msg.content = line;
                        msg.timestamp = chrono::Utc::now();
                        yield msg;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("stdin read error: {e}");
                        break;
                    }
                }
            }
        };
        Ok(Box::new(Box::pin(stream)))
    }
}
