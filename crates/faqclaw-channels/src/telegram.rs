//! Telegram Bot channel — long polling + message sending via Bot API.

use async_trait::async_trait;
use faqclaw_core::config::TelegramChannelConfig;
use faqclaw_core::error::{FaqClawError, Result};
use faqclaw_core::traits::Channel;
use faqclaw_core::types::{Attachment, IncomingMessage, OutgoingMessage, ThreadType};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

const API_BASE: &str = "https://api.telegram.org";
/// Seconds Telegram holds a `getUpdates` request open.
const LONG_POLL_TIMEOUT: u64 = 30;
const ERROR_BACKOFF_SECS: u64 = 5;

/// Telegram Bot channel with polling loop.
pub struct TelegramChannel {
    config: TelegramChannelConfig,
    client: reqwest::Client,
    connected: bool,
}

impl TelegramChannel {
    pub fn new(config: TelegramChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            connected: false,
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.config.bot_token, method)
    }

    /// Send a plain text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| FaqClawError::Channel(format!("sendMessage failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| FaqClawError::Channel(format!("Invalid send response: {e}")))?;

        if !result.ok {
            return Err(FaqClawError::Channel(format!(
                "Send failed: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Upload a file as a document message.
    pub async fn send_document(
        &self,
        chat_id: i64,
        attachment: Attachment,
        caption: &str,
    ) -> Result<()> {
        let part = reqwest::multipart::Part::bytes(attachment.content)
            .file_name(attachment.filename)
            .mime_str("application/json")
            .map_err(|e| FaqClawError::Channel(format!("Invalid document part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| FaqClawError::Channel(format!("sendDocument failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| FaqClawError::Channel(format!("Invalid sendDocument response: {e}")))?;

        if !result.ok {
            return Err(FaqClawError::Channel(format!(
                "Document upload failed: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Send typing indicator.
    pub async fn send_chat_action(&self, chat_id: i64) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": "typing",
        });
        let _ = self
            .client
            .post(self.api_url("sendChatAction"))
            .json(&body)
            .send()
            .await;
        Ok(())
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| FaqClawError::Channel(format!("getMe failed: {e}")))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| FaqClawError::Channel(format!("Invalid getMe response: {e}")))?;
        body.result
            .ok_or_else(|| FaqClawError::Channel("No bot info".into()))
    }

    /// Spawn the polling loop — returns a stream of IncomingMessages.
    pub fn start_polling(&self) -> TelegramPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut poller = Poller {
            client: self.client.clone(),
            config: self.config.clone(),
            last_update_id: 0,
        };

        tokio::spawn(async move {
            tracing::info!("Telegram polling loop started");

            loop {
                match poller.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            let Some(msg) = update.to_incoming() else {
                                continue;
                            };
                            if !poller.is_allowed(&msg.thread_id) {
                                tracing::debug!("Ignoring chat {} (not allowed)", msg.thread_id);
                                continue;
                            }
                            if tx.send(msg).is_err() {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(tokio::time::Duration::from_secs(ERROR_BACKOFF_SECS))
                            .await;
                    }
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(
                    poller.config.poll_interval,
                ))
                .await;
            }
        });

        TelegramPollingStream { rx }
    }
}

fn api_url(token: &str, method: &str) -> String {
    format!("{API_BASE}/bot{token}/{method}")
}

/// State owned by the background polling task.
struct Poller {
    client: reqwest::Client,
    config: TelegramChannelConfig,
    last_update_id: i64,
}

impl Poller {
    /// Get updates using long polling.
    async fn get_updates(&mut self) -> Result<Vec<TelegramUpdate>> {
        let response = self
            .client
            .get(api_url(&self.config.bot_token, "getUpdates"))
            .query(&[
                ("offset", (self.last_update_id + 1).to_string()),
                ("timeout", LONG_POLL_TIMEOUT.to_string()),
                ("allowed_updates", "[\"message\"]".into()),
            ])
            .send()
            .await
            .map_err(|e| FaqClawError::Channel(format!("Telegram getUpdates failed: {e}")))?;

        let body: TelegramApiResponse<Vec<TelegramUpdate>> = response
            .json()
            .await
            .map_err(|e| FaqClawError::Channel(format!("Invalid Telegram response: {e}")))?;

        if !body.ok {
            return Err(FaqClawError::Channel(format!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            )));
        }

        let updates = body.result.unwrap_or_default();
        if let Some(last) = updates.last() {
            self.last_update_id = last.update_id;
        }
        Ok(updates)
    }

    fn is_allowed(&self, chat_id: &str) -> bool {
        is_chat_allowed(&self.config.allowed_chat_ids, chat_id)
    }
}

/// Empty allowlist accepts every chat.
pub fn is_chat_allowed(allowed: &[i64], chat_id: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }
    chat_id
        .parse::<i64>()
        .map(|id| allowed.contains(&id))
        .unwrap_or(false)
}

/// Stream of incoming Telegram messages from polling.
pub struct TelegramPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<IncomingMessage>,
}

impl Stream for TelegramPollingStream {
    type Item = IncomingMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&mut self) -> Result<()> {
        if self.config.bot_token.is_empty() {
            return Err(FaqClawError::Config("Telegram bot token missing".into()));
        }
        let me = self.get_me().await?;
        tracing::info!(
            "Telegram bot: @{} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name
        );
        self.connected = true;
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
        let chat_id: i64 = message
            .thread_id
            .parse()
            .map_err(|_| FaqClawError::Channel("Invalid chat_id".into()))?;
        match message.attachment {
            Some(attachment) => {
                self.send_document(chat_id, attachment, &message.content)
                    .await
            }
            None => self.send_message(chat_id, &message.content).await,
        }
    }

    async fn send_typing(&self, thread_id: &str) -> Result<()> {
        if let Ok(chat_id) = thread_id.parse::<i64>() {
            self.send_chat_action(chat_id).await?;
        }
        Ok(())
    }

    async fn listen(&self) -> Result<Box<dyn Stream<Item = IncomingMessage> + Send + Unpin>> {
        Ok(Box::new(self.start_polling()))
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub date: i64,
    pub reply_to_message: Option<Box<TelegramMessage>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
}

impl TelegramUpdate {
    /// Text messages from humans only.
    pub fn to_incoming(&self) -> Option<IncomingMessage> {
        let msg = self.message.as_ref()?;
        let text = msg.text.as_ref()?;
        let from = msg.from.as_ref()?;

        if from.is_bot {
            return None;
        }

        Some(IncomingMessage {
            channel: "telegram".into(),
            thread_id: msg.chat.id.to_string(),
            sender_id: from.id.to_string(),
            sender_name: Some(match &from.last_name {
                Some(last) => format!("{} {last}", from.first_name),
                None => from.first_name.clone(),
            }),
            content: text.clone(),
            thread_type: match msg.chat.chat_type.as_str() {
                "private" => ThreadType::Direct,
                _ => ThreadType::Group,
            },
            timestamp: chrono::DateTime::from_timestamp(msg.date, 0)
                .unwrap_or_else(chrono::Utc::now),
            reply_to: msg
                .reply_to_message
                .as_ref()
                .map(|r| r.message_id.to_string()),
        })
    }
}
