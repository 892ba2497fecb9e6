//! FaqClaw configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FaqClawError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqClawConfig {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl FaqClawConfig {
    /// Load config from the default path (~/.faqclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FaqClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FaqClawError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| FaqClawError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Secrets may come from the environment instead of the file.
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = get("FAQCLAW_ADMIN_PASSWORD").or_else(|| get("ADMIN_PASSWORD")) {
            tracing::debug!("🔑 admin password taken from the environment");
            self.admin.password = password;
        }
        if let Some(token) = get("TELEGRAM_BOT_TOKEN").or_else(|| get("TOKEN")) {
            let telegram = self
                .channel
                .telegram
                .get_or_insert_with(TelegramChannelConfig::default);
            telegram.bot_token = token;
            tracing::debug!("🔑 telegram bot token taken from the environment");
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.knowledge.fuzzy_cutoff) {
            return Err(FaqClawError::Config(format!(
                "knowledge.fuzzy_cutoff must be between 0.0 and 1.0, got {}",
                self.knowledge.fuzzy_cutoff
            )));
        }
        if self.conversation.max_reply_len == 0 {
            return Err(FaqClawError::Config(
                "conversation.max_reply_len must be greater than 0".into(),
            ));
        }
        if let Some(telegram) = &self.channel.telegram {
            if telegram.enabled && telegram.bot_token.trim().is_empty() {
                return Err(FaqClawError::Config(
                    "channel.telegram.bot_token is required when telegram is enabled".into(),
                ));
            }
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the FaqClaw home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".faqclaw")
    }
}

/// Where and how the question/answer records are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_knowledge_path")]
    pub path: String,
    /// Minimum similarity ratio accepted by the fuzzy fallback.
    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

fn default_knowledge_path() -> String { "~/.faqclaw/db.json".into() }
fn default_fuzzy_cutoff() -> f64 { 0.4 }

impl KnowledgeConfig {
    /// Storage path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_knowledge_path(),
            fuzzy_cutoff: default_fuzzy_cutoff(),
        }
    }
}

/// Conversation engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Longest reply (in characters) a channel accepts in one message.
    #[serde(default = "default_max_reply_len")]
    pub max_reply_len: usize,
}

fn default_max_reply_len() -> usize { 3800 }

impl Default for ConversationConfig {
    fn default() -> Self {
        Self { max_reply_len: default_max_reply_len() }
    }
}

/// Shared-secret admin gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Empty disables every password-gated command.
    #[serde(default)]
    pub password: String,
    /// Require the password for `/list` too.
    #[serde(default)]
    pub protect_list: bool,
}

impl AdminConfig {
    pub fn is_enabled(&self) -> bool {
        !self.password.is_empty()
    }

    /// Byte-for-byte comparison with the configured secret.
    pub fn check(&self, supplied: &str) -> bool {
        self.is_enabled() && supplied.as_bytes() == self.password.as_bytes()
    }
}

/// External topic lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_lookup_url")]
    pub base_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

fn bool_true() -> bool { true }
fn default_lookup_url() -> String { "https://it.wikipedia.org/api/rest_v1/page/summary".into() }
fn default_lookup_timeout() -> u64 { 5 }

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_lookup_url(),
            timeout_secs: default_lookup_timeout(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    #[serde(default)]
    pub telegram: Option<TelegramChannelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChannelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Empty accepts every chat.
    #[serde(default)]
    pub allowed_chat_ids: Vec<i64>,
}

fn default_poll_interval() -> u64 { 1 }

impl Default for TelegramChannelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            poll_interval: default_poll_interval(),
            allowed_chat_ids: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = FaqClawConfig::default();
        assert_eq!(config.knowledge.backend, StorageBackend::Json);
        assert!((config.knowledge.fuzzy_cutoff - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.conversation.max_reply_len, 3800);
        assert!(!config.admin.is_enabled());
        assert!(config.channel.telegram.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [knowledge]
            backend = "sqlite"
            path = "/tmp/faq.db"
            fuzzy_cutoff = 0.8

            [admin]
            password = "1234"
            protect_list = true

            [channel.telegram]
            enabled = true
            bot_token = "123:abc"
            allowed_chat_ids = [42]
        "#;

        let config: FaqClawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.knowledge.backend, StorageBackend::Sqlite);
        assert_eq!(config.knowledge.resolved_path(), PathBuf::from("/tmp/faq.db"));
        assert!(config.admin.protect_list);
        let telegram = config.channel.telegram.as_ref().unwrap();
        assert_eq!(telegram.poll_interval, 1);
        assert_eq!(telegram.allowed_chat_ids, vec![42]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: FaqClawConfig = toml::from_str("").unwrap();
        assert_eq!(config.knowledge.path, "~/.faqclaw/db.json");
        assert!(config.lookup.enabled);
        assert_eq!(config.lookup.timeout_secs, 5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FaqClawConfig::default();
        config.knowledge.fuzzy_cutoff = 1.5;
        assert!(config.validate().is_err());

        let mut config = FaqClawConfig::default();
        config.conversation.max_reply_len = 0;
        assert!(config.validate().is_err());

        let mut config = FaqClawConfig::default();
        config.channel.telegram = Some(TelegramChannelConfig {
            enabled: true,
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_secrets() {
        let env: HashMap<&str, &str> =
            HashMap::from([("ADMIN_PASSWORD", "segreta"), ("TOKEN", "999:xyz")]);
        let mut config = FaqClawConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.admin.password, "segreta");
        assert_eq!(config.channel.telegram.unwrap().bot_token, "999:xyz");
    }

    #[test]
    fn test_admin_check_is_exact() {
        let admin = AdminConfig {
            password: "1234".into(),
            protect_list: false,
        };
        assert!(admin.check("1234"));
        assert!(!admin.check("1234 "));
        assert!(!admin.check("12345"));

        let disabled = AdminConfig::default();
        assert!(!disabled.check(""));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join("faqclaw-config-test");
        let path = dir.join("config.toml");
        let mut config = FaqClawConfig::default();
        config.conversation.max_reply_len = 1000;
        config.save_to(&path).unwrap();

        let loaded = FaqClawConfig::load_from(&path).unwrap();
        assert_eq!(loaded.conversation.max_reply_len, 1000);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_home_dir() {
        let home = FaqClawConfig::home_dir();
        assert!(home.to_string_lossy().contains("faqclaw"));
    }
}
