//! Knowledge persistence — where the records live between runs.
//!
//! The default backend is a single pretty-printed JSON file with the shape
//! `{"questions": [{"question": ..., "answers": [...]}]}`. Loading never
//! fails: a missing or unreadable file yields an empty base.

use crate::record::KnowledgeBase;
use faqclaw_core::error::{FaqClawError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage backend for the whole knowledge base.
pub trait KnowledgePersistence: Send {
    fn name(&self) -> &str;

    /// Read the stored base. Errors are logged and produce an empty base.
    fn load(&self) -> KnowledgeBase;

    /// Replace the stored base with `base`.
    fn save(&self, base: &KnowledgeBase) -> Result<()>;
}

/// JSON flat file store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KnowledgePersistence for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    fn load(&self) -> KnowledgeBase {
        if !self.path.exists() {
            tracing::info!("📂 No knowledge file at {}, starting empty", self.path.display());
            return KnowledgeBase::default();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse {}: {e}", self.path.display());
                KnowledgeBase::default()
            }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", self.path.display());
                KnowledgeBase::default()
            }
        }
    }

    fn save(&self, base: &KnowledgeBase) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| FaqClawError::Persistence(format!("Create dir: {e}")))?;
            }
        }
        let json = serde_json::to_string_pretty(base)
            .map_err(|e| FaqClawError::Persistence(format!("Serialize error: {e}")))?;

        let tmp = self.temp_path();
        std::fs::write(&tmp, json)
            .map_err(|e| FaqClawError::Persistence(format!("Write error: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| FaqClawError::Persistence(format!("Rename error: {e}")))?;

        tracing::debug!("💾 Saved {} questions to {}", base.len(), self.path.display());
        Ok(())
    }
}

/// In-memory backend. Clones share state, so a test can keep a handle and
/// inspect what the store wrote.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    saved: Arc<Mutex<KnowledgeBase>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryPersistence {
    pub fn new(initial: KnowledgeBase) -> Self {
        Self {
            saved: Arc::new(Mutex::new(initial)),
            fail_saves: Arc::new(Mutex::new(false)),
        }
    }

    /// Last saved base.
    pub fn snapshot(&self) -> KnowledgeBase {
        self.saved
            .lock()
            .map(|base| base.clone())
            .unwrap_or_default()
    }

    /// Make every subsequent save fail.
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.lock() {
            *flag = fail;
        }
    }
}

impl KnowledgePersistence for MemoryPersistence {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> KnowledgeBase {
        self.snapshot()
    }

    fn save(&self, base: &KnowledgeBase) -> Result<()> {
        let failing = self.fail_saves.lock().map(|f| *f).unwrap_or(false);
        if failing {
            return Err(FaqClawError::Persistence("memory store rejected save".into()));
        }
        let mut saved = self
            .saved
            .lock()
            .map_err(|e| FaqClawError::Persistence(format!("Lock poisoned: {e}")))?;
        *saved = base.clone();
        Ok(())
    }
}
