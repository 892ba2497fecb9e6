//! Knowledge store — the single owner of the question/answer records.
//!
//! Every mutation goes through [`KnowledgeStore::update_record`] or one of the
//! removal operations and is flushed to the persistence backend before it
//! returns. A failed save rolls the in-memory base back and surfaces as
//! [`FaqClawError::Persistence`].

use crate::persistence::{JsonFileStore, KnowledgePersistence};
use crate::record::{KnowledgeBase, QuestionRecord};
use crate::sqlite::SqliteStore;
use crate::tags::{AnswerTag, detail_position};
use faqclaw_core::config::{KnowledgeConfig, StorageBackend};
use faqclaw_core::error::{FaqClawError, Result};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};

/// Store shared between sessions and channels.
pub type SharedStore = Arc<Mutex<KnowledgeStore>>;

/// What `append_answer` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new record was created for the question.
    Created,
    /// The answer was added to an existing record.
    Appended,
}

pub struct KnowledgeStore {
    base: KnowledgeBase,
    persistence: Box<dyn KnowledgePersistence>,
    revision: u64,
}

impl KnowledgeStore {
    /// Load from `persistence`, folding duplicate questions into their first
    /// occurrence.
    pub fn open(persistence: Box<dyn KnowledgePersistence>) -> Self {
        let mut base = persistence.load();
        let folded = base.dedup_questions();
        if folded > 0 {
            tracing::info!("🔀 Merged {folded} duplicate questions on load");
        }
        tracing::info!(
            "📚 Knowledge base loaded: {} questions ({} backend)",
            base.len(),
            persistence.name()
        );
        Self {
            base,
            persistence,
            revision: 0,
        }
    }

    /// Open the backend selected in configuration.
    pub fn from_config(config: &KnowledgeConfig) -> Result<Self> {
        let path = config.resolved_path();
        let persistence: Box<dyn KnowledgePersistence> = match config.backend {
            StorageBackend::Json => Box::new(JsonFileStore::new(path)),
            StorageBackend::Sqlite => Box::new(SqliteStore::open(&path)?),
        };
        Ok(Self::open(persistence))
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn base(&self) -> &KnowledgeBase {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn find(&self, question: &str) -> Option<&QuestionRecord> {
        self.base.find(question)
    }

    /// Record at a 0-based position.
    pub fn record_at(&self, index: usize) -> Option<&QuestionRecord> {
        self.base.questions.get(index)
    }

    pub fn question_keys(&self) -> Vec<String> {
        self.base.question_keys()
    }

    /// Incremented on every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn backend_name(&self) -> &str {
        self.persistence.name()
    }

    /// Mutate the record for `question` and persist.
    /// Missing record: created empty when `create_if_missing`, else `NotFound`.
    pub fn update_record<F>(&mut self, question: &str, create_if_missing: bool, f: F) -> Result<()>
    where
        F: FnOnce(&mut QuestionRecord),
    {
        let previous = self.base.clone();
        let index = match self.base.position(question) {
            Some(i) => i,
            None if create_if_missing => {
                self.base
                    .questions
                    .push(QuestionRecord::new(question, Vec::new()));
                self.base.questions.len() - 1
            }
            None => return Err(FaqClawError::NotFound(question.to_string())),
        };
        f(&mut self.base.questions[index]);
        self.commit(previous)
    }

    /// Add `answer` to `question`, creating the record when absent.
    pub fn append_answer(&mut self, question: &str, answer: &str) -> Result<AppendOutcome> {
        let outcome = if self.base.position(question).is_some() {
            AppendOutcome::Appended
        } else {
            AppendOutcome::Created
        };
        let answer = answer.to_string();
        self.update_record(question, true, move |record| record.answers.push(answer))?;
        tracing::debug!("✏️ {outcome:?} answer for {question:?}");
        Ok(outcome)
    }

    /// Extend the first `Approfondimento:` answer with `" " + text`, or add
    /// `Approfondimento: <text>` when the record has none.
    pub fn append_to_detail(&mut self, question: &str, text: &str) -> Result<()> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(FaqClawError::InvalidInput("empty text".into()));
        }
        self.update_record(question, false, move |record| {
            match detail_position(&record.answers) {
                Some(i) => {
                    let existing = &mut record.answers[i];
                    existing.push(' ');
                    existing.push_str(&text);
                }
                None => record
                    .answers
                    .push(format!("{} {text}", AnswerTag::Detail.prefix())),
            }
        })
    }

    pub fn replace_answers(&mut self, question: &str, answers: Vec<String>) -> Result<()> {
        self.update_record(question, false, move |record| record.answers = answers)
    }

    /// Delete the record at a 0-based position.
    pub fn remove_at(&mut self, index: usize) -> Result<QuestionRecord> {
        if index >= self.base.len() {
            return Err(FaqClawError::NotFound(format!("question #{}", index + 1)));
        }
        let previous = self.base.clone();
        let removed = self.base.questions.remove(index);
        self.commit(previous)?;
        tracing::debug!("🗑️ Removed {:?}", removed.question);
        Ok(removed)
    }

    pub fn remove(&mut self, question: &str) -> Result<QuestionRecord> {
        let index = self
            .base
            .position(question)
            .ok_or_else(|| FaqClawError::NotFound(question.to_string()))?;
        self.remove_at(index)
    }

    /// Fold an imported base into the store. Returns (records, answers) added.
    pub fn merge_base(&mut self, mut incoming: KnowledgeBase) -> Result<(usize, usize)> {
        incoming.dedup_questions();
        let previous = self.base.clone();
        let added = self.base.merge(incoming);
        self.commit(previous)?;
        tracing::info!("📥 Imported {} questions, {} answers", added.0, added.1);
        Ok(added)
    }

    pub fn snapshot(&self) -> KnowledgeBase {
        self.base.clone()
    }

    /// Pretty JSON in the `db.json` format.
    pub fn export_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.base)?)
    }

    /// SHA-256 of the exported payload, lowercase hex.
    pub fn fingerprint(payload: &[u8]) -> String {
        format!("{:x}", Sha256::digest(payload))
    }

    fn commit(&mut self, previous: KnowledgeBase) -> Result<()> {
        if let Err(e) = self.persistence.save(&self.base) {
            tracing::error!("❌ Failed to persist knowledge base: {e}");
            self.base = previous;
            return Err(match e {
                FaqClawError::Persistence(_) => e,
                other => FaqClawError::Persistence(other.to_string()),
            });
        }
        self.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;

    fn store_with(records: &[(&str, &[&str])]) -> (KnowledgeStore, MemoryPersistence) {
        let memory = MemoryPersistence::new(KnowledgeBase::new(
            records
                .iter()
                .map(|(q, a)| QuestionRecord::new(*q, a.iter().map(|s| s.to_string()).collect()))
                .collect(),
        ));
        (KnowledgeStore::open(Box::new(memory.clone())), memory)
    }

    #[test]
    fn test_open_folds_duplicates() {
        let (store, _) = store_with(&[("Ciao", &["a"]), ("ciao", &["b"])]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("CIAO").unwrap().answers, vec!["a", "b"]);
    }

    #[test]
    fn test_append_answer_creates_then_appends() {
        let (mut store, memory) = store_with(&[]);
        assert_eq!(store.append_answer("foo", "bar").unwrap(), AppendOutcome::Created);
        assert_eq!(store.append_answer("FOO", "baz").unwrap(), AppendOutcome::Appended);
        assert_eq!(store.len(), 1);
        assert_eq!(memory.snapshot().questions[0].answers, vec!["bar", "baz"]);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_append_to_detail_builds_single_entry() {
        let (mut store, memory) = store_with(&[("tema", &["Sintesi: breve"])]);
        store.append_to_detail("tema", "x").unwrap();
        store.append_to_detail("tema", "y").unwrap();
        let answers = &memory.snapshot().questions[0].answers;
        assert_eq!(answers, &vec!["Sintesi: breve".to_string(), "Approfondimento: x y".to_string()]);
    }

    #[test]
    fn test_append_to_detail_extends_existing_in_place() {
        let (mut store, _) = store_with(&[("tema", &["Approfondimento: base", "nota"])]);
        store.append_to_detail("tema", "altro").unwrap();
        assert_eq!(
            store.find("tema").unwrap().answers,
            vec!["Approfondimento: base altro", "nota"]
        );
    }

    #[test]
    fn test_append_to_detail_missing_question() {
        let (mut store, _) = store_with(&[]);
        assert!(matches!(
            store.append_to_detail("assente", "x"),
            Err(FaqClawError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_at_keeps_order() {
        let (mut store, memory) = store_with(&[("a", &[]), ("b", &[]), ("c", &[])]);
        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.question, "b");
        assert_eq!(memory.snapshot().question_keys(), vec!["a", "c"]);
        assert!(matches!(store.remove_at(5), Err(FaqClawError::NotFound(_))));
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let (mut store, memory) = store_with(&[("a", &["1"])]);
        memory.set_fail_saves(true);
        let err = store.append_answer("a", "2").unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(store.find("a").unwrap().answers, vec!["1"]);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_merge_base_and_export() {
        let (mut store, _) = store_with(&[("a", &["1"])]);
        let incoming = KnowledgeBase::new(vec![
            QuestionRecord::new("A", vec!["1".into(), "2".into()]),
            QuestionRecord::new("b", vec![]),
        ]);
        assert_eq!(store.merge_base(incoming).unwrap(), (1, 1));

        let payload = store.export_json().unwrap();
        let parsed: KnowledgeBase = serde_json::from_slice(&payload).unwrap();
        assert_eq!(parsed, store.snapshot());

        let fingerprint = KnowledgeStore::fingerprint(&payload);
        assert_eq!(fingerprint.len(), 64);
        assert_eq!(fingerprint, KnowledgeStore::fingerprint(&payload));
    }
}
