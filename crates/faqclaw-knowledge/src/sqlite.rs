//! SQLite-backed knowledge persistence.
//! Same data as the JSON file, normalized into two ordered tables.

use crate::persistence::KnowledgePersistence;
use crate::record::{KnowledgeBase, QuestionRecord};
use faqclaw_core::error::{FaqClawError, Result};
use std::path::Path;

pub struct SqliteStore {
    conn: rusqlite::Connection,
}

impl SqliteStore {
    /// Open or create the knowledge database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| FaqClawError::Persistence(format!("Create dir: {e}")))?;
            }
        }
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| FaqClawError::Persistence(format!("DB open: {e}")))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| FaqClawError::Persistence(format!("DB open: {e}")))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY,
                position INTEGER NOT NULL,
                question TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS answers (
                question_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                answer TEXT NOT NULL,
                PRIMARY KEY (question_id, position),
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_questions_position ON questions(position);
            ",
            )
            .map_err(|e| FaqClawError::Persistence(format!("Migration: {e}")))?;
        Ok(())
    }

    fn read_all(&self) -> rusqlite::Result<KnowledgeBase> {
        let mut questions_stmt = self
            .conn
            .prepare("SELECT id, question FROM questions ORDER BY position")?;
        let rows = questions_stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut answers_stmt = self
            .conn
            .prepare("SELECT answer FROM answers WHERE question_id = ?1 ORDER BY position")?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, question) in rows {
            let answers = answers_stmt
                .query_map(rusqlite::params![id], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            records.push(QuestionRecord::new(question, answers));
        }
        Ok(KnowledgeBase::new(records))
    }
}

impl KnowledgePersistence for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> KnowledgeBase {
        self.read_all().unwrap_or_else(|e| {
            tracing::warn!("⚠️ Failed to read knowledge database: {e}");
            KnowledgeBase::default()
        })
    }

    fn save(&self, base: &KnowledgeBase) -> Result<()> {
        let persist = |e: rusqlite::Error| FaqClawError::Persistence(format!("Save knowledge: {e}"));

        let tx = self.conn.unchecked_transaction().map_err(persist)?;
        tx.execute("DELETE FROM answers", []).map_err(persist)?;
        tx.execute("DELETE FROM questions", []).map_err(persist)?;

        for (position, record) in base.questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO questions (position, question) VALUES (?1, ?2)",
                rusqlite::params![position as i64, record.question],
            )
            .map_err(persist)?;
            let question_id = tx.last_insert_rowid();
            for (answer_pos, answer) in record.answers.iter().enumerate() {
                tx.execute(
                    "INSERT INTO answers (question_id, position, answer) VALUES (?1, ?2, ?3)",
                    rusqlite::params![question_id, answer_pos as i64, answer],
                )
                .map_err(persist)?;
            }
        }
        tx.commit().map_err(persist)?;

        tracing::debug!("💾 Saved {} questions to SQLite", base.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_preserve_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let base = KnowledgeBase::new(vec![
            QuestionRecord::new("zeta", vec!["Sintesi: z".into(), "altro".into()]),
            QuestionRecord::new("alfa", vec![]),
            QuestionRecord::new("beta", vec!["b".into()]),
        ]);
        store.save(&base).unwrap();
        assert_eq!(store.load(), base);
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save(&KnowledgeBase::new(vec![QuestionRecord::new("vecchia", vec!["x".into()])]))
            .unwrap();
        let next = KnowledgeBase::new(vec![QuestionRecord::new("nuova", vec!["y".into()])]);
        store.save(&next).unwrap();
        assert_eq!(store.load(), next);
    }

    #[test]
    fn test_file_database_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("faqclaw-sqlite-{}", std::process::id()));
        let path = dir.join("db.sqlite");
        std::fs::remove_file(&path).ok();
        let base = KnowledgeBase::new(vec![QuestionRecord::new("persistente", vec!["sì".into()])]);
        {
            let store = SqliteStore::open(&path).unwrap();
            store.save(&base).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load(), base);
        std::fs::remove_dir_all(&dir).ok();
    }
}
