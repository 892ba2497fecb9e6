//! Question/answer records — the data model behind every reply.

use serde::{Deserialize, Serialize};

/// One question and its stored answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

impl QuestionRecord {
    pub fn new(question: impl Into<String>, answers: Vec<String>) -> Self {
        Self {
            question: question.into(),
            answers,
        }
    }

    /// Case-insensitive question comparison (the record key).
    pub fn has_question(&self, question: &str) -> bool {
        self.question.to_lowercase() == question.to_lowercase()
    }
}

/// Ordered collection of records. Order drives numbered listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

impl KnowledgeBase {
    pub fn new(questions: Vec<QuestionRecord>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Index of the record whose question matches case-insensitively.
    pub fn position(&self, question: &str) -> Option<usize> {
        let wanted = question.to_lowercase();
        self.questions
            .iter()
            .position(|r| r.question.to_lowercase() == wanted)
    }

    pub fn find(&self, question: &str) -> Option<&QuestionRecord> {
        self.position(question).map(|i| &self.questions[i])
    }

    /// Question texts in listing order.
    pub fn question_keys(&self) -> Vec<String> {
        self.questions.iter().map(|r| r.question.clone()).collect()
    }

    /// Merge case-insensitive duplicates into their first occurrence.
    /// Returns how many records were folded away.
    pub fn dedup_questions(&mut self) -> usize {
        let before = self.questions.len();
        let mut merged: Vec<QuestionRecord> = Vec::with_capacity(before);
        for record in self.questions.drain(..) {
            match merged.iter_mut().find(|r| r.has_question(&record.question)) {
                Some(existing) => existing.answers.extend(record.answers),
                None => merged.push(record),
            }
        }
        self.questions = merged;
        before - self.questions.len()
    }

    /// Fold another base into this one, merging on matching questions.
    /// Returns (records added, answers added).
    pub fn merge(&mut self, other: KnowledgeBase) -> (usize, usize) {
        let mut added_records = 0;
        let mut added_answers = 0;
        for record in other.questions {
            match self.position(&record.question) {
                Some(i) => {
                    let existing = &mut self.questions[i];
                    for answer in record.answers {
                        if !existing.answers.contains(&answer) {
                            existing.answers.push(answer);
                            added_answers += 1;
                        }
                    }
                }
                None => {
                    added_answers += record.answers.len();
                    added_records += 1;
                    self.questions.push(record);
                }
            }
        }
        (added_records, added_answers)
    }
}
