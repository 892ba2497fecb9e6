//! Question matcher — finds the stored question a user utterance refers to.
//!
//! Two phases:
//! 1. substring scoring over questions and answers (lowercased)
//! 2. fuzzy similarity over question texts when phase 1 finds nothing

use crate::record::KnowledgeBase;
use crate::similarity::SequenceMatcher;

/// Utterance found inside the question text.
const QUESTION_HIT: f64 = 5.0;
/// Utterance found inside at least one answer.
const ANSWER_HIT: f64 = 3.0;
/// Question length is divided by this and subtracted, favoring short questions.
const LENGTH_PENALTY_DIVISOR: f64 = 200.0;

pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.4;

#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    fuzzy_cutoff: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_CUTOFF)
    }
}

impl Matcher {
    pub fn new(fuzzy_cutoff: f64) -> Self {
        Self {
            fuzzy_cutoff: fuzzy_cutoff.clamp(0.0, 1.0),
        }
    }

    pub fn fuzzy_cutoff(&self) -> f64 {
        self.fuzzy_cutoff
    }

    /// Best question for `utterance`, or `None`. Blank input never matches.
    pub fn find_best_match(&self, utterance: &str, base: &KnowledgeBase) -> Option<String> {
        let normalized = utterance.trim().to_lowercase();
        if normalized.is_empty() || base.is_empty() {
            return None;
        }

        if let Some(question) = self.keyword_match(&normalized, base) {
            tracing::debug!("keyword match: {question:?}");
            return Some(question);
        }

        let fuzzy = self.fuzzy_match(&normalized, base);
        if let Some(question) = &fuzzy {
            tracing::debug!("fuzzy match: {question:?}");
        }
        fuzzy
    }

    /// Phase 1. `utterance` must already be lowercased.
    pub fn keyword_match(&self, utterance: &str, base: &KnowledgeBase) -> Option<String> {
        let mut best: Option<&str> = None;
        let mut best_score = 0.0_f64;

        for record in &base.questions {
            let score = keyword_score(utterance, &record.question, &record.answers);
            if score > best_score {
                best_score = score;
                best = Some(&record.question);
            }
        }

        best.map(str::to_string)
    }

    /// Phase 2. `utterance` must already be lowercased.
    pub fn fuzzy_match(&self, utterance: &str, base: &KnowledgeBase) -> Option<String> {
        let matcher = SequenceMatcher::new(utterance);
        let mut best: Option<(&str, f64)> = None;

        for record in &base.questions {
            let candidate = record.question.to_lowercase();
            if matcher.real_quick_ratio(&candidate) < self.fuzzy_cutoff {
                continue;
            }
            let ratio = matcher.ratio(&candidate);
            if ratio < self.fuzzy_cutoff {
                continue;
            }
            if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
                best = Some((&record.question, ratio));
            }
        }

        best.map(|(question, _)| question.to_string())
    }
}

/// `5·[u ⊆ question] + 3·[u ⊆ any answer] − len(question)/200`, lowercased.
pub fn keyword_score(utterance: &str, question: &str, answers: &[String]) -> f64 {
    let question_text = question.to_lowercase();
    let mut score = 0.0;

    if question_text.contains(utterance) {
        score += QUESTION_HIT;
    }
    if answers.iter().any(|a| a.to_lowercase().contains(utterance)) {
        score += ANSWER_HIT;
    }

    score - question_text.chars().count() as f64 / LENGTH_PENALTY_DIVISOR
}
