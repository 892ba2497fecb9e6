//! Per-user conversation sessions.

use std::collections::HashMap;

/// Active dialogue mode. Exactly one per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// Teaching: the next message becomes an answer for `question`.
    AwaitingAnswer { question: String },
    /// A numbered listing was shown; the next number picks a question.
    AwaitingQuestionSelection,
    /// Quiz on the record at `index`, whose key was `question` when asked.
    QuizActive { index: usize, question: String },
    /// The next message extends the `Approfondimento:` answer of `question`.
    AwaitingApprofondimentoAppend { question: String },
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingAnswer { .. } => "awaiting_answer",
            SessionState::AwaitingQuestionSelection => "awaiting_selection",
            SessionState::QuizActive { .. } => "quiz",
            SessionState::AwaitingApprofondimentoAppend { .. } => "awaiting_append",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: SessionState,
    /// Question keys of the last numbered listing, 1-based on display.
    pub last_listing: Option<Vec<String>>,
    /// Last question answered to this user.
    pub last_question: Option<String>,
}

impl Session {
    /// Leave the current mode, returning it.
    pub fn take_state(&mut self) -> SessionState {
        std::mem::take(&mut self.state)
    }

    pub fn set_state(&mut self, state: SessionState) {
        if state != self.state {
            tracing::debug!("session: {} → {}", self.state.label(), state.label());
        }
        self.state = state;
    }
}

/// All sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionMap {
    sessions: HashMap<String, Session>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `id`, created on first use.
    pub fn get_mut(&mut self, id: &str) -> &mut Session {
        self.sessions.entry(id.to_string()).or_default()
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
