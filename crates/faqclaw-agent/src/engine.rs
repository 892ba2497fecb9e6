//! Conversation engine — routes every message through the session state
//! machine and the knowledge store.
//!
//! ```text
//! text ─┬─ slash command ─→ abandon current mode ─→ run command
//!       └─ plain text ───→ current mode:
//!            Idle                          match → answer | teach prompt
//!            AwaitingAnswer{q}             reply becomes an answer of q
//!            AwaitingQuestionSelection     number → answer of listing[n]
//!            QuizActive{i}                 reveal official answer, next question
//!            AwaitingApprofondimentoAppend extend the detail answer of q
//! ```
//!
//! User-facing errors become replies and reset the session to Idle.
//! `Persistence` errors from a save leave `handle` as `Err`.

use crate::commands::Command;
use crate::lookup::TopicLookup;
use crate::quiz::QuizPicker;
use crate::replies::{Reply, split_replies};
use crate::session::{Session, SessionMap, SessionState};
use faqclaw_core::config::{AdminConfig, FaqClawConfig};
use faqclaw_core::error::{FaqClawError, Result};
use faqclaw_core::types::Attachment;
use faqclaw_knowledge::tags::AnswerTag;
use faqclaw_knowledge::{KnowledgeStore, Matcher, SharedStore, format_answers};
use std::sync::MutexGuard;

const WELCOME: &str =
    "👋 Ciao! Scrivi una domanda e proverò a rispondere! Digita /help per vedere i comandi.";

const HELP: &str = "📜 Comandi disponibili:\n\
/help, /aiuto - Mostra questo messaggio 📖\n\
/domande - Elenco numerato, poi scegli una domanda col numero 🔢\n\
/list [password] - Tutte le domande con le risposte 📋\n\
/quiz - Domande a caso per ripassare 🎯\n\
/approfondisci [n|testo] - Aggiungi testo all'approfondimento ✍️\n\
/rimuovi [n] - Elimina una domanda 🗑️\n\
/cerca <argomento> - Cerca un argomento su Wikipedia 🔎\n\
/backup <password> - Scarica il database 💾\n\
/annulla - Esci dalla modalità corrente ↩️\n\
👉 Scrivi una domanda e io proverò a rispondere!";

const TEACH_PROMPT: &str =
    "🤖 Non conosco la risposta. Digita la risposta per insegnarmela o 'skip/q' per uscire.";
const NO_ANSWER: &str = "🤖 Nessuna risposta salvata per questa domanda.";
const EMPTY_BASE: &str = "🤖 Non ci sono domande salvate nel database.";
const WRONG_PASSWORD: &str = "❌ Password errata! Accesso negato.";

const SKIP_TEACH: [&str; 2] = ["skip", "q"];
const SKIP_QUIZ: [&str; 2] = ["skip", "s"];
const STOP_QUIZ: [&str; 4] = ["stop", "esci", "fine", "quit"];
const CANCEL_APPEND: [&str; 4] = ["annulla", "cancel", "stop", "q"];

/// Length of the SHA-256 prefix shown in backup captions.
const FINGERPRINT_PREFIX: usize = 12;

pub struct ConversationEngine {
    store: SharedStore,
    matcher: Matcher,
    sessions: SessionMap,
    quiz: QuizPicker,
    lookup: Box<dyn TopicLookup>,
    admin: AdminConfig,
    max_reply_len: usize,
}

fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, KnowledgeStore>> {
    store
        .lock()
        .map_err(|e| FaqClawError::Other(format!("knowledge store lock poisoned: {e}")))
}

fn is_one_of(text: &str, tokens: &[&str]) -> bool {
    let lowered = text.trim().to_lowercase();
    tokens.contains(&lowered.as_str())
}

/// Formatted answers, or the placeholder when nothing renders.
fn render_answers(answers: &[String]) -> String {
    let text = format_answers(answers);
    if text.trim().is_empty() {
        NO_ANSWER.to_string()
    } else {
        text
    }
}

fn numbered(keys: &[String]) -> String {
    keys.iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {q}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn user_message(error: &FaqClawError) -> String {
    match error {
        FaqClawError::NotFound(what) => {
            format!("❌ Non trovata: «{what}». Potrebbe essere stata rimossa.")
        }
        FaqClawError::InvalidInput(reason) => format!("⚠️ {reason}"),
        FaqClawError::EmptyCorpus => {
            "🤖 Non ci sono ancora domande salvate. Fammi una domanda per insegnarmi qualcosa!"
                .to_string()
        }
        other => format!("⚠️ {other}"),
    }
}

impl ConversationEngine {
    pub fn new(store: SharedStore, config: &FaqClawConfig, lookup: Box<dyn TopicLookup>) -> Self {
        Self {
            store,
            matcher: Matcher::new(config.knowledge.fuzzy_cutoff),
            sessions: SessionMap::new(),
            quiz: QuizPicker::from_entropy(),
            lookup,
            admin: config.admin.clone(),
            max_reply_len: config.conversation.max_reply_len,
        }
    }

    pub fn with_quiz_picker(mut self, picker: QuizPicker) -> Self {
        self.quiz = picker;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn session_state(&self, session_id: &str) -> SessionState {
        self.sessions
            .get(session_id)
            .map(|s| s.state.clone())
            .unwrap_or_default()
    }

    /// Process one message for `session_id`, returning the replies to send.
    pub async fn handle(&mut self, session_id: &str, text: &str) -> Result<Vec<Reply>> {
        let replies = match self.dispatch(session_id, text).await {
            Ok(replies) => replies,
            Err(e) if e.is_user_facing() => {
                tracing::debug!("[{session_id}] {e}");
                self.sessions.get_mut(session_id).set_state(SessionState::Idle);
                vec![Reply::text(user_message(&e))]
            }
            Err(e) => return Err(e),
        };
        Ok(split_replies(replies, self.max_reply_len))
    }

    async fn dispatch(&mut self, sid: &str, text: &str) -> Result<Vec<Reply>> {
        if let Some(command) = Command::parse(text) {
            if command.is_unknown() {
                return self.run_command(sid, command, SessionState::Idle).await;
            }
            let abandoned = self.sessions.get_mut(sid).take_state();
            if !abandoned.is_idle() {
                tracing::debug!("[{sid}] {} abandoned by command", abandoned.label());
            }
            return self.run_command(sid, command, abandoned).await;
        }

        match self.sessions.get_mut(sid).take_state() {
            SessionState::Idle => self.answer(sid, text),
            SessionState::AwaitingAnswer { question } => self.on_teach_reply(sid, question, text),
            SessionState::AwaitingQuestionSelection => self.on_selection(sid, text),
            SessionState::QuizActive { index, question } => {
                self.on_quiz_reply(sid, index, question, text)
            }
            SessionState::AwaitingApprofondimentoAppend { question } => {
                self.on_append(sid, question, text)
            }
        }
    }

    async fn run_command(
        &mut self,
        sid: &str,
        command: Command,
        abandoned: SessionState,
    ) -> Result<Vec<Reply>> {
        match command {
            Command::Start => Ok(vec![Reply::text(WELCOME)]),
            Command::Help => Ok(vec![Reply::text(HELP)]),
            Command::List { password } => self.list_all(sid, password.as_deref()),
            Command::Select => self.start_selection(sid),
            Command::Quiz => self.start_quiz(sid),
            Command::Deepen { target } => self.start_append(sid, target.as_deref()),
            Command::Remove { index } => self.remove(sid, index.as_deref()),
            Command::Backup { password } => self.backup(password.as_deref()),
            Command::Search { topic } => self.search(topic.as_deref()).await,
            Command::Cancel => Ok(vec![Reply::text(if abandoned.is_idle() {
                "🤷 Nessuna operazione in corso."
            } else {
                "↩️ Operazione annullata."
            })]),
            Command::Unknown(name) => Ok(vec![Reply::text(format!(
                "❓ Comando /{name} sconosciuto. Digita /help per l'elenco dei comandi."
            ))]),
        }
    }

    // ─── Idle ───────────────────────────────────────────────

    fn answer(&mut self, sid: &str, text: &str) -> Result<Vec<Reply>> {
        let utterance = text.trim();
        if utterance.is_empty() {
            return Ok(Vec::new());
        }

        let store = lock_store(&self.store)?;
        let found = self
            .matcher
            .find_best_match(utterance, store.base())
            .and_then(|q| store.find(&q))
            .filter(|record| !record.answers.is_empty())
            .map(|record| (record.question.clone(), render_answers(&record.answers)));
        drop(store);

        let session = self.sessions.get_mut(sid);
        match found {
            Some((question, rendered)) => {
                session.last_question = Some(question);
                Ok(vec![Reply::text(format!("🤖 {rendered}"))])
            }
            None => {
                session.set_state(SessionState::AwaitingAnswer {
                    question: utterance.to_string(),
                });
                Ok(vec![Reply::text(TEACH_PROMPT)])
            }
        }
    }

    // ─── Teaching ───────────────────────────────────────────

    fn on_teach_reply(&mut self, sid: &str, question: String, text: &str) -> Result<Vec<Reply>> {
        if is_one_of(text, &SKIP_TEACH) {
            return Ok(vec![Reply::text("⏭️ Nessuna risposta salvata. Proseguiamo!")]);
        }
        let answer = text.trim();
        if answer.is_empty() {
            self.sessions
                .get_mut(sid)
                .set_state(SessionState::AwaitingAnswer { question });
            return Ok(vec![Reply::text(TEACH_PROMPT)]);
        }

        lock_store(&self.store)?.append_answer(&question, answer)?;
        tracing::info!("🧠 [{sid}] learned an answer for {question:?}");

        let session = self.sessions.get_mut(sid);
        session.last_listing = None;
        let reply = format!("✅ Grazie! Ho memorizzato la risposta:\n\n{question} ➝ {answer}");
        session.last_question = Some(question);
        Ok(vec![Reply::text(reply)])
    }

    // ─── Listings ───────────────────────────────────────────

    /// Question key for a 1-based listing number.
    fn resolve_number(&mut self, sid: &str, number: usize) -> Result<String> {
        let invalid = || FaqClawError::InvalidInput(format!("Numero non valido: {number}."));
        if number == 0 {
            return Err(invalid());
        }
        let listed = self
            .sessions
            .get_mut(sid)
            .last_listing
            .as_ref()
            .map(|keys| keys.get(number - 1).cloned());
        match listed {
            Some(key) => key.ok_or_else(invalid),
            None => lock_store(&self.store)?
                .record_at(number - 1)
                .map(|r| r.question.clone())
                .ok_or_else(invalid),
        }
    }

    fn list_all(&mut self, sid: &str, password: Option<&str>) -> Result<Vec<Reply>> {
        if self.admin.protect_list {
            match password {
                None => {
                    return Ok(vec![Reply::text(
                        "🔒 Lista protetta. Usa /list <password> per accedere.",
                    )]);
                }
                Some(p) if !self.admin.check(p) => {
                    tracing::warn!("🔒 [{sid}] rejected /list password");
                    return Ok(vec![Reply::text(WRONG_PASSWORD)]);
                }
                Some(_) => {}
            }
        }

        let store = lock_store(&self.store)?;
        if store.is_empty() {
            return Ok(vec![Reply::text(EMPTY_BASE)]);
        }

        let mut message = String::from("📋 Lista delle domande e risposte:\n");
        for (i, record) in store.base().questions.iter().enumerate() {
            let visible: Vec<&str> = record
                .answers
                .iter()
                .filter(|a| AnswerTag::of(a) != Some(AnswerTag::Links))
                .map(String::as_str)
                .collect();
            let answers = if visible.is_empty() {
                "Nessuna risposta".to_string()
            } else {
                visible.join("\n   - ")
            };
            message.push_str(&format!("\n{}. {}\n   - {answers}\n", i + 1, record.question));
        }
        let keys = store.question_keys();
        drop(store);

        self.sessions.get_mut(sid).last_listing = Some(keys);
        Ok(vec![Reply::text(message.trim_end())])
    }

    fn start_selection(&mut self, sid: &str) -> Result<Vec<Reply>> {
        let keys = lock_store(&self.store)?.question_keys();
        if keys.is_empty() {
            return Err(FaqClawError::EmptyCorpus);
        }
        let message = format!(
            "📚 Domande disponibili:\n\n{}\n\n🔢 Scrivi il numero della domanda (0 per annullare).",
            numbered(&keys)
        );
        let session = self.sessions.get_mut(sid);
        session.last_listing = Some(keys);
        session.set_state(SessionState::AwaitingQuestionSelection);
        Ok(vec![Reply::text(message)])
    }

    fn on_selection(&mut self, sid: &str, text: &str) -> Result<Vec<Reply>> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix(&['-', '+'][..]).unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return self.answer(sid, text);
        }
        let invalid = || FaqClawError::InvalidInput(format!("Numero non valido: {trimmed}."));
        let number: usize = digits.parse().map_err(|_| invalid())?;
        if number == 0 {
            return Ok(vec![Reply::text("↩️ Selezione annullata.")]);
        }
        if trimmed.starts_with('-') {
            return Err(invalid());
        }

        let question = self.resolve_number(sid, number)?;
        let rendered = {
            let store = lock_store(&self.store)?;
            let record = store
                .find(&question)
                .ok_or_else(|| FaqClawError::NotFound(question.clone()))?;
            render_answers(&record.answers)
        };
        self.sessions.get_mut(sid).last_question = Some(question.clone());
        Ok(vec![Reply::text(format!("❓ {question}\n\n{rendered}"))])
    }

    // ─── Quiz ───────────────────────────────────────────────

    /// Pick a random record and enter `QuizActive` on it.
    fn next_quiz_question(&mut self, sid: &str) -> Result<String> {
        let (index, question) = {
            let store = lock_store(&self.store)?;
            let index = self
                .quiz
                .pick(store.len())
                .ok_or(FaqClawError::EmptyCorpus)?;
            let question = store
                .record_at(index)
                .map(|r| r.question.clone())
                .ok_or(FaqClawError::EmptyCorpus)?;
            (index, question)
        };
        self.sessions.get_mut(sid).set_state(SessionState::QuizActive {
            index,
            question: question.clone(),
        });
        Ok(format!(
            "❓ {question}\n\n✏️ Scrivi la tua risposta ('skip' per cambiare, 'stop' per uscire)."
        ))
    }

    fn start_quiz(&mut self, sid: &str) -> Result<Vec<Reply>> {
        let prompt = self.next_quiz_question(sid)?;
        Ok(vec![Reply::text(format!("🎯 Quiz!\n\n{prompt}"))])
    }

    fn on_quiz_reply(
        &mut self,
        sid: &str,
        index: usize,
        question: String,
        text: &str,
    ) -> Result<Vec<Reply>> {
        if is_one_of(text, &STOP_QUIZ) {
            return Ok(vec![Reply::text("🏁 Quiz terminato. Alla prossima!")]);
        }
        if is_one_of(text, &SKIP_QUIZ) {
            return Ok(vec![Reply::text(self.next_quiz_question(sid)?)]);
        }
        let attempt = text.trim();
        if attempt.is_empty() {
            self.sessions
                .get_mut(sid)
                .set_state(SessionState::QuizActive { index, question });
            return Ok(vec![Reply::text("✏️ Scrivi la tua risposta, 'skip' o 'stop'.")]);
        }

        let official = {
            let store = lock_store(&self.store)?;
            let record = store
                .record_at(index)
                .filter(|r| r.has_question(&question))
                .or_else(|| store.find(&question))
                .ok_or_else(|| FaqClawError::NotFound(question.clone()))?;
            render_answers(&record.answers)
        };
        let reveal = format!(
            "📝 La tua risposta:\n{attempt}\n\n✅ Risposta ufficiale per «{question}»:\n{official}"
        );
        self.sessions.get_mut(sid).last_question = Some(question);

        let mut replies = vec![Reply::text(reveal)];
        match self.next_quiz_question(sid) {
            Ok(prompt) => replies.push(Reply::text(prompt)),
            Err(FaqClawError::EmptyCorpus) => {
                replies.push(Reply::text("🏁 Non ci sono altre domande. Quiz terminato."));
            }
            Err(e) => return Err(e),
        }
        Ok(replies)
    }

    // ─── Approfondimento ────────────────────────────────────

    fn start_append(&mut self, sid: &str, target: Option<&str>) -> Result<Vec<Reply>> {
        let question = match target {
            Some(arg) => match arg.parse::<usize>() {
                Ok(number) => self.resolve_number(sid, number)?,
                Err(_) => {
                    let store = lock_store(&self.store)?;
                    self.matcher
                        .find_best_match(arg, store.base())
                        .ok_or_else(|| FaqClawError::NotFound(arg.to_string()))?
                }
            },
            None => match self.sessions.get_mut(sid).last_question.clone() {
                Some(q) => q,
                None => {
                    return Ok(vec![Reply::text(
                        "ℹ️ Uso: /approfondisci <numero> oppure /approfondisci <testo della domanda>.",
                    )]);
                }
            },
        };

        if lock_store(&self.store)?.find(&question).is_none() {
            return Err(FaqClawError::NotFound(question));
        }

        let prompt = format!(
            "✍️ Scrivi il testo da aggiungere all'approfondimento di:\n«{question}»\n('annulla' per uscire)"
        );
        self.sessions
            .get_mut(sid)
            .set_state(SessionState::AwaitingApprofondimentoAppend { question });
        Ok(vec![Reply::text(prompt)])
    }

    fn on_append(&mut self, sid: &str, question: String, text: &str) -> Result<Vec<Reply>> {
        if is_one_of(text, &CANCEL_APPEND) {
            return Ok(vec![Reply::text("↩️ Modifica annullata.")]);
        }
        let addition = text.trim();
        if addition.is_empty() {
            self.sessions
                .get_mut(sid)
                .set_state(SessionState::AwaitingApprofondimentoAppend { question });
            return Ok(vec![Reply::text(
                "✍️ Scrivi il testo da aggiungere, oppure 'annulla'.",
            )]);
        }

        lock_store(&self.store)?.append_to_detail(&question, addition)?;
        tracing::info!("✍️ [{sid}] extended detail of {question:?}");

        let session = self.sessions.get_mut(sid);
        session.last_listing = None;
        let reply = format!("✅ Approfondimento aggiornato per «{question}».");
        session.last_question = Some(question);
        Ok(vec![Reply::text(reply)])
    }

    // ─── Removal ────────────────────────────────────────────

    fn remove(&mut self, sid: &str, index: Option<&str>) -> Result<Vec<Reply>> {
        let Some(arg) = index else {
            let keys = lock_store(&self.store)?.question_keys();
            if keys.is_empty() {
                return Ok(vec![Reply::text(EMPTY_BASE)]);
            }
            let message = format!(
                "🗑️ Domande salvate:\n\n{}\n\nUsa /rimuovi <numero> per eliminarne una (0 per annullare).",
                numbered(&keys)
            );
            self.sessions.get_mut(sid).last_listing = Some(keys);
            return Ok(vec![Reply::text(message)]);
        };

        let number: usize = arg
            .parse()
            .map_err(|_| FaqClawError::InvalidInput(format!("Numero non valido: {arg}.")))?;
        if number == 0 {
            return Ok(vec![Reply::text("↩️ Eliminazione annullata.")]);
        }

        let question = self.resolve_number(sid, number)?;
        let removed = lock_store(&self.store)?.remove(&question)?;
        tracing::info!("🗑️ [{sid}] removed {:?}", removed.question);

        let session = self.sessions.get_mut(sid);
        session.last_listing = None;
        if session
            .last_question
            .as_deref()
            .is_some_and(|q| removed.has_question(q))
        {
            session.last_question = None;
        }
        Ok(vec![Reply::text(format!("🗑️ Eliminata: «{}»", removed.question))])
    }

    // ─── Admin ──────────────────────────────────────────────

    fn backup(&self, password: Option<&str>) -> Result<Vec<Reply>> {
        if !self.admin.is_enabled() {
            return Ok(vec![Reply::text(
                "🔒 Backup non disponibile: nessuna password configurata.",
            )]);
        }
        let Some(password) = password else {
            return Ok(vec![Reply::text("ℹ️ Uso: /backup <password>")]);
        };
        if !self.admin.check(password) {
            tracing::warn!("🔒 Rejected /backup password");
            return Ok(vec![Reply::text(WRONG_PASSWORD)]);
        }

        let (payload, count) = {
            let store = lock_store(&self.store)?;
            (store.export_json()?, store.len())
        };
        let fingerprint = KnowledgeStore::fingerprint(&payload);
        let short = fingerprint.get(..FINGERPRINT_PREFIX).unwrap_or(fingerprint.as_str());
        tracing::info!("💾 Backup exported: {count} questions, sha256 {short}");

        Ok(vec![Reply::Document {
            caption: format!("💾 Backup db.json: {count} domande, sha256 {short}"),
            attachment: Attachment {
                filename: "db.json".into(),
                content: payload,
            },
        }])
    }

    // ─── Lookup ─────────────────────────────────────────────

    async fn search(&self, topic: Option<&str>) -> Result<Vec<Reply>> {
        let Some(topic) = topic else {
            return Ok(vec![Reply::text("ℹ️ Uso: /cerca <argomento>")]);
        };
        if !self.lookup.is_enabled() {
            return Ok(vec![Reply::text("🔎 La ricerca esterna è disattivata.")]);
        }

        let text = match self.lookup.lookup(topic).await {
            Ok(summary) => {
                let mut text = format!("📖 {}\n\n{}", summary.title, summary.extract);
                if let Some(url) = summary.url {
                    text.push_str(&format!("\n\n🔗 {url}"));
                }
                text
            }
            Err(FaqClawError::NotFound(_)) => format!("🔎 Nessun risultato per «{topic}»."),
            Err(e) => {
                tracing::warn!("⚠️ Topic lookup failed: {e}");
                "⚠️ Ricerca non disponibile al momento, riprova più tardi.".to_string()
            }
        };
        Ok(vec![Reply::text(text)])
    }
}
