//! Slash command parsing.
//!
//! Commands are case-insensitive, accept Italian and English aliases and
//! ignore the `@botname` suffix Telegram appends in group chats.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/list [password]`
    List { password: Option<String> },
    /// `/domande` — numbered list, then pick by number.
    Select,
    Quiz,
    /// `/approfondisci [n|text]`
    Deepen { target: Option<String> },
    /// `/rimuovi [n]`
    Remove { index: Option<String> },
    /// `/backup <password>`
    Backup { password: Option<String> },
    /// `/cerca <topic>`
    Search { topic: Option<String> },
    Cancel,
    Unknown(String),
}

impl Command {
    /// `None` when `text` is not a slash command.
    pub fn parse(text: &str) -> Option<Command> {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix('/')?;

        let (head, rest) = match body.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (body, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" | "aiuto" => Command::Help,
            "list" | "lista" => Command::List { password: arg },
            "domande" | "select" => Command::Select,
            "quiz" => Command::Quiz,
            "approfondisci" | "edit" => Command::Deepen { target: arg },
            "rimuovi" | "remove" => Command::Remove { index: arg },
            "backup" => Command::Backup { password: arg },
            "cerca" | "search" => Command::Search { topic: arg },
            "annulla" | "cancel" => Command::Cancel,
            _ => Command::Unknown(name),
        };
        Some(command)
    }

    /// Unknown commands leave the current mode untouched.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Command::Unknown(_))
    }
}
