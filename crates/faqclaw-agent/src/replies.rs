//! Engine replies and splitting of long texts.

use faqclaw_core::types::Attachment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Document {
        caption: String,
        attachment: Attachment,
    },
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text(content.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Document { .. } => None,
        }
    }
}

/// Split `text` on line boundaries into chunks of at most `max` characters.
/// A single line longer than `max` becomes its own chunk, unsplit.
pub fn chunk_reply(text: &str, max: usize) -> Vec<String> {
    if text.chars().count() <= max {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        if !current.is_empty() && current_len + 1 + line_len > max {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Apply [`chunk_reply`] to every text reply, keeping order.
pub fn split_replies(replies: Vec<Reply>, max: usize) -> Vec<Reply> {
    replies
        .into_iter()
        .flat_map(|reply| match reply {
            Reply::Text(text) => chunk_reply(&text, max)
                .into_iter()
                .map(Reply::Text)
                .collect::<Vec<_>>(),
            document => vec![document],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(chunk_reply("uno\ndue", 100), vec!["uno\ndue"]);
    }

    #[test]
    fn test_splits_on_lines() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(chunk_reply(text, 9), vec!["aaaa\nbbbb", "cccc"]);
        for chunk in chunk_reply(text, 9) {
            assert!(chunk.chars().count() <= 9);
        }
    }

    #[test]
    fn test_long_line_kept_whole() {
        let text = "corta\nquesta riga è decisamente troppo lunga\nfine";
        let chunks = chunk_reply(text, 10);
        assert_eq!(
            chunks,
            vec!["corta", "questa riga è decisamente troppo lunga", "fine"]
        );
    }

    #[test]
    fn test_chunks_rejoin_to_original() {
        let text = (1..=50)
            .map(|i| format!("{i}. domanda numero {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunk_reply(&text, 120);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn test_split_replies_keeps_documents() {
        let doc = Reply::Document {
            caption: "db".into(),
            attachment: Attachment {
                filename: "db.json".into(),
                content: b"{}".to_vec(),
            },
        };
        let out = split_replies(vec![Reply::text("a\nb"), doc.clone()], 1);
        assert_eq!(out, vec![Reply::text("a"), Reply::text("b"), doc]);
    }
}
