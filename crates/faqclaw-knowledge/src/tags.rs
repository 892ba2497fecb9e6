//! Tagged answers — `Sintesi:`, `Approfondimento:` and `Collegamenti:` prefixes.

/// Semantic role of an answer string, from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerTag {
    /// `Sintesi:` — short summary, rendered first.
    Summary,
    /// `Approfondimento:` — longer explanation, rendered second.
    Detail,
    /// `Collegamenti:` — cross references, never rendered.
    Links,
}

impl AnswerTag {
    pub const ALL: [AnswerTag; 3] = [AnswerTag::Summary, AnswerTag::Detail, AnswerTag::Links];

    pub fn prefix(self) -> &'static str {
        match self {
            AnswerTag::Summary => "Sintesi:",
            AnswerTag::Detail => "Approfondimento:",
            AnswerTag::Links => "Collegamenti:",
        }
    }

    /// Split a tagged answer into its tag and the text after the prefix.
    pub fn parse(answer: &str) -> Option<(AnswerTag, &str)> {
        let trimmed = answer.trim_start();
        Self::ALL.into_iter().find_map(|tag| {
            let prefix = tag.prefix();
            let head = trimmed.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix)
                .then(|| (tag, trimmed[prefix.len()..].trim_start()))
        })
    }

    pub fn of(answer: &str) -> Option<AnswerTag> {
        Self::parse(answer).map(|(tag, _)| tag)
    }
}

/// Answers of one record, partitioned by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedAnswers {
    pub summary: Option<String>,
    pub detail: Option<String>,
    pub links: Vec<String>,
    /// Untagged answers plus repeated summary/detail entries, verbatim.
    pub extras: Vec<String>,
}

impl TaggedAnswers {
    pub fn parse(answers: &[String]) -> Self {
        let mut parsed = Self::default();
        for answer in answers {
            match AnswerTag::parse(answer) {
                Some((AnswerTag::Summary, text)) if parsed.summary.is_none() => {
                    parsed.summary = Some(text.to_string());
                }
                Some((AnswerTag::Detail, text)) if parsed.detail.is_none() => {
                    parsed.detail = Some(text.to_string());
                }
                Some((AnswerTag::Links, text)) => parsed.links.push(text.to_string()),
                _ => parsed.extras.push(answer.clone()),
            }
        }
        parsed
    }

    /// True when at least one answer carried a recognized prefix.
    pub fn has_tags(&self) -> bool {
        self.summary.is_some() || self.detail.is_some() || !self.links.is_empty()
    }
}

/// Index of the first `Approfondimento:` answer.
pub fn detail_position(answers: &[String]) -> Option<usize> {
    answers
        .iter()
        .position(|a| AnswerTag::of(a) == Some(AnswerTag::Detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_prefix_case_insensitive() {
        assert_eq!(
            AnswerTag::parse("sintesi: breve"),
            Some((AnswerTag::Summary, "breve"))
        );
        assert_eq!(
            AnswerTag::parse("APPROFONDIMENTO:lungo"),
            Some((AnswerTag::Detail, "lungo"))
        );
        assert_eq!(AnswerTag::of("Collegamenti: art. 3"), Some(AnswerTag::Links));
        assert_eq!(AnswerTag::of("Nessun tag"), None);
        assert_eq!(AnswerTag::of("Sint"), None);
    }

    #[test]
    fn test_parse_handles_multibyte_text() {
        assert_eq!(AnswerTag::of("è una risposta"), None);
        assert_eq!(AnswerTag::of("àèìòù"), None);
    }

    #[test]
    fn test_partition_keeps_first_of_each() {
        let answers = strings(&[
            "libera",
            "Sintesi: uno",
            "Approfondimento: due",
            "Sintesi: ancora",
            "Collegamenti: tre",
        ]);
        let parsed = TaggedAnswers::parse(&answers);
        assert_eq!(parsed.summary.as_deref(), Some("uno"));
        assert_eq!(parsed.detail.as_deref(), Some("due"));
        assert_eq!(parsed.links, vec!["tre"]);
        assert_eq!(parsed.extras, vec!["libera", "Sintesi: ancora"]);
        assert!(parsed.has_tags());
    }

    #[test]
    fn test_untagged_answers() {
        let parsed = TaggedAnswers::parse(&strings(&["a", "b"]));
        assert!(!parsed.has_tags());
        assert_eq!(parsed.extras.len(), 2);
    }

    #[test]
    fn test_detail_position() {
        let answers = strings(&["Sintesi: x", "approfondimento: y", "Approfondimento: z"]);
        assert_eq!(detail_position(&answers), Some(1));
        assert_eq!(detail_position(&strings(&["a"])), None);
    }
}
