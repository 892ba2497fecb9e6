//! Answer formatter — turns stored answers into display text.
//!
//! Layout: summary, detail, then extras, separated by a blank line.
//! `Collegamenti:` entries are never shown. Without any recognized tag the
//! raw answers are joined line by line.

use crate::tags::TaggedAnswers;

pub fn format_answers(answers: &[String]) -> String {
    let tagged = TaggedAnswers::parse(answers);
    if !tagged.has_tags() {
        return answers.join("\n");
    }
    format_tagged(&tagged)
}

pub fn format_tagged(tagged: &TaggedAnswers) -> String {
    let mut blocks: Vec<String> = Vec::with_capacity(3);
    if let Some(summary) = &tagged.summary {
        blocks.push(summary.clone());
    }
    if let Some(detail) = &tagged.detail {
        blocks.push(detail.clone());
    }
    if !tagged.extras.is_empty() {
        blocks.push(tagged.extras.join("\n"));
    }
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_summary_detail_extras_order() {
        let answers = strings(&[
            "nota libera",
            "Approfondimento: spiegazione lunga",
            "Sintesi: in breve",
            "seconda nota",
        ]);
        assert_eq!(
            format_answers(&answers),
            "in breve\n\nspiegazione lunga\n\nnota libera\nseconda nota"
        );
    }

    #[test]
    fn test_untagged_fallback_joins_lines() {
        let answers = strings(&["uno", "due"]);
        assert_eq!(format_answers(&answers), "uno\ndue");
    }

    #[test]
    fn test_collegamenti_never_rendered() {
        let answers = strings(&["Collegamenti: art. 50 TUEL", "risposta semplice"]);
        let out = format_answers(&answers);
        assert_eq!(out, "risposta semplice");
        assert!(!out.contains("art. 50"));
        assert!(!out.contains("Collegamenti"));
    }

    #[test]
    fn test_only_links_formats_empty() {
        let answers = strings(&["Collegamenti: altrove"]);
        assert_eq!(format_answers(&answers), "");
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let answers = strings(&["Sintesi: a", "b", "Approfondimento: c"]);
        assert_eq!(format_answers(&answers), format_answers(&answers));
    }

    #[test]
    fn test_empty_answers() {
        assert_eq!(format_answers(&[]), "");
    }
}
