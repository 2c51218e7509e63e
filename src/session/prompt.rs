use crate::utils::content_guard::truncate_chars;

/// Number of leading document characters quoted into each prompt.
pub const DOCUMENT_EXCERPT_CHARS: usize = 1000;

/// Combines the head of the document with the user's question.
pub fn build_augmented_prompt(document: &str, question: &str) -> String {
    format!(
        "Document content (truncated): {}...\n\nUser question: {}\nAnswer:",
        truncate_chars(document, DOCUMENT_EXCERPT_CHARS),
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_document_is_quoted_whole() {
        let prompt = build_augmented_prompt("Tiny doc.", "What?");
        assert_eq!(
            prompt,
            "Document content (truncated): Tiny doc....\n\nUser question: What?\nAnswer:"
        );
    }

    #[test]
    fn long_document_is_cut_at_exactly_one_thousand_chars() {
        let document: String = (0..3000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let prompt = build_augmented_prompt(&document, "Q");

        let expected_segment = format!("{}...", &document[..1000]);
        assert!(prompt.starts_with(&format!("Document content (truncated): {}\n\n", expected_segment)));
        assert!(!prompt.contains(&document[..1001]));
    }

    #[test]
    fn cut_ignores_word_and_multibyte_boundaries() {
        let document = "é".repeat(1500);
        let prompt = build_augmented_prompt(&document, "Q");
        let segment = prompt
            .strip_prefix("Document content (truncated): ")
            .and_then(|rest| rest.split("...\n\n").next())
            .unwrap();
        assert_eq!(segment.chars().count(), 1000);
    }
}
