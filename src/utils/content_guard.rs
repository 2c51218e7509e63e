use serde_json::{json, Value};

/// Returns the first `max_chars` characters of `s` as a borrowed slice.
///
/// Counts Unicode scalar values, not bytes, so the cut always lands on a char boundary.
/// When `s` has `max_chars` characters or fewer the whole string is returned.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Builds a standardized error payload string for tool errors.
/// First line: short human-readable message.
/// Then a JSON object with fields: code, message, details.
pub fn build_error_payload(code: &str, message: &str, details: Value) -> String {
    let obj = json!({
        "code": code,
        "message": message,
        "details": details,
    });
    format!("{}\n{}", message, obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings_whole() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 10), "");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let text = "żółw".repeat(3);
        let cut = truncate_chars(&text, 5);
        assert_eq!(cut, "żółwż");
        assert_eq!(cut.chars().count(), 5);
    }

    #[test]
    fn truncate_to_zero_is_empty() {
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn error_payload_has_message_line_and_json_body() {
        let payload = build_error_payload("ERR_TEST", "Something broke", json!({"hint": "retry"}));
        let mut lines = payload.lines();
        assert_eq!(lines.next(), Some("Something broke"));
        let body: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(body["code"], "ERR_TEST");
        assert_eq!(body["message"], "Something broke");
        assert_eq!(body["details"]["hint"], "retry");
    }
}
