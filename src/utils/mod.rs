use std::time::Duration;

/// Remove a Markdown code fence around a model answer.
///
/// Handles ```` ```json ```` and bare ```` ``` ```` fences, with or without a
/// closing fence. Unfenced text is only trimmed.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(fence_start) = trimmed.find("```") else {
        return trimmed;
    };

    let mut body = &trimmed[fence_start + 3..];
    if body.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
        body = &body[4..];
    }

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// The last `count` characters of `text`, on a char boundary.
pub fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    match text.char_indices().rev().nth(count - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// `H:MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRAY: &str = r#"[{"title": "Crust", "description": "Basics"}]"#;

    #[test]
    fn test_strip_json_fence() {
        let response = format!("```json\n{}\n```", ARRAY);
        assert_eq!(strip_code_fences(&response), ARRAY);
    }

    #[test]
    fn test_strip_bare_fence_with_chatter() {
        let response = format!("Here you go:\n```\n{}\n```\nEnjoy!", ARRAY);
        assert_eq!(strip_code_fences(&response), ARRAY);
    }

    #[test]
    fn test_strip_unfenced_and_unclosed() {
        assert_eq!(strip_code_fences(&format!("  {}\n", ARRAY)), ARRAY);
        assert_eq!(strip_code_fences(&format!("```JSON\n{}", ARRAY)), ARRAY);
    }

    #[test]
    fn test_strip_is_idempotent() {
        let once = strip_code_fences("```json\n[1, 2, 3]\n```");
        assert_eq!(strip_code_fences(once), once);
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("abc", 3), "abc");
        assert_eq!(tail_chars("abc", 0), "");
        assert_eq!(tail_chars("tarte \u{e0} la cr\u{e8}me", 4), "r\u{e8}me");
    }

    #[test]
    fn test_counts_on_known_sample() {
        let sample = "# Chapter 1: Crust\n\nFlour,  butter\tand water.\n";
        assert_eq!(word_count(sample), 8);
        assert_eq!(char_count(sample), sample.len());
        assert_eq!(char_count("pi\u{e8}ce"), 5);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
    }
}
