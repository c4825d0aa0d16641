//! Shared UTF-8-safe text helpers.
//!
//! Snapshot lines, tool results and status previews all cut text to a fixed
//! budget. Budgets are counted in characters, never bytes, so a cut can not
//! land inside a multi-byte character.

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Return the prefix of `text` holding at most `max_chars` characters.
pub fn prefix_by_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Truncate by characters and append `suffix` when truncation occurs.
pub fn truncate_with_suffix_by_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    format!("{}{suffix}", prefix_by_chars(text, max_chars))
}

/// Collapse every whitespace run into one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_by_chars_keeps_full_text_when_short() {
        assert_eq!(prefix_by_chars("hello", 10), "hello");
    }

    #[test]
    fn prefix_by_chars_counts_characters_not_bytes() {
        assert_eq!(prefix_by_chars("añb🙂c", 3), "añb");
        assert_eq!(prefix_by_chars("🙂🙂", 1), "🙂");
    }

    #[test]
    fn truncate_with_suffix_by_chars_limits_by_character_count() {
        let out = truncate_with_suffix_by_chars("ab🙂cd", 3, "...");
        assert_eq!(out, "ab🙂...");
        assert_eq!(truncate_with_suffix_by_chars("abc", 3, "..."), "abc");
    }

    #[test]
    fn collapse_whitespace_joins_runs() {
        assert_eq!(collapse_whitespace("  Pizza \n\t Hut  "), "Pizza Hut");
        assert_eq!(collapse_whitespace(" \n "), "");
    }
}
