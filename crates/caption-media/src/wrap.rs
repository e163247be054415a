//! Greedy word wrapping for caption text.

/// Column width used for every caption.
pub const WRAP_WIDTH: usize = 25;

/// Wrap `text` into newline-joined lines of at most `max_width` characters.
///
/// Words are packed greedily; a word longer than `max_width` is placed alone
/// on its own line and never split. Control characters are dropped and every
/// run of whitespace (newlines included) separates words, so re-wrapping
/// already wrapped text at the same width yields the same output.
///
/// Empty input yields a single empty line.
pub fn wrap_text(text: &str, max_width: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in cleaned.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    lines.push(current);

    lines.join("\n")
}
