// Output formatting for the terminal.

pub mod terminal;

/// Longest synopsis preview shown in result lists.
pub const SYNOPSIS_PREVIEW_CHARS: usize = 250;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..250]`), this respects UTF-8 character boundaries
/// and will never panic on multi-byte characters such as Japanese titles.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
