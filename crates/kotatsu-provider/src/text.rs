//! Description cleanup for catalog payloads.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of characters kept from a catalog description.
pub const DESCRIPTION_LIMIT: usize = 800;

const TRUNCATION_MARKER: &str = "...";

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Removes HTML tags and the handful of entities the catalog emits, then
/// collapses blank lines.
pub fn strip_markup(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let stripped = MARKUP.replace_all(raw, "");
    let decoded = stripped
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    let mut out = decoded.replace("\r\n", "\n");
    while out.contains("\n\n") {
        out = out.replace("\n\n", "\n");
    }
    out.trim().to_string()
}

/// Cuts `text` to at most `limit` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{TRUNCATION_MARKER}", text[..byte_idx].trim_end()),
        None => text.to_string(),
    }
}

pub fn clean_description(raw: &str) -> String {
    truncate_chars(&strip_markup(raw), DESCRIPTION_LIMIT)
}
