//! Inline media-name extraction.
//!
//! Two grammars, tried in order. The primary one (anime) understands
//! `` `name` `` and `{name}`; the secondary one (manga) understands
//! `` `name` `` and `<name>`. The first grammar that yields any name decides
//! the category for the whole message.
//!
//! Alternatives without a capture group are false-positive filters: they
//! consume spans (fenced code, URLs, custom emoji, mentions, timestamps)
//! that would otherwise look like a delimited name. Only a fence that opens
//! a new line counts as code; a one-line ```` ```name``` ```` is a name.

use std::collections::HashSet;
use std::sync::LazyLock;

use kotatsu_schema::MediaCategory;
use regex::Regex;

/// Upper bound on lookups triggered by one message.
pub const MAX_CANDIDATES: usize = 10;

static PRIMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[^`\n]*\n[\s\S]*?```|`([^`]*)`|\{(.*?)\}").expect("primary grammar is valid")
});

static SECONDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<[^<>]*?https?://[^<>]*>",
        r"|<a?:[^:<>\s]+:\d*>",
        r"|</[^<>]+:\d+>",
        r"|<(?:@[!&]?|#)\d+>",
        r"|<t:-?\d+(?::[tTdDfFR])?>",
        r"|```[^`\n]*\n[\s\S]*?```",
        r"|`([^`]*)`",
        r"|<([^<>]*)>",
    ))
    .expect("secondary grammar is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub category: MediaCategory,
    pub names: Vec<String>,
}

/// Classifies `text` into at most one category and returns its names.
pub fn extract_media_names(text: &str) -> Option<Extraction> {
    [
        (MediaCategory::Anime, &*PRIMARY),
        (MediaCategory::Manga, &*SECONDARY),
    ]
    .into_iter()
    .find_map(|(category, grammar)| {
        let names = extract_with(grammar, text);
        (!names.is_empty()).then_some(Extraction { category, names })
    })
}

/// Runs one grammar. Names are trimmed, blank ones dropped, repeats
/// (case-insensitive) collapsed, and the list capped at [`MAX_CANDIDATES`].
pub fn extract_with(grammar: &Regex, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for caps in grammar.captures_iter(text) {
        let Some(group) = caps.iter().skip(1).flatten().next() else {
            continue;
        };
        let name = group.as_str().trim();
        if name.is_empty() || !seen.insert(name.to_lowercase()) {
            continue;
        }
        names.push(name.to_string());
        if names.len() == MAX_CANDIDATES {
            break;
        }
    }
    names
}
