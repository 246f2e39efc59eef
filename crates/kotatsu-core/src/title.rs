/// Discord rejects thread names longer than this.
pub const MAX_THREAD_NAME_CHARS: usize = 100;

/// Strips every leading managed prefix from `title`, then puts `prefix` in
/// front. Only the literal managed prefixes are recognised, so other
/// bracketed text the author typed survives.
pub fn apply_title_prefix(title: &str, prefix: &str, managed_prefixes: &[&str]) -> String {
    let mut rest = title.trim();
    'strip: loop {
        for managed in managed_prefixes {
            if let Some(remaining) = strip_prefix_ignore_case(rest, managed) {
                rest = remaining.trim_start();
                continue 'strip;
            }
        }
        break;
    }

    let titled = format!("{prefix} {rest}");
    let titled = titled.trim_end();
    match titled.char_indices().nth(MAX_THREAD_NAME_CHARS) {
        Some((byte_idx, _)) => titled[..byte_idx].trim_end().to_string(),
        None => titled.to_string(),
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}
