use std::collections::HashSet;

use kotatsu_schema::ForumTag;

use crate::commands::RESERVED_MARKER;

pub fn is_managed_tag(tag: &ForumTag) -> bool {
    tag.name.starts_with(RESERVED_MARKER)
}

/// Case-insensitive exact match on the tag name.
pub fn find_status_tag<'a>(catalog: &'a [ForumTag], status_tag: &str) -> Option<&'a ForumTag> {
    let wanted = status_tag.to_lowercase();
    catalog.iter().find(|t| t.name.to_lowercase() == wanted)
}

/// Drops every managed tag from `applied` and appends `requested`.
///
/// Unmanaged ids keep their order (and duplicates, if the remote had any);
/// the managed part of the result is exactly `{requested}`.
pub fn reconcile_applied_tags(catalog: &[ForumTag], requested: u64, applied: &[u64]) -> Vec<u64> {
    let managed: HashSet<u64> = catalog
        .iter()
        .filter(|t| is_managed_tag(t))
        .map(|t| t.id)
        .collect();

    let mut result: Vec<u64> = applied
        .iter()
        .copied()
        .filter(|id| !managed.contains(id) && *id != requested)
        .collect();
    result.push(requested);
    result
}
