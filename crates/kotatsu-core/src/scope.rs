use std::collections::HashSet;

use kotatsu_schema::ThreadContainer;

/// Allow-lists restricting where each engine operates. Empty means everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Forum parents whose threads accept commands.
    pub forum_parent_ids: HashSet<u64>,
    /// Channels or threads (matched on id or parent id) where lookups run.
    pub search_channel_ids: HashSet<u64>,
}

/// Why a message was not processed. Never reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRejection {
    AutomatedAuthor,
    NotAThread,
    MissingParent,
    ParentNotWatched,
    ChannelNotAllowed,
}

impl ScopeConfig {
    pub fn check_command(
        &self,
        author_is_bot: bool,
        container: &ThreadContainer,
    ) -> Result<(), ScopeRejection> {
        if author_is_bot {
            return Err(ScopeRejection::AutomatedAuthor);
        }
        if !container.kind.is_thread() {
            return Err(ScopeRejection::NotAThread);
        }
        let Some(parent_id) = container.parent_id else {
            return Err(ScopeRejection::MissingParent);
        };
        if !self.forum_parent_ids.is_empty() && !self.forum_parent_ids.contains(&parent_id) {
            return Err(ScopeRejection::ParentNotWatched);
        }
        Ok(())
    }

    pub fn check_search(
        &self,
        author_is_bot: bool,
        container: &ThreadContainer,
    ) -> Result<(), ScopeRejection> {
        if author_is_bot {
            return Err(ScopeRejection::AutomatedAuthor);
        }
        if self.search_channel_ids.is_empty() {
            return Ok(());
        }
        let listed = self.search_channel_ids.contains(&container.id)
            || container
                .parent_id
                .is_some_and(|parent| self.search_channel_ids.contains(&parent));
        if listed {
            Ok(())
        } else {
            Err(ScopeRejection::ChannelNotAllowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use kotatsu_schema::ChannelKind;

    use super::*;

    fn thread(id: u64, parent: Option<u64>) -> ThreadContainer {
        ThreadContainer {
            parent_id: parent,
            ..ThreadContainer::new(id, ChannelKind::PublicThread)
        }
    }

    fn scope(parents: &[u64], search: &[u64]) -> ScopeConfig {
        ScopeConfig {
            forum_parent_ids: parents.iter().copied().collect(),
            search_channel_ids: search.iter().copied().collect(),
        }
    }

    #[test]
    fn bots_are_rejected_first() {
        let cfg = scope(&[], &[]);
        let text = ThreadContainer::new(1, ChannelKind::Text);
        assert_eq!(
            cfg.check_command(true, &text),
            Err(ScopeRejection::AutomatedAuthor)
        );
        assert_eq!(
            cfg.check_search(true, &text),
            Err(ScopeRejection::AutomatedAuthor)
        );
    }

    #[test]
    fn commands_require_a_thread() {
        let cfg = scope(&[], &[]);
        assert_eq!(
            cfg.check_command(false, &ThreadContainer::new(1, ChannelKind::Text)),
            Err(ScopeRejection::NotAThread)
        );
        assert_eq!(
            cfg.check_command(false, &ThreadContainer::new(1, ChannelKind::Forum)),
            Err(ScopeRejection::NotAThread)
        );
        assert_eq!(cfg.check_command(false, &thread(1, Some(10))), Ok(()));
        let private = ThreadContainer {
            parent_id: Some(10),
            ..ThreadContainer::new(2, ChannelKind::PrivateThread)
        };
        assert_eq!(cfg.check_command(false, &private), Ok(()));
    }

    #[test]
    fn command_parent_allow_list() {
        let cfg = scope(&[10, 11], &[]);
        assert_eq!(cfg.check_command(false, &thread(1, Some(10))), Ok(()));
        assert_eq!(
            cfg.check_command(false, &thread(1, Some(99))),
            Err(ScopeRejection::ParentNotWatched)
        );
        assert_eq!(
            cfg.check_command(false, &thread(1, None)),
            Err(ScopeRejection::MissingParent)
        );
    }

    #[test]
    fn empty_search_allow_list_allows_everything() {
        let cfg = scope(&[], &[]);
        assert_eq!(
            cfg.check_search(false, &ThreadContainer::new(5, ChannelKind::Text)),
            Ok(())
        );
    }

    #[test]
    fn search_allow_list_matches_channel_or_parent() {
        let cfg = scope(&[], &[5]);
        assert_eq!(
            cfg.check_search(false, &ThreadContainer::new(5, ChannelKind::Text)),
            Ok(())
        );
        assert_eq!(cfg.check_search(false, &thread(7, Some(5))), Ok(()));
        assert_eq!(
            cfg.check_search(false, &thread(7, Some(6))),
            Err(ScopeRejection::ChannelNotAllowed)
        );
        assert_eq!(
            cfg.check_search(false, &ThreadContainer::new(6, ChannelKind::Text)),
            Err(ScopeRejection::ChannelNotAllowed)
        );
    }
}
