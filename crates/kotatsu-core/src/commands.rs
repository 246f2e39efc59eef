//! The fixed moderator command table.
//!
//! A command is a message whose first token is the reserved marker followed
//! by a known key (`.solved`). Each command maps to a literal title prefix
//! and to the name of a managed forum tag. Managed tag names start with the
//! same marker, which is how the reconciler tells them apart from ordinary
//! tags.

/// Leading character of command tokens and of managed tag names.
pub const RESERVED_MARKER: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedCommand {
    pub key: &'static str,
    pub title_prefix: &'static str,
    pub status_tag: &'static str,
}

#[derive(Debug)]
pub struct CommandTable {
    commands: &'static [ManagedCommand],
}

/// Built once; passed by reference into the router.
pub static MANAGED_COMMANDS: CommandTable = CommandTable::new(&[
    ManagedCommand {
        key: "solved",
        title_prefix: "[Solved]",
        status_tag: ".Solved",
    },
    ManagedCommand {
        key: "aware",
        title_prefix: "[Devs aware]",
        status_tag: ".Devs aware",
    },
    ManagedCommand {
        key: "duplicate",
        title_prefix: "[Duplicate]",
        status_tag: ".Duplicate",
    },
    ManagedCommand {
        key: "false",
        title_prefix: "[False report]",
        status_tag: ".False report",
    },
    ManagedCommand {
        key: "known",
        title_prefix: "[Known issue]",
        status_tag: ".Known issue",
    },
    ManagedCommand {
        key: "wrong",
        title_prefix: "[Wrong channel]",
        status_tag: ".Wrong channel",
    },
]);

impl CommandTable {
    pub const fn new(commands: &'static [ManagedCommand]) -> Self {
        Self { commands }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ManagedCommand> {
        self.commands.iter()
    }

    pub fn get(&self, key: &str) -> Option<&'static ManagedCommand> {
        self.commands.iter().find(|c| c.key == key)
    }

    /// Every prefix the table can put on a title.
    pub fn title_prefixes(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.title_prefix).collect()
    }

    /// Resolves the command named by the first token of `text`. Unknown keys
    /// yield `None` so the marker stays usable for other purposes.
    pub fn parse(&self, text: &str) -> Option<&'static ManagedCommand> {
        let token = text.split_whitespace().next()?;
        let key = token
            .to_lowercase()
            .strip_prefix(RESERVED_MARKER)?
            .to_string();
        self.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn table_has_six_commands() {
        assert_eq!(MANAGED_COMMANDS.iter().count(), 6);
    }

    #[test]
    fn keys_prefixes_and_tags_are_unique() {
        let keys: HashSet<_> = MANAGED_COMMANDS.iter().map(|c| c.key).collect();
        let prefixes: HashSet<_> = MANAGED_COMMANDS.iter().map(|c| c.title_prefix).collect();
        let tags: HashSet<_> = MANAGED_COMMANDS.iter().map(|c| c.status_tag).collect();
        assert_eq!(keys.len(), 6);
        assert_eq!(prefixes.len(), 6);
        assert_eq!(tags.len(), 6);
    }

    #[test]
    fn status_tags_start_with_marker() {
        for command in MANAGED_COMMANDS.iter() {
            assert!(
                command.status_tag.starts_with(RESERVED_MARKER),
                "{} does not start with the marker",
                command.status_tag
            );
            assert_eq!(command.key, command.key.to_lowercase());
        }
    }

    #[test]
    fn parse_known_commands() {
        assert_eq!(MANAGED_COMMANDS.parse(".solved").map(|c| c.key), Some("solved"));
        assert_eq!(MANAGED_COMMANDS.parse("  .SOLVED  ").map(|c| c.key), Some("solved"));
        assert_eq!(
            MANAGED_COMMANDS.parse(".duplicate of #123").map(|c| c.key),
            Some("duplicate")
        );
        assert_eq!(MANAGED_COMMANDS.parse(".Known").map(|c| c.key), Some("known"));
    }

    #[test]
    fn parse_rejects_non_commands() {
        assert!(MANAGED_COMMANDS.parse("").is_none());
        assert!(MANAGED_COMMANDS.parse("solved").is_none());
        assert!(MANAGED_COMMANDS.parse(".unknown").is_none());
        assert!(MANAGED_COMMANDS.parse("this is .solved").is_none());
        assert!(MANAGED_COMMANDS.parse("..solved").is_none());
        assert!(MANAGED_COMMANDS.parse(".solvedx").is_none());
        assert!(MANAGED_COMMANDS.parse("...").is_none());
    }

    #[test]
    fn title_prefixes_cover_all_commands() {
        let prefixes = MANAGED_COMMANDS.title_prefixes();
        assert!(prefixes.contains(&"[Solved]"));
        assert!(prefixes.contains(&"[Wrong channel]"));
        assert_eq!(prefixes.len(), 6);
    }
}
