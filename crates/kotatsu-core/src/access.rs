//! Who may run state-changing commands.
//!
//! Three mutually exclusive policies, picked at startup in fixed priority:
//!
//! 1. Allowed role ids → the member must hold at least one of them
//! 2. Allowed permission names → the channel bitmask must hit one of them
//! 3. Default → the bitmask must hit any moderator-level permission

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use kotatsu_provider::LookupError;
use kotatsu_schema::ThreadContainer;
pub use serenity::model::Permissions;
use thiserror::Error;

use crate::forum::ForumApi;

/// Bits accepted when no explicit policy is configured.
pub const DEFAULT_MODERATOR_PERMISSIONS: Permissions = Permissions::MANAGE_CHANNELS
    .union(Permissions::MANAGE_ROLES)
    .union(Permissions::MANAGE_MESSAGES)
    .union(Permissions::ADMINISTRATOR);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionName {
    Administrator,
    ManageChannels,
    ManageRoles,
    ManageMessages,
}

impl PermissionName {
    pub fn permission(self) -> Permissions {
        match self {
            Self::Administrator => Permissions::ADMINISTRATOR,
            Self::ManageChannels => Permissions::MANAGE_CHANNELS,
            Self::ManageRoles => Permissions::MANAGE_ROLES,
            Self::ManageMessages => Permissions::MANAGE_MESSAGES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "ADMINISTRATOR",
            Self::ManageChannels => "MANAGE_CHANNELS",
            Self::ManageRoles => "MANAGE_ROLES",
            Self::ManageMessages => "MANAGE_MESSAGES",
        }
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission name: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for PermissionName {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMINISTRATOR" => Ok(Self::Administrator),
            "MANAGE_CHANNELS" => Ok(Self::ManageChannels),
            "MANAGE_ROLES" => Ok(Self::ManageRoles),
            "MANAGE_MESSAGES" => Ok(Self::ManageMessages),
            _ => Err(UnknownPermission(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    Roles(HashSet<u64>),
    Permissions(Vec<PermissionName>),
    Default,
}

impl AccessPolicy {
    /// Role ids win over permission names when both are configured.
    pub fn from_lists(role_ids: Vec<u64>, permissions: Vec<PermissionName>) -> Self {
        if !role_ids.is_empty() {
            Self::Roles(role_ids.into_iter().collect())
        } else if !permissions.is_empty() {
            Self::Permissions(permissions)
        } else {
            Self::Default
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Roles(_) => "roles",
            Self::Permissions(_) => "permissions",
            Self::Default => "default",
        }
    }

    /// Pure decision once the remote facts are known. `member_roles` is
    /// only consulted in role mode.
    pub fn permits(&self, permissions: Permissions, member_roles: &[u64]) -> bool {
        match self {
            Self::Roles(allowed) => member_roles.iter().any(|r| allowed.contains(r)),
            Self::Permissions(names) => names.iter().any(|n| permissions.intersects(n.permission())),
            Self::Default => permissions.intersects(DEFAULT_MODERATOR_PERMISSIONS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    policy: AccessPolicy,
}

impl PermissionEvaluator {
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// `Err` means the facts could not be fetched, which is not a denial.
    pub async fn authorize(
        &self,
        api: &dyn ForumApi,
        user_id: u64,
        container: &ThreadContainer,
    ) -> Result<bool, LookupError> {
        let permissions = api.user_permissions(user_id, container).await?;
        let roles = match &self.policy {
            AccessPolicy::Roles(_) => {
                let guild_id = container.guild_id.ok_or_else(|| {
                    LookupError::Malformed(format!("channel {} has no guild id", container.id))
                })?;
                api.member_roles(guild_id, user_id).await?
            }
            _ => Vec::new(),
        };
        Ok(self.policy.permits(permissions, &roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOD_ROLE: u64 = 200;
    const HELPER_ROLE: u64 = 201;

    #[test]
    fn permission_names_parse_case_insensitively() {
        assert_eq!("administrator".parse::<PermissionName>(), Ok(PermissionName::Administrator));
        assert_eq!(" MANAGE_CHANNELS ".parse::<PermissionName>(), Ok(PermissionName::ManageChannels));
        assert_eq!("Manage_Roles".parse::<PermissionName>(), Ok(PermissionName::ManageRoles));
        assert_eq!("MANAGE_MESSAGES".parse::<PermissionName>(), Ok(PermissionName::ManageMessages));
        assert_eq!(
            "KICK_MEMBERS".parse::<PermissionName>(),
            Err(UnknownPermission("KICK_MEMBERS".into()))
        );
    }

    #[test]
    fn role_mode_takes_precedence() {
        let policy = AccessPolicy::from_lists(vec![MOD_ROLE], vec![PermissionName::Administrator]);
        assert_eq!(policy.mode(), "roles");
        // Administrator bits do not help in role mode.
        assert!(!policy.permits(Permissions::ADMINISTRATOR, &[HELPER_ROLE]));
        assert!(policy.permits(Permissions::empty(), &[HELPER_ROLE, MOD_ROLE]));
    }

    #[test]
    fn permission_mode_checks_named_bits_only() {
        let policy = AccessPolicy::from_lists(vec![], vec![PermissionName::ManageRoles]);
        assert_eq!(policy.mode(), "permissions");
        assert!(policy.permits(Permissions::MANAGE_ROLES, &[]));
        assert!(!policy.permits(Permissions::MANAGE_MESSAGES | Permissions::MANAGE_CHANNELS, &[]));
    }

    #[test]
    fn default_mode_accepts_any_moderator_bit() {
        let policy = AccessPolicy::from_lists(vec![], vec![]);
        assert_eq!(policy, AccessPolicy::Default);
        for bit in [
            Permissions::MANAGE_CHANNELS,
            Permissions::MANAGE_ROLES,
            Permissions::MANAGE_MESSAGES,
            Permissions::ADMINISTRATOR,
        ] {
            assert!(policy.permits(bit | Permissions::SEND_MESSAGES, &[]));
        }
        assert!(!policy.permits(Permissions::SEND_MESSAGES | Permissions::MANAGE_THREADS, &[]));
        assert!(!policy.permits(Permissions::empty(), &[]));
    }
}
