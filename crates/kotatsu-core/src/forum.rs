use async_trait::async_trait;
use kotatsu_provider::LookupError;
use kotatsu_schema::{OutboundMessage, ThreadContainer, ThreadEdit};

use crate::access::Permissions;
use crate::errors::WriteError;

/// The chat platform as seen by the engines: remote reads, the thread
/// mutation, and posting replies. The remote is the sole source of truth;
/// implementations must not cache.
#[async_trait]
pub trait ForumApi: Send + Sync {
    async fn fetch_container(&self, channel_id: u64) -> Result<ThreadContainer, LookupError>;

    /// Effective permissions of `user_id` in `container`.
    async fn user_permissions(
        &self,
        user_id: u64,
        container: &ThreadContainer,
    ) -> Result<Permissions, LookupError>;

    async fn member_roles(&self, guild_id: u64, user_id: u64) -> Result<Vec<u64>, LookupError>;

    /// Title and applied-tag update in one call.
    async fn edit_thread(&self, channel_id: u64, edit: &ThreadEdit) -> Result<(), WriteError>;

    async fn send_message(
        &self,
        channel_id: u64,
        message: &OutboundMessage,
    ) -> Result<(), WriteError>;
}
