use kotatsu_schema::ChannelKind;

use crate::forum::ForumApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentStatus {
    Forum { id: u64, name: String },
    NotAForum { id: u64, kind: ChannelKind },
    Inaccessible { id: u64, reason: String },
}

impl ParentStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Forum { .. })
    }
}

/// Checks each configured forum parent once at startup. Problems are
/// logged, never fatal: a parent can be fixed while the bot runs.
pub async fn validate_forum_parents(
    api: &dyn ForumApi,
    parent_ids: impl IntoIterator<Item = u64>,
) -> Vec<ParentStatus> {
    let mut ids: Vec<u64> = parent_ids.into_iter().collect();
    ids.sort_unstable();

    let mut statuses = Vec::with_capacity(ids.len());
    for id in ids {
        let status = match api.fetch_container(id).await {
            Err(e) => {
                tracing::warn!(parent_id = id, "forum parent is not accessible: {e}");
                ParentStatus::Inaccessible {
                    id,
                    reason: e.to_string(),
                }
            }
            Ok(channel) if !channel.kind.is_forum() => {
                tracing::warn!(
                    parent_id = id,
                    kind = channel.kind.raw(),
                    "configured forum parent is not a forum channel"
                );
                ParentStatus::NotAForum {
                    id,
                    kind: channel.kind,
                }
            }
            Ok(channel) => {
                tracing::info!(parent_id = id, name = %channel.name, "forum parent OK");
                ParentStatus::Forum {
                    id,
                    name: channel.name,
                }
            }
        };
        statuses.push(status);
    }
    statuses
}
