#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kotatsu_core::{ForumApi, LookupError, MediaCatalog, Permissions, WriteError};
use kotatsu_schema::{
    ChannelKind, ForumTag, MediaCategory, MediaResult, OutboundMessage, ThreadContainer,
    ThreadEdit,
};

pub const GUILD: u64 = 1;
pub const FORUM: u64 = 1000;
pub const THREAD: u64 = 2000;
pub const TEXT_CHANNEL: u64 = 3000;
pub const MODERATOR: u64 = 500;
pub const MEMBER: u64 = 600;

pub const SOLVED: u64 = 10;
pub const DUPLICATE: u64 = 11;
pub const COMMUNITY_HELP: u64 = 12;
pub const BUG: u64 = 13;

/// In-memory forum that applies edits to its own state and records every
/// mutation and reply.
#[derive(Default)]
pub struct FakeForum {
    pub channels: Mutex<HashMap<u64, ThreadContainer>>,
    pub permissions: Mutex<HashMap<u64, Permissions>>,
    pub roles: Mutex<HashMap<u64, Vec<u64>>>,
    pub fetches: Mutex<Vec<u64>>,
    pub edits: Mutex<Vec<(u64, ThreadEdit)>>,
    pub sent: Mutex<Vec<(u64, OutboundMessage)>>,
    pub edit_delay: Option<Duration>,
    pub edit_error: Option<WriteError>,
    pub permissions_unavailable: bool,
}

impl FakeForum {
    /// Forum defining `.Solved` and `.Duplicate` (but not `.Known issue`)
    /// and a thread tagged `.Duplicate` + `community-help`.
    pub fn seeded() -> Self {
        let forum = FakeForum::default();
        forum.insert(ThreadContainer {
            guild_id: Some(GUILD),
            name: "bug-reports".into(),
            available_tags: vec![
                ForumTag::new(SOLVED, ".Solved"),
                ForumTag::new(DUPLICATE, ".Duplicate"),
                ForumTag::new(COMMUNITY_HELP, "community-help"),
                ForumTag::new(BUG, "bug"),
            ],
            ..ThreadContainer::new(FORUM, ChannelKind::Forum)
        });
        forum.insert(ThreadContainer {
            parent_id: Some(FORUM),
            guild_id: Some(GUILD),
            name: "Game crashes".into(),
            applied_tags: vec![DUPLICATE, COMMUNITY_HELP],
            ..ThreadContainer::new(THREAD, ChannelKind::PublicThread)
        });
        forum.insert(ThreadContainer {
            guild_id: Some(GUILD),
            name: "general".into(),
            ..ThreadContainer::new(TEXT_CHANNEL, ChannelKind::Text)
        });
        forum.grant(MODERATOR, Permissions::MANAGE_MESSAGES);
        forum.grant(MEMBER, Permissions::SEND_MESSAGES);
        forum
    }

    pub fn insert(&self, channel: ThreadContainer) {
        self.channels.lock().unwrap().insert(channel.id, channel);
    }

    pub fn grant(&self, user_id: u64, permissions: Permissions) {
        self.permissions.lock().unwrap().insert(user_id, permissions);
    }

    pub fn channel(&self, id: u64) -> ThreadContainer {
        self.channels.lock().unwrap()[&id].clone()
    }

    pub fn edits(&self) -> Vec<(u64, ThreadEdit)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, m)| m.content.clone())
            .collect()
    }

    pub fn sent(&self) -> Vec<(u64, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn tag_names(&self, channel_id: u64) -> Vec<String> {
        let forum = self.channel(FORUM);
        self.channel(channel_id)
            .applied_tags
            .iter()
            .filter_map(|id| forum.available_tags.iter().find(|t| t.id == *id))
            .map(|t| t.name.clone())
            .collect()
    }
}

#[async_trait]
impl ForumApi for FakeForum {
    async fn fetch_container(&self, channel_id: u64) -> Result<ThreadContainer, LookupError> {
        self.fetches.lock().unwrap().push(channel_id);
        self.channels
            .lock()
            .unwrap()
            .get(&channel_id)
            .cloned()
            .ok_or_else(|| LookupError::Status {
                status: 404,
                body: "Unknown Channel".into(),
            })
    }

    async fn user_permissions(
        &self,
        user_id: u64,
        _container: &ThreadContainer,
    ) -> Result<Permissions, LookupError> {
        if self.permissions_unavailable {
            return Err(LookupError::Timeout);
        }
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .get(&user_id)
            .copied()
            .unwrap_or_default())
    }

    async fn member_roles(&self, _guild_id: u64, user_id: u64) -> Result<Vec<u64>, LookupError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn edit_thread(&self, channel_id: u64, edit: &ThreadEdit) -> Result<(), WriteError> {
        if let Some(delay) = self.edit_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.edit_error {
            return Err(err.clone());
        }
        self.edits.lock().unwrap().push((channel_id, edit.clone()));
        if let Some(channel) = self.channels.lock().unwrap().get_mut(&channel_id) {
            channel.name = edit.name.clone();
            channel.applied_tags = edit.applied_tags.clone();
        }
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: u64,
        message: &OutboundMessage,
    ) -> Result<(), WriteError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel_id, message.clone()));
        Ok(())
    }
}

/// Catalog keyed by lowercase name. Names in `failing` return a lookup error.
#[derive(Default)]
pub struct FakeCatalog {
    pub entries: HashMap<String, MediaResult>,
    pub failing: HashSet<String>,
    pub queries: Mutex<Vec<(String, MediaCategory, bool)>>,
}

impl FakeCatalog {
    pub fn with(titles: &[&str]) -> Self {
        let entries = titles
            .iter()
            .enumerate()
            .map(|(i, title)| (title.to_lowercase(), media(title, i as i64 + 1)))
            .collect();
        Self {
            entries,
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<(String, MediaCategory, bool)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaCatalog for FakeCatalog {
    async fn search(
        &self,
        name: &str,
        category: MediaCategory,
        allow_adult: bool,
    ) -> Result<Option<MediaResult>, LookupError> {
        self.queries
            .lock()
            .unwrap()
            .push((name.to_string(), category, allow_adult));
        let key = name.to_lowercase();
        if self.failing.contains(&key) {
            return Err(LookupError::Transport("connection reset".into()));
        }
        Ok(self.entries.get(&key).cloned())
    }
}

pub fn media(title: &str, id: i64) -> MediaResult {
    MediaResult {
        catalog_id: id,
        title: title.to_string(),
        description: format!("About {title}."),
        genres: vec!["Adventure".into()],
        cover_image_url: Some(format!("https://img.example/{id}.jpg")),
        site_url: format!("https://anilist.co/anime/{id}"),
        format: Some("TV".into()),
        release_date: None,
    }
}
