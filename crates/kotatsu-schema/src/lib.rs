use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message-creation event as delivered by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub trace_id: Uuid,
    pub message_id: u64,
    pub channel_id: u64,
    #[serde(default)]
    pub guild_id: Option<u64>,
    pub author_id: u64,
    /// Set for bots and webhooks.
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(channel_id: u64, author_id: u64, content: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            message_id: 0,
            channel_id,
            guild_id: None,
            author_id,
            author_is_bot: false,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Discord channel types the engine cares about. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    Forum,
    Media,
    Other(u8),
}

impl ChannelKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Text,
            10 => Self::AnnouncementThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            15 => Self::Forum,
            16 => Self::Media,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::AnnouncementThread => 10,
            Self::PublicThread => 11,
            Self::PrivateThread => 12,
            Self::Forum => 15,
            Self::Media => 16,
            Self::Other(raw) => raw,
        }
    }

    pub fn is_thread(self) -> bool {
        matches!(
            self,
            Self::AnnouncementThread | Self::PublicThread | Self::PrivateThread
        )
    }

    /// Channel types that own taggable threads.
    pub fn is_forum(self) -> bool {
        matches!(self, Self::Forum | Self::Media)
    }
}

/// A tag defined on a forum parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumTag {
    pub id: u64,
    pub name: String,
}

impl ForumTag {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Channel metadata normalised from the remote payload. Re-fetched for every
/// message; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadContainer {
    pub id: u64,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub guild_id: Option<u64>,
    #[serde(default)]
    pub name: String,
    pub kind: ChannelKind,
    #[serde(default)]
    pub nsfw: bool,
    /// Tag catalog; only populated on forum parents.
    #[serde(default)]
    pub available_tags: Vec<ForumTag>,
    /// Tag ids attached to a thread, in remote order.
    #[serde(default)]
    pub applied_tags: Vec<u64>,
}

impl ThreadContainer {
    pub fn new(id: u64, kind: ChannelKind) -> Self {
        Self {
            id,
            parent_id: None,
            guild_id: None,
            name: String::new(),
            kind,
            nsfw: false,
            available_tags: Vec::new(),
            applied_tags: Vec::new(),
        }
    }
}

/// The combined title + applied-tag update sent for a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEdit {
    pub name: String,
    pub applied_tags: Vec<u64>,
}

// ───────────────────────────── Outbound ─────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

// ───────────────────────────── Media ─────────────────────────────

/// Catalog bucket a lookup is performed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaCategory {
    Anime,
    Manga,
}

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anime => "ANIME",
            Self::Manga => "MANGA",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A possibly partial release date; catalogs often only know the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDate {
    pub year: i32,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (Some(month), Some(day)) => match NaiveDate::from_ymd_opt(self.year, month, day) {
                Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
                None => write!(f, "{:04}-{:02}", self.year, month),
            },
            (Some(month), None) => write!(f, "{:04}-{:02}", self.year, month),
            _ => write!(f, "{:04}", self.year),
        }
    }
}

/// One normalised catalog record. Built per query, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResult {
    pub catalog_id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub site_url: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub release_date: Option<ReleaseDate>,
}
