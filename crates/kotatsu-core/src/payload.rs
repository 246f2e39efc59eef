//! Channel payload normalisation.
//!
//! The remote hands back channels in two shapes: the bare channel object
//! (preferred), or the same object wrapped as `{"channel": {...}}`.
//! Snowflakes arrive as strings or as numbers.
//! Everything is folded into one [`ThreadContainer`] here so the
//! reconciliation code never sees payload details.

use kotatsu_provider::LookupError;
use kotatsu_schema::{ChannelKind, ForumTag, ThreadContainer};
use serde::Deserialize;

/// A snowflake that may be encoded as a string or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IdRepr")]
pub struct WireId(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<IdRepr> for WireId {
    type Error = String;

    fn try_from(value: IdRepr) -> Result<Self, Self::Error> {
        match value {
            IdRepr::Number(n) => Ok(Self(n)),
            IdRepr::Text(s) => s
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| format!("invalid snowflake: {s:?}")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChannelPayload {
    Bare(RawChannel),
    Wrapped { channel: RawChannel },
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: WireId,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    parent_id: Option<WireId>,
    #[serde(default)]
    guild_id: Option<WireId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nsfw: Option<bool>,
    #[serde(default)]
    available_tags: Option<Vec<RawTag>>,
    #[serde(default)]
    applied_tags: Option<Vec<WireId>>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    id: WireId,
    name: String,
}

pub fn parse_channel(body: &[u8]) -> Result<ThreadContainer, LookupError> {
    let payload: ChannelPayload = serde_json::from_slice(body)?;
    let raw = match payload {
        ChannelPayload::Bare(raw) => raw,
        ChannelPayload::Wrapped { channel } => channel,
    };
    Ok(normalize(raw))
}

fn normalize(raw: RawChannel) -> ThreadContainer {
    ThreadContainer {
        id: raw.id.0,
        parent_id: raw.parent_id.map(|id| id.0),
        guild_id: raw.guild_id.map(|id| id.0),
        name: raw.name.unwrap_or_default(),
        kind: ChannelKind::from_raw(raw.kind),
        nsfw: raw.nsfw.unwrap_or(false),
        available_tags: raw
            .available_tags
            .unwrap_or_default()
            .into_iter()
            .map(|t| ForumTag::new(t.id.0, t.name))
            .collect(),
        applied_tags: raw
            .applied_tags
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.0)
            .collect(),
    }
}
