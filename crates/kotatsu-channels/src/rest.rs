//! Discord REST v10 client behind [`ForumApi`].
//!
//! Requests go through reqwest rather than the gateway client so that
//! rate-limit headers reach [`WriteError::Throttled`] untouched. Nothing is
//! retried here.

use std::time::Duration;

use async_trait::async_trait;
use kotatsu_core::{
    parse_channel, ForumApi, LookupError, Permissions, RateLimitInfo, WriteError,
};
use kotatsu_schema::{OutboundMessage, ThreadContainer, ThreadEdit};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serenity::model::channel::GuildChannel;
use serenity::model::guild::{Member, PartialGuild};

pub const USER_AGENT: &str = "DiscordBot (kotatsu, 0.1)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct DiscordRest {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    retry_after: Option<f64>,
    #[serde(default)]
    global: Option<bool>,
}

/// Tag ids go out as strings, like every other snowflake.
#[derive(Serialize)]
struct ThreadPatch<'a> {
    name: &'a str,
    applied_tags: Vec<String>,
}

impl DiscordRest {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.api_base))
            .header("Authorization", format!("Bot {}", self.token))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, LookupError> {
        let resp = self.request(reqwest::Method::GET, path).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn write(&self, builder: reqwest::RequestBuilder) -> Result<(), WriteError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| WriteError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let headers = resp.headers().clone();
        let body: ErrorBody = resp.json().await.unwrap_or_default();
        let rate_limit = rate_limit_info(&headers, &body);
        Err(WriteError::from_status(
            status.as_u16(),
            body.message,
            rate_limit,
        ))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LookupError> {
        Ok(serde_json::from_slice(&self.get(path).await?)?)
    }

    /// The member payload has no guild id; it is filled in before decoding.
    async fn member(&self, guild_id: u64, user_id: u64) -> Result<Member, LookupError> {
        let mut value: serde_json::Value = self
            .get_json(&format!("/guilds/{guild_id}/members/{user_id}"))
            .await?;
        if let Some(map) = value.as_object_mut() {
            map.insert("guild_id".to_string(), guild_id.to_string().into());
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn rate_limit_info(headers: &HeaderMap, body: &ErrorBody) -> RateLimitInfo {
    let global_header = headers.contains_key("x-ratelimit-global")
        || header::<String>(headers, "x-ratelimit-scope").as_deref() == Some("global");
    RateLimitInfo {
        limit: header(headers, "x-ratelimit-limit"),
        remaining: header(headers, "x-ratelimit-remaining"),
        reset_after: header(headers, "x-ratelimit-reset-after"),
        retry_after: body.retry_after.or_else(|| header(headers, "retry-after")),
        global: global_header || body.global.unwrap_or(false),
        bucket: header(headers, "x-ratelimit-bucket"),
    }
}

#[async_trait]
impl ForumApi for DiscordRest {
    async fn fetch_container(&self, channel_id: u64) -> Result<ThreadContainer, LookupError> {
        parse_channel(&self.get(&format!("/channels/{channel_id}")).await?)
    }

    /// Threads carry no overwrites of their own; the parent's apply.
    async fn user_permissions(
        &self,
        user_id: u64,
        container: &ThreadContainer,
    ) -> Result<Permissions, LookupError> {
        let guild_id = container.guild_id.ok_or_else(|| {
            LookupError::Malformed(format!("channel {} has no guild id", container.id))
        })?;
        let channel_id = match container.parent_id {
            Some(parent_id) if container.kind.is_thread() => parent_id,
            _ => container.id,
        };
        let guild: PartialGuild = self.get_json(&format!("/guilds/{guild_id}")).await?;
        let member = self.member(guild_id, user_id).await?;
        let channel: GuildChannel = self.get_json(&format!("/channels/{channel_id}")).await?;
        Ok(guild.user_permissions_in(&channel, &member))
    }

    async fn member_roles(&self, guild_id: u64, user_id: u64) -> Result<Vec<u64>, LookupError> {
        let member = self.member(guild_id, user_id).await?;
        Ok(member.roles.iter().map(|id| id.get()).collect())
    }

    async fn edit_thread(&self, channel_id: u64, edit: &ThreadEdit) -> Result<(), WriteError> {
        let patch = ThreadPatch {
            name: &edit.name,
            applied_tags: edit.applied_tags.iter().map(u64::to_string).collect(),
        };
        self.write(
            self.request(reqwest::Method::PATCH, &format!("/channels/{channel_id}"))
                .json(&patch),
        )
        .await
    }

    async fn send_message(
        &self,
        channel_id: u64,
        message: &OutboundMessage,
    ) -> Result<(), WriteError> {
        self.write(
            self.request(
                reqwest::Method::POST,
                &format!("/channels/{channel_id}/messages"),
            )
            .json(message),
        )
        .await
    }
}
