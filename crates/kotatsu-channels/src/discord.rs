use std::sync::Arc;

use chrono::Utc;
use kotatsu_core::{Dispatched, Dispatcher};
use kotatsu_schema::InboundMessage;
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::async_trait;
use uuid::Uuid;

/// Builds the engine-side event from the fields of a gateway message.
/// Webhook posts count as automated.
pub fn to_inbound(
    message_id: u64,
    guild_id: Option<u64>,
    channel_id: u64,
    author_id: u64,
    author_is_bot: bool,
    is_webhook: bool,
    text: &str,
) -> InboundMessage {
    InboundMessage {
        trace_id: Uuid::new_v4(),
        message_id,
        channel_id,
        guild_id,
        author_id,
        author_is_bot: author_is_bot || is_webhook,
        content: text.to_string(),
        at: Utc::now(),
    }
}

pub struct DiscordBot {
    token: String,
    dispatcher: Arc<Dispatcher>,
}

impl DiscordBot {
    pub fn new(token: String, dispatcher: Arc<Dispatcher>) -> Self {
        Self { token, dispatcher }
    }

    pub async fn run_impl(self) -> anyhow::Result<()> {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let handler = DiscordHandler {
            dispatcher: self.dispatcher,
        };

        let mut client = Client::builder(self.token, intents)
            .event_handler(handler)
            .await?;
        client.start().await?;
        Ok(())
    }
}

#[async_trait]
impl crate::ChannelBot for DiscordBot {
    fn channel_type(&self) -> &str {
        "discord"
    }

    async fn run(self: Box<Self>) -> anyhow::Result<()> {
        (*self).run_impl().await
    }
}

struct DiscordHandler {
    dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            "discord bot connected: {} ({} guilds)",
            ready.user.name,
            ready.guilds.len()
        );
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let inbound = to_inbound(
            msg.id.get(),
            msg.guild_id.map(|id| id.get()),
            msg.channel_id.get(),
            msg.author.id.get(),
            msg.author.bot,
            msg.webhook_id.is_some(),
            &msg.content,
        );
        if inbound.author_is_bot || inbound.content.trim().is_empty() {
            return;
        }

        // One task per message; a failure here never reaches the gateway loop.
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let trace_id = inbound.trace_id;
            match dispatcher.dispatch(inbound).await {
                Dispatched::Command(outcome) => {
                    tracing::debug!(%trace_id, ?outcome, "command handled");
                }
                Dispatched::Search(handle) => match handle.await {
                    Ok(outcome) => tracing::debug!(%trace_id, ?outcome, "search finished"),
                    Err(err) => tracing::error!(%trace_id, "search task failed: {err}"),
                },
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_inbound_sets_fields() {
        let msg = to_inbound(7, Some(1), 2000, 500, false, false, ".solved");
        assert_eq!(msg.message_id, 7);
        assert_eq!(msg.guild_id, Some(1));
        assert_eq!(msg.channel_id, 2000);
        assert_eq!(msg.author_id, 500);
        assert!(!msg.author_is_bot);
        assert_eq!(msg.content, ".solved");
    }

    #[test]
    fn webhooks_count_as_automated() {
        assert!(to_inbound(1, None, 2, 3, false, true, "hi").author_is_bot);
        assert!(to_inbound(1, None, 2, 3, true, false, "hi").author_is_bot);
    }

    #[test]
    fn to_inbound_preserves_text() {
        let text = "  `One Piece` 世界  ";
        assert_eq!(to_inbound(1, None, 2, 3, false, false, text).content, text);
    }

    #[test]
    fn trace_ids_are_unique() {
        let a = to_inbound(1, None, 2, 3, false, false, "x");
        let b = to_inbound(1, None, 2, 3, false, false, "x");
        assert_ne!(a.trace_id, b.trace_id);
    }
}
