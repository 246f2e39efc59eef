#[async_trait::async_trait]
pub trait ChannelBot: Send {
    fn channel_type(&self) -> &str;
    async fn run(self: Box<Self>) -> anyhow::Result<()>;
}

pub mod rest;

#[cfg(feature = "discord")]
pub mod discord;

pub use rest::DiscordRest;
