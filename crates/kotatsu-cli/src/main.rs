use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use kotatsu_channels::discord::DiscordBot;
use kotatsu_channels::{ChannelBot, DiscordRest};
use kotatsu_core::*;
use kotatsu_provider::AniListClient;

#[derive(Parser)]
#[command(name = "kotatsu", version, about = "Forum thread status and media lookup bot for Discord")]
struct Cli {
    #[arg(
        long,
        default_value = ".",
        help = "Config root directory (contains config.yaml and logs/)"
    )]
    config_root: PathBuf,

    #[arg(long, help = "Config file path (defaults to <config-root>/config.yaml)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Connect to Discord and start handling messages")]
    Start,
    #[command(about = "Validate the config and check the configured forum parents")]
    Validate {
        #[arg(long, help = "Only parse the config, do not contact Discord")]
        offline: bool,
    },
}

fn expand_home(path: PathBuf) -> PathBuf {
    if !path.starts_with("~") {
        return path;
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(path.strip_prefix("~").unwrap_or(&path)),
        None => path,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_root = expand_home(cli.config_root);
    let config_path = cli
        .config
        .map(expand_home)
        .unwrap_or_else(|| config_root.join("config.yaml"));

    let log_dir = config_root.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "kotatsu.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Validate { offline } => validate(&config_path, offline).await?,
        Commands::Start => start_bot(&config_path).await?,
    }

    Ok(())
}

async fn validate(config_path: &Path, offline: bool) -> Result<()> {
    let settings = load_settings(config_path)?;
    println!(
        "Config valid. {} forum parent(s), access mode: {}, search {} ({} channel(s)).",
        settings.scope.forum_parent_ids.len(),
        settings.access.mode(),
        if settings.search_enabled { "on" } else { "off" },
        settings.scope.search_channel_ids.len()
    );
    if offline {
        return Ok(());
    }

    let rest = DiscordRest::new(&settings.discord_token, &settings.discord_api_base);
    let statuses =
        validate_forum_parents(&rest, settings.scope.forum_parent_ids.iter().copied()).await;
    for status in &statuses {
        match status {
            ParentStatus::Forum { id, name } => println!("  ok       {id} ({name})"),
            ParentStatus::NotAForum { id, kind } => {
                println!("  warning  {id} is not a forum channel (type {})", kind.raw())
            }
            ParentStatus::Inaccessible { id, reason } => {
                println!("  error    {id} is not accessible: {reason}")
            }
        }
    }
    Ok(())
}

async fn start_bot(config_path: &Path) -> Result<()> {
    let settings = load_settings(config_path)?;
    tracing::info!(
        config = %config_path.display(),
        access_mode = settings.access.mode(),
        search_enabled = settings.search_enabled,
        "configuration loaded"
    );

    let rest = Arc::new(DiscordRest::new(
        &settings.discord_token,
        &settings.discord_api_base,
    ));
    validate_forum_parents(
        rest.as_ref(),
        settings.scope.forum_parent_ids.iter().copied(),
    )
    .await;

    let api: Arc<dyn ForumApi> = rest;
    let catalog: Arc<dyn MediaCatalog> = Arc::new(AniListClient::new(&settings.anilist_url));
    let scope = Arc::new(settings.scope);

    let router = CommandRouter::new(
        api.clone(),
        &MANAGED_COMMANDS,
        scope.clone(),
        PermissionEvaluator::new(settings.access),
    );
    let search = SearchTrigger::new(api, catalog, scope, settings.search_enabled);
    let dispatcher = Arc::new(Dispatcher::new(router, search));

    let bot: Box<dyn ChannelBot> = Box::new(DiscordBot::new(settings.discord_token, dispatcher));
    tracing::info!("Starting {} bot", bot.channel_type());

    let shutdown_signal = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
                        _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
                    }
                }
                Err(err) => {
                    tracing::warn!("failed to install SIGTERM handler: {err}");
                    ctrl_c.await.ok();
                    tracing::info!("Received SIGINT, shutting down...");
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            tracing::info!("Received SIGINT, shutting down...");
        }
    };

    tokio::select! {
        result = bot.run() => result?,
        _ = shutdown_signal => tracing::info!("Goodbye."),
    }
    Ok(())
}
