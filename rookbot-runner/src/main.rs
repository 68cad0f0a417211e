//! rookbot
//!
//! A chess bot client: answers challenges, plays its games and challenges
//! other online bots while idle.

mod config;
mod engine;
mod shutdown;

use clap::{Parser, Subcommand, ValueEnum};
use config::{ConfigLoader, LoadedConfig};
use engine::NoEngine;
use rookbot_core::config::ConfigStore;
use rookbot_core::matchmaker::Matchmaker;
use rookbot_core::processors::{ActiveGames, EventWatcher, GameLauncher, MatchmakingTicker};
use rookbot_sdk::client::BotClient;
use shutdown::{shutdown_signal, spawn_config_reload_handler};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// rookbot - chess bot client for the Lichess bot API
#[derive(Parser, Debug)]
#[command(name = "rookbot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./rookbot.toml", global = true)]
    config: PathBuf,

    /// API token, overriding the one in the configuration file
    #[arg(long, env = "ROOKBOT_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info,reqwest=warn,hyper=warn", global = true)]
    log: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Fmt, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Connect and play (default)
    Run,
    /// Turn the account into a bot account. This cannot be undone.
    Upgrade,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogFormat {
    Fmt,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(&args.log, args.log_format);

    tracing::info!("Starting rookbot v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.token.clone()));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let client = BotClient::new(&loaded_config.api);

    match args.command.unwrap_or(Command::Run) {
        Command::Upgrade => upgrade(&client).await,
        Command::Run => run(client, loaded_config, config_loader).await,
    }
}

async fn upgrade(client: &BotClient) -> anyhow::Result<()> {
    if client.upgrade_account().await {
        tracing::info!("Account upgraded to a bot account");
        Ok(())
    } else {
        anyhow::bail!("account upgrade failed")
    }
}

async fn run(
    client: BotClient,
    loaded_config: LoadedConfig,
    config_loader: Arc<ConfigLoader>,
) -> anyhow::Result<()> {
    // Identity is required for everything else
    let account = client.account().await.map_err(|e| {
        tracing::error!("Failed to fetch account: {}", e);
        e
    })?;
    let account_id = account.id();
    tracing::info!(username = %account.username, title = %account.title, "Logged in");
    if account.title != "BOT" {
        tracing::warn!("Account is not a bot account, run `rookbot upgrade` first");
    }

    let challenge_store = ConfigStore::new(loaded_config.challenge);
    let matchmaking_store = ConfigStore::new(loaded_config.matchmaking);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let games = ActiveGames::new();
    let launcher = GameLauncher::new(
        client.clone(),
        account_id.clone(),
        Arc::new(NoEngine),
        games.clone(),
    );

    // Clean up after a previous run
    cancel_stale_challenges(&client).await;
    let mut tasks = JoinSet::new();
    for game_id in client.ongoing_games().await {
        if let Some(watcher) = launcher.watcher(&game_id) {
            tracing::info!(%game_id, "Resuming game");
            tasks.spawn(watcher.run(shutdown_rx.clone()));
        }
    }

    // Spawn processors
    let mut event_task = tokio::spawn(
        EventWatcher::new(
            client.clone(),
            account_id,
            challenge_store.clone(),
            launcher,
        )
        .run(shutdown_rx.clone()),
    );
    let matchmaker = Matchmaker::new(client, account.username, matchmaking_store.clone());
    tasks.spawn(MatchmakingTicker::new(matchmaker, games).run(shutdown_rx));

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify =
        spawn_config_reload_handler(config_loader, challenge_store, matchmaking_store)?;

    let event_result = tokio::select! {
        res = shutdown_signal() => {
            res?;
            None
        }
        res = &mut event_task => {
            tracing::warn!("Event stream closed by the server, shutting down");
            Some(res)
        }
    };

    let _ = shutdown_tx.send(true);
    reload_notify.notify_one();

    let event_result = match event_result {
        Some(res) => res,
        None => event_task.await,
    };
    if let Err(e) = event_result {
        tracing::error!("EventWatcher task failed: {}", e);
    }
    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            tracing::error!("Task failed: {}", e);
        }
    }

    tracing::info!("rookbot shutdown complete");
    Ok(())
}

/// Cancel outgoing challenges left open by a previous run.
async fn cancel_stale_challenges(client: &BotClient) {
    let open = client.open_challenges().await;
    for challenge in open.outgoing {
        tracing::info!(challenge_id = %challenge.id, "Cancelling stale challenge");
        client.cancel_challenge(&challenge.id).await;
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(default_filter: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Fmt => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
