//! tally-gateway server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, verifies the chat platform session, and serves
//! the webhook endpoint over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tally_gateway::{
  AppState, GatewayConfig, auth::AuthConfig, chat::RestChat,
  pipeline::Pipeline, topics,
};
use tally_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally economy gateway")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let config =
    GatewayConfig::load(&cli.config).context("failed to read config file")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&config.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Connect outbound chat. A bad token or unreachable API is fatal here;
  // everything after startup degrades instead of exiting.
  let chat = RestChat::new(&config.chat);
  chat
    .verify_session()
    .await
    .context("chat platform session check failed")?;
  tracing::info!("chat platform session verified");

  let communities = topics::parse_communities(&config.communities)?;
  tracing::info!(count = communities.len(), "loaded community topic mappings");
  let topics = Arc::new(topics::TopicDirectory::with_reload_path(
    cli.config.clone(),
    communities,
  ));

  let pipeline = Arc::new(Pipeline::new(
    Arc::new(store),
    Arc::new(chat),
    topics.clone(),
    config.app_name.clone(),
  ));

  let state = AppState {
    pipeline,
    topics,
    auth: Arc::new(AuthConfig { secret: config.webhook_secret.clone() }),
  };

  let app = tally_gateway::router(state);
  let address = format!("{}:{}", config.host, config.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
