//! OnceLink CLI - Serve and maintain the one-time secret exchange.
//!
//! Every flag can also be set through an `ONCELINK_*` environment variable,
//! so the same binary works under a process supervisor or in a container.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use oncelink_common::MAX_TTL_SECONDS;
use oncelink_exchange::config::{DEFAULT_KEY_PREFIX, DEFAULT_MAX_SECRET_BYTES};
use oncelink_exchange::{ExchangeConfig, SecretExchange};
use oncelink_server::{build_router, serve, AppState, ServerConfig};
use oncelink_storage::{create_default_registry, SecretStore, SqliteStore};

#[derive(Parser)]
#[command(name = "oncelink")]
#[command(about = "OnceLink - One-time secret exchange")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true, env = "ONCELINK_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),

    /// Delete expired secrets from a SQLite database once and exit.
    Purge {
        /// Database file.
        #[arg(short, long, env = "ONCELINK_DATABASE")]
        database: PathBuf,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// Process-local store, lost on restart.
    Memory,
    /// SQLite database file, shareable between processes.
    Sqlite,
}

impl StoreKind {
    fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(short, long, env = "ONCELINK_BIND", default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "ONCELINK_PORT", default_value_t = 8080)]
    port: u16,

    /// Secret store backend.
    #[arg(short, long, env = "ONCELINK_STORE", value_enum, default_value_t = StoreKind::Memory)]
    store: StoreKind,

    /// Database file for the sqlite store.
    #[arg(short, long, env = "ONCELINK_DATABASE")]
    database: Option<PathBuf>,

    /// Prefix of every storage key.
    #[arg(long, env = "ONCELINK_KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    key_prefix: String,

    /// Longest accepted TTL in seconds.
    #[arg(long, env = "ONCELINK_MAX_TTL", default_value_t = MAX_TTL_SECONDS)]
    max_ttl: u64,

    /// Largest accepted secret in bytes.
    #[arg(long, env = "ONCELINK_MAX_SECRET_BYTES", default_value_t = DEFAULT_MAX_SECRET_BYTES)]
    max_secret_bytes: usize,

    /// Generate http:// links instead of https://.
    #[arg(long, env = "ONCELINK_NO_SSL")]
    no_ssl: bool,

    /// Host used in generated links instead of the request's Host header.
    #[arg(long, env = "ONCELINK_HOST_OVERRIDE")]
    host_override: Option<String>,

    /// Path prefix the service is published under.
    #[arg(long, env = "ONCELINK_URL_PREFIX")]
    url_prefix: Option<String>,

    /// Seconds between expired-secret sweeps, 0 to disable.
    #[arg(long, env = "ONCELINK_PURGE_INTERVAL", default_value_t = 300)]
    purge_interval: u64,

    /// Do not attach the permissive CORS layer.
    #[arg(long, env = "ONCELINK_NO_CORS")]
    no_cors: bool,
}

impl ServeArgs {
    fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig::default()
            .with_key_prefix(self.key_prefix.clone())
            .with_max_ttl_secs(self.max_ttl)
            .with_max_secret_bytes(self.max_secret_bytes)
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            no_ssl: self.no_ssl,
            host_override: self.host_override.clone(),
            url_prefix: self.url_prefix.clone(),
            cors: !self.no_cors,
        }
    }

    fn store_config(&self) -> Result<serde_json::Value> {
        match self.store {
            StoreKind::Memory => Ok(serde_json::Value::Null),
            StoreKind::Sqlite => {
                let database = self
                    .database
                    .as_ref()
                    .context("The sqlite store requires --database")?;
                Ok(serde_json::json!({
                    "path": database.to_string_lossy()
                }))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve(args) => cmd_serve(args).await,

        Commands::Purge { database } => cmd_purge(&database).await,

        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Run the HTTP API until Ctrl-C.
async fn cmd_serve(args: ServeArgs) -> Result<()> {
    let registry = create_default_registry();
    let store = registry
        .resolve(args.store.name(), &args.store_config()?)
        .context("Failed to open secret store")?;

    store
        .ping()
        .await
        .context("Secret store did not answer")?;

    let exchange = Arc::new(
        SecretExchange::new(store, args.exchange_config())
            .context("Invalid exchange configuration")?,
    );

    let router = build_router(AppState::new(exchange.clone(), args.server_config()));

    let listener = TcpListener::bind((args.bind, args.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", args.bind, args.port))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let purge_task = match args.purge_interval {
        0 => {
            info!("Periodic purge disabled");
            None
        }
        secs => Some(tokio::spawn(purge_loop(
            exchange.clone(),
            Duration::from_secs(secs),
            shutdown_rx,
        ))),
    };

    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
        let _ = shutdown_tx.send(true);
    };

    let served = serve(listener, router, shutdown).await;

    // The sender is gone once serve returns, which also ends the purge loop.
    if let Some(task) = purge_task {
        let _ = task.await;
    }

    served.context("Server failed")
}

/// Sweep expired secrets every `every` until shutdown.
async fn purge_loop(
    exchange: Arc<SecretExchange>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    // First tick completes immediately.
    ticker.tick().await;

    info!("Purging expired secrets every {}s", every.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => match exchange.purge_expired().await {
                Ok(0) => debug!("No expired secrets to purge"),
                Ok(count) => info!("Purged {} expired secrets", count),
                Err(e) => warn!("Purge failed: {}", e),
            },
            _ = shutdown.changed() => break,
        }
    }

    debug!("Purge loop stopped");
}

/// Reclaim expired records from a SQLite database.
async fn cmd_purge(database: &Path) -> Result<()> {
    info!("Purging expired secrets in {}", database.display());

    let store = SqliteStore::open(database).context("Failed to open database")?;
    let count = store
        .purge_expired()
        .await
        .context("Failed to purge expired secrets")?;

    println!("Purged {} expired secret(s).", count);
    Ok(())
}

/// Print completions for `shell`.
fn cmd_completions(shell: Shell) {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "oncelink", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["oncelink", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        assert_eq!(args.port, 8080);
        assert_eq!(args.store, StoreKind::Memory);
        assert_eq!(args.exchange_config(), ExchangeConfig::default());
        assert!(args.server_config().cors);
        assert_eq!(args.store_config().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_sqlite_requires_database() {
        let cli = Cli::try_parse_from(["oncelink", "serve", "--store", "sqlite"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert!(args.store_config().is_err());

        let cli = Cli::try_parse_from([
            "oncelink",
            "serve",
            "--store",
            "sqlite",
            "--database",
            "/tmp/oncelink.db",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(
            args.store_config().unwrap(),
            serde_json::json!({ "path": "/tmp/oncelink.db" })
        );
    }

    #[test]
    fn test_link_flags_reach_server_config() {
        let cli = Cli::try_parse_from([
            "oncelink",
            "serve",
            "--no-ssl",
            "--host-override",
            "share.example.com",
            "--url-prefix",
            "secrets",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        let config = args.server_config();
        assert_eq!(config.scheme(), "http");
        assert_eq!(config.host_override.as_deref(), Some("share.example.com"));
        assert_eq!(config.prefix(), Some("secrets"));
    }
}
