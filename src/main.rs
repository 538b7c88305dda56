use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gateman::config::Config;
use gateman::engine::ClaimEngine;
use gateman::notify::{AuditSink, Notifier, WebhookAuditSink, WebhookNotifier};
use gateman::server::{AppState, create_router};
use gateman::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "gateman")]
#[command(about = "An access-gated asset delivery server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<String>,

        /// Path to the configuration file
        #[arg(long, default_value = "gateman.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gateman=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
        } => {
            let mut config = Config::load_or_default(&config)?;

            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.server.data_dir = PathBuf::from(data_dir);
            }

            let Some(delivery_url) = config.webhooks.delivery_url.clone() else {
                bail!(
                    "No delivery webhook configured. Set [webhooks].delivery_url in gateman.toml."
                );
            };

            fs::create_dir_all(&config.server.data_dir)?;

            let store = SqliteStore::new(config.server.db_path())?;
            store.initialize()?;

            let notifier: Arc<dyn Notifier> = Arc::new(WebhookNotifier::new(delivery_url));
            let audit: Option<Arc<dyn AuditSink>> = config
                .webhooks
                .audit_url
                .clone()
                .map(|url| Arc::new(WebhookAuditSink::new(url)) as Arc<dyn AuditSink>);

            let engine = ClaimEngine::new(
                Arc::new(store),
                notifier,
                audit,
                config.engine.clone(),
            );

            let state = Arc::new(AppState {
                engine: Arc::new(engine),
            });

            let app = create_router(state);
            let addr = config.server.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
