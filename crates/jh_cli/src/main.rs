use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use jh_core::ProviderConfig;
use jh_providers::logging::init_logging;
use jh_providers::{handle_command, ProviderArgs, ProviderCommands, Services};
use jh_storage::{create_store, Moderator, StorageSpec};
use jh_web::{create_app, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "JapaHub news, directory and moderation services", long_about = None)]
pub struct Cli {
    /// Moderation store: "memory" or "sqlite:<path>"
    #[arg(long, env = "JAPAHUB_STORAGE", default_value = "memory")]
    storage: StorageSpec,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the JSON API
    Serve {
        #[arg(long, env = "JAPAHUB_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    #[command(flatten)]
    Query(ProviderCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    let config = ProviderConfig::from_env();
    let services = Services::from_config(&config).context("failed to build provider clients")?;
    info!("🔌 Providers configured: {:?}", config);

    match cli.command {
        Commands::Query(command) => {
            handle_command(ProviderArgs { command }, &services).await?;
        }
        Commands::Serve { bind } => {
            let store = create_store(&cli.storage).await?;
            info!("💾 Moderation store ready (using {:?})", cli.storage);

            let state = AppState::new(services, Moderator::new(store));
            let app = create_app(state).await;
            let listener = TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {}", bind))?;
            info!("🚀 Listening on http://{}", bind);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
