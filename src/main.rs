//! Codenames server - unified CLI

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, ConfigArgs};
use codenames_server::{AppState, Corpus, EvictionPolicy, IndexPage, ServerConfig, SessionStore};
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    match cli.command {
        Command::Serve(args) => run_http_server(args).await,
        Command::CheckWords(args) => check_words(args),
    }
}

/// Run the HTTP game server
#[instrument(skip_all)]
async fn run_http_server(args: ConfigArgs) -> Result<()> {
    let config = load_config(args)?;
    let corpus = Corpus::load(config.game_id_file(), config.word_file())?;
    let index = IndexPage::load(config.frontend_dir(), config.analytics_id().clone())?;

    let store = SessionStore::new(corpus.default_words().clone(), EvictionPolicy::default());
    let state = AppState::new(store.clone(), Arc::new(corpus), Arc::new(index));
    let app = codenames_server::router(state, config.static_dir());

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!(addr = %listener.local_addr()?, "Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, shutting down session store");
    store.shutdown().await;
    Ok(())
}

/// Load the word lists and print their sizes
#[instrument(skip_all)]
fn check_words(args: ConfigArgs) -> Result<()> {
    let config = load_config(args)?;
    let corpus = Corpus::load(config.game_id_file(), config.word_file())?;
    println!(
        "{} game-id words, {} play words",
        corpus.game_ids().len(),
        corpus.default_words().len()
    );
    Ok(())
}

fn load_config(args: ConfigArgs) -> Result<ServerConfig> {
    let (path, overrides) = args.into_parts();
    let config = ServerConfig::resolve(path.as_deref(), overrides)?;
    info!(?config, "Configuration resolved");
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C");
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,codenames_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
