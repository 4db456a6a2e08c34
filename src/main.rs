// src/main.rs

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tokio::io::{self, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_chat::{
    api::create_router,
    chat::{repl::run_repl, ChatBackend, ChatSession, RelayClient},
    config::Config,
    relay::AnthropicClient,
    tools::ToolDispatcher,
    utils,
    wallet::{LocalWalletProvider, WalletProvider},
    AppState,
};

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> Result<()> {
    if state.config.anthropic_api_key.expose_secret().is_empty() {
        anyhow::bail!("ANTHROPIC_API_KEY must be set to run the relay");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = create_router(state);

    info!("🚀 Relay listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("relay server stopped")?;
    Ok(())
}

// --- Chat Client Logic ---
async fn run_chat(config: Config, direct: bool) -> Result<()> {
    let wallet =
        Arc::new(LocalWalletProvider::new(&config).context("failed to initialize wallet")?);
    match wallet.restore_session().await {
        Ok(Some(address)) => info!("Reconnected wallet {}", utils::checksum(&address)),
        Ok(None) => info!("No wallet session to restore"),
        Err(e) => error!("Failed to restore wallet session: {}", e),
    }

    let wallet: Arc<dyn WalletProvider> = wallet;
    let dispatcher = ToolDispatcher::new(wallet, config.network_switch_timeout)?;

    let backend: Arc<dyn ChatBackend> = if direct {
        let client = AnthropicClient::new(&config)?;
        info!("🚀 Chat client calling {} directly", client.model());
        Arc::new(client)
    } else {
        let client = RelayClient::new(config.relay_url.clone());
        info!("🚀 Chat client using relay at {}", client.url());
        Arc::new(client)
    };

    let mut session = ChatSession::new(
        backend,
        dispatcher,
        Some(config.system_prompt.clone()),
        config.max_tool_rounds,
    );

    run_repl(&mut session, BufReader::new(io::stdin()), io::stdout())
        .await
        .context("terminal I/O failed")
}

#[tokio::main]
async fn main() {
    // Initialize tracing; stdout belongs to the chat front end
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Chat client or relay server
    let args: Vec<String> = env::args().collect();
    let result = if args.iter().any(|a| a == "--chat") || env::var("CHAT_MODE").is_ok() {
        run_chat(config, args.iter().any(|a| a == "--direct")).await
    } else {
        match AppState::new(config) {
            Ok(state) => run_http_server(state).await,
            Err(e) => Err(e.into()),
        }
    };

    if let Err(e) = result {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
