// Axie Ledger - Web Server

use anyhow::{Context, Result};
use axie_ledger::api::{router, AppState};
use axie_ledger::{
    init_logging, Config, ContractFacade, Database, Erc20Contract, IngestionEngine,
    MarketplaceClient, PageRequest,
};
use std::path::Path;
use tracing::info;

const CONFIG_FILE: &str = "axie-ledger.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = if Path::new(CONFIG_FILE).exists() {
        Config::load(Path::new(CONFIG_FILE)).context("Failed to load config")?
    } else {
        Config::from_env()
    };
    init_logging(&config.logging);

    info!("axie-ledger v{} starting", axie_ledger::VERSION);

    // Open database
    let db = Database::open(&config.database.path)
        .with_context(|| format!("Failed to open database {:?}", config.database.path))?;
    info!(path = ?config.database.path, "database opened");

    // Upstream collaborators
    let client = MarketplaceClient::new(&config.marketplace)?;
    let ingestion = IngestionEngine::new(client, db.clone(), PageRequest::from_config(&config.marketplace));

    let (rpc_url, contract_address) = config.require_chain()?;
    let contract = ContractFacade::new(Erc20Contract::connect(rpc_url, contract_address)?);

    let app = router(AppState::new(db, ingestion, contract));

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "server is running");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
