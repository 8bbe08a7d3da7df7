// Axie Ledger - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod aggregator;
pub mod config;
pub mod contract;
pub mod db;
pub mod entities;
pub mod error;
pub mod ingestion;
pub mod marketplace;

// Only compile the HTTP layer when the server feature is enabled
#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use aggregator::{class_counts, collect_all, ClassSnapshot};
pub use config::{Config, ConfigError};
pub use contract::{
    normalize_address, ContractAction, ContractFacade, ContractQueryResult, Erc20Contract,
    TokenAmount, TokenContract,
};
pub use db::{setup_database, ClassStore, Database, IngestionRun};
pub use entities::{AxieClass, ListingRecord, PersistedCreature};
pub use error::{Error, Result};
pub use ingestion::{classify, ingest_records, IngestReport, IngestionEngine, COMPLETION_MESSAGE};
pub use marketplace::{ListingPage, ListingSource, MarketplaceClient, PageRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the tracing subscriber described by the logging config.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &config::LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }
}
