use anyhow::{bail, Context, Result};
use axie_ledger::{
    class_counts, collect_all, init_logging, Config, ContractFacade, Database, Erc20Contract,
    IngestionEngine, MarketplaceClient, PageRequest,
};
use std::env;
use std::path::Path;

const CONFIG_FILE: &str = "axie-ledger.toml";

const USAGE: &str =
    "usage: axie-ledger <ingest | show | runs [prune <keep>] | contract <action> [address]>";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = load_config()?;
    init_logging(&config.logging);

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("ingest") => run_ingest(&config).await,
        Some("show") => run_show(&config),
        Some("runs") => match args.get(2).map(String::as_str) {
            None => run_runs(&config),
            Some("prune") => {
                let keep = args
                    .get(3)
                    .context(USAGE)?
                    .parse()
                    .context("keep must be a non-negative integer")?;
                run_prune(&config, keep)
            }
            Some(_) => bail!(USAGE),
        },
        Some("contract") => {
            let action = args.get(2).context(USAGE)?;
            run_contract(&config, action, args.get(3).map(String::as_str)).await
        }
        _ => bail!(USAGE),
    }
}

fn load_config() -> Result<Config> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        Config::load(path).with_context(|| format!("Failed to load {}", CONFIG_FILE))
    } else {
        Ok(Config::from_env())
    }
}

fn open_database(config: &Config) -> Result<Database> {
    Database::open(&config.database.path)
        .with_context(|| format!("Failed to open database {:?}", config.database.path))
}

async fn run_ingest(config: &Config) -> Result<()> {
    println!("🐾 Ingesting marketplace listings");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db = open_database(config)?;
    let client = MarketplaceClient::new(&config.marketplace)?;
    let engine = IngestionEngine::new(client, db, PageRequest::from_config(&config.marketplace));

    match engine.run().await {
        Ok(report) => {
            println!("✓ Fetched: {} listings", report.fetched);
            println!("✓ Saved:   {} axies", report.written);
            println!("✓ Skipped: {} listings", report.skipped);
            for (class, count) in &report.written_by_class {
                println!("   {:<8} {}", class, count);
            }
            Ok(())
        }
        Err(e) if e.is_empty_result() => {
            println!("⚠️  {}", e.message());
            Ok(())
        }
        Err(e) => Err(e).context("Ingestion failed"),
    }
}

fn run_show(config: &Config) -> Result<()> {
    let db = open_database(config)?;

    println!("📊 Stored axies by class");
    for (class, count) in class_counts(&db)? {
        println!("   {:<8} {}", class, count);
    }

    match collect_all(&db)? {
        Some(snapshot) => println!("\n{}", serde_json::to_string_pretty(&snapshot)?),
        None => println!("\nNo Axies found."),
    }

    Ok(())
}

fn run_runs(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let runs = db.recent_runs(20)?;

    if runs.is_empty() {
        println!("No ingestion runs recorded yet.");
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {}  fetched={} written={} skipped={}  {}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.run_id,
            run.fetched,
            run.written,
            run.skipped,
            run.outcome
        );
    }

    Ok(())
}

fn run_prune(config: &Config, keep: usize) -> Result<()> {
    let db = open_database(config)?;
    let removed = db.prune_runs(keep)?;
    println!("🧹 Removed {} ingestion runs, kept the newest {}", removed, keep);
    Ok(())
}

async fn run_contract(config: &Config, action: &str, address: Option<&str>) -> Result<()> {
    let (rpc_url, contract_address) = config.require_chain()?;
    let contract = Erc20Contract::connect(rpc_url, contract_address)?;
    let facade = ContractFacade::new(contract);

    let result = facade.query(Some(action), address).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
