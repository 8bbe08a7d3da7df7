//! Classifier/Upsert engine.
//!
//! Takes a page of raw listings, resolves each one's class tag to its store
//! and upserts it keyed on the Axie id. Records are processed in input order,
//! one at a time:
//!
//! - a record that cannot be classified or normalized is skipped and counted
//! - a storage failure aborts the rest of the batch; rows already written stay
//!   committed and a re-run converges because every write is an upsert
//!
//! There is no batch transaction and no retry at this layer.

use crate::db::{Database, IngestionRun};
use crate::entities::{AxieClass, ListingRecord, PersistedCreature};
use crate::error::{Error, Result};
use crate::marketplace::{ListingSource, PageRequest};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Acknowledgment returned to HTTP callers on success
pub const COMPLETION_MESSAGE: &str = "Axie data processed successfully!";

/// What one batch did. Counts only, no per-record detail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub fetched: usize,
    pub written: usize,
    pub skipped: usize,
    pub written_by_class: BTreeMap<AxieClass, usize>,
}

/// Normalize one listing and resolve its destination store.
///
/// Missing price is not an error: it becomes zero.
pub fn classify(record: &ListingRecord) -> Result<(AxieClass, PersistedCreature)> {
    let external_id = record.external_id()?;

    let display_name = record
        .name
        .clone()
        .ok_or_else(|| Error::malformed(format!("axie {} has no name", external_id)))?;

    let tag = record
        .class_tag
        .as_deref()
        .ok_or_else(|| Error::malformed(format!("axie {} has no class", external_id)))?;

    let class = match AxieClass::from_tag(tag) {
        Some(class) => class,
        None => {
            return Err(Error::malformed(format!(
                "axie {} has unknown class {:?}",
                external_id, tag
            )))
        }
    };

    let stage = record
        .stage
        .ok_or_else(|| Error::malformed(format!("axie {} has no stage", external_id)))?;

    let price_usd = record.price_usd()?;

    Ok((
        class,
        PersistedCreature {
            external_id,
            display_name,
            stage,
            price_usd,
        },
    ))
}

/// Classify and upsert a batch, in order.
pub fn ingest_records(db: &Database, records: &[ListingRecord]) -> Result<IngestReport> {
    let mut report = IngestReport {
        fetched: records.len(),
        ..IngestReport::default()
    };

    for record in records {
        let (class, creature) = match classify(record) {
            Ok(classified) => classified,
            Err(Error::MalformedRecord(reason)) => {
                warn!(record = %record.describe(), %reason, "skipping listing");
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        db.store(class).upsert(&creature)?;
        debug!(axie_id = creature.external_id, %class, "saved axie");

        report.written += 1;
        *report.written_by_class.entry(class).or_insert(0) += 1;
    }

    Ok(report)
}

/// Fetch one page from the marketplace and ingest it
pub struct IngestionEngine<S> {
    source: S,
    db: Database,
    page: PageRequest,
}

impl<S: ListingSource> IngestionEngine<S> {
    pub fn new(source: S, db: Database, page: PageRequest) -> Self {
        Self { source, db, page }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// One ingestion cycle.
    ///
    /// Upstream failure and an empty page are reported before any write is
    /// attempted; the empty page comes back as `Error::EmptyResult`.
    pub async fn run(&self) -> Result<IngestReport> {
        let mut run = IngestionRun::start();

        let page = match self.source.fetch_page(&self.page).await {
            Ok(page) => page,
            Err(e) => {
                error!(run_id = %run.run_id, error = %e, "error fetching axie data");
                self.log_run(run.finish(format!("failed: {}", e.message())));
                return Err(e);
            }
        };

        run.fetched = page.total() as i64;
        if page.is_empty() {
            warn!(run_id = %run.run_id, "no axies found in the API response");
            self.log_run(run.finish("empty"));
            return Err(Error::empty("No Axies found from the API."));
        }

        let fetched = page.total();
        let rejected = page.rejected;
        let db = self.db.clone();
        let records = page.records;
        // rusqlite blocks; keep it off the async workers
        let outcome = tokio::task::spawn_blocking(move || ingest_records(&db, &records))
            .await
            .map_err(|e| Error::storage(format!("ingestion task failed: {}", e)))
            .and_then(|result| result);

        let mut report = match outcome {
            Ok(report) => report,
            Err(e) => {
                error!(run_id = %run.run_id, error = %e, "ingestion aborted");
                self.log_run(run.finish(format!("failed: {}", e.message())));
                return Err(e);
            }
        };
        report.fetched = fetched;
        report.skipped += rejected;

        run.written = report.written as i64;
        run.skipped = report.skipped as i64;
        info!(
            run_id = %run.run_id,
            fetched = report.fetched,
            written = report.written,
            skipped = report.skipped,
            "ingestion complete"
        );
        self.log_run(run.finish("completed"));

        Ok(report)
    }

    fn log_run(&self, run: IngestionRun) {
        if let Err(e) = self.db.record_run(&run) {
            warn!(run_id = %run.run_id, error = %e, "could not record ingestion run");
        }
    }
}
