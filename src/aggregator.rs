//! Retrieval aggregator.
//!
//! Reads every class store in full and assembles one snapshot keyed by class
//! tag. Empty classes are left out. Nothing is cached: each call re-reads
//! storage, and each store is read under its own lock, so a snapshot taken
//! during an ingestion may reflect part of that batch.

use crate::db::Database;
use crate::entities::{AxieClass, PersistedCreature};
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Non-empty classes only, in class order
pub type ClassSnapshot = BTreeMap<AxieClass, Vec<PersistedCreature>>;

/// Read all nine stores.
///
/// Returns `Ok(None)` when every store is empty; that is "no data", not a failure.
pub fn collect_all(db: &Database) -> Result<Option<ClassSnapshot>> {
    debug!("fetching all axies from the database");

    let mut snapshot = ClassSnapshot::new();
    for class in AxieClass::ALL {
        let creatures = db.store(class).list_all()?;
        if creatures.is_empty() {
            warn!(%class, "no axies found in class store");
            continue;
        }
        snapshot.insert(class, creatures);
    }

    if snapshot.is_empty() {
        warn!("no axies found in any class");
        return Ok(None);
    }

    Ok(Some(snapshot))
}

/// Row count per class, including empty ones
pub fn class_counts(db: &Database) -> Result<Vec<(AxieClass, i64)>> {
    let mut counts = Vec::with_capacity(AxieClass::ALL.len());
    for class in AxieClass::ALL {
        counts.push((class, db.store(class).count()?));
    }
    Ok(counts)
}
