use axie_ledger::{
    collect_all, ingest_records, AxieClass, Database, IngestionEngine, ListingPage, ListingRecord,
    ListingSource, PageRequest, Result,
};
use std::collections::HashSet;
use tempfile::TempDir;

struct StaticSource(Vec<ListingRecord>);

impl ListingSource for StaticSource {
    async fn fetch_page(&self, _page: &PageRequest) -> Result<ListingPage> {
        Ok(ListingPage::from_records(self.0.clone()))
    }
}

fn batch(start: i64, count: i64) -> Vec<ListingRecord> {
    (start..start + count)
        .map(|id| {
            let class = AxieClass::ALL[(id % 9) as usize];
            ListingRecord::new(id, &format!("Axie #{}", id), class.as_str(), 1 + id % 4)
                .with_price(&format!("{}.{:02}", id % 50, id % 100))
        })
        .collect()
}

#[test]
fn test_stores_survive_reopen() {
    let tmp = TempDir::new().expect("create temp dir");
    let path = tmp.path().join("axies.db");

    {
        let db = Database::open(&path).unwrap();
        let report = ingest_records(&db, &batch(1, 18)).unwrap();
        assert_eq!(report.written, 18);
    }

    let db = Database::open(&path).unwrap();
    let snapshot = collect_all(&db).unwrap().unwrap();

    assert_eq!(snapshot.len(), 9);
    assert!(snapshot.values().all(|creatures| creatures.len() == 2));
}

#[test]
fn test_refresh_overwrites_in_place() {
    let tmp = TempDir::new().expect("create temp dir");
    let db = Database::open(&tmp.path().join("axies.db")).unwrap();

    ingest_records(&db, &[ListingRecord::new(42, "Before", "Aquatic", 1).with_price("1.00")]).unwrap();
    ingest_records(&db, &[ListingRecord::new(42, "After", "Aquatic", 4).with_price("2.50")]).unwrap();

    let stored = db.store(AxieClass::Aquatic).list_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].display_name, "After");
    assert_eq!(stored[0].stage, 4);
    assert_eq!(stored[0].price_usd.to_string(), "2.50");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingestion_and_retrieval_keep_ids_unique() {
    let tmp = TempDir::new().expect("create temp dir");
    let db = Database::open(&tmp.path().join("axies.db")).unwrap();

    let mut handles = Vec::new();
    for round in 0..4 {
        // Overlapping id ranges so concurrent batches hit the same rows
        let engine = IngestionEngine::new(
            StaticSource(batch(round * 20, 60)),
            db.clone(),
            PageRequest::default(),
        );
        handles.push(tokio::spawn(async move { engine.run().await.map(|_| ()) }));

        let reader = db.clone();
        handles.push(tokio::spawn(async move {
            // A partial view is acceptable; a failure is not
            collect_all(&reader).map(|_| ())
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = collect_all(&db).unwrap().unwrap();
    let mut total = 0;
    for (class, creatures) in &snapshot {
        let ids: HashSet<i64> = creatures.iter().map(|c| c.external_id).collect();
        assert_eq!(ids.len(), creatures.len(), "{} store has duplicate ids", class);
        total += creatures.len();
    }

    // ids 0..120, each in exactly one class
    assert_eq!(total, 120);
    assert_eq!(db.recent_runs(10).unwrap().len(), 4);
}
