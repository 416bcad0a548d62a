//! Integration tests for the full replay pipeline.
//!
//! Tests: seed → store → orders → engine → summary sink
//!
//! Verifies:
//! - Both stores produce the same output for the same input
//! - The SQLite schema keeps its historical table and column names
//! - Rejected sends leave the database untouched

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use crate::config::InsufficientInventoryPolicy;
    use crate::engine::OrderEngine;
    use crate::orders::read_events;
    use crate::replay::{ReplayReport, replay};
    use crate::seed::SeedData;
    use crate::sink::SummarySink;
    use crate::store::{InMemoryInventoryStore, InventoryStore, SqliteInventoryStore};

    const SEED: &str = "\
3,2,2,2
1,2021-01-01,1,5
2,2021-02-01,2,3
3,2021-03-01,1,7
1,SupplierA,1
2,SupplierB,2
1,ClinicX,20,1
2,ClinicY,10,2
1,L1,0,0
2,L2,1,2
";

    const ORDERS: &str = "\
ClinicX,6
SupplierB,4,2021-01-15

clinicy,9
SupplierA,2,2021-03-01
ClinicX,3
";

    async fn run_pipeline<S: InventoryStore>(store: S) -> (String, ReplayReport, S) {
        let seed: SeedData = SEED.parse().unwrap();
        seed.validate().unwrap();
        store.seed(&seed).await.unwrap();

        let engine = OrderEngine::new(store);
        let mut sink = SummarySink::new(Vec::new());
        let report = replay(
            &engine,
            read_events(ORDERS.as_bytes()),
            &mut sink,
            InsufficientInventoryPolicy::Halt,
        )
        .await
        .unwrap();

        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        (out, report, engine.into_store())
    }

    #[tokio::test]
    async fn stores_agree_on_every_summary_line() {
        let (memory_out, memory_report, _) = run_pipeline(InMemoryInventoryStore::new()).await;
        let (sqlite_out, sqlite_report, sqlite) =
            run_pipeline(SqliteInventoryStore::in_memory().await.unwrap()).await;

        // Lot 1 is drained by the first send. The receive dated 2021-01-15 becomes
        // lot 4 and is consumed before lot 2. Once lot 4 is gone its id is handed out
        // again, and the two 2021-03-01 lots are consumed lowest id first.
        let expected = "\
9,24,2,7
13,24,6,7
4,15,6,16
6,15,8,16
3,12,8,19
";
        assert_eq!(memory_out, expected);
        assert_eq!(sqlite_out, expected);
        assert_eq!(memory_report, ReplayReport { processed: 5, skipped: 0 });
        assert_eq!(memory_report, sqlite_report);

        let lots: Vec<(i64, String, i64)> = sqlite
            .lots()
            .await
            .unwrap()
            .into_iter()
            .map(|l| (l.id.get(), l.received_date.to_string(), l.quantity.get()))
            .collect();
        assert_eq!(
            lots,
            vec![
                (3, "2021-03-01".to_string(), 1),
                (4, "2021-03-01".to_string(), 2),
            ]
        );
        sqlite.close().await;
    }

    #[tokio::test]
    async fn schema_keeps_historical_names() {
        let (_, _, store) = run_pipeline(SqliteInventoryStore::in_memory().await.unwrap()).await;

        let row = sqlx::query(
            "SELECT SUM(count_sent) AS sent, SUM(count_received) AS received FROM logistics",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(row.get::<i64, _>("sent"), 19);
        assert_eq!(row.get::<i64, _>("received"), 8);

        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM vaccines v JOIN suppliers s ON v.supplier = s.id \
             JOIN logistics l ON s.logistic = l.id",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 2);

        let row = sqlx::query("SELECT location, demand, logistic FROM clinics WHERE id = 2")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("demand"), 1);
        assert_eq!(row.get::<i64, _>("logistic"), 2);
    }

    #[tokio::test]
    async fn rejected_send_leaves_database_untouched() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        store.seed(&SEED.parse().unwrap()).await.unwrap();
        let engine = OrderEngine::new(store);

        let before = engine.store().summary().await.unwrap();
        let mut sink = SummarySink::new(Vec::new());
        let report = replay(
            &engine,
            read_events("ClinicY,16\n".as_bytes()),
            &mut sink,
            InsufficientInventoryPolicy::Skip,
        )
        .await
        .unwrap();

        assert_eq!(report, ReplayReport { processed: 0, skipped: 1 });
        assert_eq!(engine.store().summary().await.unwrap(), before);
        assert!(sink.finish().unwrap().is_empty());
    }
}
