//! SQLite-backed inventory store.
//!
//! The schema keeps the historical table and column names so existing tooling can
//! read the database file. Names, locations and dates are `TEXT` so a value such as
//! `007` is stored and compared literally:
//!
//! | table | columns |
//! |---|---|
//! | `vaccines` | `id`, `date`, `supplier` → `suppliers.id`, `quantity` |
//! | `suppliers` | `id`, `name`, `logistic` → `logistics.id` |
//! | `clinics` | `id`, `location`, `demand`, `logistic` → `logistics.id` |
//! | `logistics` | `id`, `name`, `count_sent`, `count_received` |
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLite code | StoreError |
//! |---|---|---|
//! | foreign key violation | `787` | `Integrity` |
//! | unique / primary key violation | `2067` / `1555` | `Integrity` |
//! | other database error | any | `Database` |
//! | pool closed, IO, ... | n/a | `Database` |
//!
//! ## Connections
//!
//! The pool holds exactly one connection: there is a single writer, and an in-memory
//! database (`sqlite::memory:`) lives only as long as its connection.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::instrument;

use vaxtrack_core::{ClinicId, LogisticsId, LotId, Quantity, ReceivedDate, SupplierId};
use vaxtrack_inventory::{Clinic, InventorySummary, LogisticsProvider, Supplier, VaccineLot};

use super::{CommitReceipt, InventoryChange, InventoryStore, StoreError};
use crate::seed::SeedData;

const DROP_TABLES: [&str; 4] = [
    "DROP TABLE IF EXISTS vaccines",
    "DROP TABLE IF EXISTS clinics",
    "DROP TABLE IF EXISTS suppliers",
    "DROP TABLE IF EXISTS logistics",
];

const CREATE_TABLES: [&str; 4] = [
    r#"
    CREATE TABLE logistics (
        id             INTEGER PRIMARY KEY,
        name           TEXT NOT NULL,
        count_sent     INTEGER NOT NULL,
        count_received INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE suppliers (
        id       INTEGER PRIMARY KEY,
        name     TEXT NOT NULL,
        logistic INTEGER REFERENCES logistics(id)
    )
    "#,
    r#"
    CREATE TABLE clinics (
        id       INTEGER PRIMARY KEY,
        location TEXT NOT NULL,
        demand   INTEGER NOT NULL,
        logistic INTEGER REFERENCES logistics(id)
    )
    "#,
    r#"
    CREATE TABLE vaccines (
        id       INTEGER PRIMARY KEY,
        date     TEXT NOT NULL,
        supplier INTEGER REFERENCES suppliers(id),
        quantity INTEGER NOT NULL
    )
    "#,
];

/// SQLite-backed inventory store.
///
/// Every `commit` runs in one transaction; any failing change rolls the whole batch
/// back (the transaction is dropped without commit).
#[derive(Debug, Clone)]
pub struct SqliteInventoryStore {
    pool: SqlitePool,
}

impl SqliteInventoryStore {
    /// Open (creating if missing) the database at `url`, e.g. `sqlite://database.db`
    /// or `sqlite::memory:`.
    #[instrument(err)]
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_database_url", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self { pool })
    }

    /// Fresh in-memory database with the schema created.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let store = Self::connect("sqlite::memory:").await?;
        store.bootstrap().await?;
        Ok(store)
    }

    /// Drop and recreate the four tables. Every run starts from an empty store.
    #[instrument(skip(self), err)]
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for statement in DROP_TABLES.iter().chain(CREATE_TABLES.iter()) {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("bootstrap", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        tracing::debug!("inventory schema created");
        Ok(())
    }

    /// Close the pool, waiting for the connection to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    #[instrument(
        skip(self, data),
        fields(
            lots = data.lots.len(),
            suppliers = data.suppliers.len(),
            clinics = data.clinics.len(),
            logistics = data.logistics.len()
        ),
        err
    )]
    async fn seed(&self, data: &SeedData) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Parents first so foreign keys hold on every insert.
        for provider in &data.logistics {
            sqlx::query(
                "INSERT INTO logistics (id, name, count_sent, count_received) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(provider.id.get())
            .bind(&provider.name)
            .bind(provider.count_sent.get())
            .bind(provider.count_received.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_logistics", e))?;
        }

        for supplier in &data.suppliers {
            sqlx::query("INSERT INTO suppliers (id, name, logistic) VALUES (?1, ?2, ?3)")
                .bind(supplier.id.get())
                .bind(&supplier.name)
                .bind(supplier.logistics_id.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("seed_suppliers", e))?;
        }

        for clinic in &data.clinics {
            sqlx::query(
                "INSERT INTO clinics (id, location, demand, logistic) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(clinic.id.get())
            .bind(&clinic.location)
            .bind(clinic.demand)
            .bind(clinic.logistics_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_clinics", e))?;
        }

        for lot in &data.lots {
            sqlx::query("INSERT INTO vaccines (id, date, supplier, quantity) VALUES (?1, ?2, ?3, ?4)")
                .bind(lot.id.get())
                .bind(lot.received_date.as_str())
                .bind(lot.supplier_id.get())
                .bind(lot.quantity.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("seed_vaccines", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_supplier(&self, name: &str) -> Result<Option<Supplier>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, logistic
            FROM suppliers
            WHERE name = ?1 COLLATE NOCASE
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_supplier", e))?;

        row.map(|r| -> Result<Supplier, StoreError> {
            Ok(Supplier {
                id: SupplierId::new(get(&r, "id")?),
                name: get(&r, "name")?,
                logistics_id: LogisticsId::new(get(&r, "logistic")?),
            })
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_clinic(&self, location: &str) -> Result<Option<Clinic>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, location, demand, logistic
            FROM clinics
            WHERE location = ?1 COLLATE NOCASE
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(location.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_clinic", e))?;

        row.map(|r| -> Result<Clinic, StoreError> {
            Ok(Clinic {
                id: ClinicId::new(get(&r, "id")?),
                location: get(&r, "location")?,
                demand: get(&r, "demand")?,
                logistics_id: LogisticsId::new(get(&r, "logistic")?),
            })
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_logistics_provider(
        &self,
        id: LogisticsId,
    ) -> Result<Option<LogisticsProvider>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, count_sent, count_received
            FROM logistics
            WHERE id = ?1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_logistics_provider", e))?;

        row.map(|r| -> Result<LogisticsProvider, StoreError> {
            Ok(LogisticsProvider {
                id: LogisticsId::new(get(&r, "id")?),
                name: get(&r, "name")?,
                count_sent: quantity(&r, "count_sent")?,
                count_received: quantity(&r, "count_received")?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn lots(&self) -> Result<Vec<VaccineLot>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, supplier, quantity
            FROM vaccines
            ORDER BY date ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("lots", e))?;

        rows.iter()
            .map(|r| -> Result<VaccineLot, StoreError> {
                Ok(VaccineLot {
                    id: LotId::new(get(r, "id")?),
                    received_date: ReceivedDate::new(get::<String>(r, "date")?),
                    supplier_id: SupplierId::new(get(r, "supplier")?),
                    quantity: quantity(r, "quantity")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self, changes), fields(change_count = changes.len()), err)]
    async fn commit(&self, changes: Vec<InventoryChange>) -> Result<CommitReceipt, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let mut receipt = CommitReceipt::default();
        for change in &changes {
            apply_change(&mut tx, change, &mut receipt).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(receipt)
    }

    #[instrument(skip(self), err)]
    async fn summary(&self) -> Result<InventorySummary, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COALESCE(SUM(quantity), 0) FROM vaccines)        AS total_inventory,
                (SELECT COALESCE(SUM(demand), 0) FROM clinics)           AS total_demand,
                (SELECT COALESCE(SUM(count_received), 0) FROM logistics) AS total_received,
                (SELECT COALESCE(SUM(count_sent), 0) FROM logistics)     AS total_sent
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("summary", e))?;

        Ok(InventorySummary {
            total_inventory: get(&row, "total_inventory")?,
            total_demand: get(&row, "total_demand")?,
            total_received: get(&row, "total_received")?,
            total_sent: get(&row, "total_sent")?,
        })
    }
}

async fn apply_change(
    tx: &mut Transaction<'_, Sqlite>,
    change: &InventoryChange,
    receipt: &mut CommitReceipt,
) -> Result<(), StoreError> {
    match change {
        InventoryChange::AddLot {
            received_date,
            supplier_id,
            quantity,
        } => {
            let row = sqlx::query("SELECT MAX(id) AS max_id FROM vaccines")
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("next_lot_id", e))?;
            let max_id: Option<i64> = get(&row, "max_id")?;
            let id = LotId::next_after(max_id.map(LotId::new));

            sqlx::query("INSERT INTO vaccines (id, date, supplier, quantity) VALUES (?1, ?2, ?3, ?4)")
                .bind(id.get())
                .bind(received_date.as_str())
                .bind(supplier_id.get())
                .bind(quantity.get())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("insert_lot", e))?;
            receipt.lots_added.push(id);
        }
        InventoryChange::DepleteLot(step) => {
            let result = if step.exhausts_lot() {
                sqlx::query("DELETE FROM vaccines WHERE id = ?1 AND quantity = ?2")
                    .bind(step.lot_id.get())
                    .bind(step.on_hand.get())
                    .execute(&mut **tx)
                    .await
            } else {
                sqlx::query("UPDATE vaccines SET quantity = ?3 WHERE id = ?1 AND quantity = ?2")
                    .bind(step.lot_id.get())
                    .bind(step.on_hand.get())
                    .bind(step.remaining().get())
                    .execute(&mut **tx)
                    .await
            }
            .map_err(|e| map_sqlx_error("deplete_lot", e))?;

            if result.rows_affected() != 1 {
                return Err(StoreError::Conflict(format!(
                    "lot {} no longer holds {} units",
                    step.lot_id, step.on_hand
                )));
            }
            if step.exhausts_lot() {
                receipt.lots_removed.push(step.lot_id);
            }
        }
        InventoryChange::ReduceDemand { clinic_id, amount } => {
            let result = sqlx::query("UPDATE clinics SET demand = demand - ?1 WHERE id = ?2")
                .bind(amount.get())
                .bind(clinic_id.get())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("reduce_demand", e))?;
            expect_one_row(result.rows_affected(), "clinic", clinic_id.get())?;
        }
        InventoryChange::RecordReceived {
            logistics_id,
            amount,
        } => {
            let result = sqlx::query(
                "UPDATE logistics SET count_received = count_received + ?1 WHERE id = ?2",
            )
            .bind(amount.get())
            .bind(logistics_id.get())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("record_received", e))?;
            expect_one_row(result.rows_affected(), "logistics provider", logistics_id.get())?;
        }
        InventoryChange::RecordSent {
            logistics_id,
            amount,
        } => {
            let result =
                sqlx::query("UPDATE logistics SET count_sent = count_sent + ?1 WHERE id = ?2")
                    .bind(amount.get())
                    .bind(logistics_id.get())
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error("record_sent", e))?;
            expect_one_row(result.rows_affected(), "logistics provider", logistics_id.get())?;
        }
    }
    Ok(())
}

fn expect_one_row(rows_affected: u64, entity: &str, id: i64) -> Result<(), StoreError> {
    if rows_affected == 1 {
        Ok(())
    } else {
        Err(StoreError::Integrity(format!("{entity} {id} does not exist")))
    }
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Database(format!("failed to read column {column}: {e}")))
}

fn quantity(row: &SqliteRow, column: &str) -> Result<Quantity, StoreError> {
    Quantity::new(get(row, column)?)
        .map_err(|e| StoreError::Integrity(format!("column {column}: {e}")))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_foreign_key_violation() || db_err.is_unique_violation() {
                StoreError::Integrity(msg)
            } else {
                StoreError::Database(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
