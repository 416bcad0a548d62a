//! Inventory store boundary.
//!
//! The store owns the four tables (lots, suppliers, clinics, logistics providers).
//! Reads are plain lookups; every mutation goes through [`InventoryStore::commit`],
//! which applies a batch of [`InventoryChange`]s atomically: either all of them land
//! or none do.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryInventoryStore;
pub use sqlite::SqliteInventoryStore;

use async_trait::async_trait;
use thiserror::Error;

use vaxtrack_core::{ClinicId, LogisticsId, LotId, Quantity, ReceivedDate, SupplierId};
use vaxtrack_inventory::{
    Clinic, DepletionStep, InventorySummary, LogisticsProvider, Supplier, VaccineLot,
};

use crate::seed::SeedData;

/// Store operation error.
///
/// - **Conflict**: a change no longer matches the stored row (e.g. a lot changed
///   between planning and commit)
/// - **Integrity**: a change references a row that does not exist, or seeding would
///   break a key
/// - **Database**: anything else reported by the backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("database error: {0}")]
    Database(String),
}

/// One mutation inside a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryChange {
    /// Insert a new lot; the store assigns the id (max + 1, or 1 when empty).
    AddLot {
        received_date: ReceivedDate,
        supplier_id: SupplierId,
        quantity: Quantity,
    },
    /// Shrink or delete one lot as planned by FIFO depletion.
    DepleteLot(DepletionStep),
    ReduceDemand {
        clinic_id: ClinicId,
        amount: Quantity,
    },
    RecordReceived {
        logistics_id: LogisticsId,
        amount: Quantity,
    },
    RecordSent {
        logistics_id: LogisticsId,
        amount: Quantity,
    },
}

/// What a successful commit did to the lot table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub lots_added: Vec<LotId>,
    pub lots_removed: Vec<LotId>,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert the initial rows. Referential integrity is checked here.
    async fn seed(&self, data: &SeedData) -> Result<(), StoreError>;

    /// Supplier by case-insensitive exact name. On duplicate names the lowest id wins.
    async fn find_supplier(&self, name: &str) -> Result<Option<Supplier>, StoreError>;

    /// Clinic by case-insensitive exact location. On duplicates the lowest id wins.
    async fn find_clinic(&self, location: &str) -> Result<Option<Clinic>, StoreError>;

    async fn find_logistics_provider(
        &self,
        id: LogisticsId,
    ) -> Result<Option<LogisticsProvider>, StoreError>;

    /// All lots, oldest first (`received_date`, then id).
    async fn lots(&self) -> Result<Vec<VaccineLot>, StoreError>;

    /// Apply all changes in one atomic unit.
    async fn commit(&self, changes: Vec<InventoryChange>) -> Result<CommitReceipt, StoreError>;

    /// Totals over the current state. Never cached.
    async fn summary(&self) -> Result<InventorySummary, StoreError>;
}
