//! Infrastructure layer: seed loading, inventory stores, the order engine and the
//! replay pipeline that ties them to the orders input and summary output.

pub mod config;
pub mod engine;
pub mod orders;
pub mod replay;
pub mod seed;
pub mod sink;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, InsufficientInventoryPolicy, RunConfig};
pub use engine::{EngineError, OrderEngine};
pub use orders::{OrdersError, read_events};
pub use replay::{ReplayError, ReplayReport, replay};
pub use seed::{SeedData, SeedError};
pub use sink::SummarySink;
pub use store::{
    CommitReceipt, InMemoryInventoryStore, InventoryChange, InventoryStore, SqliteInventoryStore,
    StoreError,
};
