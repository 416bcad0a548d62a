//! Inventory domain module.
//!
//! This crate contains the business rules for vaccine inventory, implemented purely as
//! deterministic domain logic (no IO, no storage): the entities, FIFO lot depletion
//! and the summary totals.

pub mod fifo;
pub mod lot;
pub mod parties;
pub mod summary;

pub use fifo::{DepletionPlan, DepletionStep, apply_depletion, fifo_order, plan_depletion};
pub use lot::VaccineLot;
pub use parties::{Clinic, LogisticsProvider, Supplier};
pub use summary::InventorySummary;
