//! Order processing engine.
//!
//! Every shipment event runs through the same pipeline:
//!
//! ```text
//! ShipmentEvent
//!   ↓
//! 1. Resolve the counterparty (supplier or clinic) by name
//!   ↓
//! 2. Load what the decision needs (current lots, for sends)
//!   ↓
//! 3. Decide (pure): build the batch of InventoryChanges
//!   ↓
//! 4. Commit the batch atomically
//!   ↓
//! 5. Read a fresh InventorySummary
//! ```
//!
//! The engine holds no state of its own; the store is the only source of truth and
//! the summary is recomputed from it after every event.

use thiserror::Error;
use tracing::{debug, warn};

use vaxtrack_core::{DomainError, LogisticsId};
use vaxtrack_events::{ReceiveShipment, SendShipment, ShipmentEvent};
use vaxtrack_inventory::{InventorySummary, LogisticsProvider, plan_depletion};

use crate::store::{InventoryChange, InventoryStore, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// Unknown counterparty or logistics provider.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The send was rejected before anything changed.
    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory { requested: i64, available: i64 },

    #[error(transparent)]
    Domain(DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound { entity, key } => EngineError::NotFound { entity, key },
            DomainError::InsufficientInventory {
                requested,
                available,
            } => EngineError::InsufficientInventory {
                requested,
                available,
            },
            other => EngineError::Domain(other),
        }
    }
}

impl EngineError {
    /// Rejections that left the store untouched and may be skipped by policy.
    pub fn is_insufficient_inventory(&self) -> bool {
        matches!(self, EngineError::InsufficientInventory { .. })
    }
}

/// Applies shipment events to an [`InventoryStore`].
#[derive(Debug)]
pub struct OrderEngine<S> {
    store: S,
}

impl<S> OrderEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: InventoryStore> OrderEngine<S> {
    /// Apply one event and return the totals after it.
    pub async fn handle(&self, event: &ShipmentEvent) -> Result<InventorySummary, EngineError> {
        match event {
            ShipmentEvent::Receive(receive) => self.receive(receive).await?,
            ShipmentEvent::Send(send) => self.send(send).await?,
        }
        Ok(self.store.summary().await?)
    }

    async fn receive(&self, event: &ReceiveShipment) -> Result<(), EngineError> {
        let supplier = self
            .store
            .find_supplier(&event.supplier_name)
            .await?
            .ok_or_else(|| DomainError::not_found("supplier", event.supplier_name.as_str()))?;
        let provider = self.provider(supplier.logistics_id).await?;

        let receipt = self
            .store
            .commit(vec![
                InventoryChange::AddLot {
                    received_date: event.received_date.clone(),
                    supplier_id: supplier.id,
                    quantity: event.amount,
                },
                InventoryChange::RecordReceived {
                    logistics_id: provider.id,
                    amount: event.amount,
                },
            ])
            .await?;

        debug!(
            supplier_id = %supplier.id,
            logistics = %provider.name,
            amount = %event.amount,
            received_date = %event.received_date,
            lot_id = ?receipt.lots_added.first(),
            "shipment received"
        );
        Ok(())
    }

    async fn provider(&self, id: LogisticsId) -> Result<LogisticsProvider, EngineError> {
        Ok(self
            .store
            .find_logistics_provider(id)
            .await?
            .ok_or_else(|| DomainError::not_found("logistics provider", id.to_string()))?)
    }

    async fn send(&self, event: &SendShipment) -> Result<(), EngineError> {
        let clinic = self
            .store
            .find_clinic(&event.clinic_location)
            .await?
            .ok_or_else(|| DomainError::not_found("clinic", event.clinic_location.as_str()))?;
        let provider = self.provider(clinic.logistics_id).await?;

        let lots = self.store.lots().await?;
        let plan = plan_depletion(&lots, event.amount).map_err(|err| {
            if let DomainError::InsufficientInventory {
                requested,
                available,
            } = err
            {
                warn!(
                    clinic_id = %clinic.id,
                    requested,
                    available,
                    "send rejected: insufficient inventory"
                );
            }
            EngineError::from(err)
        })?;

        let mut changes = Vec::with_capacity(plan.steps().len() + 2);
        changes.push(InventoryChange::ReduceDemand {
            clinic_id: clinic.id,
            amount: event.amount,
        });
        changes.extend(plan.steps().iter().copied().map(InventoryChange::DepleteLot));
        changes.push(InventoryChange::RecordSent {
            logistics_id: provider.id,
            amount: event.amount,
        });

        let receipt = self.store.commit(changes).await?;

        debug!(
            clinic_id = %clinic.id,
            logistics = %provider.name,
            requested = %plan.requested(),
            lots_touched = plan.steps().len(),
            lots_removed = receipt.lots_removed.len(),
            "shipment sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedData;
    use crate::store::{InMemoryInventoryStore, SqliteInventoryStore};
    use proptest::prelude::*;
    use vaxtrack_core::Quantity;

    const SCENARIO: &str = "\
1,1,1,1
1,2021-01-01,1,10
1,SupplierA,1
1,ClinicX,20,1
1,L1,0,0
";

    async fn engine_over<S: InventoryStore>(store: S) -> OrderEngine<S> {
        let seed: SeedData = SCENARIO.parse().unwrap();
        store.seed(&seed).await.unwrap();
        OrderEngine::new(store)
    }

    fn event(line: &str) -> ShipmentEvent {
        ShipmentEvent::parse_line(line).unwrap()
    }

    async fn run_scenario<S: InventoryStore>(engine: &OrderEngine<S>) {
        let first = engine.handle(&event("SupplierA,5,2021-02-01")).await.unwrap();
        assert_eq!(first.to_line(), "15,20,5,0\n");

        let second = engine.handle(&event("ClinicX,8")).await.unwrap();
        assert_eq!(second.to_line(), "7,12,5,8\n");

        let lots = engine.store().lots().await.unwrap();
        let left: Vec<(&str, i64)> = lots
            .iter()
            .map(|l| (l.received_date.as_str(), l.quantity.get()))
            .collect();
        assert_eq!(left, vec![("2021-01-01", 2), ("2021-02-01", 5)]);
    }

    #[tokio::test]
    async fn receive_then_send_in_memory() {
        let engine = engine_over(InMemoryInventoryStore::new()).await;
        run_scenario(&engine).await;
    }

    #[tokio::test]
    async fn receive_then_send_sqlite() {
        let engine = engine_over(SqliteInventoryStore::in_memory().await.unwrap()).await;
        run_scenario(&engine).await;
    }

    #[tokio::test]
    async fn names_match_case_insensitively() {
        let engine = engine_over(InMemoryInventoryStore::new()).await;
        let summary = engine.handle(&event("suppliera,1,2021-03-01")).await.unwrap();
        assert_eq!(summary.total_received, 1);
        let summary = engine.handle(&event("CLINICX,1")).await.unwrap();
        assert_eq!(summary.total_sent, 1);
    }

    #[tokio::test]
    async fn unknown_counterparty_is_not_found() {
        let engine = engine_over(SqliteInventoryStore::in_memory().await.unwrap()).await;

        let err = engine.handle(&event("Nobody,5,2021-02-01")).await.unwrap_err();
        assert!(
            matches!(err, EngineError::NotFound { entity: "supplier", ref key } if key == "Nobody"),
            "{err:?}"
        );

        let err = engine.handle(&event("Nowhere,1")).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "clinic", .. }), "{err:?}");
    }

    #[tokio::test]
    async fn insufficient_inventory_changes_nothing() {
        let engine = engine_over(SqliteInventoryStore::in_memory().await.unwrap()).await;
        let before = engine.store().summary().await.unwrap();
        let lots_before = engine.store().lots().await.unwrap();

        let err = engine.handle(&event("ClinicX,11")).await.unwrap_err();
        assert!(err.is_insufficient_inventory());
        assert!(matches!(
            err,
            EngineError::InsufficientInventory {
                requested: 11,
                available: 10
            }
        ));

        assert_eq!(engine.store().summary().await.unwrap(), before);
        assert_eq!(engine.store().lots().await.unwrap(), lots_before);
    }

    #[tokio::test]
    async fn summary_is_a_pure_read() {
        let engine = engine_over(SqliteInventoryStore::in_memory().await.unwrap()).await;
        engine.handle(&event("ClinicX,3")).await.unwrap();

        let a = engine.store().summary().await.unwrap();
        let b = engine.store().summary().await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn demand_may_go_negative() {
        let engine = engine_over(InMemoryInventoryStore::new()).await;
        engine.handle(&event("SupplierA,30,2021-02-01")).await.unwrap();
        let summary = engine.handle(&event("ClinicX,25")).await.unwrap();
        assert_eq!(summary.total_demand, -5);
        assert_eq!(summary.total_inventory, 15);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Receive(i64),
        Send(i64),
    }

    fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
        prop::collection::vec(
            prop_oneof![
                (1i64..20).prop_map(Op::Receive),
                (1i64..20).prop_map(Op::Send),
            ],
            1..30,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn inventory_is_conserved_and_counters_only_grow(ops in arb_ops()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async {
                let engine = engine_over(InMemoryInventoryStore::new()).await;
                let mut before = engine.store().summary().await.unwrap();

                for (day, op) in ops.iter().enumerate() {
                    let shipment: ShipmentEvent = match op {
                        Op::Receive(n) => ReceiveShipment {
                            supplier_name: "SupplierA".to_string(),
                            amount: Quantity::new(*n).unwrap(),
                            received_date: format!("2022-01-{:02}", day % 28 + 1).as_str().into(),
                        }
                        .into(),
                        Op::Send(n) => SendShipment {
                            clinic_location: "ClinicX".to_string(),
                            amount: Quantity::new(*n).unwrap(),
                        }
                        .into(),
                    };

                    match engine.handle(&shipment).await {
                        Ok(after) => {
                            let received = after.total_received - before.total_received;
                            let sent = after.total_sent - before.total_sent;
                            assert!(received >= 0 && sent >= 0);
                            assert_eq!(
                                after.total_inventory,
                                before.total_inventory + received - sent
                            );
                            before = after;
                        }
                        Err(err) => {
                            assert!(err.is_insufficient_inventory(), "{err:?}");
                            assert_eq!(engine.store().summary().await.unwrap(), before);
                        }
                    }
                }
            });
        }
    }
}
