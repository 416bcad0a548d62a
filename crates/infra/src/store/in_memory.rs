use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use vaxtrack_core::{ClinicId, DomainError, Entity, LogisticsId, LotId, SupplierId};
use vaxtrack_inventory::{
    Clinic, InventorySummary, LogisticsProvider, Supplier, VaccineLot, fifo_order,
};

use super::{CommitReceipt, InventoryChange, InventoryStore, StoreError};
use crate::seed::SeedData;

#[derive(Debug, Clone, Default)]
struct State {
    lots: BTreeMap<LotId, VaccineLot>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    clinics: BTreeMap<ClinicId, Clinic>,
    logistics: BTreeMap<LogisticsId, LogisticsProvider>,
}

impl State {
    fn apply(&mut self, change: &InventoryChange, receipt: &mut CommitReceipt) -> Result<(), StoreError> {
        match change {
            InventoryChange::AddLot {
                received_date,
                supplier_id,
                quantity,
            } => {
                if !self.suppliers.contains_key(supplier_id) {
                    return Err(missing("supplier", *supplier_id));
                }
                let id = LotId::next_after(self.lots.keys().next_back().copied());
                self.lots.insert(
                    id,
                    VaccineLot::new(id, received_date.clone(), *supplier_id, *quantity),
                );
                receipt.lots_added.push(id);
            }
            InventoryChange::DepleteLot(step) => {
                let lot = self
                    .lots
                    .get_mut(&step.lot_id)
                    .ok_or_else(|| StoreError::Conflict(format!("lot {} is gone", step.lot_id)))?;
                if lot.quantity != step.on_hand {
                    return Err(StoreError::Conflict(format!(
                        "lot {} holds {} units, expected {}",
                        step.lot_id, lot.quantity, step.on_hand
                    )));
                }
                if step.exhausts_lot() {
                    self.lots.remove(&step.lot_id);
                    receipt.lots_removed.push(step.lot_id);
                } else {
                    lot.take(step.taken).map_err(domain_to_store)?;
                }
            }
            InventoryChange::ReduceDemand { clinic_id, amount } => {
                self.clinics
                    .get_mut(clinic_id)
                    .ok_or_else(|| missing("clinic", *clinic_id))?
                    .reduce_demand(*amount)
                    .map_err(domain_to_store)?;
            }
            InventoryChange::RecordReceived {
                logistics_id,
                amount,
            } => {
                self.logistics
                    .get_mut(logistics_id)
                    .ok_or_else(|| missing("logistics provider", *logistics_id))?
                    .record_received(*amount)
                    .map_err(domain_to_store)?;
            }
            InventoryChange::RecordSent {
                logistics_id,
                amount,
            } => {
                self.logistics
                    .get_mut(logistics_id)
                    .ok_or_else(|| missing("logistics provider", *logistics_id))?
                    .record_sent(*amount)
                    .map_err(domain_to_store)?;
            }
        }
        Ok(())
    }
}

fn insert_all<E>(
    table: &mut BTreeMap<E::Id, E>,
    rows: &[E],
    entity: &str,
) -> Result<(), StoreError>
where
    E: Entity + Clone,
{
    for row in rows {
        if table.insert(row.id(), row.clone()).is_some() {
            return Err(StoreError::Integrity(format!(
                "{entity} {} already exists",
                row.id()
            )));
        }
    }
    Ok(())
}

fn missing(entity: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::Integrity(format!("{entity} {id} does not exist"))
}

fn domain_to_store(err: DomainError) -> StoreError {
    StoreError::Integrity(err.to_string())
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Commits apply to a copy of the state which is swapped in
/// only when every change succeeded.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn seed(&self, data: &SeedData) -> Result<(), StoreError> {
        data.validate()
            .map_err(|e| StoreError::Integrity(e.to_string()))?;

        let mut state = self.write()?;
        let mut next = state.clone();

        insert_all(&mut next.logistics, &data.logistics, "logistics provider")?;
        insert_all(&mut next.suppliers, &data.suppliers, "supplier")?;
        insert_all(&mut next.clinics, &data.clinics, "clinic")?;
        insert_all(&mut next.lots, &data.lots, "vaccine lot")?;

        *state = next;
        Ok(())
    }

    async fn find_supplier(&self, name: &str) -> Result<Option<Supplier>, StoreError> {
        let state = self.read()?;
        Ok(state.suppliers.values().find(|s| s.is_named(name)).cloned())
    }

    async fn find_clinic(&self, location: &str) -> Result<Option<Clinic>, StoreError> {
        let state = self.read()?;
        Ok(state
            .clinics
            .values()
            .find(|c| c.is_located_at(location))
            .cloned())
    }

    async fn find_logistics_provider(
        &self,
        id: LogisticsId,
    ) -> Result<Option<LogisticsProvider>, StoreError> {
        let state = self.read()?;
        Ok(state.logistics.get(&id).cloned())
    }

    async fn lots(&self) -> Result<Vec<VaccineLot>, StoreError> {
        let state = self.read()?;
        let lots: Vec<VaccineLot> = state.lots.values().cloned().collect();
        Ok(fifo_order(&lots).into_iter().cloned().collect())
    }

    async fn commit(&self, changes: Vec<InventoryChange>) -> Result<CommitReceipt, StoreError> {
        let mut state = self.write()?;
        let mut next = state.clone();
        let mut receipt = CommitReceipt::default();

        for change in &changes {
            next.apply(change, &mut receipt)?;
        }

        *state = next;
        Ok(receipt)
    }

    async fn summary(&self) -> Result<InventorySummary, StoreError> {
        let state = self.read()?;
        InventorySummary::compute(
            state.lots.values(),
            state.clinics.values(),
            state.logistics.values(),
        )
        .map_err(domain_to_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaxtrack_core::Quantity;
    use vaxtrack_inventory::plan_depletion;

    async fn seeded() -> InMemoryInventoryStore {
        let seed: SeedData = "2,1,1,1\n1,2021-01-01,1,5\n2,2021-02-01,1,3\n1,SupplierA,1\n1,ClinicX,20,1\n1,L1,0,0\n"
            .parse()
            .unwrap();
        let store = InMemoryInventoryStore::new();
        store.seed(&seed).await.unwrap();
        store
    }

    #[tokio::test]
    async fn failed_commit_leaves_state_untouched() {
        let store = seeded().await;
        let before = store.summary().await.unwrap();

        let err = store
            .commit(vec![
                InventoryChange::ReduceDemand {
                    clinic_id: ClinicId::new(1),
                    amount: Quantity::new(4).unwrap(),
                },
                InventoryChange::RecordSent {
                    logistics_id: LogisticsId::new(99),
                    amount: Quantity::new(4).unwrap(),
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Integrity(_)));
        assert_eq!(store.summary().await.unwrap(), before);
    }

    #[tokio::test]
    async fn new_lots_take_max_id_plus_one() {
        let store = seeded().await;
        let receipt = store
            .commit(vec![InventoryChange::AddLot {
                received_date: "2021-03-01".into(),
                supplier_id: SupplierId::new(1),
                quantity: Quantity::new(1).unwrap(),
            }])
            .await
            .unwrap();
        assert_eq!(receipt.lots_added, vec![LotId::new(3)]);

        let empty = InMemoryInventoryStore::new();
        let seed: SeedData = "0,1,0,1\n1,SupplierA,1\n1,L1,0,0\n".parse().unwrap();
        empty.seed(&seed).await.unwrap();
        let receipt = empty
            .commit(vec![InventoryChange::AddLot {
                received_date: "2021-03-01".into(),
                supplier_id: SupplierId::new(1),
                quantity: Quantity::new(1).unwrap(),
            }])
            .await
            .unwrap();
        assert_eq!(receipt.lots_added, vec![LotId::FIRST]);
    }

    #[tokio::test]
    async fn stale_depletion_step_conflicts() {
        let store = seeded().await;
        let lots = store.lots().await.unwrap();
        let plan = plan_depletion(&lots, Quantity::new(2).unwrap()).unwrap();

        store
            .commit(plan.steps().iter().copied().map(InventoryChange::DepleteLot).collect())
            .await
            .unwrap();
        let err = store
            .commit(plan.steps().iter().copied().map(InventoryChange::DepleteLot).collect())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
