use serde::{Deserialize, Serialize};

use vaxtrack_core::{DomainResult, Entity, LotId, Quantity, ReceivedDate, SupplierId};

/// One received shipment, depleted oldest-first by sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineLot {
    pub id: LotId,
    pub received_date: ReceivedDate,
    pub supplier_id: SupplierId,
    pub quantity: Quantity,
}

impl VaccineLot {
    pub fn new(
        id: LotId,
        received_date: impl Into<ReceivedDate>,
        supplier_id: SupplierId,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            received_date: received_date.into(),
            supplier_id,
            quantity,
        }
    }

    /// Sort key for consumption: oldest date first, lowest id on a date tie.
    pub fn consumption_key(&self) -> (&ReceivedDate, LotId) {
        (&self.received_date, self.id)
    }

    /// Remove `units` from this lot.
    pub fn take(&mut self, units: Quantity) -> DomainResult<()> {
        self.quantity = self.quantity.checked_sub(units)?;
        Ok(())
    }
}

impl Entity for VaccineLot {
    type Id = LotId;

    fn id(&self) -> LotId {
        self.id
    }
}
