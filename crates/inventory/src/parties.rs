//! The static side of the network: suppliers, clinics and logistics providers.
//!
//! These rows are created once when the store is seeded. Suppliers never change;
//! clinics only see their demand reduced; providers only accumulate counters.

use serde::{Deserialize, Serialize};

use vaxtrack_core::{ClinicId, DomainError, DomainResult, Entity, LogisticsId, Quantity, SupplierId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub logistics_id: LogisticsId,
}

impl Supplier {
    /// Case-insensitive exact name match.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> SupplierId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clinic {
    pub id: ClinicId,
    pub location: String,
    /// Outstanding demand. Not floored: negative means the clinic was over-served.
    pub demand: i64,
    pub logistics_id: LogisticsId,
}

impl Clinic {
    /// Case-insensitive exact location match.
    pub fn is_located_at(&self, location: &str) -> bool {
        self.location.eq_ignore_ascii_case(location.trim())
    }

    pub fn reduce_demand(&mut self, amount: Quantity) -> DomainResult<()> {
        self.demand = self.demand.checked_sub(amount.get()).ok_or_else(|| {
            DomainError::invariant(format!("demand of clinic {} underflows", self.id))
        })?;
        Ok(())
    }
}

impl Entity for Clinic {
    type Id = ClinicId;

    fn id(&self) -> ClinicId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticsProvider {
    pub id: LogisticsId,
    pub name: String,
    /// Cumulative units shipped to clinics.
    pub count_sent: Quantity,
    /// Cumulative units delivered by suppliers.
    pub count_received: Quantity,
}

impl LogisticsProvider {
    pub fn record_sent(&mut self, amount: Quantity) -> DomainResult<()> {
        self.count_sent = self.count_sent.checked_add(amount)?;
        Ok(())
    }

    pub fn record_received(&mut self, amount: Quantity) -> DomainResult<()> {
        self.count_received = self.count_received.checked_add(amount)?;
        Ok(())
    }
}

impl Entity for LogisticsProvider {
    type Id = LogisticsId;

    fn id(&self) -> LogisticsId {
        self.id
    }
}
