use serde::{Deserialize, Serialize};

use vaxtrack_core::{DomainError, DomainResult};

use crate::lot::VaccineLot;
use crate::parties::{Clinic, LogisticsProvider};

/// Network-wide totals reported after every processed event.
///
/// Rendered as `inventory,demand,received,sent`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    /// Units on hand across all lots.
    pub total_inventory: i64,
    /// Sum of clinic demand; negative when clinics are over-served.
    pub total_demand: i64,
    pub total_received: i64,
    pub total_sent: i64,
}

impl InventorySummary {
    pub fn compute<'a>(
        lots: impl IntoIterator<Item = &'a VaccineLot>,
        clinics: impl IntoIterator<Item = &'a Clinic>,
        providers: impl IntoIterator<Item = &'a LogisticsProvider>,
    ) -> DomainResult<Self> {
        let mut summary = Self {
            total_inventory: checked_total("inventory", lots.into_iter().map(|l| l.quantity.get()))?,
            total_demand: checked_total("demand", clinics.into_iter().map(|c| c.demand))?,
            ..Self::default()
        };
        for p in providers {
            summary.total_received =
                checked_total("received", [summary.total_received, p.count_received.get()])?;
            summary.total_sent = checked_total("sent", [summary.total_sent, p.count_sent.get()])?;
        }
        Ok(summary)
    }

    /// Output line, terminated by `\n`.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

/// Sum that fails instead of wrapping past `i64`.
pub(crate) fn checked_total(what: &str, values: impl IntoIterator<Item = i64>) -> DomainResult<i64> {
    values.into_iter().try_fold(0i64, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| DomainError::invariant(format!("total {what} overflows")))
    })
}

impl core::fmt::Display for InventorySummary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.total_inventory, self.total_demand, self.total_received, self.total_sent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaxtrack_core::{ClinicId, LogisticsId, LotId, Quantity, SupplierId};

    #[test]
    fn formats_as_comma_separated_line() {
        let summary = InventorySummary {
            total_inventory: 7,
            total_demand: -3,
            total_received: 5,
            total_sent: 8,
        };
        assert_eq!(summary.to_line(), "7,-3,5,8\n");
    }

    #[test]
    fn empty_state_sums_to_zero() {
        let summary = InventorySummary::compute([], [], []).unwrap();
        assert_eq!(summary.to_string(), "0,0,0,0");
    }

    #[test]
    fn sums_every_collection() {
        let lots = vec![
            VaccineLot::new(LotId::new(1), "2021-01-01", SupplierId::new(1), Quantity::new(10).unwrap()),
            VaccineLot::new(LotId::new(2), "2021-02-01", SupplierId::new(1), Quantity::new(5).unwrap()),
        ];
        let clinics = vec![Clinic {
            id: ClinicId::new(1),
            location: "ClinicX".to_string(),
            demand: 20,
            logistics_id: LogisticsId::new(1),
        }];
        let providers = vec![LogisticsProvider {
            id: LogisticsId::new(1),
            name: "L1".to_string(),
            count_sent: Quantity::new(2).unwrap(),
            count_received: Quantity::new(5).unwrap(),
        }];

        let summary = InventorySummary::compute(&lots, &clinics, &providers).unwrap();
        assert_eq!(summary.to_string(), "15,20,5,2");
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        let lots = vec![
            VaccineLot::new(LotId::new(1), "2021-01-01", SupplierId::new(1), Quantity::new(i64::MAX).unwrap()),
            VaccineLot::new(LotId::new(2), "2021-02-01", SupplierId::new(1), Quantity::new(1).unwrap()),
        ];
        let err = InventorySummary::compute(&lots, [], []).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(ref msg) if msg.contains("inventory")));

        let clinics = vec![
            Clinic {
                id: ClinicId::new(1),
                location: "A".to_string(),
                demand: i64::MIN,
                logistics_id: LogisticsId::new(1),
            },
            Clinic {
                id: ClinicId::new(2),
                location: "B".to_string(),
                demand: -1,
                logistics_id: LogisticsId::new(1),
            },
        ];
        assert!(InventorySummary::compute([], &clinics, []).is_err());
    }
}
