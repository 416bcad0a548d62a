//! FIFO lot depletion.
//!
//! Sending `n` units removes them from the oldest lots first. Planning is split from
//! applying so the decision is a pure function over a snapshot of the lots:
//!
//! 1. `plan_depletion` orders lots by `(received_date, id)` and walks them, fully
//!    consuming each lot until the last one, which is only reduced.
//! 2. The store applies the resulting steps inside one transaction.
//!
//! A request larger than the total on hand is rejected up front; no step is produced,
//! so nothing is mutated.

use vaxtrack_core::{DomainError, DomainResult, LotId, Quantity};

use crate::lot::VaccineLot;
use crate::summary::checked_total;

/// One lot touched by a depletion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DepletionStep {
    pub lot_id: LotId,
    /// Quantity the lot held when the plan was made.
    pub on_hand: Quantity,
    /// Units taken from the lot.
    pub taken: Quantity,
}

impl DepletionStep {
    /// Whether the lot is used up (and must be deleted).
    pub fn exhausts_lot(&self) -> bool {
        self.taken >= self.on_hand
    }

    /// Quantity left in the lot after this step.
    pub fn remaining(&self) -> Quantity {
        self.on_hand.checked_sub(self.taken).unwrap_or(Quantity::ZERO)
    }
}

/// Ordered set of steps that removes exactly `requested` units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepletionPlan {
    requested: Quantity,
    steps: Vec<DepletionStep>,
}

impl DepletionPlan {
    pub fn requested(&self) -> Quantity {
        self.requested
    }

    pub fn steps(&self) -> &[DepletionStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<DepletionStep> {
        self.steps
    }

    pub fn total_taken(&self) -> i64 {
        self.steps.iter().map(|s| s.taken.get()).sum()
    }
}

/// Lots in consumption order: oldest `received_date` first, lowest id on ties.
pub fn fifo_order(lots: &[VaccineLot]) -> Vec<&VaccineLot> {
    let mut ordered: Vec<&VaccineLot> = lots.iter().collect();
    ordered.sort_by(|a, b| a.consumption_key().cmp(&b.consumption_key()));
    ordered
}

/// Plan the removal of `amount` units from `lots`, oldest first.
///
/// Returns `DomainError::InsufficientInventory` when the lots hold fewer than
/// `amount` units in total.
pub fn plan_depletion(lots: &[VaccineLot], amount: Quantity) -> DomainResult<DepletionPlan> {
    let available = checked_total("inventory", lots.iter().map(|l| l.quantity.get()))?;
    if available < amount.get() {
        return Err(DomainError::insufficient_inventory(amount.get(), available));
    }

    let mut remaining = amount.get();
    let mut steps = Vec::new();

    for lot in fifo_order(lots) {
        if remaining == 0 {
            break;
        }

        let on_hand = lot.quantity.get();
        let taken = if remaining >= on_hand { on_hand } else { remaining };
        remaining -= taken;

        steps.push(DepletionStep {
            lot_id: lot.id,
            on_hand: lot.quantity,
            taken: Quantity::new(taken)?,
        });
    }

    if remaining != 0 {
        return Err(DomainError::invariant(format!(
            "depletion left {remaining} units unplanned"
        )));
    }

    Ok(DepletionPlan {
        requested: amount,
        steps,
    })
}

/// Apply a plan to an in-memory lot list: exhausted lots are removed, the rest shrink.
///
/// Every step must still match the lot it was planned against.
pub fn apply_depletion(lots: &mut Vec<VaccineLot>, plan: &DepletionPlan) -> DomainResult<()> {
    for step in plan.steps() {
        let idx = lots
            .iter()
            .position(|l| l.id == step.lot_id)
            .ok_or_else(|| DomainError::not_found("vaccine lot", step.lot_id.to_string()))?;

        if lots[idx].quantity != step.on_hand {
            return Err(DomainError::invariant(format!(
                "lot {} holds {} units, plan expected {}",
                step.lot_id, lots[idx].quantity, step.on_hand
            )));
        }

        if step.exhausts_lot() {
            lots.remove(idx);
        } else {
            lots[idx].take(step.taken)?;
        }
    }
    Ok(())
}
