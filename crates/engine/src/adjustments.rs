//! Manual adjustment processing.
//!
//! One adjustment mutates exactly one inventory row and appends exactly
//! one `adjustment`-typed movement, both inside one locked unit. Canceling
//! an adjustment never touches history; it applies the inverse adjustment
//! as a new correction.

use tracing::info;

use stocksmith_core::{ActorContext, Catalog, MovementId, StockError, StockResult, WarehouseDirectory};
use stocksmith_inventory::{InventoryItem, ItemKey, StockAdjustment, StockChange, StockPolicy};
use stocksmith_ledger::{MovementLedger, MovementType, NewMovement};

use crate::catalog::{ensure_location, ensure_product, ensure_warehouse};
use crate::store::{InventoryStore, StockMutation};

pub struct AdjustmentProcessor<S, C, L> {
    store: S,
    catalog: C,
    ledger: L,
}

impl<S, C, L> AdjustmentProcessor<S, C, L>
where
    S: InventoryStore,
    C: Catalog + WarehouseDirectory,
    L: MovementLedger,
{
    pub fn new(store: S, catalog: C, ledger: L) -> Self {
        Self {
            store,
            catalog,
            ledger,
        }
    }

    /// Apply one signed correction. Cross-company and unknown references
    /// are rejected before any row lock is taken.
    pub fn apply(
        &self,
        ctx: &ActorContext,
        adjustment: &StockAdjustment,
    ) -> StockResult<(InventoryItem, MovementId)> {
        adjustment.validate()?;
        ensure_warehouse(&self.catalog, ctx.company, adjustment.warehouse)?;
        ensure_product(&self.catalog, ctx.company, adjustment.product)?;
        match adjustment.location {
            Some(location) => ensure_location(&self.catalog, adjustment.warehouse, location)?,
            None if self.catalog.uses_bins(adjustment.warehouse) => {
                return Err(StockError::invalid(
                    "location required in a bin-tracked warehouse",
                ));
            }
            None => {}
        }

        let policy = StockPolicy {
            allow_negative_stock: self.catalog.allow_negative_stock(adjustment.warehouse),
        };

        let mut key = ItemKey::new(ctx.company, adjustment.warehouse, adjustment.product);
        key.location = adjustment.location;
        key.batch = adjustment.batch.clone();

        let change = StockChange::Delta {
            quantity: adjustment.quantity_difference,
            reserved: rust_decimal::Decimal::ZERO,
        };

        let mut movement_id = None;
        let outcomes = self.store.apply_batch_with(
            &[StockMutation::new(key, change)],
            policy,
            |outcomes| {
                let outcome = &outcomes[0];
                movement_id = Some(self.ledger.append(movement_for(ctx, adjustment, outcome))?);
                Ok(())
            },
        )?;

        let outcome = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| StockError::infrastructure("no outcome"))?;
        let movement_id = movement_id
            .ok_or_else(|| StockError::infrastructure("no movement id"))?;

        info!(
            reference = %adjustment.reference,
            reason = adjustment.reason.as_str(),
            difference = %adjustment.quantity_difference,
            "stock adjustment applied"
        );

        Ok((outcome.item, movement_id))
    }

    /// Undo a previously applied adjustment by issuing its inverse under a
    /// new reference. The original movement stays in the ledger.
    pub fn cancel(
        &self,
        ctx: &ActorContext,
        adjustment: &StockAdjustment,
        reference: impl Into<String>,
    ) -> StockResult<(InventoryItem, MovementId)> {
        self.apply(ctx, &adjustment.inverse(reference))
    }
}

/// Adjustment sign convention on the movement: a negative difference sets
/// the source location, a positive one the destination.
fn movement_for(
    ctx: &ActorContext,
    adjustment: &StockAdjustment,
    outcome: &crate::store::AppliedOutcome,
) -> NewMovement {
    let negative = adjustment.quantity_difference.is_sign_negative();
    NewMovement {
        company: ctx.company,
        warehouse: adjustment.warehouse,
        product: Some(adjustment.product),
        location_from: if negative { adjustment.location } else { None },
        location_to: if negative { None } else { adjustment.location },
        batch: adjustment.batch.clone(),
        expiry_date: outcome.item.expiry_date(),
        movement_type: MovementType::Adjustment,
        quantity: adjustment.quantity_difference.abs(),
        reference: adjustment.reference.clone(),
        reason: format!("{}: {}", adjustment.reason.as_str(), adjustment.description),
        created_by: ctx.user,
    }
}
