//! Stock count completion.
//!
//! Completion applies every count line as a `SetQuantity` mutation in one
//! atomic batch: differences are recomputed against the live quantity
//! under the row locks, so stock that moved while the count was open is
//! corrected exactly once. Each non-zero variance yields one count-reason
//! adjustment movement referencing the session. On any failure the session
//! stays `in_progress` and no row changes.

use chrono::Utc;
use tracing::info;

use stocksmith_core::{ActorContext, Catalog, MovementId, StockError, StockResult, WarehouseDirectory};
use stocksmith_counting::StockCountSession;
use stocksmith_inventory::{ItemKey, StockChange, StockPolicy};
use stocksmith_ledger::{MovementLedger, MovementType, NewMovement};

use crate::catalog::{ensure_product, ensure_warehouse};
use crate::store::{InventoryStore, StockMutation};

pub struct CountProcessor<S, C, L> {
    store: S,
    catalog: C,
    ledger: L,
}

impl<S, C, L> CountProcessor<S, C, L>
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

    /// `in_progress → completed`, reconciling every counted line.
    ///
    /// Returns the movements appended for the non-zero variances. Lock
    /// exhaustion during the batch surfaces as `Conflict`; the caller may
    /// retry the whole completion.
    pub fn complete(
        &self,
        ctx: &ActorContext,
        session: &mut StockCountSession,
    ) -> StockResult<Vec<MovementId>> {
        session.ensure_completable()?;
        if session.company() != ctx.company {
            return Err(StockError::not_found(format!("count session {}", session.id())));
        }
        ensure_warehouse(&self.catalog, ctx.company, session.warehouse())?;
        for line in session.lines() {
            ensure_product(&self.catalog, ctx.company, line.product)?;
        }

        let ops: Vec<StockMutation> = session
            .lines()
            .iter()
            .map(|line| {
                let mut key = ItemKey::new(ctx.company, session.warehouse(), line.product);
                key.location = line.location;
                key.batch = line.batch.clone();
                StockMutation::new(
                    key,
                    StockChange::SetQuantity {
                        counted: line.counted_quantity,
                    },
                )
            })
            .collect();

        let policy = StockPolicy {
            allow_negative_stock: self.catalog.allow_negative_stock(session.warehouse()),
        };

        let reference = format!("Stock count {}", session.id());
        let mut movements = Vec::new();
        self.store.apply_batch_with(&ops, policy, |outcomes| {
            for outcome in outcomes {
                if outcome.applied.is_noop() {
                    continue;
                }
                let difference = outcome.applied.quantity;
                let negative = difference.is_sign_negative();
                let location = outcome.key.location;
                let id = self.ledger.append(NewMovement {
                    company: ctx.company,
                    warehouse: session.warehouse(),
                    product: Some(outcome.key.product),
                    location_from: if negative { location } else { None },
                    location_to: if negative { None } else { location },
                    batch: outcome.key.batch.clone(),
                    expiry_date: outcome.item.expiry_date(),
                    movement_type: MovementType::Adjustment,
                    quantity: difference.abs(),
                    reference: reference.clone(),
                    reason: "count: stock count variance".to_string(),
                    created_by: ctx.user,
                })?;
                movements.push(id);
            }
            Ok(())
        })?;

        session.mark_completed(Utc::now())?;
        info!(
            session = %session.id(),
            lines = session.lines().len(),
            variances = movements.len(),
            "stock count completed"
        );
        Ok(movements)
    }
}
