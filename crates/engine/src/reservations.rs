//! Reservation management.
//!
//! Reserving earmarks on-hand quantity against open outbound order lines by
//! raising `reserved_quantity` across candidate rows. Pure bookkeeping: no
//! movement is appended; the paired allocation delta goes to the order line
//! through the hooks inside the same unit.

use rust_decimal::Decimal;
use tracing::debug;

use stocksmith_core::{
    ActorContext, Catalog, OrderLineHooks, ProductId, StockError, StockResult, ValidationKind,
    WarehouseDirectory, WarehouseId,
};
use stocksmith_inventory::{InventoryItem, StockChange, StockPolicy};
use stocksmith_operations::OrderLineRef;

use crate::catalog::{ensure_product, ensure_warehouse};
use crate::store::{AppliedOutcome, InventoryStore, StockMutation};

/// How reservations are spread over candidate rows.
///
/// Deterministic per deployment; the engine never mixes strategies within
/// one reserve call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReservationStrategy {
    /// Earliest expiry first, unexpiring rows last, oldest row breaking
    /// ties. The right default for batch-tracked stock.
    #[default]
    FirstExpiring,
    /// Fewest rows touched: largest available quantity first.
    LargestAvailableFirst,
}

pub struct ReservationManager<S, C, H> {
    store: S,
    catalog: C,
    hooks: H,
    strategy: ReservationStrategy,
}

impl<S, C, H> ReservationManager<S, C, H>
where
    S: InventoryStore,
    C: Catalog + WarehouseDirectory,
    H: OrderLineHooks,
{
    pub fn new(store: S, catalog: C, hooks: H) -> Self {
        Self {
            store,
            catalog,
            hooks,
            strategy: ReservationStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ReservationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ReservationStrategy {
        self.strategy
    }

    /// Reserve `quantity` for a product in a warehouse. Atomic: either the
    /// full quantity is covered or nothing is reserved and
    /// `InsufficientAvailable` reports what was on hand.
    pub fn reserve(
        &self,
        ctx: &ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
        quantity: Decimal,
    ) -> StockResult<Vec<AppliedOutcome>> {
        self.reserve_inner(ctx, warehouse, product, quantity, None)
    }

    /// Reserve and record the allocation on the outbound order line in the
    /// same unit; a hook failure rolls the reservation back.
    pub fn reserve_for_line(
        &self,
        ctx: &ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
        quantity: Decimal,
        line: OrderLineRef,
    ) -> StockResult<Vec<AppliedOutcome>> {
        self.reserve_inner(ctx, warehouse, product, quantity, Some(line))
    }

    fn reserve_inner(
        &self,
        ctx: &ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
        quantity: Decimal,
        line: Option<OrderLineRef>,
    ) -> StockResult<Vec<AppliedOutcome>> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("reserved quantity must be positive"));
        }
        ensure_warehouse(&self.catalog, ctx.company, warehouse)?;
        ensure_product(&self.catalog, ctx.company, product)?;

        let candidates = self.candidates(ctx, warehouse, product)?;
        let available: Decimal = candidates.iter().map(|i| i.available()).sum();
        if available < quantity {
            return Err(ValidationKind::InsufficientAvailable {
                requested: quantity,
                available,
            }
            .into());
        }

        let mut ops = Vec::new();
        let mut remaining = quantity;
        for item in &candidates {
            if remaining.is_zero() {
                break;
            }
            let take = item.available().min(remaining);
            if take.is_zero() {
                continue;
            }
            ops.push(StockMutation::new(
                item.key().clone(),
                StockChange::Delta {
                    quantity: Decimal::ZERO,
                    reserved: take,
                },
            ));
            remaining -= take;
        }

        let policy = StockPolicy {
            allow_negative_stock: self.catalog.allow_negative_stock(warehouse),
        };
        let outcomes = self.store.apply_batch_with(&ops, policy, |_| {
            if let Some(line) = line {
                self.hooks.record_allocated(line.order, line.line_no, quantity)?;
            }
            Ok(())
        })?;

        debug!(%warehouse, %product, %quantity, rows = outcomes.len(), "stock reserved");
        Ok(outcomes)
    }

    /// Release up to `quantity` of reservation, clamped at what is held.
    /// Returns the quantity actually released.
    pub fn release(
        &self,
        ctx: &ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
        quantity: Decimal,
    ) -> StockResult<Decimal> {
        self.release_inner(ctx, warehouse, product, quantity, None)
    }

    pub fn release_for_line(
        &self,
        ctx: &ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
        quantity: Decimal,
        line: OrderLineRef,
    ) -> StockResult<Decimal> {
        self.release_inner(ctx, warehouse, product, quantity, Some(line))
    }

    fn release_inner(
        &self,
        ctx: &ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
        quantity: Decimal,
        line: Option<OrderLineRef>,
    ) -> StockResult<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("released quantity must be positive"));
        }
        ensure_warehouse(&self.catalog, ctx.company, warehouse)?;
        ensure_product(&self.catalog, ctx.company, product)?;

        let candidates = self.candidates(ctx, warehouse, product)?;
        let mut ops = Vec::new();
        let mut remaining = quantity;
        for item in &candidates {
            if remaining.is_zero() {
                break;
            }
            let give = item.reserved_quantity().min(remaining);
            if give.is_zero() {
                continue;
            }
            ops.push(StockMutation::new(
                item.key().clone(),
                StockChange::Delta {
                    quantity: Decimal::ZERO,
                    reserved: -give,
                },
            ));
            remaining -= give;
        }

        let released = quantity - remaining;
        if ops.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let policy = StockPolicy {
            allow_negative_stock: self.catalog.allow_negative_stock(warehouse),
        };
        self.store.apply_batch_with(&ops, policy, |_| {
            if let Some(line) = line {
                self.hooks.record_released(line.order, line.line_no, released)?;
            }
            Ok(())
        })?;

        debug!(%warehouse, %product, %released, "reservation released");
        Ok(released)
    }

    /// Unlocked rows for the product, ordered by the configured strategy.
    fn candidates(
        &self,
        ctx: &ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
    ) -> StockResult<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self
            .store
            .list(ctx.company)?
            .into_iter()
            .filter(|i| {
                i.key().warehouse == warehouse && i.key().product == product && !i.is_locked()
            })
            .collect();

        match self.strategy {
            ReservationStrategy::FirstExpiring => {
                items.sort_by(|a, b| {
                    match (a.expiry_date(), b.expiry_date()) {
                        (Some(x), Some(y)) => x.cmp(&y),
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    }
                    .then_with(|| a.created_at().cmp(&b.created_at()))
                });
            }
            ReservationStrategy::LargestAvailableFirst => {
                items.sort_by(|a, b| {
                    b.available()
                        .cmp(&a.available())
                        .then_with(|| a.created_at().cmp(&b.created_at()))
                });
            }
        }
        Ok(items)
    }
}
