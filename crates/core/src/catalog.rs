//! Narrow interfaces onto external collaborators.
//!
//! The engine never owns master data or order documents; it consumes them
//! through these traits. Implementations live with the collaborator (the
//! engine crate ships in-memory ones for tests and embedding).

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::StockResult;
use crate::id::{CompanyId, LocationId, OrderId, ProductId, WarehouseId};

/// Existence and company-ownership lookups for catalog references.
///
/// `None` means "no such entity"; the caller turns that, and any company
/// mismatch, into a `NotFound` error before taking locks.
pub trait Catalog: Send + Sync {
    fn warehouse_company(&self, warehouse: WarehouseId) -> Option<CompanyId>;
    fn product_company(&self, product: ProductId) -> Option<CompanyId>;
    fn location_warehouse(&self, location: LocationId) -> Option<WarehouseId>;
}

/// Per-warehouse stock policy flags.
pub trait WarehouseDirectory: Send + Sync {
    /// Whether on-hand quantity may drop below zero in this warehouse.
    fn allow_negative_stock(&self, warehouse: WarehouseId) -> bool;

    /// Whether the warehouse tracks stock at bin-location granularity.
    fn uses_bins(&self, warehouse: WarehouseId) -> bool;
}

/// Callbacks onto inbound/outbound order lines.
///
/// Invoked by the coordinator (received/shipped) and the reservation manager
/// (allocated/released) inside the same unit as the triggering mutation, so
/// order quantities never drift from stock quantities. When a later step of
/// that unit fails, the caller backs a recording out through the matching
/// `revert_*` method before surfacing the error.
pub trait OrderLineHooks: Send + Sync {
    fn record_received(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()>;
    fn record_shipped(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()>;
    fn record_allocated(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()>;
    fn record_released(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()>;

    /// Back out a `record_received` whose enclosing unit failed to commit.
    fn revert_received(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()>;

    /// Back out a `record_shipped` whose enclosing unit failed to commit.
    fn revert_shipped(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()>;
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn warehouse_company(&self, warehouse: WarehouseId) -> Option<CompanyId> {
        (**self).warehouse_company(warehouse)
    }

    fn product_company(&self, product: ProductId) -> Option<CompanyId> {
        (**self).product_company(product)
    }

    fn location_warehouse(&self, location: LocationId) -> Option<WarehouseId> {
        (**self).location_warehouse(location)
    }
}

impl<W> WarehouseDirectory for Arc<W>
where
    W: WarehouseDirectory + ?Sized,
{
    fn allow_negative_stock(&self, warehouse: WarehouseId) -> bool {
        (**self).allow_negative_stock(warehouse)
    }

    fn uses_bins(&self, warehouse: WarehouseId) -> bool {
        (**self).uses_bins(warehouse)
    }
}

impl<H> OrderLineHooks for Arc<H>
where
    H: OrderLineHooks + ?Sized,
{
    fn record_received(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        (**self).record_received(order, line_no, quantity)
    }

    fn record_shipped(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        (**self).record_shipped(order, line_no, quantity)
    }

    fn record_allocated(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        (**self).record_allocated(order, line_no, quantity)
    }

    fn record_released(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        (**self).record_released(order, line_no, quantity)
    }

    fn revert_received(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        (**self).revert_received(order, line_no, quantity)
    }

    fn revert_shipped(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        (**self).revert_shipped(order, line_no, quantity)
    }
}
