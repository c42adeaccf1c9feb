//! Read projections over the inventory store.
//!
//! Aggregated views for reporting and the protect-on-delete precondition
//! the catalog collaborator calls before removing a product.

use std::collections::HashMap;

use rust_decimal::Decimal;

use stocksmith_core::{CompanyId, LocationId, ProductId, StockError, StockResult, WarehouseId};

use crate::store::InventoryStore;

/// Aggregate stock position for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStock {
    pub product: ProductId,
    pub on_hand: Decimal,
    pub reserved: Decimal,
    pub available: Decimal,
}

/// Aggregate stock position for one location (None covers rows tracked
/// without a bin location).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationStock {
    pub location: Option<LocationId>,
    pub on_hand: Decimal,
    pub reserved: Decimal,
    pub available: Decimal,
}

/// Stock per product, optionally narrowed to one warehouse.
pub fn stock_by_product<S: InventoryStore>(
    store: &S,
    company: CompanyId,
    warehouse: Option<WarehouseId>,
) -> StockResult<Vec<ProductStock>> {
    let mut by_product: HashMap<ProductId, ProductStock> = HashMap::new();
    for item in store.list(company)? {
        if warehouse.is_some_and(|w| item.key().warehouse != w) {
            continue;
        }
        let entry = by_product
            .entry(item.key().product)
            .or_insert_with(|| ProductStock {
                product: item.key().product,
                on_hand: Decimal::ZERO,
                reserved: Decimal::ZERO,
                available: Decimal::ZERO,
            });
        entry.on_hand += item.quantity();
        entry.reserved += item.reserved_quantity();
        entry.available += item.available();
    }
    let mut rows: Vec<ProductStock> = by_product.into_values().collect();
    rows.sort_by_key(|r| *r.product.as_uuid());
    Ok(rows)
}

/// Stock per location within one warehouse.
pub fn stock_by_location<S: InventoryStore>(
    store: &S,
    company: CompanyId,
    warehouse: WarehouseId,
) -> StockResult<Vec<LocationStock>> {
    let mut by_location: HashMap<Option<LocationId>, LocationStock> = HashMap::new();
    for item in store.list(company)? {
        if item.key().warehouse != warehouse {
            continue;
        }
        let entry = by_location
            .entry(item.key().location)
            .or_insert_with(|| LocationStock {
                location: item.key().location,
                on_hand: Decimal::ZERO,
                reserved: Decimal::ZERO,
                available: Decimal::ZERO,
            });
        entry.on_hand += item.quantity();
        entry.reserved += item.reserved_quantity();
        entry.available += item.available();
    }
    let mut rows: Vec<LocationStock> = by_location.into_values().collect();
    rows.sort_by_key(|r| r.location.map(|l| *l.as_uuid()));
    Ok(rows)
}

/// Products whose total available quantity sits below `threshold`.
pub fn low_stock<S: InventoryStore>(
    store: &S,
    company: CompanyId,
    warehouse: Option<WarehouseId>,
    threshold: Decimal,
) -> StockResult<Vec<ProductStock>> {
    Ok(stock_by_product(store, company, warehouse)?
        .into_iter()
        .filter(|r| r.available < threshold)
        .collect())
}

/// Precondition for deleting a product from the catalog: refuse while any
/// row still holds quantity or reservation for it.
pub fn ensure_product_deletable<S: InventoryStore>(
    store: &S,
    company: CompanyId,
    product: ProductId,
) -> StockResult<()> {
    for item in store.list(company)? {
        if item.key().product != product {
            continue;
        }
        if !item.quantity().is_zero() || !item.reserved_quantity().is_zero() {
            return Err(StockError::invalid(format!(
                "product {product} still has active stock"
            )));
        }
    }
    Ok(())
}
