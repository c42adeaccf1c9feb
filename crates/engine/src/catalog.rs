//! In-memory catalog for tests and embedded use.
//!
//! Master data lives with the surrounding application in production; this
//! implementation backs the collaborator traits with plain maps.

use std::collections::HashMap;
use std::sync::RwLock;

use stocksmith_core::{
    Catalog, CompanyId, LocationId, ProductId, StockError, StockResult, WarehouseDirectory,
    WarehouseId,
};

/// Reject a warehouse that is absent or owned by another company. Runs
/// before any lock is taken.
pub(crate) fn ensure_warehouse<C: Catalog>(
    catalog: &C,
    company: CompanyId,
    warehouse: WarehouseId,
) -> StockResult<()> {
    match catalog.warehouse_company(warehouse) {
        Some(owner) if owner == company => Ok(()),
        _ => Err(StockError::not_found(format!("warehouse {warehouse}"))),
    }
}

pub(crate) fn ensure_product<C: Catalog>(
    catalog: &C,
    company: CompanyId,
    product: ProductId,
) -> StockResult<()> {
    match catalog.product_company(product) {
        Some(owner) if owner == company => Ok(()),
        _ => Err(StockError::not_found(format!("product {product}"))),
    }
}

pub(crate) fn ensure_location<C: Catalog>(
    catalog: &C,
    warehouse: WarehouseId,
    location: LocationId,
) -> StockResult<()> {
    match catalog.location_warehouse(location) {
        Some(owner) if owner == warehouse => Ok(()),
        _ => Err(StockError::not_found(format!(
            "location {location} in warehouse {warehouse}"
        ))),
    }
}

#[derive(Debug, Clone, Copy)]
struct WarehouseRecord {
    company: CompanyId,
    allow_negative_stock: bool,
    uses_bins: bool,
}

#[derive(Debug, Default)]
pub struct StaticCatalog {
    warehouses: RwLock<HashMap<WarehouseId, WarehouseRecord>>,
    products: RwLock<HashMap<ProductId, CompanyId>>,
    locations: RwLock<HashMap<LocationId, WarehouseId>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_warehouse(
        &self,
        company: CompanyId,
        allow_negative_stock: bool,
        uses_bins: bool,
    ) -> WarehouseId {
        let id = WarehouseId::new();
        if let Ok(mut warehouses) = self.warehouses.write() {
            warehouses.insert(
                id,
                WarehouseRecord {
                    company,
                    allow_negative_stock,
                    uses_bins,
                },
            );
        }
        id
    }

    pub fn register_product(&self, company: CompanyId) -> ProductId {
        let id = ProductId::new();
        if let Ok(mut products) = self.products.write() {
            products.insert(id, company);
        }
        id
    }

    pub fn register_location(&self, warehouse: WarehouseId) -> LocationId {
        let id = LocationId::new();
        if let Ok(mut locations) = self.locations.write() {
            locations.insert(id, warehouse);
        }
        id
    }
}

impl Catalog for StaticCatalog {
    fn warehouse_company(&self, warehouse: WarehouseId) -> Option<CompanyId> {
        self.warehouses
            .read()
            .ok()
            .and_then(|w| w.get(&warehouse).map(|r| r.company))
    }

    fn product_company(&self, product: ProductId) -> Option<CompanyId> {
        self.products.read().ok().and_then(|p| p.get(&product).copied())
    }

    fn location_warehouse(&self, location: LocationId) -> Option<WarehouseId> {
        self.locations
            .read()
            .ok()
            .and_then(|l| l.get(&location).copied())
    }
}

impl WarehouseDirectory for StaticCatalog {
    fn allow_negative_stock(&self, warehouse: WarehouseId) -> bool {
        self.warehouses
            .read()
            .ok()
            .and_then(|w| w.get(&warehouse).map(|r| r.allow_negative_stock))
            .unwrap_or(false)
    }

    fn uses_bins(&self, warehouse: WarehouseId) -> bool {
        self.warehouses
            .read()
            .ok()
            .and_then(|w| w.get(&warehouse).map(|r| r.uses_bins))
            .unwrap_or(false)
    }
}
