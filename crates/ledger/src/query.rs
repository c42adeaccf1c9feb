//! Read-only movement queries for inspection and reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocksmith_core::{ProductId, WarehouseId};

use crate::movement::MovementType;

/// Filter criteria for movement queries.
///
/// All fields are optional and combined with AND. Queries are always scoped
/// to one company by the ledger itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementFilter {
    /// Filter by warehouse (optional).
    pub warehouse: Option<WarehouseId>,
    /// Filter by product (optional).
    pub product: Option<ProductId>,
    /// Filter by movement type (optional).
    pub movement_type: Option<MovementType>,
    /// Only movements created at or after this time (optional).
    pub created_after: Option<DateTime<Utc>>,
    /// Only movements created before this time (optional).
    pub created_before: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn for_warehouse(warehouse: WarehouseId) -> Self {
        Self {
            warehouse: Some(warehouse),
            ..Default::default()
        }
    }

    pub fn with_product(mut self, product: ProductId) -> Self {
        self.product = Some(product);
        self
    }

    pub fn with_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }
}
