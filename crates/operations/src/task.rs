//! Warehouse floor tasks.
//!
//! A task describes one unit of physical work: put received goods away,
//! pick for an outbound order, or relocate stock internally. The task
//! lifecycle is tracked here; the stock effects of a completed task are
//! applied by the engine's coordinator.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmith_core::{
    LocationId, OrderId, ProductId, StockError, StockResult, TaskId, WarehouseId,
};

/// Task lifecycle status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Canceled => "canceled",
        }
    }
}

/// Pointer to the order line a task fulfils.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRef {
    pub order: OrderId,
    pub line_no: u32,
}

/// What kind of work the task is, with its stock coordinates.
///
/// Quantities are magnitudes; direction is implied by the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskDetail {
    /// Staging → storage location after receipt.
    Putaway {
        product: ProductId,
        batch: Option<String>,
        from_location: LocationId,
        to_location: LocationId,
        quantity: Decimal,
    },
    /// Storage → packing area for an outbound order line.
    Picking {
        product: ProductId,
        batch: Option<String>,
        from_location: LocationId,
        to_location: LocationId,
        quantity: Decimal,
        order_line: Option<OrderLineRef>,
    },
    /// Relocation between two storage locations.
    InternalMove {
        product: ProductId,
        batch: Option<String>,
        from_location: LocationId,
        to_location: LocationId,
        quantity: Decimal,
    },
}

impl TaskDetail {
    pub fn quantity(&self) -> Decimal {
        match self {
            TaskDetail::Putaway { quantity, .. }
            | TaskDetail::Picking { quantity, .. }
            | TaskDetail::InternalMove { quantity, .. } => *quantity,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TaskDetail::Putaway { .. } => "putaway",
            TaskDetail::Picking { .. } => "picking",
            TaskDetail::InternalMove { .. } => "internal_move",
        }
    }

    fn validate(&self) -> StockResult<()> {
        if self.quantity() <= Decimal::ZERO {
            return Err(StockError::invalid("task quantity must be positive"));
        }
        let (from, to) = match self {
            TaskDetail::Putaway {
                from_location,
                to_location,
                ..
            }
            | TaskDetail::Picking {
                from_location,
                to_location,
                ..
            }
            | TaskDetail::InternalMove {
                from_location,
                to_location,
                ..
            } => (from_location, to_location),
        };
        if from == to {
            return Err(StockError::invalid(
                "task source and destination locations must differ",
            ));
        }
        Ok(())
    }
}

/// One unit of warehouse work with its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseTask {
    id: TaskId,
    warehouse: WarehouseId,
    detail: TaskDetail,
    status: TaskStatus,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl WarehouseTask {
    pub fn new(warehouse: WarehouseId, detail: TaskDetail, now: DateTime<Utc>) -> StockResult<Self> {
        detail.validate()?;
        Ok(Self {
            id: TaskId::new(),
            warehouse,
            detail,
            status: TaskStatus::Pending,
            expiry_date: None,
            created_at: now,
            completed_at: None,
        })
    }

    pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry_date = Some(expiry);
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn warehouse(&self) -> WarehouseId {
        self.warehouse
    }

    pub fn detail(&self) -> &TaskDetail {
        &self.detail
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn start(&mut self) -> StockResult<()> {
        if self.status != TaskStatus::Pending {
            return Err(StockError::task_state(format!(
                "cannot start a {} task",
                self.status.as_str()
            )));
        }
        self.status = TaskStatus::InProgress;
        Ok(())
    }

    /// Mark the work done on the floor. The stock effect is applied by the
    /// coordinator, which requires this status.
    pub fn complete(&mut self, now: DateTime<Utc>) -> StockResult<()> {
        match self.status {
            TaskStatus::Pending | TaskStatus::InProgress => {
                self.status = TaskStatus::Completed;
                self.completed_at = Some(now);
                Ok(())
            }
            _ => Err(StockError::task_state(format!(
                "cannot complete a {} task",
                self.status.as_str()
            ))),
        }
    }

    pub fn cancel(&mut self) -> StockResult<()> {
        match self.status {
            TaskStatus::Pending | TaskStatus::InProgress => {
                self.status = TaskStatus::Canceled;
                Ok(())
            }
            _ => Err(StockError::task_state(format!(
                "cannot cancel a {} task",
                self.status.as_str()
            ))),
        }
    }
}

/// Goods received against an inbound order, landing in staging.
///
/// Not a task: receipt has no pending/in-progress phase; it is recorded
/// as a fact and deduplicated by its id like a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceipt {
    pub id: TaskId,
    pub warehouse: WarehouseId,
    pub product: ProductId,
    pub batch: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub staging_location: Option<LocationId>,
    pub quantity: Decimal,
    pub order_line: Option<OrderLineRef>,
    pub reference: String,
}

impl GoodsReceipt {
    pub fn validate(&self) -> StockResult<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(StockError::invalid("received quantity must be positive"));
        }
        Ok(())
    }
}
