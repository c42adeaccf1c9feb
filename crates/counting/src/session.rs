//! Stock count session state machine.
//!
//! `draft → in_progress → {completed, canceled}`. Lines may only be
//! created or edited while the session is `in_progress`; completion is a
//! one-way transition driven by the engine, which applies the reconciling
//! adjustments first and flips the status only after they commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmith_core::{
    CompanyId, LocationId, ProductId, SessionId, StockError, StockResult, UserId, WarehouseId,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountType {
    Cycle,
    Full,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Draft,
    InProgress,
    Completed,
    Canceled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Draft => "draft",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Canceled => "canceled",
        }
    }
}

/// One counted position.
///
/// `system_quantity` is the quantity observed when the line was entered;
/// it is informational only. The difference applied at completion is
/// recomputed against the live quantity under the row lock, so stock that
/// moved during a long count is not double-corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCountLine {
    pub product: ProductId,
    pub location: Option<LocationId>,
    pub batch: Option<String>,
    pub system_quantity: Decimal,
    pub counted_quantity: Decimal,
}

impl StockCountLine {
    /// Counted minus system, as observed at entry time.
    pub fn difference(&self) -> Decimal {
        self.counted_quantity - self.system_quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCountSession {
    id: SessionId,
    company: CompanyId,
    warehouse: WarehouseId,
    name: String,
    count_type: CountType,
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_by: Option<UserId>,
    lines: Vec<StockCountLine>,
}

impl StockCountSession {
    pub fn new(
        company: CompanyId,
        warehouse: WarehouseId,
        name: impl Into<String>,
        count_type: CountType,
    ) -> Self {
        Self {
            id: SessionId::new(),
            company,
            warehouse,
            name: name.into(),
            count_type,
            status: SessionStatus::Draft,
            started_at: None,
            completed_at: None,
            created_by: None,
            lines: Vec::new(),
        }
    }

    pub fn with_created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn warehouse(&self) -> WarehouseId {
        self.warehouse
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count_type(&self) -> CountType {
        self.count_type
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    pub fn lines(&self) -> &[StockCountLine] {
        &self.lines
    }

    fn reject_state(&self, action: &str) -> StockError {
        StockError::session_state(format!(
            "cannot {action} while session is {}",
            self.status.as_str()
        ))
    }

    /// `draft → in_progress`; no quantity effects.
    pub fn start(&mut self, now: DateTime<Utc>) -> StockResult<()> {
        if self.status != SessionStatus::Draft {
            return Err(self.reject_state("start counting"));
        }
        self.status = SessionStatus::InProgress;
        self.started_at = Some(now);
        Ok(())
    }

    /// Terminal, no quantity effects. Allowed from draft or in_progress.
    pub fn cancel(&mut self) -> StockResult<()> {
        match self.status {
            SessionStatus::Draft | SessionStatus::InProgress => {
                self.status = SessionStatus::Canceled;
                Ok(())
            }
            _ => Err(self.reject_state("cancel")),
        }
    }

    /// Record one counted position. Only while `in_progress`.
    pub fn add_line(&mut self, line: StockCountLine) -> StockResult<()> {
        if self.status != SessionStatus::InProgress {
            return Err(self.reject_state("add count lines"));
        }
        if line.counted_quantity < Decimal::ZERO {
            return Err(StockError::invalid("counted quantity cannot be negative"));
        }
        self.lines.push(line);
        Ok(())
    }

    /// Correct a previously entered count. Only while `in_progress`.
    pub fn update_line(&mut self, index: usize, counted: Decimal) -> StockResult<()> {
        if self.status != SessionStatus::InProgress {
            return Err(self.reject_state("edit count lines"));
        }
        if counted < Decimal::ZERO {
            return Err(StockError::invalid("counted quantity cannot be negative"));
        }
        let line = self
            .lines
            .get_mut(index)
            .ok_or_else(|| StockError::not_found(format!("count line {index} not found")))?;
        line.counted_quantity = counted;
        Ok(())
    }

    /// Completion precondition check used before any lock is taken.
    pub fn ensure_completable(&self) -> StockResult<()> {
        if self.status != SessionStatus::InProgress {
            return Err(self.reject_state("complete"));
        }
        Ok(())
    }

    /// One-way flip to `completed`, called only after all reconciling
    /// adjustments committed.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> StockResult<()> {
        self.ensure_completable()?;
        self.status = SessionStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }
}
