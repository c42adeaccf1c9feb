//! Inbound and outbound order documents.
//!
//! Orders carry cumulative quantities only: expected vs. received on the
//! inbound side, ordered vs. allocated vs. shipped on the outbound side.
//! The recording methods guard terminal states and are invoked by the
//! engine's order book inside the same unit as the stock mutation, so
//! order quantities never drift from stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmith_core::{CompanyId, OrderId, ProductId, StockError, StockResult, WarehouseId};

pub use crate::task::OrderLineRef;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundOrderType {
    Purchase,
    Return,
    Transfer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundOrderStatus {
    Draft,
    Planned,
    Receiving,
    Completed,
    Canceled,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundOrderType {
    Sales,
    Transfer,
    Return,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundOrderStatus {
    Draft,
    Planned,
    Picking,
    Shipped,
    Canceled,
}

/// One expected product on an inbound order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundLine {
    pub line_no: u32,
    pub product: ProductId,
    pub expected_quantity: Decimal,
    pub received_quantity: Decimal,
}

impl InboundLine {
    pub fn is_fulfilled(&self) -> bool {
        self.received_quantity >= self.expected_quantity
    }
}

/// One ordered product on an outbound order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundLine {
    pub line_no: u32,
    pub product: ProductId,
    pub ordered_quantity: Decimal,
    pub allocated_quantity: Decimal,
    pub shipped_quantity: Decimal,
}

impl OutboundLine {
    pub fn is_fulfilled(&self) -> bool {
        self.shipped_quantity >= self.ordered_quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundOrder {
    id: OrderId,
    company: CompanyId,
    warehouse: WarehouseId,
    order_number: String,
    external_reference: Option<String>,
    order_type: InboundOrderType,
    status: InboundOrderStatus,
    expected_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    lines: Vec<InboundLine>,
}

impl InboundOrder {
    pub fn new(
        company: CompanyId,
        warehouse: WarehouseId,
        order_number: impl Into<String>,
        order_type: InboundOrderType,
    ) -> Self {
        Self {
            id: OrderId::new(),
            company,
            warehouse,
            order_number: order_number.into(),
            external_reference: None,
            order_type,
            status: InboundOrderStatus::Draft,
            expected_at: None,
            completed_at: None,
            lines: Vec::new(),
        }
    }

    pub fn with_external_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }

    pub fn with_expected_at(mut self, expected_at: DateTime<Utc>) -> Self {
        self.expected_at = Some(expected_at);
        self
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn warehouse(&self) -> WarehouseId {
        self.warehouse
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn order_type(&self) -> InboundOrderType {
        self.order_type
    }

    pub fn status(&self) -> InboundOrderStatus {
        self.status
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn lines(&self) -> &[InboundLine] {
        &self.lines
    }

    /// Lines may only be added before receiving starts.
    pub fn add_line(&mut self, product: ProductId, expected: Decimal) -> StockResult<u32> {
        if !matches!(
            self.status,
            InboundOrderStatus::Draft | InboundOrderStatus::Planned
        ) {
            return Err(StockError::order_state(format!(
                "cannot add lines to a {:?} inbound order",
                self.status
            )));
        }
        if expected <= Decimal::ZERO {
            return Err(StockError::invalid("expected quantity must be positive"));
        }
        let line_no = (self.lines.len() as u32) + 1;
        self.lines.push(InboundLine {
            line_no,
            product,
            expected_quantity: expected,
            received_quantity: Decimal::ZERO,
        });
        Ok(line_no)
    }

    pub fn plan(&mut self) -> StockResult<()> {
        if self.status != InboundOrderStatus::Draft {
            return Err(StockError::order_state(
                "only draft inbound orders can be planned",
            ));
        }
        if self.lines.is_empty() {
            return Err(StockError::invalid("cannot plan an order without lines"));
        }
        self.status = InboundOrderStatus::Planned;
        Ok(())
    }

    pub fn cancel(&mut self) -> StockResult<()> {
        match self.status {
            InboundOrderStatus::Completed | InboundOrderStatus::Canceled => {
                Err(StockError::order_state(format!(
                    "cannot cancel a {:?} inbound order",
                    self.status
                )))
            }
            _ => {
                self.status = InboundOrderStatus::Canceled;
                Ok(())
            }
        }
    }

    /// Record goods received against one line. Moves the order into
    /// `Receiving` on the first receipt. Over-receipt is allowed; the
    /// projector treats received ≥ expected as fulfilled.
    pub fn record_received(&mut self, line_no: u32, quantity: Decimal) -> StockResult<()> {
        match self.status {
            InboundOrderStatus::Completed | InboundOrderStatus::Canceled => {
                return Err(StockError::order_state(format!(
                    "cannot receive against a {:?} inbound order",
                    self.status
                )));
            }
            _ => {}
        }
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("received quantity must be positive"));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == line_no)
            .ok_or_else(|| {
                StockError::not_found(format!("inbound order line {line_no} not found"))
            })?;
        line.received_quantity += quantity;
        self.status = InboundOrderStatus::Receiving;
        Ok(())
    }

    /// Back out a receipt recording whose enclosing unit failed to commit.
    /// Clamped at zero; reopens a `Completed` order into `Receiving`.
    pub fn unrecord_received(&mut self, line_no: u32, quantity: Decimal) -> StockResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("reverted quantity must be positive"));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == line_no)
            .ok_or_else(|| {
                StockError::not_found(format!("inbound order line {line_no} not found"))
            })?;
        line.received_quantity = (line.received_quantity - quantity).max(Decimal::ZERO);
        if self.status == InboundOrderStatus::Completed {
            self.status = InboundOrderStatus::Receiving;
            self.completed_at = None;
        }
        Ok(())
    }

    pub(crate) fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = InboundOrderStatus::Completed;
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundOrder {
    id: OrderId,
    company: CompanyId,
    warehouse: WarehouseId,
    order_number: String,
    external_reference: Option<String>,
    order_type: OutboundOrderType,
    status: OutboundOrderStatus,
    shipped_at: Option<DateTime<Utc>>,
    lines: Vec<OutboundLine>,
}

impl OutboundOrder {
    pub fn new(
        company: CompanyId,
        warehouse: WarehouseId,
        order_number: impl Into<String>,
        order_type: OutboundOrderType,
    ) -> Self {
        Self {
            id: OrderId::new(),
            company,
            warehouse,
            order_number: order_number.into(),
            external_reference: None,
            order_type,
            status: OutboundOrderStatus::Draft,
            shipped_at: None,
            lines: Vec::new(),
        }
    }

    pub fn with_external_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn warehouse(&self) -> WarehouseId {
        self.warehouse
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn order_type(&self) -> OutboundOrderType {
        self.order_type
    }

    pub fn status(&self) -> OutboundOrderStatus {
        self.status
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn lines(&self) -> &[OutboundLine] {
        &self.lines
    }

    /// Sum of allocations across open lines; must reconcile with the
    /// reserved quantities held in the inventory store.
    pub fn total_allocated(&self) -> Decimal {
        self.lines.iter().map(|l| l.allocated_quantity).sum()
    }

    pub fn add_line(&mut self, product: ProductId, ordered: Decimal) -> StockResult<u32> {
        if !matches!(
            self.status,
            OutboundOrderStatus::Draft | OutboundOrderStatus::Planned
        ) {
            return Err(StockError::order_state(format!(
                "cannot add lines to a {:?} outbound order",
                self.status
            )));
        }
        if ordered <= Decimal::ZERO {
            return Err(StockError::invalid("ordered quantity must be positive"));
        }
        let line_no = (self.lines.len() as u32) + 1;
        self.lines.push(OutboundLine {
            line_no,
            product,
            ordered_quantity: ordered,
            allocated_quantity: Decimal::ZERO,
            shipped_quantity: Decimal::ZERO,
        });
        Ok(line_no)
    }

    pub fn plan(&mut self) -> StockResult<()> {
        if self.status != OutboundOrderStatus::Draft {
            return Err(StockError::order_state(
                "only draft outbound orders can be planned",
            ));
        }
        if self.lines.is_empty() {
            return Err(StockError::invalid("cannot plan an order without lines"));
        }
        self.status = OutboundOrderStatus::Planned;
        Ok(())
    }

    pub fn cancel(&mut self) -> StockResult<()> {
        match self.status {
            OutboundOrderStatus::Shipped | OutboundOrderStatus::Canceled => {
                Err(StockError::order_state(format!(
                    "cannot cancel a {:?} outbound order",
                    self.status
                )))
            }
            _ => {
                self.status = OutboundOrderStatus::Canceled;
                Ok(())
            }
        }
    }

    fn ensure_open(&self, action: &str) -> StockResult<()> {
        match self.status {
            OutboundOrderStatus::Shipped | OutboundOrderStatus::Canceled => {
                Err(StockError::order_state(format!(
                    "cannot {action} on a {:?} outbound order",
                    self.status
                )))
            }
            _ => Ok(()),
        }
    }

    fn line_mut(&mut self, line_no: u32) -> StockResult<&mut OutboundLine> {
        self.lines
            .iter_mut()
            .find(|l| l.line_no == line_no)
            .ok_or_else(|| StockError::not_found(format!("outbound order line {line_no} not found")))
    }

    pub fn record_allocated(&mut self, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.ensure_open("allocate")?;
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("allocated quantity must be positive"));
        }
        let line = self.line_mut(line_no)?;
        line.allocated_quantity += quantity;
        Ok(())
    }

    /// Release an allocation, clamped at zero so releasing more than was
    /// allocated never drives the line negative.
    pub fn record_released(&mut self, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.ensure_open("release")?;
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("released quantity must be positive"));
        }
        let line = self.line_mut(line_no)?;
        line.allocated_quantity = (line.allocated_quantity - quantity).max(Decimal::ZERO);
        Ok(())
    }

    /// Record a shipment against one line; moves the order into `Picking`
    /// until the projector flips it to `Shipped`. Shipping consumes the
    /// line's allocation, keeping `total_allocated` in step with the
    /// reservations still held in the store.
    pub fn record_shipped(&mut self, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.ensure_open("ship")?;
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("shipped quantity must be positive"));
        }
        let line = self.line_mut(line_no)?;
        line.shipped_quantity += quantity;
        line.allocated_quantity = (line.allocated_quantity - quantity).max(Decimal::ZERO);
        self.status = OutboundOrderStatus::Picking;
        Ok(())
    }

    /// Back out a shipment recording whose enclosing unit failed to commit.
    /// Restores the consumed allocation and un-flips a `Shipped` status.
    pub fn unrecord_shipped(&mut self, line_no: u32, quantity: Decimal) -> StockResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::invalid("reverted quantity must be positive"));
        }
        let line = self.line_mut(line_no)?;
        line.shipped_quantity = (line.shipped_quantity - quantity).max(Decimal::ZERO);
        line.allocated_quantity += quantity;
        if self.status == OutboundOrderStatus::Shipped {
            self.status = OutboundOrderStatus::Picking;
            self.shipped_at = None;
        }
        Ok(())
    }

    pub(crate) fn mark_shipped(&mut self, now: DateTime<Utc>) {
        self.status = OutboundOrderStatus::Shipped;
        if self.shipped_at.is_none() {
            self.shipped_at = Some(now);
        }
    }
}
