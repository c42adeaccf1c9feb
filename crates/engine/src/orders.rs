//! In-memory order book implementing the order-line hooks.
//!
//! Holds inbound/outbound orders, applies the quantity recordings the
//! coordinator and reservation manager report, and runs the status
//! projector after every update so order status is always current.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use stocksmith_core::{OrderId, OrderLineHooks, StockError, StockResult};
use stocksmith_operations::{InboundOrder, OrderStatusProjector, OutboundOrder};

#[derive(Debug, Default)]
pub struct InMemoryOrderBook {
    inbound: RwLock<HashMap<OrderId, InboundOrder>>,
    outbound: RwLock<HashMap<OrderId, OutboundOrder>>,
    projector: OrderStatusProjector,
}

impl InMemoryOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_inbound(&self, order: InboundOrder) -> StockResult<OrderId> {
        let id = order.id();
        self.inbound
            .write()
            .map_err(|_| StockError::infrastructure("order book lock poisoned"))?
            .insert(id, order);
        Ok(id)
    }

    pub fn insert_outbound(&self, order: OutboundOrder) -> StockResult<OrderId> {
        let id = order.id();
        self.outbound
            .write()
            .map_err(|_| StockError::infrastructure("order book lock poisoned"))?
            .insert(id, order);
        Ok(id)
    }

    pub fn inbound(&self, id: OrderId) -> StockResult<Option<InboundOrder>> {
        Ok(self
            .inbound
            .read()
            .map_err(|_| StockError::infrastructure("order book lock poisoned"))?
            .get(&id)
            .cloned())
    }

    pub fn outbound(&self, id: OrderId) -> StockResult<Option<OutboundOrder>> {
        Ok(self
            .outbound
            .read()
            .map_err(|_| StockError::infrastructure("order book lock poisoned"))?
            .get(&id)
            .cloned())
    }

    fn with_inbound<T>(
        &self,
        id: OrderId,
        f: impl FnOnce(&mut InboundOrder) -> StockResult<T>,
    ) -> StockResult<T> {
        let mut orders = self
            .inbound
            .write()
            .map_err(|_| StockError::infrastructure("order book lock poisoned"))?;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| StockError::not_found(format!("inbound order {id}")))?;
        f(order)
    }

    fn with_outbound<T>(
        &self,
        id: OrderId,
        f: impl FnOnce(&mut OutboundOrder) -> StockResult<T>,
    ) -> StockResult<T> {
        let mut orders = self
            .outbound
            .write()
            .map_err(|_| StockError::infrastructure("order book lock poisoned"))?;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| StockError::not_found(format!("outbound order {id}")))?;
        f(order)
    }
}

impl OrderLineHooks for InMemoryOrderBook {
    fn record_received(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.with_inbound(order, |o| {
            o.record_received(line_no, quantity)?;
            if self.projector.project_inbound(o, Utc::now()) {
                info!(order = %o.id(), number = o.order_number(), "inbound order completed");
            }
            Ok(())
        })
    }

    fn record_shipped(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.with_outbound(order, |o| {
            o.record_shipped(line_no, quantity)?;
            if self.projector.project_outbound(o, Utc::now()) {
                info!(order = %o.id(), number = o.order_number(), "outbound order shipped");
            }
            Ok(())
        })
    }

    fn record_allocated(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.with_outbound(order, |o| o.record_allocated(line_no, quantity))
    }

    fn record_released(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.with_outbound(order, |o| o.record_released(line_no, quantity))
    }

    fn revert_received(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.with_inbound(order, |o| o.unrecord_received(line_no, quantity))
    }

    fn revert_shipped(&self, order: OrderId, line_no: u32, quantity: Decimal) -> StockResult<()> {
        self.with_outbound(order, |o| o.unrecord_shipped(line_no, quantity))
    }
}
