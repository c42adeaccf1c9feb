//! Order status projection.
//!
//! Derives inbound/outbound order status from the cumulative quantities on
//! the lines. Pure and idempotent: projecting an already-final order is a
//! no-op, and the completion timestamp is stamped exactly once.

use chrono::{DateTime, Utc};

use crate::order::{InboundOrder, InboundOrderStatus, OutboundOrder, OutboundOrderStatus};

#[derive(Debug, Default, Clone, Copy)]
pub struct OrderStatusProjector;

impl OrderStatusProjector {
    pub fn new() -> Self {
        Self
    }

    /// Flip an inbound order to `Completed` once every line's received
    /// quantity covers its expected quantity. Returns whether it flipped.
    pub fn project_inbound(&self, order: &mut InboundOrder, now: DateTime<Utc>) -> bool {
        if order.status() != InboundOrderStatus::Receiving {
            return false;
        }
        if order.lines().is_empty() || !order.lines().iter().all(|l| l.is_fulfilled()) {
            return false;
        }
        order.mark_completed(now);
        true
    }

    /// Flip an outbound order to `Shipped` once every line's shipped
    /// quantity covers its ordered quantity. Returns whether it flipped.
    pub fn project_outbound(&self, order: &mut OutboundOrder, now: DateTime<Utc>) -> bool {
        if order.status() != OutboundOrderStatus::Picking {
            return false;
        }
        if order.lines().is_empty() || !order.lines().iter().all(|l| l.is_fulfilled()) {
            return false;
        }
        order.mark_shipped(now);
        true
    }
}
