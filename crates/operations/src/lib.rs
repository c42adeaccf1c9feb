//! `stocksmith-operations`: warehouse task and order documents.
//!
//! Tasks (putaway, picking, internal move, goods receipt) describe work on
//! the floor; orders carry the expected/received and ordered/shipped
//! quantities that the status projector derives order status from. None of
//! this crate touches stock; the engine's coordinator does that, using
//! these documents as input.

pub mod order;
pub mod status;
pub mod task;

pub use order::{
    InboundLine, InboundOrder, InboundOrderStatus, InboundOrderType, OrderLineRef, OutboundLine,
    OutboundOrder, OutboundOrderStatus, OutboundOrderType,
};
pub use status::OrderStatusProjector;
pub use task::{GoodsReceipt, TaskDetail, TaskStatus, WarehouseTask};
