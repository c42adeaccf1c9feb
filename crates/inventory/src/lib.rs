//! `stocksmith-inventory`: inventory domain module.
//!
//! This crate contains the business rules for on-hand stock, implemented
//! purely as deterministic domain logic (no IO, no locking, no storage).
//! The per-row invariants live on `InventoryItem::apply_change`, the single
//! mutation primitive everything else funnels through.

pub mod adjustment;
pub mod item;

pub use adjustment::{AdjustmentReason, StockAdjustment};
pub use item::{AppliedDelta, InventoryItem, ItemKey, StockChange, StockPolicy};
