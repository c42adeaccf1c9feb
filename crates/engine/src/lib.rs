//! `stocksmith-engine`: the inventory coherence engine.
//!
//! Everything that mutates stock goes through here: the per-key-locked
//! inventory store, the adjustment processor, the reservation manager, the
//! task completion coordinator, and stock count completion. Each mutation
//! is paired with its ledger movement inside one atomic unit, so quantity
//! state and movement history can never drift apart.

pub mod adjustments;
pub mod catalog;
pub mod coordinator;
pub mod counting;
pub mod orders;
pub mod reservations;
pub mod store;
pub mod views;


pub use adjustments::AdjustmentProcessor;
pub use catalog::StaticCatalog;
pub use coordinator::{CompletionOutcome, TaskCoordinator};
pub use counting::CountProcessor;
pub use orders::InMemoryOrderBook;
pub use reservations::{ReservationManager, ReservationStrategy};
pub use store::{AppliedOutcome, InMemoryInventoryStore, InventoryStore, StockMutation};
pub use views::{
    LocationStock, ProductStock, ensure_product_deletable, low_stock, stock_by_location,
    stock_by_product,
};
