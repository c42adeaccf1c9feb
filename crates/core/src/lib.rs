//! `stocksmith-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the error taxonomy shared by every stock
//! operation, the actor context stamped onto movements, and the narrow traits
//! through which external collaborators (catalog, warehouse configuration,
//! order lines) are consumed.

pub mod catalog;
pub mod context;
pub mod error;
pub mod id;

pub use catalog::{Catalog, OrderLineHooks, WarehouseDirectory};
pub use context::ActorContext;
pub use error::{StateKind, StockError, StockResult, ValidationKind};
pub use id::{
    CompanyId, LocationId, MovementId, OrderId, ProductId, SessionId, TaskId, UserId, WarehouseId,
};
