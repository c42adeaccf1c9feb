//! `stocksmith-ledger`: append-only movement history.
//!
//! Every change to on-hand or reserved stock is paired with exactly one
//! movement. Movements are facts: once appended they are never edited or
//! deleted, and corrections happen as new, compensating movements.

pub mod movement;
pub mod query;
pub mod store;

pub use movement::{Movement, MovementType, NewMovement};
pub use query::MovementFilter;
pub use store::{InMemoryMovementLedger, LedgerError, MovementLedger};
