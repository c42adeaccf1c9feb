//! `stocksmith-counting`: physical stock count sessions.
//!
//! The session state machine lives here; the stock reconciliation that
//! happens on completion is driven by the engine crate.

pub mod session;

pub use session::{CountType, SessionStatus, StockCountLine, StockCountSession};
