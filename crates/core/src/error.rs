//! Error taxonomy shared by every stock operation.
//!
//! The split mirrors how callers react:
//! - `Validation` - the request itself is wrong; nothing was mutated.
//! - `NotFound` - a reference is absent or belongs to another company;
//!   rejected before any lock is taken.
//! - `State` - an entity is in a state that forbids the operation.
//! - `Conflict` - lock contention or a batch that could not commit
//!   atomically; the caller may retry the whole operation.
//! - `Infrastructure` - storage-layer failure, fatal to the operation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the stock domain.
pub type StockResult<T> = Result<T, StockError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A request failed validation; no mutation was performed.
    #[error("validation failed: {0}")]
    Validation(ValidationKind),

    /// A referenced entity is absent or owned by a different company.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target entity is in a state that forbids this operation.
    #[error("invalid state: {0}")]
    State(StateKind),

    /// Contention or an atomic unit that could not commit; safe to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying storage failure; never silently swallowed.
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

/// Why a request failed validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    #[error("quantity would go negative and the warehouse forbids negative stock")]
    NegativeStock,

    #[error("reserved quantity would exceed on-hand quantity")]
    OverReserved,

    #[error("picked quantity {picked} exceeds reserved quantity {reserved}")]
    InsufficientReservation { picked: Decimal, reserved: Decimal },

    #[error("insufficient available stock: requested {requested}, available {available}")]
    InsufficientAvailable {
        requested: Decimal,
        available: Decimal,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Which state rule was violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateKind {
    #[error("inventory item is locked")]
    Locked,

    #[error("invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("invalid task state: {0}")]
    InvalidTaskState(String),

    #[error("invalid order state: {0}")]
    InvalidOrderState(String),
}

impl StockError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Validation(ValidationKind::Invalid(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn infrastructure(msg: impl Into<String>) -> Self {
        Self::Infrastructure(msg.into())
    }

    pub fn session_state(msg: impl Into<String>) -> Self {
        Self::State(StateKind::InvalidSessionState(msg.into()))
    }

    pub fn task_state(msg: impl Into<String>) -> Self {
        Self::State(StateKind::InvalidTaskState(msg.into()))
    }

    pub fn order_state(msg: impl Into<String>) -> Self {
        Self::State(StateKind::InvalidOrderState(msg.into()))
    }
}

impl From<ValidationKind> for StockError {
    fn from(kind: ValidationKind) -> Self {
        Self::Validation(kind)
    }
}

impl From<StateKind> for StockError {
    fn from(kind: StateKind) -> Self {
        Self::State(kind)
    }
}
