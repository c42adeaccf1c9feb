//! Append-only ledger storage.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use thiserror::Error;

use stocksmith_core::{CompanyId, MovementId, StockError};

use crate::movement::{Movement, NewMovement};
use crate::query::MovementFilter;

/// Ledger storage error.
///
/// Appends only fail on storage-layer problems; there is no business reason
/// for a movement to be rejected once its mutation validated.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger storage failure: {0}")]
    Storage(String),
}

impl From<LedgerError> for StockError {
    fn from(err: LedgerError) -> Self {
        StockError::infrastructure(err.to_string())
    }
}

/// Append-only, company-scoped movement ledger.
///
/// No update or delete operation exists; corrections are new movements.
/// Appends for different inventory rows may run fully in parallel; the
/// ledger promises only "once visible, never altered".
pub trait MovementLedger: Send + Sync {
    /// Append one movement, assigning its id and timestamp.
    fn append(&self, movement: NewMovement) -> Result<MovementId, LedgerError>;

    /// Read-only projection over the append log, newest first.
    fn query(&self, company: CompanyId, filter: &MovementFilter)
    -> Result<Vec<Movement>, LedgerError>;
}

impl<L> MovementLedger for Arc<L>
where
    L: MovementLedger + ?Sized,
{
    fn append(&self, movement: NewMovement) -> Result<MovementId, LedgerError> {
        (**self).append(movement)
    }

    fn query(
        &self,
        company: CompanyId,
        filter: &MovementFilter,
    ) -> Result<Vec<Movement>, LedgerError> {
        (**self).query(company, filter)
    }
}

/// In-memory append-only ledger.
///
/// Intended for tests/dev and embedded use. Not optimized for large logs.
#[derive(Debug, Default)]
pub struct InMemoryMovementLedger {
    log: RwLock<Vec<Movement>>,
}

impl InMemoryMovementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of movements appended so far (test helper).
    pub fn len(&self) -> usize {
        self.log.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MovementLedger for InMemoryMovementLedger {
    fn append(&self, movement: NewMovement) -> Result<MovementId, LedgerError> {
        let mut log = self
            .log
            .write()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;

        let id = MovementId::new();
        log.push(Movement {
            id,
            company: movement.company,
            warehouse: movement.warehouse,
            product: movement.product,
            location_from: movement.location_from,
            location_to: movement.location_to,
            batch: movement.batch,
            expiry_date: movement.expiry_date,
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            reference: movement.reference,
            reason: movement.reason,
            created_by: movement.created_by,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    fn query(
        &self,
        company: CompanyId,
        filter: &MovementFilter,
    ) -> Result<Vec<Movement>, LedgerError> {
        let log = self
            .log
            .read()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;

        let mut matches: Vec<Movement> = log
            .iter()
            .filter(|m| m.company == company)
            .filter(|m| filter.warehouse.is_none_or(|w| m.warehouse == w))
            .filter(|m| filter.product.is_none_or(|p| m.product == Some(p)))
            .filter(|m| filter.movement_type.is_none_or(|t| m.movement_type == t))
            .filter(|m| filter.created_after.is_none_or(|t| m.created_at >= t))
            .filter(|m| filter.created_before.is_none_or(|t| m.created_at < t))
            .cloned()
            .collect();

        matches.reverse();
        Ok(matches)
    }
}
