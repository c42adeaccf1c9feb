//! Actor context supplied by the identity collaborator.

use serde::{Deserialize, Serialize};

use crate::id::{CompanyId, UserId};

/// Identity context supplied with every mutating call.
///
/// Stamped onto movements and adjustments; the company id is also the
/// isolation boundary every reference check validates against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub company: CompanyId,
    pub user: Option<UserId>,
}

impl ActorContext {
    pub fn new(company: CompanyId, user: UserId) -> Self {
        Self {
            company,
            user: Some(user),
        }
    }

    /// Context for automated mutations with no human actor (e.g. generated
    /// inverse adjustments).
    pub fn system(company: CompanyId) -> Self {
        Self {
            company,
            user: None,
        }
    }
}
