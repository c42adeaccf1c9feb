//! Manual stock adjustments.
//!
//! An adjustment is a signed correction to one stock row, recorded in the
//! ledger with the side convention: a negative difference sets the source
//! location on its movement, a positive one the destination.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmith_core::{LocationId, ProductId, StockError, StockResult, WarehouseId};

/// Why stock was adjusted outside normal operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Damage,
    Loss,
    Count,
    Other,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Damage => "damage",
            AdjustmentReason::Loss => "loss",
            AdjustmentReason::Count => "count",
            AdjustmentReason::Other => "other",
        }
    }
}

/// A manual correction to one stock row.
///
/// `quantity_difference` is signed: positive adds stock, negative removes
/// it. A zero difference is rejected; there is nothing to record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub warehouse: WarehouseId,
    pub product: ProductId,
    pub location: Option<LocationId>,
    pub batch: Option<String>,
    pub reason: AdjustmentReason,
    pub description: String,
    pub quantity_difference: Decimal,
    pub reference: String,
}

impl StockAdjustment {
    pub fn validate(&self) -> StockResult<()> {
        if self.quantity_difference.is_zero() {
            return Err(StockError::invalid(
                "adjustment quantity difference cannot be zero",
            ));
        }
        Ok(())
    }

    /// The adjustment that undoes this one (used when an adjustment is
    /// canceled: the original stays in the ledger, the inverse is appended).
    pub fn inverse(&self, reference: impl Into<String>) -> Self {
        Self {
            warehouse: self.warehouse,
            product: self.product,
            location: self.location,
            batch: self.batch.clone(),
            reason: self.reason,
            description: format!("Reversal: {}", self.description),
            quantity_difference: -self.quantity_difference,
            reference: reference.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn adjustment(difference: Decimal) -> StockAdjustment {
        StockAdjustment {
            warehouse: WarehouseId::new(),
            product: ProductId::new(),
            location: Some(LocationId::new()),
            batch: None,
            reason: AdjustmentReason::Damage,
            description: "Dropped pallet".to_string(),
            quantity_difference: difference,
            reference: "ADJ-1".to_string(),
        }
    }

    #[test]
    fn zero_difference_is_invalid() {
        assert!(adjustment(Decimal::ZERO).validate().is_err());
        assert!(adjustment(dec!(-2.000)).validate().is_ok());
    }

    #[test]
    fn inverse_flips_the_sign() {
        let original = adjustment(dec!(-4.500));
        let inverse = original.inverse("ADJ-1-REV");
        assert_eq!(inverse.quantity_difference, dec!(4.500));
        assert_eq!(inverse.reference, "ADJ-1-REV");
        assert!(inverse.validate().is_ok());
    }
}
