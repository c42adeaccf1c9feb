//! The movement record: one immutable fact per stock mutation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmith_core::{CompanyId, LocationId, MovementId, ProductId, UserId, WarehouseId};

/// Kind of stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Goods entering the warehouse from outside (receipt).
    Inbound,
    /// Goods leaving the warehouse (pick for an outbound order).
    Outbound,
    /// Relocation between two locations (putaway, internal move).
    Move,
    /// Manual or count-variance correction.
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Inbound => "inbound",
            MovementType::Outbound => "outbound",
            MovementType::Move => "move",
            MovementType::Adjustment => "adjustment",
        }
    }
}

/// A movement ready to be appended (not yet assigned an id or timestamp).
///
/// `quantity` is always the magnitude actually applied; the sign is implied
/// by the movement type and the from/to locations. For adjustments the
/// convention follows the source system: `location_from` is set when stock
/// decreased, `location_to` when it increased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub company: CompanyId,
    pub warehouse: WarehouseId,
    pub product: Option<ProductId>,
    pub location_from: Option<LocationId>,
    pub location_to: Option<LocationId>,
    pub batch: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    /// External reference (order, task, adjustment, session id).
    pub reference: String,
    pub reason: String,
    pub created_by: Option<UserId>,
}

/// An appended, immutable movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub company: CompanyId,
    pub warehouse: WarehouseId,
    pub product: Option<ProductId>,
    pub location_from: Option<LocationId>,
    pub location_to: Option<LocationId>,
    pub batch: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub reference: String,
    pub reason: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Signed effect of this movement on the row at `location`.
    ///
    /// Zero when the movement does not touch that location. A `move` into and
    /// out of the same location (degenerate but legal) nets to zero, matching
    /// its effect on the row. Rows without a location cannot be attributed
    /// this way; movements for them carry their sign in type + reason only.
    pub fn signed_quantity_at(&self, location: LocationId) -> Decimal {
        let mut signed = Decimal::ZERO;
        if self.location_to == Some(location) {
            signed += self.quantity;
        }
        if self.location_from == Some(location) {
            signed -= self.quantity;
        }
        signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn movement(
        from: Option<LocationId>,
        to: Option<LocationId>,
        movement_type: MovementType,
    ) -> Movement {
        Movement {
            id: MovementId::new(),
            company: CompanyId::new(),
            warehouse: WarehouseId::new(),
            product: Some(ProductId::new()),
            location_from: from,
            location_to: to,
            batch: None,
            expiry_date: None,
            movement_type,
            quantity: dec!(4.000),
            reference: "test".to_string(),
            reason: String::new(),
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn move_is_negative_at_source_positive_at_target() {
        let src = LocationId::new();
        let dst = LocationId::new();
        let m = movement(Some(src), Some(dst), MovementType::Move);

        assert_eq!(m.signed_quantity_at(src), dec!(-4.000));
        assert_eq!(m.signed_quantity_at(dst), dec!(4.000));
        assert_eq!(m.signed_quantity_at(LocationId::new()), Decimal::ZERO);
    }

    #[test]
    fn inbound_is_positive_at_target_only() {
        let dst = LocationId::new();
        let m = movement(None, Some(dst), MovementType::Inbound);

        assert_eq!(m.signed_quantity_at(dst), dec!(4.000));
        assert_eq!(m.signed_quantity_at(LocationId::new()), Decimal::ZERO);
    }

    #[test]
    fn negative_adjustment_uses_from_convention() {
        let loc = LocationId::new();
        let m = movement(Some(loc), None, MovementType::Adjustment);

        assert_eq!(m.signed_quantity_at(loc), dec!(-4.000));
    }

    #[test]
    fn movement_type_serializes_lowercase() {
        let m = movement(None, Some(LocationId::new()), MovementType::Inbound);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["movement_type"], "inbound");
        assert_eq!(json["quantity"], "4.000");

        let back: Movement = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }
}
