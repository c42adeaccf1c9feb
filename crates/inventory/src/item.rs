use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmith_core::{
    CompanyId, LocationId, ProductId, StateKind, StockError, StockResult, ValidationKind,
    WarehouseId,
};

/// Identity of one stock row.
///
/// Rows are created lazily on first movement into a key and never deleted;
/// a zero-quantity row persists for history and lookup. `expiry_date` is an
/// attribute of the row, not part of its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub company: CompanyId,
    pub warehouse: WarehouseId,
    pub product: ProductId,
    pub location: Option<LocationId>,
    pub batch: Option<String>,
}

impl ItemKey {
    pub fn new(company: CompanyId, warehouse: WarehouseId, product: ProductId) -> Self {
        Self {
            company,
            warehouse,
            product,
            location: None,
            batch: None,
        }
    }

    pub fn at(mut self, location: LocationId) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }

    /// Total order used to sort keys before taking multiple row locks.
    /// Injective over distinct keys, so every batch locks in one global
    /// order.
    pub fn lock_order(&self) -> ([u8; 16], [u8; 16], [u8; 16], Option<[u8; 16]>, Option<String>) {
        (
            *self.company.as_uuid().as_bytes(),
            *self.warehouse.as_uuid().as_bytes(),
            *self.product.as_uuid().as_bytes(),
            self.location.map(|l| *l.as_uuid().as_bytes()),
            self.batch.clone(),
        )
    }
}

/// Warehouse stock policy applied to a mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockPolicy {
    pub allow_negative_stock: bool,
}

impl StockPolicy {
    pub fn allow_negative() -> Self {
        Self {
            allow_negative_stock: true,
        }
    }

    pub fn strict() -> Self {
        Self {
            allow_negative_stock: false,
        }
    }
}

/// One requested mutation of a stock row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockChange {
    /// Signed deltas to quantity and reserved quantity.
    Delta { quantity: Decimal, reserved: Decimal },
    /// Remove picked stock and release its reservation in one step.
    /// Fails if the reservation does not cover the picked quantity.
    PickOut { quantity: Decimal },
    /// Set quantity to a counted value; the delta is computed against the
    /// row's current quantity at apply time.
    SetQuantity { counted: Decimal },
}

/// Signed deltas actually applied by a change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDelta {
    pub quantity: Decimal,
    pub reserved: Decimal,
}

impl AppliedDelta {
    pub fn is_noop(&self) -> bool {
        self.quantity.is_zero() && self.reserved.is_zero()
    }
}

/// Current on-hand stock for one key.
///
/// Mutated exclusively through `apply_change`; fields stay private so no
/// caller can bypass the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    key: ItemKey,
    quantity: Decimal,
    reserved_quantity: Decimal,
    is_locked: bool,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Create an empty row for a key (lazy creation on first movement).
    pub fn new(key: ItemKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            quantity: Decimal::ZERO,
            reserved_quantity: Decimal::ZERO,
            is_locked: false,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn reserved_quantity(&self) -> Decimal {
        self.reserved_quantity
    }

    /// On-hand minus reserved, floored at zero.
    pub fn available(&self) -> Decimal {
        (self.quantity - self.reserved_quantity).max(Decimal::ZERO)
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Block all mutations on this row (e.g. stock under investigation).
    pub fn lock(&mut self, now: DateTime<Utc>) {
        self.is_locked = true;
        self.updated_at = now;
    }

    pub fn unlock(&mut self, now: DateTime<Utc>) {
        self.is_locked = false;
        self.updated_at = now;
    }

    pub fn set_expiry_date(&mut self, expiry: Option<NaiveDate>, now: DateTime<Utc>) {
        self.expiry_date = expiry;
        self.updated_at = now;
    }

    /// Validate whether `change` could apply, without mutating.
    pub fn check_change(&self, change: &StockChange, policy: StockPolicy) -> StockResult<()> {
        self.delta_for(change, policy).map(|_| ())
    }

    /// Apply one change, enforcing the row invariants:
    ///
    /// 1. quantity ≥ 0 unless the policy allows negative stock;
    /// 2. 0 ≤ reserved_quantity, and reserved_quantity ≤ quantity whenever
    ///    quantity is non-negative (a negative row can carry no reservation).
    ///
    /// Returns the signed deltas actually applied so the caller can record
    /// a matching ledger movement. Fails without mutating.
    pub fn apply_change(
        &mut self,
        change: &StockChange,
        policy: StockPolicy,
        now: DateTime<Utc>,
    ) -> StockResult<AppliedDelta> {
        let applied = self.delta_for(change, policy)?;
        self.quantity += applied.quantity;
        self.reserved_quantity += applied.reserved;
        self.updated_at = now;
        Ok(applied)
    }

    fn delta_for(&self, change: &StockChange, policy: StockPolicy) -> StockResult<AppliedDelta> {
        if self.is_locked {
            return Err(StockError::State(StateKind::Locked));
        }

        let applied = match change {
            StockChange::Delta { quantity, reserved } => AppliedDelta {
                quantity: *quantity,
                reserved: *reserved,
            },
            StockChange::PickOut { quantity } => {
                if *quantity <= Decimal::ZERO {
                    return Err(StockError::invalid("picked quantity must be positive"));
                }
                if self.reserved_quantity < *quantity {
                    return Err(ValidationKind::InsufficientReservation {
                        picked: *quantity,
                        reserved: self.reserved_quantity,
                    }
                    .into());
                }
                AppliedDelta {
                    quantity: -*quantity,
                    reserved: -*quantity,
                }
            }
            StockChange::SetQuantity { counted } => {
                if *counted < Decimal::ZERO {
                    return Err(StockError::invalid("counted quantity cannot be negative"));
                }
                AppliedDelta {
                    quantity: *counted - self.quantity,
                    reserved: Decimal::ZERO,
                }
            }
        };

        let new_quantity = self.quantity + applied.quantity;
        let new_reserved = self.reserved_quantity + applied.reserved;

        if new_quantity < Decimal::ZERO && !policy.allow_negative_stock {
            return Err(ValidationKind::NegativeStock.into());
        }
        if new_reserved < Decimal::ZERO || new_reserved > new_quantity.max(Decimal::ZERO) {
            return Err(ValidationKind::OverReserved.into());
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_key() -> ItemKey {
        ItemKey::new(CompanyId::new(), WarehouseId::new(), ProductId::new()).at(LocationId::new())
    }

    fn item_with(quantity: Decimal, reserved: Decimal) -> InventoryItem {
        let mut item = InventoryItem::new(test_key(), Utc::now());
        item.apply_change(
            &StockChange::Delta { quantity, reserved },
            StockPolicy::strict(),
            Utc::now(),
        )
        .unwrap();
        item
    }

    #[test]
    fn new_row_starts_empty() {
        let item = InventoryItem::new(test_key(), Utc::now());
        assert_eq!(item.quantity(), Decimal::ZERO);
        assert_eq!(item.reserved_quantity(), Decimal::ZERO);
        assert!(!item.is_locked());
    }

    #[test]
    fn delta_updates_quantity_and_reservation() {
        let item = item_with(dec!(10.000), dec!(2.000));
        assert_eq!(item.quantity(), dec!(10.000));
        assert_eq!(item.reserved_quantity(), dec!(2.000));
        assert_eq!(item.available(), dec!(8.000));
    }

    #[test]
    fn negative_stock_rejected_under_strict_policy() {
        let mut item = item_with(dec!(3.000), Decimal::ZERO);
        let err = item
            .apply_change(
                &StockChange::Delta {
                    quantity: dec!(-5.000),
                    reserved: Decimal::ZERO,
                },
                StockPolicy::strict(),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            StockError::Validation(ValidationKind::NegativeStock)
        );
        // Failure leaves the row unchanged.
        assert_eq!(item.quantity(), dec!(3.000));
    }

    #[test]
    fn negative_stock_allowed_when_policy_permits() {
        let mut item = item_with(dec!(3.000), Decimal::ZERO);
        item.apply_change(
            &StockChange::Delta {
                quantity: dec!(-5.000),
                reserved: Decimal::ZERO,
            },
            StockPolicy::allow_negative(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(item.quantity(), dec!(-2.000));
        assert_eq!(item.available(), Decimal::ZERO);
    }

    #[test]
    fn negative_row_cannot_carry_reservation() {
        let mut item = item_with(dec!(3.000), dec!(1.000));
        let err = item
            .apply_change(
                &StockChange::Delta {
                    quantity: dec!(-5.000),
                    reserved: Decimal::ZERO,
                },
                StockPolicy::allow_negative(),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, StockError::Validation(ValidationKind::OverReserved));
    }

    #[test]
    fn over_reservation_rejected() {
        let mut item = item_with(dec!(4.000), Decimal::ZERO);
        let err = item
            .apply_change(
                &StockChange::Delta {
                    quantity: Decimal::ZERO,
                    reserved: dec!(5.000),
                },
                StockPolicy::strict(),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, StockError::Validation(ValidationKind::OverReserved));
    }

    #[test]
    fn pick_out_consumes_stock_and_reservation() {
        let mut item = item_with(dec!(10.000), dec!(4.000));
        let applied = item
            .apply_change(
                &StockChange::PickOut {
                    quantity: dec!(3.000),
                },
                StockPolicy::strict(),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(applied.quantity, dec!(-3.000));
        assert_eq!(applied.reserved, dec!(-3.000));
        assert_eq!(item.quantity(), dec!(7.000));
        assert_eq!(item.reserved_quantity(), dec!(1.000));
    }

    #[test]
    fn pick_out_requires_reservation_cover() {
        let mut item = item_with(dec!(10.000), dec!(2.000));
        let err = item
            .apply_change(
                &StockChange::PickOut {
                    quantity: dec!(3.000),
                },
                StockPolicy::strict(),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            StockError::Validation(ValidationKind::InsufficientReservation {
                picked: dec!(3.000),
                reserved: dec!(2.000),
            })
        );
        assert_eq!(item.quantity(), dec!(10.000));
        assert_eq!(item.reserved_quantity(), dec!(2.000));
    }

    #[test]
    fn set_quantity_returns_live_difference() {
        let mut item = item_with(dec!(7.000), Decimal::ZERO);
        let applied = item
            .apply_change(
                &StockChange::SetQuantity {
                    counted: dec!(5.000),
                },
                StockPolicy::strict(),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(applied.quantity, dec!(-2.000));
        assert_eq!(item.quantity(), dec!(5.000));
    }

    #[test]
    fn locked_row_rejects_all_changes() {
        let mut item = item_with(dec!(5.000), Decimal::ZERO);
        item.lock(Utc::now());
        let err = item
            .apply_change(
                &StockChange::Delta {
                    quantity: dec!(1.000),
                    reserved: Decimal::ZERO,
                },
                StockPolicy::strict(),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, StockError::State(StateKind::Locked));
    }

    #[test]
    fn lock_order_is_stable_and_distinguishes_batches() {
        let base = ItemKey::new(CompanyId::new(), WarehouseId::new(), ProductId::new());
        let a = base.clone().with_batch("LOT-A");
        let b = base.clone().with_batch("LOT-B");
        assert_eq!(a.lock_order(), a.lock_order());
        assert_ne!(a.lock_order(), b.lock_order());
    }

    fn qty_strategy() -> impl Strategy<Value = Decimal> {
        // Three fractional digits, the precision quantities are stored at.
        (-20_000i64..20_000).prop_map(|n| Decimal::new(n, 3))
    }

    proptest! {
        /// Invariants hold after every accepted change, and the sum of the
        /// applied deltas always reconciles with the row's net quantity
        /// change, the property the ledger audit relies on.
        #[test]
        fn applied_deltas_reconcile_and_invariants_hold(
            changes in proptest::collection::vec((qty_strategy(), qty_strategy()), 1..40)
        ) {
            let mut item = InventoryItem::new(test_key(), Utc::now());
            let mut applied_sum = Decimal::ZERO;

            for (quantity, reserved) in changes {
                let change = StockChange::Delta { quantity, reserved };
                if let Ok(applied) = item.apply_change(&change, StockPolicy::strict(), Utc::now()) {
                    applied_sum += applied.quantity;
                }
                prop_assert!(item.quantity() >= Decimal::ZERO);
                prop_assert!(item.reserved_quantity() >= Decimal::ZERO);
                prop_assert!(item.reserved_quantity() <= item.quantity());
            }

            prop_assert_eq!(item.quantity(), applied_sum);
        }
    }
}
