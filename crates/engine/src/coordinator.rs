//! Task completion coordination.
//!
//! Turns a completed putaway, picking, or internal-move task (and goods
//! receipts) into one atomic unit: the row mutations, the single paired
//! movement, and the order-line recording all commit together or not at
//! all. Completion is at-most-once per task id: re-delivering the same
//! completion is detected and reported as `Duplicate`, never applied
//! twice.

use std::collections::HashSet;
use std::sync::Mutex;

use rust_decimal::Decimal;
use tracing::info;

use stocksmith_core::{
    ActorContext, Catalog, LocationId, MovementId, StockError, StockResult, TaskId,
    WarehouseDirectory,
};
use stocksmith_inventory::{ItemKey, StockChange, StockPolicy};
use stocksmith_ledger::{MovementLedger, MovementType, NewMovement};
use stocksmith_operations::{GoodsReceipt, TaskDetail, TaskStatus, WarehouseTask};

use crate::catalog::{ensure_location, ensure_product, ensure_warehouse};
use crate::store::{InventoryStore, StockMutation};

/// What processing a completion event did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The stock effect was applied; one movement was appended.
    Applied(MovementId),
    /// This task id was already processed; nothing changed.
    Duplicate,
}

pub struct TaskCoordinator<S, C, L, H> {
    store: S,
    catalog: C,
    ledger: L,
    hooks: H,
    processed: Mutex<HashSet<TaskId>>,
}

impl<S, C, L, H> TaskCoordinator<S, C, L, H>
where
    S: InventoryStore,
    C: Catalog + WarehouseDirectory,
    L: MovementLedger,
    H: stocksmith_core::OrderLineHooks,
{
    pub fn new(store: S, catalog: C, ledger: L, hooks: H) -> Self {
        Self {
            store,
            catalog,
            ledger,
            hooks,
            processed: Mutex::new(HashSet::new()),
        }
    }

    /// Apply the stock effect of a completed task.
    pub fn process(&self, ctx: &ActorContext, task: &WarehouseTask) -> StockResult<CompletionOutcome> {
        if task.status() != TaskStatus::Completed {
            return Err(StockError::task_state(format!(
                "cannot apply a {} task",
                task.status().as_str()
            )));
        }

        ensure_warehouse(&self.catalog, ctx.company, task.warehouse())?;
        let (product, from, to) = match task.detail() {
            TaskDetail::Putaway {
                product,
                from_location,
                to_location,
                ..
            }
            | TaskDetail::Picking {
                product,
                from_location,
                to_location,
                ..
            }
            | TaskDetail::InternalMove {
                product,
                from_location,
                to_location,
                ..
            } => (*product, *from_location, *to_location),
        };
        ensure_product(&self.catalog, ctx.company, product)?;
        ensure_location(&self.catalog, task.warehouse(), from)?;
        ensure_location(&self.catalog, task.warehouse(), to)?;

        self.apply_task(ctx, task, product, from, to)
    }

    fn apply_task(
        &self,
        ctx: &ActorContext,
        task: &WarehouseTask,
        product: stocksmith_core::ProductId,
        from: LocationId,
        to: LocationId,
    ) -> StockResult<CompletionOutcome> {
        let quantity = task.detail().quantity();
        let batch = match task.detail() {
            TaskDetail::Putaway { batch, .. }
            | TaskDetail::Picking { batch, .. }
            | TaskDetail::InternalMove { batch, .. } => batch.clone(),
        };

        let mut base = ItemKey::new(ctx.company, task.warehouse(), product);
        base.batch = batch.clone();
        let from_key = base.clone().at(from);
        let to_key = base.at(to);

        let (from_change, movement_type) = match task.detail() {
            TaskDetail::Putaway { .. } | TaskDetail::InternalMove { .. } => (
                StockChange::Delta {
                    quantity: -quantity,
                    reserved: Decimal::ZERO,
                },
                MovementType::Move,
            ),
            TaskDetail::Picking { .. } => {
                (StockChange::PickOut { quantity }, MovementType::Outbound)
            }
        };

        let mut to_mutation = StockMutation::new(
            to_key,
            StockChange::Delta {
                quantity,
                reserved: Decimal::ZERO,
            },
        );
        if let Some(expiry) = task.expiry_date() {
            to_mutation = to_mutation.with_expiry(expiry);
        }
        let ops = [StockMutation::new(from_key, from_change), to_mutation];

        let order_line = match task.detail() {
            TaskDetail::Picking { order_line, .. } => *order_line,
            _ => None,
        };

        // Transfer sources validate non-negative even where the warehouse
        // allows negative stock; overdraw is a manual-adjustment concern.
        let policy = StockPolicy::strict();

        let movement = NewMovement {
            company: ctx.company,
            warehouse: task.warehouse(),
            product: Some(product),
            location_from: Some(from),
            location_to: Some(to),
            batch,
            expiry_date: task.expiry_date(),
            movement_type,
            quantity,
            reference: format!("Task {}", task.id()),
            reason: format!("{} completed", task.detail().kind()),
            created_by: ctx.user,
        };

        if !self.claim(task.id())? {
            return Ok(CompletionOutcome::Duplicate);
        }

        let mut movement_id = None;
        let committed = self.store.apply_batch_with(&ops, policy, |_| {
            if let Some(line) = order_line {
                self.hooks.record_shipped(line.order, line.line_no, quantity)?;
            }
            match self.ledger.append(movement) {
                Ok(id) => {
                    movement_id = Some(id);
                    Ok(())
                }
                Err(err) => {
                    if let Some(line) = order_line {
                        self.hooks.revert_shipped(line.order, line.line_no, quantity)?;
                    }
                    Err(err.into())
                }
            }
        });
        if let Err(err) = committed {
            self.unclaim(task.id());
            return Err(err);
        }

        // Rows and movement are durable past this point; the claim stays
        // held so a redelivered completion reads as Duplicate.
        let movement_id =
            movement_id.ok_or_else(|| StockError::infrastructure("no movement id"))?;
        info!(
            task = %task.id(),
            kind = task.detail().kind(),
            %quantity,
            "task completion applied"
        );
        Ok(CompletionOutcome::Applied(movement_id))
    }

    /// Record goods received into staging, bump the inbound order line, and
    /// append the inbound movement, all in one unit.
    pub fn record_receipt(
        &self,
        ctx: &ActorContext,
        receipt: &GoodsReceipt,
    ) -> StockResult<CompletionOutcome> {
        receipt.validate()?;
        ensure_warehouse(&self.catalog, ctx.company, receipt.warehouse)?;
        ensure_product(&self.catalog, ctx.company, receipt.product)?;
        match receipt.staging_location {
            Some(location) => ensure_location(&self.catalog, receipt.warehouse, location)?,
            None if self.catalog.uses_bins(receipt.warehouse) => {
                return Err(StockError::invalid(
                    "staging location required in a bin-tracked warehouse",
                ));
            }
            None => {}
        }

        let mut key = ItemKey::new(ctx.company, receipt.warehouse, receipt.product);
        key.location = receipt.staging_location;
        key.batch = receipt.batch.clone();

        let mut mutation = StockMutation::new(
            key,
            StockChange::Delta {
                quantity: receipt.quantity,
                reserved: Decimal::ZERO,
            },
        );
        if let Some(expiry) = receipt.expiry_date {
            mutation = mutation.with_expiry(expiry);
        }

        let policy = StockPolicy {
            allow_negative_stock: self.catalog.allow_negative_stock(receipt.warehouse),
        };

        let movement = NewMovement {
            company: ctx.company,
            warehouse: receipt.warehouse,
            product: Some(receipt.product),
            location_from: None,
            location_to: receipt.staging_location,
            batch: receipt.batch.clone(),
            expiry_date: receipt.expiry_date,
            movement_type: MovementType::Inbound,
            quantity: receipt.quantity,
            reference: receipt.reference.clone(),
            reason: "goods received".to_string(),
            created_by: ctx.user,
        };

        if !self.claim(receipt.id)? {
            return Ok(CompletionOutcome::Duplicate);
        }

        let mut movement_id = None;
        let committed = self.store.apply_batch_with(&[mutation], policy, |_| {
            if let Some(line) = receipt.order_line {
                self.hooks
                    .record_received(line.order, line.line_no, receipt.quantity)?;
            }
            match self.ledger.append(movement) {
                Ok(id) => {
                    movement_id = Some(id);
                    Ok(())
                }
                Err(err) => {
                    if let Some(line) = receipt.order_line {
                        self.hooks
                            .revert_received(line.order, line.line_no, receipt.quantity)?;
                    }
                    Err(err.into())
                }
            }
        });
        if let Err(err) = committed {
            self.unclaim(receipt.id);
            return Err(err);
        }

        // Same rule as task completion: once the unit commits, the claim
        // is never released.
        let movement_id =
            movement_id.ok_or_else(|| StockError::infrastructure("no movement id"))?;
        info!(
            receipt = %receipt.id,
            reference = %receipt.reference,
            quantity = %receipt.quantity,
            "goods receipt recorded"
        );
        Ok(CompletionOutcome::Applied(movement_id))
    }

    /// Returns false when the id was already processed.
    fn claim(&self, id: TaskId) -> StockResult<bool> {
        let mut processed = self
            .processed
            .lock()
            .map_err(|_| StockError::infrastructure("processed set lock poisoned"))?;
        Ok(processed.insert(id))
    }

    /// Give the id back after a failed application so a corrected retry
    /// can go through.
    fn unclaim(&self, id: TaskId) {
        if let Ok(mut processed) = self.processed.lock() {
            processed.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use stocksmith_core::{CompanyId, ProductId, ValidationKind, WarehouseId};
    use stocksmith_ledger::{InMemoryMovementLedger, LedgerError, Movement, MovementFilter};
    use stocksmith_operations::{
        InboundOrder, InboundOrderStatus, InboundOrderType, OrderLineRef, OutboundOrder,
        OutboundOrderStatus, OutboundOrderType,
    };

    use crate::catalog::StaticCatalog;
    use crate::orders::InMemoryOrderBook;
    use crate::store::InMemoryInventoryStore;

    struct Fixture {
        coordinator: TaskCoordinator<
            Arc<InMemoryInventoryStore>,
            Arc<StaticCatalog>,
            Arc<InMemoryMovementLedger>,
            Arc<InMemoryOrderBook>,
        >,
        store: Arc<InMemoryInventoryStore>,
        catalog: Arc<StaticCatalog>,
        ledger: Arc<InMemoryMovementLedger>,
        book: Arc<InMemoryOrderBook>,
        ctx: ActorContext,
        warehouse: WarehouseId,
        product: ProductId,
        staging: LocationId,
        storage: LocationId,
        packing: LocationId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryInventoryStore::new());
        let catalog = Arc::new(StaticCatalog::new());
        let ledger = Arc::new(InMemoryMovementLedger::new());
        let book = Arc::new(InMemoryOrderBook::new());
        let ctx = ActorContext::system(CompanyId::new());
        let warehouse = catalog.register_warehouse(ctx.company, false, true);
        let product = catalog.register_product(ctx.company);
        let staging = catalog.register_location(warehouse);
        let storage = catalog.register_location(warehouse);
        let packing = catalog.register_location(warehouse);
        let coordinator = TaskCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            Arc::clone(&book),
        );
        Fixture {
            coordinator,
            store,
            catalog,
            ledger,
            book,
            ctx,
            warehouse,
            product,
            staging,
            storage,
            packing,
        }
    }

    fn key(f: &Fixture, location: LocationId) -> ItemKey {
        ItemKey::new(f.ctx.company, f.warehouse, f.product).at(location)
    }

    fn seed(f: &Fixture, location: LocationId, quantity: Decimal, reserved: Decimal) {
        f.store
            .apply_change(
                &key(f, location),
                StockChange::Delta { quantity, reserved },
                StockPolicy::strict(),
            )
            .unwrap();
    }

    fn completed_task(f: &Fixture, detail: TaskDetail) -> WarehouseTask {
        let mut task = WarehouseTask::new(f.warehouse, detail, chrono::Utc::now()).unwrap();
        task.complete(chrono::Utc::now()).unwrap();
        task
    }

    #[test]
    fn putaway_moves_staging_to_storage() {
        let f = fixture();
        seed(&f, f.staging, dec!(8.000), Decimal::ZERO);

        let task = completed_task(
            &f,
            TaskDetail::Putaway {
                product: f.product,
                batch: None,
                from_location: f.staging,
                to_location: f.storage,
                quantity: dec!(8.000),
            },
        );
        let outcome = f.coordinator.process(&f.ctx, &task).unwrap();
        assert!(matches!(outcome, CompletionOutcome::Applied(_)));

        assert_eq!(
            f.store.get(&key(&f, f.staging)).unwrap().unwrap().quantity(),
            Decimal::ZERO
        );
        assert_eq!(
            f.store.get(&key(&f, f.storage)).unwrap().unwrap().quantity(),
            dec!(8.000)
        );

        let movements = f
            .ledger
            .query(f.ctx.company, &MovementFilter::default())
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Move);
        assert_eq!(movements[0].location_from, Some(f.staging));
        assert_eq!(movements[0].location_to, Some(f.storage));
    }

    #[test]
    fn putaway_from_short_staging_fails_atomically() {
        let f = fixture();
        seed(&f, f.staging, dec!(2.000), Decimal::ZERO);

        let task = completed_task(
            &f,
            TaskDetail::Putaway {
                product: f.product,
                batch: None,
                from_location: f.staging,
                to_location: f.storage,
                quantity: dec!(5.000),
            },
        );
        let err = f.coordinator.process(&f.ctx, &task).unwrap_err();
        assert_eq!(err, StockError::Validation(ValidationKind::NegativeStock));
        assert_eq!(
            f.store.get(&key(&f, f.staging)).unwrap().unwrap().quantity(),
            dec!(2.000)
        );
        assert!(f.store.get(&key(&f, f.storage)).unwrap().is_none());
        assert!(f.ledger.is_empty());
    }

    #[test]
    fn duplicate_completion_is_a_noop() {
        let f = fixture();
        seed(&f, f.staging, dec!(8.000), Decimal::ZERO);

        let task = completed_task(
            &f,
            TaskDetail::Putaway {
                product: f.product,
                batch: None,
                from_location: f.staging,
                to_location: f.storage,
                quantity: dec!(4.000),
            },
        );
        f.coordinator.process(&f.ctx, &task).unwrap();
        let second = f.coordinator.process(&f.ctx, &task).unwrap();
        assert_eq!(second, CompletionOutcome::Duplicate);

        assert_eq!(
            f.store.get(&key(&f, f.storage)).unwrap().unwrap().quantity(),
            dec!(4.000)
        );
        assert_eq!(f.ledger.len(), 1);
    }

    #[test]
    fn failed_completion_can_be_retried() {
        let f = fixture();
        let task = completed_task(
            &f,
            TaskDetail::Putaway {
                product: f.product,
                batch: None,
                from_location: f.staging,
                to_location: f.storage,
                quantity: dec!(4.000),
            },
        );
        assert!(f.coordinator.process(&f.ctx, &task).is_err());

        seed(&f, f.staging, dec!(4.000), Decimal::ZERO);
        let outcome = f.coordinator.process(&f.ctx, &task).unwrap();
        assert!(matches!(outcome, CompletionOutcome::Applied(_)));
    }

    #[test]
    fn picking_releases_reservation_and_ships() {
        let f = fixture();
        seed(&f, f.storage, dec!(10.000), dec!(3.000));

        let mut order = OutboundOrder::new(
            f.ctx.company,
            f.warehouse,
            "OUT-1",
            OutboundOrderType::Sales,
        );
        let line_no = order.add_line(f.product, dec!(3.000)).unwrap();
        order.record_allocated(line_no, dec!(3.000)).unwrap();
        let order_id = f.book.insert_outbound(order).unwrap();

        let task = completed_task(
            &f,
            TaskDetail::Picking {
                product: f.product,
                batch: None,
                from_location: f.storage,
                to_location: f.packing,
                quantity: dec!(3.000),
                order_line: Some(OrderLineRef {
                    order: order_id,
                    line_no,
                }),
            },
        );
        f.coordinator.process(&f.ctx, &task).unwrap();

        let source = f.store.get(&key(&f, f.storage)).unwrap().unwrap();
        assert_eq!(source.quantity(), dec!(7.000));
        assert_eq!(source.reserved_quantity(), Decimal::ZERO);
        assert_eq!(
            f.store.get(&key(&f, f.packing)).unwrap().unwrap().quantity(),
            dec!(3.000)
        );

        let movements = f
            .ledger
            .query(f.ctx.company, &MovementFilter::default())
            .unwrap();
        assert_eq!(movements[0].movement_type, MovementType::Outbound);

        let order = f.book.outbound(order_id).unwrap().unwrap();
        assert_eq!(order.status(), OutboundOrderStatus::Shipped);
        assert_eq!(order.lines()[0].shipped_quantity, dec!(3.000));
    }

    #[test]
    fn picking_without_reservation_cover_is_rejected() {
        let f = fixture();
        seed(&f, f.storage, dec!(10.000), dec!(2.000));

        let task = completed_task(
            &f,
            TaskDetail::Picking {
                product: f.product,
                batch: None,
                from_location: f.storage,
                to_location: f.packing,
                quantity: dec!(3.000),
                order_line: None,
            },
        );
        let err = f.coordinator.process(&f.ctx, &task).unwrap_err();
        assert_eq!(
            err,
            StockError::Validation(ValidationKind::InsufficientReservation {
                picked: dec!(3.000),
                reserved: dec!(2.000),
            })
        );
        let source = f.store.get(&key(&f, f.storage)).unwrap().unwrap();
        assert_eq!(source.quantity(), dec!(10.000));
        assert_eq!(source.reserved_quantity(), dec!(2.000));
        assert!(f.ledger.is_empty());
    }

    #[test]
    fn pending_task_is_not_applied() {
        let f = fixture();
        let task = WarehouseTask::new(
            f.warehouse,
            TaskDetail::InternalMove {
                product: f.product,
                batch: None,
                from_location: f.staging,
                to_location: f.storage,
                quantity: dec!(1.000),
            },
            chrono::Utc::now(),
        )
        .unwrap();
        assert!(f.coordinator.process(&f.ctx, &task).is_err());
    }

    #[test]
    fn receipt_lands_in_staging_and_bumps_the_order() {
        let f = fixture();
        let mut order = InboundOrder::new(
            f.ctx.company,
            f.warehouse,
            "IN-1",
            InboundOrderType::Purchase,
        );
        let line_no = order.add_line(f.product, dec!(6.000)).unwrap();
        let order_id = f.book.insert_inbound(order).unwrap();

        let receipt = GoodsReceipt {
            id: TaskId::new(),
            warehouse: f.warehouse,
            product: f.product,
            batch: Some("LOT-7".to_string()),
            expiry_date: None,
            staging_location: Some(f.staging),
            quantity: dec!(6.000),
            order_line: Some(OrderLineRef {
                order: order_id,
                line_no,
            }),
            reference: "GR-1".to_string(),
        };
        f.coordinator.record_receipt(&f.ctx, &receipt).unwrap();

        let mut staged = ItemKey::new(f.ctx.company, f.warehouse, f.product).at(f.staging);
        staged.batch = Some("LOT-7".to_string());
        assert_eq!(
            f.store.get(&staged).unwrap().unwrap().quantity(),
            dec!(6.000)
        );

        let movements = f
            .ledger
            .query(f.ctx.company, &MovementFilter::default())
            .unwrap();
        assert_eq!(movements[0].movement_type, MovementType::Inbound);

        let order = f.book.inbound(order_id).unwrap().unwrap();
        assert_eq!(order.lines()[0].received_quantity, dec!(6.000));

        // Same receipt id again: no second movement, no double receipt.
        let second = f.coordinator.record_receipt(&f.ctx, &receipt).unwrap();
        assert_eq!(second, CompletionOutcome::Duplicate);
        assert_eq!(f.ledger.len(), 1);
    }

    struct FailingLedger;

    impl MovementLedger for FailingLedger {
        fn append(&self, _movement: NewMovement) -> Result<MovementId, LedgerError> {
            Err(LedgerError::Storage("ledger unavailable".to_string()))
        }

        fn query(
            &self,
            _company: CompanyId,
            _filter: &MovementFilter,
        ) -> Result<Vec<Movement>, LedgerError> {
            Ok(Vec::new())
        }
    }

    fn failing_coordinator(
        f: &Fixture,
    ) -> TaskCoordinator<
        Arc<InMemoryInventoryStore>,
        Arc<StaticCatalog>,
        Arc<FailingLedger>,
        Arc<InMemoryOrderBook>,
    > {
        TaskCoordinator::new(
            Arc::clone(&f.store),
            Arc::clone(&f.catalog),
            Arc::new(FailingLedger),
            Arc::clone(&f.book),
        )
    }

    #[test]
    fn failed_movement_append_backs_out_order_recording() {
        let f = fixture();
        seed(&f, f.storage, dec!(10.000), dec!(3.000));

        let mut order = OutboundOrder::new(
            f.ctx.company,
            f.warehouse,
            "OUT-9",
            OutboundOrderType::Sales,
        );
        let line_no = order.add_line(f.product, dec!(3.000)).unwrap();
        order.record_allocated(line_no, dec!(3.000)).unwrap();
        let order_id = f.book.insert_outbound(order).unwrap();

        let task = completed_task(
            &f,
            TaskDetail::Picking {
                product: f.product,
                batch: None,
                from_location: f.storage,
                to_location: f.packing,
                quantity: dec!(3.000),
                order_line: Some(OrderLineRef {
                    order: order_id,
                    line_no,
                }),
            },
        );

        let failing = failing_coordinator(&f);
        let err = failing.process(&f.ctx, &task).unwrap_err();
        assert!(matches!(err, StockError::Infrastructure(_)));

        let source = f.store.get(&key(&f, f.storage)).unwrap().unwrap();
        assert_eq!(source.quantity(), dec!(10.000));
        assert_eq!(source.reserved_quantity(), dec!(3.000));

        let order = f.book.outbound(order_id).unwrap().unwrap();
        assert_eq!(order.lines()[0].shipped_quantity, Decimal::ZERO);
        assert_eq!(order.lines()[0].allocated_quantity, dec!(3.000));
        assert_ne!(order.status(), OutboundOrderStatus::Shipped);

        // The claim went back with the failed unit: a retry is applied, not
        // reported as a duplicate.
        let again = failing.process(&f.ctx, &task).unwrap_err();
        assert!(matches!(again, StockError::Infrastructure(_)));
    }

    #[test]
    fn failed_receipt_append_backs_out_received_quantity() {
        let f = fixture();
        let mut order = InboundOrder::new(
            f.ctx.company,
            f.warehouse,
            "IN-9",
            InboundOrderType::Purchase,
        );
        let line_no = order.add_line(f.product, dec!(6.000)).unwrap();
        let order_id = f.book.insert_inbound(order).unwrap();

        let receipt = GoodsReceipt {
            id: TaskId::new(),
            warehouse: f.warehouse,
            product: f.product,
            batch: None,
            expiry_date: None,
            staging_location: Some(f.staging),
            quantity: dec!(6.000),
            order_line: Some(OrderLineRef {
                order: order_id,
                line_no,
            }),
            reference: "GR-9".to_string(),
        };
        let err = failing_coordinator(&f)
            .record_receipt(&f.ctx, &receipt)
            .unwrap_err();
        assert!(matches!(err, StockError::Infrastructure(_)));

        assert_eq!(
            f.store.get_or_create(&key(&f, f.staging)).unwrap().quantity(),
            Decimal::ZERO
        );
        let order = f.book.inbound(order_id).unwrap().unwrap();
        assert_eq!(order.lines()[0].received_quantity, Decimal::ZERO);
        assert_ne!(order.status(), InboundOrderStatus::Completed);
    }

    #[test]
    fn expiry_is_stamped_within_the_same_unit() {
        let f = fixture();
        seed(&f, f.staging, dec!(4.000), Decimal::ZERO);
        let date = chrono::NaiveDate::from_ymd_opt(2027, 6, 1).unwrap();

        let mut task = WarehouseTask::new(
            f.warehouse,
            TaskDetail::Putaway {
                product: f.product,
                batch: None,
                from_location: f.staging,
                to_location: f.storage,
                quantity: dec!(4.000),
            },
            chrono::Utc::now(),
        )
        .unwrap()
        .with_expiry(date);
        task.complete(chrono::Utc::now()).unwrap();

        // A failed unit leaves no expiry behind.
        assert!(failing_coordinator(&f).process(&f.ctx, &task).is_err());
        let storage_row = f.store.get_or_create(&key(&f, f.storage)).unwrap();
        assert_eq!(storage_row.quantity(), Decimal::ZERO);
        assert_eq!(storage_row.expiry_date(), None);

        // The committed unit stamps it, and the claim holds on redelivery.
        f.coordinator.process(&f.ctx, &task).unwrap();
        let storage_row = f.store.get(&key(&f, f.storage)).unwrap().unwrap();
        assert_eq!(storage_row.quantity(), dec!(4.000));
        assert_eq!(storage_row.expiry_date(), Some(date));

        let second = f.coordinator.process(&f.ctx, &task).unwrap();
        assert_eq!(second, CompletionOutcome::Duplicate);
        assert_eq!(f.ledger.len(), 1);
    }
}
