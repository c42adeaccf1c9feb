use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stocksmith_core::{ActorContext, CompanyId, LocationId};
use stocksmith_inventory::{AdjustmentReason, ItemKey, StockAdjustment, StockChange, StockPolicy};
use stocksmith_ledger::InMemoryMovementLedger;

use stocksmith_engine::{
    AdjustmentProcessor, InMemoryInventoryStore, InMemoryOrderBook, InventoryStore,
    ReservationManager, StaticCatalog, StockMutation,
};

struct Bench {
    store: Arc<InMemoryInventoryStore>,
    catalog: Arc<StaticCatalog>,
    ledger: Arc<InMemoryMovementLedger>,
    ctx: ActorContext,
    warehouse: stocksmith_core::WarehouseId,
    product: stocksmith_core::ProductId,
    location: LocationId,
}

fn setup() -> Bench {
    let store = Arc::new(InMemoryInventoryStore::new());
    let catalog = Arc::new(StaticCatalog::new());
    let ledger = Arc::new(InMemoryMovementLedger::new());
    let ctx = ActorContext::system(CompanyId::new());
    let warehouse = catalog.register_warehouse(ctx.company, true, true);
    let product = catalog.register_product(ctx.company);
    let location = catalog.register_location(warehouse);
    Bench {
        store,
        catalog,
        ledger,
        ctx,
        warehouse,
        product,
        location,
    }
}

fn bench_single_row_delta(c: &mut Criterion) {
    let b = setup();
    let key = ItemKey::new(b.ctx.company, b.warehouse, b.product).at(b.location);
    b.store
        .apply_change(
            &key,
            StockChange::Delta {
                quantity: dec!(1000000.000),
                reserved: Decimal::ZERO,
            },
            StockPolicy::allow_negative(),
        )
        .unwrap();

    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(1));
    group.bench_function("single_row_delta", |bench| {
        bench.iter(|| {
            b.store
                .apply_change(
                    &key,
                    StockChange::Delta {
                        quantity: black_box(dec!(-0.001)),
                        reserved: Decimal::ZERO,
                    },
                    StockPolicy::allow_negative(),
                )
                .unwrap()
        })
    });
    group.finish();
}

fn bench_multi_row_batch(c: &mut Criterion) {
    let b = setup();
    let keys: Vec<ItemKey> = (0..8)
        .map(|_| {
            let key = ItemKey::new(b.ctx.company, b.warehouse, b.product)
                .at(b.catalog.register_location(b.warehouse));
            b.store
                .apply_change(
                    &key,
                    StockChange::Delta {
                        quantity: dec!(1000000.000),
                        reserved: Decimal::ZERO,
                    },
                    StockPolicy::allow_negative(),
                )
                .unwrap();
            key
        })
        .collect();

    let ops: Vec<StockMutation> = keys
        .iter()
        .map(|key| {
            StockMutation::new(
                key.clone(),
                StockChange::Delta {
                    quantity: dec!(-0.001),
                    reserved: Decimal::ZERO,
                },
            )
        })
        .collect();

    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(ops.len() as u64));
    group.bench_function("eight_row_batch", |bench| {
        bench.iter(|| {
            b.store
                .apply_batch_with(black_box(&ops), StockPolicy::allow_negative(), |_| Ok(()))
                .unwrap()
        })
    });
    group.finish();
}

fn bench_adjustment_with_ledger(c: &mut Criterion) {
    let b = setup();
    let processor = AdjustmentProcessor::new(
        Arc::clone(&b.store),
        Arc::clone(&b.catalog),
        Arc::clone(&b.ledger),
    );
    let adjustment = StockAdjustment {
        warehouse: b.warehouse,
        product: b.product,
        location: Some(b.location),
        batch: None,
        reason: AdjustmentReason::Other,
        description: "Benchmark correction".to_string(),
        quantity_difference: dec!(0.001),
        reference: "ADJ-BENCH".to_string(),
    };

    let mut group = c.benchmark_group("adjustments");
    group.throughput(Throughput::Elements(1));
    group.bench_function("apply_with_movement", |bench| {
        bench.iter(|| processor.apply(&b.ctx, black_box(&adjustment)).unwrap())
    });
    group.finish();
}

fn bench_reserve_release_cycle(c: &mut Criterion) {
    let b = setup();
    let hooks = Arc::new(InMemoryOrderBook::new());
    let manager = ReservationManager::new(Arc::clone(&b.store), Arc::clone(&b.catalog), hooks);
    let key = ItemKey::new(b.ctx.company, b.warehouse, b.product).at(b.location);
    b.store
        .apply_change(
            &key,
            StockChange::Delta {
                quantity: dec!(1000000.000),
                reserved: Decimal::ZERO,
            },
            StockPolicy::strict(),
        )
        .unwrap();

    let mut group = c.benchmark_group("reservations");
    group.throughput(Throughput::Elements(1));
    group.bench_function("reserve_release", |bench| {
        bench.iter(|| {
            manager
                .reserve(&b.ctx, b.warehouse, b.product, black_box(dec!(5.000)))
                .unwrap();
            manager
                .release(&b.ctx, b.warehouse, b.product, dec!(5.000))
                .unwrap();
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_single_row_delta,
    bench_multi_row_batch,
    bench_adjustment_with_ledger,
    bench_reserve_release_cycle
);
criterion_main!(benches);
