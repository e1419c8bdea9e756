//! Criterion latency benchmarks for the core book operations.
//!
//! Every benchmark keeps the book in a steady state (what an add consumes
//! or rests, a paired cancel or replenish puts back) so the arena never
//! exhausts no matter how many iterations criterion runs.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tick_lob::{Book, Side};

const BENCH_MAX_PRICE: u32 = 25_000;
const BENCH_CAPACITY: u32 = 1_000_000;
// Ids wrap long after any order with the same residue has died
const ID_SPACE: u64 = 1_000_000;

/// Benchmark: rest an order, cancel an old one (steady-state book)
fn bench_rest_and_cancel(c: &mut Criterion) {
    let mut book = Book::new(BENCH_MAX_PRICE, BENCH_CAPACITY);
    book.warm_up();

    const LIVE: u64 = 1_000;
    // Pre-fill the pipeline of live orders
    for i in 0..LIVE {
        book.add_order(i, Side::Bid, 9_000 + (i % 100) as u32, 100).unwrap();
    }

    let mut next_id = LIVE;
    c.bench_function("rest_and_cancel", |b| {
        b.iter(|| {
            let id = next_id % ID_SPACE;
            book.add_order(id, Side::Bid, 9_000 + (next_id % 100) as u32, 100)
                .unwrap();
            book.cancel_order((next_id - LIVE) % ID_SPACE);
            next_id += 1;
            black_box(book.best_bid())
        })
    });
}

/// Benchmark: fully matching add against books of varying level depth
fn bench_place_full_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_full_match");

    for depth in [1u64, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let mut book = Book::new(BENCH_MAX_PRICE, BENCH_CAPACITY);
            book.warm_up();

            for i in 0..depth {
                book.add_order(i, Side::Ask, 10_000, 100).unwrap();
            }

            let mut next_id = depth;
            b.iter(|| {
                // Take out the head maker, then put a fresh one at the tail
                let taker = next_id % ID_SPACE;
                book.add_order(taker, Side::Bid, 10_000, 100).unwrap();
                let replenish = (next_id + ID_SPACE / 2) % ID_SPACE;
                book.add_order(replenish, Side::Ask, 10_000, 100).unwrap();
                next_id += 1;
                black_box(book.open_orders())
            })
        });
    }

    group.finish();
}

/// Benchmark: cancel against books of varying size
fn bench_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel");

    for book_size in [100u64, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(book_size),
            book_size,
            |b, &book_size| {
                let mut book = Book::new(BENCH_MAX_PRICE, BENCH_CAPACITY);
                book.warm_up();

                for i in 0..book_size {
                    let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
                    let price = if i % 2 == 0 {
                        9_000 + (i % 100) as u32 * 10
                    } else {
                        11_000 + (i % 100) as u32 * 10
                    };
                    book.add_order(i, side, price, 100).unwrap();
                }

                let mut cancel_id = 0u64;
                let mut next_id = book_size;
                b.iter(|| {
                    book.cancel_order(cancel_id % ID_SPACE);

                    // Replenish at the same slot in the price pattern
                    let id = next_id % ID_SPACE;
                    let side = if cancel_id % 2 == 0 { Side::Bid } else { Side::Ask };
                    let price = if cancel_id % 2 == 0 {
                        9_000 + (cancel_id % 100) as u32 * 10
                    } else {
                        11_000 + (cancel_id % 100) as u32 * 10
                    };
                    book.add_order(id, side, price, 100).unwrap();

                    cancel_id = id;
                    next_id += 1;
                    black_box(book.open_orders())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark: mixed workload (70% add / 30% cancel)
fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");

    group.bench_function("70_add_30_cancel", |b| {
        let mut book = Book::new(BENCH_MAX_PRICE, BENCH_CAPACITY);
        book.warm_up();

        let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF);
        let mut next_id = 0u64;
        let mut live: Vec<u64> = Vec::new();

        // Pre-populate
        for _ in 0..1_000 {
            let id = next_id;
            next_id += 1;
            book.add_order(id, Side::Bid, rng.gen_range(9_000..9_100), 100).unwrap();
            live.push(id);
        }

        b.iter(|| {
            let force_cancel = book.open_orders() > BENCH_CAPACITY / 2;
            if !live.is_empty() && (force_cancel || rng.gen_bool(0.3)) {
                let idx = rng.gen_range(0..live.len());
                let id = live.swap_remove(idx);
                book.cancel_order(id);
            } else {
                let id = next_id % ID_SPACE;
                next_id += 1;
                let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
                book.add_order(id, side, rng.gen_range(9_900..10_100), rng.gen_range(1..1_000))
                    .unwrap();
                if book.contains_order(id) {
                    live.push(id);
                }
            }
            black_box(book.best_ask())
        })
    });

    group.finish();
}

/// Benchmark: batches of 1000 orders against a fresh book
fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.throughput(criterion::Throughput::Elements(1_000));

    group.bench_function("1000_orders", |b| {
        b.iter_batched(
            || Book::new(BENCH_MAX_PRICE, 2_000),
            |mut book| {
                for i in 0..1_000u64 {
                    let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
                    let price = if i % 2 == 0 {
                        9_000 + (i % 500) as u32
                    } else {
                        10_000 + (i % 500) as u32
                    };
                    book.add_order(i, side, price, 100).unwrap();
                }
                book
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_rest_and_cancel,
    bench_place_full_match,
    bench_cancel,
    bench_mixed_workload,
    bench_throughput,
);

criterion_main!(benches);
