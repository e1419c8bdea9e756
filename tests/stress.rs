//! Stress - correctness at the edges: near-capacity operation, arena
//! exhaustion, rapid slot churn, single-level pileups, and the price
//! boundaries.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tick_lob::{Book, BookError, Side, Trade};

#[test]
fn test_near_capacity_operation() {
    const CAPACITY: u32 = 10_000;
    let mut book = Book::new(2_000, CAPACITY);

    // Fill to 95% capacity with non-crossing orders
    let target = (CAPACITY as f64 * 0.95) as u64;
    for i in 0..target {
        let (side, price) = if i % 2 == 0 {
            (Side::Bid, 800 + (i % 100) as u32)
        } else {
            (Side::Ask, 1_100 + (i % 100) as u32)
        };
        book.add_order(i, side, price, 100).unwrap();
    }

    assert_eq!(book.open_orders() as u64, target);
    book.validate();
}

#[test]
fn test_arena_exhaustion_is_fatal_and_clean() {
    const CAPACITY: u32 = 100;
    let mut book = Book::new(2_000, CAPACITY);

    for i in 0..CAPACITY as u64 {
        book.add_order(i, Side::Bid, 500 + (i % 50) as u32, 100).unwrap();
    }

    // One more resting order cannot be housed
    let err = book.add_order(100, Side::Bid, 700, 100);
    assert_eq!(err, Err(BookError::ArenaExhausted));
    assert!(!book.contains_order(100));
    assert_eq!(book.open_orders(), CAPACITY);
    book.validate();

    // A fully-matching add still works: it needs no slot
    let mut trades: Vec<Trade> = Vec::new();
    book.add_order_with(101, Side::Ask, 500, 100, &mut trades).unwrap();
    assert!(!trades.is_empty());
    assert!(book.open_orders() < CAPACITY);

    // And the released slots are usable again
    book.add_order(102, Side::Bid, 600, 10).unwrap();
    book.validate();
}

#[test]
fn test_rapid_churn_reuses_slots() {
    const CAPACITY: u32 = 64;
    let mut book = Book::new(1_000, CAPACITY);

    // Far more adds than capacity, each canceled immediately
    for round in 0..10_000u64 {
        let id = round % CAPACITY as u64;
        book.add_order(id, Side::Bid, 100 + (round % 32) as u32, 1 + (round % 9) as u32)
            .unwrap();
        book.cancel_order(id);
    }

    assert!(book.is_empty());
    assert_eq!(book.best_bid(), 0);
    book.validate();
}

#[test]
fn test_single_level_pileup_and_sweep() {
    const COUNT: u64 = 5_000;
    let mut book = Book::new(1_000, 10_000);

    for i in 0..COUNT {
        book.add_order(i, Side::Ask, 500, 2).unwrap();
    }
    assert_eq!(book.depth_at(Side::Ask, 500), (2 * COUNT, COUNT as u32));

    // One order takes out the whole level; fills must run in arrival order
    let mut trades: Vec<Trade> = Vec::new();
    book.add_order_with(COUNT, Side::Bid, 500, (2 * COUNT) as u32, &mut trades)
        .unwrap();

    assert_eq!(trades.len(), COUNT as usize);
    for (i, t) in trades.iter().enumerate() {
        assert_eq!(t.maker_order_id, i as u64, "fills out of arrival order");
        assert_eq!(t.qty, 2);
    }
    assert!(book.is_empty());
    assert_eq!(book.best_ask(), book.max_price());
    book.validate();
}

#[test]
fn test_cancel_storm_from_both_ends_and_middle() {
    let mut book = Book::new(1_000, 1_000);

    for i in 0..100u64 {
        book.add_order(i, Side::Bid, 500, 10).unwrap();
    }

    // Alternate canceling the oldest, newest, and a middle order
    let mut low = 0u64;
    let mut high = 99u64;
    let mut mid = 50u64;
    for round in 0..33 {
        match round % 3 {
            0 => {
                book.cancel_order(low);
                low += 1;
            }
            1 => {
                book.cancel_order(high);
                high -= 1;
            }
            _ => {
                book.cancel_order(mid);
                mid += 1;
            }
        }
        book.validate();
    }

    let (qty, count) = book.depth_at(Side::Bid, 500);
    assert_eq!(count as u64, 100 - 33);
    assert_eq!(qty, (100 - 33) * 10);
}

#[test]
fn test_boundary_prices_rest_and_cancel() {
    let mut book = Book::new(1_000, 100);

    // Bids at 0 and asks at max_price are legal resting prices
    book.add_order(1, Side::Bid, 0, 10).unwrap();
    book.add_order(2, Side::Ask, 1_000, 10).unwrap();
    assert_eq!(book.best_bid(), 0);
    assert_eq!(book.best_ask(), 1_000);
    assert!(book.has_bids());
    assert!(book.has_asks());
    book.validate();

    // A sell at 0 cannot reach the bid resting at the sentinel price;
    // it rests instead
    book.add_order(3, Side::Ask, 0, 5).unwrap();
    assert!(book.contains_order(1));
    assert!(book.contains_order(3));
    assert_eq!(book.best_ask(), 0);
    book.validate();

    book.cancel_order(3);
    book.cancel_order(1);
    book.cancel_order(2);
    assert!(book.is_empty());
    assert_eq!(book.best_bid(), 0);
    assert_eq!(book.best_ask(), 1_000);
    book.validate();
}

#[test]
fn test_sweep_spanning_many_sparse_levels() {
    let mut book = Book::new(20_000, 10_000);

    // Asks scattered far apart so the bitmap scan crosses many words
    let mut expected = Vec::new();
    for i in 0..50u64 {
        let price = 1_000 + (i as u32) * 317;
        book.add_order(i, Side::Ask, price, 1).unwrap();
        expected.push(price);
    }

    let mut trades: Vec<Trade> = Vec::new();
    book.add_order_with(1_000, Side::Bid, 20_000, 50, &mut trades).unwrap();

    assert_eq!(trades.len(), 50);
    for (t, price) in trades.iter().zip(expected) {
        assert_eq!(t.price, price, "levels must be swept lowest first");
    }
    assert!(book.is_empty());
    book.validate();
}

#[test]
fn test_random_churn_with_periodic_validation() {
    const SEED: u64 = 0xC0FFEE;
    const OPS: usize = 20_000;
    const CAPACITY: u32 = 5_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = Book::new(2_000, CAPACITY);
    let mut next_id = 0u64;
    let mut live: Vec<u64> = Vec::new();

    for i in 0..OPS {
        // Keep headroom so the arena never exhausts
        let must_cancel = book.open_orders() > CAPACITY - 100;
        if !live.is_empty() && (must_cancel || rng.gen_bool(0.4)) {
            let idx = rng.gen_range(0..live.len());
            let id = live.swap_remove(idx);
            book.cancel_order(id);
        } else {
            let id = next_id;
            next_id += 1;
            let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
            book.add_order(id, side, rng.gen_range(700..1300), rng.gen_range(1..100))
                .unwrap();
            if book.contains_order(id) {
                live.push(id);
            }
        }

        if i % 1_000 == 0 {
            book.validate();
        }
    }

    book.validate();
}

#[test]
fn test_full_drain_and_refill() {
    let mut book = Book::new(1_000, 1_000);

    for cycle in 0..5 {
        let base = cycle * 200;
        for i in 0..100u64 {
            book.add_order(base + i, Side::Ask, 400 + (i % 10) as u32, 5).unwrap();
        }
        // Drain the side completely with one large buy
        book.add_order(base + 100, Side::Bid, 1_000, 500).unwrap();

        assert!(book.is_empty(), "cycle {} left residue", cycle);
        assert_eq!(book.best_ask(), 1_000);
        assert_eq!(book.best_bid(), 0);
        book.validate();
    }
}
