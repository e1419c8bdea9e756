//! Per-operation latency percentiles over a synthetic add/cancel workload.
//!
//! Commands are pre-generated so the timed loop measures the book alone,
//! and the first pass over the buffer trains the branch predictor before
//! anything is recorded.

use hdrhistogram::Histogram;
use std::time::Instant;
use tick_lob::{AddOrder, CancelOrder, Command, Replay, Book, Side};

const WARMUP_OPS: usize = 100_000;
const TIMED_OPS: usize = 1_000_000;
const MID: u32 = 12_500;

/// Deterministic command mix: mostly resting adds around the mid, every
/// 16th add crossing the spread, one cancel in five.
fn generate_commands(count: usize, first_id: u64) -> Vec<Command> {
    let mut commands = Vec::with_capacity(count);
    let mut next_id = first_id;

    for i in 0..count {
        if i % 5 == 4 && next_id > first_id + 8 {
            // Cancel an earlier order; a no-op if it traded away already
            let victim = first_id + ((i as u64 * 7) % (next_id - first_id));
            commands.push(Command::Cancel(CancelOrder { order_id: victim }));
            continue;
        }

        let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
        let offset = (i % 64) as u32;
        let crossing = i % 16 == 15;
        let price = match (side, crossing) {
            (Side::Bid, false) => MID - 1 - offset,
            (Side::Bid, true) => MID + 8,
            (Side::Ask, false) => MID + 1 + offset,
            (Side::Ask, true) => MID - 8,
        };

        commands.push(Command::Add(AddOrder {
            order_id: next_id,
            side,
            price,
            qty: 1 + (i % 100) as u32,
        }));
        next_id += 1;
    }

    commands
}

fn main() {
    env_logger::init();
    println!("Preparing latency report...");

    let mut replay = Replay::new(Book::default());
    replay.pin_to_core();
    replay.warm_up();

    let warmup = generate_commands(WARMUP_OPS, 0);
    let timed = generate_commands(TIMED_OPS, WARMUP_OPS as u64);

    println!("Warming up ({} ops)...", WARMUP_OPS);
    for cmd in &warmup {
        replay.apply(*cmd).expect("arena sized for the workload");
    }

    println!("Measuring {} ops...", TIMED_OPS);
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 10_000_000, 3).unwrap();
    let run_start = Instant::now();

    for cmd in &timed {
        let t0 = Instant::now();
        replay.apply(*cmd).expect("arena sized for the workload");
        let nanos = t0.elapsed().as_nanos() as u64;
        histogram.record(nanos.max(1)).unwrap();
    }

    let total = run_start.elapsed();
    let stats = replay.stats();

    println!();
    println!("Latency (ns):");
    println!("  p50:   {}", histogram.value_at_quantile(0.50));
    println!("  p90:   {}", histogram.value_at_quantile(0.90));
    println!("  p99:   {}", histogram.value_at_quantile(0.99));
    println!("  p99.9: {}", histogram.value_at_quantile(0.999));
    println!("  max:   {}", histogram.max());
    println!();
    println!(
        "Throughput: {:.0} ops/s over {:.3} s",
        TIMED_OPS as f64 / total.as_secs_f64(),
        total.as_secs_f64()
    );
    println!(
        "Workload: {} adds, {} cancels, {} fills, {} open at end",
        stats.adds,
        stats.cancels,
        stats.trades,
        replay.book().open_orders()
    );
}
