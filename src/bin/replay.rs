//! Replay a recorded market-data file through the book and report timing.
//!
//! Usage: `replay <market_data_file.csv>`

use std::time::Instant;
use tick_lob::{Book, Replay, Side};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: replay <market_data_file.csv>");
            std::process::exit(1);
        }
    };

    let data = match std::fs::read(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let mut replay = Replay::new(Book::default());
    replay.pin_to_core();
    replay.warm_up();

    let start = Instant::now();
    let stats = match replay.run(&data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("replay aborted: {}", e);
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    let events = stats.adds + stats.cancels;
    let rate = events as f64 / elapsed.as_secs_f64();

    println!("Processed {} events in {:.3} ms", events, elapsed.as_secs_f64() * 1e3);
    println!("  Throughput: {:.0} events/s", rate);
    println!(
        "  Adds: {}  Cancels: {}  Fills: {} ({} qty)",
        stats.adds, stats.cancels, stats.trades, stats.traded_qty
    );
    if stats.rejected > 0 || stats.malformed > 0 {
        println!(
            "  Rejected: {}  Malformed lines: {}",
            stats.rejected, stats.malformed
        );
    }

    let book = replay.book();
    println!(
        "  Final book: {} open orders, best bid {:?}, best ask {:?}",
        book.open_orders(),
        book.has_bids().then(|| book.best_bid()),
        book.has_asks().then(|| book.best_ask()),
    );
    if !book.depth(Side::Bid, 1).is_empty() || !book.depth(Side::Ask, 1).is_empty() {
        println!("  Spread: {:?}", book.spread());
    }
}
