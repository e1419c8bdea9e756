//! # tick-lob
//!
//! A single-symbol limit order book over bounded integer ticks, built for
//! low per-event latency on replayed add/cancel streams.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one thread owns the book exclusively (no locks)
//! - **O(1) Operations**: add, cancel, and each match step run in constant time
//! - **Direct Addressing**: prices and order ids index dense arrays; no hashing
//! - **Arena Allocation**: no heap allocation in the hot path
//! - **Bitmap Best Tracking**: occupancy bits plus hardware bit-scan make
//!   best-quote rediscovery O(1) amortized instead of O(price range)
//!
//! ## Architecture
//!
//! ```text
//! [Event File] --> [EventParser] --> [Replay Driver] --> [Book]
//!                                                          |
//!                                                    [TradeSink]
//! ```

pub mod arena;
pub mod bitmap;
pub mod book;
pub mod command;
pub mod order_index;
pub mod price_level;
pub mod replay;

// Re-exports for convenience
pub use arena::{ArenaIndex, OrderArena, OrderNode, NULL_INDEX};
pub use bitmap::LevelBitmap;
pub use book::Book;
pub use command::{
    AddOrder, BookError, CancelOrder, Command, OrderId, Price, Quantity, Side, Trade, TradeSink,
    MAX_ORDER_ID, MAX_PRICE,
};
pub use order_index::OrderIndex;
pub use price_level::PriceLevel;
pub use replay::{EventParser, Replay, ReplayStats};
