//! Command and trade types shared between the book and its drivers.
//!
//! Prices are tick indices, quantities are share counts; both are bounded
//! small integers so the book can direct-address everything.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tick index. Valid prices are `0..=max_price` of the owning book.
pub type Price = u32;

/// Order quantity. Per-level aggregates are widened to u64 by the book.
pub type Quantity = u32;

/// Client-assigned order id. Valid ids are `0..max_orders` of the owning book.
pub type OrderId = u64;

/// Inclusive price bound used by [`crate::Book::default`].
pub const MAX_PRICE: Price = 25_000;

/// Exclusive order-id bound (and arena capacity) used by [`crate::Book::default`].
pub const MAX_ORDER_ID: OrderId = 3_000_000;

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

// ============================================================================
// Input Commands
// ============================================================================

/// Add a new limit order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOrder {
    /// External order ID (client-assigned, unique among live orders)
    pub order_id: OrderId,
    /// Order side (bid/ask)
    pub side: Side,
    /// Limit price in ticks
    pub price: Price,
    /// Order quantity (must be positive)
    pub qty: Quantity,
}

/// Cancel an existing order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    /// Order ID to cancel
    pub order_id: OrderId,
}

/// Input commands from the replay driver
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Command {
    /// Add a new limit order
    Add(AddOrder),
    /// Cancel an existing order
    Cancel(CancelOrder),
}

// ============================================================================
// Trades
// ============================================================================

/// A single fill produced during the matching phase of an add.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Resting (passive) order ID
    pub maker_order_id: OrderId,
    /// Incoming (aggressive) order ID
    pub taker_order_id: OrderId,
    /// Execution price (the maker's level)
    pub price: Price,
    /// Executed quantity
    pub qty: Quantity,
}

/// Consumer of fills. The book calls this synchronously, in match order,
/// during [`crate::Book::add_order_with`]; sinks never observe or alter
/// book state.
pub trait TradeSink {
    fn on_trade(&mut self, trade: Trade);
}

/// Discards all trades (the default for replay throughput runs).
impl TradeSink for () {
    #[inline]
    fn on_trade(&mut self, _trade: Trade) {}
}

/// Collects trades, for tests and tools.
impl TradeSink for Vec<Trade> {
    #[inline]
    fn on_trade(&mut self, trade: Trade) {
        self.push(trade);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// The only internal failure the book can report.
///
/// Everything else is either a silent no-op (cancel of an unknown id) or a
/// harness-contract violation checked by debug assertions only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookError {
    /// The order arena freelist is empty. Fatal configuration error: the
    /// arena must be sized for the peak number of live orders.
    ArenaExhausted,
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::ArenaExhausted => write!(f, "order arena exhausted"),
        }
    }
}

impl std::error::Error for BookError {}
