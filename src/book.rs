//! The limit order book: dense per-price levels, occupancy bitmaps, a
//! direct-addressed order index, and the matching loop.
//!
//! Adds and cancels are O(1); rediscovering the best quote after a level
//! empties is an O(1) amortized bitmap scan. The book allocates all of its
//! memory at construction and never touches the heap afterwards.

use crate::arena::{OrderArena, NULL_INDEX};
use crate::bitmap::LevelBitmap;
use crate::command::{
    BookError, OrderId, Price, Quantity, Side, Trade, TradeSink, MAX_ORDER_ID, MAX_PRICE,
};
use crate::order_index::OrderIndex;
use crate::price_level::PriceLevel;

/// Single-symbol limit order book over bounded integer ticks.
///
/// `best_bid` is the highest non-empty bid price, or 0 when there are no
/// bids; `best_ask` is the lowest non-empty ask price, or `max_price` when
/// there are no asks. The sentinels double as loop bounds in the matching
/// sweep, so an order resting exactly at the opposite side's sentinel
/// price (a bid at 0, an ask at `max_price`) is never matched against,
/// only cancelable.
pub struct Book {
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    bid_bits: LevelBitmap,
    ask_bits: LevelBitmap,
    index: OrderIndex,
    arena: OrderArena,
    best_bid: Price,
    best_ask: Price,
    max_price: Price,
}

impl Book {
    /// Book accepting prices `0..=max_price` and order ids `0..max_orders`,
    /// with arena capacity `max_orders`. Everything is allocated here.
    pub fn new(max_price: Price, max_orders: u32) -> Self {
        let levels = max_price as usize + 1;
        Self {
            bids: vec![PriceLevel::new(); levels],
            asks: vec![PriceLevel::new(); levels],
            bid_bits: LevelBitmap::new(max_price + 1),
            ask_bits: LevelBitmap::new(max_price + 1),
            index: OrderIndex::new(max_orders as OrderId),
            arena: OrderArena::new(max_orders),
            best_bid: 0,
            best_ask: max_price,
            max_price,
        }
    }

    /// Pre-fault the arena pages before a latency-sensitive run.
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    // ========================================================================
    // Add
    // ========================================================================

    /// Add a limit order, discarding any fills it produces.
    ///
    /// See [`Book::add_order_with`] for the contract.
    #[inline]
    pub fn add_order(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<(), BookError> {
        self.add_order_with(order_id, side, price, qty, &mut ())
    }

    /// Add a limit order, reporting each fill to `sink` in match order.
    ///
    /// If the order is marketable it sweeps the opposite side from the
    /// cached best, best price first and FIFO within a level. Residual
    /// quantity rests on the book.
    ///
    /// The caller must provide `price <= max_price`, `qty > 0`, an
    /// `order_id < max_orders` that is not currently live. Violations are
    /// checked with debug assertions only.
    ///
    /// # Errors
    /// [`BookError::ArenaExhausted`] when residual quantity cannot rest
    /// because the arena is out of slots. Fatal: the book is sized wrong
    /// for the workload. Matching already performed is not rolled back.
    pub fn add_order_with<S: TradeSink>(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
        sink: &mut S,
    ) -> Result<(), BookError> {
        debug_assert!(price <= self.max_price, "price out of range");
        debug_assert!(qty > 0, "quantity must be positive");
        debug_assert!(
            !self.index.contains(order_id),
            "order id is already live"
        );

        let remaining = match side {
            Side::Bid => self.sweep_asks(order_id, price, qty, sink),
            Side::Ask => self.sweep_bids(order_id, price, qty, sink),
        };

        if remaining > 0 {
            self.rest_order(order_id, side, price, remaining)?;
        }
        Ok(())
    }

    /// Consume asks from `best_ask` upward while the incoming buy crosses.
    fn sweep_asks<S: TradeSink>(
        &mut self,
        taker_id: OrderId,
        limit: Price,
        mut qty: Quantity,
        sink: &mut S,
    ) -> Quantity {
        while qty > 0 && limit >= self.best_ask && self.best_ask < self.max_price {
            let p = self.best_ask;
            if self.asks[p as usize].is_empty() {
                // Stale cache: the bit is already clear, walk to the true best
                self.best_ask = self.ask_bits.lowest_at_or_above(p + 1);
                continue;
            }
            qty = self.fill_level(Side::Ask, p, taker_id, qty, sink);
            if self.asks[p as usize].is_empty() {
                self.ask_bits.clear(p);
                self.best_ask = self.ask_bits.lowest_at_or_above(p + 1);
            }
        }
        qty
    }

    /// Consume bids from `best_bid` downward while the incoming sell crosses.
    fn sweep_bids<S: TradeSink>(
        &mut self,
        taker_id: OrderId,
        limit: Price,
        mut qty: Quantity,
        sink: &mut S,
    ) -> Quantity {
        while qty > 0 && limit <= self.best_bid && self.best_bid > 0 {
            let p = self.best_bid;
            if self.bids[p as usize].is_empty() {
                self.best_bid = self.bid_bits.highest_at_or_below(p - 1);
                continue;
            }
            qty = self.fill_level(Side::Bid, p, taker_id, qty, sink);
            if self.bids[p as usize].is_empty() {
                self.bid_bits.clear(p);
                self.best_bid = self.bid_bits.highest_at_or_below(p - 1);
            }
        }
        qty
    }

    /// Fill against the makers at one level, head first, until the level or
    /// the incoming quantity is exhausted. Returns the remaining quantity.
    fn fill_level<S: TradeSink>(
        &mut self,
        maker_side: Side,
        price: Price,
        taker_id: OrderId,
        mut qty: Quantity,
        sink: &mut S,
    ) -> Quantity {
        while qty > 0 {
            let level = match maker_side {
                Side::Bid => &self.bids[price as usize],
                Side::Ask => &self.asks[price as usize],
            };
            let maker_idx = level.head;
            if maker_idx == NULL_INDEX {
                break;
            }

            let maker = self.arena.get(maker_idx);
            let maker_id = maker.order_id;
            let maker_qty = maker.qty;

            let traded = qty.min(maker_qty);
            qty -= traded;

            sink.on_trade(Trade {
                maker_order_id: maker_id,
                taker_order_id: taker_id,
                price,
                qty: traded,
            });

            if traded == maker_qty {
                // Maker fully filled: unindex, detach, release
                self.index.remove(maker_id);
                match maker_side {
                    Side::Bid => self.bids[price as usize].pop_front(&mut self.arena),
                    Side::Ask => self.asks[price as usize].pop_front(&mut self.arena),
                };
                self.arena.release(maker_idx);
            } else {
                // Incoming exhausted against a larger maker
                self.arena.get_mut(maker_idx).qty = maker_qty - traded;
                match maker_side {
                    Side::Bid => self.bids[price as usize].subtract_qty(traded),
                    Side::Ask => self.asks[price as usize].subtract_qty(traded),
                }
                break;
            }
        }
        qty
    }

    /// Rest residual quantity on the book's own side.
    fn rest_order(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<(), BookError> {
        let slot = self.arena.alloc().ok_or(BookError::ArenaExhausted)?;
        {
            let node = self.arena.get_mut(slot);
            node.order_id = order_id;
            node.qty = qty;
            node.price = price;
            node.side = side;
        }

        match side {
            Side::Bid => {
                let was_empty = self.bids[price as usize].is_empty();
                self.bids[price as usize].push_back(&mut self.arena, slot);
                self.index.insert(order_id, slot);
                if was_empty {
                    self.bid_bits.set(price);
                }
                if price > self.best_bid {
                    self.best_bid = price;
                }
            }
            Side::Ask => {
                let was_empty = self.asks[price as usize].is_empty();
                self.asks[price as usize].push_back(&mut self.arena, slot);
                self.index.insert(order_id, slot);
                if was_empty {
                    self.ask_bits.set(price);
                }
                if price < self.best_ask {
                    self.best_ask = price;
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Cancel a resting order. Unknown, already-filled, and out-of-range
    /// ids are silent no-ops.
    pub fn cancel_order(&mut self, order_id: OrderId) {
        let slot = self.index.lookup(order_id);
        if slot == NULL_INDEX {
            return;
        }

        let node = self.arena.get(slot);
        let price = node.price;
        let side = node.side;

        self.index.remove(order_id);
        let emptied = match side {
            Side::Bid => self.bids[price as usize].remove(&mut self.arena, slot),
            Side::Ask => self.asks[price as usize].remove(&mut self.arena, slot),
        };
        self.arena.release(slot);

        if emptied {
            match side {
                Side::Bid => {
                    self.bid_bits.clear(price);
                    if price == self.best_bid {
                        // Bit is clear, so at-or-below walks to the next level down
                        self.best_bid = self.bid_bits.highest_at_or_below(price);
                    }
                }
                Side::Ask => {
                    self.ask_bits.clear(price);
                    if price == self.best_ask {
                        self.best_ask = self.ask_bits.lowest_at_or_above(price);
                    }
                }
            }
        }
    }

    // ========================================================================
    // Inspectors
    // ========================================================================

    /// Highest non-empty bid price, or 0 when there are no bids.
    #[inline]
    pub fn best_bid(&self) -> Price {
        self.best_bid
    }

    /// Lowest non-empty ask price, or `max_price` when there are no asks.
    #[inline]
    pub fn best_ask(&self) -> Price {
        self.best_ask
    }

    #[inline]
    pub fn max_price(&self) -> Price {
        self.max_price
    }

    /// Arena capacity, which is also the exclusive bound on valid order ids.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.arena.capacity()
    }

    #[inline]
    pub fn has_bids(&self) -> bool {
        !self.bids[self.best_bid as usize].is_empty()
    }

    #[inline]
    pub fn has_asks(&self) -> bool {
        !self.asks[self.best_ask as usize].is_empty()
    }

    /// Best-ask minus best-bid, when both sides have orders.
    pub fn spread(&self) -> Option<Price> {
        if self.has_bids() && self.has_asks() && self.best_ask >= self.best_bid {
            Some(self.best_ask - self.best_bid)
        } else {
            None
        }
    }

    /// Aggregate quantity and order count resting at one price.
    #[inline]
    pub fn depth_at(&self, side: Side, price: Price) -> (u64, u32) {
        let level = match side {
            Side::Bid => &self.bids[price as usize],
            Side::Ask => &self.asks[price as usize],
        };
        (level.total_qty, level.count)
    }

    /// Ladder of up to `max_levels` non-empty levels from the best outward:
    /// bids descending, asks ascending.
    pub fn depth(&self, side: Side, max_levels: usize) -> Vec<(Price, u64)> {
        let mut out = Vec::with_capacity(max_levels);
        match side {
            Side::Bid => {
                let mut p = self.best_bid;
                while out.len() < max_levels {
                    let level = &self.bids[p as usize];
                    if level.is_empty() {
                        break;
                    }
                    out.push((p, level.total_qty));
                    if p == 0 {
                        break;
                    }
                    p = self.bid_bits.highest_at_or_below(p - 1);
                }
            }
            Side::Ask => {
                let mut p = self.best_ask;
                while out.len() < max_levels {
                    let level = &self.asks[p as usize];
                    if level.is_empty() {
                        break;
                    }
                    out.push((p, level.total_qty));
                    if p >= self.max_price {
                        break;
                    }
                    p = self.ask_bits.lowest_at_or_above(p + 1);
                }
            }
        }
        out
    }

    /// Whether `order_id` is currently resting on the book.
    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.index.contains(order_id)
    }

    /// Number of orders currently resting on the book.
    #[inline]
    pub fn open_orders(&self) -> u32 {
        self.arena.allocated()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Fingerprint of the visible book state, for determinism tests.
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.best_bid.hash(&mut hasher);
        self.best_ask.hash(&mut hasher);
        self.arena.allocated().hash(&mut hasher);
        self.depth(Side::Bid, 16).hash(&mut hasher);
        self.depth(Side::Ask, 16).hash(&mut hasher);
        hasher.finish()
    }

    /// Full-walk consistency check for tests and debugging; panics on the
    /// first violated invariant. O(price range + resting orders).
    pub fn validate(&self) {
        let mut linked_total: u32 = 0;

        for (side, levels, bits) in [
            (Side::Bid, &self.bids, &self.bid_bits),
            (Side::Ask, &self.asks, &self.ask_bits),
        ] {
            for p in 0..=self.max_price {
                let level = &levels[p as usize];
                assert_eq!(
                    bits.get(p),
                    !level.is_empty(),
                    "bitmap bit {} disagrees with level occupancy on {:?}",
                    p,
                    side
                );
                if level.is_empty() {
                    assert_eq!(level.tail, NULL_INDEX);
                    assert_eq!(level.total_qty, 0);
                    assert_eq!(level.count, 0);
                    continue;
                }

                let mut sum: u64 = 0;
                let mut count: u32 = 0;
                let mut prev = NULL_INDEX;
                let mut cursor = level.head;
                while cursor != NULL_INDEX {
                    let node = self.arena.get(cursor);
                    assert_eq!(node.prev, prev, "prev link broken at price {}", p);
                    assert_eq!(node.price, p, "record price disagrees with its level");
                    assert_eq!(node.side, side, "record side disagrees with its book half");
                    assert!(node.qty > 0, "zero-quantity record left on the book");
                    assert_eq!(
                        self.index.lookup(node.order_id),
                        cursor,
                        "order index does not point at linked record {}",
                        node.order_id
                    );
                    sum += node.qty as u64;
                    count += 1;
                    prev = cursor;
                    cursor = node.next;
                }
                assert_eq!(level.tail, prev, "tail does not match last reachable record");
                assert_eq!(level.total_qty, sum, "aggregate quantity drifted at price {}", p);
                assert_eq!(level.count, count);
                linked_total += count;
            }
        }

        // Linked records and the freelist partition the arena
        assert_eq!(
            linked_total,
            self.arena.allocated(),
            "linked record count disagrees with arena allocation count"
        );

        // Every live index entry points at a record carrying its id
        let mut indexed: u32 = 0;
        for id in 0..self.index.capacity() {
            let slot = self.index.lookup(id);
            if slot != NULL_INDEX {
                assert_eq!(self.arena.get(slot).order_id, id);
                indexed += 1;
            }
        }
        assert_eq!(indexed, linked_total);

        // Cached bests match the bitmaps
        if self.has_bids() {
            assert_eq!(self.best_bid, self.bid_bits.highest_at_or_below(self.max_price));
        } else {
            assert_eq!(self.best_bid, 0);
        }
        if self.has_asks() {
            assert_eq!(self.best_ask, self.ask_bits.lowest_at_or_above(0));
        } else {
            assert_eq!(self.best_ask, self.max_price);
        }

        // Uncrossed, except for orders resting at the opposite sentinel
        assert!(
            self.best_bid < self.best_ask || self.best_ask == 0 || self.best_bid == self.max_price,
            "book is crossed: bid {} ask {}",
            self.best_bid,
            self.best_ask
        );
    }
}

impl Default for Book {
    /// Full-sized book: prices to [`MAX_PRICE`], ids below
    /// [`MAX_ORDER_ID`].
    fn default() -> Self {
        Self::new(MAX_PRICE, MAX_ORDER_ID as u32)
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("best_bid", &self.best_bid)
            .field("best_ask", &self.best_ask)
            .field("open_orders", &self.arena.allocated())
            .field("max_price", &self.max_price)
            .finish()
    }
}
