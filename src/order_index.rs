//! Order index - direct-addressed lookup from order id to arena slot.
//!
//! Order ids are bounded small integers, so a flat array beats a hash
//! table: one predictable load per lookup and zero worst-case variance.
//! `NULL_INDEX` marks absent entries and is the sole liveness check for
//! arena slots.

use crate::arena::{ArenaIndex, NULL_INDEX};
use crate::command::OrderId;

pub struct OrderIndex {
    slots: Vec<ArenaIndex>,
}

impl OrderIndex {
    /// Table for ids `0..max_orders`, all initially absent.
    pub fn new(max_orders: OrderId) -> Self {
        Self {
            slots: vec![NULL_INDEX; max_orders as usize],
        }
    }

    /// Slot holding `id`, or `NULL_INDEX` when the id is absent or out of
    /// range. Out-of-range ids are tolerated here so that cancel can stay
    /// a silent no-op.
    #[inline]
    pub fn lookup(&self, id: OrderId) -> ArenaIndex {
        self.slots
            .get(id as usize)
            .copied()
            .unwrap_or(NULL_INDEX)
    }

    #[inline]
    pub fn contains(&self, id: OrderId) -> bool {
        self.lookup(id) != NULL_INDEX
    }

    /// Record `id -> slot`. The id must be in range; adds of out-of-range
    /// ids are a harness-contract violation.
    #[inline]
    pub fn insert(&mut self, id: OrderId, slot: ArenaIndex) {
        debug_assert!(slot != NULL_INDEX);
        self.slots[id as usize] = slot;
    }

    /// Mark `id` absent. Must happen before the slot is released so no
    /// live entry ever points at a freelisted slot.
    #[inline]
    pub fn remove(&mut self, id: OrderId) {
        self.slots[id as usize] = NULL_INDEX;
    }

    /// Exclusive upper bound on valid ids.
    #[inline]
    pub fn capacity(&self) -> OrderId {
        self.slots.len() as OrderId
    }
}
