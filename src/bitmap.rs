//! Level occupancy bitmap - one bit per price, packed in 64-bit words.
//!
//! Bit `p` is set iff the side's level at price `p` holds at least one
//! order. Best-price rediscovery is a masked scan of at most a handful of
//! words, ending in a single `leading_zeros`/`trailing_zeros` - lzcnt and
//! tzcnt on x86, so the common case is one or two instructions' worth of
//! work rather than a walk over the price range.

use crate::command::Price;

/// Occupancy bits for one side of the book.
pub struct LevelBitmap {
    words: Vec<u64>,
    /// Number of usable bits: `max_price + 1`.
    num_bits: u32,
}

impl LevelBitmap {
    /// Bitmap covering prices `0..num_bits`.
    pub fn new(num_bits: u32) -> Self {
        assert!(num_bits > 0, "bitmap must cover at least one price");
        let words = vec![0u64; (num_bits as usize + 63) / 64];
        Self { words, num_bits }
    }

    #[inline]
    pub fn set(&mut self, p: Price) {
        debug_assert!(p < self.num_bits);
        self.words[(p >> 6) as usize] |= 1u64 << (p & 63);
    }

    #[inline]
    pub fn clear(&mut self, p: Price) {
        debug_assert!(p < self.num_bits);
        self.words[(p >> 6) as usize] &= !(1u64 << (p & 63));
    }

    #[inline]
    pub fn get(&self, p: Price) -> bool {
        debug_assert!(p < self.num_bits);
        self.words[(p >> 6) as usize] & (1u64 << (p & 63)) != 0
    }

    /// Highest set bit at or below `p`, or 0 when nothing is set.
    ///
    /// A return of 0 is ambiguous between "bit 0 set" and "no bit set";
    /// the caller disambiguates against the level at price 0. That is
    /// exactly the bid-side sentinel convention of the book.
    #[inline]
    pub fn highest_at_or_below(&self, p: Price) -> Price {
        debug_assert!(p < self.num_bits);
        let mut index = (p >> 6) as usize;
        // Keep bits 0..=p of the starting word
        let mut word = self.words[index] & (!0u64 >> (63 - (p & 63)));

        loop {
            if word != 0 {
                return ((index as u32) << 6) + (63 - word.leading_zeros());
            }
            if index == 0 {
                return 0;
            }
            index -= 1;
            word = self.words[index];
        }
    }

    /// Lowest set bit at or above `p`, or `num_bits - 1` when nothing is
    /// set above. The ceiling return is the ask-side sentinel (`max_price`).
    #[inline]
    pub fn lowest_at_or_above(&self, p: Price) -> Price {
        debug_assert!(p < self.num_bits);
        let mut index = (p >> 6) as usize;
        // Drop bits below p of the starting word
        let mut word = self.words[index] & (!0u64 << (p & 63));

        loop {
            if word != 0 {
                return ((index as u32) << 6) + word.trailing_zeros();
            }
            index += 1;
            if index >= self.words.len() {
                return self.num_bits - 1;
            }
            word = self.words[index];
        }
    }
}
