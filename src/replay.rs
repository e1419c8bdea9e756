//! Replay driver - feeds a recorded event stream through a book.
//!
//! The wire format is line-oriented with comma-separated integer fields:
//!
//! ```text
//! A,B,17,100,10      add: side B/S, order id, price, quantity
//! C,B,17             cancel: side is carried but ignored
//! ```
//!
//! Parsing walks the raw bytes once with no per-line allocation. Lines the
//! parser cannot make sense of are skipped and counted; adds that violate
//! the book's preconditions (out-of-range price or id, zero quantity,
//! duplicate live id) are rejected here so the core never sees them.

use crate::book::Book;
use crate::command::{AddOrder, BookError, CancelOrder, Command, OrderId, Side, Trade, TradeSink};
use log::warn;

/// Parse a decimal field. Rejects empty and non-digit bytes.
#[inline]
fn parse_int(field: &[u8]) -> Option<u64> {
    if field.is_empty() {
        return None;
    }
    let mut val: u64 = 0;
    for &b in field {
        if !b.is_ascii_digit() {
            return None;
        }
        val = val.wrapping_mul(10).wrapping_add((b - b'0') as u64);
    }
    Some(val)
}

fn parse_line(line: &[u8]) -> Option<Command> {
    let mut fields = line.split(|&b| b == b',');
    let typ = fields.next()?;
    let side = fields.next()?;
    if typ.len() != 1 || side.len() != 1 {
        return None;
    }
    let order_id = parse_int(fields.next()?)?;

    match typ[0] {
        b'A' => {
            let side = match side[0] {
                b'B' => Side::Bid,
                b'S' => Side::Ask,
                _ => return None,
            };
            let price = parse_int(fields.next()?)?;
            let qty = parse_int(fields.next()?)?;
            if price > u32::MAX as u64 || qty > u32::MAX as u64 {
                return None;
            }
            Some(Command::Add(AddOrder {
                order_id,
                side,
                price: price as u32,
                qty: qty as u32,
            }))
        }
        b'C' => Some(Command::Cancel(CancelOrder { order_id })),
        _ => None,
    }
}

/// Zero-copy iterator over the commands of a raw event buffer.
///
/// Blank lines are ignored; anything else that fails to parse is counted
/// in [`EventParser::malformed`] and skipped with a warning.
pub struct EventParser<'a> {
    buf: &'a [u8],
    pos: usize,
    malformed: u64,
}

impl<'a> EventParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            malformed: 0,
        }
    }

    /// Lines skipped so far because they did not parse.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}

impl Iterator for EventParser<'_> {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        while self.pos < self.buf.len() {
            let rest = &self.buf[self.pos..];
            let line_end = rest
                .iter()
                .position(|&b| b == b'\n')
                .unwrap_or(rest.len());
            let mut line = &rest[..line_end];
            self.pos += line_end + 1;

            if let [head @ .., b'\r'] = line {
                line = head;
            }
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Some(cmd) => return Some(cmd),
                None => {
                    self.malformed += 1;
                    warn!("skipping malformed event line: {:?}", String::from_utf8_lossy(line));
                }
            }
        }
        None
    }
}

/// Counters accumulated over a replay run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Adds accepted by the book
    pub adds: u64,
    /// Cancels applied (including silent no-ops)
    pub cancels: u64,
    /// Individual fills produced by matching
    pub trades: u64,
    /// Total quantity traded
    pub traded_qty: u64,
    /// Adds the driver rejected before they reached the book
    pub rejected: u64,
    /// Lines that did not parse
    pub malformed: u64,
}

struct FillCounter {
    fills: u64,
    qty: u64,
}

impl TradeSink for FillCounter {
    #[inline]
    fn on_trade(&mut self, trade: Trade) {
        self.fills += 1;
        self.qty += trade.qty as u64;
    }
}

/// Owns a book and drives it from a command stream.
pub struct Replay {
    book: Book,
    stats: ReplayStats,
}

impl Replay {
    pub fn new(book: Book) -> Self {
        Self {
            book,
            stats: ReplayStats::default(),
        }
    }

    /// Pin the current thread to the last available CPU core, which is the
    /// one most likely isolated from OS housekeeping.
    pub fn pin_to_core(&self) {
        if let Some(core_ids) = core_affinity::get_core_ids() {
            if let Some(last_core) = core_ids.last() {
                core_affinity::set_for_current(*last_core);
            }
        }
    }

    /// Pre-fault book memory before timing anything.
    pub fn warm_up(&mut self) {
        self.book.warm_up();
    }

    /// Apply one command, enforcing the book's add preconditions.
    pub fn apply(&mut self, cmd: Command) -> Result<(), BookError> {
        match cmd {
            Command::Add(add) => {
                if add.qty == 0
                    || add.price > self.book.max_price()
                    || add.order_id >= self.book.capacity() as OrderId
                    || self.book.contains_order(add.order_id)
                {
                    self.stats.rejected += 1;
                    warn!("rejecting add outside book limits: {:?}", add);
                    return Ok(());
                }
                let mut fills = FillCounter { fills: 0, qty: 0 };
                self.book
                    .add_order_with(add.order_id, add.side, add.price, add.qty, &mut fills)?;
                self.stats.adds += 1;
                self.stats.trades += fills.fills;
                self.stats.traded_qty += fills.qty;
            }
            Command::Cancel(cancel) => {
                self.book.cancel_order(cancel.order_id);
                self.stats.cancels += 1;
            }
        }
        Ok(())
    }

    /// Parse and apply an entire event buffer.
    pub fn run(&mut self, input: &[u8]) -> Result<ReplayStats, BookError> {
        let mut parser = EventParser::new(input);
        for cmd in parser.by_ref() {
            self.apply(cmd)?;
        }
        self.stats.malformed += parser.malformed();
        Ok(self.stats)
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut Book {
        &mut self.book
    }
}
