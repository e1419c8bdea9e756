//! Live ladder viewer: a synthetic random-walk feed drives the book while
//! the terminal shows the top of both sides.
//!
//! Everything runs on one thread - the feed is applied in batches between
//! redraws, so the book never sees a second writer. Press `q` to quit.

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io;
use std::time::{Duration, Instant};
use tick_lob::{AddOrder, Book, CancelOrder, Command, Replay, Side};

const CAPACITY: u32 = 1_000_000;
const BATCH: u64 = 2_000;
const LADDER_DEPTH: usize = 12;

/// Deterministic feed: an LCG random walk for the mid price, orders spread
/// around it, roughly a third of events canceling an earlier order.
struct SyntheticFeed {
    rng: u64,
    next_id: u64,
    mid: u32,
    max_price: u32,
}

impl SyntheticFeed {
    fn new(max_price: u32) -> Self {
        Self {
            rng: 0x9E37_79B9_7F4A_7C15,
            next_id: 0,
            mid: max_price / 2,
            max_price,
        }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.rng = self
            .rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        // Low LCG bits are weak; use the high half
        self.rng >> 32
    }

    fn next_command(&mut self) -> Command {
        let r = self.next_u64();

        if r % 100 < 30 && self.next_id > 0 {
            let victim = self.next_u64() % self.next_id;
            return Command::Cancel(CancelOrder { order_id: victim });
        }

        // Occasional drift keeps the ladder moving
        if r % 50 == 0 {
            let drift = (self.next_u64() % 11) as i64 - 5;
            let mid = (self.mid as i64 + drift).clamp(100, self.max_price as i64 - 100);
            self.mid = mid as u32;
        }

        let side = if r % 2 == 0 { Side::Bid } else { Side::Ask };
        let dist = (self.next_u64() % 40) as u32;
        let price = match side {
            Side::Bid => self.mid - 1 - dist,
            Side::Ask => self.mid + 1 + dist,
        };
        let qty = 1 + (self.next_u64() % 400) as u32;

        let order_id = self.next_id % CAPACITY as u64;
        self.next_id += 1;

        Command::Add(AddOrder { order_id, side, price, qty })
    }
}

fn ladder_text(levels: &[(u32, u64)], style: Style) -> Vec<Line<'static>> {
    let max_qty = levels.iter().map(|&(_, q)| q).max().unwrap_or(1).max(1);
    levels
        .iter()
        .map(|&(price, qty)| {
            let bar_len = ((qty as f64 / max_qty as f64) * 30.0) as usize;
            Line::from(Span::styled(
                format!("{:>7}  {:<30} {:>8}", price, "█".repeat(bar_len), qty),
                style,
            ))
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut replay = Replay::new(Book::new(tick_lob::MAX_PRICE, CAPACITY));
    replay.warm_up();
    let mut feed = SyntheticFeed::new(tick_lob::MAX_PRICE);

    let started = Instant::now();
    let mut applied: u64 = 0;

    let result: Result<(), Box<dyn std::error::Error>> = 'ui: loop {
        for _ in 0..BATCH {
            match replay.apply(feed.next_command()) {
                Ok(()) => applied += 1,
                Err(e) => break 'ui Err(e.into()),
            }
        }

        let book = replay.book();
        let stats = replay.stats();
        let mut asks = book.depth(Side::Ask, LADDER_DEPTH);
        asks.reverse(); // highest ask on top, best ask adjacent to the bids
        let bids = book.depth(Side::Bid, LADDER_DEPTH);

        let header = format!(
            " ops {:>10}  |  rate {:>9.0}/s  |  open {:>7}  |  fills {:>9}  |  spread {:?} ",
            applied,
            applied as f64 / started.elapsed().as_secs_f64().max(1e-9),
            book.open_orders(),
            stats.trades,
            book.spread(),
        );
        let ask_lines = ladder_text(&asks, Style::default().fg(Color::Red));
        let bid_lines = ladder_text(&bids, Style::default().fg(Color::Green));

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(LADDER_DEPTH as u16 + 2),
                    Constraint::Min(LADDER_DEPTH as u16 + 2),
                ])
                .split(f.size());

            f.render_widget(
                Paragraph::new(header.clone())
                    .block(Block::default().borders(Borders::ALL).title(" tick-lob ")),
                chunks[0],
            );
            f.render_widget(
                Paragraph::new(ask_lines.clone())
                    .block(Block::default().borders(Borders::ALL).title(" asks ")),
                chunks[1],
            );
            f.render_widget(
                Paragraph::new(bid_lines.clone())
                    .block(Block::default().borders(Borders::ALL).title(" bids ")),
                chunks[2],
            );
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') || key.code == KeyCode::Esc {
                    break 'ui Ok(());
                }
            }
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
