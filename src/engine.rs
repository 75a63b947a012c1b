//! Shared game contract: lifecycle status, the `Game` trait and the tick timer.

use std::time::{Duration, Instant};

/// Lifecycle of every engine: `Idle -> Running <-> Paused`, `Running -> GameOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Running,
    Paused,
    /// Terminal; only `reset` or `start` leaves it.
    GameOver,
}

impl Status {
    #[inline]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    #[inline]
    pub fn is_game_over(self) -> bool {
        self == Self::GameOver
    }

    /// `start()` semantics shared by all engines. Returns true when the caller
    /// must reset first (starting from game over).
    pub fn begin(&mut self) -> bool {
        let needs_reset = self.is_game_over();
        *self = Self::Running;
        needs_reset
    }

    /// `pause()` only parks a running game; idle and terminal states stay put.
    pub fn park(&mut self) {
        if self.is_running() {
            *self = Self::Paused;
        }
    }
}

/// Counters the caller diffs before/after an operation to spot transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub score: u32,
    pub lines: u32,
    pub status: Status,
}

/// Control surface every engine exposes to the app.
pub trait Game {
    fn start(&mut self);
    fn pause(&mut self);
    fn reset(&mut self);
    /// Clock-driven advance; a no-op unless running.
    fn tick(&mut self);
    /// Manual single step; works while idle or paused, never after game over.
    fn step(&mut self);
    fn status(&self) -> Status;
    fn tick_interval(&self) -> Duration;
    fn progress(&self) -> Progress;
}

/// Fixed-period timer owned by a running engine. Dropping it stops the ticks.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next_due: Instant,
}

impl Ticker {
    pub fn start(now: Instant, interval: Duration) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    /// True once per elapsed period. Re-arms with `interval`, which only takes
    /// effect for the period after this one.
    pub fn fire(&mut self, now: Instant, interval: Duration) -> bool {
        if now < self.next_due {
            return false;
        }
        self.interval = interval;
        self.next_due += self.interval;
        // Skip missed periods instead of bursting after a stall.
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }

    /// Time left until the next tick (for event poll timeouts).
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

/// Keeps `slot` in sync with the engine: a ticker exists iff the game runs.
pub fn sync_ticker(slot: &mut Option<Ticker>, game: &dyn Game, now: Instant) {
    match (game.status().is_running(), slot.is_some()) {
        (true, false) => *slot = Some(Ticker::start(now, game.tick_interval())),
        (false, true) => *slot = None,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_from_game_over_requests_reset() {
        let mut s = Status::GameOver;
        assert!(s.begin());
        assert_eq!(s, Status::Running);

        let mut s = Status::Paused;
        assert!(!s.begin());
        assert_eq!(s, Status::Running);
    }

    #[test]
    fn park_only_pauses_running() {
        let mut s = Status::Idle;
        s.park();
        assert_eq!(s, Status::Idle);

        let mut s = Status::GameOver;
        s.park();
        assert_eq!(s, Status::GameOver);

        let mut s = Status::Running;
        s.park();
        assert_eq!(s, Status::Paused);
    }

    #[test]
    fn ticker_fires_once_per_period() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut ticker = Ticker::start(t0, ms(100));
        assert!(!ticker.fire(t0 + ms(50), ms(100)));
        assert!(ticker.fire(t0 + ms(100), ms(100)));
        assert!(!ticker.fire(t0 + ms(150), ms(100)));
        assert!(ticker.fire(t0 + ms(200), ms(100)));
    }

    #[test]
    fn ticker_picks_up_new_interval_on_next_period() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut ticker = Ticker::start(t0, ms(100));
        // Speed-up reported at this tick; the already armed period is unaffected.
        assert!(ticker.fire(t0 + ms(100), ms(40)));
        assert_eq!(ticker.interval, ms(40));
        assert!(!ticker.fire(t0 + ms(139), ms(40)));
        assert!(ticker.fire(t0 + ms(140), ms(40)));
    }

    #[test]
    fn ticker_does_not_burst_after_stall() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut ticker = Ticker::start(t0, ms(100));
        assert!(ticker.fire(t0 + ms(1000), ms(100)));
        assert!(!ticker.fire(t0 + ms(1000), ms(100)));
    }
}
