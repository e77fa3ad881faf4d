//! The incremental reveal controller.
//!
//! A [`RevealSession`] discloses a fixed payload as a growing prefix on one
//! clock and blinks a caret flag on a second, faster clock. It is sans-io: the
//! session keeps explicit deadlines and the host calls [`RevealSession::poll`]
//! from its event loop, sleeping until [`RevealSession::next_deadline`]. A
//! superseded session is replaced wholesale by `start`, which retires both
//! clocks atomically — there is no callback that could fire late, and the
//! generation counter lets hosts that schedule external wake-ups detect stale
//! ones.

use std::time::Duration;
use std::time::Instant;

/// Caret blink period. Independent of the reveal cadence.
pub const CARET_BLINK_INTERVAL: Duration = Duration::from_millis(530);

/// Reveal cadence: characters disclosed per tick, and the tick period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealOptions {
    pub chunk_size: usize,
    pub tick_interval: Duration,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            tick_interval: Duration::from_millis(30),
        }
    }
}

impl RevealOptions {
    /// Both parameters must be positive; zero values are lifted to the
    /// smallest useful ones rather than rejected.
    fn sanitized(self) -> Self {
        Self {
            chunk_size: self.chunk_size.max(1),
            tick_interval: self.tick_interval.max(Duration::from_millis(1)),
        }
    }
}

/// What changed during a [`RevealSession::poll`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RevealPoll {
    pub prefix_changed: bool,
    pub caret_changed: bool,
}

impl RevealPoll {
    pub fn changed(self) -> bool {
        self.prefix_changed || self.caret_changed
    }
}

/// One reveal session over one payload.
///
/// The revealed prefix is tracked as a byte offset that always lands on a
/// `char` boundary and is monotonically non-decreasing within a session.
#[derive(Clone, Debug)]
pub struct RevealSession {
    source: String,
    revealed: usize,
    options: RevealOptions,
    active: bool,
    caret_visible: bool,
    next_reveal: Option<Instant>,
    next_blink: Option<Instant>,
    generation: u64,
}

impl Default for RevealSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealSession {
    /// An idle session with an empty payload. `generation` is 0 until the
    /// first `start`.
    pub fn new() -> Self {
        Self {
            source: String::new(),
            revealed: 0,
            options: RevealOptions::default(),
            active: false,
            caret_visible: false,
            next_reveal: None,
            next_blink: None,
            generation: 0,
        }
    }

    /// Begins a new session over `source`, replacing any running one.
    ///
    /// Both clocks are re-armed relative to `now`; the previous session's
    /// deadlines are gone, so an old wake-up can at worst cause a harmless
    /// early `poll`. An empty payload completes immediately: no ticks are
    /// scheduled and the caret never shows.
    pub fn start(&mut self, source: impl Into<String>, options: RevealOptions, now: Instant) {
        self.source = source.into();
        self.options = options.sanitized();
        self.revealed = 0;
        self.generation = self.generation.wrapping_add(1);

        if self.source.is_empty() {
            self.active = false;
            self.caret_visible = false;
            self.next_reveal = None;
            self.next_blink = None;
        } else {
            self.active = true;
            self.caret_visible = true;
            self.next_reveal = Some(now + self.options.tick_interval);
            self.next_blink = Some(now + CARET_BLINK_INTERVAL);
        }
    }

    /// Fires every tick of both clocks that has elapsed by `now`, in deadline
    /// order, and reports what changed.
    ///
    /// A late poll catches up: the prefix still converges and the caret keeps
    /// blink parity. Once the reveal completes, both clocks are disarmed and
    /// further polls are no-ops.
    pub fn poll(&mut self, now: Instant) -> RevealPoll {
        let mut out = RevealPoll::default();

        while self.active {
            let reveal_due = self.next_reveal.filter(|t| *t <= now);
            let blink_due = self.next_blink.filter(|t| *t <= now);
            match (reveal_due, blink_due) {
                (Some(r), Some(b)) if b < r => self.fire_blink(&mut out),
                (Some(_), _) => self.fire_reveal(&mut out),
                (None, Some(_)) => self.fire_blink(&mut out),
                (None, None) => break,
            }
        }

        out
    }

    /// The revealed prefix, `source[0..revealed]`.
    pub fn current_prefix(&self) -> &str {
        &self.source[..self.revealed]
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> RevealOptions {
        self.options
    }

    /// True while the prefix is still shorter than the payload.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// Session identifier; bumped by every `start`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The next instant `poll` has work to do, or `None` once the session is
    /// complete (nothing left to schedule).
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_reveal, self.next_blink) {
            (Some(r), Some(b)) => Some(r.min(b)),
            (r, b) => r.or(b),
        }
    }

    fn fire_reveal(&mut self, out: &mut RevealPoll) {
        let rest = &self.source[self.revealed..];
        let step = rest
            .char_indices()
            .nth(self.options.chunk_size)
            .map_or(rest.len(), |(i, _)| i);
        self.revealed += step;
        out.prefix_changed = true;

        if self.revealed >= self.source.len() {
            self.active = false;
            if self.caret_visible {
                self.caret_visible = false;
                out.caret_changed = true;
            }
            self.next_reveal = None;
            self.next_blink = None;
        } else if let Some(at) = self.next_reveal {
            self.next_reveal = Some(at + self.options.tick_interval);
        }
    }

    fn fire_blink(&mut self, out: &mut RevealPoll) {
        self.caret_visible = !self.caret_visible;
        out.caret_changed = true;
        if let Some(at) = self.next_blink {
            self.next_blink = Some(at + CARET_BLINK_INTERVAL);
        }
    }
}
