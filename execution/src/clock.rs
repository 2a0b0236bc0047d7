//! Time sources for the round engines.
//!
//! Engines never read the wall clock themselves; every operation takes `now_ms`
//! from a [`Clock`] owned by the caller. Milliseconds are measured from an
//! arbitrary origin and must never go backwards.

use chrono::{Local, NaiveDate};
use std::cell::Cell;
use std::time::Instant;

pub trait Clock {
    /// Monotonic milliseconds since the clock's origin.
    fn now_ms(&self) -> u64;

    /// Local calendar date, used for daily limit roll-over.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock backed [`Clock`].
#[derive(Clone, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually advanced [`Clock`] for tests and simulation.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now_ms: Cell<u64>,
    today: Cell<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            now_ms: Cell::new(0),
            today: Cell::new(today),
        }
    }

    /// Move time forward by `ms`.
    pub fn advance(&self, ms: u64) -> u64 {
        let next = self.now_ms.get().saturating_add(ms);
        self.now_ms.set(next);
        next
    }

    /// Jump to `now_ms`; earlier values are ignored so time stays monotonic.
    pub fn set(&self, now_ms: u64) {
        if now_ms > self.now_ms.get() {
            self.now_ms.set(now_ms);
        }
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn today(&self) -> NaiveDate {
        self.today.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
