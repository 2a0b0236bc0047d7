//! Cooperative tick scheduling for the round engines.
//!
//! Engines never block. While a round is running an engine asks a
//! [`TickScheduler`] for its next tick and keeps the returned [`TickHandle`];
//! the driver later hands due ticks back to the engine that owns them.
//!
//! ## Ownership
//!
//! Each engine holds at most one pending handle. It cancels that handle when
//! the round resolves and when the engine is torn down, and it ignores any
//! tick whose handle is not the one it currently holds. A tick can therefore
//! never fire into a stale or already-resolved round.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arcade_execution::scheduler::{TickScheduler, TimerQueue};
//! use arcade_types::GameId;
//!
//! let mut timers = TimerQueue::new();
//! let handle = timers.schedule(GameId::Balloon, 16);
//!
//! // Nothing is due yet.
//! assert!(timers.drain_due(10).is_empty());
//!
//! // At 16ms the tick is handed back exactly once.
//! let due = timers.drain_due(16);
//! assert_eq!(due[0].handle, handle);
//! assert!(timers.drain_due(32).is_empty());
//! ```

use arcade_types::GameId;
use std::collections::{BTreeMap, HashMap};

/// Opaque identifier of a scheduled tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A tick that has come due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTick {
    pub handle: TickHandle,
    pub game: GameId,
    pub due_ms: u64,
}

/// Source of one-shot ticks.
///
/// Implementations may be backed by OS timers, a game loop, or the
/// [`TimerQueue`] below; engines only rely on the contract that a scheduled
/// tick is delivered at most once, never before `due_ms`, and never after it
/// has been cancelled.
pub trait TickScheduler {
    /// Request a tick for `game` at or after `due_ms`.
    fn schedule(&mut self, game: GameId, due_ms: u64) -> TickHandle;

    /// Cancel a pending tick. Returns false if it already fired or was cancelled.
    fn cancel(&mut self, handle: TickHandle) -> bool;
}

/// Deadline-ordered queue of pending ticks.
#[derive(Clone, Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    by_deadline: BTreeMap<(u64, TickHandle), GameId>,
    deadlines: HashMap<TickHandle, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending ticks.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn is_pending(&self, handle: TickHandle) -> bool {
        self.deadlines.contains_key(&handle)
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.by_deadline.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return every tick due at or before `now_ms`, earliest first.
    ///
    /// Ticks with the same deadline come back in scheduling order.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<ScheduledTick> {
        let mut due = Vec::new();
        loop {
            let Some((&(due_ms, handle), &game)) = self.by_deadline.first_key_value() else {
                break;
            };
            if due_ms > now_ms {
                break;
            }
            self.by_deadline.remove(&(due_ms, handle));
            self.deadlines.remove(&handle);
            due.push(ScheduledTick {
                handle,
                game,
                due_ms,
            });
        }
        due
    }
}

impl TickScheduler for TimerQueue {
    fn schedule(&mut self, game: GameId, due_ms: u64) -> TickHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = TickHandle(self.next_id);
        self.by_deadline.insert((due_ms, handle), game);
        self.deadlines.insert(handle, due_ms);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) -> bool {
        match self.deadlines.remove(&handle) {
            Some(due_ms) => {
                self.by_deadline.remove(&(due_ms, handle));
                true
            }
            None => false,
        }
    }
}
