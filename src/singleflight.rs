//! Single-flight deduplication of concurrent loads.
//!
//! A [`FlightGroup`] collapses concurrent calls for the same key into one
//! execution of the supplied task. The first caller for a key becomes the
//! leader and runs the task outside every lock; callers arriving while
//! the flight is up block on the flight's monitor and wake with a clone
//! of the leader's result.
//!
//! ```text
//!  thread A ──▶ run("k", load) ── leader, runs load() ──┐
//!  thread B ──▶ run("k", load) ── waits ◀── broadcast ──┤ result
//!  thread C ──▶ run("k", load) ── waits ◀───────────────┘ cloned out
//! ```
//!
//! At any instant at most one task per key value is executing. Once the
//! leader publishes the result and clears the table entry, the next
//! caller for that key starts a fresh flight; in the cache pipeline that
//! caller re-checks the freshly populated cache first and normally never
//! re-runs the load.
//!
//! Failures dedup the same way as successes: with `T = Result<..>` every
//! concurrent caller observes a clone of the one error.

use crate::bytes::ByteView;
use core::fmt;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// One in-flight load: a monitor that waiters block on until the leader
/// publishes the result.
struct Flight<T> {
    result: Mutex<Option<T>>,
    done: Condvar,
}

impl<T> Flight<T> {
    fn new() -> Self {
        Flight {
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }
}

/// Role a caller was assigned while the table lock was held.
enum Role<T> {
    Leader(Arc<Flight<T>>),
    Waiter(Arc<Flight<T>>),
}

/// A per-key single-flight coordinator.
///
/// # Examples
///
/// ```
/// use peercache::{ByteView, FlightGroup};
///
/// let flights: FlightGroup<u64> = FlightGroup::new();
/// let key = ByteView::from_static(b"k");
/// let value = flights.run(&key, || 42);
/// assert_eq!(value, 42);
/// ```
pub struct FlightGroup<T> {
    flights: Mutex<HashMap<ByteView, Arc<Flight<T>>>>,
}

impl<T: Clone> FlightGroup<T> {
    /// Creates a coordinator with no active flights.
    pub fn new() -> Self {
        FlightGroup {
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `task` for `key`, unless a flight for the same key is already
    /// up, in which case the caller blocks and receives a clone of that
    /// flight's result.
    ///
    /// The task runs on the calling thread with no locks held, so it may
    /// block (peer round-trips, slow loaders) without stalling flights
    /// for other keys. No reference to `key` is retained once the call
    /// returns.
    pub fn run(&self, key: &ByteView, task: impl FnOnce() -> T) -> T {
        let role = {
            let mut flights = self.flights.lock();
            match flights.get(key.as_slice()) {
                Some(flight) => Role::Waiter(Arc::clone(flight)),
                None => {
                    let flight = Arc::new(Flight::new());
                    flights.insert(key.clone(), Arc::clone(&flight));
                    Role::Leader(flight)
                }
            }
        };

        match role {
            Role::Waiter(flight) => {
                let mut result = flight.result.lock();
                loop {
                    if let Some(value) = result.as_ref() {
                        return value.clone();
                    }
                    // Broadcast wake; the loop re-checks against spurious
                    // wakeups.
                    flight.done.wait(&mut result);
                }
            }
            Role::Leader(flight) => {
                let value = task();
                {
                    let mut result = flight.result.lock();
                    *result = Some(value.clone());
                }
                flight.done.notify_all();
                self.flights.lock().remove(key.as_slice());
                value
            }
        }
    }

    /// Number of flights currently in the table.
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }
}

impl<T: Clone> Default for FlightGroup<T> {
    fn default() -> Self {
        FlightGroup::new()
    }
}

impl<T> fmt::Debug for FlightGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlightGroup")
            .field("in_flight", &self.flights.lock().len())
            .finish()
    }
}
