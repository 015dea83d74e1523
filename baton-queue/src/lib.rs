//! # baton-queue
//!
//! A bounded MPMC blocking queue built on a single mutex and two condition
//! variables, for producer/consumer coordination where correctness and
//! simplicity matter more than raw throughput.
//!
//! ## Design
//!
//! All state lives behind one [`parking_lot::Mutex`]; producers wait on a
//! `not_full` condition and consumers wait on a `not_empty` condition:
//!
//! ```text
//! put:  lock -> while full  { wait not_full  } -> push tail -> signal not_empty
//! get:  lock -> while empty { wait not_empty } -> pop head  -> signal not_full
//! ```
//!
//! Every wait sits inside a predicate loop, so spurious wakeups and wakeups
//! raced away by another thread are handled by re-checking the condition.
//! Timed variants compute one absolute deadline at call entry and wait only
//! for the remaining budget on every retry, so total blocked time never
//! exceeds the requested bound no matter how often the thread wakes.
//!
//! There are no lock-free fast paths and no spin phases: one queue, one
//! mutex, two condvars.
//!
//! ## Example
//!
//! ```
//! use std::thread;
//!
//! use baton_queue::BlockingQueue;
//!
//! let queue = BlockingQueue::with_capacity(4);
//! let consumer_queue = queue.clone();
//!
//! let consumer = thread::spawn(move || {
//!     // Blocks until the producer below has put something.
//!     consumer_queue.get().unwrap()
//! });
//!
//! queue.put("hello").unwrap();
//! assert_eq!(consumer.join().unwrap(), "hello");
//! ```
//!
//! ## Operation families
//!
//! Each direction comes in three forms:
//!
//! | Blocking | Timed | Non-blocking |
//! |----------|-------|--------------|
//! | [`put`](BlockingQueue::put) | [`put_timeout`](BlockingQueue::put_timeout) | [`try_put`](BlockingQueue::try_put) |
//! | [`get`](BlockingQueue::get) | [`get_timeout`](BlockingQueue::get_timeout) | [`try_get`](BlockingQueue::try_get) |
//!
//! A timed call that runs out its deadline reports the same failure as the
//! non-blocking form (`Full` / `Empty`): hitting the deadline is a blocking
//! bound being reached, not a distinct error condition. Failed inserts hand
//! the value back inside the error so nothing is lost.
//!
//! ## Closing
//!
//! Dropping the last handle reclaims the queue, but a handle blocked inside
//! `put` or `get` keeps the queue alive and would otherwise wait forever.
//! [`close`](BlockingQueue::close) is the explicit teardown: it wakes every
//! blocked waiter on both conditions. After close, inserts fail immediately
//! while removes first drain whatever was already queued:
//!
//! ```
//! use baton_queue::BlockingQueue;
//!
//! let queue = BlockingQueue::with_capacity(4);
//! queue.put(1).unwrap();
//! queue.put(2).unwrap();
//! queue.close();
//!
//! assert!(queue.put(3).is_err());
//! assert_eq!(queue.get().unwrap(), 1);
//! assert_eq!(queue.get().unwrap(), 2);
//! assert!(queue.get().is_err());
//! ```
//!
//! ## When to use this
//!
//! Use `baton-queue` when:
//! - Any number of threads produce and consume through one shared queue
//! - You need back pressure (bounded capacity, blocking or timed inserts)
//! - You want waiters released deterministically at teardown
//!
//! Consider alternatives when:
//! - You have exactly one producer and one consumer and latency is the
//!   priority -> a lock-free SPSC ring
//! - You need `select!` over several queues -> `crossbeam-channel`
//! - You need async/await -> an async channel

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Everything the mutex guards.
///
/// `items` and `closed` are only ever read or written while holding the
/// lock; the capacity is immutable and lives outside the guarded state.
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    /// Signaled once per insert; consumers wait here while the queue is empty.
    not_empty: Condvar,
    /// Signaled once per remove; producers wait here while the queue is full.
    not_full: Condvar,
    capacity: usize,
}

/// A bounded MPMC blocking queue.
///
/// `BlockingQueue` is a handle: cloning it is cheap and every clone operates
/// on the same underlying queue. Hand clones to as many producer and
/// consumer threads as you like.
///
/// # Example
///
/// ```
/// use std::thread;
///
/// use baton_queue::BlockingQueue;
///
/// let queue = BlockingQueue::with_capacity(2);
///
/// let producer_queue = queue.clone();
/// let producer = thread::spawn(move || {
///     for i in 0..10 {
///         producer_queue.put(i).unwrap();
///     }
/// });
///
/// for i in 0..10 {
///     assert_eq!(queue.get().unwrap(), i);
/// }
///
/// producer.join().unwrap();
/// ```
pub struct BlockingQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BlockingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BlockingQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    ///
    /// # Example
    ///
    /// ```
    /// use baton_queue::BlockingQueue;
    ///
    /// let queue = BlockingQueue::<String>::with_capacity(16);
    /// assert_eq!(queue.capacity(), 16);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    items: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Inserts a value at the tail, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(PutError(value))` if the queue is closed, whether it was
    /// already closed on entry or was closed while this call was waiting for
    /// space. The queue is left untouched in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use baton_queue::BlockingQueue;
    ///
    /// let queue = BlockingQueue::with_capacity(2);
    ///
    /// queue.put(1).unwrap();
    /// queue.put(2).unwrap();
    /// // a third `put` would block here until a `get` frees a slot
    ///
    /// assert_eq!(queue.get().unwrap(), 1);
    /// ```
    pub fn put(&self, value: T) -> Result<(), PutError<T>> {
        let mut state = self.shared.state.lock();
        loop {
            if state.closed {
                return Err(PutError(value));
            }
            if state.items.len() < self.shared.capacity {
                break;
            }
            self.shared.not_full.wait(&mut state);
        }
        state.items.push_back(value);
        drop(state);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Inserts a value, blocking at most `timeout` while the queue is full.
    ///
    /// The deadline is fixed once at call entry; however often the wait is
    /// woken and retried, the total blocked time stays within `timeout`.
    /// A zero `timeout` makes this equivalent to [`try_put`](Self::try_put).
    ///
    /// # Errors
    ///
    /// Returns `Err(TryPutError::Full(value))` if the queue is still full
    /// when the deadline is reached - deliberately the same error a
    /// non-blocking insert reports, since running out the clock is just the
    /// blocking bound being hit. Returns `Err(TryPutError::Closed(value))`
    /// if the queue is closed.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use baton_queue::{BlockingQueue, TryPutError};
    ///
    /// let queue = BlockingQueue::with_capacity(1);
    /// queue.put("first").unwrap();
    ///
    /// let err = queue.put_timeout("second", Duration::from_millis(10));
    /// assert!(matches!(err, Err(TryPutError::Full("second"))));
    /// ```
    pub fn put_timeout(&self, value: T, timeout: Duration) -> Result<(), TryPutError<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if state.closed {
                return Err(TryPutError::Closed(value));
            }
            if state.items.len() < self.shared.capacity {
                break;
            }
            if self
                .shared
                .not_full
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.items.len() >= self.shared.capacity
            {
                return Err(if state.closed {
                    TryPutError::Closed(value)
                } else {
                    TryPutError::Full(value)
                });
            }
        }
        state.items.push_back(value);
        drop(state);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Inserts a value only if a slot is free right now. Never waits.
    ///
    /// # Errors
    ///
    /// Returns `Err(TryPutError::Full(value))` if the queue is at capacity,
    /// or `Err(TryPutError::Closed(value))` if it is closed. The rejected
    /// value rides back in the error either way.
    ///
    /// # Example
    ///
    /// ```
    /// use baton_queue::{BlockingQueue, TryPutError};
    ///
    /// let queue = BlockingQueue::with_capacity(1);
    ///
    /// assert!(queue.try_put(1).is_ok());
    /// assert!(matches!(queue.try_put(2), Err(TryPutError::Full(2))));
    /// ```
    pub fn try_put(&self, value: T) -> Result<(), TryPutError<T>> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(TryPutError::Closed(value));
        }
        if state.items.len() >= self.shared.capacity {
            return Err(TryPutError::Full(value));
        }
        state.items.push_back(value);
        drop(state);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Removes and returns the head item, blocking while the queue is empty.
    ///
    /// After [`close`](Self::close), remaining items are still handed out in
    /// order; the error only appears once the queue is closed *and* drained.
    ///
    /// # Errors
    ///
    /// Returns `Err(GetError)` if the queue is closed and empty.
    ///
    /// # Example
    ///
    /// ```
    /// use std::thread;
    ///
    /// use baton_queue::BlockingQueue;
    ///
    /// let queue = BlockingQueue::with_capacity(4);
    /// let producer_queue = queue.clone();
    ///
    /// thread::spawn(move || {
    ///     producer_queue.put(42).unwrap();
    /// });
    ///
    /// assert_eq!(queue.get().unwrap(), 42);
    /// ```
    pub fn get(&self) -> Result<T, GetError> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(value) = state.items.pop_front() {
                drop(state);
                self.shared.not_full.notify_one();
                return Ok(value);
            }
            if state.closed {
                return Err(GetError);
            }
            self.shared.not_empty.wait(&mut state);
        }
    }

    /// Removes the head item, blocking at most `timeout` while empty.
    ///
    /// Deadline arithmetic matches [`put_timeout`](Self::put_timeout): one
    /// absolute deadline, remaining budget on every retry. A zero `timeout`
    /// makes this equivalent to [`try_get`](Self::try_get).
    ///
    /// # Errors
    ///
    /// Returns `Err(TryGetError::Empty)` if no item arrived before the
    /// deadline, or `Err(TryGetError::Closed)` if the queue is closed and
    /// drained.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use baton_queue::{BlockingQueue, TryGetError};
    ///
    /// let queue = BlockingQueue::<u64>::with_capacity(4);
    ///
    /// let err = queue.get_timeout(Duration::from_millis(10));
    /// assert_eq!(err, Err(TryGetError::Empty));
    /// ```
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, TryGetError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if let Some(value) = state.items.pop_front() {
                drop(state);
                self.shared.not_full.notify_one();
                return Ok(value);
            }
            if state.closed {
                return Err(TryGetError::Closed);
            }
            if self
                .shared
                .not_empty
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.items.is_empty()
            {
                return Err(if state.closed {
                    TryGetError::Closed
                } else {
                    TryGetError::Empty
                });
            }
        }
    }

    /// Removes the head item only if one is present right now. Never waits.
    ///
    /// # Errors
    ///
    /// Returns `Err(TryGetError::Empty)` if the queue is empty, or
    /// `Err(TryGetError::Closed)` if it is closed and drained.
    ///
    /// # Example
    ///
    /// ```
    /// use baton_queue::{BlockingQueue, TryGetError};
    ///
    /// let queue = BlockingQueue::with_capacity(4);
    ///
    /// assert_eq!(queue.try_get(), Err(TryGetError::Empty));
    ///
    /// queue.put(7).unwrap();
    /// assert_eq!(queue.try_get(), Ok(7));
    /// ```
    pub fn try_get(&self) -> Result<T, TryGetError> {
        let mut state = self.shared.state.lock();
        match state.items.pop_front() {
            Some(value) => {
                drop(state);
                self.shared.not_full.notify_one();
                Ok(value)
            }
            None if state.closed => Err(TryGetError::Closed),
            None => Err(TryGetError::Empty),
        }
    }

    /// Returns a copy of the item a `get` would remove next, without
    /// removing it. `None` if the queue is empty.
    ///
    /// This is a best-effort snapshot: by the time the caller looks at the
    /// result, another thread may already have taken the item, so a
    /// subsequent `get` is not guaranteed to return the same value.
    ///
    /// # Example
    ///
    /// ```
    /// use baton_queue::BlockingQueue;
    ///
    /// let queue = BlockingQueue::with_capacity(4);
    /// assert_eq!(queue.peek(), None);
    ///
    /// queue.put("x").unwrap();
    /// assert_eq!(queue.peek(), Some("x"));
    /// // peek did not consume it
    /// assert_eq!(queue.get().unwrap(), "x");
    /// ```
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.shared.state.lock().items.front().cloned()
    }

    /// Returns the number of items currently queued.
    ///
    /// A momentary snapshot: it may be stale by the time the caller acts on
    /// it. Useful for monitoring, not for synchronization.
    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    /// Returns `true` if the queue currently holds no items.
    ///
    /// Same staleness caveat as [`len`](Self::len): with other threads
    /// active, the answer can be outdated as soon as it is produced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the queue is currently at capacity.
    ///
    /// Same staleness caveat as [`len`](Self::len).
    pub fn is_full(&self) -> bool {
        self.len() == self.shared.capacity
    }

    /// Returns the maximum number of items the queue can hold.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Closes the queue and wakes every blocked waiter.
    ///
    /// Blocked producers fail with their value returned to them; blocked
    /// consumers drain whatever is already queued, then fail. Items present
    /// at close time are not discarded. Returns `true` if this call closed
    /// the queue, `false` if it was closed already.
    ///
    /// # Example
    ///
    /// ```
    /// use baton_queue::BlockingQueue;
    ///
    /// let queue = BlockingQueue::<u64>::with_capacity(4);
    ///
    /// assert!(queue.close());
    /// assert!(!queue.close());
    /// assert!(queue.is_closed());
    /// ```
    pub fn close(&self) -> bool {
        let mut state = self.shared.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        drop(state);
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
        true
    }

    /// Returns `true` if the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("BlockingQueue")
            .field("len", &state.items.len())
            .field("capacity", &self.shared.capacity)
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when [`BlockingQueue::put`] fails because the queue is
/// closed.
///
/// Contains the value that could not be inserted, allowing recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutError<T>(pub T);

impl<T> PutError<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue closed")
    }
}

impl<T: fmt::Debug> std::error::Error for PutError<T> {}

/// Error returned by [`BlockingQueue::try_put`] and
/// [`BlockingQueue::put_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryPutError<T> {
    /// The queue was at capacity - immediately for `try_put`, for the whole
    /// timeout window for `put_timeout`. The value is returned so it can be
    /// retried or handled.
    Full(T),

    /// The queue is closed. The value is returned for cleanup.
    Closed(T),
}

impl<T> TryPutError<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(value) | Self::Closed(value) => value,
        }
    }

    /// Returns `true` if this error is the `Full` variant.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// Returns `true` if this error is the `Closed` variant.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl<T> fmt::Display for TryPutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => write!(f, "queue full"),
            Self::Closed(_) => write!(f, "queue closed"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for TryPutError<T> {}

/// Error returned when [`BlockingQueue::get`] fails because the queue is
/// closed and drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetError;

impl fmt::Display for GetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue closed")
    }
}

impl std::error::Error for GetError {}

/// Error returned by [`BlockingQueue::try_get`] and
/// [`BlockingQueue::get_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryGetError {
    /// The queue held no item - immediately for `try_get`, for the whole
    /// timeout window for `get_timeout`.
    Empty,

    /// The queue is closed and no items remain.
    Closed,
}

impl TryGetError {
    /// Returns `true` if this error is the `Empty` variant.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if this error is the `Closed` variant.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for TryGetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "queue empty"),
            Self::Closed => write!(f, "queue closed"),
        }
    }
}

impl std::error::Error for TryGetError {}
