//! A rendezvous queue: direct producer-consumer handoff through a
//! capacity-1 [`BlockingQueue`].
//!
//! A rendezvous queue holds at most one item, and that item is not a
//! buffered message - it is a handoff in progress. A successful
//! [`put`](RendezvousQueue::put) parks the item for the very next
//! [`get`](RendezvousQueue::get), and because capacity is exactly 1, puts
//! and gets form a strict alternation: no two puts can complete without a
//! get between them, and vice versa.
//!
//! ```text
//! producer                 queue                 consumer
//! ────────                 ─────                 ────────
//! put(a) ───────────────▶ [ a ]
//! put(b) ... blocked ...  [ a ] ───────────────▶ get() = a
//!                         [ b ]  (put(b) completes)
//!                         [ b ] ───────────────▶ get() = b
//! ```
//!
//! The mechanics are exactly those of the bounded core - mutex, two
//! condition variables, predicate loops - instantiated at capacity 1. What
//! this crate adds is the handoff contract: [`peek`](RendezvousQueue::peek)
//! exposes the one pending item (or `None` when no handoff is pending), and
//! [`is_full`](RendezvousQueue::is_full) answers "is a handoff waiting to
//! be claimed?".
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! use baton_rendezvous::RendezvousQueue;
//!
//! let queue = RendezvousQueue::new();
//! let consumer_queue = queue.clone();
//!
//! let consumer = thread::spawn(move || consumer_queue.get().unwrap());
//!
//! queue.put("baton").unwrap();
//! assert_eq!(consumer.join().unwrap(), "baton");
//! ```
//!
//! # Timed and non-blocking handoffs
//!
//! All three operation forms of the core are available. A timed put is the
//! "offer it for a while" idiom:
//!
//! ```
//! use std::time::Duration;
//!
//! use baton_rendezvous::RendezvousQueue;
//! use baton_queue::TryPutError;
//!
//! let queue = RendezvousQueue::new();
//! queue.put(1).unwrap();
//!
//! // Nobody claims the pending handoff, so a second offer times out.
//! let err = queue.put_timeout(2, Duration::from_millis(20));
//! assert!(matches!(err, Err(TryPutError::Full(2))));
//! ```

use std::fmt;
use std::time::Duration;

use baton_queue::BlockingQueue;
pub use baton_queue::{GetError, PutError, TryGetError, TryPutError};

/// A capacity-1 queue where every insert is a direct handoff to the next
/// remove.
///
/// Cloning produces another handle to the same queue; hand one to each
/// producer and consumer thread.
pub struct RendezvousQueue<T> {
    inner: BlockingQueue<T>,
}

impl<T> Clone for RendezvousQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for RendezvousQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RendezvousQueue<T> {
    /// Creates a new rendezvous queue.
    pub fn new() -> Self {
        Self {
            inner: BlockingQueue::with_capacity(1),
        }
    }

    /// Offers a value for handoff, blocking while a previous handoff is
    /// still unclaimed.
    ///
    /// Returning `Ok` means the value is now the pending handoff and the
    /// next [`get`](Self::get) will receive exactly it.
    ///
    /// # Errors
    ///
    /// Returns `Err(PutError(value))` if the queue is closed.
    #[inline]
    pub fn put(&self, value: T) -> Result<(), PutError<T>> {
        self.inner.put(value)
    }

    /// Offers a value for handoff, blocking at most `timeout` for the
    /// previous handoff to be claimed.
    ///
    /// # Errors
    ///
    /// Returns `Err(TryPutError::Full(value))` if the pending handoff was
    /// still unclaimed at the deadline, `Err(TryPutError::Closed(value))`
    /// if the queue is closed.
    #[inline]
    pub fn put_timeout(&self, value: T, timeout: Duration) -> Result<(), TryPutError<T>> {
        self.inner.put_timeout(value, timeout)
    }

    /// Offers a value only if no handoff is currently pending. Never waits.
    ///
    /// # Errors
    ///
    /// Returns `Err(TryPutError::Full(value))` if a handoff is pending,
    /// `Err(TryPutError::Closed(value))` if the queue is closed.
    #[inline]
    pub fn try_put(&self, value: T) -> Result<(), TryPutError<T>> {
        self.inner.try_put(value)
    }

    /// Claims the pending handoff, blocking until a producer offers one.
    ///
    /// # Errors
    ///
    /// Returns `Err(GetError)` if the queue is closed and no handoff is
    /// pending.
    #[inline]
    pub fn get(&self) -> Result<T, GetError> {
        self.inner.get()
    }

    /// Claims the pending handoff, blocking at most `timeout` for one to
    /// arrive.
    ///
    /// # Errors
    ///
    /// Returns `Err(TryGetError::Empty)` if no handoff arrived before the
    /// deadline, `Err(TryGetError::Closed)` if the queue is closed with
    /// nothing pending.
    #[inline]
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, TryGetError> {
        self.inner.get_timeout(timeout)
    }

    /// Claims the pending handoff only if one is already waiting. Never
    /// waits.
    ///
    /// # Errors
    ///
    /// Returns `Err(TryGetError::Empty)` if no handoff is pending,
    /// `Err(TryGetError::Closed)` if the queue is closed with nothing
    /// pending.
    #[inline]
    pub fn try_get(&self) -> Result<T, TryGetError> {
        self.inner.try_get()
    }

    /// Returns a copy of the pending handoff item without claiming it, or
    /// `None` when no put has completed since the last get.
    ///
    /// Best-effort snapshot: another consumer may claim the handoff before
    /// the caller acts on the result.
    #[inline]
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.peek()
    }

    /// Returns `true` if no handoff is pending. Momentary snapshot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns `true` if a handoff is pending - a put has completed and no
    /// get has claimed it yet. Momentary snapshot.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Closes the queue, releasing every blocked producer and consumer.
    ///
    /// A pending handoff survives close and can still be claimed. Returns
    /// `true` if this call performed the close.
    #[inline]
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    /// Returns `true` if the queue has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl<T> fmt::Debug for RendezvousQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendezvousQueue")
            .field("pending", &self.inner.is_full())
            .field("closed", &self.inner.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    // ============================================================================
    // Handoff Basics
    // ============================================================================

    #[test]
    fn put_then_get_returns_the_same_item() {
        let queue = RendezvousQueue::new();

        queue.put("x").unwrap();
        assert_eq!(queue.get().unwrap(), "x");
    }

    #[test]
    fn peek_shows_the_pending_handoff() {
        let queue = RendezvousQueue::new();

        assert_eq!(queue.peek(), None);

        queue.put("x").unwrap();
        assert_eq!(queue.peek(), Some("x"));
        // peek does not claim the handoff
        assert_eq!(queue.get().unwrap(), "x");
        assert_eq!(queue.peek(), None);
    }

    #[test]
    fn pending_flag_tracks_the_handoff() {
        let queue = RendezvousQueue::new();

        assert!(queue.is_empty());
        assert!(!queue.is_full());

        queue.put(1).unwrap();
        assert!(queue.is_full());
        assert!(!queue.is_empty());

        queue.get().unwrap();
        assert!(queue.is_empty());
    }

    // ============================================================================
    // Strict Alternation
    // ============================================================================

    #[test]
    fn second_put_blocks_until_the_first_is_claimed() {
        let queue = RendezvousQueue::new();
        queue.put(1).unwrap();

        let start = Instant::now();
        let producer = queue.clone();
        let handle = thread::spawn(move || producer.put(2).unwrap());

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.get().unwrap(), 1);

        handle.join().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(queue.get().unwrap(), 2);
    }

    #[test]
    fn no_two_puts_without_an_intervening_get() {
        let queue = RendezvousQueue::new();

        queue.try_put(1).unwrap();
        assert!(matches!(queue.try_put(2), Err(TryPutError::Full(2))));

        queue.try_get().unwrap();
        assert!(queue.try_put(2).is_ok());
    }

    #[test]
    fn no_two_gets_without_an_intervening_put() {
        let queue = RendezvousQueue::new();

        queue.put(1).unwrap();
        queue.try_get().unwrap();
        assert_eq!(queue.try_get(), Err(TryGetError::Empty));
    }

    // ============================================================================
    // Handoff Liveness
    // ============================================================================

    #[test]
    fn handoff_completes_promptly_once_the_consumer_arrives() {
        let queue = RendezvousQueue::new();

        let start = Instant::now();

        queue.put("a").unwrap();

        let consumer = queue.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            consumer.get().unwrap()
        });

        // This put blocks on the unclaimed "a" until the consumer runs.
        queue.put("b").unwrap();
        let unblocked_after = start.elapsed();

        assert_eq!(handle.join().unwrap(), "a");
        assert_eq!(queue.get().unwrap(), "b");

        assert!(unblocked_after >= Duration::from_millis(100));
        assert!(unblocked_after < Duration::from_secs(2));
    }

    #[test]
    fn blocked_consumer_receives_the_offered_item() {
        let queue = RendezvousQueue::new();

        let start = Instant::now();
        let consumer = queue.clone();
        let handle = thread::spawn(move || consumer.get().unwrap());

        thread::sleep(Duration::from_millis(100));
        queue.put("a").unwrap();

        assert_eq!(handle.join().unwrap(), "a");
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    // ============================================================================
    // Timed Handoffs
    // ============================================================================

    #[test]
    fn put_timeout_on_pending_handoff_expires() {
        let queue = RendezvousQueue::new();
        queue.put("pending").unwrap();

        let start = Instant::now();
        let result = queue.put_timeout("late", Duration::from_millis(50));
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(TryPutError::Full("late"))));
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn get_timeout_with_no_producer_expires() {
        let queue = RendezvousQueue::<u64>::new();

        let result = queue.get_timeout(Duration::from_millis(50));
        assert_eq!(result, Err(TryGetError::Empty));
    }

    #[test]
    fn get_timeout_claims_a_late_handoff() {
        let queue = RendezvousQueue::new();

        let consumer = queue.clone();
        let handle = thread::spawn(move || consumer.get_timeout(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(50));
        queue.put(9).unwrap();

        assert_eq!(handle.join().unwrap(), Ok(9));
    }

    // ============================================================================
    // Close
    // ============================================================================

    #[test]
    fn close_releases_a_blocked_producer() {
        let queue = RendezvousQueue::new();
        queue.put("pending").unwrap();

        let producer = queue.clone();
        let handle = thread::spawn(move || producer.put("stuck"));

        thread::sleep(Duration::from_millis(50));
        queue.close();

        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.into_inner(), "stuck");

        // The pending handoff survives close.
        assert_eq!(queue.get().unwrap(), "pending");
        assert_eq!(queue.get(), Err(GetError));
    }

    #[test]
    fn close_releases_a_blocked_consumer() {
        let queue = RendezvousQueue::<u64>::new();

        let consumer = queue.clone();
        let handle = thread::spawn(move || consumer.get());

        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert_eq!(handle.join().unwrap(), Err(GetError));
        assert!(queue.is_empty());
    }

    // ============================================================================
    // Ping-Pong
    // ============================================================================

    #[test]
    fn ping_pong() {
        let ping = RendezvousQueue::new();
        let pong = RendezvousQueue::new();

        let ping_rx = ping.clone();
        let pong_tx = pong.clone();
        let handle = thread::spawn(move || {
            for _ in 0..1000u64 {
                let value = ping_rx.get().unwrap();
                pong_tx.put(value + 1).unwrap();
            }
        });

        for i in 0..1000u64 {
            ping.put(i).unwrap();
            assert_eq!(pong.get().unwrap(), i + 1);
        }

        handle.join().unwrap();
    }

    // ============================================================================
    // Contention Stress
    // ============================================================================

    #[test]
    fn many_producers_one_consumer_exactly_once() {
        const PRODUCERS: u64 = 4;
        const PER_PRODUCER: u64 = 200;

        let queue = RendezvousQueue::new();

        let mut handles = Vec::new();
        for p in 0..PRODUCERS {
            let queue = queue.clone();
            handles.push(thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.put(p * PER_PRODUCER + i).unwrap();
                }
            }));
        }

        let mut seen = Vec::new();
        for _ in 0..PRODUCERS * PER_PRODUCER {
            seen.push(queue.get().unwrap());
        }

        for handle in handles {
            handle.join().unwrap();
        }

        seen.sort_unstable();
        let expected: Vec<u64> = (0..PRODUCERS * PER_PRODUCER).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn peek_is_safe_while_handoffs_race() {
        // peek only ever sees the pending item or nothing, even while a
        // producer and consumer hammer the queue.
        const ROUNDS: usize = 2_000;

        let queue = RendezvousQueue::new();
        let done = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));

        let observer_queue = queue.clone();
        let observer_done = std::sync::Arc::clone(&done);
        let observer = thread::spawn(move || {
            while !observer_done.load(std::sync::atomic::Ordering::Acquire) {
                if let Some(value) = observer_queue.peek() {
                    assert!(value < ROUNDS);
                }
            }
        });

        let producer_queue = queue.clone();
        let producer = thread::spawn(move || {
            for i in 0..ROUNDS {
                producer_queue.put(i).unwrap();
            }
        });

        for _ in 0..ROUNDS {
            queue.get().unwrap();
        }

        producer.join().unwrap();
        done.store(true, std::sync::atomic::Ordering::Release);
        observer.join().unwrap();

        assert!(queue.is_empty());
    }
}
