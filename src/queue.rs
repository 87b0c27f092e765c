//! Keystroke ring buffer shared between one producer and one consumer.
//!
//! The producer is whatever turns host key events into characters (a UI
//! callback, a terminal reader thread, an FFI call). The consumer is a
//! polling caller that asks for characters whenever it likes.
//!
//! # Layout
//!
//! ```text
//!            tail (consumer)          head (producer)
//!               │                        │
//!   ┌───┬───┬───▼───┬───┬───┬───┬───┬───▼───┬───┐
//!   │   │   │ 'a'   │'b'│'c'│'d'│'e'│  free │   │   capacity slots
//!   └───┴───┴───────┴───┴───┴───┴───┴───────┴───┘
//!
//!   unread = (head - tail + capacity) mod capacity
//! ```
//!
//! There is no count field. `head == tail` means empty, so one slot always
//! stays free and the usable capacity is `capacity - 1`. A push that would
//! make `head` catch up with `tail` is rejected and latches the overflow flag
//! instead. While latched every push is dropped and every read reports
//! [`Overflowed`] until the consumer calls [`KeyEventQueue::flush`].
//!
//! # Memory ordering
//!
//! - `head` has a single writer (producer). Stored with `Release` after the
//!   slot write, loaded with `Acquire` by the consumer.
//! - `tail` has a single writer (consumer). Stored with `Release`, loaded
//!   with `Acquire` by the producer.
//! - `overflowed` is set by the producer and cleared by the consumer.
//!
//! Nothing here blocks or spins.

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::config::QueueConfig;
use crate::error::{Overflowed, QueueError};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Slots allocated when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 100;

/// Smallest capacity that still leaves one usable slot.
pub const MIN_CAPACITY: usize = 2;

/// Largest capacity accepted (4 MiB of slots).
pub const MAX_CAPACITY: usize = 1 << 20;

/// Returned by `peek`/`pop` when nothing is queued.
///
/// NUL is a valid character too, so callers that care must check
/// `count() == 0` rather than compare against this.
pub const EMPTY_CHAR: char = '\0';

// =============================================================================
// QUEUE
// =============================================================================

/// Bounded SPSC character queue with a sticky overflow latch.
pub struct KeyEventQueue {
    slots: Box<[AtomicU32]>,
    head: AtomicUsize,
    tail: AtomicUsize,
    overflowed: AtomicBool,
}

impl KeyEventQueue {
    /// Allocate a queue with `capacity` slots (`capacity - 1` usable).
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity < MIN_CAPACITY {
            return Err(QueueError::InvalidCapacity {
                capacity,
                min: MIN_CAPACITY,
            });
        }
        if capacity > MAX_CAPACITY {
            return Err(QueueError::CapacityTooLarge {
                capacity,
                max: MAX_CAPACITY,
            });
        }

        let slots = alloc_slots(capacity)?;
        tracing::debug!(capacity, usable = capacity - 1, "key queue allocated");
        Ok(Self::from_slots(slots))
    }

    fn from_slots(slots: Box<[AtomicU32]>) -> Self {
        Self {
            slots,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overflowed: AtomicBool::new(false),
        }
    }

    /// Build a queue from configuration.
    pub fn with_config(config: &QueueConfig) -> Result<Self, QueueError> {
        Self::new(config.capacity)
    }

    /// Total slot count, including the one kept free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of characters that can wait unread.
    #[inline]
    pub fn capacity_hint(&self) -> usize {
        self.capacity() - 1
    }

    /// Whether the overflow latch is currently set.
    #[inline]
    pub fn is_overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }

    #[inline]
    fn next(&self, idx: usize) -> usize {
        (idx + 1) % self.capacity()
    }

    // -------------------------------------------------------------------------
    // Producer side
    // -------------------------------------------------------------------------

    /// Append one character. Never blocks.
    ///
    /// The character that would fill the last free slot is dropped and
    /// latches overflow. Once latched, every push is a no-op until `flush`.
    pub fn push(&self, ch: char) {
        if self.overflowed.load(Ordering::Acquire) {
            return;
        }

        let head = self.head.load(Ordering::Relaxed);
        // Slot `head` is outside [tail, head) so the consumer never reads it here.
        self.slots[head].store(ch as u32, Ordering::Relaxed);

        let next = self.next(head);
        if next == self.tail.load(Ordering::Acquire) {
            self.overflowed.store(true, Ordering::Release);
            tracing::warn!(
                dropped = ?ch,
                usable = self.capacity_hint(),
                "key queue overflowed; input dropped until flush"
            );
        } else {
            self.head.store(next, Ordering::Release);
        }
    }

    // -------------------------------------------------------------------------
    // Consumer side
    // -------------------------------------------------------------------------

    /// Number of unread characters, or [`Overflowed`] while latched.
    pub fn count(&self) -> Result<usize, Overflowed> {
        if self.is_overflowed() {
            return Err(Overflowed);
        }
        Ok(self.unread())
    }

    /// Oldest unread character without consuming it.
    ///
    /// Returns [`EMPTY_CHAR`] when nothing is queued.
    pub fn peek(&self) -> Result<char, Overflowed> {
        if self.is_overflowed() {
            return Err(Overflowed);
        }
        if self.unread() == 0 {
            return Ok(EMPTY_CHAR);
        }
        let tail = self.tail.load(Ordering::Relaxed);
        Ok(self.read_slot(tail))
    }

    /// Remove and return the oldest unread character.
    ///
    /// Returns [`EMPTY_CHAR`] when nothing is queued.
    pub fn pop(&self) -> Result<char, Overflowed> {
        if self.is_overflowed() {
            return Err(Overflowed);
        }
        if self.unread() == 0 {
            return Ok(EMPTY_CHAR);
        }
        let tail = self.tail.load(Ordering::Relaxed);
        let ch = self.read_slot(tail);
        self.tail.store(self.next(tail), Ordering::Release);
        Ok(ch)
    }

    /// Discard everything unread and clear the overflow latch.
    pub fn flush(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
        if self.overflowed.swap(false, Ordering::AcqRel) {
            tracing::debug!("key queue flushed after overflow");
        }
    }

    /// Wrap-aware distance from tail to head.
    ///
    /// Always `(head - tail + capacity) mod capacity`, including when the
    /// tail index sits numerically above the head.
    fn unread(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        let capacity = self.capacity();
        (head + capacity - tail) % capacity
    }

    fn read_slot(&self, idx: usize) -> char {
        // Only code points that came in as `char` are ever stored.
        char::from_u32(self.slots[idx].load(Ordering::Relaxed)).unwrap_or(EMPTY_CHAR)
    }

    /// Split into producer and consumer handles.
    ///
    /// The handles are `Send` but not `Sync`, so each side stays on one
    /// thread at a time. Callers holding the queue itself (the FFI layer)
    /// keep to one pushing and one reading context by contract.
    pub fn split(self) -> (KeyProducer, KeyConsumer) {
        let shared = Arc::new(self);
        (
            KeyProducer {
                queue: Arc::clone(&shared),
                _not_sync: PhantomData,
            },
            KeyConsumer {
                queue: shared,
                _not_sync: PhantomData,
            },
        )
    }
}

/// Zeroed slots, allocated without aborting on failure.
fn alloc_slots(capacity: usize) -> Result<Box<[AtomicU32]>, QueueError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| QueueError::Allocation { capacity })?;
    slots.extend((0..capacity).map(|_| AtomicU32::new(0)));
    Ok(slots.into_boxed_slice())
}

impl Default for KeyEventQueue {
    fn default() -> Self {
        Self::from_slots((0..DEFAULT_CAPACITY).map(|_| AtomicU32::new(0)).collect())
    }
}

impl std::fmt::Debug for KeyEventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEventQueue")
            .field("capacity", &self.capacity())
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .field("overflowed", &self.overflowed.load(Ordering::Relaxed))
            .finish()
    }
}

// =============================================================================
// HANDLES
// =============================================================================

/// Write half. Exactly one exists per split queue.
#[derive(Debug)]
pub struct KeyProducer {
    queue: Arc<KeyEventQueue>,
    _not_sync: PhantomData<Cell<()>>,
}

impl KeyProducer {
    #[inline]
    pub fn push(&self, ch: char) {
        self.queue.push(ch);
    }
}

/// Read half. Exactly one exists per split queue.
///
/// Sharing it between threads does not compile:
///
/// ```compile_fail
/// use keyqueue::KeyEventQueue;
///
/// let (_tx, rx) = KeyEventQueue::new(4).unwrap().split();
/// let rx = std::sync::Arc::new(rx);
/// let rx2 = rx.clone();
/// std::thread::spawn(move || rx2.pop());
/// rx.pop().unwrap();
/// ```
#[derive(Debug)]
pub struct KeyConsumer {
    queue: Arc<KeyEventQueue>,
    _not_sync: PhantomData<Cell<()>>,
}

impl KeyConsumer {
    #[inline]
    pub fn count(&self) -> Result<usize, Overflowed> {
        self.queue.count()
    }

    #[inline]
    pub fn peek(&self) -> Result<char, Overflowed> {
        self.queue.peek()
    }

    #[inline]
    pub fn pop(&self) -> Result<char, Overflowed> {
        self.queue.pop()
    }

    #[inline]
    pub fn flush(&self) {
        self.queue.flush();
    }

    #[inline]
    pub fn capacity_hint(&self) -> usize {
        self.queue.capacity_hint()
    }

    #[inline]
    pub fn is_overflowed(&self) -> bool {
        self.queue.is_overflowed()
    }

    /// Pop everything currently readable.
    ///
    /// Stops at the first empty read. On overflow returns what was read
    /// before the latch was seen, leaving the latch set.
    pub fn drain(&self) -> Result<String, Overflowed> {
        let mut out = String::new();
        loop {
            match self.queue.count()? {
                0 => return Ok(out),
                _ => out.push(self.queue.pop()?),
            }
        }
    }
}
