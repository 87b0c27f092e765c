//! Error types.
//!
//! Only construction and configuration can fail outright. A full queue is a
//! state, not a failure: reads report [`Overflowed`] until the consumer
//! flushes.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("invalid queue capacity {capacity}: need at least {min} slots")]
    InvalidCapacity { capacity: usize, min: usize },

    #[error("invalid queue capacity {capacity}: at most {max} slots")]
    CapacityTooLarge { capacity: usize, max: usize },

    #[error("could not allocate {capacity} queue slots")]
    Allocation { capacity: usize },

    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },
}

/// The queue dropped input and stays latched until flushed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("key queue overflowed; flush to resume")]
pub struct Overflowed;

impl Overflowed {
    /// Numeric stand-in used by callers that only see numbers.
    pub const SENTINEL: i32 = -1;
}
