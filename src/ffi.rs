//! C ABI for hosts that can only exchange numbers.
//!
//! One queue per process. The host's key callback calls [`keyq_push`];
//! the polling side calls the `keyq_*_char` family, which all return `f64`
//! so scripting environments can consume them directly.
//!
//! Return convention:
//!
//! | value  | meaning                                   |
//! |--------|-------------------------------------------|
//! | `-1.0` | overflowed; call [`keyq_flush_chars`]     |
//! | `0.0`  | empty (NUL); check [`keyq_num_chars`]     |
//! | other  | Unicode code point of the character       |
//!
//! ```c
//! keyq_init(100);
//! // key callback:
//! keyq_push(ch);
//! // poll loop:
//! double n = keyq_num_chars();
//! if (n < 0) keyq_flush_chars();
//! else if (n > 0) handle(keyq_get_char());
//! ```

use std::sync::OnceLock;

use crate::error::Overflowed;
use crate::queue::KeyEventQueue;

// =============================================================================
// GLOBAL STATE
// =============================================================================

static QUEUE: OnceLock<KeyEventQueue> = OnceLock::new();

/// `keyq_init` status codes.
pub const INIT_OK: u32 = 0;
pub const INIT_ALREADY: u32 = 1;
pub const INIT_INVALID_CAPACITY: u32 = 2;

const OVERFLOW: f64 = Overflowed::SENTINEL as f64;

/// The process queue, created with `DEFAULT_CAPACITY` slots on first use.
fn queue() -> &'static KeyEventQueue {
    QUEUE.get_or_init(KeyEventQueue::default)
}

fn encode_char(result: Result<char, Overflowed>) -> f64 {
    match result {
        Ok(ch) => f64::from(ch as u32),
        Err(Overflowed) => OVERFLOW,
    }
}

// =============================================================================
// FFI EXPORTS
// =============================================================================

/// Create the process queue with `capacity` slots (`capacity - 1` usable).
///
/// Returns [`INIT_OK`], [`INIT_ALREADY`] if a queue already exists (including
/// one created implicitly by an earlier call), or [`INIT_INVALID_CAPACITY`]
/// when `capacity` is below `MIN_CAPACITY`, above `MAX_CAPACITY`, or the
/// slots cannot be allocated.
#[unsafe(no_mangle)]
pub extern "C" fn keyq_init(capacity: u32) -> u32 {
    let queue = match KeyEventQueue::new(capacity as usize) {
        Ok(queue) => queue,
        Err(e) => {
            tracing::error!(error = %e, "keyq_init rejected");
            return INIT_INVALID_CAPACITY;
        }
    };

    match QUEUE.set(queue) {
        Ok(()) => {
            tracing::info!(capacity, "key queue initialized");
            INIT_OK
        }
        Err(_) => {
            tracing::warn!("keyq_init called on an existing queue");
            INIT_ALREADY
        }
    }
}

/// Producer entry: one typed character as a Unicode code point.
///
/// Values that are not valid code points are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn keyq_push(codepoint: u32) {
    match char::from_u32(codepoint) {
        Some(ch) => queue().push(ch),
        None => tracing::debug!(codepoint, "ignoring invalid code point"),
    }
}

/// Unread character count, or `-1.0` when overflowed.
#[unsafe(no_mangle)]
pub extern "C" fn keyq_num_chars() -> f64 {
    match queue().count() {
        Ok(n) => n as f64,
        Err(Overflowed) => OVERFLOW,
    }
}

/// Oldest character without consuming it.
#[unsafe(no_mangle)]
pub extern "C" fn keyq_peek_char() -> f64 {
    encode_char(queue().peek())
}

/// Remove and return the oldest character.
#[unsafe(no_mangle)]
pub extern "C" fn keyq_get_char() -> f64 {
    encode_char(queue().pop())
}

/// Drop all unread characters and clear overflow.
#[unsafe(no_mangle)]
pub extern "C" fn keyq_flush_chars() {
    queue().flush();
}

/// Usable capacity (slots minus one).
#[unsafe(no_mangle)]
pub extern "C" fn keyq_queue_length() -> f64 {
    queue().capacity_hint() as f64
}

/// Library version as `major.minor`.
#[unsafe(no_mangle)]
pub extern "C" fn keyq_version() -> f64 {
    version()
}

pub fn version() -> f64 {
    let major: f64 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0.0);
    let minor: f64 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0.0);
    let mut scale = 10.0;
    while minor >= scale {
        scale *= 10.0;
    }
    major + minor / scale
}
