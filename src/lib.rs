//! # keyqueue
//!
//! Keystroke capture for callers that can only poll.
//!
//! A host toolkit delivers key events whenever it likes; the consumer (a
//! scripting environment, a numeric runtime, a test harness) asks for
//! characters whenever *it* likes. A bounded lock-free ring sits between the
//! two so neither side ever waits on the other.
//!
//! ## Architecture
//!
//! ```text
//!  Host toolkit / terminal                      Polling caller
//!  ───────────────────────                      ──────────────
//!  key event                                    count / peek / pop / flush
//!     │                                                   ▲
//!     ▼                                                   │
//!  source::typed_char ──► KeySink::on_char ──► KeyEventQueue (SPSC ring)
//!                             (producer)           │
//!                                                  └──► ffi: f64 results,
//!                                                       -1.0 = overflowed
//! ```
//!
//! ## Modules
//!
//! - [`queue`] - the ring buffer, overflow latch, producer/consumer handles
//! - [`source`] - key event classification and the crossterm terminal source
//! - [`ffi`] - C ABI with numeric return values
//! - [`config`] - capacity and logging settings, environment overrides
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - error types

pub mod config;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod queue;
pub mod source;

pub use config::QueueConfig;
pub use error::{Overflowed, QueueError};
pub use logging::init_logging;
pub use queue::{
    DEFAULT_CAPACITY, EMPTY_CHAR, KeyConsumer, KeyEventQueue, KeyProducer, MAX_CAPACITY,
    MIN_CAPACITY,
};
pub use source::terminal::{RawModeGuard, TerminalSource};
pub use source::{
    KeyCode, KeyKind, KeyLocation, KeySink, KeyStroke, Modifier, describe, forward, typed_char,
};
