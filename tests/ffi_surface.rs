//! The numeric C ABI, driven the way a scripting host would drive it.
//!
//! The queue behind these functions is process-wide, so the whole scenario
//! lives in a single test.

use keyqueue::MAX_CAPACITY;
use keyqueue::ffi::{
    INIT_ALREADY, INIT_INVALID_CAPACITY, INIT_OK, keyq_flush_chars, keyq_get_char, keyq_init,
    keyq_num_chars, keyq_peek_char, keyq_push, keyq_queue_length, keyq_version,
};

fn push_str(s: &str) {
    for ch in s.chars() {
        keyq_push(ch as u32);
    }
}

#[test]
fn test_numeric_polling_session() {
    assert_eq!(keyq_init(1), INIT_INVALID_CAPACITY);
    assert_eq!(keyq_init(0), INIT_INVALID_CAPACITY);
    assert_eq!(keyq_init(u32::MAX), INIT_INVALID_CAPACITY);
    assert_eq!(keyq_init(MAX_CAPACITY as u32 + 1), INIT_INVALID_CAPACITY);
    assert_eq!(keyq_init(4), INIT_OK);
    assert_eq!(keyq_init(50), INIT_ALREADY);

    assert_eq!(keyq_queue_length(), 3.0);
    assert!(keyq_version() >= 0.1);

    // Empty
    assert_eq!(keyq_num_chars(), 0.0);
    assert_eq!(keyq_peek_char(), 0.0);
    assert_eq!(keyq_get_char(), 0.0);

    // Round trip
    push_str("abc");
    assert_eq!(keyq_num_chars(), 3.0);
    assert_eq!(keyq_peek_char(), 'a' as u32 as f64);
    assert_eq!(keyq_get_char(), 'a' as u32 as f64);
    assert_eq!(keyq_peek_char(), 'b' as u32 as f64);
    assert_eq!(keyq_get_char(), 'b' as u32 as f64);
    assert_eq!(keyq_get_char(), 'c' as u32 as f64);
    assert_eq!(keyq_get_char(), 0.0);
    assert_eq!(keyq_num_chars(), 0.0);

    // Invalid code points never reach the queue.
    keyq_push(0xD800);
    keyq_push(0x11_0000);
    assert_eq!(keyq_num_chars(), 0.0);

    // Overflow: the fourth char latches.
    push_str("wxyz");
    assert_eq!(keyq_num_chars(), -1.0);
    assert_eq!(keyq_peek_char(), -1.0);
    assert_eq!(keyq_get_char(), -1.0);
    push_str("q");
    assert_eq!(keyq_num_chars(), -1.0);

    keyq_flush_chars();
    assert_eq!(keyq_num_chars(), 0.0);
    assert_eq!(keyq_get_char(), 0.0);

    // Only what arrives after the flush is readable.
    push_str("k");
    assert_eq!(keyq_num_chars(), 1.0);
    assert_eq!(keyq_get_char(), 'k' as u32 as f64);
    assert_eq!(keyq_get_char(), 0.0);
    assert_eq!(keyq_num_chars(), 0.0);

    // Non-ASCII comes back as its code point.
    push_str("é");
    assert_eq!(keyq_get_char(), 233.0);
}
