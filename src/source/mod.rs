//! Key event sources turn host key events into characters for the queue.
//!
//! The queue only ever sees single characters. Everything about key
//! events (press vs release, modifiers, which keys produce text) lives here,
//! on the producer side.
//!
//! ```text
//! host toolkit / terminal
//!          │  KeyStroke { code, modifiers, kind, location }
//!          ▼
//!     typed_char()  ── navigation, function keys, releases → dropped
//!          │  char
//!          ▼
//!   KeySink::on_char  →  KeyEventQueue::push
//! ```

pub mod terminal;

use std::sync::Arc;

use crate::queue::{KeyEventQueue, KeyProducer};

// =============================================================================
// SINK
// =============================================================================

/// Receives one character per typed key.
///
/// Implementations must not block; sources call this from their event
/// dispatch context.
pub trait KeySink {
    fn on_char(&self, ch: char);
}

impl KeySink for KeyEventQueue {
    fn on_char(&self, ch: char) {
        self.push(ch);
    }
}

impl KeySink for KeyProducer {
    fn on_char(&self, ch: char) {
        self.push(ch);
    }
}

impl<T: KeySink + ?Sized> KeySink for Arc<T> {
    fn on_char(&self, ch: char) {
        (**self).on_char(ch);
    }
}

impl<T: KeySink + ?Sized> KeySink for &T {
    fn on_char(&self, ch: char) {
        (**self).on_char(ch);
    }
}

// =============================================================================
// KEY EVENTS
// =============================================================================

/// Key identity, independent of any toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8),
    Null,
}

impl KeyCode {
    /// Keys that act rather than type (arrows, paging, function keys).
    pub fn is_action_key(&self) -> bool {
        matches!(
            self,
            KeyCode::Up
                | KeyCode::Down
                | KeyCode::Left
                | KeyCode::Right
                | KeyCode::Home
                | KeyCode::End
                | KeyCode::PageUp
                | KeyCode::PageDown
                | KeyCode::Insert
                | KeyCode::F(_)
        )
    }
}

bitflags::bitflags! {
    /// Keyboard modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifier: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Where on the keyboard the key sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
    Numpad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKind {
    #[default]
    Pressed,
    Repeated,
    Released,
}

/// A single key event as delivered by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub code: KeyCode,
    pub modifiers: Modifier,
    pub kind: KeyKind,
    pub location: KeyLocation,
}

impl KeyStroke {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifier::empty(),
            kind: KeyKind::Pressed,
            location: KeyLocation::Standard,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifier) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_kind(mut self, kind: KeyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_location(mut self, location: KeyLocation) -> Self {
        self.location = location;
        self
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// The character a key event types, if any.
///
/// Releases never type. Ctrl+letter yields the ASCII control code, the
/// editing keys yield their control characters, and action keys yield
/// nothing.
pub fn typed_char(stroke: &KeyStroke) -> Option<char> {
    if stroke.kind == KeyKind::Released {
        return None;
    }

    match stroke.code {
        KeyCode::Char(c)
            if stroke.modifiers.contains(Modifier::CTRL) && c.is_ascii_alphabetic() =>
        {
            Some(char::from(c.to_ascii_lowercase() as u8 & 0x1f))
        }
        KeyCode::Char(c) => Some(c),
        KeyCode::Enter => Some('\n'),
        KeyCode::Tab => Some('\t'),
        KeyCode::Backspace => Some('\u{8}'),
        KeyCode::Escape => Some('\u{1b}'),
        KeyCode::Delete => Some('\u{7f}'),
        _ => None,
    }
}

/// Classify `stroke` and hand any typed character to `sink`.
///
/// Returns whether a character was forwarded.
pub fn forward<S: KeySink + ?Sized>(stroke: &KeyStroke, sink: &S) -> bool {
    match typed_char(stroke) {
        Some(ch) => {
            sink.on_char(ch);
            true
        }
        None => false,
    }
}

/// One-line diagnostic for a key event.
pub fn describe(stroke: &KeyStroke) -> String {
    let action = match stroke.kind {
        KeyKind::Pressed => "pressed",
        KeyKind::Repeated => "repeated",
        KeyKind::Released => "released",
    };

    let key = match typed_char(stroke) {
        Some(ch) => format!("key character = {:?}", ch),
        None => format!("key code = {:?}", stroke.code),
    };

    let modifiers = if stroke.modifiers.is_empty() {
        "no modifiers".to_string()
    } else {
        stroke
            .modifiers
            .iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join("+")
    };

    let action_key = if stroke.code.is_action_key() { "YES" } else { "NO" };

    let location = match stroke.location {
        KeyLocation::Standard => "standard",
        KeyLocation::Left => "left",
        KeyLocation::Right => "right",
        KeyLocation::Numpad => "numpad",
    };

    format!(
        "key {}: {}, modifiers = {}, action key? {}, key location: {}",
        action, key, modifiers, action_key, location
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<String>);

    impl KeySink for Recorder {
        fn on_char(&self, ch: char) {
            self.0.borrow_mut().push(ch);
        }
    }

    #[test]
    fn test_printable_chars_pass_through() {
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Char('a'))), Some('a'));
        let shifted = KeyStroke::new(KeyCode::Char('A')).with_modifiers(Modifier::SHIFT);
        assert_eq!(typed_char(&shifted), Some('A'));
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Char('ß'))), Some('ß'));
    }

    #[test]
    fn test_ctrl_letter_maps_to_control_code() {
        let ctrl_c = KeyStroke::new(KeyCode::Char('c')).with_modifiers(Modifier::CTRL);
        assert_eq!(typed_char(&ctrl_c), Some('\u{3}'));
        let ctrl_shift_d =
            KeyStroke::new(KeyCode::Char('D')).with_modifiers(Modifier::CTRL | Modifier::SHIFT);
        assert_eq!(typed_char(&ctrl_shift_d), Some('\u{4}'));
    }

    #[test]
    fn test_editing_keys() {
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Enter)), Some('\n'));
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Tab)), Some('\t'));
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Backspace)), Some('\u{8}'));
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Escape)), Some('\u{1b}'));
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Delete)), Some('\u{7f}'));
    }

    #[test]
    fn test_action_keys_and_releases_filtered() {
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Up)), None);
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::F(5))), None);
        assert_eq!(typed_char(&KeyStroke::new(KeyCode::Null)), None);
        let release = KeyStroke::new(KeyCode::Char('a')).with_kind(KeyKind::Released);
        assert_eq!(typed_char(&release), None);
        let repeat = KeyStroke::new(KeyCode::Char('a')).with_kind(KeyKind::Repeated);
        assert_eq!(typed_char(&repeat), Some('a'));
    }

    #[test]
    fn test_forward_into_queue() {
        let queue = KeyEventQueue::new(8).unwrap();
        assert!(forward(&KeyStroke::new(KeyCode::Char('h')), &queue));
        assert!(!forward(&KeyStroke::new(KeyCode::Left), &queue));
        assert!(forward(&KeyStroke::new(KeyCode::Char('i')), &queue));
        assert_eq!(queue.count(), Ok(2));
        assert_eq!(queue.pop(), Ok('h'));
        assert_eq!(queue.pop(), Ok('i'));
    }

    #[test]
    fn test_forward_through_arc_and_producer() {
        let (tx, rx) = KeyEventQueue::new(4).unwrap().split();
        let shared = Arc::new(tx);
        forward(&KeyStroke::new(KeyCode::Char('z')), &shared);
        assert_eq!(rx.pop(), Ok('z'));

        let recorder = Recorder::default();
        forward(&KeyStroke::new(KeyCode::Enter), &recorder);
        assert_eq!(recorder.0.borrow().as_str(), "\n");
    }

    #[test]
    fn test_describe() {
        let line = describe(&KeyStroke::new(KeyCode::Char('q')));
        assert_eq!(
            line,
            "key pressed: key character = 'q', modifiers = no modifiers, action key? NO, key location: standard"
        );

        let line = describe(
            &KeyStroke::new(KeyCode::PageDown)
                .with_modifiers(Modifier::SHIFT | Modifier::CTRL)
                .with_kind(KeyKind::Released),
        );
        assert_eq!(
            line,
            "key released: key code = PageDown, modifiers = SHIFT+CTRL, action key? YES, key location: standard"
        );

        let line = describe(&KeyStroke::new(KeyCode::Char('7')).with_location(KeyLocation::Numpad));
        assert!(line.ends_with("key location: numpad"), "{}", line);

        let line = describe(
            &KeyStroke::new(KeyCode::Null)
                .with_modifiers(Modifier::SHIFT)
                .with_location(KeyLocation::Right),
        );
        assert!(line.ends_with("key location: right"), "{}", line);
    }
}
