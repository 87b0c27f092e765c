//! Terminal key source backed by crossterm.
//!
//! Reads terminal events on a dedicated thread, turns key events into
//! [`KeyStroke`]s and forwards typed characters to a [`KeySink`]. Focus
//! gained/lost events are tracked so a poller can tell whether keystrokes
//! can currently reach it.
//!
//! The reader polls with a short timeout so `stop()` never waits on a
//! blocked read for longer than [`POLL_INTERVAL`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event as CrosstermEvent,
    KeyCode as CrosstermKeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyEventState,
    KeyModifiers, ModifierKeyCode,
};
use crossterm::{execute, terminal};

use super::{KeyCode, KeyKind, KeyLocation, KeySink, KeyStroke, Modifier, describe, forward};

/// Upper bound on how long a stop request can go unnoticed.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

// =============================================================================
// CONVERSION
// =============================================================================

/// Convert a crossterm key event.
pub fn convert_key_event(event: CrosstermKeyEvent) -> KeyStroke {
    let mut modifiers = convert_modifiers(event.modifiers);

    let code = match event.code {
        CrosstermKeyCode::Char(c) => KeyCode::Char(c),
        CrosstermKeyCode::Enter => KeyCode::Enter,
        CrosstermKeyCode::Tab => KeyCode::Tab,
        CrosstermKeyCode::BackTab => {
            modifiers |= Modifier::SHIFT;
            KeyCode::Tab
        }
        CrosstermKeyCode::Backspace => KeyCode::Backspace,
        CrosstermKeyCode::Esc => KeyCode::Escape,
        CrosstermKeyCode::Delete => KeyCode::Delete,
        CrosstermKeyCode::Up => KeyCode::Up,
        CrosstermKeyCode::Down => KeyCode::Down,
        CrosstermKeyCode::Left => KeyCode::Left,
        CrosstermKeyCode::Right => KeyCode::Right,
        CrosstermKeyCode::Home => KeyCode::Home,
        CrosstermKeyCode::End => KeyCode::End,
        CrosstermKeyCode::PageUp => KeyCode::PageUp,
        CrosstermKeyCode::PageDown => KeyCode::PageDown,
        CrosstermKeyCode::Insert => KeyCode::Insert,
        CrosstermKeyCode::F(n) => KeyCode::F(n),
        _ => KeyCode::Null,
    };

    let kind = match event.kind {
        KeyEventKind::Press => KeyKind::Pressed,
        KeyEventKind::Repeat => KeyKind::Repeated,
        KeyEventKind::Release => KeyKind::Released,
    };

    let location = if event.state.contains(KeyEventState::KEYPAD) {
        KeyLocation::Numpad
    } else {
        match event.code {
            CrosstermKeyCode::Modifier(m) => modifier_side(m),
            _ => KeyLocation::Standard,
        }
    };

    KeyStroke {
        code,
        modifiers,
        kind,
        location,
    }
}

/// Only reported by terminals with the kitty keyboard protocol enabled.
fn modifier_side(key: ModifierKeyCode) -> KeyLocation {
    use ModifierKeyCode::*;
    match key {
        LeftShift | LeftControl | LeftAlt | LeftSuper | LeftHyper | LeftMeta => KeyLocation::Left,
        RightShift | RightControl | RightAlt | RightSuper | RightHyper | RightMeta => {
            KeyLocation::Right
        }
        IsoLevel3Shift | IsoLevel5Shift => KeyLocation::Standard,
    }
}

fn convert_modifiers(mods: KeyModifiers) -> Modifier {
    let mut out = Modifier::empty();
    if mods.contains(KeyModifiers::SHIFT) {
        out |= Modifier::SHIFT;
    }
    if mods.contains(KeyModifiers::ALT) {
        out |= Modifier::ALT;
    }
    if mods.contains(KeyModifiers::CONTROL) {
        out |= Modifier::CTRL;
    }
    if mods.contains(KeyModifiers::SUPER) {
        out |= Modifier::SUPER;
    }
    out
}

// =============================================================================
// RAW MODE
// =============================================================================

/// Raw mode plus focus reporting for as long as the guard lives.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnableFocusChange) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), DisableFocusChange);
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "failed to restore terminal mode");
        }
    }
}

// =============================================================================
// SOURCE
// =============================================================================

/// Dedicated terminal reader thread feeding a sink.
pub struct TerminalSource {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    focused: Arc<AtomicBool>,
}

impl TerminalSource {
    /// Spawn the reader thread. Key descriptions are logged at debug level
    /// when `log_keys` is set.
    pub fn spawn<S>(sink: S, log_keys: bool) -> io::Result<Self>
    where
        S: KeySink + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        // A terminal that delivers our keys is focused until it says otherwise.
        let focused = Arc::new(AtomicBool::new(true));

        let running_clone = running.clone();
        let focused_clone = focused.clone();

        let handle = thread::Builder::new()
            .name("keyqueue-terminal".to_string())
            .spawn(move || {
                Self::read_loop(sink, log_keys, running_clone, focused_clone);
            })?;

        Ok(Self {
            handle: Some(handle),
            running,
            focused,
        })
    }

    fn read_loop<S: KeySink>(
        sink: S,
        log_keys: bool,
        running: Arc<AtomicBool>,
        focused: Arc<AtomicBool>,
    ) {
        while running.load(Ordering::Relaxed) {
            match event::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    tracing::error!(error = %e, "terminal poll failed; source stopping");
                    break;
                }
            }

            match event::read() {
                Ok(CrosstermEvent::Key(key)) => {
                    let stroke = convert_key_event(key);
                    if log_keys {
                        tracing::debug!("{}", describe(&stroke));
                    }
                    forward(&stroke, &sink);
                }
                Ok(CrosstermEvent::FocusGained) => {
                    focused.store(true, Ordering::Relaxed);
                    tracing::debug!("terminal focus gained");
                }
                Ok(CrosstermEvent::FocusLost) => {
                    focused.store(false, Ordering::Relaxed);
                    tracing::debug!("terminal focus lost");
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal read failed; source stopping");
                    break;
                }
            }
        }
        running.store(false, Ordering::Relaxed);
    }

    /// Whether the terminal last reported having focus.
    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::Relaxed)
    }

    /// Whether the reader thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the reader thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("terminal reader thread panicked");
            }
        }
    }
}

impl Drop for TerminalSource {
    fn drop(&mut self) {
        self.stop();
    }
}
