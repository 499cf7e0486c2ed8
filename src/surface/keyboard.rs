//! Non-blocking key polling for the terminal front end.

use std::time::Duration;

use crossterm::{
    event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
    Result,
};

/// A key press relevant to the front end.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Key {
    /// A printable key, lowercased.
    Char(char),
    Escape,
    /// `Ctrl+C`, captured as a key while in raw mode.
    Interrupt,
}

/// Wait up to `timeout` for a key press.
///
/// The terminal is only in raw mode for the duration of the call so that
/// output printed between calls is rendered normally.
pub fn poll_key(timeout: Duration) -> Result<Option<Key>> {
    enable_raw_mode()?;
    let event = match poll(timeout) {
        // It's guaranteed that read() wont block if `poll` returns `Ok(true)`
        Ok(true) => read().map(Some),
        Ok(false) => Ok(None),
        Err(err) => Err(err),
    };
    disable_raw_mode()?;

    Ok(match event? {
        Some(Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers,
        })) if modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Interrupt),
        Some(Event::Key(KeyEvent {
            code: KeyCode::Esc, ..
        })) => Some(Key::Escape),
        Some(Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            ..
        })) => Some(Key::Char(c.to_ascii_lowercase())),
        // Timeout expired with no event, or not a key
        _ => None,
    })
}
