use crate::core::input::Key;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Terminal events the frontend reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermEvent {
    Key(Key),
    Resize(u16, u16),
    None,
}

#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Check for available events with a timeout
    pub fn poll(&self, timeout: Duration) -> Result<bool, Box<dyn std::error::Error>> {
        Ok(event::poll(timeout)?)
    }

    /// Read the next event without blocking
    pub fn read(&mut self) -> Result<TermEvent, Box<dyn std::error::Error>> {
        if !event::poll(Duration::from_millis(0))? {
            return Ok(TermEvent::None);
        }
        Ok(match event::read()? {
            Event::Key(key_event) => translate_key(key_event)
                .map(TermEvent::Key)
                .unwrap_or(TermEvent::None),
            Event::Resize(cols, rows) => TermEvent::Resize(cols, rows),
            _ => TermEvent::None,
        })
    }
}

/// Convert a crossterm key event into a [`Key`]. Releases are dropped.
pub fn translate_key(key_event: KeyEvent) -> Option<Key> {
    if key_event.kind == KeyEventKind::Release {
        return None;
    }
    let modifiers = key_event.modifiers;
    let alt = modifiers.contains(KeyModifiers::ALT);
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    let key = match key_event.code {
        KeyCode::Char(c) => {
            if ctrl && !alt {
                // Keycodes spell control keys in lower case (`C-r`)
                Key::Ctrl(c.to_ascii_lowercase())
            } else if alt && !ctrl {
                Key::Alt(c)
            } else {
                Key::Char(c)
            }
        }
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::F(n) => Key::F(n),
        KeyCode::Esc => Key::Esc,
        KeyCode::Null => Key::Null,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
        translate_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_plain_and_shifted_chars() {
        assert_eq!(press(KeyCode::Char('j'), KeyModifiers::NONE), Some(Key::Char('j')));
        assert_eq!(press(KeyCode::Char('G'), KeyModifiers::SHIFT), Some(Key::Char('G')));
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(press(KeyCode::Char('r'), KeyModifiers::CONTROL), Some(Key::Ctrl('r')));
        assert_eq!(press(KeyCode::Char('R'), KeyModifiers::CONTROL), Some(Key::Ctrl('r')));
        assert_eq!(
            press(KeyCode::Char(']'), KeyModifiers::CONTROL).map(|k| k.keycode()),
            Some("C-]".to_string())
        );
        assert_eq!(press(KeyCode::Char('x'), KeyModifiers::ALT), Some(Key::Alt('x')));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(press(KeyCode::Esc, KeyModifiers::NONE), Some(Key::Esc));
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE), Some(Key::Enter));
        assert_eq!(press(KeyCode::BackTab, KeyModifiers::SHIFT), Some(Key::Tab));
        assert_eq!(press(KeyCode::CapsLock, KeyModifiers::NONE), None);
    }

    #[test]
    fn test_release_is_dropped() {
        let mut event = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(translate_key(event), None);
    }
}
