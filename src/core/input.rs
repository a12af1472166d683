use std::fmt;
use std::str::FromStr;

/// Native key representation for vimode
///
/// The `Display` rendering of a key is its *keycode*: the string used to look
/// up Definitions (`j`, `C-r`, `ESC`, `SPC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Alt(char),
    F(u8),
    Esc,
    Enter,
    Backspace,
    Tab,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Insert,
    Null,
}

impl Key {
    /// The character carried by a plain printable key
    pub fn printable(&self) -> Option<char> {
        match self {
            Key::Char(c) if !c.is_control() => Some(*c),
            Key::Tab => Some('\t'),
            _ => None,
        }
    }

    /// Decimal value of a plain digit key
    pub fn digit(&self) -> Option<usize> {
        match self {
            Key::Char(c) => c.to_digit(10).map(|d| d as usize),
            _ => None,
        }
    }

    /// Keycode string used for Definition lookup
    pub fn keycode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => write!(f, "SPC"),
            Key::Char(c) => write!(f, "{}", c),
            Key::Ctrl(c) => write!(f, "C-{}", c),
            Key::Alt(c) => write!(f, "M-{}", c),
            Key::F(n) => write!(f, "F{}", n),
            Key::Esc => write!(f, "ESC"),
            Key::Enter => write!(f, "RET"),
            Key::Backspace => write!(f, "BS"),
            Key::Tab => write!(f, "TAB"),
            Key::Delete => write!(f, "DEL"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::PageUp => write!(f, "PgUp"),
            Key::PageDown => write!(f, "PgDn"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Insert => write!(f, "Ins"),
            Key::Null => write!(f, "NUL"),
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let first = chars.next();
        let rest: String = chars.collect();

        // Ctrl notation: ^X
        if first == Some('^') && rest.chars().count() == 1 {
            if let Some(c) = rest.chars().next() {
                return Ok(Key::Ctrl(c.to_ascii_lowercase()));
            }
        }

        // Ctrl / Meta notation: C-x, M-x
        for (prefix, make) in [
            ("C-", Key::Ctrl as fn(char) -> Key),
            ("M-", Key::Alt as fn(char) -> Key),
        ] {
            if let Some(tail) = s.strip_prefix(prefix) {
                let mut tail_chars = tail.chars();
                if let (Some(c), None) = (tail_chars.next(), tail_chars.next()) {
                    return Ok(make(c.to_ascii_lowercase()));
                }
            }
        }

        match s.to_ascii_uppercase().as_str() {
            "ENTER" | "RET" | "CR" => Ok(Key::Enter),
            "TAB" => Ok(Key::Tab),
            "BACKSPACE" | "BS" => Ok(Key::Backspace),
            "ESC" | "ESCAPE" => Ok(Key::Esc),
            "DELETE" | "DEL" => Ok(Key::Delete),
            "SPACE" | "SPC" => Ok(Key::Char(' ')),
            "HOME" => Ok(Key::Home),
            "END" => Ok(Key::End),
            "PAGEUP" | "PGUP" => Ok(Key::PageUp),
            "PAGEDOWN" | "PGDN" => Ok(Key::PageDown),
            "UP" => Ok(Key::Up),
            "DOWN" => Ok(Key::Down),
            "LEFT" => Ok(Key::Left),
            "RIGHT" => Ok(Key::Right),
            "INSERT" | "INS" => Ok(Key::Insert),
            "NUL" | "NULL" => Ok(Key::Null),
            "LT" => Ok(Key::Char('<')),
            _ => {
                // Function keys F1-F24
                if let Some(num) = s.strip_prefix('F') {
                    if let Ok(n) = num.parse::<u8>() {
                        if (1..=24).contains(&n) {
                            return Ok(Key::F(n));
                        }
                    }
                }

                // Single raw character, case preserved
                match (first, rest.is_empty()) {
                    (Some(c), true) => Ok(Key::Char(c)),
                    _ => Err(format!("Unknown key: {}", s)),
                }
            }
        }
    }
}

/// Parse a key script such as `3dw` or `ihello<Esc>` into keys.
///
/// Plain characters stand for themselves; `<name>` names a special key using
/// the same notation as [`Key::from_str`]. A `<` that does not start a valid
/// `<name>` is taken literally.
pub fn parse_keys(script: &str) -> Result<Vec<Key>, String> {
    let chars: Vec<char> = script.chars().collect();
    let mut keys = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '<' {
            if let Some(close) = chars[i + 1..].iter().position(|&ch| ch == '>') {
                let name: String = chars[i + 1..i + 1 + close].iter().collect();
                if !name.is_empty() {
                    keys.push(
                        name.parse::<Key>()
                            .map_err(|e| format!("{} in key script at {}", e, i))?,
                    );
                    i += close + 2;
                    continue;
                }
            }
        }
        keys.push(match c {
            '\n' => Key::Enter,
            '\t' => Key::Tab,
            '\u{1b}' => Key::Esc,
            other => Key::Char(other),
        });
        i += 1;
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_str() {
        assert_eq!("^R".parse::<Key>(), Ok(Key::Ctrl('r')));
        assert_eq!("C-r".parse::<Key>(), Ok(Key::Ctrl('r')));
        assert_eq!("M-x".parse::<Key>(), Ok(Key::Alt('x')));
        assert_eq!("Esc".parse::<Key>(), Ok(Key::Esc));
        assert_eq!("CR".parse::<Key>(), Ok(Key::Enter));
        assert_eq!("F12".parse::<Key>(), Ok(Key::F(12)));
        assert_eq!("a".parse::<Key>(), Ok(Key::Char('a')));
        assert_eq!("A".parse::<Key>(), Ok(Key::Char('A')));
        assert!("bogus".parse::<Key>().is_err());
    }

    #[test]
    fn test_keycode_display_round_trips() {
        for key in [
            Key::Char('j'),
            Key::Char(' '),
            Key::Ctrl('r'),
            Key::Esc,
            Key::Enter,
            Key::Backspace,
            Key::F(3),
            Key::Left,
        ] {
            assert_eq!(key.keycode().parse::<Key>(), Ok(key));
        }
    }

    #[test]
    fn test_printable_and_digit() {
        assert_eq!(Key::Char('x').printable(), Some('x'));
        assert_eq!(Key::Char('\u{7}').printable(), None);
        assert_eq!(Key::Esc.printable(), None);
        assert_eq!(Key::Char('7').digit(), Some(7));
        assert_eq!(Key::Ctrl('7').digit(), None);
    }

    #[test]
    fn test_parse_keys() {
        let keys = parse_keys("3dw").unwrap();
        assert_eq!(keys, vec![Key::Char('3'), Key::Char('d'), Key::Char('w')]);

        let keys = parse_keys("ihi<Esc>:<CR>").unwrap();
        assert_eq!(
            keys,
            vec![
                Key::Char('i'),
                Key::Char('h'),
                Key::Char('i'),
                Key::Esc,
                Key::Char(':'),
                Key::Enter
            ]
        );
    }

    #[test]
    fn test_parse_keys_literal_angle() {
        assert_eq!(parse_keys("<<").unwrap(), vec![Key::Char('<'), Key::Char('<')]);
        assert_eq!(parse_keys("<lt>").unwrap(), vec![Key::Char('<')]);
        assert!(parse_keys("<Nope>").is_err());
    }
}
