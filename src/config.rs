// Configuration module
// Internal representation of user configuration

use std::collections::HashMap;

use crate::core::input::Key;

pub const ESCAPE_KEY: &str = "escape_key";
pub const EXIT_KEY: &str = "exit_key";
pub const SHIFT_WIDTH: &str = "shift_width";
pub const TAB_WIDTH: &str = "tab_width";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Keycode → keycode of the Definition it aliases
    pub keybindings: HashMap<String, String>,
    pub settings: HashMap<String, ConfigValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl Config {
    /// Make `key` behave like the Definition bound to `target`
    pub fn bind(&mut self, key: &str, target: &str) {
        self.keybindings.insert(key.to_string(), target.to_string());
    }

    /// Set a configuration value
    pub fn set<V: Into<ConfigValue>>(&mut self, key: &str, value: V) {
        self.settings.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.settings.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| match v {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| match v {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        })
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| match v {
            ConfigValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }

    fn get_key(&self, setting: &str, fallback: Key) -> Key {
        match self.get_string(setting).map(str::parse::<Key>) {
            Some(Ok(key)) => key,
            Some(Err(err)) => {
                tracing::warn!(setting, %err, "ignoring invalid key setting");
                fallback
            }
            None => fallback,
        }
    }

    /// Key that cancels a sentence and ends text input
    pub fn escape_key(&self) -> Key {
        self.get_key(ESCAPE_KEY, Key::Esc)
    }

    /// Key that leaves the mode entirely
    pub fn exit_key(&self) -> Key {
        self.get_key(EXIT_KEY, Key::Ctrl(']'))
    }

    /// Columns added or removed by `>` and `<`
    pub fn shift_width(&self) -> usize {
        self.get_int(SHIFT_WIDTH)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(4)
    }

    pub fn tab_width(&self) -> usize {
        self.get_int(TAB_WIDTH)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(8)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(i)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.keybindings.is_empty());
        assert_eq!(config.escape_key(), Key::Esc);
        assert_eq!(config.exit_key(), Key::Ctrl(']'));
        assert_eq!(config.shift_width(), 4);
        assert_eq!(config.tab_width(), 8);
    }

    #[test]
    fn test_bind_key() {
        let mut config = Config::default();
        config.bind("BS", "h");
        assert_eq!(config.keybindings.get("BS"), Some(&"h".to_string()));
    }

    #[test]
    fn test_key_settings() {
        let mut config = Config::default();
        config.set(ESCAPE_KEY, "C-c");
        config.set(EXIT_KEY, "F10");
        assert_eq!(config.escape_key(), Key::Ctrl('c'));
        assert_eq!(config.exit_key(), Key::F(10));

        config.set(ESCAPE_KEY, "<nonsense>");
        assert_eq!(config.escape_key(), Key::Esc);
    }

    #[test]
    fn test_type_mismatch() {
        let mut config = Config::default();
        config.set(SHIFT_WIDTH, "wide");
        assert_eq!(config.get_int(SHIFT_WIDTH), None);
        assert_eq!(config.shift_width(), 4);
        config.set(SHIFT_WIDTH, -2i64);
        assert_eq!(config.shift_width(), 4);
        config.set(SHIFT_WIDTH, 2i64);
        assert_eq!(config.shift_width(), 2);
    }
}
