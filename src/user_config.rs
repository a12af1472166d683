// vimode Configuration
// Edit this file to customize the mode, then rebuild

use crate::config::{Config, ESCAPE_KEY, EXIT_KEY, SHIFT_WIDTH, TAB_WIDTH};

/// User configuration function
pub fn configure(config: &mut Config) {
    // Keybindings: each key behaves like the key it is bound to
    // Arrow keys (modern convenience)
    config.bind("Left", "h");
    config.bind("Right", "l");
    config.bind("Up", "k");
    config.bind("Down", "j");
    config.bind("Home", "0");
    config.bind("End", "$");

    // Classic vi aliases
    config.bind("SPC", "l");
    config.bind("BS", "h");
    config.bind("RET", "+");
    config.bind("C-n", "j");
    config.bind("C-p", "k");
    config.bind("C-h", "h");
    config.bind("DEL", "x");
    config.bind("Ins", "i");

    // =========================================================================
    // SETTINGS
    // =========================================================================
    config.set(ESCAPE_KEY, "ESC"); // Cancels a command, ends text input
    config.set(EXIT_KEY, "C-]"); // Leaves the mode
    config.set(SHIFT_WIDTH, 4i64); // Columns moved by > and <
    config.set(TAB_WIDTH, 8i64); // Display width of a tab
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatcher::Dispatcher;
    use crate::core::input::Key;

    #[test]
    fn test_user_configuration_defaults() {
        let mut config = Config::default();
        configure(&mut config);

        assert_eq!(config.keybindings.get("Left"), Some(&"h".to_string()));
        assert_eq!(config.keybindings.get("RET"), Some(&"+".to_string()));
        assert_eq!(config.escape_key(), Key::Esc);
        assert_eq!(config.exit_key(), Key::Ctrl(']'));
        assert_eq!(config.shift_width(), 4);
        assert_eq!(config.tab_width(), 8);
    }

    #[test]
    fn test_every_binding_resolves() {
        let mut config = Config::default();
        configure(&mut config);
        let mut dispatcher = Dispatcher::new(&config);
        for (key, target) in &config.keybindings {
            assert!(dispatcher.bind(key, target), "{key} -> {target} did not resolve");
        }
    }
}
