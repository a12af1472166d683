//! Command-line argument parsing for vimode.
//!
//! This module provides the `Cli` struct which encapsulates all command-line
//! options and methods for parsing them.

use crate::config::{Config, ConfigValue, ESCAPE_KEY, EXIT_KEY};
use crate::core::input::Key;
use std::path::PathBuf;

const HELP: &str = "\
vimode - a vi command interpreter

Usage: vimode [OPTIONS] [FILES...]

With no script the single FILE is opened interactively.

Options:
  -h, --help          Show this help message
  -e, --keys SCRIPT   Feed a key script, e.g. '3dw' or 'cwnew<Esc>'
  -f, --file PATH     Read key scripts from a file, one per line
  -i, --in-place      Write results back to the files
      --escape KEY    Key that cancels a command (default ESC)
      --exit KEY      Key that leaves the mode (default C-])
";

/// Command-line interface configuration.
#[derive(Debug, Default, PartialEq)]
pub struct Cli {
    /// File(s) to edit
    pub files: Vec<PathBuf>,

    /// Key scripts to execute (-e flag)
    pub keys: Vec<String>,

    /// Script file path (-f flag)
    pub script_file: Option<PathBuf>,

    /// Edit files in-place
    pub in_place: bool,

    /// Escape key override
    pub escape: Option<String>,

    /// Exit key override
    pub exit: Option<String>,

    /// Help was requested
    pub help: bool,
}

impl Cli {
    /// Parse the process arguments.
    pub fn parse() -> Result<Self, Box<dyn std::error::Error>> {
        let cli = Self::parse_from(std::env::args().skip(1))?;
        if cli.help {
            print!("{}", HELP);
            std::process::exit(0);
        }
        Ok(cli)
    }

    /// Parse an argument list (without the program name).
    pub fn parse_from<I>(args: I) -> Result<Self, Box<dyn std::error::Error>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-i" | "--in-place" => cli.in_place = true,
                "-h" | "--help" => cli.help = true,
                "-e" | "--keys" => {
                    let script = args.next().ok_or("--keys requires a value")?;
                    cli.keys.push(script);
                }
                "-f" | "--file" => {
                    let path = args.next().ok_or("--file requires a value")?;
                    cli.script_file = Some(PathBuf::from(path));
                }
                "--escape" => {
                    let key = args.next().ok_or("--escape requires a value")?;
                    cli.escape = Some(checked_key(key)?);
                }
                "--exit" => {
                    let key = args.next().ok_or("--exit requires a value")?;
                    cli.exit = Some(checked_key(key)?);
                }
                "--" => {
                    cli.files.extend(args.by_ref().map(PathBuf::from));
                }
                arg if arg.starts_with('-') && arg.len() > 1 => {
                    return Err(format!("Unknown flag: {}. Use --help for usage.", arg).into());
                }
                _ => cli.files.push(PathBuf::from(arg)),
            }
        }

        Ok(cli)
    }

    /// Whether any key script was given
    pub fn has_script(&self) -> bool {
        !self.keys.is_empty() || self.script_file.is_some()
    }

    /// Apply CLI overrides to a configuration object.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(key) = &self.escape {
            config.set(ESCAPE_KEY, ConfigValue::String(key.clone()));
        }
        if let Some(key) = &self.exit {
            config.set(EXIT_KEY, ConfigValue::String(key.clone()));
        }
    }
}

fn checked_key(name: String) -> Result<String, Box<dyn std::error::Error>> {
    name.parse::<Key>()?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, Box<dyn std::error::Error>> {
        Cli::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_scripts_and_files() {
        let cli = parse(&["-e", "dd", "--keys", "x", "-i", "a.txt", "b.txt"]).unwrap();
        assert_eq!(cli.keys, vec!["dd", "x"]);
        assert!(cli.in_place);
        assert_eq!(cli.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert!(cli.has_script());
    }

    #[test]
    fn test_missing_value() {
        assert!(parse(&["-e"]).is_err());
        assert!(parse(&["--file"]).is_err());
    }

    #[test]
    fn test_unknown_flag() {
        assert!(parse(&["--bogus"]).is_err());
        // A lone dash is a file name
        assert_eq!(parse(&["-"]).unwrap().files, vec![PathBuf::from("-")]);
    }

    #[test]
    fn test_double_dash_ends_flags() {
        let cli = parse(&["--", "-e"]).unwrap();
        assert!(cli.keys.is_empty());
        assert_eq!(cli.files, vec![PathBuf::from("-e")]);
    }

    #[test]
    fn test_key_overrides() {
        let cli = parse(&["--escape", "C-c", "--exit", "C-q"]).unwrap();
        let mut config = Config::default();
        cli.apply_to_config(&mut config);
        assert_eq!(config.escape_key(), Key::Ctrl('c'));
        assert_eq!(config.exit_key(), Key::Ctrl('q'));
        assert!(parse(&["--escape", "NotAKey"]).is_err());
    }
}
