//! Script mode: feed key scripts to files or stdin without a terminal.

use crate::cli::Cli;
use crate::config::Config;
use crate::core::input::{Key, parse_keys};
use crate::core::rope_view::RopeView;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};

use super::session::Session;
use super::validate_file_path;

/// Collect the keys from every `-e` script and the `-f` script file, in order.
pub fn load_keys(cli: &Cli) -> Result<Vec<Key>, Box<dyn std::error::Error>> {
    let mut keys = Vec::new();
    for script in &cli.keys {
        keys.extend(parse_keys(script).map_err(|e| format!("Error parsing script: {}", e))?);
    }

    if let Some(script_path) = &cli.script_file {
        let validated_path = validate_file_path(script_path)?;
        let reader = BufReader::new(File::open(&validated_path)?);
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() && !line.starts_with('#') {
                keys.extend(
                    parse_keys(&line)
                        .map_err(|e| format!("Error parsing script from file: {}", e))?,
                );
            }
        }
    }

    Ok(keys)
}

/// Run `keys` against `view` in `session`. Errors and notices are written
/// to `messages`, one per line; the edited view is handed back and the
/// session keeps its registers for the next document.
pub fn edit(
    session: &mut Session,
    view: RopeView,
    keys: &[Key],
    messages: &mut impl Write,
) -> io::Result<RopeView> {
    session.swap_view(view);
    for (i, &key) in keys.iter().enumerate() {
        if !session.is_active() {
            tracing::debug!(remaining = keys.len() - i, "mode exited, ignoring remaining keys");
            break;
        }
        if !session.handle_key(key).consumed() {
            tracing::trace!(key = %key, "unhandled key");
        }
        if let Some(message) = session.message() {
            writeln!(messages, "{}", message)?;
        }
    }
    if session.finish() {
        writeln!(messages, "incomplete command at end of script")?;
    }
    Ok(session.swap_view(RopeView::from_string("")))
}

/// Run in script mode. One session serves every file, so registers filled
/// in one document can be put in the next.
pub fn run_script_mode(cli: &Cli, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let keys = load_keys(cli)?;
    let stderr = io::stderr();
    let mut session = Session::new(config, RopeView::from_string(""));

    if cli.files.is_empty() {
        if cli.in_place {
            return Err("--in-place needs at least one file".into());
        }
        let mut text = String::new();
        io::stdin().lock().read_to_string(&mut text)?;
        let view = edit(
            &mut session,
            RopeView::from_string(&text),
            &keys,
            &mut stderr.lock(),
        )?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(view.to_string().as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    for file_path in &cli.files {
        let validated_path = validate_file_path(file_path)?;
        let view = RopeView::from_file(&validated_path)?;
        let mut view = edit(&mut session, view, &keys, &mut stderr.lock())?;

        if cli.in_place {
            view.save()?;
        } else {
            let mut stdout = io::stdout().lock();
            stdout.write_all(view.to_string().as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, script: &str) -> (String, String) {
        let keys = parse_keys(script).unwrap();
        let mut messages = Vec::new();
        let mut session = Session::new(&Config::default(), RopeView::from_string(""));
        let view = edit(&mut session, RopeView::from_string(text), &keys, &mut messages).unwrap();
        (view.to_string(), String::from_utf8(messages).unwrap())
    }

    #[test]
    fn test_edit_applies_keys() {
        let (text, messages) = run("one two three\n", "wdw");
        assert_eq!(text, "one three\n");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_edit_reports_errors_and_continues() {
        let (text, messages) = run("abc\n", "3\"x");
        assert_eq!(text, "bc\n");
        assert_eq!(messages.lines().count(), 1);
    }

    #[test]
    fn test_edit_commits_trailing_insert() {
        let (text, messages) = run("world\n", "ihello ");
        assert_eq!(text, "hello world\n");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_edit_reports_dangling_command() {
        let (text, messages) = run("abc\n", "d");
        assert_eq!(text, "abc\n");
        assert_eq!(messages.trim(), "incomplete command at end of script");
    }

    #[test]
    fn test_load_keys_from_script_file() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "# delete a word").unwrap();
        writeln!(script).unwrap();
        writeln!(script, "dw").unwrap();
        writeln!(script, "x").unwrap();
        let cli = Cli {
            keys: vec!["j".into()],
            script_file: Some(script.path().to_path_buf()),
            ..Cli::default()
        };
        let keys = load_keys(&cli).unwrap();
        assert_eq!(keys, parse_keys("jdwx").unwrap());
    }
}
