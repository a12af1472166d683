//! Application execution modes for vimode.
//!
//! - Script mode feeds key scripts to files or stdin
//! - Terminal mode edits one file interactively

mod script;
mod session;
mod tui;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

pub use script::{edit, load_keys, run_script_mode};
pub use session::{Session, SessionUi};
pub use tui::run_terminal_mode;

/// Editor execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Script,
    Terminal,
}

/// Validate and canonicalize file paths to prevent directory traversal and block device files.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let canonical = match path.canonicalize() {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // File doesn't exist yet - validate the parent directory
            match (path.parent(), path.file_name()) {
                (Some(parent), Some(filename)) if !parent.as_os_str().is_empty() => parent
                    .canonicalize()
                    .map_err(|_| "Invalid parent directory")?
                    .join(filename),
                (_, Some(_)) => std::env::current_dir()
                    .map_err(|_| "Cannot determine current directory")?
                    .join(path),
                _ => return Err("Invalid file path: missing filename".into()),
            }
        }
        Err(e) => return Err(format!("Invalid path: {}", e).into()),
    };

    // Special files would hang or never end
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if let Ok(metadata) = std::fs::metadata(&canonical) {
            let ft = metadata.file_type();
            if ft.is_char_device() {
                return Err("Cannot open character device files (e.g., /dev/zero)".into());
            }
            if ft.is_block_device() {
                return Err("Cannot open block device files".into());
            }
            if ft.is_fifo() {
                return Err("Cannot open FIFO/named pipe files".into());
            }
            if ft.is_socket() {
                return Err("Cannot open socket files".into());
            }
        }
    }

    Ok(canonical)
}

/// Detect the mode from the arguments and the attached streams.
pub fn detect_mode(
    has_script: bool,
    files: &[PathBuf],
) -> Result<EditorMode, Box<dyn std::error::Error>> {
    let is_tty = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
    detect_mode_internal(has_script, is_tty, files.len())
}

/// Internal mode detection with the terminal check injected.
pub fn detect_mode_internal(
    has_script: bool,
    is_tty: bool,
    file_count: usize,
) -> Result<EditorMode, Box<dyn std::error::Error>> {
    if has_script || !is_tty {
        return Ok(EditorMode::Script);
    }
    match file_count {
        1 => Ok(EditorMode::Terminal),
        0 => Err("No file given. Use --help for usage.".into()),
        _ => Err("Terminal mode edits a single file; use -e to script several".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mode_script() {
        assert_eq!(detect_mode_internal(true, true, 1).unwrap(), EditorMode::Script);
        assert_eq!(detect_mode_internal(false, false, 0).unwrap(), EditorMode::Script);
    }

    #[test]
    fn test_detect_mode_terminal() {
        assert_eq!(detect_mode_internal(false, true, 1).unwrap(), EditorMode::Terminal);
        assert!(detect_mode_internal(false, true, 0).is_err());
        assert!(detect_mode_internal(false, true, 2).is_err());
    }

    #[test]
    fn test_validate_new_file_in_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        let validated = validate_file_path(&path).unwrap();
        assert_eq!(validated.file_name(), path.file_name());
    }

    #[test]
    fn test_validate_rejects_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("new.txt");
        assert!(validate_file_path(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_rejects_devices() {
        assert!(validate_file_path(Path::new("/dev/null")).is_err());
    }
}
