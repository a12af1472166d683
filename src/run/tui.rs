//! Terminal (TUI) mode implementation.

use std::io;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::core::input::Key;
use crate::core::rope_view::RopeView;
use crate::core::view::View;
use crate::terminal;
use crate::terminal::events::TermEvent;

use super::session::Session;
use super::validate_file_path;

/// Saves the file; handled by the frontend before the Dispatcher sees it
const SAVE_KEY: Key = Key::Ctrl('s');

fn open_view(path: &Path) -> Result<RopeView, Box<dyn std::error::Error>> {
    if path.exists() {
        RopeView::from_file(path)
    } else {
        let mut view = RopeView::from_string("");
        view.filename = Some(path.to_path_buf());
        Ok(view)
    }
}

fn save(session: &mut Session) {
    let result = session.view.save();
    session.ui.status = match result {
        Ok(()) => match &session.view.filename {
            Some(path) => format!("\"{}\" written", path.display()),
            None => "written".to_string(),
        },
        Err(err) => {
            tracing::debug!(%err, "save failed");
            format!("Save failed: {}", err)
        }
    };
}

/// Run in terminal (TUI) mode.
pub fn run_terminal_mode(path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let view = open_view(&validate_file_path(path)?)?;
    let tab_width = config.tab_width();
    let mut session = Session::new(config, view);

    let (mut cols, mut rows) = crossterm::terminal::size()?;
    session
        .view
        .set_viewport(0, rows.saturating_sub(1) as usize);

    let _raw_mode = terminal::raw::RawMode::new()?;
    let mut stdout = io::stdout();
    let mut event_handler = terminal::events::EventHandler::new();
    let mut dirty = true;

    while session.is_active() {
        if dirty {
            session.view.ensure_caret_visible();
            let prompt = session.ui.prompt.as_ref().map(|p| p.line());
            let frame = terminal::render::build_frame(
                &session.view,
                &session.ui.status,
                prompt.as_deref(),
                cols,
                rows,
                tab_width,
            );
            terminal::render::draw(&frame, &mut stdout)?;
            dirty = false;
        }

        if !event_handler.poll(Duration::from_millis(50))? {
            continue;
        }
        match event_handler.read()? {
            TermEvent::Key(SAVE_KEY) if session.ui.prompt.is_none() => save(&mut session),
            TermEvent::Key(key) => {
                if !session.handle_key(key).consumed() {
                    tracing::trace!(key = %key, "unhandled key");
                }
            }
            TermEvent::Resize(new_cols, new_rows) => {
                (cols, rows) = (new_cols, new_rows);
                let (first, _) = session.view.visible_lines();
                session
                    .view
                    .set_viewport(first, rows.saturating_sub(1) as usize);
            }
            TermEvent::None => continue,
        }
        dirty = true;
    }

    if session.view.modified {
        tracing::info!(path = %path.display(), "left with unsaved changes");
    }
    Ok(())
}
