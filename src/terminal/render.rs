//! Terminal rendering
//!
//! A frame is built as plain rows first (text lines plus one status row at
//! the bottom) and then written out in one pass with crossterm.

use std::io::Write;

use crossterm::{QueueableCommand, cursor, terminal};

use crate::core::rope_view::RopeView;
use crate::core::utf8::{char_width, visual_width_up_to};
use crate::core::view::View;

/// Rows to draw and where the terminal cursor goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub rows: Vec<String>,
    pub cursor: (u16, u16),
}

/// Expand tabs and cut `text` to `width` columns
fn fit(text: &str, width: usize, tab_width: usize) -> String {
    let tab_width = tab_width.max(1);
    let mut out = String::new();
    let mut col = 0;
    for c in text.chars() {
        if c == '\t' {
            let next = ((col / tab_width + 1) * tab_width).min(width);
            out.extend(std::iter::repeat_n(' ', next - col));
            col = next;
        } else {
            let w = char_width(c);
            if col + w > width {
                break;
            }
            out.push(c);
            col += w;
        }
        if col >= width {
            break;
        }
    }
    out
}

/// Lay out the visible part of `view` on a `cols` x `rows` screen. With a
/// prompt open the cursor sits at its end, otherwise on the caret.
pub fn build_frame(
    view: &RopeView,
    status: &str,
    prompt: Option<&str>,
    cols: u16,
    rows: u16,
    tab_width: usize,
) -> Frame {
    let width = cols as usize;
    let text_rows = rows.saturating_sub(1) as usize;
    let (first, last) = view.visible_lines();

    let mut lines = Vec::with_capacity(rows as usize);
    for line in first..=last {
        if lines.len() >= text_rows {
            break;
        }
        lines.push(fit(&view.line_text(line), width, tab_width));
    }
    while lines.len() < text_rows {
        lines.push("~".to_string());
    }

    let bottom = prompt.unwrap_or(status);
    lines.push(fit(bottom, width, tab_width));

    let cursor = match prompt {
        Some(text) => {
            let x = visual_width_up_to(text, text.chars().count(), tab_width);
            (x.min(width.saturating_sub(1)) as u16, rows.saturating_sub(1))
        }
        None => {
            let line = view.current_line();
            let x = visual_width_up_to(&view.line_text(line), view.column(), tab_width);
            let y = line.saturating_sub(first).min(text_rows.saturating_sub(1));
            (x.min(width.saturating_sub(1)) as u16, y as u16)
        }
    };

    Frame {
        rows: lines,
        cursor,
    }
}

/// Write a frame to the terminal
pub fn draw(frame: &Frame, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    out.queue(cursor::Hide)?;
    for (y, row) in frame.rows.iter().enumerate() {
        out.queue(cursor::MoveTo(0, y as u16))?;
        out.queue(terminal::Clear(terminal::ClearType::CurrentLine))?;
        write!(out, "{}", row)?;
    }
    out.queue(cursor::MoveTo(frame.cursor.0, frame.cursor.1))?;
    out.queue(cursor::Show)?;
    out.flush()?;
    Ok(())
}
