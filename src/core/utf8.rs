use unicode_segmentation::UnicodeSegmentation;

/// Char offset of the grapheme boundary after `char_idx` in `text`.
///
/// Returns the text length (in chars) when `char_idx` is in the last cluster.
pub fn next_grapheme_boundary(text: &str, char_idx: usize) -> usize {
    let mut seen = 0;
    for grapheme in text.graphemes(true) {
        let n = grapheme.chars().count();
        if seen + n > char_idx {
            return seen + n;
        }
        seen += n;
    }
    seen
}

/// Char offset of the grapheme boundary strictly before `char_idx` in `text`
pub fn prev_grapheme_boundary(text: &str, char_idx: usize) -> usize {
    let mut seen = 0;
    let mut last = 0;
    for grapheme in text.graphemes(true) {
        if seen >= char_idx {
            break;
        }
        last = seen;
        seen += grapheme.chars().count();
    }
    last
}

/// Get the display width of a single character (for monospace terminal display)
/// Returns 0 for control characters, 1 for ASCII, 2 for wide CJK characters, etc.
pub fn char_width(c: char) -> usize {
    unicode_width::UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Visual (display) width of the first `char_idx` chars of `text`, expanding tabs
pub fn visual_width_up_to(text: &str, char_idx: usize, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    let mut visual_x = 0;
    for c in text.chars().take(char_idx) {
        if c == '\t' {
            visual_x = (visual_x / tab_width + 1) * tab_width;
        } else {
            visual_x += char_width(c);
        }
    }
    visual_x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_boundaries() {
        assert_eq!(next_grapheme_boundary("abc", 0), 1);
        assert_eq!(next_grapheme_boundary("abc", 2), 3);
        assert_eq!(prev_grapheme_boundary("abc", 2), 1);
        assert_eq!(prev_grapheme_boundary("abc", 0), 0);
    }

    #[test]
    fn test_combining_mark_is_one_cluster() {
        // "e" + COMBINING ACUTE ACCENT, then "x"
        let text = "e\u{301}x";
        assert_eq!(next_grapheme_boundary(text, 0), 2);
        assert_eq!(prev_grapheme_boundary(text, 2), 0);
        assert_eq!(next_grapheme_boundary(text, 2), 3);
    }

    #[test]
    fn test_visual_width() {
        assert_eq!(visual_width_up_to("a\tb", 2, 4), 4);
        assert_eq!(visual_width_up_to("日本", 2, 4), 4);
    }
}
