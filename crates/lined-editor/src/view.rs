//! View — a terminal viewport over a document.
//!
//! A [`View`] is the concrete [`CursorRenderer`] the binary uses. It handles:
//!
//! - **Scrolling** — keeps the caret line on screen, nearest edge first,
//!   with optional `scrolloff` context rows
//! - **Native cursor** — the collapsed selection left by the last caret sync
//!   or mouse click, reported back through
//!   [`native_selection`](CursorRenderer::native_selection)
//! - **Hit testing** — maps a screen cell to a [`ClickTarget`]
//! - **Painting** — line-number gutter, text, `~` rows past the end, and a
//!   status line
//!
//! The view owns no text. The [`Document`] is passed to every call that
//! needs it, so the controller can keep exclusive ownership of the lines.
//!
//! ```text
//! ┌──────┬────────────────────────┐
//! │gutter│      text area         │ ← rows - 1
//! │      │                        │
//! ├──────┴────────────────────────┤
//! │         status line           │ ← 1 row
//! └───────────────────────────────┘
//! ```

use std::io::{self, Write};

use lined_term::ansi;
use unicode_width::UnicodeWidthChar;

use crate::controller::ClickTarget;
use crate::document::Document;
use crate::options::EditorOptions;
use crate::render::{CursorRenderer, NativeSelection, SelectionAnchor};

/// Display columns per tab stop.
pub const TAB_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Columns needed for right-aligned line numbers plus a separator space.
/// 0 when `show_numbers` is false.
#[must_use]
pub fn gutter_width(line_count: usize, show_numbers: bool) -> u16 {
    if !show_numbers {
        return 0;
    }
    let digits = line_count.max(1).ilog10() + 1;
    // digits <= 20 for usize::MAX.
    #[allow(clippy::cast_possible_truncation)]
    let width = digits as u16 + 1;
    width
}

/// Display width of `ch` starting at display column `at`. Tabs run to the
/// next stop; control characters take no space.
fn char_width(ch: char, at: usize) -> usize {
    if ch == '\t' {
        (at / TAB_WIDTH + 1) * TAB_WIDTH - at
    } else {
        ch.width().unwrap_or(0)
    }
}

/// Display column of char offset `char_col` within `text`.
#[must_use]
pub fn char_col_to_display_col(text: &str, char_col: usize) -> usize {
    text.chars()
        .take(char_col)
        .fold(0, |col, ch| col + char_width(ch, col))
}

/// Char offset of the character covering display column `display_col`, or
/// the line length if the column lies past the end.
#[must_use]
pub fn display_col_to_char_col(text: &str, display_col: usize) -> usize {
    let mut col = 0;
    let mut count = 0;
    for ch in text.chars() {
        let w = char_width(ch, col);
        if w > 0 && display_col < col + w {
            return count;
        }
        col += w;
        count += 1;
    }
    count
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A terminal viewport. See the module docs for the layout.
#[derive(Debug, Clone)]
pub struct View {
    cols: u16,
    rows: u16,
    /// First visible document line (0-indexed).
    top_line: usize,
    scrolloff: usize,
    line_numbers: bool,
    /// Last `(line, offset)` the caret showed.
    cursor: Option<(usize, usize)>,
    selection: Option<NativeSelection>,
    message: Option<String>,
}

impl View {
    /// A `cols` x `rows` viewport, line numbers on.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            top_line: 0,
            scrolloff: 0,
            line_numbers: true,
            cursor: None,
            selection: None,
            message: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn top_line(&self) -> usize {
        self.top_line
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    /// Rows available for text (everything but the status line).
    #[inline]
    #[must_use]
    pub const fn text_height(&self) -> usize {
        self.rows.saturating_sub(1) as usize
    }

    /// Last `(line, offset)` the caret showed.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Option<(usize, usize)> {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn scrolloff(&self) -> usize {
        self.scrolloff
    }

    #[inline]
    #[must_use]
    pub const fn line_numbers(&self) -> bool {
        self.line_numbers
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // -- Configuration ------------------------------------------------------

    /// Change the viewport size. Call the caret's sync afterwards so the
    /// caret line is scrolled back into view.
    pub const fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub const fn set_scrolloff(&mut self, scrolloff: usize) {
        self.scrolloff = scrolloff;
    }

    pub const fn set_line_numbers(&mut self, show: bool) {
        self.line_numbers = show;
    }

    pub const fn set_top_line(&mut self, line: usize) {
        self.top_line = line;
    }

    /// Show `msg` on the status line until cleared.
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    // -- Mouse --------------------------------------------------------------

    /// What the cell at `(x, y)` belongs to. Rows past the last line and the
    /// status line count as the container.
    #[must_use]
    pub fn hit_test(&self, doc: &Document, _x: u16, y: u16) -> ClickTarget {
        let row = y as usize;
        if row >= self.text_height() {
            return ClickTarget::Container;
        }
        let line = self.top_line + row;
        if line < doc.line_count() {
            ClickTarget::Line(line)
        } else {
            ClickTarget::Container
        }
    }

    /// Move the native cursor to the cell under a click and return what was
    /// hit. The selection lands inside the line's text at the clicked
    /// column; clicks on the gutter land at offset 0.
    pub fn place_native_cursor(&mut self, doc: &Document, x: u16, y: u16) -> ClickTarget {
        let target = self.hit_test(doc, x, y);
        self.selection = Some(match target {
            ClickTarget::Container => NativeSelection::new(SelectionAnchor::Container, 0),
            ClickTarget::Line(index) => {
                let text = doc.line(index).map_or("", |l| l.text());
                let gutter = gutter_width(doc.line_count(), self.line_numbers);
                let col = x.saturating_sub(gutter) as usize;
                let anchor = if text.is_empty() {
                    SelectionAnchor::Line(index)
                } else {
                    SelectionAnchor::LineText(index)
                };
                NativeSelection::new(anchor, display_col_to_char_col(text, col))
            }
        });
        target
    }

    // -- Painting -----------------------------------------------------------

    /// Screen cell of the cursor, or `None` if it is off screen.
    #[must_use]
    pub fn screen_cursor(&self, doc: &Document) -> Option<(u16, u16)> {
        let (line, offset) = self.cursor?;
        if line < self.top_line || line >= self.top_line + self.text_height() {
            return None;
        }
        let text = doc.line(line)?.text();
        let gutter = gutter_width(doc.line_count(), self.line_numbers);
        let col = char_col_to_display_col(text, offset);
        let max_x = self.cols.saturating_sub(1);
        let x = u16::try_from(col)
            .unwrap_or(u16::MAX)
            .saturating_add(gutter)
            .min(max_x);
        let y = u16::try_from(line - self.top_line).ok()?;
        Some((x, y))
    }

    /// Paint the whole viewport. `title` names the document on the status
    /// line.
    ///
    /// # Errors
    ///
    /// Any write error from `out`.
    pub fn paint(&self, doc: &Document, title: &str, out: &mut impl Write) -> io::Result<()> {
        ansi::cursor_hide(out)?;
        if self.cols == 0 || self.rows == 0 {
            return Ok(());
        }

        let gutter = gutter_width(doc.line_count(), self.line_numbers);
        let text_width = self.cols.saturating_sub(gutter) as usize;

        for row in 0..self.text_height() {
            // row < rows, which is a u16.
            #[allow(clippy::cast_possible_truncation)]
            ansi::cursor_to(out, 0, row as u16)?;
            let index = self.top_line + row;
            match doc.line(index) {
                Some(line) => {
                    if gutter > 0 {
                        paint_line_number(out, gutter, index + 1)?;
                    }
                    paint_text(out, line.text(), text_width)?;
                }
                None => out.write_all(b"~")?,
            }
            ansi::clear_line_tail(out)?;
        }

        self.paint_status(doc, title, out)?;

        if let Some((x, y)) = self.screen_cursor(doc) {
            ansi::cursor_to(out, x, y)?;
            ansi::cursor_show(out)?;
        }
        out.flush()
    }

    fn paint_status(&self, doc: &Document, title: &str, out: &mut impl Write) -> io::Result<()> {
        let width = self.cols as usize;
        let left = match &self.message {
            Some(msg) => format!(" {title} | {msg}"),
            None => format!(" {title}"),
        };
        let (line, col) = self.cursor.map_or((1, 1), |(l, o)| (l + 1, o + 1));
        let right = format!(
            " {line}:{col} | {} lines | {} ",
            doc.line_count(),
            doc.line_ending()
        );

        let right_len = right.chars().count().min(width);
        let left: String = left.chars().take(width - right_len).collect();
        let fill = width - right_len - left.chars().count();

        // rows >= 1 here.
        ansi::cursor_to(out, 0, self.rows - 1)?;
        ansi::inverse(out)?;
        write!(out, "{left}{:fill$}", "")?;
        out.write_all(right.chars().take(right_len).collect::<String>().as_bytes())?;
        ansi::reset(out)
    }
}

impl CursorRenderer for View {
    fn show_cursor_at(&mut self, line_index: usize, offset: usize) {
        self.cursor = Some((line_index, offset));
        self.selection = Some(NativeSelection::new(
            SelectionAnchor::LineText(line_index),
            offset,
        ));
    }

    fn scroll_into_view(&mut self, line_index: usize) {
        let height = self.text_height();
        if height == 0 {
            return;
        }
        let so = self.scrolloff.min((height - 1) / 2);
        if line_index < self.top_line + so {
            self.top_line = line_index.saturating_sub(so);
        } else if line_index + so >= self.top_line + height {
            self.top_line = line_index + so + 1 - height;
        }
    }

    fn native_selection(&self) -> Option<NativeSelection> {
        self.selection
    }

    fn apply_options(&mut self, options: &EditorOptions) {
        self.set_scrolloff(options.scrolloff);
        self.set_line_numbers(options.line_numbers);
    }
}

// ---------------------------------------------------------------------------
// Painting helpers
// ---------------------------------------------------------------------------

/// Right-aligned, dimmed line number followed by the separator space.
fn paint_line_number(out: &mut impl Write, gutter: u16, number: usize) -> io::Result<()> {
    let digits = gutter.saturating_sub(1) as usize;
    ansi::dim(out)?;
    write!(out, "{number:>digits$} ")?;
    ansi::reset(out)
}

/// Line text clipped to `width` display columns, tabs expanded.
fn paint_text(out: &mut impl Write, text: &str, width: usize) -> io::Result<()> {
    let mut col = 0;
    let mut buf = String::with_capacity(text.len());
    for ch in text.chars() {
        let w = char_width(ch, col);
        if w == 0 {
            continue;
        }
        if col + w > width {
            break;
        }
        if ch == '\t' {
            buf.extend(std::iter::repeat_n(' ', w));
        } else {
            buf.push(ch);
        }
        col += w;
    }
    out.write_all(buf.as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
