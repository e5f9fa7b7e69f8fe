//! Cursor rendering seam.
//!
//! The caret decides *where* the cursor is; a [`CursorRenderer`] decides how
//! that looks on some display surface. Keeping this trait narrow lets the
//! movement rules run against a terminal [`View`](crate::view::View), a test
//! recorder, or anything else that can show a cursor and scroll a line into
//! view.
//!
//! The renderer is also where "native" cursor state lives: after a mouse
//! click, the surface knows where the pointer landed before the logical
//! caret does. [`NativeSelection`] carries that back to the caret.

use crate::options::EditorOptions;

/// Where the surface's own collapsed selection is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAnchor {
    /// Inside the text content of the line at this index.
    LineText(usize),
    /// On the line element itself (e.g. an empty line with no text).
    Line(usize),
    /// On the container, outside every line.
    Container,
}

/// The surface's collapsed selection: an anchor plus a char offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSelection {
    pub anchor: SelectionAnchor,
    pub offset: usize,
}

impl NativeSelection {
    #[must_use]
    pub const fn new(anchor: SelectionAnchor, offset: usize) -> Self {
        Self { anchor, offset }
    }

    /// True if this selection sits inside the line at `index` (its text or
    /// the line itself).
    #[must_use]
    pub const fn is_within(&self, index: usize) -> bool {
        matches!(self.anchor, SelectionAnchor::LineText(i) | SelectionAnchor::Line(i) if i == index)
    }
}

/// Offset a click on line `index` should land at, recovered from the native
/// selection. Zero when there is no selection or it belongs elsewhere.
#[must_use]
pub fn selection_offset(selection: Option<NativeSelection>, index: usize) -> usize {
    match selection {
        Some(sel) if sel.is_within(index) => sel.offset,
        _ => 0,
    }
}

/// A display surface the caret can synchronize with.
pub trait CursorRenderer {
    /// Replace the surface's cursor with a collapsed one at `offset` chars
    /// into line `line_index`. `offset` is already clamped to the line.
    fn show_cursor_at(&mut self, line_index: usize, offset: usize);

    /// Bring `line_index` into view, scrolling as little as possible.
    fn scroll_into_view(&mut self, line_index: usize);

    /// The surface's current collapsed selection, if it has one.
    fn native_selection(&self) -> Option<NativeSelection> {
        None
    }

    /// Pick up display options (gutter, scroll context). Surfaces without
    /// such settings ignore them.
    fn apply_options(&mut self, _options: &EditorOptions) {}
}

impl<R: CursorRenderer + ?Sized> CursorRenderer for Box<R> {
    fn show_cursor_at(&mut self, line_index: usize, offset: usize) {
        (**self).show_cursor_at(line_index, offset);
    }

    fn scroll_into_view(&mut self, line_index: usize) {
        (**self).scroll_into_view(line_index);
    }

    fn native_selection(&self) -> Option<NativeSelection> {
        (**self).native_selection()
    }

    fn apply_options(&mut self, options: &EditorOptions) {
        (**self).apply_options(options);
    }
}

/// Records every call. Used by unit tests across the crate.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub shown: Vec<(usize, usize)>,
    pub scrolled: Vec<usize>,
    pub selection: Option<NativeSelection>,
    pub options: Option<EditorOptions>,
}

#[cfg(test)]
impl Recorder {
    pub fn last_shown(&self) -> Option<(usize, usize)> {
        self.shown.last().copied()
    }
}

#[cfg(test)]
impl CursorRenderer for Recorder {
    fn show_cursor_at(&mut self, line_index: usize, offset: usize) {
        self.shown.push((line_index, offset));
    }

    fn scroll_into_view(&mut self, line_index: usize) {
        self.scrolled.push(line_index);
    }

    fn native_selection(&self) -> Option<NativeSelection> {
        self.selection
    }

    fn apply_options(&mut self, options: &EditorOptions) {
        self.options = Some(*options);
    }
}
