//! Caret — the single logical cursor and its movement rules.
//!
//! A [`Caret`] is a `(line, offset)` pair plus the [`CursorRenderer`] it
//! keeps in sync. It references its line by [`LineId`] and never owns it;
//! the [`Document`] is passed to every operation, the same way a cursor is
//! handed the buffer it moves through.
//!
//! # Clamping
//!
//! The stored offset may briefly exceed the current line's length, most
//! notably after a vertical move onto a shorter line (see below). Every
//! operation ends in [`sync`](Caret::sync), which shows the cursor at
//! `min(offset, len)`. That single choke point is what the surface ever
//! observes, so the display is always in range even when the stored value
//! is not.
//!
//! After `set_position`, `move_left` and `move_right` return, the stored
//! offset itself is in `0..=len`.
//!
//! # Vertical moves
//!
//! By default `move_up`/`move_down` keep the offset exactly as it was. A
//! caret at offset 10 that moves onto a 3-char line still stores 10 and is
//! displayed at 3; moving back to a long line restores column 10. The next
//! `move_left` snaps a stale offset to `len - 1`. With
//! [`set_vertical_clamp(true)`](Caret::set_vertical_clamp) the offset is
//! clamped to the destination line immediately instead.
//!
//! # Failure
//!
//! Nothing here fails. Missing neighbors are no-ops, out-of-range offsets
//! are clamped, and a line id that is not part of the document leaves the
//! caret untouched.

use tracing::debug;

use crate::document::{Document, LineId};
use crate::render::{CursorRenderer, selection_offset};

/// Settled caret location, by line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPosition {
    /// 0-indexed line.
    pub line: usize,
    /// Stored char offset (may exceed the line length after a vertical move).
    pub offset: usize,
}

/// The logical caret.
#[derive(Debug)]
pub struct Caret<R> {
    line: LineId,
    offset: usize,
    vertical_clamp: bool,
    renderer: R,
}

impl<R: CursorRenderer> Caret<R> {
    /// Create a caret at offset 0 of `line` and show it.
    pub fn new(renderer: R, doc: &Document, line: LineId) -> Self {
        let mut caret = Self {
            line,
            offset: 0,
            vertical_clamp: false,
            renderer,
        };
        caret.sync(doc);
        caret
    }

    /// Re-seat the caret at offset 0 of `line`.
    pub fn initialize(&mut self, doc: &Document, line: LineId) {
        self.line = line;
        self.offset = 0;
        self.sync(doc);
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn line(&self) -> LineId {
        self.line
    }

    /// Stored offset. Use [`visible_offset`](Self::visible_offset) for the
    /// value the surface shows.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// The offset clamped to the current line, as displayed.
    #[must_use]
    pub fn visible_offset(&self, doc: &Document) -> usize {
        doc.get(self.line).map_or(0, |l| self.offset.min(l.len()))
    }

    /// Line index and stored offset, or `None` if the caret's line is not
    /// part of `doc`.
    #[must_use]
    pub fn position(&self, doc: &Document) -> Option<CaretPosition> {
        doc.index_of(self.line).map(|line| CaretPosition {
            line,
            offset: self.offset,
        })
    }

    #[inline]
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    #[inline]
    pub const fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[inline]
    #[must_use]
    pub const fn vertical_clamp(&self) -> bool {
        self.vertical_clamp
    }

    /// Choose whether vertical moves clamp the offset right away.
    pub const fn set_vertical_clamp(&mut self, clamp: bool) {
        self.vertical_clamp = clamp;
    }

    // -- Direct positioning -------------------------------------------------

    /// Move to `line` at `min(offset, len)`. Never rejects an offset.
    /// Ignored if `line` is not part of `doc`.
    pub fn set_position(&mut self, doc: &Document, line: LineId, offset: usize) {
        let Some(target) = doc.get(line) else {
            return;
        };
        self.line = line;
        self.offset = offset.min(target.len());
        self.sync(doc);
    }

    // -- Horizontal movement ------------------------------------------------

    /// One char left, wrapping to the end of the previous line.
    ///
    /// Rules, first match wins:
    /// 1. stale offset past a non-empty line → `len - 1`
    /// 2. non-empty line, offset > 0 → `offset - 1`
    /// 3. otherwise → end of the previous line, or stay put at document start
    pub fn move_left(&mut self, doc: &Document) {
        let Some(current) = doc.get(self.line) else {
            return;
        };
        let len = current.len();

        if self.offset > len && len > 0 {
            self.offset = len - 1;
        } else if len > 0 && self.offset > 0 {
            self.offset -= 1;
        } else if let Some(prev) = doc.previous(self.line) {
            self.line = prev.id();
            self.offset = prev.len();
        } else {
            // Document start. An empty first line can still hold a stale
            // offset from a vertical move; settle it.
            self.offset = 0;
        }
        self.sync(doc);
    }

    /// One char right, wrapping to the start of the next line.
    pub fn move_right(&mut self, doc: &Document) {
        let Some(current) = doc.get(self.line) else {
            return;
        };
        let len = current.len();

        if self.offset < len {
            self.offset += 1;
        } else if let Some(next) = doc.next(self.line) {
            self.line = next.id();
            self.offset = 0;
        } else {
            self.offset = len;
        }
        self.sync(doc);
    }

    // -- Vertical movement --------------------------------------------------

    /// Previous line, same stored offset.
    pub fn move_up(&mut self, doc: &Document) {
        let target = doc.previous(self.line).map(|l| (l.id(), l.len()));
        self.move_vertical(doc, target);
    }

    /// Next line, same stored offset.
    pub fn move_down(&mut self, doc: &Document) {
        let target = doc.next(self.line).map(|l| (l.id(), l.len()));
        self.move_vertical(doc, target);
    }

    fn move_vertical(&mut self, doc: &Document, target: Option<(LineId, usize)>) {
        if let Some((id, len)) = target {
            self.line = id;
            if self.vertical_clamp {
                self.offset = self.offset.min(len);
            }
        }
        self.sync(doc);
    }

    // -- Native selection ---------------------------------------------------

    /// Offset inside `line` that the surface's native selection points at,
    /// or 0 if the selection is elsewhere (or absent).
    #[must_use]
    pub fn calculate_offset(&self, doc: &Document, line: LineId) -> usize {
        doc.index_of(line)
            .map_or(0, |index| selection_offset(self.renderer.native_selection(), index))
    }

    // -- Display ------------------------------------------------------------

    /// Push the caret to the renderer: cursor at `min(offset, len)`, line
    /// scrolled into view. Called by every operation; call it directly after
    /// the surface itself changes (resize, repaint from scratch).
    pub fn sync(&mut self, doc: &Document) {
        let Some(index) = doc.index_of(self.line) else {
            return;
        };
        let visible = self.offset.min(doc.line(index).map_or(0, |l| l.len()));
        debug!(line = index, offset = self.offset, visible, "caret");
        self.renderer.show_cursor_at(index, visible);
        self.renderer.scroll_into_view(index);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
