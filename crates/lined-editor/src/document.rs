//! Document — the ordered sequence of lines.
//!
//! A `Document` is a gap-free `Vec` of [`Line`]s in document order. Every
//! line carries a [`LineId`] drawn from a process-wide counter that never
//! rewinds, so an id handed out before a reload (or by another document)
//! can never alias a line of this one.
//!
//! Because ids are assigned in increasing order as lines are appended and
//! lines are never inserted mid-sequence, the `lines` vector is sorted by
//! id. [`index_of`](Document::index_of) exploits that with a binary search.
//!
//! # Coordinates
//!
//! Line indices are 0-indexed. Lengths and offsets count Unicode scalar
//! values (chars), never bytes. Display layers convert to 1-indexed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// Line ending detection
// ---------------------------------------------------------------------------

/// Dominant line ending of loaded text, detected from the first terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Detect from the first `\n` in `text`. Text without any `\n` is `Lf`.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => Self::CrLf,
            _ => Self::Lf,
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
        }
    }
}

/// Split text into line pieces on `\n`.
///
/// Splitting is literal: `n` newlines always produce `n + 1` pieces, so a
/// trailing newline yields a trailing empty piece and empty input yields one
/// empty piece. With `strip_cr`, a single `\r` immediately before each `\n`
/// is dropped from its piece; a lone `\r` anywhere else is kept as content.
#[must_use]
pub fn split_lines(text: &str, strip_cr: bool) -> Vec<&str> {
    let mut pieces: Vec<&str> = text.split('\n').collect();
    if strip_cr {
        let last = pieces.len() - 1;
        for piece in &mut pieces[..last] {
            let text: &str = *piece;
            if let Some(stripped) = text.strip_suffix('\r') {
                *piece = stripped;
            }
        }
    }
    pieces
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// Stable identity of a line. Unique across all documents in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(u64);

static NEXT_LINE_ID: AtomicU64 = AtomicU64::new(0);

impl LineId {
    fn next() -> Self {
        Self(NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One line of the document. Never contains `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    id: LineId,
    text: String,
    len: usize,
}

impl Line {
    fn new(id: LineId, text: &str) -> Self {
        Self {
            id,
            text: text.to_owned(),
            len: text.chars().count(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> LineId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Ordered, gap-free sequence of lines. Never empty.
pub struct Document {
    lines: Vec<Line>,
    line_ending: LineEnding,
}

impl Document {
    // -- Construction -------------------------------------------------------

    /// A document holding one blank line.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            lines: Vec::with_capacity(1),
            line_ending: LineEnding::Lf,
        };
        doc.push_line("");
        doc
    }

    /// A document built from `text` as if it had been loaded.
    #[must_use]
    pub fn from_text(text: &str, strip_cr: bool) -> Self {
        let mut doc = Self::new();
        doc.replace_text(text, strip_cr);
        doc
    }

    // -- Access -------------------------------------------------------------

    /// Number of lines (always at least 1).
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line at `index`, if it exists.
    #[inline]
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// All lines in document order.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &Line> {
        self.lines.iter()
    }

    /// Index of the last line.
    #[inline]
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.lines.len() - 1
    }

    /// The last line.
    #[must_use]
    pub fn last_line(&self) -> &Line {
        &self.lines[self.last_index()]
    }

    /// The first line.
    #[must_use]
    pub fn first_line(&self) -> &Line {
        &self.lines[0]
    }

    /// Position of the line with `id`, or `None` if it is not (or no
    /// longer) part of this document.
    #[must_use]
    pub fn index_of(&self, id: LineId) -> Option<usize> {
        self.lines.binary_search_by_key(&id, Line::id).ok()
    }

    /// The line with `id`.
    #[must_use]
    pub fn get(&self, id: LineId) -> Option<&Line> {
        self.index_of(id).map(|i| &self.lines[i])
    }

    /// True if `id` names a line of this document.
    #[must_use]
    pub fn contains(&self, id: LineId) -> bool {
        self.index_of(id).is_some()
    }

    /// The line before `id` in document order.
    #[must_use]
    pub fn previous(&self, id: LineId) -> Option<&Line> {
        let index = self.index_of(id)?;
        index.checked_sub(1).map(|i| &self.lines[i])
    }

    /// The line after `id` in document order.
    #[must_use]
    pub fn next(&self, id: LineId) -> Option<&Line> {
        let index = self.index_of(id)?;
        self.lines.get(index + 1)
    }

    /// Dominant line ending of the last loaded text.
    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    // -- Mutation -----------------------------------------------------------

    /// Drop every line and rebuild from `text`, one line per piece of
    /// [`split_lines`]. Returns the number of lines created.
    pub fn replace_text(&mut self, text: &str, strip_cr: bool) -> usize {
        let pieces = split_lines(text, strip_cr);
        self.lines.clear();
        self.lines.reserve(pieces.len());
        for piece in pieces {
            self.push_line(piece);
        }
        self.line_ending = LineEnding::detect(text);
        self.lines.len()
    }

    fn push_line(&mut self, text: &str) -> LineId {
        let id = LineId::next();
        self.lines.push(Line::new(id, text));
        id
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.lines.len())
            .field("line_ending", &self.line_ending)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(doc: &Document) -> Vec<&str> {
        doc.lines().map(Line::text).collect()
    }

    // -- split_lines --------------------------------------------------------

    #[test]
    fn split_trailing_newline_gives_trailing_empty_line() {
        assert_eq!(split_lines("x\ny\n", true), vec!["x", "y", ""]);
    }

    #[test]
    fn split_empty_text_is_one_empty_line() {
        assert_eq!(split_lines("", true), vec![""]);
    }

    #[test]
    fn split_keeps_interior_empty_lines() {
        assert_eq!(split_lines("a\n\n\nb", true), vec!["a", "", "", "b"]);
    }

    #[test]
    fn split_strips_cr_before_lf_only() {
        assert_eq!(split_lines("a\r\nb\r\n", true), vec!["a", "b", ""]);
        assert_eq!(split_lines("a\rb\nc\r", true), vec!["a\rb", "c\r"]);
    }

    #[test]
    fn split_literal_keeps_cr() {
        assert_eq!(split_lines("a\r\nb", false), vec!["a\r", "b"]);
    }

    // -- LineEnding ---------------------------------------------------------

    #[test]
    fn line_ending_detect() {
        assert_eq!(LineEnding::detect("a\nb"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("no newline"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("\nfirst"), LineEnding::Lf);
    }

    #[test]
    fn line_ending_display() {
        assert_eq!(LineEnding::Lf.to_string(), "LF");
        assert_eq!(LineEnding::CrLf.to_string(), "CRLF");
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_has_one_blank_line() {
        let doc = Document::new();
        assert_eq!(doc.line_count(), 1);
        assert!(doc.first_line().is_empty());
        assert_eq!(doc.last_index(), 0);
    }

    #[test]
    fn from_text_builds_lines() {
        let doc = Document::from_text("x\ny\n", true);
        assert_eq!(texts(&doc), vec!["x", "y", ""]);
    }

    #[test]
    fn lengths_count_chars_not_bytes() {
        let doc = Document::from_text("café\n漢字", true);
        assert_eq!(doc.line(0).unwrap().len(), 4);
        assert_eq!(doc.line(1).unwrap().len(), 2);
    }

    // -- Navigation ---------------------------------------------------------

    #[test]
    fn neighbors() {
        let doc = Document::from_text("a\nb\nc", true);
        let b = doc.line(1).unwrap().id();
        assert_eq!(doc.previous(b).unwrap().text(), "a");
        assert_eq!(doc.next(b).unwrap().text(), "c");
        assert!(doc.previous(doc.first_line().id()).is_none());
        assert!(doc.next(doc.last_line().id()).is_none());
    }

    #[test]
    fn index_of_round_trips() {
        let doc = Document::from_text("a\nb\nc\nd", true);
        for (i, line) in doc.lines().enumerate() {
            assert_eq!(doc.index_of(line.id()), Some(i));
        }
    }

    // -- Reload -------------------------------------------------------------

    #[test]
    fn reload_invalidates_old_ids() {
        let mut doc = Document::from_text("a\nb", true);
        let old = doc.line(0).unwrap().id();
        doc.replace_text("c\nd", true);
        assert!(!doc.contains(old));
        assert!(doc.get(old).is_none());
        assert!(doc.previous(old).is_none());
        assert_eq!(texts(&doc), vec!["c", "d"]);
    }

    #[test]
    fn ids_are_unique_across_documents() {
        let a = Document::from_text("x\ny", true);
        let b = Document::from_text("x\ny", true);
        for line in b.lines() {
            assert!(!a.contains(line.id()));
        }
    }

    #[test]
    fn ids_never_repeat_across_reloads() {
        let mut doc = Document::new();
        let first = doc.first_line().id();
        doc.replace_text("x", true);
        assert_ne!(doc.first_line().id(), first);
        assert!(doc.first_line().id() > first);
    }

    #[test]
    fn replace_text_reports_count_and_ending() {
        let mut doc = Document::new();
        assert_eq!(doc.replace_text("a\r\nb\r\n", true), 3);
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert_eq!(texts(&doc), vec!["a", "b", ""]);
    }
}
