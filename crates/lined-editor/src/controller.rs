//! Document controller — owns the lines, loads text, routes input.
//!
//! A [`DocumentController`] ties together the [`Document`], the [`Caret`]
//! moving over it, and an optional [`DocumentSource`] to load from. Input
//! arrives as terminal [`KeyEvent`]s and [`ClickTarget`]s and is translated
//! into caret operations.
//!
//! # Loading
//!
//! A load reads the whole source, replaces every line, and leaves the caret
//! at the end of the last line. Loads carry a [`LoadTicket`]; when two loads
//! overlap, only the most recently started one is applied and any earlier
//! result arriving later is reported as [`LoadOutcome::Stale`].
//!
//! ```text
//! begin_load() ──▶ ticket #4 ──▶ read_data().await ──▶ complete_load(#4, text)
//!                                                          │
//!                          generation still 4? ── yes ──▶ Applied { lines }
//!                                              └─ no ───▶ Stale
//! ```
//!
//! While a read is pending the document and caret keep their previous state.

use std::fmt;

use lined_term::input::{KeyCode, KeyEvent};
use tracing::{info, warn};

use crate::caret::{Caret, CaretPosition};
use crate::document::Document;
use crate::error::Result;
use crate::options::EditorOptions;
use crate::render::{CursorRenderer, NativeSelection, selection_offset};
use crate::source::{DocumentSource, SourceError};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The editor area outside every line.
    Container,
    /// The line at this index.
    Line(usize),
}

/// Whether a key was consumed by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Routed to the caret; the surface's default handling is suppressed.
    Handled,
    /// Not an editor key; the caller may handle it.
    Ignored,
}

/// Resolve a click to `(line_index, offset)`.
///
/// A container click lands at the end of the last line. A line click lands
/// where the native selection points inside that line, or at 0 when the
/// selection is elsewhere. `None` if the line index does not exist.
#[must_use]
pub fn resolve_click(
    doc: &Document,
    target: ClickTarget,
    selection: Option<NativeSelection>,
) -> Option<(usize, usize)> {
    match target {
        ClickTarget::Container => Some((doc.last_index(), doc.last_line().len())),
        ClickTarget::Line(index) => {
            let line = doc.line(index)?;
            Some((index, selection_offset(selection, index).min(line.len())))
        }
    }
}

// ---------------------------------------------------------------------------
// Load lifecycle
// ---------------------------------------------------------------------------

/// Identifies one started load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Result of completing a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The text replaced the document.
    Applied { lines: usize },
    /// A newer load was started in the meantime; nothing changed.
    Stale,
}

// ---------------------------------------------------------------------------
// DocumentController
// ---------------------------------------------------------------------------

/// Owns the document and caret, and routes loads and input to them.
pub struct DocumentController<R> {
    document: Document,
    caret: Caret<R>,
    source: Option<Box<dyn DocumentSource>>,
    options: EditorOptions,
    generation: u64,
}

impl<R: CursorRenderer> DocumentController<R> {
    /// A controller with one blank line and the caret on it.
    pub fn new(renderer: R) -> Self {
        Self::with_options(renderer, EditorOptions::default())
    }

    pub fn with_options(renderer: R, options: EditorOptions) -> Self {
        let document = Document::new();
        let mut caret = Caret::new(renderer, &document, document.first_line().id());
        caret.set_vertical_clamp(options.vertical_clamp);
        caret.renderer_mut().apply_options(&options);
        caret.sync(&document);
        Self {
            document,
            caret,
            source: None,
            options,
            generation: 0,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    #[must_use]
    pub const fn caret(&self) -> &Caret<R> {
        &self.caret
    }

    /// Caret line index and stored offset.
    #[must_use]
    pub fn position(&self) -> CaretPosition {
        // The caret only ever holds ids of the current document.
        self.caret.position(&self.document).unwrap_or(CaretPosition {
            line: 0,
            offset: 0,
        })
    }

    #[inline]
    #[must_use]
    pub const fn renderer(&self) -> &R {
        self.caret.renderer()
    }

    /// Run `f` with the renderer and the document borrowed together, e.g.
    /// to paint or hit-test against the current lines.
    pub fn with_renderer<T>(&mut self, f: impl FnOnce(&mut R, &Document) -> T) -> T {
        f(self.caret.renderer_mut(), &self.document)
    }

    #[inline]
    #[must_use]
    pub const fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Replace the options and hand them to the renderer. `strip_cr` takes
    /// effect on the next load.
    pub fn set_options(&mut self, options: EditorOptions) {
        self.options = options;
        self.caret.set_vertical_clamp(options.vertical_clamp);
        self.caret.renderer_mut().apply_options(&options);
        self.caret.sync(&self.document);
    }

    /// Re-push the caret to the renderer after the surface changed.
    pub fn refresh(&mut self) {
        self.caret.sync(&self.document);
    }

    // -- Source binding -----------------------------------------------------

    pub fn bind_source(&mut self, source: impl DocumentSource + 'static) {
        self.source = Some(Box::new(source));
    }

    pub fn unbind_source(&mut self) -> Option<Box<dyn DocumentSource>> {
        self.source.take()
    }

    #[must_use]
    pub fn source_name(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.name())
    }

    // -- Loading ------------------------------------------------------------

    /// Read the bound source and replace the document with its text.
    ///
    /// # Errors
    ///
    /// [`SourceUnavailable`](crate::error::EditorError::SourceUnavailable)
    /// when no source is bound or the read fails. The document and caret
    /// are unchanged in that case.
    pub async fn load_data(&mut self) -> Result<LoadOutcome> {
        let Some(source) = self.source.as_deref() else {
            warn!("load requested with no source bound");
            return Err(SourceError::NotBound.into());
        };

        self.generation += 1;
        let ticket = LoadTicket(self.generation);

        let text = match source.read_data().await {
            Ok(text) => text,
            Err(err) => {
                warn!(source = %source.name(), error = %err, "load failed");
                return Err(err.into());
            }
        };
        Ok(self.complete_load(ticket, &text))
    }

    /// Start a load. Any load started earlier becomes stale.
    pub const fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    /// Apply `text` if `ticket` belongs to the newest load.
    pub fn complete_load(&mut self, ticket: LoadTicket, text: &str) -> LoadOutcome {
        if ticket.0 != self.generation {
            warn!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale load"
            );
            return LoadOutcome::Stale;
        }
        LoadOutcome::Applied {
            lines: self.apply_text(text),
        }
    }

    /// Load `text` right away. Supersedes any load in flight.
    pub fn load_text(&mut self, text: &str) -> usize {
        self.begin_load();
        self.apply_text(text)
    }

    fn apply_text(&mut self, text: &str) -> usize {
        let lines = self.document.replace_text(text, self.options.strip_cr);
        let last = self.document.last_line();
        let (id, len) = (last.id(), last.len());
        self.caret.set_position(&self.document, id, len);
        info!(
            lines,
            ending = %self.document.line_ending(),
            "document loaded"
        );
        lines
    }

    // -- Input --------------------------------------------------------------

    /// Route an arrow key to the caret.
    pub fn handle_key(&mut self, key: &KeyEvent) -> KeyDisposition {
        let doc = &self.document;
        match key.code {
            KeyCode::Left => self.caret.move_left(doc),
            KeyCode::Right => self.caret.move_right(doc),
            KeyCode::Up => self.caret.move_up(doc),
            KeyCode::Down => self.caret.move_down(doc),
            _ => return KeyDisposition::Ignored,
        }
        KeyDisposition::Handled
    }

    /// Place the caret where a click landed, reading the offset back from
    /// the renderer's native selection. Returns `false` if the target line
    /// does not exist.
    pub fn handle_click(&mut self, target: ClickTarget) -> bool {
        let selection = self.caret.renderer().native_selection();
        let Some((index, end_offset)) = resolve_click(&self.document, target, selection) else {
            return false;
        };
        let Some(id) = self.document.line(index).map(crate::document::Line::id) else {
            return false;
        };
        let offset = match target {
            ClickTarget::Line(_) => self.caret.calculate_offset(&self.document, id),
            ClickTarget::Container => end_offset,
        };
        self.caret.set_position(&self.document, id, offset);
        true
    }
}

impl<R: fmt::Debug> fmt::Debug for DocumentController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentController")
            .field("document", &self.document)
            .field("caret", &self.caret)
            .field("source", &self.source.as_ref().map(|s| s.name()))
            .field("options", &self.options)
            .field("generation", &self.generation)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use crate::render::{Recorder, SelectionAnchor};
    use crate::source::StaticSource;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use lined_term::input::Modifiers;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    struct FailingSource;

    #[async_trait(?Send)]
    impl DocumentSource for FailingSource {
        async fn read_data(&self) -> std::result::Result<String, SourceError> {
            Err(SourceError::Io {
                path: PathBuf::from("/nowhere"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }

        fn name(&self) -> String {
            "failing".to_string()
        }
    }

    fn controller(text: &str) -> DocumentController<Recorder> {
        let mut ctl = DocumentController::new(Recorder::default());
        ctl.load_text(text);
        ctl
    }

    fn texts(ctl: &DocumentController<Recorder>) -> Vec<&str> {
        ctl.document().lines().map(|l| l.text()).collect()
    }

    fn pos(ctl: &DocumentController<Recorder>) -> (usize, usize) {
        let p = ctl.position();
        (p.line, p.offset)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::plain(code)
    }

    fn place(ctl: &mut DocumentController<Recorder>, line: usize, offset: usize) {
        ctl.with_renderer(|r, _| {
            r.selection = Some(NativeSelection::new(SelectionAnchor::LineText(line), offset));
        });
        assert!(ctl.handle_click(ClickTarget::Line(line)));
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn starts_with_one_blank_line() {
        let ctl = DocumentController::new(Recorder::default());
        assert_eq!(texts(&ctl), vec![""]);
        assert_eq!(pos(&ctl), (0, 0));
        assert_eq!(ctl.renderer().last_shown(), Some((0, 0)));
    }

    #[test]
    fn options_reach_the_caret() {
        let opts = EditorOptions {
            vertical_clamp: true,
            ..EditorOptions::default()
        };
        let mut ctl = DocumentController::with_options(Recorder::default(), opts);
        assert!(ctl.caret().vertical_clamp());
        ctl.set_options(EditorOptions::default());
        assert!(!ctl.caret().vertical_clamp());
    }

    #[test]
    fn options_reach_the_renderer() {
        let opts = EditorOptions {
            line_numbers: false,
            scrolloff: 4,
            ..EditorOptions::default()
        };
        let mut ctl = DocumentController::with_options(Recorder::default(), opts);
        assert_eq!(ctl.renderer().options, Some(opts));
        ctl.set_options(EditorOptions::default());
        assert_eq!(ctl.renderer().options, Some(EditorOptions::default()));
    }

    // -- Loading ------------------------------------------------------------

    #[test]
    fn load_trailing_newline_yields_empty_last_line() {
        let ctl = controller("x\ny\n");
        assert_eq!(texts(&ctl), vec!["x", "y", ""]);
        assert_eq!(pos(&ctl), (2, 0));
    }

    #[test]
    fn load_puts_caret_at_end_of_last_line() {
        let ctl = controller("one\ntwo\nthree");
        assert_eq!(pos(&ctl), (2, 5));
        assert_eq!(ctl.renderer().last_shown(), Some((2, 5)));
        assert_eq!(ctl.renderer().scrolled.last(), Some(&2));
    }

    #[test]
    fn load_data_from_source() {
        let mut ctl = DocumentController::new(Recorder::default());
        ctl.bind_source(StaticSource::new("ab\ncd"));
        let outcome = block_on(ctl.load_data()).unwrap();
        assert_eq!(outcome, LoadOutcome::Applied { lines: 2 });
        assert_eq!(texts(&ctl), vec!["ab", "cd"]);
        assert_eq!(pos(&ctl), (1, 2));
    }

    #[test]
    fn reload_replaces_every_line() {
        let mut ctl = controller("a\nb\nc\nd");
        let old = ctl.document().line(0).unwrap().id();
        ctl.load_text("z");
        assert_eq!(texts(&ctl), vec!["z"]);
        assert!(!ctl.document().contains(old));
        assert_eq!(pos(&ctl), (0, 1));
    }

    #[test]
    fn load_data_without_source_is_unavailable() {
        let mut ctl = controller("keep\nme");
        place(&mut ctl, 0, 2);
        let err = block_on(ctl.load_data()).unwrap_err();
        assert!(matches!(
            err,
            EditorError::SourceUnavailable(SourceError::NotBound)
        ));
        assert_eq!(texts(&ctl), vec!["keep", "me"]);
        assert_eq!(pos(&ctl), (0, 2));
    }

    #[test]
    fn failed_read_leaves_state_unchanged() {
        let mut ctl = controller("abc");
        ctl.bind_source(FailingSource);
        let err = block_on(ctl.load_data()).unwrap_err();
        assert!(matches!(
            err,
            EditorError::SourceUnavailable(SourceError::Io { .. })
        ));
        assert_eq!(texts(&ctl), vec!["abc"]);
        assert_eq!(pos(&ctl), (0, 3));
    }

    #[test]
    fn crlf_is_stripped_by_default() {
        let ctl = controller("a\r\nb\r\n");
        assert_eq!(texts(&ctl), vec!["a", "b", ""]);
    }

    #[test]
    fn crlf_kept_when_strip_cr_off() {
        let opts = EditorOptions {
            strip_cr: false,
            ..EditorOptions::default()
        };
        let mut ctl = DocumentController::with_options(Recorder::default(), opts);
        ctl.load_text("a\r\nb");
        assert_eq!(texts(&ctl), vec!["a\r", "b"]);
    }

    #[test]
    fn last_started_load_wins() {
        let mut ctl = controller("start");
        let first = ctl.begin_load();
        let second = ctl.begin_load();
        assert_eq!(
            ctl.complete_load(second, "new\ntext"),
            LoadOutcome::Applied { lines: 2 }
        );
        assert_eq!(ctl.complete_load(first, "old"), LoadOutcome::Stale);
        assert_eq!(texts(&ctl), vec!["new", "text"]);
    }

    #[test]
    fn stale_completion_before_newer_one_is_discarded() {
        let mut ctl = controller("start");
        let first = ctl.begin_load();
        let second = ctl.begin_load();
        assert_eq!(ctl.complete_load(first, "old"), LoadOutcome::Stale);
        assert_eq!(texts(&ctl), vec!["start"]);
        assert_eq!(
            ctl.complete_load(second, "new"),
            LoadOutcome::Applied { lines: 1 }
        );
    }

    #[test]
    fn load_text_supersedes_pending_load() {
        let mut ctl = controller("start");
        let pending = ctl.begin_load();
        ctl.load_text("sync");
        assert_eq!(ctl.complete_load(pending, "late"), LoadOutcome::Stale);
        assert_eq!(texts(&ctl), vec!["sync"]);
    }

    #[test]
    fn source_binding() {
        let mut ctl = DocumentController::new(Recorder::default());
        assert_eq!(ctl.source_name(), None);
        ctl.bind_source(StaticSource::new(""));
        assert_eq!(ctl.source_name().as_deref(), Some("[Scratch]"));
        assert!(ctl.unbind_source().is_some());
        assert_eq!(ctl.source_name(), None);
    }

    // -- Keys ---------------------------------------------------------------

    #[test]
    fn arrows_are_handled() {
        let mut ctl = controller("ab\ncd");
        assert_eq!(ctl.handle_key(&key(KeyCode::Up)), KeyDisposition::Handled);
        assert_eq!(pos(&ctl), (0, 2));
        assert_eq!(ctl.handle_key(&key(KeyCode::Right)), KeyDisposition::Handled);
        assert_eq!(pos(&ctl), (1, 0));
        assert_eq!(ctl.handle_key(&key(KeyCode::Left)), KeyDisposition::Handled);
        assert_eq!(pos(&ctl), (0, 2));
        assert_eq!(ctl.handle_key(&key(KeyCode::Down)), KeyDisposition::Handled);
        assert_eq!(pos(&ctl), (1, 2));
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut ctl = controller("ab");
        let before = ctl.renderer().shown.len();
        assert_eq!(ctl.handle_key(&key(KeyCode::Char('x'))), KeyDisposition::Ignored);
        assert_eq!(ctl.handle_key(&key(KeyCode::Home)), KeyDisposition::Ignored);
        let ctrl_q = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: Modifiers::CTRL,
        };
        assert_eq!(ctl.handle_key(&ctrl_q), KeyDisposition::Ignored);
        assert_eq!(ctl.renderer().shown.len(), before);
    }

    // -- Clicks -------------------------------------------------------------

    #[test]
    fn container_click_goes_to_end_of_last_line() {
        let mut ctl = controller("first\nlast line");
        place(&mut ctl, 0, 1);
        assert!(ctl.handle_click(ClickTarget::Container));
        assert_eq!(pos(&ctl), (1, 9));
    }

    #[test]
    fn line_click_uses_native_selection() {
        let mut ctl = controller("abc\ndefgh");
        place(&mut ctl, 1, 3);
        assert_eq!(pos(&ctl), (1, 3));
        assert_eq!(ctl.renderer().last_shown(), Some((1, 3)));
    }

    #[test]
    fn line_click_with_foreign_selection_lands_at_zero() {
        let mut ctl = controller("abc\ndefgh");
        ctl.with_renderer(|r, _| {
            r.selection = Some(NativeSelection::new(SelectionAnchor::LineText(0), 2));
        });
        assert!(ctl.handle_click(ClickTarget::Line(1)));
        assert_eq!(pos(&ctl), (1, 0));
    }

    #[test]
    fn line_click_offset_comes_from_the_caret() {
        let mut ctl = controller("abc\ndefgh");
        ctl.with_renderer(|r, _| {
            r.selection = Some(NativeSelection::new(SelectionAnchor::LineText(1), 4));
        });
        let id = ctl.document().line(1).map(crate::document::Line::id);
        let expected = id.map(|id| ctl.caret().calculate_offset(ctl.document(), id));
        assert_eq!(expected, Some(4));
        assert!(ctl.handle_click(ClickTarget::Line(1)));
        assert_eq!(pos(&ctl), (1, 4));
    }

    #[test]
    fn line_click_past_line_end_is_clamped() {
        let mut ctl = controller("abc\nde");
        ctl.with_renderer(|r, _| {
            r.selection = Some(NativeSelection::new(SelectionAnchor::LineText(1), 9));
        });
        assert!(ctl.handle_click(ClickTarget::Line(1)));
        assert_eq!(pos(&ctl), (1, 2));
    }

    #[test]
    fn click_on_missing_line_is_ignored() {
        let mut ctl = controller("abc");
        assert!(!ctl.handle_click(ClickTarget::Line(7)));
        assert_eq!(pos(&ctl), (0, 3));
    }

    // -- resolve_click ------------------------------------------------------

    #[test]
    fn resolve_click_is_pure() {
        let doc = Document::from_text("ab\n\nxyz", true);
        assert_eq!(resolve_click(&doc, ClickTarget::Container, None), Some((2, 3)));
        assert_eq!(resolve_click(&doc, ClickTarget::Line(1), None), Some((1, 0)));
        let sel = NativeSelection::new(SelectionAnchor::Line(1), 0);
        assert_eq!(resolve_click(&doc, ClickTarget::Line(1), Some(sel)), Some((1, 0)));
        assert_eq!(resolve_click(&doc, ClickTarget::Line(3), None), None);
    }

    #[test]
    fn resolve_click_clamps_selection_offset() {
        let doc = Document::from_text("ab", true);
        let sel = NativeSelection::new(SelectionAnchor::LineText(0), 9);
        assert_eq!(resolve_click(&doc, ClickTarget::Line(0), Some(sel)), Some((0, 2)));
    }
}
