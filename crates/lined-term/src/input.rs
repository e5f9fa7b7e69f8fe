// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into key and mouse events. The editor surface
// only consumes a small vocabulary: arrow keys (for caret movement), a
// few control chords (reload, quit), printable characters, and left
// mouse presses (click-to-position). Sequences outside that vocabulary
// are consumed and dropped so they never leak into the text as garbage.
//
// Supported encodings:
//
// - Legacy CSI cursor keys, optionally with an xterm modifier parameter
//   (`ESC [ A`, `ESC [ 1 ; 5 C`)
// - SS3 cursor keys (`ESC O A`, application cursor mode)
// - Tilde-terminated editing keys (Home, End, Delete, PageUp/Down)
// - SGR mouse protocol (`ESC [ < b ; x ; y M|m`)
// - ASCII control characters and UTF-8 text
//
// Sequences may be split across `read()` calls, so the parser buffers
// incomplete input. A lone ESC is ambiguous; call [`Parser::flush`] after
// a short idle period to emit it as an Escape key.

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A parsed terminal input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// True for `Ctrl+<ch>`.
    #[must_use]
    pub fn is_ctrl(&self, ch: char) -> bool {
        self.code == KeyCode::Char(ch) && self.modifiers.contains(Modifiers::CTRL)
    }
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A printable Unicode character.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

bitflags! {
    /// Keyboard modifier flags, in xterm bitmask order
    /// (the CSI parameter is `1 + bitmask`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// A mouse button action at a 0-indexed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// 0-indexed column.
    pub x: u16,
    /// 0-indexed row.
    pub y: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press(MouseButton),
    Release(MouseButton),
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Incremental input parser.
///
/// Feed bytes with [`advance`](Parser::advance); bytes belonging to an
/// unfinished sequence stay buffered until more input arrives.
#[derive(Debug, Default)]
pub struct Parser {
    buf: Vec<u8>,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(32),
        }
    }

    /// Feed raw bytes and return every event that can be decoded.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            match parse_at(&self.buf[pos..]) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Skip(consumed) => pos += consumed,
                Parsed::Incomplete => break,
            }
        }

        self.buf.drain(..pos);
        events
    }

    /// True when bytes are waiting for the rest of a sequence.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve buffered bytes after an idle timeout. A lone ESC becomes
    /// the Escape key; anything else left over is dropped.
    pub fn flush(&mut self) -> Vec<Event> {
        let events = if self.buf.first() == Some(&0x1B) {
            vec![Event::Key(KeyEvent::plain(KeyCode::Escape))]
        } else {
            Vec::new()
        };
        self.buf.clear();
        events
    }
}

// ─── Stateless decoding ─────────────────────────────────────────────────────

enum Parsed {
    Event(Event, usize),
    Skip(usize),
    Incomplete,
}

fn parse_at(buf: &[u8]) -> Parsed {
    match buf[0] {
        0x1B => parse_escape(buf),
        0x09 => key(KeyCode::Tab, Modifiers::empty(), 1),
        0x0A | 0x0D => key(KeyCode::Enter, Modifiers::empty(), 1),
        0x08 | 0x7F => key(KeyCode::Backspace, Modifiers::empty(), 1),
        b @ 0x01..=0x1A => key(KeyCode::Char(char::from(b + b'a' - 1)), Modifiers::CTRL, 1),
        b @ 0x20..=0x7E => key(KeyCode::Char(char::from(b)), Modifiers::empty(), 1),
        0xC0..=0xFF => parse_utf8(buf),
        _ => Parsed::Skip(1),
    }
}

fn parse_escape(buf: &[u8]) -> Parsed {
    let Some(&second) = buf.get(1) else {
        return Parsed::Incomplete;
    };
    match second {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        b @ 0x20..=0x7E => key(KeyCode::Char(char::from(b)), Modifiers::ALT, 2),
        _ => key(KeyCode::Escape, Modifiers::empty(), 1),
    }
}

fn parse_csi(buf: &[u8]) -> Parsed {
    let Some(&third) = buf.get(2) else {
        return Parsed::Incomplete;
    };
    if third == b'<' {
        return parse_sgr_mouse(buf);
    }

    // Parameter bytes (0x20..=0x3F) run up to a final byte in 0x40..=0x7E.
    let Some(end) = buf[2..]
        .iter()
        .position(|b| !(0x20..=0x3F).contains(b))
        .map(|i| i + 2)
    else {
        return Parsed::Incomplete;
    };
    if !(0x40..=0x7E).contains(&buf[end]) {
        // Malformed; drop what we have and resync on the offending byte.
        return Parsed::Skip(end);
    }

    let params = parse_params(&buf[2..end]);
    let consumed = end + 1;

    if buf[end] == b'~' {
        let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));
        let code = match params.first().copied().unwrap_or(0) {
            1 | 7 => KeyCode::Home,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            _ => return Parsed::Skip(consumed),
        };
        return key(code, modifiers, consumed);
    }

    let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));
    cursor_key(buf[end]).map_or(Parsed::Skip(consumed), |code| key(code, modifiers, consumed))
}

fn parse_ss3(buf: &[u8]) -> Parsed {
    let Some(&third) = buf.get(2) else {
        return Parsed::Incomplete;
    };
    cursor_key(third).map_or(Parsed::Skip(3), |code| key(code, Modifiers::empty(), 3))
}

/// Final byte of a cursor-key sequence, shared by CSI and SS3.
const fn cursor_key(final_byte: u8) -> Option<KeyCode> {
    match final_byte {
        b'A' => Some(KeyCode::Up),
        b'B' => Some(KeyCode::Down),
        b'C' => Some(KeyCode::Right),
        b'D' => Some(KeyCode::Left),
        b'H' => Some(KeyCode::Home),
        b'F' => Some(KeyCode::End),
        _ => None,
    }
}

fn parse_sgr_mouse(buf: &[u8]) -> Parsed {
    // ESC [ < Cb ; Cx ; Cy (M | m)
    let body = &buf[3..];
    let Some(end) = body.iter().position(|b| !b.is_ascii_digit() && *b != b';') else {
        return Parsed::Incomplete;
    };
    if body[end] != b'M' && body[end] != b'm' {
        return Parsed::Skip(3 + end);
    }
    let consumed = 3 + end + 1;

    let params = parse_params(&body[..end]);
    let [cb, raw_x, raw_y] = [0, 1, 2].map(|i| params.get(i).copied().unwrap_or(0));
    let released = body[end] == b'm';

    let kind = if cb & 64 != 0 {
        if cb & 1 == 0 {
            MouseEventKind::ScrollUp
        } else {
            MouseEventKind::ScrollDown
        }
    } else if cb & 32 != 0 {
        // Motion reports are not requested; drop them if a terminal sends one anyway.
        return Parsed::Skip(consumed);
    } else {
        let button = match cb & 3 {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            _ => MouseButton::Right,
        };
        if released {
            MouseEventKind::Release(button)
        } else {
            MouseEventKind::Press(button)
        }
    };

    Parsed::Event(
        Event::Mouse(MouseEvent {
            kind,
            x: raw_x.saturating_sub(1),
            y: raw_y.saturating_sub(1),
        }),
        consumed,
    )
}

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = match buf[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Parsed::Skip(1),
    };
    if buf.len() < expected {
        return Parsed::Incomplete;
    }
    std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Parsed::Skip(1), |ch| {
            key(KeyCode::Char(ch), Modifiers::empty(), expected)
        })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn key(code: KeyCode, modifiers: Modifiers, consumed: usize) -> Parsed {
    Parsed::Event(Event::Key(KeyEvent { code, modifiers }), consumed)
}

/// Semicolon-separated decimal parameters. Empty fields read as 0.
fn parse_params(raw: &[u8]) -> Vec<u16> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(|&b| b == b';')
        .map(|field| {
            field
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .fold(0u16, |acc, b| {
                    acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
                })
        })
        .collect()
}

/// xterm modifier parameter (`1 + bitmask`) to flags.
#[allow(clippy::cast_possible_truncation)]
const fn decode_modifiers(param: u16) -> Modifiers {
    Modifiers::from_bits_truncate(param.saturating_sub(1) as u8)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(bytes: &[u8]) -> Vec<Event> {
        Parser::new().advance(bytes)
    }

    fn parse_one(bytes: &[u8]) -> Event {
        let events = parse(bytes);
        assert_eq!(events.len(), 1, "expected one event from {bytes:?}");
        events[0]
    }

    fn k(code: KeyCode) -> Event {
        Event::Key(KeyEvent::plain(code))
    }

    // ── Plain keys ────────────────────────────────────────────────

    #[test]
    fn printable_ascii() {
        assert_eq!(parse(b"ab"), vec![k(KeyCode::Char('a')), k(KeyCode::Char('b'))]);
    }

    #[test]
    fn control_chords() {
        let event = parse_one(b"\x11");
        let Event::Key(key) = event else {
            panic!("expected key, got {event:?}");
        };
        assert!(key.is_ctrl('q'));
        assert!(!key.is_ctrl('r'));
    }

    #[test]
    fn enter_backspace_tab() {
        assert_eq!(parse_one(b"\r"), k(KeyCode::Enter));
        assert_eq!(parse_one(b"\x7f"), k(KeyCode::Backspace));
        assert_eq!(parse_one(b"\t"), k(KeyCode::Tab));
    }

    #[test]
    fn utf8_multibyte() {
        assert_eq!(parse_one("é".as_bytes()), k(KeyCode::Char('é')));
        assert_eq!(parse_one("漢".as_bytes()), k(KeyCode::Char('漢')));
    }

    // ── Cursor keys ───────────────────────────────────────────────

    #[test]
    fn csi_arrows() {
        assert_eq!(
            parse(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![
                k(KeyCode::Up),
                k(KeyCode::Down),
                k(KeyCode::Right),
                k(KeyCode::Left)
            ]
        );
    }

    #[test]
    fn ss3_arrows() {
        assert_eq!(parse_one(b"\x1bOA"), k(KeyCode::Up));
        assert_eq!(parse_one(b"\x1bOD"), k(KeyCode::Left));
    }

    #[test]
    fn arrow_with_ctrl_modifier() {
        assert_eq!(
            parse_one(b"\x1b[1;5C"),
            Event::Key(KeyEvent {
                code: KeyCode::Right,
                modifiers: Modifiers::CTRL,
            })
        );
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(parse_one(b"\x1b[3~"), k(KeyCode::Delete));
        assert_eq!(parse_one(b"\x1b[1~"), k(KeyCode::Home));
        assert_eq!(parse_one(b"\x1b[4~"), k(KeyCode::End));
    }

    #[test]
    fn unknown_csi_is_dropped() {
        assert_eq!(parse(b"\x1b[99~x"), vec![k(KeyCode::Char('x'))]);
    }

    // ── Split input ───────────────────────────────────────────────

    #[test]
    fn sequence_split_across_reads() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b[").is_empty());
        assert!(parser.has_pending());
        assert_eq!(parser.advance(b"C"), vec![k(KeyCode::Right)]);
        assert!(!parser.has_pending());
    }

    #[test]
    fn lone_escape_flushes_as_escape() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b").is_empty());
        assert_eq!(parser.flush(), vec![k(KeyCode::Escape)]);
        assert!(!parser.has_pending());
    }

    // ── Mouse ─────────────────────────────────────────────────────

    #[test]
    fn sgr_left_press_is_zero_indexed() {
        assert_eq!(
            parse_one(b"\x1b[<0;5;3M"),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Press(MouseButton::Left),
                x: 4,
                y: 2,
            })
        );
    }

    #[test]
    fn sgr_release() {
        assert_eq!(
            parse_one(b"\x1b[<0;1;1m"),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Release(MouseButton::Left),
                x: 0,
                y: 0,
            })
        );
    }

    #[test]
    fn sgr_scroll() {
        let Event::Mouse(m) = parse_one(b"\x1b[<65;10;10M") else {
            panic!("expected mouse event");
        };
        assert_eq!(m.kind, MouseEventKind::ScrollDown);
    }

    #[test]
    fn sgr_split_across_reads() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b[<0;12").is_empty());
        let events = parser.advance(b";7M");
        assert_eq!(events.len(), 1);
        let Event::Mouse(m) = events[0] else {
            panic!("expected mouse event");
        };
        assert_eq!((m.x, m.y), (11, 6));
    }
}
