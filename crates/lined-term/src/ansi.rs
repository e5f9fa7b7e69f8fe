// SPDX-License-Identifier: MIT
//
// ANSI escape sequence writers.
//
// Stateless helpers that encode one terminal command each into any
// `impl Write`. Coordinates are 0-indexed in the API and converted to the
// 1-indexed form the terminal expects.

use std::io::{self, Write};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` (CUP).
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the whole screen and home the cursor.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J\x1b[H")
}

/// Clear from the cursor to the end of the current row.
#[inline]
pub fn clear_line_tail(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

/// Switch to the alternate screen buffer.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Return to the main screen buffer.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// Reset all SGR attributes.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Dim text (line-number gutter).
#[inline]
pub fn dim(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2m")
}

/// Reverse video (status line).
#[inline]
pub fn inverse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[7m")
}

// ─── Mouse ───────────────────────────────────────────────────────────────────

/// Enable click reporting with SGR coordinates (`?1000h` + `?1006h`).
///
/// Press/release only. The editor never tracks drags because selection
/// ranges are not modeled.
#[inline]
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000h\x1b[?1006h")
}

/// Disable mouse reporting.
#[inline]
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1006l\x1b[?1000l")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cursor_to_is_one_indexed() {
        assert_eq!(emit(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(emit(|w| cursor_to(w, 9, 4)), "\x1b[5;10H");
    }

    #[test]
    fn mouse_toggles_are_symmetric() {
        assert_eq!(emit(enable_mouse), "\x1b[?1000h\x1b[?1006h");
        assert_eq!(emit(disable_mouse), "\x1b[?1006l\x1b[?1000l");
    }

    #[test]
    fn alt_screen_sequences() {
        assert_eq!(emit(enter_alt_screen), "\x1b[?1049h");
        assert_eq!(emit(exit_alt_screen), "\x1b[?1049l");
    }
}
