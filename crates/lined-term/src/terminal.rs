// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, alternate screen, click reporting, and
// RAII restore.
//
// Safety: termios (tcgetattr/tcsetattr), ioctl(TIOCGWINSZ), isatty,
// poll and read on a raw fd have no safe std equivalent. Each unsafe
// block is a single call.
#![allow(unsafe_code)]
//
// A panic while the terminal is raw would leave the user's shell without
// echo. The panic hook writes a fixed restore sequence straight to fd 1
// (no stdout lock, so no deadlock if the panic happened mid-paint) and
// restores the saved termios before the default hook prints.

use std::io::{self, Write};
use std::sync::{Mutex, Once};
use std::time::Duration;

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Fallback used when the size cannot be queried (pipes, tests).
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

/// Query the terminal size via `ioctl(TIOCGWINSZ)`.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    (result == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a TTY.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Mouse off, attributes reset, cursor shown, main screen restored.
/// Alternate screen exit comes last so no UI remnants stay visible.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?1006l\x1b[?1000l\x1b[0m\x1b[?25h\x1b[?1049l";

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            original(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
        if let Ok(guard) = TERMIOS_BACKUP.lock() {
            if let Some(ref original) = *guard {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle. [`enter`](Self::enter) switches to raw mode on the
/// alternate screen with click reporting; dropping the handle restores
/// everything.
pub struct Terminal {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    size: Size,
    active: bool,
}

impl Terminal {
    /// Create a handle and cache the current size. Does not touch the
    /// terminal mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            size: get_size().unwrap_or(Size::FALLBACK),
            active: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the size from the OS, keeping the cached value on failure.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(size) = get_size() {
            self.size = size;
        }
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode, the alternate screen, and click reporting.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or terminal output fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();
        self.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        ansi::enable_mouse(&mut lock)?;
        lock.flush()?;

        self.active = true;
        Ok(())
    }

    /// Undo [`enter`](Self::enter). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::disable_mouse(&mut lock)?;
        ansi::reset(&mut lock)?;
        ansi::cursor_show(&mut lock)?;
        ansi::exit_alt_screen(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    /// Block until stdin has data or `timeout` elapses, then read what is
    /// available. Returns `Ok(0)` on timeout.
    ///
    /// # Errors
    ///
    /// Propagates `poll`/`read` failures.
    pub fn read_input(&self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        #[cfg(unix)]
        {
            read_ready(libc::STDIN_FILENO, buf, timeout)
        }

        #[cfg(not(unix))]
        {
            let _ = timeout;
            io::Read::read(&mut io::stdin().lock(), buf)
        }
    }

    // ── Raw Mode ────────────────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        if !is_tty() {
            return Ok(());
        }
        let fd = libc::STDIN_FILENO;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            libc::cfmakeraw(&raw mut termios);
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.take() {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

/// Wait for `fd` to become readable, then read straight from it.
///
/// Reads the fd itself, never `io::stdin()`: bytes held in std's stdin
/// buffer are invisible to `poll`.
#[cfg(unix)]
fn read_ready(fd: libc::c_int, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    let ready = unsafe { libc::poll(&raw mut pfd, 1, millis) };
    if ready == 0 {
        return Ok(0);
    }
    if ready < 0 {
        return interrupted_as_zero(io::Error::last_os_error());
    }

    let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if n < 0 {
        return interrupted_as_zero(io::Error::last_os_error());
    }
    #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
    Ok(n as usize)
}

/// A signal (e.g. SIGWINCH) interrupting the wait is not an error; the
/// caller simply sees no input this round.
#[cfg(unix)]
fn interrupted_as_zero(err: io::Error) -> io::Result<usize> {
    if err.kind() == io::ErrorKind::Interrupted {
        Ok(0)
    } else {
        Err(err)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_inactive() {
        let term = Terminal::new();
        assert!(!term.is_active());
        assert!(term.size().cols > 0);
        assert!(term.size().rows > 0);
    }

    #[test]
    fn leave_while_inactive_is_noop() {
        let mut term = Terminal::new();
        assert!(term.leave().is_ok());
        assert!(!term.is_active());
    }

    #[test]
    fn emergency_restore_exits_alt_screen_last() {
        assert!(EMERGENCY_RESTORE.ends_with(b"\x1b[?1049l"));
    }

    #[test]
    fn fallback_size() {
        assert_eq!(Size::FALLBACK, Size { cols: 80, rows: 24 });
    }

    // ── read_ready ──────────────────────────────────────────────────

    #[cfg(unix)]
    fn pipe() -> (libc::c_int, libc::c_int) {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (fds[0], fds[1])
    }

    #[cfg(unix)]
    fn close(fd: libc::c_int) {
        unsafe {
            libc::close(fd);
        }
    }

    #[cfg(unix)]
    #[test]
    fn burst_larger_than_buffer_is_fully_delivered() {
        let (rd, wr) = pipe();
        let data: Vec<u8> = (0..3000u32).map(|i| b'a' + (i % 26) as u8).collect();
        let written = unsafe { libc::write(wr, data.as_ptr().cast(), data.len()) };
        assert_eq!(written, 3000);

        // Writer stays open, so an empty pipe times out instead of hitting EOF.
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        for _ in 0..8 {
            let n = read_ready(rd, &mut buf, Duration::from_millis(50)).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }

        assert_eq!(received.len(), 3000);
        assert_eq!(received, data);
        close(rd);
        close(wr);
    }

    #[cfg(unix)]
    #[test]
    fn idle_fd_times_out_with_zero() {
        let (rd, wr) = pipe();
        let mut buf = [0u8; 16];
        assert_eq!(read_ready(rd, &mut buf, Duration::from_millis(10)).unwrap(), 0);
        close(rd);
        close(wr);
    }
}
