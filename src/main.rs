// SPDX-License-Identifier: MIT
//
// lined — a line-oriented terminal editor surface.
//
// This binary wires the two crates together:
//
//   lined-term   → raw mode, alternate screen, key and mouse parsing
//   lined-editor → document, caret, load lifecycle, terminal View
//
// Each input flows through:
//
//   stdin → parser → handle_event → controller → caret → View (renderer)
//   paint → View::paint → stdout
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ gutter + text                │  ← rows - 1 (managed by View)
//   ├──────────────────────────────┤
//   │ status line (INVERSE)        │  ← 1 row (managed by View)
//   └──────────────────────────────┘
//
// Keys: arrows move the caret, Ctrl-R reloads the file, Ctrl-Q quits.
// A left click places the caret under the pointer.
//
// Environment:
//
//   LINED_OPTS      option directives applied at startup, e.g. "vc so=3"
//   LINED_LOG       tracing filter (default "warn")
//   LINED_LOG_FILE  log destination; logging is off when unset

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;
use std::time::Duration;

use futures::executor::block_on;
use lined_editor::controller::{DocumentController, KeyDisposition, LoadOutcome};
use lined_editor::options::{EditorOptions, OptionError};
use lined_editor::source::FileSource;
use lined_editor::view::View;
use lined_term::input::{Event, MouseButton, MouseEventKind, Parser};
use lined_term::terminal::{Size, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const OPTS_ENV: &str = "LINED_OPTS";
const LOG_ENV: &str = "LINED_LOG";
const LOG_FILE_ENV: &str = "LINED_LOG_FILE";

/// How long to wait for input before flushing a lone ESC and checking for
/// a resize.
const INPUT_TIMEOUT: Duration = Duration::from_millis(50);

const USAGE: &str = "usage: lined [--set OPTIONS]... [FILE]";

// ─── Arguments ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    path: Option<PathBuf>,
    /// `--set` values, applied after `LINED_OPTS`.
    set: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    let mut flags_done = false;

    while let Some(arg) = args.next() {
        if !flags_done {
            if arg == "--" {
                flags_done = true;
                continue;
            }
            if arg == "--set" {
                let value = args.next().ok_or("--set needs a value")?;
                parsed.set.push(value);
                continue;
            }
            if let Some(value) = arg.strip_prefix("--set=") {
                parsed.set.push(value.to_string());
                continue;
            }
            if arg.starts_with('-') && arg.len() > 1 {
                return Err(format!("unknown flag: {arg}"));
            }
        }
        if parsed.path.is_some() {
            return Err(format!("unexpected argument: {arg}"));
        }
        parsed.path = Some(PathBuf::from(arg));
    }
    Ok(parsed)
}

/// Defaults, then `LINED_OPTS`, then each `--set` in order. Query
/// directives are returned for reporting.
fn build_options(
    env_opts: Option<&str>,
    set: &[String],
) -> Result<(EditorOptions, Vec<String>), OptionError> {
    let mut options = EditorOptions::default();
    let mut reports = Vec::new();
    for directives in env_opts.into_iter().chain(set.iter().map(String::as_str)) {
        reports.extend(options.apply_str(directives)?);
    }
    Ok((options, reports))
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Send tracing output to `LINED_LOG_FILE`. stdout belongs to the screen,
/// so without a file there is nowhere to log.
fn init_logging() -> io::Result<()> {
    let Some(path) = env::var_os(LOG_FILE_ENV) else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ─── Event handling ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep going; repaint if `dirty`.
    Continue { dirty: bool },
    Quit,
}

fn handle_event(ctl: &mut DocumentController<View>, event: &Event) -> Flow {
    match event {
        Event::Key(key) if key.is_ctrl('q') => Flow::Quit,
        Event::Key(key) if key.is_ctrl('r') => {
            reload(ctl);
            Flow::Continue { dirty: true }
        }
        Event::Key(key) => {
            let handled = ctl.handle_key(key) == KeyDisposition::Handled;
            if handled {
                ctl.with_renderer(|view, _| view.clear_message());
            }
            Flow::Continue { dirty: handled }
        }
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Press(MouseButton::Left) => {
            let target = ctl.with_renderer(|view, doc| view.place_native_cursor(doc, mouse.x, mouse.y));
            ctl.handle_click(target);
            ctl.with_renderer(|view, _| view.clear_message());
            Flow::Continue { dirty: true }
        }
        Event::Mouse(_) => Flow::Continue { dirty: false },
    }
}

/// Load from the bound source and report the result on the status line.
fn reload(ctl: &mut DocumentController<View>) {
    let message = match block_on(ctl.load_data()) {
        Ok(LoadOutcome::Applied { lines }) => format!("{lines}L read"),
        Ok(LoadOutcome::Stale) => return,
        Err(err) => err.to_string(),
    };
    ctl.with_renderer(|view, _| view.set_message(message));
}

fn title(ctl: &DocumentController<View>) -> String {
    ctl.source_name().unwrap_or_else(|| "[No Name]".to_string())
}

// ─── Terminal loop ──────────────────────────────────────────────────────────

fn paint(ctl: &DocumentController<View>, out: &mut impl Write) -> io::Result<()> {
    ctl.renderer().paint(ctl.document(), &title(ctl), out)
}

/// Match the view to the terminal. Returns `true` if the size changed.
fn fit_to(ctl: &mut DocumentController<View>, size: Size) -> bool {
    let view = ctl.renderer();
    if view.cols() == size.cols && view.rows() == size.rows {
        return false;
    }
    ctl.with_renderer(|view, _| view.resize(size.cols, size.rows));
    ctl.refresh();
    true
}

fn event_loop(terminal: &mut Terminal, ctl: &mut DocumentController<View>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut parser = Parser::new();
    let mut buf = [0u8; 1024];

    fit_to(ctl, terminal.size());
    paint(ctl, &mut stdout.lock())?;

    loop {
        let n = terminal.read_input(&mut buf, INPUT_TIMEOUT)?;
        let events = if n > 0 {
            parser.advance(&buf[..n])
        } else if parser.has_pending() {
            parser.flush()
        } else {
            Vec::new()
        };

        let mut dirty = fit_to(ctl, terminal.refresh_size());
        for event in &events {
            match handle_event(ctl, event) {
                Flow::Quit => return Ok(()),
                Flow::Continue { dirty: d } => dirty |= d,
            }
        }
        if dirty {
            paint(ctl, &mut stdout.lock())?;
        }
    }
}

fn run(ctl: &mut DocumentController<View>) -> io::Result<()> {
    let mut terminal = Terminal::new();
    terminal.enter()?;
    let result = event_loop(&mut terminal, ctl);
    let restored = terminal.leave();
    result.and(restored)
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() {
    let args = parse_args(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("lined: {e}\n{USAGE}");
        process::exit(2);
    });

    if let Err(e) = init_logging() {
        eprintln!("lined: cannot open log file: {e}");
        process::exit(1);
    }

    let env_opts = env::var(OPTS_ENV).ok();
    let (options, reports) = build_options(env_opts.as_deref(), &args.set).unwrap_or_else(|e| {
        eprintln!("lined: {e}");
        process::exit(2);
    });

    let mut ctl = DocumentController::with_options(View::new(0, 0), options);
    ctl.bind_source(FileSource::new(args.path));

    if !reports.is_empty() {
        let joined = reports.join(" ");
        ctl.with_renderer(|view, _| view.set_message(joined));
    }

    // A file that cannot be read yet (new file, no file given) still opens
    // an empty editor; the reason goes on the status line.
    match block_on(ctl.load_data()) {
        Ok(outcome) => info!(?outcome, "initial load"),
        Err(e) => {
            warn!(error = %e, "initial load failed");
            ctl.with_renderer(|view, _| view.set_message(e.to_string()));
        }
    }

    if let Err(e) = run(&mut ctl) {
        eprintln!("lined: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
