//! Editor options — the `set` layer.
//!
//! [`EditorOptions`] holds every tunable of the editor surface. Values are
//! changed through `set`-style directives, which the binary reads from the
//! `LINED_OPTS` environment variable and from `--set` arguments.
//!
//! # Supported syntax
//!
//! | Syntax          | Effect                         |
//! |-----------------|--------------------------------|
//! | `option`        | Enable boolean / query numeric |
//! | `nooption`      | Disable boolean                |
//! | `option!`       | Toggle boolean                 |
//! | `option?`       | Query current value            |
//! | `option=N`      | Assign numeric value           |
//!
//! # Option names
//!
//! | Full name    | Abbrev | Type    | Default |
//! |--------------|--------|---------|---------|
//! | `vertclamp`  | `vc`   | bool    | false   |
//! | `stripcr`    | `scr`  | bool    | true    |
//! | `number`     | `nu`   | bool    | true    |
//! | `scrolloff`  | `so`   | integer | 0       |

use thiserror::Error;

/// A parsed `set` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    On(String),
    Off(String),
    Toggle(String),
    Query(String),
    Assign(String, String),
}

/// Why a directive could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),

    #[error("invalid argument: {name}={value}")]
    InvalidValue { name: String, value: String },

    #[error("{0} is a number option, use {0}=N")]
    NotBoolean(String),

    #[error("{0} is a boolean option")]
    NotNumeric(String),
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Canonical option, resolved from a full name or abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionName {
    VertClamp,
    StripCr,
    Number,
    ScrollOff,
}

impl OptionName {
    fn resolve(name: &str) -> Option<Self> {
        match name {
            "vertclamp" | "vc" => Some(Self::VertClamp),
            "stripcr" | "scr" => Some(Self::StripCr),
            "number" | "nu" => Some(Self::Number),
            "scrolloff" | "so" => Some(Self::ScrollOff),
            _ => None,
        }
    }

    const fn full_name(self) -> &'static str {
        match self {
            Self::VertClamp => "vertclamp",
            Self::StripCr => "stripcr",
            Self::Number => "number",
            Self::ScrollOff => "scrolloff",
        }
    }

    const fn is_bool(self) -> bool {
        !matches!(self, Self::ScrollOff)
    }
}

/// Returns `true` if `name` is a known boolean option.
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    OptionName::resolve(name).is_some_and(OptionName::is_bool)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse whitespace-separated directives, e.g. `"novc so=3"`.
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    args.split_whitespace().map(parse_set_arg).collect()
}

/// Parse one directive.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }
    if let Some(name) = arg.strip_suffix('?') {
        return SetDirective::Query(name.to_string());
    }
    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_string());
    }
    // `no` prefix only when the remainder is a boolean option, so a future
    // option whose name starts with "no" is not misread.
    if let Some(name) = arg.strip_prefix("no") {
        if is_bool_option(name) {
            return SetDirective::Off(name.to_string());
        }
    }
    if OptionName::resolve(arg).is_some_and(|o| !o.is_bool()) {
        return SetDirective::Query(arg.to_string());
    }
    SetDirective::On(arg.to_string())
}

// ---------------------------------------------------------------------------
// EditorOptions
// ---------------------------------------------------------------------------

/// Tunables of the editor surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    /// Clamp the caret offset to the destination line on up/down moves.
    /// Off: the offset is carried unchanged and only clamped for display.
    pub vertical_clamp: bool,
    /// Drop the `\r` of `\r\n` terminators when loading.
    pub strip_cr: bool,
    /// Show the line-number gutter.
    pub line_numbers: bool,
    /// Rows of context kept above and below the caret line when scrolling.
    pub scrolloff: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            vertical_clamp: false,
            strip_cr: true,
            line_numbers: true,
            scrolloff: 0,
        }
    }
}

impl EditorOptions {
    /// Apply one directive. Queries return the formatted value; changes
    /// return `None`.
    ///
    /// # Errors
    ///
    /// Unknown names, non-numeric values, and boolean/numeric mismatches.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<Option<String>, OptionError> {
        let (raw, op) = match directive {
            SetDirective::On(n) => (n, Op::Set(true)),
            SetDirective::Off(n) => (n, Op::Set(false)),
            SetDirective::Toggle(n) => (n, Op::Toggle),
            SetDirective::Query(n) => (n, Op::Query),
            SetDirective::Assign(n, v) => (n, Op::Assign(v)),
        };
        let name = OptionName::resolve(raw).ok_or_else(|| OptionError::Unknown(raw.clone()))?;

        match op {
            Op::Query => Ok(Some(self.format(name))),
            Op::Set(value) => {
                *self.flag(name)? = value;
                Ok(None)
            }
            Op::Toggle => {
                let flag = self.flag(name)?;
                *flag = !*flag;
                Ok(None)
            }
            Op::Assign(value) => {
                if name.is_bool() {
                    return Err(OptionError::NotNumeric(name.full_name().to_string()));
                }
                self.scrolloff = value.parse().map_err(|_| OptionError::InvalidValue {
                    name: name.full_name().to_string(),
                    value: value.clone(),
                })?;
                Ok(None)
            }
        }
    }

    /// Parse and apply a whole directive string, stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first [`OptionError`] encountered.
    pub fn apply_str(&mut self, args: &str) -> Result<Vec<String>, OptionError> {
        let mut reports = Vec::new();
        for directive in parse_set(args) {
            if let Some(report) = self.apply(&directive)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    fn flag(&mut self, name: OptionName) -> Result<&mut bool, OptionError> {
        match name {
            OptionName::VertClamp => Ok(&mut self.vertical_clamp),
            OptionName::StripCr => Ok(&mut self.strip_cr),
            OptionName::Number => Ok(&mut self.line_numbers),
            OptionName::ScrollOff => Err(OptionError::NotBoolean(name.full_name().to_string())),
        }
    }

    fn format(&self, name: OptionName) -> String {
        let bool_value = match name {
            OptionName::VertClamp => self.vertical_clamp,
            OptionName::StripCr => self.strip_cr,
            OptionName::Number => self.line_numbers,
            OptionName::ScrollOff => return format!("scrolloff={}", self.scrolloff),
        };
        format_bool(name.full_name(), bool_value)
    }
}

enum Op<'a> {
    Set(bool),
    Toggle,
    Query,
    Assign(&'a String),
}

/// `"name"` when true, `"noname"` when false.
#[must_use]
pub fn format_bool(name: &str, value: bool) -> String {
    if value {
        name.to_string()
    } else {
        format!("no{name}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
