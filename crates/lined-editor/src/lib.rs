//! # lined-editor — Editor core for lined
//!
//! The building blocks of a line-oriented editing surface:
//!
//! - **[`document`]** — `Document`, an ordered sequence of `Line`s with stable ids
//! - **[`caret`]** — `Caret`, the single logical (line, offset) cursor and its movement rules
//! - **[`render`]** — `CursorRenderer`, the seam between the caret and a display surface
//! - **[`source`]** — `DocumentSource`, async providers of text to load
//! - **[`controller`]** — `DocumentController`, load lifecycle and input routing
//! - **[`view`]** — `View`, a terminal viewport implementing `CursorRenderer`
//! - **[`options`]** — `EditorOptions` and the `:set`-style option parser
//! - **[`error`]** — `EditorError`

pub mod caret;
pub mod controller;
pub mod document;
pub mod error;
pub mod options;
pub mod render;
pub mod source;
pub mod view;
