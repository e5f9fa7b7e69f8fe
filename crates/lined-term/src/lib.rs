// SPDX-License-Identifier: MIT
//
// lined-term — terminal plumbing for the lined editor surface.
//
// Only what a line-oriented caret surface needs: raw mode and the
// alternate screen with guaranteed restore, a handful of ANSI writers,
// and an input parser that understands keys and SGR mouse clicks.
// Everything above this layer (documents, carets, views) lives in
// lined-editor.

pub mod ansi;
pub mod input;
pub mod terminal;
