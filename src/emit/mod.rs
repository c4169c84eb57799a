//! Emitters: one output format per module
//!
//! Every emitter reads a finished `CodeModel` (which carries its theme and
//! font settings) and never mutates it.

pub mod html;
pub mod image;
pub mod page;
pub mod rtf;
