//! snapcode - export highlighted editor buffers as HTML, RTF and PNG
//!
//! Overlapping highlight annotations are resolved into one style per
//! character, collapsed into styled segments and handed to one emitter.
//! The exporter runs as a separate process that answers one JSON request.

pub mod clipboard;
pub mod config;
pub mod emit;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod render;
pub mod segment;
pub mod source;
pub mod syntax;
pub mod transport;

pub use error::{ExportError, Result};
