//! Highlight annotations and style resolution
//!
//! This module provides the style vocabulary shared by every stage:
//! - Colors and resolved/partial styles
//! - Annotation kinds and their precedence bands
//! - Resolution of overlapping annotations into one style

mod annotation;
mod resolver;
mod style;
mod tokens;

pub use annotation::Annotation;
pub use resolver::{effective_priority, resolve, Resolved, StyleCache, DEFAULT_STYLE_NAME};
pub use style::{Color, ParseColorError, PartialStyle, Style};
pub use tokens::{
    AnnotationKind, GRAMMAR_PRIORITY, MARKER_PROMOTED_PRIORITY, SEMANTIC_PRIORITY, SYNTAX_PRIORITY,
};
