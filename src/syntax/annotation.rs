//! Annotations: one layer's style contribution at a position

use serde::{Deserialize, Serialize};

use super::style::PartialStyle;
use super::tokens::AnnotationKind;

/// A named, optionally prioritized, partial style from one highlighting layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Highlight group name (e.g. "Keyword", "@function", "Search")
    pub name: String,
    /// Layer the collector found this annotation in
    pub kind: AnnotationKind,
    /// Priority reported by the host, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Attributes this annotation sets
    #[serde(default)]
    pub style: PartialStyle,
}

impl Annotation {
    /// Create an annotation without an explicit priority
    pub fn new(name: impl Into<String>, kind: AnnotationKind, style: PartialStyle) -> Self {
        Self {
            name: name.into(),
            kind,
            priority: None,
            style,
        }
    }

    /// Builder: set an explicit priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}
