//! Annotation kinds for highlighting layers
//!
//! Every annotation is tagged by its collector with the layer that
//! produced it. The layer decides its precedence band and the priority
//! it gets when the host did not report one.

use serde::{Deserialize, Serialize};

/// Priority given to syntax annotations without an explicit priority
pub const SYNTAX_PRIORITY: i32 = 50;
/// Priority given to grammar-tree annotations without an explicit priority
pub const GRAMMAR_PRIORITY: i32 = 100;
/// Priority given to semantic-token annotations without an explicit priority
pub const SEMANTIC_PRIORITY: i32 = 125;
/// Priority an unprioritized marker is promoted to when it overlaps a grammar token
pub const MARKER_PROMOTED_PRIORITY: i32 = 200;

/// The highlighting layer an annotation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// Generic lexical/syntax highlighting
    Syntax,
    /// Grammar/tree based tokens
    GrammarToken,
    /// Language-server semantic tokens
    SemanticToken,
    /// Explicit end-user markers
    Marker,
}

impl AnnotationKind {
    /// Precedence band; a higher band always outranks a lower one
    pub fn band(&self) -> u8 {
        match self {
            AnnotationKind::Syntax => 0,
            AnnotationKind::GrammarToken => 1,
            AnnotationKind::SemanticToken => 2,
            AnnotationKind::Marker => 3,
        }
    }

    /// Priority used when the host reported none
    ///
    /// Markers have no fixed default, see `resolver::effective_priority`.
    pub fn default_priority(&self) -> Option<i32> {
        match self {
            AnnotationKind::Syntax => Some(SYNTAX_PRIORITY),
            AnnotationKind::GrammarToken => Some(GRAMMAR_PRIORITY),
            AnnotationKind::SemanticToken => Some(SEMANTIC_PRIORITY),
            AnnotationKind::Marker => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_order() {
        assert!(AnnotationKind::Marker.band() > AnnotationKind::SemanticToken.band());
        assert!(AnnotationKind::SemanticToken.band() > AnnotationKind::GrammarToken.band());
        assert!(AnnotationKind::GrammarToken.band() > AnnotationKind::Syntax.band());
    }

    #[test]
    fn test_default_priorities() {
        assert_eq!(AnnotationKind::Syntax.default_priority(), Some(50));
        assert_eq!(AnnotationKind::GrammarToken.default_priority(), Some(100));
        assert_eq!(AnnotationKind::Marker.default_priority(), None);
    }

    #[test]
    fn test_serde_names_match() {
        let json = serde_json::to_string(&AnnotationKind::GrammarToken).unwrap();
        assert_eq!(json, "\"grammar_token\"");
    }
}
