//! Style resolution
//!
//! Merges every annotation active at one position into one concrete
//! style. Layers are ranked by (band, priority, discovery order), highest
//! first, and each attribute is taken from the highest-ranked layer that
//! sets it.

use std::collections::HashMap;

use crate::model::Theme;

use super::annotation::Annotation;
use super::style::{PartialStyle, Style};
use super::tokens::{AnnotationKind, MARKER_PROMOTED_PRIORITY};

/// Style name used for text without annotations
pub const DEFAULT_STYLE_NAME: &str = "Normal";

/// The resolved style at a position and the annotation that won it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub style: Style,
    pub name: String,
}

/// Priority an annotation sorts with inside its band
///
/// A marker without a priority that overlaps a grammar token is promoted
/// above the grammar default; markers are presumed to intend override.
pub fn effective_priority(annotation: &Annotation, has_grammar_token: bool) -> i32 {
    if let Some(priority) = annotation.priority {
        return priority;
    }
    match annotation.kind.default_priority() {
        Some(priority) => priority,
        None if has_grammar_token => MARKER_PROMOTED_PRIORITY,
        None => 0,
    }
}

/// Resolve the annotations active at one position
///
/// Returns `None` for an empty slice; the caller substitutes theme defaults.
pub fn resolve(annotations: &[Annotation], theme: &Theme) -> Option<Resolved> {
    if annotations.is_empty() {
        return None;
    }

    let has_grammar_token = annotations
        .iter()
        .any(|a| a.kind == AnnotationKind::GrammarToken);

    let mut ranked: Vec<(u8, i32, usize, &Annotation)> = annotations
        .iter()
        .enumerate()
        .map(|(index, a)| (a.kind.band(), effective_priority(a, has_grammar_token), index, a))
        .collect();
    // Later discovery wins ties, so the index takes part in the descending sort.
    ranked.sort_by(|a, b| (b.0, b.1, b.2).cmp(&(a.0, a.1, a.2)));

    let top = ranked[0].3;
    let mut acc: PartialStyle = top.style;
    for (_, _, _, annotation) in &ranked[1..] {
        if acc.is_complete() {
            break;
        }
        acc.inherit(&annotation.style);
    }

    Some(Resolved {
        style: acc.finish(theme.fg, theme.bg),
        name: top.name.clone(),
    })
}

/// Per-request cache of resolved styles
///
/// Keyed by the exact annotation list, which makes a hit equivalent to
/// calling `resolve` again. Never shared between requests.
#[derive(Debug)]
pub struct StyleCache {
    theme: Theme,
    entries: HashMap<Vec<Annotation>, Resolved>,
    hits: usize,
    misses: usize,
}

impl StyleCache {
    /// Create an empty cache for one request's theme
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Theme this cache resolves against
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Resolve, substituting theme defaults when nothing is annotated
    pub fn resolve(&mut self, annotations: &[Annotation]) -> Resolved {
        if annotations.is_empty() {
            return Resolved {
                style: self.theme.default_style(),
                name: DEFAULT_STYLE_NAME.to_string(),
            };
        }

        if let Some(hit) = self.entries.get(annotations) {
            self.hits += 1;
            return hit.clone();
        }

        self.misses += 1;
        let resolved = resolve(annotations, &self.theme).unwrap_or_else(|| Resolved {
            style: self.theme.default_style(),
            name: DEFAULT_STYLE_NAME.to_string(),
        });
        self.entries.insert(annotations.to_vec(), resolved.clone());
        resolved
    }

    /// (hits, misses) so far
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Number of distinct annotation lists seen
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Color;

    const RED: Color = Color::rgb(0xff, 0, 0);
    const GREEN: Color = Color::rgb(0, 0xff, 0);
    const BLUE: Color = Color::rgb(0, 0, 0xff);

    fn theme() -> Theme {
        Theme::new(Color::WHITE, Color::BLACK)
    }

    fn grammar(name: &str, priority: i32, style: PartialStyle) -> Annotation {
        Annotation::new(name, AnnotationKind::GrammarToken, style).with_priority(priority)
    }

    #[test]
    fn test_empty_resolves_to_none() {
        assert_eq!(resolve(&[], &theme()), None);
    }

    #[test]
    fn test_attribute_inheritance_across_priorities() {
        let a = grammar("A", 50, PartialStyle::fg(RED));
        let b = grammar("B", 100, PartialStyle::bg(BLUE));
        let resolved = resolve(&[a, b], &theme()).unwrap();

        assert_eq!(resolved.style, Style::new(RED, BLUE));
        assert_eq!(resolved.name, "B");
    }

    #[test]
    fn test_tie_breaks_to_later_discovery() {
        let a = grammar("A", 100, PartialStyle::fg(RED));
        let b = grammar("B", 100, PartialStyle::fg(GREEN));
        let resolved = resolve(&[a, b], &theme()).unwrap();

        assert_eq!(resolved.style.fg, GREEN);
        assert_eq!(resolved.name, "B");
    }

    #[test]
    fn test_high_priority_fg_keeps_lower_bold() {
        let low = grammar("Low", 10, PartialStyle::default().with_bold(true));
        let high = grammar("High", 90, PartialStyle::fg(RED));
        let resolved = resolve(&[high, low], &theme()).unwrap();

        assert_eq!(resolved.style.fg, RED);
        assert!(resolved.style.bold);
    }

    #[test]
    fn test_explicit_false_is_not_overridden() {
        let low = grammar("Low", 10, PartialStyle::default().with_bold(true));
        let high = grammar("High", 90, PartialStyle::default().with_bold(false));
        let resolved = resolve(&[low, high], &theme()).unwrap();
        assert!(!resolved.style.bold);
    }

    #[test]
    fn test_unset_colors_fall_back_to_theme() {
        let only_bold = grammar("Bold", 1, PartialStyle::default().with_bold(true));
        let resolved = resolve(&[only_bold], &theme()).unwrap();
        assert_eq!(resolved.style.fg, Color::WHITE);
        assert_eq!(resolved.style.bg, Color::BLACK);
    }

    #[test]
    fn test_layered_scenario_with_marker_promotion() {
        let syntax = Annotation::new(
            "Statement",
            AnnotationKind::Syntax,
            PartialStyle::default().with_bold(true),
        )
        .with_priority(50);
        let grammar = grammar("@keyword", 100, PartialStyle::fg(GREEN));
        let marker = Annotation::new("Search", AnnotationKind::Marker, PartialStyle::bg(BLUE));

        let resolved = resolve(&[syntax, grammar, marker], &theme()).unwrap();
        assert_eq!(
            resolved.style,
            Style {
                fg: GREEN,
                bg: BLUE,
                bold: true,
                italic: false,
                underline: false,
            }
        );
        assert_eq!(resolved.name, "Search");
    }

    #[test]
    fn test_band_beats_raw_priority() {
        let semantic = Annotation::new("@lsp.type.variable", AnnotationKind::SemanticToken, PartialStyle::fg(RED))
            .with_priority(1);
        let grammar = grammar("@variable", 500, PartialStyle::fg(GREEN));
        let resolved = resolve(&[grammar, semantic], &theme()).unwrap();
        assert_eq!(resolved.style.fg, RED);
    }

    #[test]
    fn test_marker_priority_promotion() {
        let marker = Annotation::new("Mark", AnnotationKind::Marker, PartialStyle::fg(RED));
        assert_eq!(effective_priority(&marker, true), 200);
        assert_eq!(effective_priority(&marker, false), 0);
        assert_eq!(effective_priority(&marker.clone().with_priority(7), true), 7);

        let unprioritized = Annotation::new("Late", AnnotationKind::Marker, PartialStyle::fg(RED));
        let prioritized =
            Annotation::new("Early", AnnotationKind::Marker, PartialStyle::fg(GREEN)).with_priority(150);
        let token = grammar("@string", 100, PartialStyle::default());

        let with_grammar = resolve(&[prioritized.clone(), unprioritized.clone(), token], &theme()).unwrap();
        assert_eq!(with_grammar.name, "Late");

        let without_grammar = resolve(&[prioritized, unprioritized], &theme()).unwrap();
        assert_eq!(without_grammar.name, "Early");
    }

    #[test]
    fn test_unpromoted_marker_still_outranks_lower_bands() {
        let marker = Annotation::new("Search", AnnotationKind::Marker, PartialStyle::fg(BLUE));
        assert_eq!(effective_priority(&marker, false), 0);

        let semantic = Annotation::new("@lsp.type.function", AnnotationKind::SemanticToken, PartialStyle::fg(RED))
            .with_priority(1000);
        let syntax = Annotation::new("Function", AnnotationKind::Syntax, PartialStyle::bg(GREEN))
            .with_priority(1000);

        let resolved = resolve(&[marker, semantic, syntax], &theme()).unwrap();
        assert_eq!(resolved.name, "Search");
        assert_eq!(resolved.style.fg, BLUE);
        assert_eq!(resolved.style.bg, GREEN);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let list = vec![
            grammar("A", 100, PartialStyle::fg(RED).with_italic(true)),
            grammar("B", 100, PartialStyle::bg(GREEN)),
        ];
        assert_eq!(resolve(&list, &theme()), resolve(&list, &theme()));
    }

    #[test]
    fn test_cache_hits_match_fresh_resolution() {
        let mut cache = StyleCache::new(theme());
        let list = vec![grammar("A", 100, PartialStyle::fg(RED))];

        let first = cache.resolve(&list);
        let second = cache.resolve(&list);
        assert_eq!(first, second);
        assert_eq!(Some(first), resolve(&list, &theme()));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_empty_input_uses_theme() {
        let mut cache = StyleCache::new(theme());
        let resolved = cache.resolve(&[]);
        assert_eq!(resolved.style, theme().default_style());
        assert_eq!(resolved.name, DEFAULT_STYLE_NAME);
        assert!(cache.is_empty());
    }
}
