//! Annotation sources - the boundary to the host editor
//!
//! The host owns highlighting; this crate only asks it, per position,
//! which annotations are active. `Snapshot` is an in-memory source: the
//! buffer lines plus every annotated byte range, captured at once.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::syntax::Annotation;

/// Supplies the annotations active at a position
pub trait AnnotationSource {
    /// Annotations covering byte column `col` of line `row`, in discovery order
    fn annotations_at(&self, row: usize, col: usize) -> Vec<Annotation>;
}

impl<F> AnnotationSource for F
where
    F: Fn(usize, usize) -> Vec<Annotation>,
{
    fn annotations_at(&self, row: usize, col: usize) -> Vec<Annotation> {
        self(row, col)
    }
}

/// An annotation applied to a byte range of one line
#[derive(Debug, Clone)]
struct AnnotatedRange {
    range: Range<usize>,
    annotation: Annotation,
}

/// A captured buffer: its lines and annotated ranges
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Buffer name (e.g., "main.rs", "[No Name]")
    name: String,
    /// Associated file path
    filename: Option<PathBuf>,
    /// Lines of text, without newlines
    lines: Vec<String>,
    /// Ranges per line, in the order they were added
    ranges: Vec<Vec<AnnotatedRange>>,
}

impl Snapshot {
    /// Create a snapshot from text
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let ranges = vec![Vec::new(); lines.len()];
        Self {
            name: name.into(),
            filename: None,
            lines,
            ranges,
        }
    }

    /// Create a snapshot from file contents
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        let mut snapshot = Self::from_text(name, &content);
        snapshot.filename = Some(path.to_path_buf());
        Ok(snapshot)
    }

    /// Get buffer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get filename if set
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Get all lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Get number of lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Annotate a byte range of a line
    ///
    /// Ranges outside the buffer are ignored; later calls count as later discovery.
    pub fn annotate(&mut self, row: usize, range: Range<usize>, annotation: Annotation) {
        if let Some(ranges) = self.ranges.get_mut(row) {
            ranges.push(AnnotatedRange { range, annotation });
        }
    }

    /// Annotate every occurrence of `needle` on a line
    pub fn annotate_matches(&mut self, row: usize, needle: &str, annotation: &Annotation) {
        let Some(line) = self.lines.get(row) else {
            return;
        };
        let found: Vec<Range<usize>> = line
            .match_indices(needle)
            .map(|(start, m)| start..start + m.len())
            .collect();
        for range in found {
            self.annotate(row, range, annotation.clone());
        }
    }
}

impl AnnotationSource for Snapshot {
    fn annotations_at(&self, row: usize, col: usize) -> Vec<Annotation> {
        self.ranges
            .get(row)
            .map(|ranges| {
                ranges
                    .iter()
                    .filter(|r| r.range.contains(&col))
                    .map(|r| r.annotation.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
