//! Segment building
//!
//! Walks each line one character at a time, resolves the style at that
//! character and coalesces runs of identical visual style into segments.
//!
//! Annotation lookups against the host can be slow, so the walk is an
//! explicit state machine that can be advanced in bounded slices. Slicing
//! only changes when work happens, never what is produced.

use std::collections::VecDeque;

use tracing::debug;

use crate::model::{CodeModel, FontSettings, Line, Segment, Theme};
use crate::source::{AnnotationSource, Snapshot};
use crate::syntax::{Resolved, Style, StyleCache};

/// Characters processed per cooperative slice
pub const DEFAULT_SLICE_BUDGET: usize = 2000;

/// Result of advancing a builder by one slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More work remains
    Pending,
    /// Every line has been built
    Complete,
}

/// The run being accumulated
#[derive(Debug)]
struct Run {
    start: usize,
    style: Style,
    name: String,
}

/// Resumable position inside one line
///
/// Holds the byte offset reached, the open run and the segments closed so
/// far. The style name is not part of the run key: differently named
/// annotations that resolve to the same attributes share a segment.
#[derive(Debug, Default)]
pub struct LineCursor {
    byte: usize,
    run: Option<Run>,
    segments: Vec<Segment>,
    finished: bool,
}

impl LineCursor {
    /// Process at most `budget` characters of `text`, returning how many were processed
    ///
    /// `text` must be the same line on every call.
    pub fn advance<F>(&mut self, text: &str, budget: usize, mut resolve: F) -> usize
    where
        F: FnMut(usize) -> Resolved,
    {
        let mut used = 0;
        while used < budget {
            let Some(ch) = text[self.byte..].chars().next() else {
                break;
            };
            let resolved = resolve(self.byte);
            let continues = matches!(&self.run, Some(run) if run.style == resolved.style);
            if !continues {
                self.close_run(text, self.byte);
                self.run = Some(Run {
                    start: self.byte,
                    style: resolved.style,
                    name: resolved.name,
                });
            }
            self.byte += ch.len_utf8();
            used += 1;
        }

        if !self.finished && self.byte >= text.len() {
            self.close_run(text, text.len());
            self.finished = true;
        }
        used
    }

    fn close_run(&mut self, text: &str, end: usize) {
        if let Some(run) = self.run.take() {
            self.segments
                .push(Segment::new(&text[run.start..end], run.style, run.name));
        }
    }

    /// Whether the whole line has been processed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Remove and return the segments closed so far
    pub fn take_segments(&mut self) -> Vec<Segment> {
        std::mem::take(&mut self.segments)
    }
}

/// Lazy, finite sequence of the segments of one line
///
/// Each call to `next` resolves only as many characters as it takes to
/// close one segment. Not restartable.
pub struct LineSegments<'a, F> {
    text: &'a str,
    cursor: LineCursor,
    resolve: F,
    ready: VecDeque<Segment>,
}

impl<F> Iterator for LineSegments<'_, F>
where
    F: FnMut(usize) -> Resolved,
{
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        loop {
            if let Some(segment) = self.ready.pop_front() {
                return Some(segment);
            }
            if self.cursor.is_finished() {
                return None;
            }
            self.cursor.advance(self.text, 1, &mut self.resolve);
            self.ready.extend(self.cursor.take_segments());
        }
    }
}

/// Segments of `text`, resolving the style at each byte column with `resolve`
pub fn segments<F>(text: &str, resolve: F) -> LineSegments<'_, F>
where
    F: FnMut(usize) -> Resolved,
{
    LineSegments {
        text,
        cursor: LineCursor::default(),
        resolve,
        ready: VecDeque::new(),
    }
}

/// Build the segments of line `row` in one pass
pub fn build_line<S>(text: &str, row: usize, source: &S, cache: &mut StyleCache) -> Vec<Segment>
where
    S: AnnotationSource + ?Sized,
{
    segments(text, |col| cache.resolve(&source.annotations_at(row, col))).collect()
}

/// Builds a `CodeModel` from buffer lines, one budgeted slice at a time
pub struct ModelBuilder<'s, S: ?Sized> {
    lines: &'s [String],
    source: &'s S,
    cache: StyleCache,
    font: FontSettings,
    row: usize,
    cursor: LineCursor,
    built: Vec<Line>,
}

impl<'s> ModelBuilder<'s, Snapshot> {
    /// Builder over a captured snapshot
    pub fn from_snapshot(snapshot: &'s Snapshot, theme: Theme, font: FontSettings) -> Self {
        Self::new(snapshot.lines(), snapshot, theme, font)
    }
}

impl<'s, S> ModelBuilder<'s, S>
where
    S: AnnotationSource + ?Sized,
{
    /// Create a builder; the style cache lives and dies with it
    pub fn new(lines: &'s [String], source: &'s S, theme: Theme, font: FontSettings) -> Self {
        Self {
            lines,
            source,
            cache: StyleCache::new(theme),
            font,
            row: 0,
            cursor: LineCursor::default(),
            built: Vec::with_capacity(lines.len()),
        }
    }

    /// Process up to `budget` characters (at least one)
    pub fn step(&mut self, budget: usize) -> Progress {
        let lines = self.lines;
        let source = self.source;
        let mut remaining = budget.max(1);

        while self.row < lines.len() && remaining > 0 {
            let row = self.row;
            let cache = &mut self.cache;
            let used = self.cursor.advance(&lines[row], remaining, |col| {
                cache.resolve(&source.annotations_at(row, col))
            });
            remaining -= used;

            if self.cursor.is_finished() {
                let mut done = std::mem::take(&mut self.cursor);
                self.built.push(Line::new(done.take_segments()));
                self.row += 1;
            }
        }

        if self.is_complete() {
            Progress::Complete
        } else {
            Progress::Pending
        }
    }

    /// Whether every line has been built
    pub fn is_complete(&self) -> bool {
        self.row >= self.lines.len()
    }

    /// Run to completion in a single pass
    pub fn finish(mut self) -> CodeModel {
        while self.step(usize::MAX) == Progress::Pending {}
        self.into_model()
    }

    /// Run to completion, yielding to the scheduler between slices
    pub async fn build_cooperative(mut self, budget: usize) -> CodeModel {
        while self.step(budget) == Progress::Pending {
            tokio::task::yield_now().await;
        }
        self.into_model()
    }

    fn into_model(self) -> CodeModel {
        let (hits, misses) = self.cache.stats();
        debug!(lines = self.built.len(), hits, misses, "code model built");
        let theme = *self.cache.theme();
        CodeModel::new(self.built, theme, self.font)
    }
}
