//! Render-target independent code model
//!
//! A `CodeModel` is built once per export request, handed to exactly one
//! emitter and dropped afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::syntax::{Color, Style};

/// Theme defaults inherited when no annotation sets a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(rename = "fgColor")]
    pub fg: Color,
    #[serde(rename = "bgColor")]
    pub bg: Color,
}

impl Theme {
    pub fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }

    /// The style of text no annotation touches
    pub fn default_style(&self) -> Style {
        Style::new(self.fg, self.bg)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(Color::WHITE, Color::BLACK)
    }
}

/// A font family name with an optional font file to embed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl FontFace {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
        }
    }
}

/// The four font slots: regular, bold, italic, bold-italic
///
/// Missing slots fall back to the regular face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSlots {
    pub default: FontFace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<FontFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<FontFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold_italic: Option<FontFace>,
}

impl FontSlots {
    /// Face for the given flags
    pub fn face(&self, bold: bool, italic: bool) -> &FontFace {
        let slot = match (bold, italic) {
            (false, false) => None,
            (true, false) => self.bold.as_ref(),
            (false, true) => self.italic.as_ref(),
            (true, true) => self.bold_italic.as_ref(),
        };
        slot.unwrap_or(&self.default)
    }
}

impl Default for FontSlots {
    fn default() -> Self {
        Self {
            default: FontFace::named("monospace"),
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }
}

/// Font size (CSS pixels), line height multiplier and font faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSettings {
    #[serde(default = "default_font_size")]
    pub size: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default)]
    pub fonts: FontSlots,
}

fn default_font_size() -> f64 {
    14.0
}

fn default_line_height() -> f64 {
    1.5
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            size: default_font_size(),
            line_height: default_line_height(),
            fonts: FontSlots::default(),
        }
    }
}

/// A maximal run of text sharing one resolved style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(flatten)]
    pub style: Style,
    /// Name of the annotation that won resolution
    #[serde(rename = "styleName", default)]
    pub style_name: String,
    pub text: String,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: Style, style_name: impl Into<String>) -> Self {
        Self {
            style,
            style_name: style_name.into(),
            text: text.into(),
        }
    }
}

/// One source line as ordered segments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Line {
    pub segments: Vec<Segment>,
}

impl Line {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// The original line text
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Number of characters on this line
    pub fn char_count(&self) -> usize {
        self.segments.iter().map(|s| s.text.chars().count()).sum()
    }

    /// True for empty and whitespace-only lines
    pub fn is_blank(&self) -> bool {
        self.segments
            .iter()
            .all(|s| s.text.chars().all(char::is_whitespace))
    }
}

/// Ordered lines plus the theme and font they were resolved against
#[derive(Debug, Clone, PartialEq)]
pub struct CodeModel {
    lines: Vec<Line>,
    theme: Theme,
    font: FontSettings,
}

impl CodeModel {
    pub fn new(lines: Vec<Line>, theme: Theme, font: FontSettings) -> Self {
        Self { lines, theme, font }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn font(&self) -> &FontSettings {
        &self.font
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Character count of the longest line
    pub fn longest_line_chars(&self) -> usize {
        self.lines.iter().map(Line::char_count).max().unwrap_or(0)
    }

    /// Unstyled text, lines joined with `\n`
    pub fn plain_text(&self) -> String {
        self.lines.iter().map(Line::text).collect::<Vec<_>>().join("\n")
    }

    /// Every segment in document order
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.lines.iter().flat_map(|line| line.segments.iter())
    }

    /// Split back into parts, for serialization into a request
    pub fn into_parts(self) -> (Vec<Line>, Theme, FontSettings) {
        (self.lines, self.theme, self.font)
    }
}
