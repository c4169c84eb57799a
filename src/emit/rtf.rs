//! RTF emitter
//!
//! Builds a color table of every color the model references (theme
//! defaults first, slot 0 left as "auto"), a four-slot font table, and
//! one self-contained group per segment.

use std::fmt::Write;

use indexmap::IndexSet;

use crate::model::{CodeModel, FontSettings, Segment};
use crate::syntax::Color;

/// Page margin on each side
const PAGE_MARGIN_PT: f64 = 36.0;

/// Points to twips
pub fn pt_to_twip(pt: f64) -> i64 {
    (pt * 20.0).round() as i64
}

/// CSS pixels to twips (96 dpi)
pub fn px_to_twip(px: f64) -> i64 {
    (px * 15.0).round() as i64
}

/// CSS pixels to points (96 dpi)
pub fn px_to_pt(px: f64) -> f64 {
    px * 0.75
}

/// Font table slot for the given flags: regular, italic, bold, bold-italic
pub fn font_slot(bold: bool, italic: bool) -> usize {
    match (bold, italic) {
        (false, false) => 0,
        (false, true) => 1,
        (true, false) => 2,
        (true, true) => 3,
    }
}

/// Distinct colors in table order; RTF index is position + 1
#[derive(Debug, Default)]
pub struct ColorTable {
    colors: IndexSet<Color>,
}

impl ColorTable {
    /// Collect theme defaults, then every segment color in document order
    pub fn from_model(model: &CodeModel) -> Self {
        let mut colors = IndexSet::new();
        colors.insert(model.theme().fg);
        colors.insert(model.theme().bg);
        for segment in model.segments() {
            colors.insert(segment.style.fg);
            colors.insert(segment.style.bg);
        }
        Self { colors }
    }

    /// 1-based RTF index of a color in the table
    pub fn index_of(&self, color: Color) -> usize {
        self.colors.get_index_of(&color).map_or(0, |i| i + 1)
    }

    /// Number of distinct colors (excluding the auto slot)
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    fn write(&self, out: &mut String) {
        out.push_str("{\\colortbl;");
        for color in &self.colors {
            let _ = write!(out, "\\red{}\\green{}\\blue{};", color.r, color.g, color.b);
        }
        out.push_str("}\n");
    }
}

/// Emit the model as an RTF document
pub fn emit(model: &CodeModel) -> String {
    let font = model.font();
    let colors = ColorTable::from_model(model);
    let half_points = (px_to_pt(font.size) * 2.0).round() as i64;

    let mut out = String::from("{\\rtf1\\ansi\\ansicpg1252\\deff0\\deflang1033\n");
    write_font_table(&mut out, font);
    colors.write(&mut out);

    let margin = pt_to_twip(PAGE_MARGIN_PT);
    let _ = write!(
        out,
        "\\margl{margin}\\margr{margin}\\viewkind4\\uc1\\pard\\sl{}\\slmult0\\f0\\fs{half_points}\\cf{}\n",
        px_to_twip(font.size * font.line_height),
        colors.index_of(model.theme().fg),
    );

    for (i, line) in model.lines().iter().enumerate() {
        if i > 0 {
            out.push_str("\\line\n");
        }
        for segment in &line.segments {
            write_segment(&mut out, segment, &colors, half_points);
        }
    }
    out.push_str("\\par\n}");
    out
}

fn write_font_table(out: &mut String, font: &FontSettings) {
    out.push_str("{\\fonttbl");
    for (bold, italic) in [(false, false), (false, true), (true, false), (true, true)] {
        let face = font.fonts.face(bold, italic);
        let _ = write!(
            out,
            "{{\\f{}\\fmodern\\fcharset0 {};}}",
            font_slot(bold, italic),
            escape_text(&face.name)
        );
    }
    out.push_str("}\n");
}

fn write_segment(out: &mut String, segment: &Segment, colors: &ColorTable, half_points: i64) {
    let style = &segment.style;
    let _ = write!(
        out,
        "{{\\f{}\\fs{half_points}\\cf{}\\highlight{}",
        font_slot(style.bold, style.italic),
        colors.index_of(style.fg),
        colors.index_of(style.bg),
    );
    if style.bold {
        out.push_str("\\b");
    }
    if style.italic {
        out.push_str("\\i");
    }
    if style.underline {
        out.push_str("\\ul");
    }
    out.push(' ');
    out.push_str(&escape_text(&segment.text));
    if style.underline {
        out.push_str("\\ulnone");
    }
    if style.italic {
        out.push_str("\\i0");
    }
    if style.bold {
        out.push_str("\\b0");
    }
    out.push('}');
}

/// Escape text for RTF: control characters first, then non-ASCII as `\uN?`
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '\t' => escaped.push_str("\\tab "),
            c if c.is_ascii() => escaped.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // \u takes a signed 16-bit value
                    let _ = write!(escaped, "\\u{}?", *unit as i16);
                }
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FontFace, FontSlots, Line, Theme};
    use crate::syntax::Style;

    const RED: Color = Color::rgb(0xff, 0, 0);
    const GREEN: Color = Color::rgb(0, 0xff, 0);

    fn model(lines: Vec<Line>) -> CodeModel {
        CodeModel::new(lines, Theme::new(Color::WHITE, Color::BLACK), FontSettings::default())
    }

    fn indices(rtf: &str, word: &str) -> Vec<usize> {
        rtf.match_indices(word)
            .map(|(i, _)| {
                let digits: String = rtf[i + word.len()..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse().unwrap()
            })
            .collect()
    }

    fn color_table_entries(rtf: &str) -> usize {
        let start = rtf.find("{\\colortbl").unwrap();
        let end = start + rtf[start..].find('}').unwrap();
        rtf[start..end].matches(';').count()
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(pt_to_twip(12.0), 240);
        assert_eq!(px_to_twip(16.0), 240);
        assert_eq!(px_to_pt(16.0), 12.0);
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text(r"a\b{c}"), r"a\\b\{c\}");
        assert_eq!(escape_text("é"), "\\u233?");
        assert_eq!(escape_text("😀"), "\\u-10179?\\u-8704?");
        assert_eq!(escape_text("\tx"), "\\tab x");
    }

    #[test]
    fn test_color_table_bounds() {
        let line = Line::new(vec![
            Segment::new("a", Style::new(RED, Color::BLACK), "A"),
            Segment::new("b", Style::new(GREEN, RED).with_bold(), "B"),
            Segment::new("c", Style::new(Color::WHITE, Color::BLACK), "C"),
        ]);
        let m = model(vec![line]);
        let table = ColorTable::from_model(&m);
        assert_eq!(table.len(), 4);

        let rtf = emit(&m);
        assert_eq!(color_table_entries(&rtf), table.len() + 1);
        for index in indices(&rtf, "\\cf").into_iter().chain(indices(&rtf, "\\highlight")) {
            assert!((1..=table.len()).contains(&index), "index {index} out of range");
        }
    }

    #[test]
    fn test_theme_colors_first() {
        let m = model(Vec::new());
        let table = ColorTable::from_model(&m);
        assert_eq!(table.index_of(Color::WHITE), 1);
        assert_eq!(table.index_of(Color::BLACK), 2);
        assert_eq!(table.index_of(RED), 0);
    }

    #[test]
    fn test_font_table_four_slots() {
        let mut font = FontSettings::default();
        font.fonts = FontSlots {
            default: FontFace::named("Mono"),
            bold: Some(FontFace::named("Mono Bold")),
            italic: Some(FontFace::named("Mono Italic")),
            bold_italic: None,
        };
        let m = CodeModel::new(Vec::new(), Theme::default(), font);
        let rtf = emit(&m);
        assert!(rtf.contains(
            "{\\fonttbl{\\f0\\fmodern\\fcharset0 Mono;}{\\f1\\fmodern\\fcharset0 Mono Italic;}\
             {\\f2\\fmodern\\fcharset0 Mono Bold;}{\\f3\\fmodern\\fcharset0 Mono;}}"
        ));
    }

    #[test]
    fn test_segment_selects_font_and_resets() {
        let style = Style::new(RED, Color::BLACK).with_bold().with_underline();
        let m = model(vec![Line::new(vec![Segment::new("fn", style, "Keyword")])]);
        let rtf = emit(&m);
        assert!(rtf.contains("{\\f2\\fs21\\cf3\\highlight2\\b\\ul fn\\ulnone\\b0}"));
    }

    #[test]
    fn test_lines_and_document_end() {
        let a = Line::new(vec![Segment::new("a", Style::new(Color::WHITE, Color::BLACK), "N")]);
        let m = model(vec![a.clone(), Line::default(), a]);
        let rtf = emit(&m);
        assert_eq!(rtf.matches("\\line").count(), 2);
        assert!(rtf.ends_with("\\par\n}"));
    }

    #[test]
    fn test_empty_model() {
        let rtf = emit(&model(Vec::new()));
        assert!(rtf.starts_with("{\\rtf1"));
        assert!(!rtf.contains("\\line"));
        assert_eq!(color_table_entries(&rtf), 3);
        assert!(rtf.ends_with("\\par\n}"));
    }

    #[test]
    fn test_line_spacing_and_size() {
        let rtf = emit(&model(Vec::new()));
        // 14px at 1.5 line height: 21px = 315 twips, 10.5pt = 21 half-points
        assert!(rtf.contains("\\sl315\\slmult0\\f0\\fs21"));
        assert!(rtf.contains("\\margl720\\margr720"));
    }
}
