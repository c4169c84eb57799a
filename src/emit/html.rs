//! HTML fragment emitter
//!
//! One block per line, one span per segment. Colors and flags are written
//! to the `style` attribute; bold, italic and underline are additionally
//! wrapped in `<b>`, `<i>`, `<u>`, always in that order.

use std::fmt::Write;

use crate::model::{CodeModel, Segment};

/// Placeholder content for empty and whitespace-only lines
pub const BLANK_LINE: &str = "&nbsp;";

/// HTML emission switches
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlOptions {
    /// Escape `{` and `}` for fragments spliced into another template pass
    pub escape_braces: bool,
}

/// Emit the model as an HTML fragment
pub fn emit(model: &CodeModel) -> String {
    emit_with(model, HtmlOptions::default())
}

/// Emit the model as an HTML fragment with explicit options
pub fn emit_with(model: &CodeModel, options: HtmlOptions) -> String {
    let mut out = String::from("<div class=\"code\">");
    for line in model.lines() {
        out.push_str("<div class=\"line\">");
        if line.is_blank() {
            out.push_str(BLANK_LINE);
        } else {
            for segment in &line.segments {
                write_segment(&mut out, segment, options);
            }
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

fn write_segment(out: &mut String, segment: &Segment, options: HtmlOptions) {
    let style = &segment.style;
    let _ = write!(out, "<span style=\"color:{};background-color:{}", style.fg, style.bg);
    if style.bold {
        out.push_str(";font-weight:bold");
    }
    if style.italic {
        out.push_str(";font-style:italic");
    }
    if style.underline {
        out.push_str(";text-decoration:underline");
    }
    let _ = write!(out, "\" data-style=\"{}\">", escape_attribute(&segment.style_name));

    let mut text = escape_text(&segment.text, options.escape_braces);
    if style.underline {
        text = format!("<u>{text}</u>");
    }
    if style.italic {
        text = format!("<i>{text}</i>");
    }
    if style.bold {
        text = format!("<b>{text}</b>");
    }
    out.push_str(&text);
    out.push_str("</span>");
}

/// Escape text content
pub fn escape_text(text: &str, escape_braces: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '{' if escape_braces => escaped.push_str("&#123;"),
            '}' if escape_braces => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    escape_text(value, false).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{FontSettings, Line, Theme};
    use crate::syntax::{Color, Style};

    const RED: Color = Color::rgb(0xff, 0, 0);

    fn model(lines: Vec<Line>) -> CodeModel {
        CodeModel::new(lines, Theme::new(Color::WHITE, Color::BLACK), FontSettings::default())
    }

    /// Read fg, bg and flags back out of a span's style attribute
    fn parse_style(attr: &str) -> Style {
        let mut style = Style::default();
        for decl in attr.split(';') {
            match decl.split_once(':') {
                Some(("color", v)) => style.fg = v.parse().unwrap(),
                Some(("background-color", v)) => style.bg = v.parse().unwrap(),
                Some(("font-weight", "bold")) => style.bold = true,
                Some(("font-style", "italic")) => style.italic = true,
                Some(("text-decoration", "underline")) => style.underline = true,
                other => panic!("unexpected declaration {other:?}"),
            }
        }
        style
    }

    #[test]
    fn test_single_span() {
        let line = Line::new(vec![Segment::new("let", Style::new(RED, Color::BLACK), "Keyword")]);
        assert_eq!(
            emit(&model(vec![line])),
            "<div class=\"code\"><div class=\"line\">\
             <span style=\"color:#ff0000;background-color:#000000\" data-style=\"Keyword\">let</span>\
             </div></div>"
        );
    }

    #[test]
    fn test_flag_wrapping_order() {
        let style = Style::new(RED, Color::BLACK).with_underline().with_italic().with_bold();
        let line = Line::new(vec![Segment::new("x", style, "All")]);
        let html = emit(&model(vec![line]));
        assert!(html.contains(">\
            <b><i><u>x</u></i></b></span>"));
    }

    #[test]
    fn test_text_escaped_before_wrapping() {
        let style = Style::new(RED, Color::BLACK).with_bold();
        let line = Line::new(vec![Segment::new("a<b> && {c}", style, "X\"Y")]);
        let html = emit(&model(vec![line.clone()]));
        assert!(html.contains("<b>a&lt;b&gt; &amp;&amp; {c}</b>"));
        assert!(html.contains("data-style=\"X&quot;Y\""));

        let braces = emit_with(&model(vec![line]), HtmlOptions { escape_braces: true });
        assert!(braces.contains("&#123;c&#125;"));
    }

    #[test]
    fn test_blank_lines_keep_a_row() {
        let ws = Line::new(vec![Segment::new("   ", Style::default(), "Normal")]);
        let html = emit(&model(vec![Line::default(), ws]));
        assert_eq!(
            html,
            "<div class=\"code\"><div class=\"line\">&nbsp;</div><div class=\"line\">&nbsp;</div></div>"
        );
    }

    #[test]
    fn test_no_separator_between_lines() {
        let a = Line::new(vec![Segment::new("a", Style::default(), "N")]);
        let b = Line::new(vec![Segment::new("b", Style::default(), "N")]);
        let html = emit(&model(vec![a, b]));
        assert!(html.contains("</div><div class=\"line\">"));
        assert!(!html.contains('\n'));
    }

    #[test]
    fn test_empty_model() {
        assert_eq!(emit(&model(Vec::new())), "<div class=\"code\"></div>");
    }

    #[test]
    fn test_style_attribute_round_trip() {
        let styles = [
            Style::new(RED, Color::BLACK),
            Style::new(Color::WHITE, RED).with_bold(),
            Style::new(Color::rgb(1, 2, 3), Color::rgb(4, 5, 6)).with_italic().with_underline(),
        ];
        let line = Line::new(
            styles
                .iter()
                .enumerate()
                .map(|(i, s)| Segment::new(format!("s{i}"), *s, "N"))
                .collect(),
        );
        let html = emit(&model(vec![line]));

        let parsed: Vec<Style> = html
            .split("<span style=\"")
            .skip(1)
            .map(|rest| parse_style(&rest[..rest.find('"').unwrap()]))
            .collect();
        assert_eq!(parsed, styles);
    }
}
