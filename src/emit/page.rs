//! Full-page HTML around an emitted fragment
//!
//! The page is what the headless renderer loads and what `html` exports
//! write to disk. Custom font files are embedded as data URIs; a font that
//! cannot be read falls back to its family name.

use std::path::{Path, PathBuf};

use base64::Engine;
use minijinja::{context, Environment};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{CodeModel, FontFace, FontSettings};

/// Built-in page template
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/page.html");

/// Family name embedded fonts are registered under
const EMBEDDED_FAMILY: &str = "snapcode-embedded";

/// A custom font file that could not be used
#[derive(Debug, Error)]
pub enum FontError {
    #[error("cannot read font file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Page-level layout switches
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Minimum width of the snapshot box, in CSS pixels
    pub min_width: u32,
    /// Padding around the code, in CSS pixels
    pub padding: u32,
    /// Leave the background transparent
    pub transparent: bool,
    /// Replacement template source
    pub template: Option<String>,
    /// Extra values exposed to the template as `data`
    pub data: Option<Value>,
}

/// CSS for embedded fonts plus the `font-family` value to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontCss {
    pub faces: String,
    pub family: String,
}

fn font_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("otf") => "font/otf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "font/ttf",
    }
}

/// Read a font file into a `data:` URI
pub fn font_data_uri(path: &Path) -> std::result::Result<String, FontError> {
    let bytes = std::fs::read(path).map_err(|source| FontError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", font_mime(path), encoded))
}

fn embed_face(face: &FontFace, weight: &str, style: &str) -> Option<String> {
    let path = face.file.as_deref()?;
    match font_data_uri(path) {
        Ok(uri) => Some(format!(
            "@font-face {{ font-family: \"{EMBEDDED_FAMILY}\"; src: url({uri}); font-weight: {weight}; font-style: {style}; }}\n"
        )),
        Err(err) => {
            warn!("{err}; using font name {:?}", face.name);
            None
        }
    }
}

/// Build `@font-face` rules for every slot that has a readable file
///
/// Bold and italic files are only embedded when the regular face is, so a
/// lone bold file never stands in for regular text.
pub fn font_css(font: &FontSettings) -> FontCss {
    let slots = &font.fonts;
    let fallback = format!("\"{}\", monospace", slots.default.name.replace('"', ""));

    let Some(regular) = embed_face(&slots.default, "normal", "normal") else {
        return FontCss {
            faces: String::new(),
            family: fallback,
        };
    };

    let mut faces = regular;
    let variants = [
        (slots.bold.as_ref(), "bold", "normal"),
        (slots.italic.as_ref(), "normal", "italic"),
        (slots.bold_italic.as_ref(), "bold", "italic"),
    ];
    for (face, weight, style) in variants {
        if let Some(css) = face.and_then(|f| embed_face(f, weight, style)) {
            faces.push_str(&css);
        }
    }
    debug!(bytes = faces.len(), "embedded font faces");

    FontCss {
        faces,
        family: format!("\"{EMBEDDED_FAMILY}\", {fallback}"),
    }
}

/// Render the page around `fragment`
pub fn render(model: &CodeModel, fragment: &str, options: &PageOptions) -> Result<String> {
    let fonts = font_css(model.font());
    let theme = model.theme();

    let mut env = Environment::new();
    env.add_template("page", options.template.as_deref().unwrap_or(DEFAULT_TEMPLATE))?;

    let page = env.get_template("page")?.render(context! {
        code => fragment,
        font_faces => fonts.faces,
        font_family => fonts.family,
        font_size => model.font().size.to_string(),
        line_height => model.font().line_height.to_string(),
        fg => theme.fg.to_string(),
        bg => theme.bg.to_string(),
        transparent => options.transparent,
        min_width => options.min_width,
        padding => options.padding,
        data => options.data,
    })?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use tempfile::Builder;

    use super::*;
    use crate::model::{FontSlots, Theme};
    use crate::syntax::Color;

    fn model_with(font: FontSettings) -> CodeModel {
        CodeModel::new(Vec::new(), Theme::new(Color::WHITE, Color::rgb(0x28, 0x2c, 0x34)), font)
    }

    #[test]
    fn test_named_font_without_file() {
        let css = font_css(&FontSettings::default());
        assert!(css.faces.is_empty());
        assert_eq!(css.family, "\"monospace\", monospace");
    }

    #[test]
    fn test_embeds_readable_font() {
        let mut file = Builder::new().suffix(".woff2").tempfile().unwrap();
        file.write_all(b"font-bytes").unwrap();

        let mut font = FontSettings::default();
        font.fonts = FontSlots {
            default: FontFace {
                name: "Fira Code".to_string(),
                file: Some(file.path().to_path_buf()),
            },
            ..FontSlots::default()
        };
        let css = font_css(&font);
        assert!(css.faces.contains("data:font/woff2;base64,Zm9udC1ieXRlcw=="));
        assert!(css.family.starts_with("\"snapcode-embedded\""));
        assert!(css.family.contains("\"Fira Code\""));
    }

    #[test]
    fn test_unreadable_font_falls_back_to_name() {
        let mut font = FontSettings::default();
        font.fonts.default = FontFace {
            name: "Iosevka".to_string(),
            file: Some(PathBuf::from("/nonexistent/iosevka.ttf")),
        };
        let css = font_css(&font);
        assert!(css.faces.is_empty());
        assert_eq!(css.family, "\"Iosevka\", monospace");
    }

    #[test]
    fn test_default_template_renders_variables() {
        let page = render(
            &model_with(FontSettings::default()),
            "<div class=\"code\"></div>",
            &PageOptions {
                min_width: 420,
                padding: 32,
                ..PageOptions::default()
            },
        )
        .unwrap();
        assert!(page.contains("<div id=\"snapshot\"><div class=\"code\"></div></div>"));
        assert!(page.contains("min-width: 420px;"));
        assert!(page.contains("background: #282c34;"));
        assert!(page.contains("font-size: 14px;"));
    }

    #[test]
    fn test_transparent_background() {
        let page = render(
            &model_with(FontSettings::default()),
            "",
            &PageOptions {
                transparent: true,
                ..PageOptions::default()
            },
        )
        .unwrap();
        assert!(page.contains("background: transparent;"));
        assert!(!page.contains("#282c34"));
    }

    #[test]
    fn test_custom_template_with_data() {
        let options = PageOptions {
            template: Some("<h1>{{ data.title }}</h1>{{ code }}".to_string()),
            data: Some(json!({ "title": "main.rs" })),
            ..PageOptions::default()
        };
        let page = render(&model_with(FontSettings::default()), "<pre>x</pre>", &options).unwrap();
        assert_eq!(page, "<h1>main.rs</h1><pre>x</pre>");
    }

    #[test]
    fn test_invalid_template_is_an_error() {
        let options = PageOptions {
            template: Some("{% if %}".to_string()),
            ..PageOptions::default()
        };
        assert!(render(&model_with(FontSettings::default()), "", &options).is_err());
    }
}
