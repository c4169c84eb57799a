//! PNG emitter
//!
//! Emits the HTML fragment, wraps it in the page template and hands the
//! page to a `Rasterizer`. The width passed along is only a hint against
//! early wrapping; the final image is sized from the box the renderer
//! measured, plus a safety margin.

use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::Value;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::model::CodeModel;
use crate::render::{Raster, Rasterizer};

use super::html::{self, HtmlOptions};
use super::page::{self, PageOptions};

/// Average monospace glyph advance, in em
pub const CHAR_WIDTH_EM: f64 = 0.6;

/// Image emission settings
#[derive(Debug, Clone)]
pub struct ImageOptions {
    /// Padding around the code, in CSS pixels (applied on every side)
    pub padding: u32,
    /// Extra pixels added to the measured box
    pub safety_margin: u32,
    /// Lower bound for the width hint
    pub min_width: u32,
    pub transparent: bool,
    pub template: Option<String>,
    pub data: Option<Value>,
    /// Fragment options, shared with HTML exports
    pub html: HtmlOptions,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            padding: 64,
            safety_margin: 2,
            min_width: 0,
            transparent: false,
            template: None,
            data: None,
            html: HtmlOptions::default(),
        }
    }
}

/// Minimum width hint: longest line's characters at the average glyph advance, plus padding
pub fn width_hint(model: &CodeModel, padding: u32) -> u32 {
    let chars = model.longest_line_chars() as f64;
    let text_width = (chars * model.font().size * CHAR_WIDTH_EM).ceil() as u32;
    text_width.saturating_add(padding.saturating_mul(2))
}

/// Render the model to PNG bytes
pub async fn emit(model: &CodeModel, rasterizer: &dyn Rasterizer, options: &ImageOptions) -> Result<Vec<u8>> {
    let fragment = html::emit_with(model, options.html);
    let min_width = width_hint(model, options.padding).max(options.min_width);

    let page = page::render(
        model,
        &fragment,
        &PageOptions {
            min_width,
            padding: options.padding,
            transparent: options.transparent,
            template: options.template.clone(),
            data: options.data.clone(),
        },
    )?;

    let raster = rasterizer.rasterize(&page, min_width).await?;
    let background = if options.transparent {
        Rgba([0, 0, 0, 0])
    } else {
        let bg = model.theme().bg;
        Rgba([bg.r, bg.g, bg.b, 0xff])
    };
    let image = fit_to_measured(&raster, options.safety_margin, background)?;
    debug!(hint = min_width, width = image.width(), height = image.height(), "image composed");
    encode_png(image)
}

/// Place the screenshot on a canvas of exactly the measured box plus margin
pub fn fit_to_measured(raster: &Raster, margin: u32, background: Rgba<u8>) -> Result<RgbaImage> {
    let measured = raster.measured;
    let (Some(width), Some(height)) = (
        measured.width.checked_add(margin),
        measured.height.checked_add(margin),
    ) else {
        return Err(ExportError::renderer(format!(
            "measured box {}x{} plus margin {margin} is too large",
            measured.width, measured.height
        )));
    };

    let screenshot = image::load_from_memory(&raster.png)?.to_rgba8();

    let mut canvas = RgbaImage::from_pixel(width, height, background);
    let visible = imageops::crop_imm(&screenshot, 0, 0, width, height).to_image();
    imageops::replace(&mut canvas, &visible, 0, 0);
    Ok(canvas)
}

fn encode_png(image: RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
