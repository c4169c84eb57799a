//! Request handling on the exporter side
//!
//! Dispatches a request to its emitter, writes the result to disk and
//! optionally places copies on the clipboard. The output file is written
//! in one atomic step; a failed request leaves nothing behind and touches
//! no clipboard.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardPayload, ClipboardSink};
use crate::config::Config;
use crate::emit::html::{self, HtmlOptions};
use crate::emit::image::{self, ImageOptions};
use crate::emit::page::{self, PageOptions};
use crate::emit::rtf;
use crate::error::{ExportError, Result};
use crate::model::CodeModel;
use crate::protocol::{Request, RequestType, ResponseData};
use crate::render::Rasterizer;

/// Timestamp substituted for `%t` in filename patterns
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Handles export requests against one configuration, renderer and clipboard
pub struct Exporter<'a> {
    config: &'a Config,
    rasterizer: &'a dyn Rasterizer,
    clipboard: &'a mut dyn ClipboardSink,
}

impl<'a> Exporter<'a> {
    pub fn new(
        config: &'a Config,
        rasterizer: &'a dyn Rasterizer,
        clipboard: &'a mut dyn ClipboardSink,
    ) -> Self {
        Self {
            config,
            rasterizer,
            clipboard,
        }
    }

    /// Run one request to completion
    pub async fn export(&mut self, request: Request) -> Result<ResponseData> {
        let model = request.to_model();
        let template = load_template(request.template_filepath.as_deref())?;
        debug!(kind = %request.kind, lines = model.lines().len(), "exporting");

        let bytes = match request.kind {
            RequestType::Image => {
                let options = ImageOptions {
                    padding: self.config.image.padding,
                    safety_margin: self.config.image.safety_margin,
                    min_width: request.min_width_px(),
                    transparent: request.transparent,
                    template,
                    data: request.additional_template_data.clone(),
                    html: self.html_options(),
                };
                image::emit(&model, self.rasterizer, &options).await?
            }
            RequestType::Html => {
                let fragment = html::emit_with(&model, self.html_options());
                let options = PageOptions {
                    min_width: request.min_width_px(),
                    padding: self.config.image.padding,
                    transparent: request.transparent,
                    template,
                    data: request.additional_template_data.clone(),
                };
                page::render(&model, &fragment, &options)?.into_bytes()
            }
            RequestType::Rtf => rtf::emit(&model).into_bytes(),
        };

        let path = output_path(&request, self.config, Local::now())?;
        write_atomic(&path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "export written");

        let clipboard_error = self.copy_to_clipboard(&request, &model, &bytes);
        Ok(ResponseData {
            request,
            filepath: path,
            clipboard_error,
        })
    }

    fn html_options(&self) -> HtmlOptions {
        HtmlOptions {
            escape_braces: self.config.html.escape_braces,
        }
    }

    /// Copy every requested format; failures are collected, never raised
    fn copy_to_clipboard(&mut self, request: &Request, model: &CodeModel, output: &[u8]) -> Option<String> {
        let targets = request.to_clipboard;
        if !targets.any() {
            return None;
        }
        let mut payloads = Vec::new();
        if targets.image {
            if request.kind == RequestType::Image {
                payloads.push(ClipboardPayload::Png(output.to_vec()));
            } else {
                debug!(kind = %request.kind, "image clipboard needs an image request; skipped");
            }
        }
        if targets.html {
            payloads.push(ClipboardPayload::Html {
                html: html::emit_with(model, self.html_options()),
                alt_text: model.plain_text(),
            });
        }
        if targets.rtf {
            payloads.push(ClipboardPayload::Rtf(rtf::emit(model)));
        }

        let errors: Vec<String> = payloads
            .iter()
            .filter_map(|payload| match self.clipboard.copy(payload) {
                Ok(()) => {
                    debug!(mime = payload.mime(), "copied to clipboard");
                    None
                }
                Err(err) => {
                    warn!(mime = payload.mime(), "{err}");
                    Some(err.to_string())
                }
            })
            .collect();

        if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        }
    }
}

/// Read a replacement page template
fn load_template(path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    fs::read_to_string(path).map(Some).map_err(|e| {
        ExportError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot read template {}: {e}", path.display()),
        ))
    })
}

/// Where the output of `request` goes
///
/// An explicit `filename` wins over the pattern; the extension for the
/// request type is appended unless already present.
pub fn output_path(request: &Request, config: &Config, now: DateTime<Local>) -> Result<PathBuf> {
    let dir = request.output_dir.clone().unwrap_or_else(|| config.output_dir());
    let name = match &request.filename {
        Some(name) if !name.trim().is_empty() => name.clone(),
        _ => {
            let pattern = request
                .filename_pattern
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(&config.output.filename_pattern);
            pattern.replace("%t", &now.format(TIMESTAMP_FORMAT).to_string())
        }
    };

    let file = Path::new(&name);
    if file.file_name().map(|f| f != file.as_os_str()).unwrap_or(true) {
        return Err(ExportError::MalformedInput(format!(
            "output filename {name:?} must be a plain file name"
        )));
    }

    let extension = request.kind.extension();
    let name = if file.extension().is_some_and(|e| e.eq_ignore_ascii_case(extension)) {
        name
    } else {
        format!("{name}.{extension}")
    };
    Ok(dir.join(name))
}

/// Write `bytes` to `path` through a temp file in the same directory
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| ExportError::Io(e.error))?;
    Ok(())
}
