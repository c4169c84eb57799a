//! Clipboard output
//!
//! Provides clipboard access with fallbacks:
//! 1. A clipboard tool that accepts a mime type (`wl-copy`, `xclip`, `pbcopy` for RTF)
//! 2. System clipboard via `arboard` (images and HTML only)
//!
//! Clipboard failures never fail an export; the caller reports them.

use std::borrow::Cow;
use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

pub const MIME_PNG: &str = "image/png";
pub const MIME_HTML: &str = "text/html";
pub const MIME_RTF: &str = "text/rtf";

/// Clipboard operation errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No tool or system clipboard can take this format
    #[error("no clipboard tool available for {0}")]
    Unavailable(&'static str),
    /// A clipboard was found but writing to it failed
    #[error("clipboard write failed: {0}")]
    Failed(String),
}

/// One thing to put on the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardPayload {
    Png(Vec<u8>),
    Html { html: String, alt_text: String },
    Rtf(String),
}

impl ClipboardPayload {
    pub fn mime(&self) -> &'static str {
        match self {
            ClipboardPayload::Png(_) => MIME_PNG,
            ClipboardPayload::Html { .. } => MIME_HTML,
            ClipboardPayload::Rtf(_) => MIME_RTF,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            ClipboardPayload::Png(bytes) => bytes,
            ClipboardPayload::Html { html, .. } => html.as_bytes(),
            ClipboardPayload::Rtf(rtf) => rtf.as_bytes(),
        }
    }
}

/// Accepts clipboard payloads
pub trait ClipboardSink {
    fn copy(&mut self, payload: &ClipboardPayload) -> Result<(), ClipboardError>;
}

/// Command line clipboard tools, tried in order
fn tools_for(mime: &'static str) -> Vec<(&'static str, Vec<&'static str>)> {
    let mut tools = vec![
        ("wl-copy", vec!["--type", mime]),
        ("xclip", vec!["-selection", "clipboard", "-t", mime]),
    ];
    if mime == MIME_RTF {
        tools.push(("pbcopy", vec!["-Prefer", "rtf"]));
    }
    tools
}

/// The desktop clipboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Pipe bytes into the first available clipboard tool
    fn copy_with_tool(mime: &'static str, bytes: &[u8]) -> Result<(), ClipboardError> {
        let Some((program, args)) = tools_for(mime)
            .into_iter()
            .find_map(|(tool, args)| which::which(tool).ok().map(|path| (path, args)))
        else {
            return Err(ClipboardError::Unavailable(mime));
        };

        debug!(program = %program.display(), mime, "copying with clipboard tool");
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ClipboardError::Failed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(bytes)
                .map_err(|e| ClipboardError::Failed(e.to_string()))?;
        }
        let status = child.wait().map_err(|e| ClipboardError::Failed(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Failed(format!("{} exited with {status}", program.display())))
        }
    }

    /// Copy using the system clipboard
    fn copy_system(payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|_| ClipboardError::Unavailable(payload.mime()))?;

        match payload {
            ClipboardPayload::Png(png) => {
                let image = image::load_from_memory(png)
                    .map_err(|e| ClipboardError::Failed(e.to_string()))?
                    .to_rgba8();
                let data = arboard::ImageData {
                    width: image.width() as usize,
                    height: image.height() as usize,
                    bytes: Cow::Owned(image.into_raw()),
                };
                clipboard
                    .set_image(data)
                    .map_err(|e| ClipboardError::Failed(e.to_string()))
            }
            ClipboardPayload::Html { html, alt_text } => clipboard
                .set_html(html.as_str(), Some(alt_text.as_str()))
                .map_err(|e| ClipboardError::Failed(e.to_string())),
            ClipboardPayload::Rtf(_) => Err(ClipboardError::Unavailable(MIME_RTF)),
        }
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        match Self::copy_with_tool(payload.mime(), payload.bytes()) {
            Err(ClipboardError::Unavailable(_)) => Self::copy_system(payload),
            result => result,
        }
    }
}
