//! Headless rendering boundary
//!
//! A `Rasterizer` turns a full HTML page into PNG bytes and reports the
//! content box it measured. `CommandRasterizer` delegates to an external
//! program run under a deadline:
//!
//! ```text
//! <command> [args...] <page.html> <out.png> <min_width>
//! ```
//!
//! The program writes the screenshot to `<out.png>` and prints
//! `{"width": W, "height": H}` (the measured box, CSS pixels) on stdout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::config::RendererConfig;
use crate::error::{ExportError, Result};

/// Content box size measured by the renderer, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBox {
    pub width: u32,
    pub height: u32,
}

/// A rendered page
#[derive(Debug, Clone)]
pub struct Raster {
    /// PNG screenshot of the page
    pub png: Vec<u8>,
    /// Box the content actually occupied
    pub measured: ContentBox,
}

/// Turns HTML pages into rasters
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render `page`; `min_width` is a layout hint only
    async fn rasterize(&self, page: &str, min_width: u32) -> Result<Raster>;
}

/// Rasterizer backed by an external program
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(&config.command, config.args.clone(), config.timeout())
    }
}

/// Largest accepted side of a measured box, in CSS pixels
pub const MAX_MEASURED_SIDE: u32 = 16384;

/// Parse the measurement line printed by the renderer
fn parse_measurement(stdout: &[u8]) -> Result<ContentBox> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| ExportError::renderer("renderer printed no measurement"))?;
    let measured: ContentBox = serde_json::from_str(line.trim())
        .map_err(|e| ExportError::renderer(format!("invalid measurement {line:?}: {e}")))?;
    if measured.width == 0 || measured.height == 0 {
        return Err(ExportError::renderer(format!(
            "renderer measured an empty box ({}x{})",
            measured.width, measured.height
        )));
    }
    if measured.width > MAX_MEASURED_SIDE || measured.height > MAX_MEASURED_SIDE {
        return Err(ExportError::renderer(format!(
            "renderer measured {}x{}, larger than {MAX_MEASURED_SIDE}px per side",
            measured.width, measured.height
        )));
    }
    Ok(measured)
}

#[async_trait]
impl Rasterizer for CommandRasterizer {
    async fn rasterize(&self, page: &str, min_width: u32) -> Result<Raster> {
        let program = which::which(&self.program).map_err(|e| {
            ExportError::renderer(format!("renderer {} not found: {e}", self.program.display()))
        })?;

        // Removed on drop, including on timeout.
        let workdir = tempfile::tempdir()?;
        let page_path = workdir.path().join("page.html");
        let png_path = workdir.path().join("snapshot.png");
        std::fs::write(&page_path, page)?;

        debug!(program = %program.display(), min_width, "starting renderer");
        let child = Command::new(&program)
            .args(&self.args)
            .arg(&page_path)
            .arg(&png_path)
            .arg(min_width.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(ExportError::RenderTimeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(ExportError::Renderer {
                message: format!("{} exited with {}", program.display(), output.status),
                stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            });
        }

        let measured = parse_measurement(&output.stdout)?;
        let png = std::fs::read(&png_path)?;
        debug!(width = measured.width, height = measured.height, bytes = png.len(), "page rendered");
        Ok(Raster { png, measured })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measurement_last_line() {
        let measured = parse_measurement(b"loading fonts\n{\"width\": 640, \"height\": 220}\n\n").unwrap();
        assert_eq!(measured, ContentBox { width: 640, height: 220 });
    }

    #[test]
    fn test_parse_measurement_rejects_garbage() {
        assert!(parse_measurement(b"").is_err());
        assert!(parse_measurement(b"done").is_err());
        assert!(parse_measurement(b"{\"width\": 0, \"height\": 10}").is_err());
    }

    #[test]
    fn test_parse_measurement_rejects_oversized_box() {
        let err = parse_measurement(b"{\"width\": 100000, \"height\": 100000}").unwrap_err();
        assert!(matches!(err, ExportError::Renderer { .. }));
        assert!(parse_measurement(b"{\"width\": 16384, \"height\": 16384}").is_ok());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let rasterizer = CommandRasterizer::new(
            "snapcode-no-such-renderer",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = rasterizer.rasterize("<html></html>", 100).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_fails_request() {
        let rasterizer = CommandRasterizer::new(
            "sh",
            vec!["-c".to_string(), "sleep 5".to_string()],
            Duration::from_millis(100),
        );
        let err = rasterizer.rasterize("<html></html>", 100).await.unwrap_err();
        assert!(matches!(err, ExportError::RenderTimeout(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_keeps_stderr() {
        let rasterizer = CommandRasterizer::new(
            "sh",
            vec!["-c".to_string(), "echo broken >&2; exit 3".to_string()],
            Duration::from_secs(5),
        );
        let err = rasterizer.rasterize("<html></html>", 100).await.unwrap_err();
        assert_eq!(err.context().unwrap()["stderr"], "broken\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_protocol() {
        // $1 page, $2 png, $3 min width
        let script = r#"test -f "$1" && printf 'png' > "$2" && echo "{\"width\": $3, \"height\": 40}""#;
        let rasterizer = CommandRasterizer::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "render".to_string()],
            Duration::from_secs(5),
        );
        let raster = rasterizer.rasterize("<html></html>", 321).await.unwrap();
        assert_eq!(raster.png, b"png");
        assert_eq!(raster.measured, ContentBox { width: 321, height: 40 });
    }
}
