//! Configuration file support
//!
//! Loads settings from `$SNAPCODE_CONFIG`, or `~/.snapcode.toml`
//! (`%USERPROFILE%\.snapcode.toml` on Windows). Every key is optional and
//! request fields always win over the file.
//!
//! Example:
//! ```text
//! [renderer]
//! command = "snapcode-chromium"
//! timeout_secs = 20
//!
//! [output]
//! dir = "/home/me/Pictures"
//! filename_pattern = "code_%t"
//!
//! [image]
//! padding = 48
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ExportError, Result};

/// External renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Program that renders HTML pages to PNG
    pub command: String,
    /// Arguments placed before the page/output/width arguments
    pub args: Vec<String>,
    /// Deadline for one render, in seconds
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: "snapcode-render".to_string(),
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl RendererConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Output file settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for exported files; the system temp dir when unset
    pub dir: Option<PathBuf>,
    /// File name pattern; `%t` becomes a timestamp
    pub filename_pattern: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filename_pattern: "snapcode_%t".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub escape_braces: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Pixels added to the measured content box
    pub safety_margin: u32,
    /// Padding around the code, in pixels
    pub padding: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            safety_margin: 2,
            padding: 64,
        }
    }
}

/// Configuration settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub renderer: RendererConfig,
    pub output: OutputConfig,
    pub html: HtmlConfig,
    pub image: ImageConfig,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SNAPCODE_CONFIG") {
            return Some(PathBuf::from(path));
        }

        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".snapcode.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".snapcode.toml"))
        }
    }

    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Config::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    config
                }
                Err(err) => {
                    warn!(path = %path.display(), "{err}; using defaults");
                    Config::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(err) => {
                warn!(path = %path.display(), "cannot read config: {err}; using defaults");
                Config::default()
            }
        }
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(contents).map_err(|e| ExportError::Config(e.to_string()))?;
        config.normalize();
        Ok(config)
    }

    /// Clamp values into their supported ranges
    fn normalize(&mut self) {
        self.renderer.timeout_secs = self.renderer.timeout_secs.clamp(1, 600);
        if self.output.filename_pattern.trim().is_empty() {
            self.output.filename_pattern = OutputConfig::default().filename_pattern;
        }
    }

    /// Directory exports go to when the request names none
    pub fn output_dir(&self) -> PathBuf {
        self.output.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
