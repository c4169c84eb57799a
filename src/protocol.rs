//! Request and response documents exchanged with the exporter process
//!
//! One JSON request goes in on stdin, one JSON response comes out on
//! stdout. Field names are camelCase on the wire.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ExportError, Result};
use crate::model::{CodeModel, FontSettings, Line, Theme};

/// Output format requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Image,
    Html,
    Rtf,
}

impl RequestType {
    pub fn name(self) -> &'static str {
        match self {
            RequestType::Image => "image",
            RequestType::Html => "html",
            RequestType::Rtf => "rtf",
        }
    }

    /// File extension of the written output
    pub fn extension(self) -> &'static str {
        match self {
            RequestType::Image => "png",
            RequestType::Html => "html",
            RequestType::Rtf => "rtf",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RequestType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(RequestType::Image),
            "html" => Ok(RequestType::Html),
            "rtf" => Ok(RequestType::Rtf),
            other => Err(ExportError::UnsupportedRequestType(other.to_string())),
        }
    }
}

/// Which formats to also place on the clipboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardTargets {
    pub image: bool,
    pub html: bool,
    pub rtf: bool,
}

impl ClipboardTargets {
    pub fn any(&self) -> bool {
        self.image || self.html || self.rtf
    }
}

/// An export request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(rename = "type")]
    pub kind: RequestType,
    pub theme: Theme,
    #[serde(default)]
    pub font_settings: FontSettings,
    pub code: Vec<Line>,
    /// Lower bound for the image width, CSS pixels
    #[serde(default)]
    pub min_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_pattern: Option<String>,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default)]
    pub to_clipboard: ClipboardTargets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_filepath: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_template_data: Option<Value>,
}

impl Request {
    /// A request carrying the given model and default options
    pub fn new(kind: RequestType, model: CodeModel) -> Self {
        let (code, theme, font_settings) = model.into_parts();
        Self {
            kind,
            theme,
            font_settings,
            code,
            min_width: 0.0,
            output_dir: None,
            filename: None,
            filename_pattern: None,
            transparent: false,
            to_clipboard: ClipboardTargets::default(),
            template_filepath: None,
            additional_template_data: None,
        }
    }

    /// Parse a request document
    ///
    /// `type` is checked first so an unknown format is reported by name
    /// rather than as a generic deserialization failure.
    pub fn parse(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        let Some(object) = value.as_object() else {
            return Err(ExportError::MalformedInput("request must be a JSON object".to_string()));
        };

        match object.get("type") {
            Some(Value::String(kind)) => {
                kind.parse::<RequestType>()?;
            }
            Some(_) => {
                return Err(ExportError::MalformedInput("field `type` must be a string".to_string()));
            }
            None => return Err(ExportError::MalformedInput("missing field `type`".to_string())),
        }

        serde_json::from_value(value).map_err(|e| ExportError::MalformedInput(e.to_string()))
    }

    /// The code model this request describes
    pub fn to_model(&self) -> CodeModel {
        CodeModel::new(self.code.clone(), self.theme, self.font_settings.clone())
    }

    /// `minWidth` as whole pixels
    pub fn min_width_px(&self) -> u32 {
        if self.min_width.is_finite() && self.min_width > 0.0 {
            self.min_width.ceil() as u32
        } else {
            0
        }
    }
}

/// Payload of a successful response: the request echoed back plus results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(flatten)]
    pub request: Request,
    pub filepath: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipboard_error: Option<String>,
}

/// The single response document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Response {
    pub fn success(data: ResponseData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    pub fn failure(error: &ExportError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            context: error.context(),
        }
    }

    /// Turn a received response back into a result; the error text is kept verbatim
    pub fn into_result(self) -> Result<ResponseData> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ExportError::MalformedInput(
                "successful response without data".to_string(),
            )),
            (false, _) => Err(ExportError::Remote(
                self.error.unwrap_or_else(|| "export failed without a message".to_string()),
            )),
        }
    }
}
