//! The JSON payload describing one document to render.
//!
//! Callers send a single JSON object. Only five fields are read; everything else the caller
//! includes is ignored:
//!
//! ```json
//! { "topic": "Photosynthesis", "subject": "Biology", "level": "Grade 8",
//!   "content": "# Overview\n...", "id": "abc" }
//! ```

use crate::RenderError;
use serde::Deserialize;

pub const DEFAULT_TOPIC: &str = "Assignment";
pub const DEFAULT_ID: &str = "temp";

/// Output artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Structured word-processor document.
    Docx,
    /// Paginated print document.
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" | "word" => Ok(OutputFormat::Docx),
            other => Err(RenderError::PayloadError {
                message: format!("unknown output format '{}'", other),
                suggestion: Some("Use 'pdf' or 'docx'".to_string()),
            }),
        }
    }
}

/// Decoded request. Every field is optional; accessors apply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub topic: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
    pub content: Option<String>,
    pub id: Option<String>,
}

impl Payload {
    /// Decodes a payload from JSON text.
    pub fn from_json(input: &str) -> Result<Self, RenderError> {
        serde_json::from_str(input).map_err(|e| RenderError::PayloadError {
            message: e.to_string(),
            suggestion: Some(
                "Send a single JSON object with optional topic, subject, level, content and id fields"
                    .to_string(),
            ),
        })
    }

    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// The id used in the output filename.
    ///
    /// Characters other than ASCII letters, digits, `-` and `_` become `_`, so the name always
    /// stays inside the output directory. A missing or empty id becomes `temp`.
    pub fn file_id(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect(),
            _ => DEFAULT_ID.to_string(),
        }
    }

    /// `generated_<id>.<ext>`
    pub fn output_filename(&self, format: OutputFormat) -> String {
        format!("generated_{}.{}", self.file_id(), format.extension())
    }
}
