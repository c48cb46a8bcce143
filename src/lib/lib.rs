//! The assignment2doc library turns assignment content written in a small markdown subset into a
//! Word document or a paginated PDF.
//!
//! Content arrives inside a JSON payload together with a title (`topic`), optional `subject` and
//! `level` metadata and an `id` used to name the output file:
//!
//! ```rust
//! use assignment2doc::{config::LayoutStyle, OutputFormat, Payload};
//! use std::error::Error;
//!
//! fn example() -> Result<(), Box<dyn Error>> {
//!     let payload = Payload::from_json(
//!         r##"{"topic":"Photosynthesis","subject":"Biology","content":"# Overview\nPlants use **sunlight**."}"##,
//!     )?;
//!     let pdf = assignment2doc::render_into_bytes(&payload, OutputFormat::Pdf, &LayoutStyle::default())?;
//!     assert!(pdf.starts_with(b"%PDF-"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! Supported markup, one construct per line:
//!
//! ```text
//! # Heading 1 .. #### Heading 4
//! - bullet item
//! 1. numbered item
//! [IMAGE: description]      (suppressed, renders nothing)
//! text with **bold** and *italic* spans
//! ```
//!
//! ## Pipeline
//! ```text
//! +-----------+     +-----------------+     +------------------+     +----------------+
//! |  Payload  | --> | Line classifier | --> | Document (blocks | --> | DOCX renderer  |
//! |  (JSON)   |     | + inline spans  |     |  + styled runs)  |     | or PDF layout  |
//! +-----------+     +-----------------+     +------------------+     +----------------+
//!                                                                            |
//!                                                          generated_<id>.docx / .pdf
//! ```
//!
//! The two renderers deliberately differ in inline fidelity: the DOCX renderer writes one run per
//! styled span, while the PDF renderer draws each block in a single font chosen for the whole
//! line. List items are never scanned for inline emphasis by either renderer.

pub mod config;
mod debug;
pub mod docx;
pub mod fonts;
pub mod inline;
pub mod markdown;
pub mod payload;
pub mod pdf;
pub mod validation;

pub use inline::{tokenize_inline, StyledRun};
pub use markdown::{Block, Document};
pub use payload::{OutputFormat, Payload};

use config::LayoutStyle;
use log::{debug, info};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Errors that can occur while decoding, laying out or persisting a document.
/// Every variant is fatal for the current render.
#[derive(Debug)]
pub enum RenderError {
    /// The input payload could not be decoded
    PayloadError {
        message: String,
        suggestion: Option<String>,
    },
    /// Text measurement, encoding or PDF construction failed
    LayoutError {
        message: String,
        suggestion: Option<String>,
    },
    /// The DOCX package could not be assembled
    PackageError { message: String },
    /// The artifact could not be written
    IoError {
        message: String,
        path: String,
        suggestion: String,
    },
}

impl Error for RenderError {}
impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::PayloadError {
                message,
                suggestion,
            } => {
                write!(f, "Invalid payload: {}", message)?;
                if let Some(hint) = suggestion {
                    write!(f, "\nSuggestion: {}", hint)?;
                }
                Ok(())
            }
            RenderError::LayoutError {
                message,
                suggestion,
            } => {
                write!(f, "Layout error: {}", message)?;
                if let Some(hint) = suggestion {
                    write!(f, "\nSuggestion: {}", hint)?;
                }
                Ok(())
            }
            RenderError::PackageError { message } => {
                write!(f, "DOCX packaging error: {}", message)
            }
            RenderError::IoError {
                message,
                path,
                suggestion,
            } => {
                write!(f, "File error: {}", message)?;
                write!(f, "\nPath: {}", path)?;
                write!(f, "\nSuggestion: {}", suggestion)?;
                Ok(())
            }
        }
    }
}

impl RenderError {
    /// Creates a layout error with just a message
    pub fn layout_error(message: impl Into<String>) -> Self {
        RenderError::LayoutError {
            message: message.into(),
            suggestion: None,
        }
    }

    fn io_error(err: std::io::Error, path: &Path) -> Self {
        let suggestion = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                "Check that you have write permissions for this location"
            }
            std::io::ErrorKind::NotFound => "Make sure the output directory exists",
            _ => "Try a different output directory or check available disk space",
        };
        RenderError::IoError {
            message: err.to_string(),
            path: path.display().to_string(),
            suggestion: suggestion.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for RenderError {
    fn from(err: zip::result::ZipError) -> Self {
        RenderError::PackageError {
            message: err.to_string(),
        }
    }
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::LayoutError {
            message: err.to_string(),
            suggestion: Some("Try again with simpler content".to_string()),
        }
    }
}

/// Renders the payload into the bytes of the requested artifact.
///
/// Nothing is written to disk; the whole document is built in memory.
pub fn render_into_bytes(
    payload: &Payload,
    format: OutputFormat,
    style: &LayoutStyle,
) -> Result<Vec<u8>, RenderError> {
    let document = Document::parse(payload.content());
    debug!(
        "Classified {} line(s), {} visible block(s)",
        document.blocks().len(),
        document.visible_blocks().count()
    );
    if document.is_empty() {
        debug!("No content; rendering the title block only");
    }
    for (index, block) in document.blocks().iter().enumerate() {
        debug!("line {}: {}", index + 1, block.kind_name());
    }

    match format {
        OutputFormat::Docx => docx::DocxRenderer::new(payload, &document).render(),
        OutputFormat::Pdf => pdf::Pdf::new(payload, &document, style).render_to_bytes(),
    }
}

/// Renders the payload and saves it as `generated_<id>.<ext>` inside `output_dir`.
///
/// The artifact is first written under a temporary `.partial` name and then renamed, so a
/// failed render never leaves a file with the final name behind. Returns the artifact's file
/// name (relative to `output_dir`).
///
/// # Example
/// ```rust
/// use assignment2doc::{config::LayoutStyle, OutputFormat, Payload};
///
/// let dir = std::env::temp_dir();
/// let payload = Payload::from_json(r#"{"content":"Hello","id":"doc_example"}"#).unwrap();
/// let name = assignment2doc::render_into_file(&payload, OutputFormat::Docx, &LayoutStyle::default(), &dir).unwrap();
/// assert_eq!(name, "generated_doc_example.docx");
/// # std::fs::remove_file(dir.join(name)).unwrap();
/// ```
pub fn render_into_file(
    payload: &Payload,
    format: OutputFormat,
    style: &LayoutStyle,
    output_dir: &Path,
) -> Result<String, RenderError> {
    let bytes = render_into_bytes(payload, format, style)?;

    let filename = payload.output_filename(format);
    let final_path = output_dir.join(&filename);
    let partial_path = output_dir.join(format!("{}.partial", filename));

    let persisted = fs::write(&partial_path, &bytes)
        .map_err(|e| RenderError::io_error(e, &partial_path))
        .and_then(|()| {
            fs::rename(&partial_path, &final_path)
                .map_err(|e| RenderError::io_error(e, &final_path))
        });
    if let Err(e) = persisted {
        // a short write leaves a truncated partial file behind
        let _ = fs::remove_file(&partial_path);
        return Err(e);
    }

    info!("Wrote {} ({} bytes)", final_path.display(), bytes.len());
    Ok(filename)
}
