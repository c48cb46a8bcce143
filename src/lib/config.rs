//! Configuration module for the paginated layout.
//!
//! The PDF renderer's geometry (page size, margins, font sizes, line spacing) is loaded from an
//! optional TOML file. Every value has a default, and a missing, unreadable or malformed
//! configuration silently falls back to those defaults, so a configuration problem never aborts a
//! render.
//!
//! # Configuration Example
//!
//! ```toml
//! [page]
//! width = 612.0
//! height = 792.0
//!
//! [margin]
//! left = 50.0
//! right = 50.0
//! top = 50.0
//! bottom = 100.0
//!
//! [title]
//! size = 18
//! offset = 50.0
//!
//! [metadata]
//! size = 12
//!
//! [text]
//! size = 11
//! leading = 1.2
//!
//! [heading.1]
//! size = 18
//! ```
//!
//! Headings 1 to 4 can each be configured under `heading.N`.

use std::fs;
use std::path::Path;
use toml::Value;

/// Configuration source for the layout configuration.
#[derive(Debug, Clone)]
pub enum ConfigSource<'a> {
    /// Use the built-in layout
    Default,
    /// Load configuration from a file path
    File(&'a str),
    /// Use a TOML string held in memory
    Embedded(&'a str),
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    /// Safety margin: no baseline is placed below this height.
    pub bottom: f32,
}

/// Geometry and type sizes used by the paginated renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStyle {
    pub page_width: f32,
    pub page_height: f32,
    pub margins: Margins,
    pub title_size: f32,
    /// Distance from the top edge to the title baseline.
    pub title_offset: f32,
    pub metadata_size: f32,
    pub text_size: f32,
    /// Baseline-to-baseline distance as a multiple of the font size.
    pub leading: f32,
    /// Sizes for heading levels 1 to 4.
    pub heading_sizes: [f32; 4],
}

impl Default for LayoutStyle {
    fn default() -> Self {
        LayoutStyle {
            page_width: 612.0,
            page_height: 792.0,
            margins: Margins {
                left: 50.0,
                right: 50.0,
                top: 50.0,
                bottom: 100.0,
            },
            title_size: 18.0,
            title_offset: 50.0,
            metadata_size: 12.0,
            text_size: 11.0,
            leading: 1.2,
            heading_sizes: [18.0, 16.0, 14.0, 12.0],
        }
    }
}

impl LayoutStyle {
    /// Usable line width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margins.left - self.margins.right
    }

    /// Font size for heading `level` (1 to 4; out-of-range levels clamp).
    pub fn heading_size(&self, level: u8) -> f32 {
        let idx = (level.clamp(1, 4) - 1) as usize;
        self.heading_sizes[idx]
    }
}

/// Reads a positive number from a TOML table, accepting both floats and integers.
fn parse_number(table: Option<&Value>, key: &str) -> Option<f32> {
    let value = table?.get(key)?;
    let n = value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))?;
    if n.is_finite() && n > 0.0 {
        Some(n as f32)
    } else {
        None
    }
}

/// Parses a TOML layout configuration, keeping defaults for anything missing or invalid.
///
/// # Example
/// ```rust
/// use assignment2doc::config::parse_config_string;
///
/// let style = parse_config_string("[text]\nsize = 12\n[heading.2]\nsize = 20");
/// assert_eq!(style.text_size, 12.0);
/// assert_eq!(style.heading_size(2), 20.0);
/// assert_eq!(style.heading_size(1), 18.0);
/// ```
pub fn parse_config_string(config_str: &str) -> LayoutStyle {
    let config: Value = match toml::from_str(config_str) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("Ignoring invalid layout configuration: {}", e);
            return LayoutStyle::default();
        }
    };

    let d = LayoutStyle::default();
    let page = config.get("page");
    let margin = config.get("margin");
    let title = config.get("title");
    let heading = config.get("heading");

    let mut heading_sizes = d.heading_sizes;
    for (i, size) in heading_sizes.iter_mut().enumerate() {
        let level = (i + 1).to_string();
        if let Some(s) = parse_number(heading.and_then(|h| h.get(level.as_str())), "size") {
            *size = s;
        }
    }

    LayoutStyle {
        page_width: parse_number(page, "width").unwrap_or(d.page_width),
        page_height: parse_number(page, "height").unwrap_or(d.page_height),
        margins: Margins {
            left: parse_number(margin, "left").unwrap_or(d.margins.left),
            right: parse_number(margin, "right").unwrap_or(d.margins.right),
            top: parse_number(margin, "top").unwrap_or(d.margins.top),
            bottom: parse_number(margin, "bottom").unwrap_or(d.margins.bottom),
        },
        title_size: parse_number(title, "size").unwrap_or(d.title_size),
        title_offset: parse_number(title, "offset").unwrap_or(d.title_offset),
        metadata_size: parse_number(config.get("metadata"), "size").unwrap_or(d.metadata_size),
        text_size: parse_number(config.get("text"), "size").unwrap_or(d.text_size),
        leading: parse_number(config.get("text"), "leading").unwrap_or(d.leading),
        heading_sizes,
    }
}

/// Loads the layout configuration from the given source.
pub fn load_config_from_source(source: ConfigSource) -> LayoutStyle {
    match source {
        ConfigSource::Default => LayoutStyle::default(),
        ConfigSource::File(path) => match fs::read_to_string(Path::new(path)) {
            Ok(s) => parse_config_string(&s),
            Err(e) => {
                log::warn!("Could not read configuration '{}': {}", path, e);
                LayoutStyle::default()
            }
        },
        ConfigSource::Embedded(content) => parse_config_string(content),
    }
}

/// The default configuration as a TOML document.
pub fn default_config_toml() -> String {
    let d = LayoutStyle::default();
    let mut out = String::new();
    out.push_str("# assignment2doc layout configuration (sizes in points)\n\n");
    out.push_str(&format!(
        "[page]\nwidth = {:.1}\nheight = {:.1}\n\n",
        d.page_width, d.page_height
    ));
    out.push_str(&format!(
        "[margin]\nleft = {:.1}\nright = {:.1}\ntop = {:.1}\nbottom = {:.1}\n\n",
        d.margins.left, d.margins.right, d.margins.top, d.margins.bottom
    ));
    out.push_str(&format!(
        "[title]\nsize = {:.1}\noffset = {:.1}\n\n",
        d.title_size, d.title_offset
    ));
    out.push_str(&format!("[metadata]\nsize = {:.1}\n\n", d.metadata_size));
    out.push_str(&format!(
        "[text]\nsize = {:.1}\nleading = {:.1}\n",
        d.text_size, d.leading
    ));
    for (i, size) in d.heading_sizes.iter().enumerate() {
        out.push_str(&format!("\n[heading.{}]\nsize = {:.1}\n", i + 1, size));
    }
    out
}
