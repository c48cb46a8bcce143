//! Paginated PDF rendering.
//!
//! The renderer lays text out by hand on fixed-size pages. A [`PageCursor`] tracks the current
//! baseline and font; every physical line is drawn at the cursor, the cursor then moves down by
//! one line of leading, and as soon as it drops below the bottom safety margin the page is
//! flushed and a fresh page begins at the top margin. No baseline is ever placed below that
//! margin.
//!
//! Unlike the DOCX renderer, inline emphasis is resolved per block rather than per run: one font
//! is chosen for a block's entire text (bold if the raw line holds `**`, oblique if it holds a
//! single-asterisk span, regular otherwise) and all markers are stripped before measuring. A
//! paragraph mixing bold and italic therefore renders wholly bold. This coarse model is part of
//! the PDF output's contract.
//!
//! Page 1 starts with a header: the centred title, then the optional `Subject:` and `Level:`
//! lines. Later pages start directly with body text.
//!
//! Output uses the standard Helvetica fonts (see [`crate::fonts`]) and is assembled with `lopdf`.

use crate::config::LayoutStyle;
use crate::fonts::{encode_win_ansi, wrap_text, BuiltinFont};
use crate::inline::{line_style, strip_markers};
use crate::markdown::{Block, Document};
use crate::payload::Payload;
use crate::RenderError;
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream, StringFormat};

/// Gap between the title baseline and the first metadata or body baseline on page 1.
const TITLE_GAP: f32 = 30.0;
/// Vertical space taken by the `Subject:` line.
const SUBJECT_ADVANCE: f32 = 20.0;
/// Vertical space taken by the `Level:` line, including the gap before the body.
const LEVEL_ADVANCE: f32 = 40.0;

/// Text drawn at a fixed position on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub x: f32,
    /// Baseline, measured from the bottom edge.
    pub y: f32,
    pub font: BuiltinFont,
    pub size: f32,
    pub text: String,
}

/// One laid-out page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<PlacedText>,
}

/// Transient layout state: where the next line goes and in which font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    pub y: f32,
    pub font: BuiltinFont,
    pub size: f32,
}

/// Layout state machine.
///
/// Lines are appended to the open page; a line that leaves the cursor below the safety margin
/// flushes the page and opens the next one. [`PageLayout::finish`] flushes whatever is pending.
struct PageLayout<'s> {
    style: &'s LayoutStyle,
    pages: Vec<Page>,
    current: Page,
    cursor: PageCursor,
}

impl<'s> PageLayout<'s> {
    fn new(style: &'s LayoutStyle, start_y: f32) -> Self {
        PageLayout {
            style,
            pages: Vec::new(),
            current: Page::default(),
            cursor: PageCursor {
                y: start_y,
                font: BuiltinFont::Helvetica,
                size: style.text_size,
            },
        }
    }

    fn set_font(&mut self, font: BuiltinFont, size: f32) {
        self.cursor.font = font;
        self.cursor.size = size;
    }

    /// Draws one physical line in the cursor's font; an empty line only advances the cursor.
    fn text_line(&mut self, text: &str) {
        if !text.is_empty() {
            self.current.items.push(PlacedText {
                x: self.style.margins.left,
                y: self.cursor.y,
                font: self.cursor.font,
                size: self.cursor.size,
                text: text.to_string(),
            });
        }
        self.cursor.y -= self.cursor.size * self.style.leading;

        if self.cursor.y < self.style.margins.bottom {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        debug!(
            "Page {} full ({} line(s)), starting a new page",
            self.pages.len() + 1,
            finished.items.len()
        );
        self.pages.push(finished);
        self.cursor = PageCursor {
            y: self.style.page_height - self.style.margins.top,
            font: BuiltinFont::Helvetica,
            size: self.style.text_size,
        };
    }

    /// Places text outside the flowing body (title and metadata) without touching the cursor.
    fn place(&mut self, x: f32, y: f32, font: BuiltinFont, size: f32, text: &str) {
        self.current.items.push(PlacedText {
            x,
            y,
            font,
            size,
            text: text.to_string(),
        });
    }

    /// Flushes the open page unless it is an empty page left behind by a final page break.
    fn finish(mut self) -> Vec<Page> {
        if !self.current.items.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Font, size and display text the paginated renderer uses for a visible block.
fn block_text(block: &Block, style: &LayoutStyle) -> Option<(BuiltinFont, f32, String)> {
    let (font, size, text) = match block {
        Block::Heading { level, text } => (
            BuiltinFont::HelveticaBold,
            style.heading_size(*level),
            text.clone(),
        ),
        Block::BulletItem { text } => (
            BuiltinFont::Helvetica,
            style.text_size,
            format!("   • {}", text),
        ),
        Block::NumberedItem { number, text } => (
            BuiltinFont::Helvetica,
            style.text_size,
            format!("   {}. {}", number, text),
        ),
        Block::Paragraph { raw, .. } => (line_style(raw).into(), style.text_size, raw.clone()),
        Block::Blank | Block::ImageDirective { .. } => return None,
    };
    Some((font, size, strip_markers(&text)))
}

/// The paginated renderer for one payload.
pub struct Pdf<'a> {
    payload: &'a Payload,
    document: &'a Document,
    style: &'a LayoutStyle,
}

impl<'a> Pdf<'a> {
    pub fn new(payload: &'a Payload, document: &'a Document, style: &'a LayoutStyle) -> Self {
        Pdf {
            payload,
            document,
            style,
        }
    }

    /// Lays the document out into pages without producing PDF bytes.
    pub fn layout(&self) -> Result<Vec<Page>, RenderError> {
        let style = self.style;
        let body_start = style.page_height - style.title_offset - TITLE_GAP;
        if body_start <= style.margins.bottom
            || style.page_height - style.margins.top <= style.margins.bottom
        {
            return Err(RenderError::LayoutError {
                message: format!(
                    "page height {} leaves no room above the bottom margin {}",
                    style.page_height, style.margins.bottom
                ),
                suggestion: Some("Reduce the margins in the layout configuration".to_string()),
            });
        }

        let mut layout = PageLayout::new(style, body_start);
        self.draw_header(&mut layout);

        let width = style.content_width();
        for block in self.document.blocks() {
            match block {
                Block::ImageDirective { target } => {
                    debug!("Skipping image directive '{}'", target);
                }
                Block::Blank => layout.text_line(""),
                _ => {
                    let Some((font, size, text)) = block_text(block, style) else {
                        continue;
                    };
                    // A page break inside the block resets the font to plain text for the
                    // remaining lines.
                    layout.set_font(font, size);
                    for line in wrap_text(&text, font, size, width)? {
                        layout.text_line(&line);
                    }
                    if matches!(block, Block::Heading { .. }) {
                        layout.set_font(BuiltinFont::Helvetica, style.text_size);
                        layout.text_line("");
                    }
                }
            }
        }

        Ok(layout.finish())
    }

    fn draw_header(&self, layout: &mut PageLayout) {
        let style = self.style;
        let title = self.payload.topic();
        let title_width = BuiltinFont::HelveticaBold.string_width(title, style.title_size);
        layout.place(
            (style.page_width - title_width) / 2.0,
            style.page_height - style.title_offset,
            BuiltinFont::HelveticaBold,
            style.title_size,
            title,
        );

        if let Some(subject) = &self.payload.subject {
            let y = layout.cursor.y;
            layout.place(
                style.margins.left,
                y,
                BuiltinFont::Helvetica,
                style.metadata_size,
                &format!("Subject: {}", subject),
            );
            layout.cursor.y -= SUBJECT_ADVANCE;
        }
        if let Some(level) = &self.payload.level {
            let y = layout.cursor.y;
            layout.place(
                style.margins.left,
                y,
                BuiltinFont::Helvetica,
                style.metadata_size,
                &format!("Level: {}", level),
            );
            layout.cursor.y -= LEVEL_ADVANCE;
        }
        if layout.cursor.y < style.margins.bottom {
            layout.break_page();
        }
    }

    /// Lays out the document and serializes it as PDF bytes.
    pub fn render_to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let pages = self.layout()?;
        debug!("Laid out {} page(s)", pages.len());
        self.build_document(&pages)
    }

    fn build_document(&self, pages: &[Page]) -> Result<Vec<u8>, RenderError> {
        let style = self.style;
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut font_dict = Dictionary::new();
        for font in BuiltinFont::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_name(),
                "Encoding" => "WinAnsiEncoding",
            });
            font_dict.set(font.resource_name(), font_id);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => font_dict,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in pages {
            let content = Content {
                operations: page_operations(page),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                style.page_width.into(),
                style.page_height.into(),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Title" => text_string(self.payload.topic()),
            "Producer" => text_string(concat!("assignment2doc ", env!("CARGO_PKG_VERSION"))),
        };
        if let Some(subject) = &self.payload.subject {
            info.set("Subject", text_string(subject));
        }
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| RenderError::layout_error(format!("could not serialize PDF: {}", e)))?;
        Ok(bytes)
    }
}

/// Content stream operators drawing every item of a page.
fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(page.items.len() * 5);
    for item in &page.items {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![item.font.resource_name().into(), item.size.into()],
        ));
        ops.push(Operation::new("Td", vec![item.x.into(), item.y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&item.text),
                StringFormat::Literal,
            )],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

/// A PDF text string in UTF-16BE with byte order mark, valid for any Unicode text.
fn text_string(text: &str) -> Object {
    let mut bytes = vec![0xfe, 0xff];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_for(json: &str) -> Vec<Page> {
        let payload = Payload::from_json(json).unwrap();
        let document = Document::parse(payload.content());
        let style = LayoutStyle::default();
        Pdf::new(&payload, &document, &style).layout().unwrap()
    }

    fn body_items(pages: &[Page]) -> Vec<&PlacedText> {
        pages
            .iter()
            .flat_map(|p| p.items.iter())
            .filter(|i| i.x == 50.0 && !i.text.starts_with("Subject:") && !i.text.starts_with("Level:"))
            .collect()
    }

    #[test]
    fn test_header_positions() {
        let pages = layout_for(r#"{"topic":"Photosynthesis","subject":"Biology","level":"Grade 8"}"#);
        assert_eq!(pages.len(), 1);
        let items = &pages[0].items;
        assert_eq!(items[0].text, "Photosynthesis");
        assert_eq!(items[0].font, BuiltinFont::HelveticaBold);
        assert_eq!(items[0].size, 18.0);
        assert_eq!(items[0].y, 742.0);
        let title_width = BuiltinFont::HelveticaBold.string_width("Photosynthesis", 18.0);
        assert!((items[0].x - (612.0 - title_width) / 2.0).abs() < 1e-3);

        assert_eq!(items[1].text, "Subject: Biology");
        assert_eq!(items[1].y, 712.0);
        assert_eq!(items[1].size, 12.0);
        assert_eq!(items[2].text, "Level: Grade 8");
        assert_eq!(items[2].y, 692.0);
    }

    #[test]
    fn test_body_starts_after_metadata_gap() {
        let pages = layout_for(r#"{"subject":"Biology","level":"Grade 8","content":"Body"}"#);
        let body = body_items(&pages);
        assert_eq!(body[0].text, "Body");
        assert_eq!(body[0].y, 652.0);
    }

    #[test]
    fn test_body_without_metadata() {
        let pages = layout_for(r#"{"content":"Body"}"#);
        assert_eq!(pages[0].items[0].text, "Assignment");
        let body = body_items(&pages);
        assert_eq!(body[0].y, 712.0);
    }

    #[test]
    fn test_block_fonts() {
        let pages = layout_for(
            r##"{"content":"# H1\n## H2\n### H3\n#### H4\n- bullet\n3. third\nplain\nsome **bold**\nsome *italic*\n**b** and *i*"}"##,
        );
        let body: Vec<_> = body_items(&pages)
            .into_iter()
            .map(|i| (i.text.as_str(), i.font, i.size))
            .collect();
        assert_eq!(
            body,
            vec![
                ("H1", BuiltinFont::HelveticaBold, 18.0),
                ("H2", BuiltinFont::HelveticaBold, 16.0),
                ("H3", BuiltinFont::HelveticaBold, 14.0),
                ("H4", BuiltinFont::HelveticaBold, 12.0),
                ("   • bullet", BuiltinFont::Helvetica, 11.0),
                ("   3. third", BuiltinFont::Helvetica, 11.0),
                ("plain", BuiltinFont::Helvetica, 11.0),
                ("some bold", BuiltinFont::HelveticaBold, 11.0),
                ("some italic", BuiltinFont::HelveticaOblique, 11.0),
                ("b and i", BuiltinFont::HelveticaBold, 11.0),
            ]
        );
    }

    #[test]
    fn test_heading_spacer_and_blank_lines() {
        let pages = layout_for(r##"{"content":"# Title\nAfter\n\nLater"}"##);
        let body = body_items(&pages);
        // heading (18 * 1.2) then spacer (11 * 1.2)
        let after_heading = 712.0 - 18.0 * 1.2 - 11.0 * 1.2;
        assert!((body[1].y - after_heading).abs() < 1e-3);
        // "After" line then the blank line, both at the paragraph's leading
        let later = after_heading - 2.0 * 11.0 * 1.2;
        assert!((body[2].y - later).abs() < 1e-3);
    }

    #[test]
    fn test_image_directive_draws_nothing() {
        let with_image = layout_for(r#"{"content":"Before\n[IMAGE: foo.png]\nAfter"}"#);
        let without = layout_for(r#"{"content":"Before\nAfter"}"#);
        assert_eq!(with_image, without);
    }

    #[test]
    fn test_long_body_paginates() {
        let content = "A line of body text that is long enough to matter.\\n".repeat(120);
        let pages = layout_for(&format!(r#"{{"content":"{}"}}"#, content));
        assert!(pages.len() >= 2);
        for page in &pages {
            for item in &page.items {
                assert!(item.y >= 100.0, "baseline {} below margin", item.y);
            }
        }
        // continuation pages start at the top margin
        assert_eq!(pages[1].items[0].y, 742.0);
    }

    #[test]
    fn test_page_break_resets_font_mid_block() {
        let filler = "filler\\n".repeat(46);
        let bold = format!("**{}**", "bold words ".repeat(120));
        let pages = layout_for(&format!(r#"{{"content":"{}{}"}}"#, filler, bold));
        assert!(pages.len() >= 2);

        let first_page_bold: Vec<_> = pages[0]
            .items
            .iter()
            .filter(|i| i.text.contains("words"))
            .collect();
        assert!(!first_page_bold.is_empty());
        assert!(first_page_bold
            .iter()
            .all(|i| i.font == BuiltinFont::HelveticaBold));

        let continued = &pages[1].items[0];
        assert!(continued.text.contains("words"));
        assert_eq!(continued.font, BuiltinFont::Helvetica);
        assert_eq!(continued.size, 11.0);
        assert!(pages[1].items.iter().all(|i| i.font == BuiltinFont::Helvetica));
    }

    #[test]
    fn test_body_with_subject_only() {
        let pages = layout_for(r#"{"subject":"Biology","content":"Body"}"#);
        let items = &pages[0].items;
        assert_eq!(items[1].text, "Subject: Biology");
        assert_eq!(items[1].y, 712.0);
        let body = body_items(&pages);
        assert_eq!(body[0].text, "Body");
        assert_eq!(body[0].y, 692.0);
    }

    #[test]
    fn test_body_with_level_only() {
        let pages = layout_for(r#"{"level":"Grade 8","content":"Body"}"#);
        let items = &pages[0].items;
        assert_eq!(items[1].text, "Level: Grade 8");
        assert_eq!(items[1].y, 712.0);
        let body = body_items(&pages);
        assert_eq!(body[0].text, "Body");
        assert_eq!(body[0].y, 672.0);
    }

    #[test]
    fn test_header_follows_title_offset() {
        let payload =
            Payload::from_json(r#"{"topic":"T","subject":"Biology","content":"Body"}"#).unwrap();
        let document = Document::parse(payload.content());
        let style = LayoutStyle {
            title_offset: 100.0,
            ..LayoutStyle::default()
        };
        let pages = Pdf::new(&payload, &document, &style).layout().unwrap();
        let items = &pages[0].items;
        assert_eq!(items[0].y, 692.0);
        assert_eq!(items[1].text, "Subject: Biology");
        assert!(items[1].y < items[0].y);
        assert_eq!(items[1].y, 662.0);
        assert_eq!(items[2].y, 642.0);
    }

    #[test]
    fn test_no_trailing_empty_page() {
        let pages = layout_for(r#"{"content":""}"#);
        assert_eq!(pages.len(), 1);
        for n in 1..200 {
            let content = "x\\n".repeat(n);
            let pages = layout_for(&format!(r#"{{"content":"{}"}}"#, content));
            assert!(pages.iter().all(|p| !p.items.is_empty()));
        }
    }

    #[test]
    fn test_rejects_degenerate_page() {
        let payload = Payload::default();
        let document = Document::parse("");
        let style = LayoutStyle {
            page_height: 150.0,
            ..LayoutStyle::default()
        };
        assert!(matches!(
            Pdf::new(&payload, &document, &style).layout(),
            Err(RenderError::LayoutError { .. })
        ));
    }

    #[test]
    fn test_render_to_bytes_header() {
        let payload = Payload::from_json(r#"{"topic":"Énergie","content":"Text"}"#).unwrap();
        let document = Document::parse(payload.content());
        let style = LayoutStyle::default();
        let bytes = Pdf::new(&payload, &document, &style).render_to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_text_string_utf16() {
        match text_string("Hé") {
            Object::String(bytes, _) => assert_eq!(bytes, vec![0xfe, 0xff, 0, b'H', 0, 0xe9]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
