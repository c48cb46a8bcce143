//! Structured DOCX rendering.
//!
//! Blocks map onto native WordprocessingML constructs and the word processor does all layout:
//!
//! | Block          | Output                                                   |
//! |----------------|----------------------------------------------------------|
//! | `Heading{n}`   | paragraph styled `Heading{n}`                            |
//! | `BulletItem`   | paragraph styled `ListBullet` (bullet numbering)         |
//! | `NumberedItem` | paragraph styled `ListNumber` (decimal numbering)        |
//! | `Paragraph`    | one run per styled span, `<w:b/>` / `<w:i/>` as flagged  |
//! | `Blank`        | empty paragraph                                          |
//! | `ImageDirective` | nothing                                                |
//!
//! List item text is written literally: inline emphasis inside list items is not interpreted.
//!
//! The package is written from scratch (no template) with just the parts Word needs: content
//! types, relationships, the main document, styles, numbering definitions and core properties.

use crate::inline::StyledRun;
use crate::markdown::{Block, Document};
use crate::payload::Payload;
use crate::RenderError;
use log::debug;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#;

/// `numId` of the bullet list definition in `numbering.xml`.
const BULLET_NUM_ID: u32 = 1;
/// `numId` of the decimal list definition in `numbering.xml`.
const DECIMAL_NUM_ID: u32 = 2;

const NUMBERING_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0">
      <w:start w:val="1"/>
      <w:numFmt w:val="bullet"/>
      <w:lvlText w:val="&#8226;"/>
      <w:lvlJc w:val="left"/>
      <w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr>
      <w:rPr><w:rFonts w:ascii="Symbol" w:hAnsi="Symbol" w:hint="default"/></w:rPr>
    </w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0">
      <w:start w:val="1"/>
      <w:numFmt w:val="decimal"/>
      <w:lvlText w:val="%1."/>
      <w:lvlJc w:val="left"/>
      <w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr>
    </w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;

/// Writes the `styles.xml` part: Normal, Title, Heading1-4 and the two list styles.
fn styles_xml() -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="Title"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:spacing w:after="240"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="52"/></w:rPr>
  </w:style>
"#,
    );

    // half-points
    let heading_sizes = [32, 28, 26, 24];
    for (i, size) in heading_sizes.iter().enumerate() {
        let level = i + 1;
        out.push_str(&format!(
            r#"  <w:style w:type="paragraph" w:styleId="Heading{level}">
    <w:name w:val="heading {level}"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="{outline}"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="{size}"/></w:rPr>
  </w:style>
"#,
            level = level,
            outline = i,
            size = size
        ));
    }

    for (id, name, num_id) in [
        ("ListBullet", "List Bullet", BULLET_NUM_ID),
        ("ListNumber", "List Number", DECIMAL_NUM_ID),
    ] {
        out.push_str(&format!(
            r#"  <w:style w:type="paragraph" w:styleId="{id}">
    <w:name w:val="{name}"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:numPr><w:numId w:val="{num_id}"/></w:numPr><w:contextualSpacing/></w:pPr>
  </w:style>
"#,
            id = id,
            name = name,
            num_id = num_id
        ));
    }

    out.push_str("</w:styles>");
    out
}

/// Escapes text for element content, dropping characters XML 1.0 cannot carry.
fn xml_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect();
    escape(cleaned.as_str()).into_owned()
}

/// Builds the DOCX package for one payload.
pub struct DocxRenderer<'a> {
    payload: &'a Payload,
    document: &'a Document,
    output: String,
}

impl<'a> DocxRenderer<'a> {
    pub fn new(payload: &'a Payload, document: &'a Document) -> Self {
        DocxRenderer {
            payload,
            document,
            output: String::new(),
        }
    }

    /// Produces the complete `.docx` archive.
    pub fn render(mut self) -> Result<Vec<u8>, RenderError> {
        let document_xml = self.document_xml();
        let core_xml = self.core_xml();
        let styles_xml = styles_xml();

        let mut buffer = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buffer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, &[u8]); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
            ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
            ("word/document.xml", document_xml.as_bytes()),
            ("word/styles.xml", styles_xml.as_bytes()),
            ("word/numbering.xml", NUMBERING_XML.as_bytes()),
            ("docProps/core.xml", core_xml.as_bytes()),
        ];
        for (path, contents) in parts {
            zip.start_file(path, options)?;
            zip.write_all(contents)
                .map_err(|e| RenderError::PackageError {
                    message: format!("could not write {}: {}", path, e),
                })?;
        }
        zip.finish()?;

        Ok(buffer.into_inner())
    }

    /// Generates `word/document.xml`.
    pub fn document_xml(&mut self) -> String {
        self.output.clear();
        self.output.push_str(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
"#,
        );

        self.generate_title();
        self.generate_metadata();

        let document = self.document;
        for block in document.blocks() {
            self.generate_block(block);
        }

        self.output.push_str(
            r#"<w:sectPr>
<w:pgSz w:w="12240" w:h="15840"/>
<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>
</w:sectPr>
</w:body>
</w:document>"#,
        );
        std::mem::take(&mut self.output)
    }

    fn generate_title(&mut self) {
        let payload = self.payload;
        self.output.push_str("<w:p>\n<w:pPr>\n<w:pStyle w:val=\"Title\"/>\n<w:jc w:val=\"center\"/>\n</w:pPr>\n");
        self.push_run(&StyledRun::plain(payload.topic()));
        self.output.push_str("</w:p>\n");
    }

    fn generate_metadata(&mut self) {
        let payload = self.payload;
        if let Some(subject) = &payload.subject {
            self.output.push_str("<w:p>\n");
            self.push_run(&StyledRun::bold(format!("Subject: {}", subject)));
            self.output.push_str("</w:p>\n");
        }
        if let Some(level) = &payload.level {
            self.output.push_str("<w:p>\n");
            self.push_run(&StyledRun::bold(format!("Level: {}", level)));
            self.output.push_str("</w:p>\n");
        }
        // spacer before the body
        self.output.push_str("<w:p/>\n");
    }

    fn generate_block(&mut self, block: &Block) {
        match block {
            Block::Heading { level, text } => {
                self.styled_paragraph(&format!("Heading{}", level), text);
            }
            Block::BulletItem { text } => self.styled_paragraph("ListBullet", text),
            Block::NumberedItem { text, .. } => self.styled_paragraph("ListNumber", text),
            Block::Paragraph { runs, .. } => {
                self.output.push_str("<w:p>\n");
                for run in runs {
                    self.push_run(run);
                }
                self.output.push_str("</w:p>\n");
            }
            Block::Blank => self.output.push_str("<w:p/>\n"),
            Block::ImageDirective { target } => {
                debug!("Skipping image directive '{}'", target);
            }
        }
    }

    /// A paragraph with a named style holding one literal run.
    fn styled_paragraph(&mut self, style: &str, text: &str) {
        self.output.push_str("<w:p>\n<w:pPr>\n");
        self.output
            .push_str(&format!("<w:pStyle w:val=\"{}\"/>\n", style));
        self.output.push_str("</w:pPr>\n");
        self.push_run(&StyledRun::plain(text));
        self.output.push_str("</w:p>\n");
    }

    fn push_run(&mut self, run: &StyledRun) {
        self.output.push_str("<w:r>\n");
        if run.bold || run.italic {
            self.output.push_str("<w:rPr>");
            if run.bold {
                self.output.push_str("<w:b/>");
            }
            if run.italic {
                self.output.push_str("<w:i/>");
            }
            self.output.push_str("</w:rPr>\n");
        }
        self.output.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t>\n",
            xml_text(&run.text)
        ));
        self.output.push_str("</w:r>\n");
    }

    /// Generates `docProps/core.xml` with the title and subject.
    fn core_xml(&self) -> String {
        let mut core = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
        );
        core.push_str(&format!(
            "<dc:title>{}</dc:title>",
            xml_text(self.payload.topic())
        ));
        if let Some(subject) = &self.payload.subject {
            core.push_str(&format!("<dc:subject>{}</dc:subject>", xml_text(subject)));
        }
        core.push_str("<dc:creator>assignment2doc</dc:creator>");
        core.push_str("</cp:coreProperties>");
        core
    }
}
