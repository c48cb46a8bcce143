//! Line classification and the document model.
//!
//! Assignment content uses a deliberately small, line-oriented subset of markdown. Every line is
//! trimmed and classified on its own: there is no lookahead, no lookbehind and no state carried
//! between lines, so the same trimmed line always produces the same [`Block`].
//!
//! ```text
//! "## Methods"          -> Heading { level: 2, text: "Methods" }
//! "- Gather samples"    -> BulletItem { text: "Gather samples" }
//! "2. Measure growth"   -> NumberedItem { number: "2", text: "Measure growth" }
//! "[IMAGE: leaf.png]"   -> ImageDirective { target: "leaf.png" }
//! ""                    -> Blank
//! "Plants use **sun**." -> Paragraph { raw, runs }
//! ```
//!
//! Heading markers are tested longest first, so `#### ` is never mistaken for `# `.

use crate::inline::{tokenize_inline, StyledRun};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static IMAGE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[IMAGE:\s*(.*?)\]$").expect("valid image directive pattern"));

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s+").expect("valid numbered item pattern"));

/// Heading prefixes in the order they must be tested.
const HEADING_MARKERS: [(&str, u8); 4] = [("#### ", 4), ("### ", 3), ("## ", 2), ("# ", 1)];

const BULLET_MARKER: &str = "- ";

/// One classified line of assignment content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Block {
    /// `#`..`####` heading; `level` is 1 to 4 and `text` has the marker removed.
    Heading { level: u8, text: String },
    /// `- item`
    BulletItem { text: String },
    /// `3. item`; `number` holds the digits only.
    NumberedItem { number: String, text: String },
    /// Free text. `raw` keeps the inline markers, `runs` is the tokenized form.
    Paragraph { raw: String, runs: Vec<StyledRun> },
    /// An empty line; renders as a single vertical spacer.
    Blank,
    /// `[IMAGE: ...]`; produces no visible output.
    ImageDirective { target: String },
}

impl Block {
    /// Classifies one raw line of content.
    pub fn classify(line: &str) -> Block {
        let line = line.trim();

        if line.is_empty() {
            return Block::Blank;
        }

        if let Some(caps) = IMAGE_DIRECTIVE.captures(line) {
            return Block::ImageDirective {
                target: caps[1].to_string(),
            };
        }

        for (marker, level) in HEADING_MARKERS {
            if let Some(rest) = line.strip_prefix(marker) {
                return Block::Heading {
                    level,
                    text: rest.trim_start().to_string(),
                };
            }
        }

        if let Some(rest) = line.strip_prefix(BULLET_MARKER) {
            return Block::BulletItem {
                text: rest.trim_start().to_string(),
            };
        }

        if let Some(caps) = NUMBERED_ITEM.captures(line) {
            let marker_len = caps[0].len();
            return Block::NumberedItem {
                number: caps[1].to_string(),
                text: line[marker_len..].to_string(),
            };
        }

        Block::Paragraph {
            raw: line.to_string(),
            runs: tokenize_inline(line),
        }
    }

    /// Whether the block produces visible text in a renderer.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Block::Blank | Block::ImageDirective { .. })
    }

    /// Short kind name used in logs and debug dumps.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "Heading",
            Block::BulletItem { .. } => "BulletItem",
            Block::NumberedItem { .. } => "NumberedItem",
            Block::Paragraph { .. } => "Paragraph",
            Block::Blank => "Blank",
            Block::ImageDirective { .. } => "ImageDirective",
        }
    }
}

/// The classified content of one payload. Built once and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Splits `content` on line breaks and classifies every line.
    pub fn parse(content: &str) -> Self {
        let blocks = content.split('\n').map(Block::classify).collect();
        Document { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Iterator over blocks that carry visible content.
    pub fn visible_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.is_visible())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| matches!(b, Block::Blank))
    }
}
