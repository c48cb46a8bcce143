//! Built-in PDF font handling for the paginated renderer.
//!
//! The renderer only uses the standard Helvetica family, which every PDF viewer provides without
//! embedding. Text is measured with the Adobe Font Metrics (AFM) advance widths of those fonts and
//! encoded as WinAnsiEncoding bytes, the single-byte encoding the standard fonts are declared with.
//!
//! Characters outside WinAnsiEncoding cannot be drawn with these fonts; they are replaced by `?`
//! when encoding and measured as such.

use crate::inline::LineStyle;
use crate::RenderError;

/// Width used for the control range, which never reaches the content stream.
const DEFAULT_GLYPH_WIDTH: u16 = 556;

/// AFM widths for Helvetica and Helvetica-Oblique, code points 32..=126.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// AFM widths for Helvetica-Bold, code points 32..=126.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// AFM widths for Helvetica and Helvetica-Oblique, WinAnsi bytes 0x80..=0xFF.
/// Unassigned slots (0x81, 0x8D, 0x8F, 0x90, 0x9D) carry the bullet width.
#[rustfmt::skip]
const HELVETICA_HIGH_WIDTHS: [u16; 128] = [
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// AFM widths for Helvetica-Bold, WinAnsi bytes 0x80..=0xFF.
#[rustfmt::skip]
const HELVETICA_BOLD_HIGH_WIDTHS: [u16; 128] = [
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// The three standard fonts the renderer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl BuiltinFont {
    pub const ALL: [BuiltinFont; 3] = [
        BuiltinFont::Helvetica,
        BuiltinFont::HelveticaBold,
        BuiltinFont::HelveticaOblique,
    ];

    /// PostScript name used as the font's `/BaseFont`.
    pub fn base_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    /// Name of the font in a page's resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F1",
            BuiltinFont::HelveticaBold => "F2",
            BuiltinFont::HelveticaOblique => "F3",
        }
    }

    /// Width tables for printable ASCII and for the upper WinAnsi half.
    fn widths(self) -> (&'static [u16; 95], &'static [u16; 128]) {
        match self {
            BuiltinFont::HelveticaBold => (&HELVETICA_BOLD_WIDTHS, &HELVETICA_BOLD_HIGH_WIDTHS),
            // Oblique shares the upright metrics.
            BuiltinFont::Helvetica | BuiltinFont::HelveticaOblique => {
                (&HELVETICA_WIDTHS, &HELVETICA_HIGH_WIDTHS)
            }
        }
    }

    /// Advance width of one WinAnsi byte in 1/1000 em.
    fn byte_width(self, byte: u8) -> u16 {
        let (ascii, high) = self.widths();
        match byte {
            32..=126 => ascii[(byte - 32) as usize],
            0x80..=0xff => high[(byte - 0x80) as usize],
            _ => DEFAULT_GLYPH_WIDTH,
        }
    }

    /// Width of `text` in points at `size`.
    pub fn string_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| self.byte_width(encode_char(c).unwrap_or(b'?')) as u32)
            .sum();
        units as f32 * size / 1000.0
    }
}

impl From<LineStyle> for BuiltinFont {
    fn from(style: LineStyle) -> Self {
        match style {
            LineStyle::Regular => BuiltinFont::Helvetica,
            LineStyle::Bold => BuiltinFont::HelveticaBold,
            LineStyle::Italic => BuiltinFont::HelveticaOblique,
        }
    }
}

/// Maps one character to its WinAnsiEncoding byte, if it has one.
pub fn encode_char(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        '\t' => b' ',
        _ => return None,
    };
    Some(byte)
}

/// Encodes `text` as WinAnsi bytes, substituting `?` for unsupported characters.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| encode_char(c).unwrap_or(b'?')).collect()
}

/// Characters of `text` that the standard fonts cannot draw, in order of first appearance.
pub fn unsupported_chars(text: &str) -> Vec<char> {
    let mut missing = Vec::new();
    for c in text.chars() {
        if c != '\n' && c != '\r' && encode_char(c).is_none() && !missing.contains(&c) {
            missing.push(c);
        }
    }
    missing
}

/// Breaks `text` into lines no wider than `max_width` points.
///
/// Words are separated by spaces and placed greedily. Leading whitespace is kept as indentation
/// on the first line only. A word wider than `max_width` gets a line of its own rather than
/// being split. Text that is empty after trimming yields no lines.
pub fn wrap_text(
    text: &str,
    font: BuiltinFont,
    size: f32,
    max_width: f32,
) -> Result<Vec<String>, RenderError> {
    if !(max_width.is_finite() && max_width > 0.0) || !(size.is_finite() && size > 0.0) {
        return Err(RenderError::layout_error(format!(
            "cannot wrap text at width {} with font size {}",
            max_width, size
        )));
    }

    let trimmed = text.trim_start();
    if trimmed.trim_end().is_empty() {
        return Ok(Vec::new());
    }

    let indent = &text[..text.len() - trimmed.len()];
    let space_width = font.string_width(" ", size);

    let mut lines = Vec::new();
    let mut current = indent.to_string();
    let mut current_width = font.string_width(indent, size);
    let mut has_word = false;

    for word in trimmed.split_whitespace() {
        let word_width = font.string_width(word, size);
        if has_word && current_width + space_width + word_width > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
            continue;
        }
        if has_word {
            current.push(' ');
            current_width += space_width;
        }
        current.push_str(word);
        current_width += word_width;
        has_word = true;
    }

    lines.push(current);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_width_matches_afm() {
        // "Hi" = H(722) + i(222) at 10pt
        let w = BuiltinFont::Helvetica.string_width("Hi", 10.0);
        assert!((w - 9.44).abs() < 1e-4);
        // bold i is wider
        let wb = BuiltinFont::HelveticaBold.string_width("Hi", 10.0);
        assert!((wb - 10.0).abs() < 1e-4);
        assert_eq!(
            BuiltinFont::Helvetica.string_width("oblique", 11.0),
            BuiltinFont::HelveticaOblique.string_width("oblique", 11.0)
        );
    }

    #[test]
    fn test_bullet_width() {
        let w = BuiltinFont::Helvetica.string_width("•", 10.0);
        assert!((w - 3.5).abs() < 1e-4);
    }

    #[test]
    fn test_upper_winansi_widths() {
        let helvetica = BuiltinFont::Helvetica;
        assert_eq!(helvetica.string_width("…", 1000.0), 1000.0);
        assert_eq!(helvetica.string_width("—", 1000.0), 1000.0);
        assert_eq!(helvetica.string_width("Æ", 1000.0), 1000.0);
        assert_eq!(helvetica.string_width("©", 1000.0), 737.0);
        assert_eq!(helvetica.string_width("’", 1000.0), 222.0);
        assert_eq!(helvetica.string_width("é", 1000.0), 556.0);

        let bold = BuiltinFont::HelveticaBold;
        assert_eq!(bold.string_width("’", 1000.0), 278.0);
        assert_eq!(bold.string_width("Á", 1000.0), 722.0);
        assert_eq!(bold.string_width("ü", 1000.0), 611.0);
        assert_eq!(BuiltinFont::HelveticaOblique.string_width("—", 1000.0), 1000.0);
    }

    #[test]
    fn test_wrap_dashes_stays_within_width() {
        let text = vec!["——"; 60].join(" ");
        let lines = wrap_text(&text, BuiltinFont::Helvetica, 11.0, 512.0).unwrap();
        assert!(lines.len() > 1);
        for line in &lines {
            let width = BuiltinFont::Helvetica.string_width(line, 11.0);
            assert!(width <= 512.0, "line spans {}pt", width);
            // two em dashes at 1000 units each, plus the separating spaces
            let words = line.split(' ').count() as f32;
            let expected = (words * 2000.0 + (words - 1.0) * 278.0) * 11.0 / 1000.0;
            assert!((width - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("A•é"), vec![b'A', 0x95, 0xe9]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
        assert_eq!(encode_win_ansi("“quoted”"), {
            let mut v = vec![0x93];
            v.extend_from_slice(b"quoted");
            v.push(0x94);
            v
        });
    }

    #[test]
    fn test_unsupported_chars() {
        assert!(unsupported_chars("Plain café – fine").is_empty());
        assert_eq!(unsupported_chars("α and β and α"), vec!['α', 'β']);
    }

    #[test]
    fn test_wrap_short_text_single_line() {
        let lines = wrap_text("Short line", BuiltinFont::Helvetica, 11.0, 512.0).unwrap();
        assert_eq!(lines, vec!["Short line".to_string()]);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "The quick brown fox jumps over the lazy dog ".repeat(20);
        let lines = wrap_text(&text, BuiltinFont::Helvetica, 11.0, 512.0).unwrap();
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(BuiltinFont::Helvetica.string_width(line, 11.0) <= 512.0);
        }
        let rejoined = lines.join(" ");
        assert_eq!(
            rejoined.split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_wrap_keeps_indent_on_first_line() {
        let text = format!("   • {}", "word ".repeat(200));
        let lines = wrap_text(&text, BuiltinFont::Helvetica, 11.0, 512.0).unwrap();
        assert!(lines[0].starts_with("   • word"));
        assert!(lines[1].starts_with("word"));
    }

    #[test]
    fn test_wrap_overlong_word_kept_whole() {
        let word = "x".repeat(300);
        let lines = wrap_text(&format!("a {} b", word), BuiltinFont::Helvetica, 11.0, 100.0).unwrap();
        assert_eq!(lines, vec!["a".to_string(), word, "b".to_string()]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_text("", BuiltinFont::Helvetica, 11.0, 512.0).unwrap().is_empty());
        assert!(wrap_text("    ", BuiltinFont::Helvetica, 11.0, 512.0).unwrap().is_empty());
    }

    #[test]
    fn test_wrap_rejects_bad_width() {
        assert!(matches!(
            wrap_text("text", BuiltinFont::Helvetica, 11.0, 0.0),
            Err(RenderError::LayoutError { .. })
        ));
        assert!(wrap_text("text", BuiltinFont::Helvetica, f32::NAN, 100.0).is_err());
    }

    #[test]
    fn test_from_line_style() {
        assert_eq!(BuiltinFont::from(LineStyle::Bold), BuiltinFont::HelveticaBold);
        assert_eq!(BuiltinFont::from(LineStyle::Italic), BuiltinFont::HelveticaOblique);
        assert_eq!(BuiltinFont::from(LineStyle::Regular), BuiltinFont::Helvetica);
    }
}
