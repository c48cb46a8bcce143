//! Inline span handling for paragraph text.
//!
//! Two granularities are offered because the two renderers consume inline formatting
//! differently:
//!
//! - [`tokenize_inline`] splits a paragraph into [`StyledRun`]s so the DOCX renderer can mix
//!   plain, bold and italic text within one paragraph.
//! - [`strip_markers`] and [`line_style`] serve the PDF renderer, which draws a whole block in a
//!   single font and therefore only needs the de-marked text plus one style for the line.
//!
//! The model is two-level and non-nested: a `**bold**` span is never re-scanned for italics, and a
//! run is never bold and italic at once. Asterisks that do not close a pair are kept literally.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static BOLD_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*.*?\*\*").expect("valid bold span pattern"));

static ITALIC_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*[^*]+\*").expect("valid italic span pattern"));

/// A contiguous piece of paragraph text with its emphasis flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        StyledRun {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        StyledRun {
            text: text.into(),
            bold: true,
            italic: false,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        StyledRun {
            text: text.into(),
            bold: false,
            italic: true,
        }
    }
}

/// Font style chosen for a whole line by the paginated renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LineStyle {
    Regular,
    Bold,
    Italic,
}

/// Splits paragraph text into ordered styled runs.
///
/// Bold spans are found first; only the text between them is scanned for italic spans. Empty
/// runs are dropped, so `****` contributes nothing.
pub fn tokenize_inline(text: &str) -> Vec<StyledRun> {
    let mut runs = Vec::new();

    for (segment, is_bold) in split_keep(&BOLD_SPAN, text) {
        if is_bold {
            push_run(&mut runs, StyledRun::bold(&segment[2..segment.len() - 2]));
            continue;
        }

        for (piece, is_italic) in split_keep(&ITALIC_SPAN, segment) {
            if is_italic && !piece.starts_with("**") {
                push_run(&mut runs, StyledRun::italic(&piece[1..piece.len() - 1]));
            } else {
                push_run(&mut runs, StyledRun::plain(piece));
            }
        }
    }

    runs
}

fn push_run(runs: &mut Vec<StyledRun>, run: StyledRun) {
    if !run.text.is_empty() {
        runs.push(run);
    }
}

/// Splits `text` around every match of `re`, yielding `(segment, matched)` pairs in order.
fn split_keep<'t>(re: &Regex, text: &'t str) -> Vec<(&'t str, bool)> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            parts.push((&text[last..m.start()], false));
        }
        parts.push((m.as_str(), true));
        last = m.end();
    }
    if last < text.len() {
        parts.push((&text[last..], false));
    }
    parts
}

/// Byte ranges `(open, close)` of single-asterisk italic spans that do not touch another `*`.
///
/// `open` and `close` index the two delimiting asterisks. Scanning restarts one byte after a
/// rejected opener, so `**a*` yields nothing while `x *a* y` yields one span.
fn italic_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'*' || (i > 0 && bytes[i - 1] == b'*') {
            i += 1;
            continue;
        }
        let close = bytes[i + 1..].iter().position(|&b| b == b'*').map(|p| i + 1 + p);
        match close {
            Some(close)
                if close > i + 1 && bytes.get(close + 1).map_or(true, |&b| b != b'*') =>
            {
                spans.push((i, close));
                i = close + 1;
            }
            _ => i += 1,
        }
    }

    spans
}

/// Removes complete emphasis markers from a line, keeping the enclosed text.
///
/// `**x**` pairs are unwrapped first (shortest match), then single-asterisk spans that are not
/// adjacent to another asterisk. Orphaned asterisks stay in place.
pub fn strip_markers(text: &str) -> String {
    let unbolded = BOLD_SPAN.replace_all(text, |caps: &regex::Captures| {
        let m = &caps[0];
        m[2..m.len() - 2].to_string()
    });

    let mut out = String::with_capacity(unbolded.len());
    let mut last = 0;
    for (open, close) in italic_spans(&unbolded) {
        out.push_str(&unbolded[last..open]);
        out.push_str(&unbolded[open + 1..close]);
        last = close + 1;
    }
    out.push_str(&unbolded[last..]);
    out
}

/// Chooses the single font style the paginated renderer applies to a whole paragraph line.
///
/// Any `**` makes the line bold, even when unpaired; otherwise a valid single-asterisk span makes
/// it italic.
pub fn line_style(raw: &str) -> LineStyle {
    if raw.contains("**") {
        LineStyle::Bold
    } else if !italic_spans(raw).is_empty() {
        LineStyle::Italic
    } else {
        LineStyle::Regular
    }
}
