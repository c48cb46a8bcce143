//! Pre-flight checks on a payload.
//!
//! Nothing here stops a render. The findings describe content that will come out differently
//! than the author probably expects, such as characters the PDF fonts cannot draw or emphasis
//! markers left unbalanced.

use crate::fonts::unsupported_chars;
use crate::payload::Payload;

/// Titles longer than this no longer fit on one line of the PDF header.
pub const MAX_TOPIC_CHARS: usize = 180;
pub const MAX_SUBJECT_CHARS: usize = 80;

/// Returns human-readable warnings for the payload, in content order.
///
/// # Example
/// ```rust
/// use assignment2doc::{validation::validate_payload, Payload};
///
/// let payload = Payload::from_json(r#"{"content":"an *orphan marker"}"#).unwrap();
/// let warnings = validate_payload(&payload);
/// assert_eq!(warnings.len(), 1);
/// assert!(warnings[0].contains("line 1"));
/// ```
pub fn validate_payload(payload: &Payload) -> Vec<String> {
    let mut warnings = Vec::new();

    if payload.content().trim().is_empty() {
        warnings.push("Content is empty; only the title block will be rendered".to_string());
    }

    let topic_len = payload.topic().chars().count();
    if topic_len > MAX_TOPIC_CHARS {
        warnings.push(format!(
            "Topic is {} characters long (over {}); the PDF title will run past the page edge",
            topic_len, MAX_TOPIC_CHARS
        ));
    }
    if let Some(subject) = &payload.subject {
        let subject_len = subject.chars().count();
        if subject_len > MAX_SUBJECT_CHARS {
            warnings.push(format!(
                "Subject is {} characters long (over {})",
                subject_len, MAX_SUBJECT_CHARS
            ));
        }
    }

    let header_text = [
        Some(payload.topic()),
        payload.subject.as_deref(),
        payload.level.as_deref(),
    ];
    let mut missing: Vec<char> = Vec::new();
    for text in header_text.iter().flatten() {
        collect_unsupported(text, &mut missing);
    }
    collect_unsupported(payload.content(), &mut missing);
    if !missing.is_empty() {
        let listed: String = missing.iter().map(|c| format!(" '{}'", c)).collect();
        warnings.push(format!(
            "The PDF fonts cannot draw{}; they will appear as '?'",
            listed
        ));
    }

    for (index, line) in payload.content().split('\n').enumerate() {
        if line.matches('*').count() % 2 == 1 {
            warnings.push(format!(
                "line {}: unbalanced '*' marker will be printed literally",
                index + 1
            ));
        }
    }

    warnings
}

fn collect_unsupported(text: &str, into: &mut Vec<char>) {
    for c in unsupported_chars(text) {
        if !into.contains(&c) {
            into.push(c);
        }
    }
}
