use assignment2doc::config::LayoutStyle;
use assignment2doc::{OutputFormat, Payload};
use std::io::{Cursor, Read};
use tempfile::tempdir;

const EXAMPLE_PAYLOAD: &str = r##"{
    "topic": "Photosynthesis",
    "subject": "Biology",
    "level": "Grade 8",
    "content": "# Overview\nPlants use **sunlight** to make *food*.\n- Step one\n- Step two",
    "id": "abc"
}"##;

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

fn document_xml(json: &str) -> String {
    let payload = Payload::from_json(json).unwrap();
    let bytes =
        assignment2doc::render_into_bytes(&payload, OutputFormat::Docx, &LayoutStyle::default())
            .unwrap();
    read_part(&bytes, "word/document.xml")
}

/// Text of every `<w:t>` in document order, paired with the run's bold and italic flags.
fn runs(xml: &str) -> Vec<(String, bool, bool)> {
    let mut out = Vec::new();
    for chunk in xml.split("<w:r>").skip(1) {
        let run = chunk.split("</w:r>").next().unwrap();
        let start = run.find("<w:t xml:space=\"preserve\">").unwrap() + 26;
        let end = run.find("</w:t>").unwrap();
        out.push((
            run[start..end].to_string(),
            run.contains("<w:b/>"),
            run.contains("<w:i/>"),
        ));
    }
    out
}

#[test]
fn example_payload_structure() {
    let xml = document_xml(EXAMPLE_PAYLOAD);
    let r = runs(&xml);
    let expected: Vec<(String, bool, bool)> = vec![
        ("Photosynthesis", false, false),
        ("Subject: Biology", true, false),
        ("Level: Grade 8", true, false),
        ("Overview", false, false),
        ("Plants use ", false, false),
        ("sunlight", true, false),
        (" to make ", false, false),
        ("food", false, true),
        (".", false, false),
        ("Step one", false, false),
        ("Step two", false, false),
    ]
    .into_iter()
    .map(|(t, b, i)| (t.to_string(), b, i))
    .collect();
    assert_eq!(r, expected);

    assert!(xml.contains("<w:jc w:val=\"center\"/>"));
    assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/>"));
    assert_eq!(xml.matches("<w:pStyle w:val=\"ListBullet\"/>").count(), 2);
}

#[test]
fn bold_and_italic_never_overlap() {
    let xml = document_xml(r#"{"content":"**a *b* c** and *d* then **e**"}"#);
    for (text, bold, italic) in runs(&xml) {
        assert!(!(bold && italic), "run {:?} is both bold and italic", text);
    }
}

#[test]
fn orphan_marker_is_literal() {
    let xml = document_xml(r#"{"content":"5 * 3 = 15"}"#);
    assert!(runs(&xml).contains(&("5 * 3 = 15".to_string(), false, false)));
}

#[test]
fn image_directive_renders_nothing() {
    let xml = document_xml(r#"{"content":"[IMAGE: foo.png]"}"#);
    assert!(!xml.contains("foo.png"));
    assert!(!xml.contains("IMAGE"));
}

#[test]
fn files_named_after_id() {
    let dir = tempdir().unwrap();
    let style = LayoutStyle::default();

    let payload = Payload::from_json(EXAMPLE_PAYLOAD).unwrap();
    let name =
        assignment2doc::render_into_file(&payload, OutputFormat::Docx, &style, dir.path()).unwrap();
    assert_eq!(name, "generated_abc.docx");
    let bytes = std::fs::read(dir.path().join(&name)).unwrap();
    let core = read_part(&bytes, "docProps/core.xml");
    assert!(core.contains("<dc:title>Photosynthesis</dc:title>"));

    let payload = Payload::from_json(r#"{"topic":"No id"}"#).unwrap();
    let name =
        assignment2doc::render_into_file(&payload, OutputFormat::Docx, &style, dir.path()).unwrap();
    assert_eq!(name, "generated_temp.docx");
}
