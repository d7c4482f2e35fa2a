use std::sync::{Arc, Mutex};

use export_engine::{
    ConversionError, DocumentConverter, Html2MdRenderer, MarkdownRenderer, Normalizer,
};
use pretty_assertions::assert_eq;

/// Records what reaches the Markdown renderer.
#[derive(Clone, Default)]
struct RecordingRenderer {
    inputs: Arc<Mutex<Vec<String>>>,
}

impl MarkdownRenderer for RecordingRenderer {
    fn render(&self, html: &str) -> String {
        self.inputs.lock().unwrap().push(html.to_string());
        Html2MdRenderer.render(html)
    }
}

const EDITOR_EXPORT: &str = r#"<html><head><meta content="text/html; charset=UTF-8" http-equiv="content-type"><style type="text/css">.c0{color:#000000}</style></head><body class="c5 doc-content"><p class="c3 title" id="h.abc123"><span class="c2">Shipping the exporter</span></p><p class="c1"><span class="c0">We moved to </span><span class="c0 c4"><a class="c6" href="https://www.google.com/url?q=https://example.com&amp;sa=D&amp;source=editors&amp;ust=1700000000000000&amp;usg=AOvVaw0">example</a></span><span class="c0">&nbsp;today.</span></p><p class="c1 c7"><span class="c0"></span></p><p class="c1"><span style="font-weight:700" id="b1">Second paragraph</span></p></body></html>"#;

#[test]
fn title_is_extracted_and_not_repeated_in_body() {
    let converted = DocumentConverter::default()
        .convert("<h1>My Title</h1><p>content</p>")
        .unwrap();
    assert_eq!(converted.title, "My Title");
    assert_eq!(converted.body.trim(), "content");
    assert!(!converted.body.contains("My Title"));
}

#[test]
fn redirect_link_becomes_markdown_link_to_destination() {
    let converted = DocumentConverter::default().convert(EDITOR_EXPORT).unwrap();
    assert_eq!(converted.title, "Shipping the exporter");
    assert!(
        converted.body.contains("(https://example.com)"),
        "unexpected markdown: {:?}",
        converted.body
    );
    assert!(!converted.body.contains("google.com/url"));
    assert!(converted.body.contains("Second paragraph"));
}

#[test]
fn renderer_never_sees_style_id_or_spans() {
    let renderer = RecordingRenderer::default();
    let converter = DocumentConverter::new(Normalizer::standard(), renderer.clone());
    converter.convert(EDITOR_EXPORT).unwrap();

    let inputs = renderer.inputs.lock().unwrap();
    assert_eq!(inputs.len(), 1);
    let html = &inputs[0];
    assert!(!html.contains("style="), "style reached renderer: {html}");
    assert!(!html.contains(" id="), "id reached renderer: {html}");
    assert!(!html.contains("<span"), "span reached renderer: {html}");
    assert!(!html.contains("Shipping the exporter"));
}

#[test]
fn empty_placeholder_paragraph_leaves_no_trace() {
    let renderer = RecordingRenderer::default();
    let converter = DocumentConverter::new(Normalizer::standard(), renderer.clone());
    converter
        .convert("<p>Title</p><p>one</p><p><span></span></p><p>two</p>")
        .unwrap();

    let inputs = renderer.inputs.lock().unwrap();
    assert_eq!(inputs[0], "<p>one</p><p>two</p>");
}

#[test]
fn empty_document_is_a_conversion_error() {
    let err = DocumentConverter::default()
        .convert("<html><body>   </body></html>")
        .unwrap_err();
    assert_eq!(err, ConversionError::EmptyBody);
}

#[test]
fn body_has_no_leading_or_trailing_newlines() {
    let converted = DocumentConverter::default()
        .convert("<p>T</p><p>A</p><p>B</p>")
        .unwrap();
    assert!(!converted.body.starts_with('\n'));
    assert!(!converted.body.ends_with('\n'));
    assert!(converted.body.contains('A'));
    assert!(converted.body.contains('B'));
}

#[test]
fn conversion_is_deterministic() {
    let converter = DocumentConverter::default();
    let first = converter.convert(EDITOR_EXPORT).unwrap();
    let second = converter.convert(EDITOR_EXPORT).unwrap();
    assert_eq!(first, second);
}
