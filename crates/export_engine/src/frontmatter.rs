use export_core::ConvertedDocument;
use serde_yaml::{Mapping, Value};

pub const DELIMITER: &str = "---";

#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("failed to serialize front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// `---\n<yaml>---\n<body>`, keys in the order given. Values are quoted by
/// the YAML serializer only where the format requires it.
pub fn serialize_front_matter<'a, I>(body: &str, metadata: I) -> Result<String, FrontMatterError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mapping: Mapping = metadata
        .into_iter()
        .map(|(key, value)| (Value::from(key), Value::from(value)))
        .collect();

    let mut doc = String::with_capacity(body.len() + 128);
    doc.push_str(DELIMITER);
    doc.push('\n');
    if !mapping.is_empty() {
        let yaml = serde_yaml::to_string(&mapping)?;
        doc.push_str(&yaml);
        if !yaml.ends_with('\n') {
            doc.push('\n');
        }
    }
    doc.push_str(DELIMITER);
    doc.push('\n');
    doc.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        doc.push('\n');
    }
    Ok(doc)
}

/// The `index.md` text for a converted document.
pub fn build_markdown_document(
    converted: &ConvertedDocument,
    created_date: &str,
    updated_date: &str,
) -> Result<String, FrontMatterError> {
    serialize_front_matter(
        &converted.body,
        [
            ("title", converted.title.as_str()),
            ("createdDate", created_date),
            ("updatedDate", updated_date),
        ],
    )
}
