use export_core::ConvertedDocument;

use crate::normalize::Normalizer;
use crate::types::ConversionError;

pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, html: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdRenderer;

impl MarkdownRenderer for Html2MdRenderer {
    fn render(&self, html: &str) -> String {
        html2md::parse_html(html)
    }
}

/// Normalizes exported HTML, takes the title from it and renders the rest as Markdown.
pub struct DocumentConverter {
    normalizer: Normalizer,
    renderer: Box<dyn MarkdownRenderer>,
}

impl DocumentConverter {
    pub fn new(normalizer: Normalizer, renderer: impl MarkdownRenderer + 'static) -> Self {
        Self {
            normalizer,
            renderer: Box::new(renderer),
        }
    }

    pub fn convert(&self, html: &str) -> Result<ConvertedDocument, ConversionError> {
        let normalized = self.normalizer.normalize(html)?;
        let markdown = self.renderer.render(&normalized.html);
        Ok(ConvertedDocument {
            title: normalized.title,
            body: markdown.trim_matches('\n').to_string(),
        })
    }
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self::new(Normalizer::standard(), Html2MdRenderer)
    }
}
