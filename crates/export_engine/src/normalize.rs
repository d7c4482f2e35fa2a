//! HTML clean-up applied to exported documents before Markdown conversion.
//!
//! The exported markup is parsed once into a [`BodyTree`] and an ordered list
//! of [`RewritePass`]es edits it in place through the underlying `ego_tree`
//! arena. Each pass consumes a tree and returns it, so passes can be tested
//! and reordered independently. The first remaining element is then split off
//! as the document title and the rest of `<body>` is serialized back to HTML
//! with scraper's own serializer.

use ego_tree::{NodeId, NodeRef};
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector, StrTendril};
use url::Url;

use crate::types::ConversionError;

/// Query parameter carrying the real destination of a redirect-wrapped link.
const REDIRECT_TARGET_PARAM: &str = "q";

/// A parsed document plus the node whose children are the exported content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyTree {
    document: Html,
    body: NodeId,
}

impl BodyTree {
    /// Parses a full document (or fragment) and keeps only what is inside `<body>`.
    /// Comments and processing instructions in the body are dropped.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let body = Selector::parse("body")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .unwrap_or_else(|| document.root_element())
            .id();
        let mut tree = Self { document, body };
        let markup_only = tree.node_ids(|node| {
            matches!(node.value(), Node::Comment(_) | Node::ProcessingInstruction(_))
        });
        tree.detach_all(markup_only);
        tree
    }

    pub fn to_html(&self) -> String {
        self.body_ref().map(|body| body.inner_html()).unwrap_or_default()
    }

    pub fn first_element(&self) -> Option<&Element> {
        self.first_child_element().map(|element| element.value())
    }

    /// Every element below `<body>` in document order, parents before children.
    pub fn elements(&self) -> Vec<&Element> {
        self.body_ref()
            .map(|body| {
                body.descendants()
                    .skip(1)
                    .filter_map(|node| node.value().as_element())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn body_ref(&self) -> Option<ElementRef<'_>> {
        self.document.tree.get(self.body).and_then(ElementRef::wrap)
    }

    fn first_child_element(&self) -> Option<ElementRef<'_>> {
        self.body_ref()?.children().find_map(ElementRef::wrap)
    }

    /// Ids of the nodes below `<body>` accepted by `keep`, in document order.
    fn node_ids(&self, keep: impl Fn(NodeRef<'_, Node>) -> bool) -> Vec<NodeId> {
        let Some(body) = self.document.tree.get(self.body) else {
            return Vec::new();
        };
        body.descendants()
            .skip(1)
            .filter(|node| keep(*node))
            .map(|node| node.id())
            .collect()
    }

    fn element_ids(&self, name: &str) -> Vec<NodeId> {
        self.node_ids(|node| is_element(node, name))
    }

    fn detach_all(&mut self, ids: Vec<NodeId>) {
        for id in ids {
            if let Some(mut node) = self.document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    fn edit_element(&mut self, id: NodeId, edit: impl FnOnce(&mut Element)) {
        if let Some(mut node) = self.document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                edit(element);
            }
        }
    }
}

fn is_element(node: NodeRef<'_, Node>, name: &str) -> bool {
    matches!(node.value(), Node::Element(element) if element.name() == name)
}

/// A stateless tree rewrite.
pub trait RewritePass: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, tree: BodyTree) -> BodyTree;
}

/// Removes one attribute from every element.
#[derive(Debug, Clone, Copy)]
pub struct StripAttribute(pub &'static str);

impl RewritePass for StripAttribute {
    fn name(&self) -> &'static str {
        "strip-attribute"
    }

    fn apply(&self, mut tree: BodyTree) -> BodyTree {
        for id in tree.node_ids(|node| node.value().is_element()) {
            tree.edit_element(id, |element| {
                element
                    .attrs
                    .retain(|(name, _)| !(*name.local).eq_ignore_ascii_case(self.0));
            });
        }
        tree
    }
}

/// Drops `<p><span></span></p>`, the editor's representation of an empty line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DropEmptyParagraphs;

impl RewritePass for DropEmptyParagraphs {
    fn name(&self) -> &'static str {
        "drop-empty-paragraphs"
    }

    fn apply(&self, mut tree: BodyTree) -> BodyTree {
        let placeholders = tree.node_ids(is_empty_placeholder);
        tree.detach_all(placeholders);
        tree
    }
}

fn is_empty_placeholder(node: NodeRef<'_, Node>) -> bool {
    if !is_element(node, "p") {
        return false;
    }
    let mut children = node.children();
    match (children.next(), children.next()) {
        (Some(only), None) => is_element(only, "span") && !only.has_children(),
        _ => false,
    }
}

/// Replaces every `<span>` with its children.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnwrapSpans;

impl RewritePass for UnwrapSpans {
    fn name(&self) -> &'static str {
        "unwrap-spans"
    }

    fn apply(&self, mut tree: BodyTree) -> BodyTree {
        // Outer spans come first, so an inner span is moved up before it is unwrapped.
        for id in tree.element_ids("span") {
            let children: Vec<NodeId> = match tree.document.tree.get(id) {
                Some(span) => span.children().map(|child| child.id()).collect(),
                None => continue,
            };
            if let Some(mut span) = tree.document.tree.get_mut(id) {
                if span.parent().is_none() {
                    continue;
                }
                for child in children {
                    span.insert_id_before(child);
                }
                span.detach();
            }
        }
        tree
    }
}

/// Rewrites `<a href="https://www.google.com/url?q=DEST&...">` to `href="DEST"`.
///
/// Links without a `q` parameter, and relative links, keep their href.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnwrapRedirectLinks;

impl RewritePass for UnwrapRedirectLinks {
    fn name(&self) -> &'static str {
        "unwrap-redirect-links"
    }

    fn apply(&self, mut tree: BodyTree) -> BodyTree {
        for id in tree.element_ids("a") {
            tree.edit_element(id, |link| {
                let Some(target) = link.attr("href").and_then(redirect_target) else {
                    return;
                };
                for (name, value) in link.attrs.iter_mut() {
                    if name.ns.is_empty() && &*name.local == "href" {
                        *value = StrTendril::from(target.as_str());
                    }
                }
            });
        }
        tree
    }
}

/// Destination carried in the `q` parameter of a redirect URL.
pub fn redirect_target(href: &str) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    let url = Url::parse(trimmed).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == REDIRECT_TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Title plus the HTML that remains after the title element is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBody {
    pub title: String,
    pub html: String,
}

/// Splits off the first element of the body; its trimmed text is the title.
pub fn extract_title(mut tree: BodyTree) -> Result<(String, BodyTree), ConversionError> {
    let (id, title) = tree
        .first_child_element()
        .map(|element| (element.id(), element.text().collect::<String>()))
        .ok_or(ConversionError::EmptyBody)?;
    tree.detach_all(vec![id]);
    Ok((title.trim().to_string(), tree))
}

pub struct Normalizer {
    passes: Vec<Box<dyn RewritePass>>,
}

impl Normalizer {
    pub fn new(passes: Vec<Box<dyn RewritePass>>) -> Self {
        Self { passes }
    }

    /// The clean-up sequence for editor exports. Order matters: empty
    /// paragraphs are only recognisable before spans are unwrapped.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(StripAttribute("style")),
            Box::new(StripAttribute("id")),
            Box::new(DropEmptyParagraphs),
            Box::new(UnwrapSpans),
            Box::new(UnwrapRedirectLinks),
        ])
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Runs the passes without extracting a title.
    pub fn rewrite(&self, tree: BodyTree) -> BodyTree {
        self.passes.iter().fold(tree, |tree, pass| pass.apply(tree))
    }

    pub fn normalize(&self, html: &str) -> Result<NormalizedBody, ConversionError> {
        let tree = self.rewrite(BodyTree::parse(html));
        let (title, rest) = extract_title(tree)?;
        Ok(NormalizedBody {
            title,
            html: rest.to_html(),
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::standard()
    }
}
