//! Table-of-contents extraction.
//!
//! The navigation container found by [`crate::schema::detect`] holds a
//! (possibly nested) list of in-page links. Each top-level item becomes one
//! output file; nested items become [`TocEntry::children`] that live in
//! their parent's file.

use std::collections::HashSet;

use percent_encoding::percent_decode_str;

use crate::config::ConvertConfig;
use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::links::SectionMapBuilder;
use crate::markdown::FilenameAllocator;
use crate::schema::{Detection, RuleSet, SchemaVariant};
use crate::util::collapse_whitespace;

/// One entry of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Anchor id of the section heading, with the era's prefix stripped.
    pub id: String,
    pub title: String,
    /// 0 for top-level entries.
    pub depth: usize,
    /// Position among top-level entries. Nested entries share their
    /// top-level ancestor's order.
    pub order: usize,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    /// This entry and all nested entries, pre-order.
    pub fn walk(&self) -> Vec<&TocEntry> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// A top-level entry with its output file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocSection {
    pub entry: TocEntry,
    pub filename: String,
}

/// Extracted table of contents, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toc {
    pub variant: SchemaVariant,
    pub sections: Vec<TocSection>,
}

impl Toc {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TocSection> {
        self.sections.iter()
    }

    /// Every entry at every depth, paired with the file it lives in.
    pub fn entries(&self) -> impl Iterator<Item = (&TocEntry, &str)> {
        self.sections.iter().flat_map(|section| {
            section
                .entry
                .walk()
                .into_iter()
                .map(move |entry| (entry, section.filename.as_str()))
        })
    }
}

/// Read the table of contents out of `detection.container`.
///
/// Returns the TOC together with a builder already holding every entry's
/// id → file mapping.
pub fn extract(
    dom: &Dom,
    detection: &Detection,
    config: &ConvertConfig,
) -> Result<(Toc, SectionMapBuilder)> {
    let rules = detection.variant.rules();
    let mut extractor = Extractor {
        dom,
        rules,
        seen: HashSet::new(),
    };

    let top_level = match list_scope(dom, detection.container) {
        Some(scope) => extractor.read_list(scope, 0),
        None => Vec::new(),
    };

    if top_level.is_empty() {
        return Err(Error::EmptyToc {
            variant: detection.variant,
        });
    }

    let mut allocator = FilenameAllocator::new(config.extension.as_str());
    let mut builder = SectionMapBuilder::new();
    let mut sections = Vec::with_capacity(top_level.len());

    for (order, mut entry) in top_level.into_iter().enumerate() {
        set_order(&mut entry, order);
        let filename = allocator.allocate(order, &entry.title);
        for nested in entry.walk() {
            builder.insert(nested.id.as_str(), filename.as_str());
        }
        sections.push(TocSection { entry, filename });
    }

    tracing::debug!(
        variant = %detection.variant,
        sections = sections.len(),
        "extracted table of contents"
    );

    Ok((
        Toc {
            variant: detection.variant,
            sections,
        },
        builder,
    ))
}

fn set_order(entry: &mut TocEntry, order: usize) {
    entry.order = order;
    for child in &mut entry.children {
        set_order(child, order);
    }
}

fn is_list(dom: &Dom, id: NodeId) -> bool {
    matches!(dom.tag(id), Some("ul" | "ol"))
}

/// The element whose `li` children are the top-level entries.
fn list_scope(dom: &Dom, container: NodeId) -> Option<NodeId> {
    if dom.child_elements(container).any(|c| dom.tag_is(c, "li")) {
        return Some(container);
    }
    dom.find_in(container, |dom, id| id != container && is_list(dom, id))
}

struct Extractor<'a> {
    dom: &'a Dom,
    rules: &'static RuleSet,
    seen: HashSet<String>,
}

impl Extractor<'_> {
    fn read_list(&mut self, list: NodeId, depth: usize) -> Vec<TocEntry> {
        let items: Vec<NodeId> = self
            .dom
            .child_elements(list)
            .filter(|&c| self.dom.tag_is(c, "li"))
            .collect();

        let mut entries = Vec::new();
        for item in items {
            let (link, sublists) = self.scan_item(item);
            let Some(link) = link else {
                continue;
            };
            let Some(id) = self.anchor_id(link) else {
                continue;
            };
            if !self.seen.insert(id.clone()) {
                tracing::debug!(%id, "skipping duplicate table of contents entry");
                continue;
            }

            let title = collapse_whitespace(&self.dom.text_content(link))
                .trim()
                .to_string();
            let mut children = Vec::new();
            for sublist in sublists {
                children.extend(self.read_list(sublist, depth + 1));
            }

            entries.push(TocEntry {
                id,
                title,
                depth,
                order: 0,
                children,
            });
        }
        entries
    }

    /// The item's own link (first `a[href^="#"]` outside nested lists) and
    /// its nested lists.
    fn scan_item(&self, item: NodeId) -> (Option<NodeId>, Vec<NodeId>) {
        let mut link = None;
        let mut sublists = Vec::new();
        let mut stack: Vec<NodeId> = self.dom.children(item).collect();
        stack.reverse();

        while let Some(node) = stack.pop() {
            if is_list(self.dom, node) {
                sublists.push(node);
                continue;
            }
            if link.is_none()
                && self.dom.tag_is(node, "a")
                && self.dom.attr(node, "href").is_some_and(|h| h.starts_with('#'))
            {
                link = Some(node);
            }
            let mut children: Vec<NodeId> = self.dom.children(node).collect();
            children.reverse();
            stack.extend(children);
        }

        (link, sublists)
    }

    fn anchor_id(&self, link: NodeId) -> Option<String> {
        let fragment = self.dom.attr(link, "href")?.strip_prefix('#')?;
        let decoded = percent_decode_str(fragment).decode_utf8_lossy();
        let id = self.rules.strip_prefix(&decoded);
        (!id.is_empty()).then(|| id.to_string())
    }
}
