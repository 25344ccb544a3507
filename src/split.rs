//! Section boundary computation.
//!
//! A section is its heading plus the siblings that follow it, up to the next
//! sibling that is (or holds) another section's heading. Sections are kept
//! as lists of node ids into the shared [`Dom`] rather than detached
//! subtrees.

use std::collections::HashSet;

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::links::TOC_ANCHOR_PREFIX;
use crate::schema::{Detection, RuleSet};
use crate::toc::{Toc, TocEntry};

/// A top-level section ready for conversion.
#[derive(Debug, Clone)]
pub struct Section {
    pub entry: TocEntry,
    pub filename: String,
    /// Contiguous sibling run; the first root is the section heading.
    pub roots: Vec<NodeId>,
}

impl Section {
    pub fn heading(&self) -> Option<NodeId> {
        self.roots.first().copied()
    }
}

/// Split the document into one [`Section`] per top-level TOC entry.
pub fn split(dom: &Dom, detection: &Detection, toc: &Toc) -> Result<Vec<Section>> {
    let locator = HeadingLocator {
        dom,
        rules: detection.variant.rules(),
        container: detection.container,
    };

    let mut headings = Vec::with_capacity(toc.len());
    let mut used = HashSet::new();
    for section in toc.iter() {
        let id = &section.entry.id;
        let heading = locator
            .locate(id)
            .filter(|h| used.insert(*h))
            .ok_or_else(|| Error::SectionExtraction { id: id.clone() })?;
        headings.push(heading);
    }

    // Every node that is or contains a section heading ends a run.
    let mut boundaries = HashSet::new();
    for &heading in &headings {
        let mut cur = Some(heading);
        while let Some(node) = cur {
            if !boundaries.insert(node) {
                break;
            }
            cur = dom.parent(node);
        }
    }

    let sections: Vec<Section> = toc
        .iter()
        .zip(&headings)
        .map(|(toc_section, &heading)| {
            let mut roots = vec![heading];
            let mut cur = dom.next_sibling(heading);
            while let Some(node) = cur {
                if boundaries.contains(&node) {
                    break;
                }
                roots.push(node);
                cur = dom.next_sibling(node);
            }
            Section {
                entry: toc_section.entry.clone(),
                filename: toc_section.filename.clone(),
                roots,
            }
        })
        .collect();

    tracing::debug!(sections = sections.len(), "split document into sections");
    Ok(sections)
}

struct HeadingLocator<'a> {
    dom: &'a Dom,
    rules: &'static RuleSet,
    container: NodeId,
}

impl HeadingLocator<'_> {
    /// Find the heading for section `id`: by id, then by prefixed id, then
    /// by an anchor link inside a heading.
    fn locate(&self, id: &str) -> Option<NodeId> {
        if let Some(found) = self.by_id(id) {
            return Some(found);
        }
        if let Some(prefix) = self.rules.id_prefix
            && let Some(found) = self.by_id(&format!("{prefix}{id}"))
        {
            return Some(found);
        }
        self.by_anchor(id)
    }

    fn is_candidate(&self, node: NodeId) -> bool {
        self.dom.heading_level(node).is_some()
            && !self.dom.is_inclusive_ancestor(self.container, node)
    }

    /// Pick among candidates, preferring the era's top-level heading tags.
    fn prefer_top_level(&self, candidates: impl Iterator<Item = NodeId>) -> Option<NodeId> {
        let mut fallback = None;
        for node in candidates {
            if self.dom.tag(node).is_some_and(|t| self.rules.is_top_level_heading(t)) {
                return Some(node);
            }
            fallback.get_or_insert(node);
        }
        fallback
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.prefer_top_level(
            self.dom
                .elements_with_id(id)
                .iter()
                .copied()
                .filter(|&n| self.is_candidate(n)),
        )
    }

    fn by_anchor(&self, id: &str) -> Option<NodeId> {
        let plain = format!("#{id}");
        let prefixed = format!("#{TOC_ANCHOR_PREFIX}{id}");
        let dom = self.dom;
        let headings = dom
            .descendants(dom.document())
            .filter(|&n| self.is_candidate(n))
            .filter(|&n| {
                dom.descendants(n).any(|d| {
                    dom.tag_is(d, "a")
                        && dom
                            .attr(d, "href")
                            .is_some_and(|h| h == plain || h == prefixed)
                })
            });
        self.prefer_top_level(headings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use crate::dom::parse_html;
    use crate::schema::detect;
    use crate::toc::extract;

    fn split_html(html: &str) -> (crate::dom::Dom, Result<Vec<Section>>) {
        let dom = parse_html(html);
        let detection = detect(&dom).unwrap();
        let (toc, _) = extract(&dom, &detection, &ConvertConfig::default()).unwrap();
        let sections = split(&dom, &detection, &toc);
        (dom, sections)
    }

    fn tags(dom: &Dom, section: &Section) -> Vec<String> {
        section
            .roots
            .iter()
            .filter_map(|&r| dom.tag(r).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_split_modern_runs() {
        let (dom, sections) = split_html(
            r##"<nav aria-labelledby="table-of-contents"><ul>
                <li><a href="#A">A</a></li><li><a href="#B">B</a></li>
            </ul></nav>
            <div id="contents">
              <h2 id="A">A</h2><p>one</p><h3 id="A-sub">Sub</h3><p>two</p>
              <h2 id="B">B</h2><pre>code</pre>
            </div>"##,
        );
        let sections = sections.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(tags(&dom, &sections[0]), ["h2", "p", "h3", "p"]);
        assert_eq!(tags(&dom, &sections[1]), ["h2", "pre"]);
        assert_eq!(dom.element_id(sections[1].heading().unwrap()), Some("B"));
    }

    #[test]
    fn test_split_stops_at_wrapper_holding_next_heading() {
        let (dom, sections) = split_html(
            r##"<nav aria-labelledby="table-of-contents"><ul>
                <li><a href="#A">A</a></li><li><a href="#B">B</a></li>
            </ul></nav>
            <main><h2 id="A">A</h2><p>one</p><div><h2 id="B">B</h2><p>two</p></div></main>"##,
        );
        let sections = sections.unwrap();
        assert_eq!(tags(&dom, &sections[0]), ["h2", "p"]);
        assert_eq!(tags(&dom, &sections[1]), ["h2", "p"]);
    }

    #[test]
    fn test_older_prefixed_heading_ids() {
        let (dom, sections) = split_html(
            r##"<div id="index"><ul><li><a href="#toc-Intro">Intro</a></li></ul></div>
            <h2 id="toc-Intro">Intro</h2><p>text</p>"##,
        );
        let sections = sections.unwrap();
        assert_eq!(sections[0].entry.id, "Intro");
        assert_eq!(dom.element_id(sections[0].heading().unwrap()), Some("toc-Intro"));
    }

    #[test]
    fn test_heading_found_by_anchor_link() {
        let (dom, sections) = split_html(
            r##"<div id="nav"><ul><li><a href="#toc-Types">Types</a></li></ul></div>
            <h1><a href="#toc-Types">Types</a></h1><p>body</p>"##,
        );
        let sections = sections.unwrap();
        assert_eq!(tags(&dom, &sections[0]), ["h1", "p"]);
    }

    #[test]
    fn test_nav_links_are_not_headings() {
        let (_, sections) = split_html(
            r##"<nav aria-labelledby="table-of-contents"><h2 id="Gone">Gone</h2>
            <ul><li><a href="#Gone">Gone</a></li></ul></nav><p>nothing</p>"##,
        );
        assert!(matches!(sections, Err(Error::SectionExtraction { id }) if id == "Gone"));
    }

    #[test]
    fn test_mixed_heading_levels() {
        let (dom, sections) = split_html(
            r##"<div id="toc"><ul>
                <li><a href="#toc-One">One</a></li><li><a href="#toc-Two">Two</a></li>
            </ul></div>
            <h1 id="One">One</h1><p>a</p><h2 id="Two">Two</h2><p>b</p>"##,
        );
        let sections = sections.unwrap();
        assert_eq!(tags(&dom, &sections[0]), ["h1", "p"]);
        assert_eq!(tags(&dom, &sections[1]), ["h2", "p"]);
    }
}
