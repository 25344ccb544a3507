//! Structural era detection.
//!
//! Reference pages have been generated by at least four different
//! templates. Each era is recognised by the element that holds its
//! table of contents; the per-era extraction rules live in a static
//! [`RuleSet`] table indexed by [`SchemaVariant`].

use std::fmt;

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};

/// Structural era of a reference page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVariant {
    /// `<nav aria-labelledby="table-of-contents">`, plain heading ids.
    Modern,
    /// `<div id="toc">`, TOC links carry a `toc-` prefix.
    Legacy,
    /// `<div id="index">`, headings carry the `toc-` prefix themselves.
    Older,
    /// `<div id="nav">`, loosely wrapped TOC list.
    Ancient,
}

impl SchemaVariant {
    /// Detection order: newest markers first, since older markers are
    /// broader and would also match some newer pages.
    pub const ALL: [SchemaVariant; 4] = [
        SchemaVariant::Modern,
        SchemaVariant::Legacy,
        SchemaVariant::Older,
        SchemaVariant::Ancient,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVariant::Modern => "modern",
            SchemaVariant::Legacy => "legacy",
            SchemaVariant::Older => "older",
            SchemaVariant::Ancient => "ancient",
        }
    }

    /// Extraction rules for this era.
    pub fn rules(self) -> &'static RuleSet {
        &RULES[self as usize]
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an era marks its navigation container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMarker {
    /// An element of `tag` whose `name` attribute equals `value`.
    Attribute {
        tag: &'static str,
        name: &'static str,
        value: &'static str,
    },
    /// A block container whose `id` equals the given value.
    Id(&'static str),
}

/// Per-era extraction rules.
#[derive(Debug)]
pub struct RuleSet {
    pub variant: SchemaVariant,
    pub marker: ContainerMarker,
    /// Prefix carried by TOC hrefs (and possibly heading ids) that must be
    /// stripped to obtain the stable section id.
    pub id_prefix: Option<&'static str>,
    /// Heading tags that may start a top-level section.
    pub top_level_headings: &'static [&'static str],
}

/// Tags accepted as the holder of an id-marked navigation container.
const CONTAINER_TAGS: &[&str] = &["div", "nav", "section", "aside"];

static RULES: [RuleSet; 4] = [
    RuleSet {
        variant: SchemaVariant::Modern,
        marker: ContainerMarker::Attribute {
            tag: "nav",
            name: "aria-labelledby",
            value: "table-of-contents",
        },
        id_prefix: None,
        top_level_headings: &["h2", "h1"],
    },
    RuleSet {
        variant: SchemaVariant::Legacy,
        marker: ContainerMarker::Id("toc"),
        id_prefix: Some("toc-"),
        top_level_headings: &["h1", "h2"],
    },
    RuleSet {
        variant: SchemaVariant::Older,
        marker: ContainerMarker::Id("index"),
        id_prefix: Some("toc-"),
        top_level_headings: &["h2", "h1"],
    },
    RuleSet {
        variant: SchemaVariant::Ancient,
        marker: ContainerMarker::Id("nav"),
        id_prefix: Some("toc-"),
        top_level_headings: &["h2", "h1"],
    },
];

impl RuleSet {
    /// Find this era's navigation container in `dom`.
    pub fn find_container(&self, dom: &Dom) -> Option<NodeId> {
        match self.marker {
            ContainerMarker::Attribute { tag, name, value } => {
                dom.find(|dom, id| dom.tag_is(id, tag) && dom.attr(id, name) == Some(value))
            }
            ContainerMarker::Id(id) => dom
                .elements_with_id(id)
                .iter()
                .copied()
                .find(|&node| dom.tag(node).is_some_and(|t| CONTAINER_TAGS.contains(&t))),
        }
    }

    /// Strip this era's id prefix, if present.
    pub fn strip_prefix<'a>(&self, id: &'a str) -> &'a str {
        match self.id_prefix {
            Some(prefix) => id.strip_prefix(prefix).unwrap_or(id),
            None => id,
        }
    }

    pub fn is_top_level_heading(&self, tag: &str) -> bool {
        self.top_level_headings.contains(&tag)
    }
}

/// Result of schema detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub variant: SchemaVariant,
    /// The navigation container that matched.
    pub container: NodeId,
}

/// Classify `dom` into a [`SchemaVariant`].
///
/// Tests each era's marker in [`SchemaVariant::ALL`] order and returns the
/// first match.
pub fn detect(dom: &Dom) -> Result<Detection> {
    for variant in SchemaVariant::ALL {
        if let Some(container) = variant.rules().find_container(dom) {
            tracing::debug!(%variant, "detected document schema");
            return Ok(Detection { variant, container });
        }
    }
    Err(Error::UnrecognizedSchema)
}
