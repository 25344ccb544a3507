//! HTML parsing into an arena DOM.
//!
//! The reference page is parsed once with html5ever into a [`Dom`]; every
//! later stage (detection, TOC extraction, splitting, rendering) reads that
//! tree by [`NodeId`] without copying it.

mod arena;
mod tree_sink;

pub use arena::{Attribute, Children, Descendants, Dom, Node, NodeData, NodeId};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::DomSink;

/// Parse an HTML string into a [`Dom`].
pub fn parse_html(html: &str) -> Dom {
    parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse raw document bytes, decoding them first.
///
/// UTF-8 is assumed; a `<meta charset>` declaration is honoured when the
/// bytes are not valid UTF-8, with Windows-1252 as the last resort.
pub fn parse_html_bytes(bytes: &[u8]) -> Dom {
    let hint = crate::util::extract_meta_charset(bytes);
    let html = crate::util::decode_text(bytes, hint.as_deref());
    parse_html(&html)
}
