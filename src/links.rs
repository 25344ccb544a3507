//! Cross-file link resolution.
//!
//! Converted sections still reference headings by their in-page anchors
//! (`[text](#Id)`). Once every section has a file name, the frozen
//! [`SectionMap`] tells the [`LinkResolver`] which file each id lives in, and
//! references are rewritten to `file#Id` (other file) or left as `#Id`
//! (same file).

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use crate::diagnostics::UnresolvedLinkWarning;
use crate::markdown::FenceState;

/// Prefix that TOC anchors put in front of section ids (`#toc-Foo`).
pub const TOC_ANCHOR_PREFIX: &str = "toc-";

/// `](#target)`: the tail of a markdown link whose destination is an
/// in-page anchor.
static ANCHOR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\(#([^)\s]+)\)").expect("anchor reference pattern is valid"));

/// Collects section ids while the table of contents is being read.
///
/// The only way to obtain a [`SectionMap`] is [`SectionMapBuilder::freeze`],
/// so link resolution cannot start before extraction is complete.
#[derive(Debug, Default)]
pub struct SectionMapBuilder {
    entries: HashMap<String, String>,
}

impl SectionMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `id` to `filename`. Returns false (and keeps the first mapping)
    /// if the id is already present.
    pub fn insert(&mut self, id: impl Into<String>, filename: impl Into<String>) -> bool {
        use std::collections::hash_map::Entry;
        match self.entries.entry(id.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(filename.into());
                true
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn freeze(self) -> SectionMap {
        SectionMap {
            entries: self.entries,
        }
    }
}

/// Immutable heading id → file name table covering every TOC entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    entries: HashMap<String, String>,
}

impl SectionMap {
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Ids mapped to `filename`.
    pub fn ids_in<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |(_, f)| *f == filename).map(|(id, _)| id)
    }

    /// Find the map entry for a reference target, trying the target as
    /// written, then percent-decoded, then without the TOC anchor prefix.
    /// Returns the canonical id and its file.
    pub fn lookup(&self, target: &str) -> Option<(&str, &str)> {
        let entry = |id: &str| self.entries.get_key_value(id).map(|(k, v)| (k.as_str(), v.as_str()));

        if let Some(found) = entry(target) {
            return Some(found);
        }

        let decoded = percent_decode_str(target).decode_utf8().ok();
        let decoded = decoded.as_deref().unwrap_or(target);
        if decoded != target
            && let Some(found) = entry(decoded)
        {
            return Some(found);
        }

        decoded.strip_prefix(TOC_ANCHOR_PREFIX).and_then(entry)
    }
}

/// Accumulates unresolved references, one warning per distinct id.
#[derive(Debug, Default)]
pub struct UnresolvedTracker {
    warnings: Vec<UnresolvedLinkWarning>,
    index: HashMap<String, usize>,
}

impl UnresolvedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &str, file: &str) {
        match self.index.get(id) {
            Some(&i) => self.warnings[i].occurrences += 1,
            None => {
                self.index.insert(id.to_string(), self.warnings.len());
                self.warnings.push(UnresolvedLinkWarning {
                    id: id.to_string(),
                    first_file: file.to_string(),
                    occurrences: 1,
                });
            }
        }
    }

    pub fn into_warnings(self) -> Vec<UnresolvedLinkWarning> {
        self.warnings
    }
}

/// Rewrites in-page anchor references against a frozen [`SectionMap`].
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'m> {
    map: &'m SectionMap,
}

impl<'m> LinkResolver<'m> {
    pub fn new(map: &'m SectionMap) -> Self {
        Self { map }
    }

    /// Rewrite every anchor reference in `text`, which is the content of
    /// `current_file`. Fenced code and inline code spans are left untouched.
    pub fn resolve_section(
        &self,
        current_file: &str,
        text: &str,
        unresolved: &mut UnresolvedTracker,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        let mut fences = FenceState::new();

        for line in text.split_inclusive('\n') {
            if fences.is_code_line(line) || !line.contains("](#") {
                out.push_str(line);
                continue;
            }
            let mut pos = 0;
            for span in code_spans(line) {
                out.push_str(&self.rewrite_anchors(&line[pos..span.start], current_file, unresolved));
                out.push_str(&line[span.clone()]);
                pos = span.end;
            }
            out.push_str(&self.rewrite_anchors(&line[pos..], current_file, unresolved));
        }

        out
    }

    fn rewrite_anchors<'t>(
        &self,
        prose: &'t str,
        current_file: &str,
        unresolved: &mut UnresolvedTracker,
    ) -> Cow<'t, str> {
        ANCHOR_REF.replace_all(prose, |caps: &Captures| {
            let target = &caps[1];
            match self.map.lookup(target) {
                Some((id, file)) if file == current_file => format!("](#{id})"),
                Some((id, file)) => format!("]({file}#{id})"),
                None => {
                    unresolved.record(target, current_file);
                    caps[0].to_string()
                }
            }
        })
    }

    /// Resolve a whole document: `(file, text)` pairs in section order.
    pub fn resolve_all<'a, I>(&self, sections: I) -> (Vec<String>, Vec<UnresolvedLinkWarning>)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut unresolved = UnresolvedTracker::new();
        let texts = sections
            .into_iter()
            .map(|(file, text)| self.resolve_section(file, text, &mut unresolved))
            .collect();
        (texts, unresolved.into_warnings())
    }
}

/// Byte ranges of the inline code spans in `line`, backticks included.
///
/// A span opens with a run of backticks and closes at the next run of the
/// same length. An opening run with no matching close is plain text.
fn code_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let tick_run = |from: usize| bytes[from..].iter().take_while(|&&b| b == b'`').count();

    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        let ticks = tick_run(i);
        i += ticks;

        let mut j = i;
        while j < bytes.len() {
            if bytes[j] != b'`' {
                j += 1;
                continue;
            }
            let run = tick_run(j);
            j += run;
            if run == ticks {
                spans.push(start..j);
                i = j;
                break;
            }
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SectionMap {
        let mut builder = SectionMapBuilder::new();
        builder.insert("Foo", "01-foo.md");
        builder.insert("Foo-Details", "01-foo.md");
        builder.insert("Bar", "02-bar.md");
        builder.insert("@import", "03-builtins.md");
        builder.freeze()
    }

    fn resolve(file: &str, text: &str) -> (String, Vec<UnresolvedLinkWarning>) {
        let map = map();
        let resolver = LinkResolver::new(&map);
        let mut tracker = UnresolvedTracker::new();
        let out = resolver.resolve_section(file, text, &mut tracker);
        (out, tracker.into_warnings())
    }

    #[test]
    fn test_builder_keeps_first_mapping() {
        let mut builder = SectionMapBuilder::new();
        assert!(builder.insert("A", "00-a.md"));
        assert!(!builder.insert("A", "01-b.md"));
        assert!(builder.contains("A"));
        assert!(!builder.contains("B"));
        assert_eq!(builder.freeze().get("A"), Some("00-a.md"));
    }

    #[test]
    fn test_same_file_reference_stays_bare() {
        let (out, warnings) = resolve("01-foo.md", "see [Foo](#Foo) and [details](#Foo-Details)");
        assert_eq!(out, "see [Foo](#Foo) and [details](#Foo-Details)");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_cross_file_reference_gets_filename() {
        let (out, _) = resolve("01-foo.md", "see [Bar](#Bar).");
        assert_eq!(out, "see [Bar](02-bar.md#Bar).");
    }

    #[test]
    fn test_toc_prefixed_and_encoded_targets() {
        let (out, _) = resolve("01-foo.md", "[a](#toc-Bar) [b](#%40import) [c](#toc-Foo)");
        assert_eq!(out, "[a](02-bar.md#Bar) [b](03-builtins.md#@import) [c](#Foo)");
    }

    #[test]
    fn test_unresolved_left_unchanged_with_one_warning() {
        let (out, warnings) = resolve("01-foo.md", "[x](#MissingId) and again [y](#MissingId)");
        assert_eq!(out, "[x](#MissingId) and again [y](#MissingId)");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].id, "MissingId");
        assert_eq!(warnings[0].first_file, "01-foo.md");
        assert_eq!(warnings[0].occurrences, 2);
    }

    #[test]
    fn test_fenced_code_is_not_rewritten() {
        let text = "```\nlet s = \"[a](#Bar)\";\n```\n[a](#Bar)\n";
        let (out, _) = resolve("01-foo.md", text);
        assert_eq!(out, "```\nlet s = \"[a](#Bar)\";\n```\n[a](02-bar.md#Bar)\n");
    }

    #[test]
    fn test_external_links_untouched() {
        let (out, warnings) = resolve("01-foo.md", "[site](https://example.org/#Bar)");
        assert_eq!(out, "[site](https://example.org/#Bar)");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_resolve_all_records_across_sections() {
        let map = map();
        let resolver = LinkResolver::new(&map);
        let (texts, warnings) = resolver.resolve_all([
            ("01-foo.md", "[b](#Bar) [m](#Nope)"),
            ("02-bar.md", "[f](#Foo) [m](#Nope)"),
        ]);
        assert_eq!(texts[0], "[b](02-bar.md#Bar) [m](#Nope)");
        assert_eq!(texts[1], "[f](01-foo.md#Foo) [m](#Nope)");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].occurrences, 2);
    }

    #[test]
    fn test_inline_code_spans_are_not_rewritten() {
        let text = "Write `[text](#Bar)` and ``[x](#Nope)`` but follow [Bar](#Bar).\n";
        let (out, warnings) = resolve("01-foo.md", text);
        assert_eq!(
            out,
            "Write `[text](#Bar)` and ``[x](#Nope)`` but follow [Bar](02-bar.md#Bar).\n"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_code_in_link_text_and_unmatched_ticks() {
        let (out, _) = resolve("01-foo.md", "[`Bar`](#Bar) costs 1` and [b](#Bar)");
        assert_eq!(out, "[`Bar`](02-bar.md#Bar) costs 1` and [b](02-bar.md#Bar)");
    }

    #[test]
    fn test_code_spans() {
        assert_eq!(code_spans("a `b` c ``d`e`` f"), [2..5, 8..15]);
        assert!(code_spans("no ``close` here").is_empty());
    }

    #[test]
    fn test_ids_in_file() {
        let map = map();
        let mut ids: Vec<_> = map.ids_in("01-foo.md").collect();
        ids.sort();
        assert_eq!(ids, ["Foo", "Foo-Details"]);
        assert_eq!(map.ids_in("99-none.md").count(), 0);
    }
}
