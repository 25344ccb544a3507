//! DOM → Markdown rendering of one section.
//!
//! Rendering walks the section's root nodes in order and accumulates text in
//! a [`RenderContext`]. Block elements are separated by blank lines, list
//! items and block quotes carry a line prefix that is re-emitted at the
//! start of every line they produce. Nothing here performs I/O.

use std::collections::BTreeSet;

use crate::config::ConvertConfig;
use crate::diagnostics::ConversionFallbackNotice;
use crate::dom::{Dom, NodeData, NodeId};
use crate::links::TOC_ANCHOR_PREFIX;
use crate::split::Section;
use crate::util::collapse_whitespace;

use super::fence::{calculate_fence_length, escape_table_cell, inline_code};
use super::normalize::normalize;

/// Result of rendering a section.
#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    /// Normalized markdown, internal links not yet resolved.
    pub text: String,
    /// Elements that went through the text fallback, one per tag.
    pub notices: Vec<ConversionFallbackNotice>,
}

/// Elements that produce no output at all.
const SKIPPED: &[&str] = &[
    "script", "style", "head", "template", "nav", "noscript", "title", "meta", "link", "caption",
];

/// Elements rendered as their children.
const TRANSPARENT: &[&str] = &[
    "html", "body", "main", "div", "section", "article", "header", "footer", "span", "center",
    "font", "small", "big", "sup", "sub", "u", "ins", "mark", "abbr", "cite", "q", "label",
    "var", "dfn", "time", "thead", "tbody", "tfoot", "tr", "td", "th", "li", "dt", "dd",
    "figcaption", "summary", "details", "colgroup", "col", "wbr",
];

/// Inline code elements.
const CODE_TAGS: &[&str] = &["code", "kbd", "samp", "tt"];

/// Tracks list context for numbering.
#[derive(Debug, Clone)]
struct ListContext {
    is_ordered: bool,
    counter: usize,
}

/// Context for rendering (pure string accumulation, no I/O).
pub struct RenderContext<'a> {
    dom: &'a Dom,
    config: &'a ConvertConfig,
    filename: &'a str,
    output: String,
    fallback_tags: BTreeSet<String>,
    /// Set while rendering a table cell or definition, where block
    /// constructs collapse to one line.
    flat: bool,
    // Formatting state
    line_prefix: String,
    list_stack: Vec<ListContext>,
    at_line_start: bool,
    has_line_content: bool,
    pending_space: bool,
    pending_newline: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(dom: &'a Dom, config: &'a ConvertConfig, filename: &'a str) -> Self {
        Self {
            dom,
            config,
            filename,
            output: String::new(),
            fallback_tags: BTreeSet::new(),
            flat: false,
            line_prefix: String::new(),
            list_stack: Vec::new(),
            at_line_start: true,
            has_line_content: false,
            pending_space: false,
            pending_newline: false,
        }
    }

    /// Render `roots` in order, consuming the context.
    pub fn render(mut self, roots: &[NodeId]) -> RenderResult {
        for &root in roots {
            self.walk_node(root);
        }
        if !self.at_line_start {
            self.output.push('\n');
        }

        let notices = self
            .fallback_tags
            .into_iter()
            .map(|tag| ConversionFallbackNotice {
                file: self.filename.to_string(),
                tag,
            })
            .collect();

        RenderResult {
            text: normalize(&self.output),
            notices,
        }
    }

    /// Ensure we're ready to write content (write prefix if at line start).
    fn ensure_line_started(&mut self) {
        if self.at_line_start {
            self.output.push_str(&self.line_prefix);
            self.at_line_start = false;
        }
    }

    fn write_newline(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
        self.has_line_content = false;
        self.pending_space = false;
    }

    /// A blank line that keeps block quote markers.
    fn write_blank_line(&mut self) {
        self.output.push_str(self.line_prefix.trim_end());
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// Whether the output already ends with a blank line (or is empty).
    fn at_blank_line(&self) -> bool {
        let Some(body) = self.output.strip_suffix('\n') else {
            return self.output.is_empty();
        };
        let last = body.rsplit('\n').next().unwrap_or_default();
        last.trim_end() == self.line_prefix.trim_end()
    }

    fn write_line(&mut self, line: &str) {
        self.ensure_line_started();
        self.output.push_str(line);
        self.write_newline();
    }

    /// Start a new block element.
    fn start_block(&mut self) {
        if self.pending_newline || self.has_line_content {
            if !self.at_line_start && !self.output.ends_with('\n') {
                self.write_newline();
            }
            if !self.at_blank_line() {
                self.write_blank_line();
            }
            self.pending_newline = false;
        }
        self.ensure_line_started();
    }

    /// Like [`Self::start_block`], but nested lists stay tight and the line
    /// is left for the first item to start.
    fn start_list(&mut self) {
        if self.list_stack.is_empty() {
            if self.pending_newline || self.has_line_content {
                if !self.at_line_start && !self.output.ends_with('\n') {
                    self.write_newline();
                }
                if !self.at_blank_line() {
                    self.write_blank_line();
                }
            }
        } else if !self.at_line_start {
            self.write_newline();
        }
        self.pending_newline = false;
    }

    fn end_block(&mut self) {
        self.pending_newline = true;
        self.pending_space = false;
    }

    /// Write inline content, emitting any deferred inter-word space.
    fn write_inline(&mut self, s: &str) {
        if self.pending_newline {
            self.start_block();
        }
        self.ensure_line_started();
        if self.pending_space {
            self.output.push(' ');
            self.pending_space = false;
        }
        self.output.push_str(s);
        self.has_line_content = true;
    }

    /// Opening markup (`**`, `[`): no space may follow it.
    fn open_inline(&mut self, marker: &str) {
        self.write_inline(marker);
        self.has_line_content = false;
    }

    /// Closing markup: attaches to the preceding text; a deferred space
    /// stays deferred.
    fn close_inline(&mut self, marker: &str) {
        self.output.push_str(marker);
        self.has_line_content = true;
    }

    fn write_text(&mut self, text: &str) {
        let collapsed = collapse_whitespace(text);
        let leading = collapsed.starts_with(' ');
        let trailing = collapsed.ends_with(' ');
        let words = collapsed.trim();

        if leading && self.has_line_content {
            self.pending_space = true;
        }
        if words.is_empty() {
            return;
        }
        self.write_inline(words);
        if trailing {
            self.pending_space = true;
        }
    }

    fn walk_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.dom.children(id).collect();
        for child in children {
            self.walk_node(child);
        }
    }

    fn walk_node(&mut self, id: NodeId) {
        let dom = self.dom;
        let Some(node) = dom.get(id) else {
            return;
        };

        match &node.data {
            NodeData::Text(text) => self.write_text(text),
            NodeData::Comment(_) => {}
            NodeData::Document => self.walk_children(id),
            NodeData::Element { .. } => self.walk_element(id),
        }
    }

    fn walk_element(&mut self, id: NodeId) {
        let dom = self.dom;
        let Some(tag) = dom.tag(id) else {
            return;
        };

        match tag {
            t if SKIPPED.contains(&t) => {}

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.write_heading(id),

            "p" => {
                if self.is_file_label(id) {
                    return;
                }
                self.start_block();
                self.walk_children(id);
                self.end_block();
            }

            "a" => self.write_link(id),

            "strong" | "b" => self.write_emphasis(id, "**"),
            "em" | "i" => self.write_emphasis(id, "*"),
            "s" | "strike" | "del" => self.write_emphasis(id, "~~"),

            t if CODE_TAGS.contains(&t) => {
                let content = collapse_whitespace(&dom.text_content(id));
                if !content.trim().is_empty() {
                    self.write_inline(&inline_code(content.trim()));
                }
            }

            "br" => {
                if self.flat {
                    self.pending_space = true;
                } else if !self.at_line_start {
                    self.output.push('\\');
                    self.write_newline();
                }
            }

            "hr" => {
                self.start_block();
                self.output.push_str("---");
                self.end_block();
            }

            "img" => {
                let alt = dom.attr(id, "alt").unwrap_or("");
                let src = dom.attr(id, "src").unwrap_or("");
                if !src.is_empty() {
                    self.write_inline(&format!("![{alt}]({src})"));
                }
            }

            "pre" => self.write_pre(id),
            "figure" => self.write_figure(id),

            "ul" | "ol" => {
                let is_ordered = tag == "ol";
                let start = dom
                    .attr(id, "start")
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .unwrap_or(1);
                self.start_list();
                self.list_stack.push(ListContext {
                    is_ordered,
                    counter: start.saturating_sub(1),
                });
                self.walk_children(id);
                self.list_stack.pop();
                self.end_block();
            }

            "li" if !self.list_stack.is_empty() && !self.flat => self.write_list_item(id),

            "blockquote" => self.write_quote(id, None),
            "aside" => self.write_quote(id, Some("**Note:**")),

            "dl" => self.write_definition_list(id),
            "table" => self.write_table(id),

            t if TRANSPARENT.contains(&t) => self.walk_children(id),

            other => self.write_fallback(id, other),
        }
    }

    fn write_heading(&mut self, id: NodeId) {
        let Some(level) = self.dom.heading_level(id) else {
            return;
        };
        let text = self.plain_text(id);
        if text.is_empty() {
            return;
        }
        if self.flat {
            self.write_inline(&text);
            return;
        }

        let dom = self.dom;
        self.start_block();
        if self.config.heading_anchors
            && let Some(anchor) = dom.element_id(id)
        {
            let anchor = anchor.strip_prefix(TOC_ANCHOR_PREFIX).unwrap_or(anchor);
            self.write_line(&format!("<a id=\"{anchor}\"></a>"));
            self.ensure_line_started();
        }
        let hashes = "#".repeat(level as usize);
        self.output.push_str(&format!("{hashes} {text}"));
        self.end_block();
    }

    /// Heading text without section markers, whitespace collapsed.
    fn plain_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if self.is_section_marker(node) {
                continue;
            }
            if let Some(t) = self.dom.text(node) {
                out.push_str(t);
            }
            let mut children: Vec<NodeId> = self.dom.children(node).collect();
            children.reverse();
            stack.extend(children);
        }
        collapse_whitespace(&out).trim().to_string()
    }

    /// `<a class="hdr">§</a>` permalink markers.
    fn is_section_marker(&self, id: NodeId) -> bool {
        self.dom.tag_is(id, "a") && self.dom.has_class(id, "hdr")
    }

    fn write_link(&mut self, id: NodeId) {
        if self.is_section_marker(id) {
            return;
        }
        let href = self.dom.attr(id, "href").unwrap_or("").trim();
        if href.is_empty() || self.dom.text_content(id).trim().is_empty() {
            self.walk_children(id);
            return;
        }
        let href = href.to_string();
        self.open_inline("[");
        self.walk_children(id);
        self.close_inline(&format!("]({href})"));
    }

    fn write_emphasis(&mut self, id: NodeId, marker: &str) {
        if self.dom.text_content(id).trim().is_empty() {
            self.walk_children(id);
            return;
        }
        self.open_inline(marker);
        self.walk_children(id);
        self.close_inline(marker);
    }

    fn write_list_item(&mut self, id: NodeId) {
        if !self.at_line_start {
            self.write_newline();
        }
        self.pending_newline = false;
        self.ensure_line_started();

        let bullet = match self.list_stack.last_mut() {
            Some(ctx) => {
                ctx.counter += 1;
                if ctx.is_ordered {
                    format!("{}. ", ctx.counter)
                } else {
                    "- ".to_string()
                }
            }
            None => "- ".to_string(),
        };
        self.output.push_str(&bullet);
        self.has_line_content = false;
        self.pending_space = false;

        // Continuation lines align with the item text
        let old_prefix = self.line_prefix.clone();
        self.line_prefix.push_str(&" ".repeat(bullet.len()));

        self.walk_children(id);

        self.line_prefix = old_prefix;
        self.pending_newline = false;
    }

    fn write_quote(&mut self, id: NodeId, lead: Option<&str>) {
        if self.flat {
            self.walk_children(id);
            return;
        }
        self.start_block();
        self.output.push_str("> ");

        let old_prefix = self.line_prefix.clone();
        self.line_prefix.push_str("> ");

        if let Some(lead) = lead {
            self.output.push_str(lead);
            self.pending_space = true;
        }
        self.has_line_content = false;

        self.walk_children(id);

        self.line_prefix = old_prefix;
        self.end_block();
    }

    fn write_definition_list(&mut self, id: NodeId) {
        if self.flat {
            self.walk_children(id);
            return;
        }
        let dom = self.dom;
        self.start_block();
        let mut first = true;
        for item in dom.child_elements(id) {
            match dom.tag(item) {
                Some("dt") => {
                    if !first {
                        self.write_blank_line();
                    }
                    let term = self.render_flat(item);
                    self.write_line(&format!("**{term}**"));
                }
                Some("dd") => {
                    let definition = self.render_flat(item);
                    self.write_line(&format!(": {definition}"));
                }
                _ => continue,
            }
            first = false;
        }
        self.end_block();
    }

    fn write_table(&mut self, id: NodeId) {
        if self.flat {
            self.walk_children(id);
            return;
        }

        let dom = self.dom;
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in self.table_rows(id) {
            let mut cells = Vec::new();
            for cell in dom.child_elements(row) {
                if matches!(dom.tag(cell), Some("td" | "th")) {
                    cells.push(escape_table_cell(&self.render_flat(cell)));
                }
            }
            rows.push(cells);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return;
        }

        self.start_block();
        for (i, mut row) in rows.into_iter().enumerate() {
            row.resize(width, String::new());
            self.write_line(&format!("| {} |", row.join(" | ")));
            if i == 0 {
                let separator = vec!["---"; width].join(" | ");
                self.write_line(&format!("| {separator} |"));
            }
        }
        self.end_block();
    }

    /// Rows of `table` in order, looking through row groups but not into
    /// nested tables.
    fn table_rows(&self, table: NodeId) -> Vec<NodeId> {
        let mut rows = Vec::new();
        for child in self.dom.child_elements(table) {
            match self.dom.tag(child) {
                Some("tr") => rows.push(child),
                Some("thead" | "tbody" | "tfoot") => rows.extend(
                    self.dom
                        .child_elements(child)
                        .filter(|&r| self.dom.tag_is(r, "tr")),
                ),
                _ => {}
            }
        }
        rows
    }

    /// Render the children of `id` into a single line.
    fn render_flat(&mut self, id: NodeId) -> String {
        let mut sub = RenderContext::new(self.dom, self.config, self.filename);
        sub.flat = true;
        sub.walk_children(id);
        self.fallback_tags.append(&mut sub.fallback_tags);

        sub.output
            .lines()
            .map(|l| l.trim().trim_end_matches('\\').trim_end())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `<p class="file">` directly followed by a `pre` labels that block.
    fn is_file_label(&self, p: NodeId) -> bool {
        self.dom.has_class(p, "file")
            && self
                .dom
                .next_element_sibling(p)
                .is_some_and(|n| self.dom.tag_is(n, "pre"))
    }

    fn write_pre(&mut self, id: NodeId) {
        let dom = self.dom;
        let code = dom.text_content(id);

        let in_cell = dom
            .parent(id)
            .is_some_and(|p| matches!(dom.tag(p), Some("td" | "th")));
        if self.flat || in_cell {
            let content = collapse_whitespace(&code);
            if !content.trim().is_empty() {
                self.write_inline(&inline_code(content.trim()));
            }
            return;
        }

        let label = dom
            .prev_element_sibling(id)
            .filter(|&p| dom.tag_is(p, "p") && dom.has_class(p, "file"))
            .map(|p| collapse_whitespace(&dom.text_content(p)).trim().to_string())
            .filter(|name| !name.is_empty())
            .map(|name| format!("**{}:**", inline_code(&name)));

        let code = clean_code(&code);
        if let Some(signature) = unwrap_backticks(&code) {
            self.write_code_block(label.as_deref(), "", signature);
            return;
        }

        let language = self.declared_language(id).unwrap_or_default();
        self.write_code_block(label.as_deref(), &language, &code);
    }

    fn write_figure(&mut self, id: NodeId) {
        let dom = self.dom;
        let Some(pre) = dom.find_in(id, |dom, n| dom.tag_is(n, "pre")) else {
            self.walk_children(id);
            return;
        };
        let caption = dom.find_in(id, |dom, n| dom.tag_is(n, "figcaption"));

        let mut language = None;
        let mut label = None;
        if let Some(caption) = caption {
            language = dom
                .classes(caption)
                .iter()
                .find_map(|c| c.strip_suffix("-cap"))
                .filter(|l| !l.is_empty())
                .map(str::to_string);

            let cite = dom.find_in(caption, |dom, n| dom.tag_is(n, "cite"));
            label = match cite {
                Some(cite) => {
                    let name = collapse_whitespace(&dom.text_content(cite)).trim().to_string();
                    (!name.is_empty()).then(|| format!("**{}:**", inline_code(&name)))
                }
                None => {
                    let text = collapse_whitespace(&dom.text_content(caption)).trim().to_string();
                    (!text.is_empty()).then(|| format!("**{text}:**"))
                }
            };
        }

        let language = language
            .or_else(|| self.declared_language(pre))
            .unwrap_or_default();
        let code = clean_code(&dom.text_content(pre));
        self.write_code_block(label.as_deref(), &language, &code);
    }

    /// Language declared by `class` on a `pre` or its `code` child.
    fn declared_language(&self, pre: NodeId) -> Option<String> {
        let code = self.dom.child_elements(pre).find(|&c| self.dom.tag_is(c, "code"));
        code.into_iter().chain([pre]).find_map(|node| {
            self.dom.classes(node).iter().find_map(|class| {
                if let Some(lang) = class.strip_prefix("language-") {
                    return Some(lang.to_string());
                }
                self.config
                    .is_known_language(class)
                    .then(|| class.to_string())
            })
        })
    }

    fn write_code_block(&mut self, label: Option<&str>, language: &str, code: &str) {
        self.start_block();
        if let Some(label) = label {
            self.write_line(label);
        }
        let fence = "`".repeat(calculate_fence_length(code, '`'));
        self.write_line(&format!("{fence}{language}"));
        for line in code.lines() {
            self.write_line(line);
        }
        self.ensure_line_started();
        self.output.push_str(&fence);
        self.end_block();
    }

    /// Text-content rendering for elements without a dedicated rule.
    fn write_fallback(&mut self, id: NodeId, tag: &str) {
        self.fallback_tags.insert(tag.to_string());

        let text = self.dom.text_content(id);
        let paragraphs: Vec<String> = split_paragraphs(&text)
            .map(|p| collapse_whitespace(p).trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if self.flat || paragraphs.len() <= 1 {
            for paragraph in &paragraphs {
                self.write_text(paragraph);
            }
            return;
        }
        for paragraph in &paragraphs {
            self.start_block();
            self.write_text(paragraph);
            self.end_block();
        }
    }
}

/// Split on blank lines.
fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut blank_run = false;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if !blank_run {
                parts.push(&text[start..offset]);
                blank_run = true;
            }
        } else if blank_run {
            start = offset;
            blank_run = false;
        }
        offset += line.len();
    }
    if !blank_run {
        parts.push(&text[start..]);
    }
    parts.into_iter()
}

/// Drop surrounding blank lines and normalize line endings, keeping
/// indentation.
fn clean_code(code: &str) -> String {
    code.replace("\r\n", "\n")
        .trim_start_matches('\n')
        .trim_end()
        .to_string()
}

/// Signatures that arrive wrapped in one pair of backticks.
fn unwrap_backticks(code: &str) -> Option<&str> {
    let inner = code.trim().strip_prefix('`')?.strip_suffix('`')?;
    (!inner.is_empty() && !inner.starts_with('`') && !inner.ends_with('`')).then_some(inner)
}

/// Render one section to normalized markdown.
pub fn render_section(dom: &Dom, section: &Section, config: &ConvertConfig) -> RenderResult {
    RenderContext::new(dom, config, &section.filename).render(&section.roots)
}
