//! Code fence helpers.
//!
//! Fence and tick lengths are chosen so code content can never terminate
//! its own block, and [`FenceState`] lets line-oriented passes (link
//! rewriting, normalization) skip over fenced code.

/// Minimum fence length for a code block: the smallest run of
/// `fence_char` (at least 3) that does not occur in `content`.
///
/// ```
/// use docsplit::markdown::calculate_fence_length;
///
/// assert_eq!(calculate_fence_length("const x = 1;", '`'), 3);
/// assert_eq!(calculate_fence_length("```zig\ncode\n```", '`'), 4);
/// ```
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Minimum backtick count for an inline code span.
///
/// ```
/// use docsplit::markdown::calculate_inline_code_ticks;
///
/// assert_eq!(calculate_inline_code_ticks("@import"), 1);
/// assert_eq!(calculate_inline_code_ticks("a ` b"), 2);
/// ```
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

fn longest_run(content: &str, needle: char) -> usize {
    let mut max_run = 0;
    let mut current_run = 0;
    for c in content.chars() {
        if c == needle {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }
    max_run
}

/// Render `content` as an inline code span.
pub fn inline_code(content: &str) -> String {
    let ticks = "`".repeat(calculate_inline_code_ticks(content));
    let spacer = if content.starts_with('`') || content.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{ticks}{spacer}{content}{spacer}{ticks}")
}

/// Escape a rendered cell so it stays inside its pipe-table column.
pub fn escape_table_cell(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut prev = '\0';
    for c in cell.chars() {
        match c {
            '|' if prev != '\\' => out.push_str("\\|"),
            '\n' => out.push(' '),
            _ => out.push(c),
        }
        prev = c;
    }
    out
}

/// The fence run that opens or closes a code block on `line`, if any.
///
/// Blockquote markers and indentation before the fence are skipped.
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let mut rest = line.trim_start();
    while let Some(stripped) = rest.strip_prefix('>') {
        rest = stripped.trim_start();
    }
    let fence_char = rest.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = rest.chars().take_while(|&c| c == fence_char).count();
    (len >= 3).then(|| (fence_char, len, &rest[len..]))
}

/// Tracks whether successive lines fall inside a fenced code block.
#[derive(Debug, Clone, Copy, Default)]
pub struct FenceState {
    open: Option<(char, usize)>,
}

impl FenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line; returns true if it belongs to a code block
    /// (fence lines included).
    pub fn is_code_line(&mut self, line: &str) -> bool {
        match (self.open, fence_marker(line)) {
            (Some((open_char, open_len)), Some((c, len, rest)))
                if c == open_char && len >= open_len && rest.trim().is_empty() =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, Some((c, len, _))) => {
                self.open = Some((c, len));
                true
            }
            (None, None) => false,
        }
    }

    pub fn in_code(&self) -> bool {
        self.open.is_some()
    }
}
