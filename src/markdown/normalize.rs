//! Structural whitespace normalization of rendered markdown.

use super::fence::FenceState;

/// Runs of this many blank lines or more collapse to a single blank line.
const COLLAPSE_THRESHOLD: usize = 3;

/// Normalize rendered markdown.
///
/// - trailing whitespace is trimmed from every line
/// - leading blank lines are dropped
/// - runs of three or more blank lines outside fenced code collapse to a
///   single blank line; shorter runs are kept
/// - the result ends with exactly one newline (or is empty)
///
/// Blank lines inside fenced code are kept. The function is idempotent.
///
/// ```
/// use docsplit::markdown::normalize;
///
/// let text = "\n\n# Title   \n\n\n\nbody\n\n\nmore\n```\na\n\n\n\nb\n```\n\n";
/// assert_eq!(normalize(text), "# Title\n\nbody\n\n\nmore\n```\na\n\n\n\nb\n```\n");
/// assert_eq!(normalize(&normalize(text)), normalize(text));
/// ```
pub fn normalize(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut fences = FenceState::new();
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        let in_code = fences.is_code_line(line);
        if !in_code && line.is_empty() {
            if !lines.is_empty() {
                blank_run += 1;
            }
            continue;
        }
        let kept = if blank_run >= COLLAPSE_THRESHOLD { 1 } else { blank_run };
        lines.extend(std::iter::repeat_n("", kept));
        blank_run = 0;
        lines.push(line);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return String::new();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
