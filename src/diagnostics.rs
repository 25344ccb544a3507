//! Non-fatal conditions collected while converting a document.
//!
//! Nothing here interrupts the pipeline. Warnings and notices accumulate in
//! [`Diagnostics`] and are reported once per document version after
//! conversion finishes.

use std::fmt;

/// A reference whose target id is not in the section map. The reference is
/// left unrewritten in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLinkWarning {
    /// Target id as written in the reference (without `#`).
    pub id: String,
    /// File in which the reference first appeared.
    pub first_file: String,
    /// Number of references to this id across the document.
    pub occurrences: usize,
}

impl fmt::Display for UnresolvedLinkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolved link #{} in {}", self.id, self.first_file)?;
        if self.occurrences > 1 {
            write!(f, " ({} references)", self.occurrences)?;
        }
        Ok(())
    }
}

/// An element rendered through the generic text fallback instead of a
/// dedicated rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConversionFallbackNotice {
    pub file: String,
    pub tag: String,
}

impl fmt::Display for ConversionFallbackNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> in {} rendered as plain text", self.tag, self.file)
    }
}

/// All non-fatal findings for one document version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub unresolved_links: Vec<UnresolvedLinkWarning>,
    pub fallbacks: Vec<ConversionFallbackNotice>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.unresolved_links.is_empty() && self.fallbacks.is_empty()
    }

    /// Emit the collected findings through `tracing`.
    pub fn log(&self, version: &str) {
        for warning in &self.unresolved_links {
            tracing::warn!(version, "{warning}");
        }
        if !self.fallbacks.is_empty() {
            tracing::info!(
                version,
                count = self.fallbacks.len(),
                "elements rendered through the text fallback"
            );
            for notice in &self.fallbacks {
                tracing::debug!(version, "{notice}");
            }
        }
    }
}
