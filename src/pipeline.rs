//! Document conversion pipeline.
//!
//! One document version goes through detect → TOC → split → render
//! (parallel) → link resolution → write. Link resolution only starts once
//! the section map is frozen, after every section has been rendered.
//! [`convert_batch`] runs several versions in parallel, each into its own
//! output directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::assemble::{ConvertedDocument, ConvertedSection, write_document};
use crate::config::ConvertConfig;
use crate::diagnostics::Diagnostics;
use crate::dom::{Dom, parse_html_bytes};
use crate::error::{Error, Result};
use crate::links::LinkResolver;
use crate::markdown::{RenderResult, render_section};
use crate::schema::{SchemaVariant, detect};
use crate::split::split;
use crate::toc;

/// Raw document bytes for one version.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub version: String,
    pub html: Vec<u8>,
}

impl DocumentSource {
    pub fn new(version: impl Into<String>, html: impl Into<Vec<u8>>) -> Self {
        Self {
            version: version.into(),
            html: html.into(),
        }
    }

    /// Read a document from disk. The version defaults to the file stem.
    pub fn from_path(path: impl AsRef<Path>, version: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let html = fs::read(path).map_err(|e| Error::io(path, e))?;
        let version = match version {
            Some(v) => v.to_string(),
            None => version_from_path(path),
        };
        Ok(Self { version, html })
    }
}

/// Version label derived from a file name (`0.11.0.html` → `0.11.0`).
pub fn version_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "master".to_string())
}

/// Output subdirectory used for `version` in batch mode.
pub fn batch_dir_name(version: &str) -> String {
    format!("docs-{version}")
}

/// Outcome of converting and writing one version.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub version: String,
    pub variant: SchemaVariant,
    pub output_dir: PathBuf,
    /// Written files, sections first, navigation index last.
    pub files: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
}

/// Convert a parsed document without touching the filesystem.
pub fn convert_document(
    dom: &Dom,
    version: &str,
    config: &ConvertConfig,
) -> Result<(ConvertedDocument, Diagnostics)> {
    let detection = detect(dom)?;
    let (toc, map_builder) = toc::extract(dom, &detection, config)?;
    let sections = split(dom, &detection, &toc)?;

    let rendered: Vec<RenderResult> = sections
        .par_iter()
        .map(|section| render_section(dom, section, config))
        .collect();

    // Every entry is known; resolution may start.
    let section_map = map_builder.freeze();
    let resolver = LinkResolver::new(&section_map);
    let (texts, unresolved_links) = resolver.resolve_all(
        sections
            .iter()
            .zip(&rendered)
            .map(|(section, result)| (section.filename.as_str(), result.text.as_str())),
    );

    let converted = sections
        .iter()
        .zip(texts)
        .map(|(section, text)| ConvertedSection {
            order: section.entry.order,
            filename: section.filename.clone(),
            title: section.entry.title.clone(),
            text,
        })
        .collect();

    let diagnostics = Diagnostics {
        unresolved_links,
        fallbacks: rendered.into_iter().flat_map(|r| r.notices).collect(),
    };

    tracing::debug!(
        version,
        variant = %detection.variant,
        sections = sections.len(),
        "converted document"
    );

    Ok((
        ConvertedDocument {
            version: version.to_string(),
            sections: converted,
            toc,
        },
        diagnostics,
    ))
}

/// Convert one document version and write it into `out_dir`.
pub fn convert_to_dir(
    source: &DocumentSource,
    out_dir: &Path,
    config: &ConvertConfig,
) -> Result<ConversionReport> {
    let dom = parse_html_bytes(&source.html);
    let (document, diagnostics) = convert_document(&dom, &source.version, config)?;
    let files = write_document(&document, out_dir, config)?;
    diagnostics.log(&source.version);

    Ok(ConversionReport {
        version: source.version.clone(),
        variant: document.toc.variant,
        output_dir: out_dir.to_path_buf(),
        files,
        diagnostics,
    })
}

/// Result of one version in a batch.
#[derive(Debug)]
pub struct VersionOutcome {
    pub version: String,
    pub result: Result<ConversionReport>,
}

impl VersionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-version outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<VersionOutcome>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &ConversionReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.version.as_str(), e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(VersionOutcome::is_success)
    }
}

/// Convert several versions in parallel, each into
/// `<out_root>/docs-<version>`.
///
/// A failing version does not stop the others; its partial output, if
/// any, is left in place. A version label that already appeared earlier in
/// `sources` fails with [`Error::DuplicateVersion`] without being
/// converted, so every output directory has exactly one writer.
pub fn convert_batch(
    sources: &[DocumentSource],
    out_root: &Path,
    config: &ConvertConfig,
) -> BatchSummary {
    let done = AtomicUsize::new(0);
    let total = sources.len();

    let mut claimed = HashSet::new();
    let duplicates: Vec<bool> = sources
        .iter()
        .map(|source| !claimed.insert(batch_dir_name(&source.version)))
        .collect();

    let outcomes = sources
        .par_iter()
        .zip(duplicates)
        .map(|(source, duplicate)| {
            let result = if duplicate {
                Err(Error::DuplicateVersion {
                    version: source.version.clone(),
                })
            } else {
                let out_dir = out_root.join(batch_dir_name(&source.version));
                convert_to_dir(source, &out_dir, config)
            };
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            match &result {
                Ok(report) => tracing::info!(
                    version = %source.version,
                    variant = %report.variant,
                    "converted {n}/{total}"
                ),
                Err(e) => tracing::warn!(
                    version = %source.version,
                    error = %e,
                    "conversion failed ({n}/{total})"
                ),
            }
            VersionOutcome {
                version: source.version.clone(),
                result,
            }
        })
        .collect();

    BatchSummary { outcomes }
}
