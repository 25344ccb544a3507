//! Output assembly: section files plus the navigation index.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::toc::{Toc, TocEntry};

/// One converted, link-resolved section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedSection {
    pub order: usize,
    pub filename: String,
    pub title: String,
    pub text: String,
}

/// A fully converted document version, ready to be written.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub version: String,
    /// Sections in `order`.
    pub sections: Vec<ConvertedSection>,
    /// Table of contents the sections came from; used for nested index
    /// entries.
    pub toc: Toc,
}

impl ConvertedDocument {
    /// Navigation index text for this document.
    pub fn index(&self, config: &ConvertConfig) -> String {
        render_index(self, config)
    }
}

/// Human-readable label for a version identifier.
///
/// ```
/// use docsplit::assemble::version_display;
///
/// assert_eq!(version_display("master"), "Master Branch");
/// assert_eq!(version_display("0.11.0"), "Version 0.11.0");
/// ```
pub fn version_display(version: &str) -> String {
    match version {
        "master" => "Master Branch".to_string(),
        v => format!("Version {v}"),
    }
}

/// Render the navigation index listing every section in order.
pub fn render_index(doc: &ConvertedDocument, config: &ConvertConfig) -> String {
    let display = version_display(&doc.version);
    let source_url = config.source_url_for(&doc.version);
    let mut out = String::new();

    let _ = writeln!(out, "# {} Documentation ({display})", config.project_name);
    out.push('\n');
    if let Some(url) = &source_url {
        let _ = writeln!(
            out,
            "This documentation has been automatically converted from {url}"
        );
        out.push('\n');
    }

    out.push_str("## Table of Contents\n\n");
    for section in &doc.toc.sections {
        let marker = format!("{}. ", section.entry.order + 1);
        let _ = writeln!(out, "{marker}[{}]({})", section.entry.title, section.filename);
        if config.index_depth > 1 {
            let indent = " ".repeat(marker.len());
            write_nested(
                &mut out,
                &section.entry.children,
                &section.filename,
                &indent,
                config.index_depth,
            );
        }
    }

    out.push_str("\n## About This Documentation\n\n");
    out.push_str(
        "Each top-level section of the reference has been extracted into its own \
         markdown file, numbered in reading order. Cross-references between \
         sections link to the file that holds their target.\n\n",
    );
    let _ = writeln!(out, "**Version:** {display}");
    if let Some(url) = &source_url {
        out.push('\n');
        let _ = writeln!(out, "**Source:** [{}]({url})", config.project_name);
    }

    out
}

fn write_nested(
    out: &mut String,
    entries: &[TocEntry],
    filename: &str,
    indent: &str,
    max_depth: usize,
) {
    for entry in entries {
        if entry.depth >= max_depth {
            continue;
        }
        let _ = writeln!(out, "{indent}- [{}]({filename}#{})", entry.title, entry.id);
        let child_indent = format!("{indent}  ");
        write_nested(out, &entry.children, filename, &child_indent, max_depth);
    }
}

/// Write every section and the navigation index into `out_dir`.
///
/// The directory is created if needed. Section files are written in
/// parallel. Returns the written paths, sections first, index last.
pub fn write_document(
    doc: &ConvertedDocument,
    out_dir: &Path,
    config: &ConvertConfig,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

    let mut written: Vec<PathBuf> = doc
        .sections
        .par_iter()
        .map(|section| -> Result<PathBuf> {
            let path = out_dir.join(&section.filename);
            fs::write(&path, &section.text).map_err(|e| Error::io(&path, e))?;
            tracing::debug!(path = %path.display(), "wrote section");
            Ok(path)
        })
        .collect::<Result<_>>()?;

    let index_path = out_dir.join(&config.index_filename);
    fs::write(&index_path, render_index(doc, config)).map_err(|e| Error::io(&index_path, e))?;
    written.push(index_path);

    tracing::info!(
        version = %doc.version,
        dir = %out_dir.display(),
        files = written.len(),
        "wrote document"
    );
    Ok(written)
}
