//! # docsplit
//!
//! Split a single-page HTML language reference into numbered, cross-linked
//! markdown files.
//!
//! ## Features
//!
//! - Recognises four generations of reference page layout
//! - One `NN-slug.md` file per top-level section plus a `README.md` index
//! - In-page references rewritten to `file#Id` across the split files
//! - Sections rendered in parallel; batch conversion of many versions
//!
//! ## Quick Start
//!
//! ```no_run
//! use docsplit::{ConvertConfig, DocumentSource, convert_to_dir};
//! use std::path::Path;
//!
//! let source = DocumentSource::from_path("0.11.0.html", None)?;
//! let config = ConvertConfig::default().with_project_name("Zig");
//! let report = convert_to_dir(&source, Path::new("docs"), &config)?;
//! println!("{} files written", report.files.len());
//! # Ok::<(), docsplit::Error>(())
//! ```
//!
//! ## Working in memory
//!
//! ```
//! use docsplit::{ConvertConfig, convert_document, dom::parse_html};
//!
//! let dom = parse_html(r##"
//!     <nav aria-labelledby="table-of-contents"><ul>
//!       <li><a href="#Intro">Intro</a></li>
//!       <li><a href="#Usage">Usage</a></li>
//!     </ul></nav>
//!     <h2 id="Intro">Intro</h2><p>See <a href="#Usage">usage</a>.</p>
//!     <h2 id="Usage">Usage</h2><p>Run it.</p>
//! "##);
//!
//! let (doc, diagnostics) = convert_document(&dom, "master", &ConvertConfig::default())?;
//! assert_eq!(doc.sections[0].filename, "00-intro.md");
//! assert!(doc.sections[0].text.contains("[usage](01-usage.md#Usage)"));
//! assert!(diagnostics.is_empty());
//! # Ok::<(), docsplit::Error>(())
//! ```

pub mod assemble;
pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod links;
pub mod markdown;
pub mod pipeline;
pub mod schema;
pub mod split;
pub mod toc;
pub(crate) mod util;

pub use assemble::{ConvertedDocument, ConvertedSection, write_document};
pub use config::ConvertConfig;
pub use diagnostics::{ConversionFallbackNotice, Diagnostics, UnresolvedLinkWarning};
pub use error::{Error, Result};
pub use links::{LinkResolver, SectionMap, SectionMapBuilder};
pub use pipeline::{
    BatchSummary, ConversionReport, DocumentSource, VersionOutcome, convert_batch,
    convert_document, convert_to_dir,
};
pub use schema::{SchemaVariant, detect};
pub use split::Section;
pub use toc::{Toc, TocEntry};
