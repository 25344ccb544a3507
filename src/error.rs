//! Error types for document conversion.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaVariant;

/// Errors that abort the conversion of a single document version.
///
/// Non-fatal conditions (unresolved links, fallback renderings) are not
/// errors; see [`crate::diagnostics`].
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "unrecognized document schema: no table-of-contents container found \
         (tried nav[aria-labelledby=table-of-contents], #toc, #index, #nav)"
    )]
    UnrecognizedSchema,

    #[error("table of contents in {variant} document has no entries")]
    EmptyToc { variant: SchemaVariant },

    #[error("section heading not found for table-of-contents id '{id}'")]
    SectionExtraction { id: String },

    #[error("version '{version}' appears more than once in the batch")]
    DuplicateVersion { version: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
