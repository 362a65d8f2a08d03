//! Error types for snippet extraction and export.
//!
//! Two levels of failure exist:
//! - [`CellError`]: a configuration or data-shape problem with one cell. It is fatal to the
//!   single artifact (or cell) it concerns; sibling artifacts are still written.
//! - [`ExportError`]: an environment problem (missing tool, failed process, I/O). It is fatal
//!   to the whole input file.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a cell's HTML output into a table snippet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("No table present")]
    NoTable,

    #[error("More than one table ({0}), cannot save as single snippet")]
    MultipleTables(usize),

    /// Neither a tibble type row nor a body row to take the column count from.
    #[error("Table has no body rows to infer the column count from")]
    NoBodyRows,

    #[error("Table has no header rows")]
    NoHeader,

    #[error("Table has no columns")]
    NoColumns,

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Configuration or data-shape error for a single cell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("Don't use multiple snippet tags! {0:?}")]
    MultipleSnippetTags(Vec<String>),

    #[error("No PNG data present")]
    NoImage,

    #[error("More than one PNG ({0}), cannot save as picture")]
    MultipleImages(usize),

    #[error("Invalid base64 PNG payload: {0}")]
    ImageDecode(#[from] base64::DecodeError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Environment error, fatal for the notebook being exported.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot find jupyter in {0}")]
    ExecutorNotFound(String),

    #[error("Failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    ProcessFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Notebook metadata has no language_info.file_extension")]
    MissingFileExtension,

    #[error("Failed to parse notebook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}
