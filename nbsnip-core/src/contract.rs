//! # contract: interfaces to the external tools the exporter depends on
//!
//! Executing a notebook and rendering HTML to PDF both need separate programs. They are
//! hidden behind the traits below so the extraction pipeline can run against fakes.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; `MockNotebookExecutor` and `MockHtmlRenderer`
//!   are exported when the `test-export-mocks` feature is enabled (the default).
//!
//! ## Implementations
//! - [`crate::external::JupyterExecutor`] runs `jupyter nbconvert`.
//! - [`crate::external::WkhtmltopdfRenderer`] runs `wkhtmltopdf` and `pdfcrop`.
//!
//! Calls are blocking and single-shot: no retries, no timeouts. Any failure is an
//! [`ExportError`] and aborts the notebook being exported.

use std::path::Path;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::ExportError;
use crate::notebook::Notebook;

/// Produces the executed state of a notebook file.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait NotebookExecutor: Send + Sync {
    /// Execute the notebook at `path` and return it with all outputs captured.
    fn execute(&self, path: &Path) -> Result<Notebook, ExportError>;
}

/// Turns HTML into a PDF page cropped to its content.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait HtmlRenderer: Send + Sync {
    /// Render ASCII HTML to PDF bytes.
    fn render_pdf(&self, html: &[u8]) -> Result<Vec<u8>, ExportError>;

    /// Crop a PDF to the bounding box of its content.
    fn crop_pdf(&self, pdf: &[u8]) -> Result<Vec<u8>, ExportError>;
}

/// Executor for notebooks that were already executed: reads the file as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreExecuted;

impl NotebookExecutor for PreExecuted {
    fn execute(&self, path: &Path) -> Result<Notebook, ExportError> {
        tracing::info!(path = %path.display(), "Reading executed notebook");
        Notebook::from_path(path)
    }
}
