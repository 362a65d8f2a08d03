//! Notebook export: turns every tagged code cell into a set of snippet files.
//!
//! For a cell tagged `snippet:<name>` in a notebook whose language extension is `<ext>`:
//!   - `<name><ext>`: the cell source
//!   - `<name><ext>.out`: the normalised text output (always written)
//!   - `<name><ext>.png`: the decoded image, with `output:png`
//!   - `<name><ext>.html.pdf`: the HTML output rendered and cropped, with `output:html`
//!   - `<name><ext>.table.tex`: the HTML table as LaTeX, with `output:table`
//!
//! # Error Handling
//! A [`CellError`] only costs the artifact (or, for duplicate snippet tags, the cell) it
//! concerns; it is logged, recorded in the [`ExportReport`] and export continues. An
//! [`ExportError`] (I/O, renderer failure) aborts the notebook.

use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};

use crate::cell::{read_cells, Cell, OutputKind};
use crate::contract::{HtmlRenderer, NotebookExecutor};
use crate::error::{CellError, ExportError};
use crate::notebook::Notebook;
use crate::table::TableStyle;

/// Optional artifacts, in the order they are produced.
const OPTIONAL_KINDS: [OutputKind; 3] = [OutputKind::Png, OutputKind::Html, OutputKind::Table];

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub table_style: TableStyle,
}

/// Outcome of exporting one notebook.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub output_dir: PathBuf,
    pub snippets: Vec<SnippetReport>,
    /// Cells that could not be exported at all.
    pub cell_failures: Vec<CellFailure>,
}

#[derive(Debug)]
pub struct SnippetReport {
    pub name: String,
    pub written: Vec<PathBuf>,
    pub failures: Vec<ArtifactFailure>,
}

#[derive(Debug)]
pub struct ArtifactFailure {
    pub kind: OutputKind,
    pub error: CellError,
}

#[derive(Debug)]
pub struct CellFailure {
    /// Position of the cell in the notebook.
    pub index: usize,
    pub error: CellError,
}

impl ExportReport {
    pub fn failure_count(&self) -> usize {
        self.cell_failures.len()
            + self
                .snippets
                .iter()
                .map(|s| s.failures.len())
                .sum::<usize>()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn snippet(&self, name: &str) -> Option<&SnippetReport> {
        self.snippets.iter().find(|s| s.name == name)
    }
}

/// Default output location: `./snippets/<name of the notebook's directory>`.
pub fn default_output_dir(notebook_path: &Path) -> PathBuf {
    let folder = notebook_path
        .parent()
        .and_then(Path::file_name)
        .map(PathBuf::from)
        .unwrap_or_default();
    let cwd = std::env::current_dir().unwrap_or_default();
    cwd.join("snippets").join(folder)
}

/// Execute the notebook at `path` and export its snippets.
///
/// `output_dir` defaults to [`default_output_dir`].
pub fn create_snippets<E, R>(
    path: &Path,
    output_dir: Option<&Path>,
    executor: &E,
    renderer: &R,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError>
where
    E: NotebookExecutor + ?Sized,
    R: HtmlRenderer + ?Sized,
{
    let _span = info_span!("export", notebook = %path.display()).entered();
    let notebook = executor.execute(path)?;
    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_dir(path));
    export_notebook(&notebook, &output_dir, renderer, options)
}

/// Write the snippets of an executed notebook into `output_dir`, creating it if needed.
pub fn export_notebook<R>(
    notebook: &Notebook,
    output_dir: &Path,
    renderer: &R,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError>
where
    R: HtmlRenderer + ?Sized,
{
    let ext = notebook.file_extension()?;
    std::fs::create_dir_all(output_dir).map_err(|e| ExportError::io(output_dir, e))?;
    info!(output_dir = %output_dir.display(), "Writing output");

    let mut report = ExportReport {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };
    for (index, cell) in read_cells(notebook).enumerate() {
        if !cell.is_code() {
            continue;
        }
        let name = match cell.snippet_name() {
            Ok(Some(name)) => name,
            Ok(None) => continue,
            Err(error) => {
                error!(cell = index, error = %error, "Skipping cell");
                report.cell_failures.push(CellFailure { index, error });
                continue;
            }
        };
        info!(snippet = name, "Found snippet");
        report
            .snippets
            .push(export_cell(&cell, name, ext, output_dir, renderer, options)?);
    }

    if !report.is_success() {
        warn!(
            failures = report.failure_count(),
            "Export finished with failed outputs"
        );
    }
    Ok(report)
}

fn export_cell<R>(
    cell: &Cell<'_>,
    name: &str,
    ext: &str,
    output_dir: &Path,
    renderer: &R,
    options: &ExportOptions,
) -> Result<SnippetReport, ExportError>
where
    R: HtmlRenderer + ?Sized,
{
    let base = format!("{name}{ext}");
    let artifact_path = |kind: OutputKind| output_dir.join(format!("{base}{}", kind.suffix()));
    let mut report = SnippetReport {
        name: name.to_string(),
        written: Vec::new(),
        failures: Vec::new(),
    };

    report
        .written
        .push(write(&output_dir.join(&base), cell.source().as_bytes())?);
    report.written.push(write(
        &artifact_path(OutputKind::Text),
        cell.text_output().as_bytes(),
    )?);

    let requested = cell.requested_outputs();
    for kind in OPTIONAL_KINDS.into_iter().filter(|k| requested.contains(k)) {
        let artifact = match kind {
            OutputKind::Png => cell.image_output(),
            OutputKind::Html => {
                let pdf = renderer.render_pdf(cell.html_pdf_input().as_bytes())?;
                Ok(renderer.crop_pdf(&pdf)?)
            }
            OutputKind::Table => cell
                .table_output(&options.table_style)
                .map(String::into_bytes),
            OutputKind::Text => continue,
        };
        match artifact {
            Ok(bytes) => report.written.push(write(&artifact_path(kind), &bytes)?),
            Err(error) => {
                error!(snippet = name, output = %kind, error = %error, "Failed to produce output");
                report.failures.push(ArtifactFailure { kind, error });
            }
        }
    }
    Ok(report)
}

fn write(file: &Path, data: &[u8]) -> Result<PathBuf, ExportError> {
    info!(path = %file.display(), "Writing");
    std::fs::write(file, data).map_err(|e| ExportError::io(file, e))?;
    Ok(file.to_path_buf())
}
