//! Per-cell view over a loaded notebook.

use base64::Engine;
use std::fmt::Write;
use tracing::warn;

use crate::error::CellError;
use crate::notebook::{CellData, Output};
use crate::outputs;
use crate::table::{self, TableStyle};
use crate::tags::{self, Tag};
use crate::text;

pub const SNIPPET_NAMESPACE: &str = "snippet";
pub const OUTPUT_NAMESPACE: &str = "output";
pub const TABLE_NAMESPACE: &str = "table";

/// Output kinds a cell can request with `output:<kind>` tags. Text is always written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Text,
    Png,
    Html,
    Table,
}

impl OutputKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(OutputKind::Text),
            "png" => Some(OutputKind::Png),
            "html" => Some(OutputKind::Html),
            "table" => Some(OutputKind::Table),
            _ => None,
        }
    }

    /// File suffix appended to `{snippet}{ext}`.
    pub fn suffix(&self) -> &'static str {
        match self {
            OutputKind::Text => ".out",
            OutputKind::Png => ".png",
            OutputKind::Html => ".html.pdf",
            OutputKind::Table => ".table.tex",
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputKind::Text => "text",
            OutputKind::Png => "png",
            OutputKind::Html => "html",
            OutputKind::Table => "table",
        };
        write!(f, "{s}")
    }
}

/// A notebook cell with its tags parsed.
#[derive(Debug, Clone)]
pub struct Cell<'a> {
    data: &'a CellData,
    tags: Vec<Tag>,
}

impl<'a> Cell<'a> {
    pub fn new(data: &'a CellData) -> Self {
        Self {
            data,
            tags: tags::parse_tags(&data.metadata.tags),
        }
    }

    pub fn cell_type(&self) -> &str {
        &self.data.cell_type
    }

    pub fn is_code(&self) -> bool {
        self.data.cell_type == "code"
    }

    /// The cell's source, fragments concatenated.
    pub fn source(&self) -> String {
        self.data.source.joined()
    }

    pub fn outputs(&self) -> &'a [Output] {
        &self.data.outputs
    }

    /// Tags under `namespace` with the prefix removed, or all raw tags for `None`.
    pub fn tags(&self, namespace: Option<&str>) -> Vec<&str> {
        tags::tags_in(&self.tags, namespace)
    }

    /// Name from the cell's `snippet:` tag. A cell may carry at most one.
    pub fn snippet_name(&self) -> Result<Option<&str>, CellError> {
        match self.tags(Some(SNIPPET_NAMESPACE)).as_slice() {
            [] => Ok(None),
            [name] => Ok(Some(*name)),
            names => Err(CellError::MultipleSnippetTags(
                names.iter().map(|n| n.to_string()).collect(),
            )),
        }
    }

    /// Output kinds requested through `output:` tags, in tag order. Unknown kinds are skipped.
    pub fn requested_outputs(&self) -> Vec<OutputKind> {
        let mut kinds = Vec::new();
        for value in self.tags(Some(OUTPUT_NAMESPACE)) {
            match OutputKind::parse(value) {
                Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Some(_) => {}
                None => warn!(output = value, "Ignoring unknown output tag"),
            }
        }
        kinds
    }

    pub fn requests(&self, kind: OutputKind) -> bool {
        kind == OutputKind::Text || self.requested_outputs().contains(&kind)
    }

    /// Whether the cell carries `table:resize`.
    pub fn resize_table(&self) -> bool {
        self.tags(Some(TABLE_NAMESPACE)).contains(&"resize")
    }

    /// Normalised plain-text output.
    pub fn text_output(&self) -> String {
        text::normalize(outputs::text_lines(self.outputs()))
    }

    /// Decoded bytes of the cell's single PNG image.
    pub fn image_output(&self) -> Result<Vec<u8>, CellError> {
        let mut images: Vec<String> = outputs::image_payloads(self.outputs()).collect();
        let payload = match images.len() {
            0 => return Err(CellError::NoImage),
            1 => images.remove(0),
            n => return Err(CellError::MultipleImages(n)),
        };
        let cleaned: String = payload.split_whitespace().collect();
        Ok(base64::engine::general_purpose::STANDARD.decode(cleaned)?)
    }

    /// HTML output as ASCII text for an external renderer.
    ///
    /// Lines are joined with `\n`; non-ASCII characters become numeric character references.
    pub fn html_pdf_input(&self) -> String {
        let html = outputs::html_lines(self.outputs())
            .collect::<Vec<_>>()
            .join("\n");
        ascii_char_refs(&html)
    }

    /// The cell's single HTML table as a LaTeX snippet.
    pub fn table_output(&self, style: &TableStyle) -> Result<String, CellError> {
        let fragments = outputs::table_fragments(self.outputs());
        Ok(table::table_snippet(fragments, self.resize_table(), style)?)
    }
}

/// Replace every non-ASCII character with `&#<codepoint>;`.
pub fn ascii_char_refs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let _ = write!(out, "&#{};", ch as u32);
        }
    }
    out
}

/// Views over every cell of a notebook, in order.
pub fn read_cells(notebook: &crate::notebook::Notebook) -> impl Iterator<Item = Cell<'_>> {
    notebook.cells.iter().map(Cell::new)
}
