//! Serde model of an executed nbformat-4 notebook.
//!
//! Only the fields the exporter reads are modelled; anything else in the JSON is ignored.

use serde::Deserialize;
use std::path::Path;

use crate::error::ExportError;

/// A loaded notebook. Read-only for the duration of an export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<CellData>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub language_info: Option<LanguageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub name: Option<String>,
    /// Extension including the dot, e.g. `.py` or `.r`.
    #[serde(default)]
    pub file_extension: Option<String>,
}

impl Notebook {
    /// Parse notebook JSON as produced by `jupyter nbconvert --to notebook`.
    pub fn from_json(content: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_slice(content: &[u8]) -> Result<Self, ExportError> {
        Ok(serde_json::from_slice(content)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|e| ExportError::io(path, e))?;
        Self::from_slice(&content)
    }

    /// The language's file extension, used as the suffix of every snippet name.
    pub fn file_extension(&self) -> Result<&str, ExportError> {
        self.metadata
            .language_info
            .as_ref()
            .and_then(|li| li.file_extension.as_deref())
            .ok_or(ExportError::MissingFileExtension)
    }
}

/// Raw cell as stored in the notebook.
#[derive(Debug, Clone, Deserialize)]
pub struct CellData {
    pub cell_type: String,
    #[serde(default)]
    pub source: MultilineString,
    #[serde(default)]
    pub metadata: CellMetadata,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// nbformat stores text either as one string or as a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MultilineString {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineString {
    fn default() -> Self {
        MultilineString::Lines(Vec::new())
    }
}

impl MultilineString {
    /// Lines with their terminators kept. A single string is split on `\n`.
    pub fn lines(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            MultilineString::Single(s) => Box::new(s.split_inclusive('\n')),
            MultilineString::Lines(lines) => Box::new(lines.iter().map(String::as_str)),
        }
    }

    pub fn joined(&self) -> String {
        match self {
            MultilineString::Single(s) => s.clone(),
            MultilineString::Lines(lines) => lines.concat(),
        }
    }
}

impl From<&str> for MultilineString {
    fn from(s: &str) -> Self {
        MultilineString::Single(s.to_string())
    }
}

/// Name of the stream a `stream` record was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

/// One captured execution result.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        name: StreamName,
        text: MultilineString,
    },
    DisplayData {
        #[serde(default)]
        data: MimeBundle,
    },
    ExecuteResult {
        #[serde(default)]
        data: MimeBundle,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl Output {
    /// The MIME bundle of a display or result record.
    pub fn mime_bundle(&self) -> Option<&MimeBundle> {
        match self {
            Output::DisplayData { data } | Output::ExecuteResult { data } => Some(data),
            Output::Stream { .. } | Output::Error { .. } => None,
        }
    }
}

/// The MIME payloads the exporter understands. Other keys are dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MimeBundle {
    #[serde(rename = "text/plain", default)]
    pub text_plain: Option<MultilineString>,
    #[serde(rename = "image/png", default)]
    pub image_png: Option<MultilineString>,
    #[serde(rename = "text/html", default)]
    pub text_html: Option<MultilineString>,
}
