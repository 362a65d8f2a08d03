#![doc = "nbsnip-core: core logic library for nbsnip."]

//! This crate contains the notebook model, the cell-output extraction rules and the
//! HTML-table to LaTeX transformation used by the `nbsnip` binary.
//! Spawning external tools (jupyter, wkhtmltopdf, pdfcrop) lives behind the traits in
//! [`contract`], so everything else can be exercised without a notebook kernel.
//!
//! # Usage
//! Load or execute a notebook, then hand it to [`snippets::export_notebook`].

pub mod cell;
pub mod contract;
pub mod error;
pub mod external;
pub mod notebook;
pub mod outputs;
pub mod snippets;
pub mod table;
pub mod tags;
pub mod text;

pub use cell::{Cell, OutputKind};
pub use error::{CellError, ExportError, TableError};
pub use notebook::Notebook;
pub use table::{ParsedTable, TableStyle};
