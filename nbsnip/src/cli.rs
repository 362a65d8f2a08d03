//! Command-line interface for nbsnip.
//!
//! This module is CLI glue only: argument parsing, wiring the real executor and renderer,
//! and reporting. Extraction logic lives in `nbsnip-core`.
//!
//! Call [`run`] with a constructed [`Cli`] for programmatic or test use.

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::load_config::{load_config, SnippetConfig};
use nbsnip_core::contract::{NotebookExecutor, PreExecuted};
use nbsnip_core::external::{JupyterExecutor, WkhtmltopdfRenderer};
use nbsnip_core::snippets::{create_snippets, default_output_dir, ExportOptions, ExportReport};

/// CLI for nbsnip: turn tagged notebook cells into LaTeX snippets.
#[derive(Parser)]
#[clap(
    name = "nbsnip",
    version,
    about = "Process jupyter notebook cells into LaTeX snippets"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute notebooks and write a snippet set for every `snippet:` tagged cell
    Export {
        /// Notebook file(s) to process
        #[clap(required = true)]
        files: Vec<PathBuf>,

        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,

        /// Output directory [default: ./snippets/<notebook directory name>]
        #[clap(long)]
        output_dir: Option<PathBuf>,

        /// Read the notebooks as already executed instead of running them with jupyter
        #[clap(long)]
        no_execute: bool,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Export {
            files,
            config,
            output_dir,
            no_execute,
        } => {
            let mut config = load_config(config.as_deref())?;
            if output_dir.is_some() {
                config.output_dir = output_dir;
            }
            tracing::info!(command = "export", files = files.len(), "Starting export");
            export_all(files, Arc::new(config), no_execute).await
        }
    }
}

/// Group files by the directory their snippets land in, keeping input order per group.
///
/// Files sharing a directory can produce the same snippet paths, so a group must be
/// exported sequentially; distinct groups are independent.
pub fn group_by_output_dir(
    files: Vec<PathBuf>,
    output_dir: Option<&Path>,
) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_dir(&file));
        groups.entry(dir).or_default().push(file);
    }
    groups
}

/// Export every output directory group on the blocking pool. A failing notebook does not
/// stop the others.
async fn export_all(files: Vec<PathBuf>, config: Arc<SnippetConfig>, no_execute: bool) -> Result<()> {
    let groups = group_by_output_dir(files, config.output_dir.as_deref());
    tracing::debug!(groups = groups.len(), "Grouped notebooks by output directory");

    let tasks = groups.into_iter().map(|(dir, files)| {
        let config = Arc::clone(&config);
        tokio::task::spawn_blocking(move || {
            files
                .into_iter()
                .map(|file| {
                    let result = export_file(&file, &dir, &config, no_execute);
                    (file, result)
                })
                .collect::<Vec<_>>()
        })
    });

    let mut failed_files = 0;
    let mut failed_outputs = 0;
    for joined in join_all(tasks).await {
        for (file, result) in joined? {
            match result {
                Ok(report) => {
                    print_report(&file, &report);
                    failed_outputs += report.failure_count();
                }
                Err(e) => {
                    tracing::error!(notebook = %file.display(), error = %e, "Export failed");
                    eprintln!("[ERROR] {}: {e}", file.display());
                    failed_files += 1;
                }
            }
        }
    }

    if failed_files > 0 || failed_outputs > 0 {
        anyhow::bail!(
            "Export incomplete: {failed_files} notebook(s) failed, {failed_outputs} output(s) failed"
        );
    }
    Ok(())
}

fn export_file(
    file: &Path,
    output_dir: &Path,
    config: &SnippetConfig,
    no_execute: bool,
) -> Result<ExportReport> {
    let executor: Box<dyn NotebookExecutor> = if no_execute {
        Box::new(PreExecuted)
    } else {
        Box::new(JupyterExecutor::new(config.jupyter.clone()))
    };
    let renderer = WkhtmltopdfRenderer::new(&config.wkhtmltopdf, &config.pdfcrop);
    let options = ExportOptions {
        table_style: config.table_style.clone(),
    };
    Ok(create_snippets(
        file,
        Some(output_dir),
        executor.as_ref(),
        &renderer,
        &options,
    )?)
}

fn print_report(file: &Path, report: &ExportReport) {
    println!(
        "{}: {} snippet(s) written to {}",
        file.display(),
        report.snippets.len(),
        report.output_dir.display()
    );
    for failure in &report.cell_failures {
        eprintln!("[ERROR] {}: cell {}: {}", file.display(), failure.index, failure.error);
    }
    for snippet in &report.snippets {
        for failure in &snippet.failures {
            eprintln!(
                "[ERROR] {}: snippet {} ({}): {}",
                file.display(),
                snippet.name,
                failure.kind,
                failure.error
            );
        }
    }
}
