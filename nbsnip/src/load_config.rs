use anyhow::{Context, Result};
use nbsnip_core::TableStyle;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "NBSNIP_OUTPUT_DIR";
/// Environment variable overriding the jupyter executable.
pub const JUPYTER_ENV: &str = "NBSNIP_JUPYTER";

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StaticConfig {
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    jupyter: Option<PathBuf>,
    #[serde(default)]
    wkhtmltopdf: Option<PathBuf>,
    #[serde(default)]
    pdfcrop: Option<PathBuf>,
    #[serde(default)]
    table: TableSection,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TableSection {
    #[serde(default)]
    head_macro: Option<String>,
    #[serde(default)]
    subhead_macro: Option<String>,
}

/// Settings for one export run, merged from the config file and the environment.
#[derive(Debug, Clone)]
pub struct SnippetConfig {
    /// `None` means `./snippets/<notebook directory name>` per notebook.
    pub output_dir: Option<PathBuf>,
    /// `None` means look the executable up.
    pub jupyter: Option<PathBuf>,
    pub wkhtmltopdf: PathBuf,
    pub pdfcrop: PathBuf,
    pub table_style: TableStyle,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            jupyter: None,
            wkhtmltopdf: PathBuf::from("wkhtmltopdf"),
            pdfcrop: PathBuf::from("pdfcrop"),
            table_style: TableStyle::default(),
        }
    }
}

impl SnippetConfig {
    pub fn trace_loaded(&self) {
        info!(
            output_dir = ?self.output_dir,
            jupyter = ?self.jupyter,
            wkhtmltopdf = %self.wkhtmltopdf.display(),
            pdfcrop = %self.pdfcrop.display(),
            "Loaded config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// Load the optional YAML config file and apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<SnippetConfig> {
    let static_conf = match path {
        Some(path) => read_static_config(path)?,
        None => {
            info!("No config file given, using defaults");
            StaticConfig::default()
        }
    };

    let defaults = SnippetConfig::default();
    let table_defaults = defaults.table_style;
    let mut config = SnippetConfig {
        output_dir: static_conf.output_dir,
        jupyter: static_conf.jupyter,
        wkhtmltopdf: static_conf.wkhtmltopdf.unwrap_or(defaults.wkhtmltopdf),
        pdfcrop: static_conf.pdfcrop.unwrap_or(defaults.pdfcrop),
        table_style: TableStyle {
            head_macro: static_conf
                .table
                .head_macro
                .unwrap_or(table_defaults.head_macro),
            subhead_macro: static_conf
                .table
                .subhead_macro
                .unwrap_or(table_defaults.subhead_macro),
        },
    };

    if let Some(dir) = std::env::var_os(OUTPUT_DIR_ENV) {
        info!(var = OUTPUT_DIR_ENV, "Output directory overridden from env");
        config.output_dir = Some(PathBuf::from(dir));
    }
    if let Some(jupyter) = std::env::var_os(JUPYTER_ENV) {
        info!(var = JUPYTER_ENV, "Jupyter executable overridden from env");
        config.jupyter = Some(PathBuf::from(jupyter));
    }

    config.trace_loaded();
    Ok(config)
}

fn read_static_config(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path)
        .inspect_err(|e| error!(error = ?e, config_path = ?path, "Failed to read config file"))
        .with_context(|| format!("Failed to read config file {path:?}"))?;

    // An empty file is a valid, empty config.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }
    let conf: StaticConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| error!(error = ?e, config_path = ?path, "Failed to parse config YAML"))
        .context("Failed to parse config YAML")?;
    info!(config_path = ?path, "Parsed config YAML successfully");
    Ok(conf)
}
