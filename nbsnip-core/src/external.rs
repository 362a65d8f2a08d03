use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info};

use crate::contract::{HtmlRenderer, NotebookExecutor};
use crate::error::ExportError;
use crate::notebook::Notebook;

const JUPYTER: &str = "jupyter";

/// Runs notebooks with `jupyter nbconvert --to notebook --stdout`.
#[derive(Debug, Clone, Default)]
pub struct JupyterExecutor {
    jupyter: Option<PathBuf>,
}

impl JupyterExecutor {
    /// `jupyter` overrides the lookup: a bare name is searched on `PATH`, anything else must
    /// exist as given.
    pub fn new(jupyter: Option<PathBuf>) -> Self {
        Self { jupyter }
    }

    /// Find the jupyter executable.
    ///
    /// Order: the configured path, the active virtualenv or conda prefix, then `PATH`.
    pub fn locate(&self) -> Result<PathBuf, ExportError> {
        if let Some(configured) = &self.jupyter {
            if configured.components().count() > 1 {
                if configured.is_file() {
                    return Ok(configured.clone());
                }
                return Err(ExportError::ExecutorNotFound(
                    configured.display().to_string(),
                ));
            }
            return find_in_path(configured.as_os_str()).ok_or_else(|| {
                ExportError::ExecutorNotFound(format!("PATH (as {})", configured.display()))
            });
        }

        for var in ["VIRTUAL_ENV", "CONDA_PREFIX"] {
            if let Some(prefix) = std::env::var_os(var) {
                let candidate = Path::new(&prefix).join("bin").join(JUPYTER);
                debug!(candidate = %candidate.display(), "Looking for jupyter in environment prefix");
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
        find_in_path(OsStr::new(JUPYTER)).ok_or_else(|| ExportError::ExecutorNotFound("PATH".into()))
    }
}

impl NotebookExecutor for JupyterExecutor {
    fn execute(&self, path: &Path) -> Result<Notebook, ExportError> {
        let jupyter = self.locate()?;
        info!(jupyter = %jupyter.display(), notebook = %path.display(), "Executing notebook");
        let mut cmd = Command::new(&jupyter);
        cmd.args(["nbconvert", "--to", "notebook", "--stdout"]).arg(path);
        let stdout = run(cmd, None)?;
        Notebook::from_slice(&stdout)
    }
}

/// Renders HTML with `wkhtmltopdf` and crops the result with `pdfcrop`.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    wkhtmltopdf: PathBuf,
    pdfcrop: PathBuf,
}

impl Default for WkhtmltopdfRenderer {
    fn default() -> Self {
        Self {
            wkhtmltopdf: PathBuf::from("wkhtmltopdf"),
            pdfcrop: PathBuf::from("pdfcrop"),
        }
    }
}

impl WkhtmltopdfRenderer {
    pub fn new(wkhtmltopdf: impl Into<PathBuf>, pdfcrop: impl Into<PathBuf>) -> Self {
        Self {
            wkhtmltopdf: wkhtmltopdf.into(),
            pdfcrop: pdfcrop.into(),
        }
    }
}

impl HtmlRenderer for WkhtmltopdfRenderer {
    fn render_pdf(&self, html: &[u8]) -> Result<Vec<u8>, ExportError> {
        let mut cmd = Command::new(&self.wkhtmltopdf);
        cmd.args(["-", "-"]);
        run(cmd, Some(html))
    }

    fn crop_pdf(&self, pdf: &[u8]) -> Result<Vec<u8>, ExportError> {
        let dir = tempfile::tempdir().map_err(|e| ExportError::io(std::env::temp_dir(), e))?;
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("cropped.pdf");
        std::fs::write(&input, pdf).map_err(|e| ExportError::io(&input, e))?;

        let mut cmd = Command::new(&self.pdfcrop);
        cmd.arg(&input).arg(&output);
        run(cmd, None)?;
        std::fs::read(&output).map_err(|e| ExportError::io(&output, e))
    }
}

fn find_in_path(name: &OsStr) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Run a command to completion, feeding `stdin` if given, and return its stdout.
fn run(mut cmd: Command, stdin: Option<&[u8]>) -> Result<Vec<u8>, ExportError> {
    let command = cmd.get_program().to_string_lossy().into_owned();
    debug!(command = %command, args = ?cmd.get_args().collect::<Vec<_>>(), "Spawning process");
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| {
        error!(command = %command, error = %source, "Failed to launch process");
        ExportError::Spawn {
            command: command.clone(),
            source,
        }
    })?;

    // Feed stdin from a separate thread so a full stdout pipe cannot deadlock us.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_vec();
            Some(std::thread::spawn(move || pipe.write_all(&input)))
        }
        _ => None,
    };

    let output = child.wait_with_output().map_err(|source| ExportError::Spawn {
        command: command.clone(),
        source,
    })?;
    if let Some(writer) = writer {
        if let Ok(Err(e)) = writer.join() {
            debug!(command = %command, error = %e, "Process closed stdin early");
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(command = %command, status = %output.status, stderr = %stderr, "Process exited with non-zero code");
        return Err(ExportError::ProcessFailed {
            command,
            status: output.status.to_string(),
            stderr,
        });
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// A prefix directory holding an (empty) `bin/jupyter`.
    fn env_prefix() -> tempfile::TempDir {
        let prefix = tempfile::tempdir().unwrap();
        std::fs::create_dir(prefix.path().join("bin")).unwrap();
        std::fs::write(prefix.path().join("bin").join(JUPYTER), b"").unwrap();
        prefix
    }

    #[test]
    #[serial]
    fn active_virtualenv_is_searched_before_path() {
        let venv = env_prefix();
        std::env::remove_var("CONDA_PREFIX");
        std::env::set_var("VIRTUAL_ENV", venv.path());
        let located = JupyterExecutor::default().locate();
        std::env::remove_var("VIRTUAL_ENV");

        assert_eq!(located.unwrap(), venv.path().join("bin").join(JUPYTER));
    }

    #[test]
    #[serial]
    fn configured_path_wins_over_environment_prefix() {
        let conda = env_prefix();
        let configured = tempfile::NamedTempFile::new().unwrap();
        std::env::set_var("CONDA_PREFIX", conda.path());
        let located = JupyterExecutor::new(Some(configured.path().to_path_buf())).locate();
        std::env::remove_var("CONDA_PREFIX");

        assert_eq!(located.unwrap(), configured.path());
    }

    #[test]
    fn configured_jupyter_path_must_exist() {
        let executor = JupyterExecutor::new(Some(PathBuf::from("/nonexistent/bin/jupyter")));
        match executor.locate() {
            Err(ExportError::ExecutorNotFound(path)) => {
                assert!(path.contains("/nonexistent/bin/jupyter"))
            }
            other => panic!("expected ExecutorNotFound, got {other:?}"),
        }
    }

    #[test]
    fn configured_existing_file_is_used() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let executor = JupyterExecutor::new(Some(file.path().to_path_buf()));
        assert_eq!(executor.locate().unwrap(), file.path());
    }

    #[cfg(unix)]
    #[test]
    fn failing_process_reports_status() {
        let cmd = Command::new("false");
        assert!(matches!(
            run(cmd, None),
            Err(ExportError::ProcessFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn stdin_is_piped_to_process() {
        let cmd = Command::new("cat");
        assert_eq!(run(cmd, Some(&b"<p>hi</p>"[..])).unwrap(), b"<p>hi</p>");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cmd = Command::new("nbsnip-definitely-not-installed");
        assert!(matches!(run(cmd, None), Err(ExportError::Spawn { .. })));
    }
}
