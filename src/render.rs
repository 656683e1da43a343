//! External diagram rendering.
//!
//! Turning diagram description text into an image is delegated to an
//! out-of-process tool the pipeline does not control. The [`Renderer`] trait
//! reduces that tool to its contract: input is a `.puml` file, output is an
//! image file or a failure. Render failures are per-view and non-fatal — the
//! site stage shows a placeholder for views without an image.
//!
//! [`PlantUmlRenderer`] shells out to a `plantuml` executable. Tests inject
//! their own `Renderer` implementations instead of requiring the tool.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("renderer '{0}' could not be started: {1}")]
    NotAvailable(String, std::io::Error),
    #[error("rendering {path} failed (exit {status}): {stderr}")]
    Failed {
        path: PathBuf,
        status: i32,
        stderr: String,
    },
    #[error("renderer reported success but produced no file at {0}")]
    MissingOutput(PathBuf),
}

/// An out-of-process diagram renderer: `.puml` text in, image file out.
pub trait Renderer: Sync {
    /// Render `source` into `output_dir`, returning the produced image path.
    fn render(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, RenderError>;

    /// File extension of produced images, without the dot.
    fn extension(&self) -> &'static str {
        "png"
    }

    /// Identity string folded into cache keys — changing the renderer must
    /// invalidate previously rendered images.
    fn describe(&self) -> String {
        "external".to_string()
    }
}

/// Renders through the `plantuml` command-line tool.
#[derive(Debug, Clone)]
pub struct PlantUmlRenderer {
    pub executable: String,
}

impl Default for PlantUmlRenderer {
    fn default() -> Self {
        Self {
            executable: "plantuml".to_string(),
        }
    }
}

impl Renderer for PlantUmlRenderer {
    fn describe(&self) -> String {
        self.executable.clone()
    }

    fn render(&self, source: &Path, output_dir: &Path) -> Result<PathBuf, RenderError> {
        let output = Command::new(&self.executable)
            .arg("-tpng")
            .arg("-o")
            .arg(output_dir)
            .arg(source)
            .output()
            .map_err(|err| RenderError::NotAvailable(self.executable.clone(), err))?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                path: source.to_path_buf(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let produced = output_dir.join(format!("{stem}.png"));
        if !produced.exists() {
            return Err(RenderError::MissingOutput(produced));
        }
        Ok(produced)
    }
}
