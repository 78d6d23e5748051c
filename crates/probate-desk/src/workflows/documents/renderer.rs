use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Converts an HTML document into PDF bytes.
pub trait HtmlRenderer: Send + Sync {
    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Failure while driving the external renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to launch renderer `{binary}`: {source}")]
    Launch {
        binary: String,
        #[source]
        source: io::Error,
    },
    #[error("renderer exited with status {status:?}: {stderr}")]
    Exit { status: Option<i32>, stderr: String },
    #[error("renderer finished without producing a PDF")]
    MissingOutput,
    #[error("renderer scratch files: {0}")]
    Io(#[from] io::Error),
}

static RENDER_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// One headless Chromium process per render: launch, print to PDF, exit.
#[derive(Debug, Clone)]
pub struct HeadlessChromium {
    binary: PathBuf,
    scratch_root: PathBuf,
}

impl HeadlessChromium {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            scratch_root: std::env::temp_dir(),
        }
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    fn scratch_dir(&self) -> io::Result<ScratchDir> {
        let sequence = RENDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let path = self
            .scratch_root
            .join(format!("probate-desk-render-{}-{sequence}", std::process::id()));
        fs::create_dir_all(&path)?;
        Ok(ScratchDir(path))
    }
}

impl HtmlRenderer for HeadlessChromium {
    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let scratch = self.scratch_dir()?;
        let input = scratch.path().join("input.html");
        let output = scratch.path().join("output.pdf");
        fs::write(&input, html)?;

        debug!(binary = %self.binary.display(), "launching headless renderer");
        let result = Command::new(&self.binary)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .output()
            .map_err(|source| RenderError::Launch {
                binary: self.binary.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::Exit {
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        match fs::read(&output) {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            Ok(_) => Err(RenderError::MissingOutput),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(RenderError::MissingOutput),
            Err(err) => Err(err.into()),
        }
    }
}

/// Removed on drop, whether or not the render succeeded.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.0) {
            debug!(path = %self.0.display(), error = %err, "scratch directory not removed");
        }
    }
}
