//! Output tree writer

use std::io;
use std::path::{Component, Path, PathBuf};

/// Writes files below the output root, creating directories as needed
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` at `relative` and returns the number of bytes written
    ///
    /// Paths that would leave the output root are rejected with
    /// `InvalidInput`.
    pub async fn write(&self, relative: &Path, bytes: &[u8]) -> io::Result<u64> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write outside the output root: {}", relative.display()),
            ));
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(bytes.len() as u64)
    }
}
