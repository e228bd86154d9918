use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A staging path next to `target` that only replaces it on [`StagedFile::commit`].
///
/// The staging file lives in the same directory as the target so the final
/// rename never crosses a filesystem boundary. If the value is dropped
/// without committing, the staging file is removed and the target is left
/// exactly as it was.
#[derive(Debug)]
pub struct StagedFile {
    staging_path: PathBuf,
    target_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn new(target: impl AsRef<Path>) -> Result<Self> {
        let target_path = target.as_ref().to_path_buf();
        let parent = target_path.parent().ok_or_else(|| Error::Write {
            path: target_path.clone(),
            source: std::io::Error::other("no parent directory"),
        })?;
        crate::ensure_dir(parent)?;

        let file_name = target_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        let staging_path = parent.join(format!(".{file_name}.part"));

        Ok(Self {
            staging_path,
            target_path,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn target(&self) -> &Path {
        &self.target_path
    }

    pub fn commit(mut self) -> Result<()> {
        std::fs::rename(&self.staging_path, &self.target_path).map_err(|e| Error::Write {
            path: self.target_path.clone(),
            source: e,
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.staging_path);
        }
    }
}
