use crate::{Error, Result};
use std::path::Path;

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Returns `true` when `path` is absent or holds nothing but entries named in `ignore`.
pub fn is_dir_empty(path: &Path, ignore: &[&str]) -> Result<bool> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => {
            return Err(Error::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    for entry in entries {
        let entry = entry.map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = entry.file_name();
        if !ignore.iter().any(|i| name == *i) {
            return Ok(false);
        }
    }
    Ok(true)
}
