use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use export_core::OutputRecord;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("{} exists and is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Create `dir` (and missing parents) unless it already exists as a directory.
pub fn ensure_directory(dir: &Path) -> Result<(), FilesystemError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(FilesystemError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|source| FilesystemError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(FilesystemError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Replace `path` with `content` by writing a temp file next to it and renaming.
/// A failed write leaves any previous file untouched.
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    let write_err = |source: io::Error| FilesystemError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file_mut().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Ensure the record's directory exists and write its `index.md`.
pub fn write_output_record(record: &OutputRecord) -> Result<PathBuf, FilesystemError> {
    ensure_directory(record.dir())?;
    let target = record.file_path();
    write_file(&target, &record.content)?;
    Ok(target)
}
