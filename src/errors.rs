//! Error types for docpy.

use std::path::PathBuf;

use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for docpy operations.
#[derive(Debug, thiserror::Error)]
pub enum DocpyError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("no Python modules found in {0}")]
    NoModulesFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl DocpyError {
    /// Classify a read failure on `path`.
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => DocpyError::PathNotFound(path),
            std::io::ErrorKind::PermissionDenied => DocpyError::PermissionDenied(path),
            _ => DocpyError::Read { path, source },
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &DocpyError) -> i32 {
    match error {
        DocpyError::PathNotFound(_) => 3,
        DocpyError::PermissionDenied(_) => 4,
        DocpyError::NoModulesFound(_) => 5,
        DocpyError::Read { .. } => 6,
        DocpyError::Write { .. } => 7,
        DocpyError::Io(_) => 1,
        DocpyError::Walk(_) => 2,
        DocpyError::Output(_) => 1,
    }
}
