//! Workload loading errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::executor::ExecuteError;

/// Result type for workload loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while reading a workload directory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("workload directory not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prepare script failed: {0}")]
    Prepare(#[from] ExecuteError),
}
