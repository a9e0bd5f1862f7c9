//! Workload directories.
//!
//! A workload is a directory with the statements to benchmark under
//! `queries/`, one statement per file, and an optional `prepare.sql` that
//! sets up schema and data.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::{LoadError, LoadResult};
use super::source::QuerySource;
use crate::executor::Executor;
use crate::sql::Query;

/// Sub-directory holding one statement per file.
pub const QUERY_DIR: &str = "queries";

/// Setup script run before benchmarking when requested.
pub const PREPARE_FILE: &str = "prepare.sql";

/// Serves the statements of a workload directory in path order.
///
/// Files are read eagerly on [`open`](Self::open); parsing happens on demand
/// and statements that fail to parse are skipped with a warning.
#[derive(Debug)]
pub struct WorkloadLoader {
    pending: VecDeque<(String, String)>,
}

impl WorkloadLoader {
    /// Read every file below `<workload>/queries`.
    pub fn open(workload: impl AsRef<Path>) -> LoadResult<Self> {
        let dir = workload.as_ref().join(QUERY_DIR);
        if !dir.is_dir() {
            return Err(LoadError::NotFound(dir));
        }

        let mut files = Vec::new();
        collect_files(&dir, &mut files)?;
        files.sort();

        let mut pending = VecDeque::with_capacity(files.len());
        for path in files {
            let sql = fs::read_to_string(&path).map_err(read_err(&path))?;
            let id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            pending.push_back((id, sql));
        }
        info!(dir = %dir.display(), queries = pending.len(), "loaded workload");
        Ok(Self { pending })
    }

    /// Statements not yet served, including ones that may fail to parse.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl QuerySource for WorkloadLoader {
    fn next_query(&mut self) -> Option<Query> {
        while let Some((id, sql)) = self.pending.pop_front() {
            match Query::new(id.as_str(), sql.as_str()) {
                Ok(query) => return Some(query),
                Err(e) => warn!(query_id = %id, error = %e, "fails to parse, ignore this query"),
            }
        }
        None
    }
}

/// Run `<workload>/prepare.sql` as one script.
pub fn prepare(executor: &dyn Executor, workload: impl AsRef<Path>) -> LoadResult<()> {
    let path = workload.as_ref().join(PREPARE_FILE);
    let script = fs::read_to_string(&path).map_err(read_err(&path))?;
    info!(file = %path.display(), "preparing workload");
    executor.exec(&script)?;
    info!(file = %path.display(), "preparing finished");
    Ok(())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> LoadResult<()> {
    for entry in fs::read_dir(dir).map_err(read_err(dir))? {
        let entry = entry.map_err(read_err(dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(read_err(&path))?;
        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if file_type.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

fn read_err(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError {
    let path = path.to_path_buf();
    move |source| LoadError::Read { path, source }
}
