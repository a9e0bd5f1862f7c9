//! Query sources.

mod error;
mod loader;
mod source;

pub use error::{LoadError, LoadResult};
pub use loader::{prepare, WorkloadLoader, PREPARE_FILE, QUERY_DIR};
pub use source::{QueryList, QuerySource};
