//! Cardinality probe errors.

use thiserror::Error;

use crate::executor::ExecuteError;

/// Result type for cardinality probes.
pub type CardResult<T> = Result<T, CardError>;

#[derive(Debug, Error)]
pub enum CardError {
    #[error("probing {table}.{column}: {source}")]
    Execute {
        table: String,
        column: String,
        #[source]
        source: ExecuteError,
    },

    #[error("unexpected distinct count for {table}.{column}: {value:?}")]
    MalformedCount {
        table: String,
        column: String,
        value: Option<String>,
    },

    #[error("invalid column spec '{0}', expected table.column")]
    InvalidColumn(String),

    #[error("probe worker for {table}.{column} panicked")]
    WorkerPanicked { table: String, column: String },
}

impl CardError {
    pub(crate) fn execute(table: &str, column: &str, source: ExecuteError) -> Self {
        CardError::Execute {
            table: table.to_string(),
            column: column.to_string(),
            source,
        }
    }
}
