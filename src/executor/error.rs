//! Executor errors.

use thiserror::Error;

/// Result type for executor operations.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Generic "unknown error" code that also carries the `nth_plan` diagnostic.
pub const ERR_UNKNOWN: u16 = 1105;

/// Client-side error codes that mean the server could not be reached.
const CONNECTION_ERROR_CODES: [u16; 4] = [2002, 2003, 2006, 2013];

/// Errors surfaced by an [`Executor`](super::Executor).
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The engine rejected or failed the statement.
    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },

    /// The engine could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The engine answered with something we cannot interpret.
    #[error("malformed output: {0}")]
    MalformedOutput(String),

    /// The socket to the engine failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecuteError {
    /// Build a server error, promoting client connection codes.
    pub fn server(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if CONNECTION_ERROR_CODES.contains(&code) {
            return ExecuteError::Connection(message);
        }
        ExecuteError::Server { code, message }
    }

    /// Whether the failure is a connectivity blip worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            ExecuteError::Connection(_) | ExecuteError::Io(_) => true,
            other => is_transient_message(&other.to_string()),
        }
    }

    /// Whether the engine itself reported an error for the statement.
    pub fn is_server(&self) -> bool {
        matches!(self, ExecuteError::Server { .. }) && !self.is_transient()
    }

    /// Whether this is the "plan index out of range" diagnostic.
    pub fn is_plan_out_of_range(&self) -> bool {
        match self {
            ExecuteError::Server { code, message } => is_plan_out_of_range(*code, message),
            _ => false,
        }
    }
}

/// Connection failure heuristics on free-form messages.
pub fn is_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("connection refused") || message.contains("invalid connection")
}

/// Match the engine's `nth_plan` out-of-range diagnostic.
pub fn is_plan_out_of_range(code: u16, message: &str) -> bool {
    code == ERR_UNKNOWN && message.to_lowercase().contains("nth_plan")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_out_of_range() {
        let err = ExecuteError::server(1105, "The parameter of NTH_PLAN() is out of range");
        assert!(err.is_plan_out_of_range());
        assert!(err.is_server());

        let other = ExecuteError::server(1105, "index out of range");
        assert!(!other.is_plan_out_of_range());

        let wrong_code = ExecuteError::server(1064, "nth_plan syntax");
        assert!(!wrong_code.is_plan_out_of_range());
    }

    #[test]
    fn test_transient_errors() {
        assert!(ExecuteError::server(2003, "Can't connect to MySQL server").is_transient());
        assert!(ExecuteError::server(1105, "dial tcp: connection refused").is_transient());
        assert!(ExecuteError::MalformedOutput("invalid connection".into()).is_transient());
        assert!(!ExecuteError::server(1146, "Table 'test.t' doesn't exist").is_transient());
        assert!(!ExecuteError::server(2013, "Lost connection").is_server());
    }
}
