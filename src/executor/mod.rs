//! The executor boundary.
//!
//! The tester never talks to a database directly: it sees result sets,
//! plan explanations, hint sets and warnings through the [`Executor`] trait.

mod client;
mod error;
mod executor;
mod hints;
mod result;
mod warning;

pub use client::{MysqlClient, MysqlTarget};
pub use error::{ExecuteError, ExecuteResult, ERR_UNKNOWN};
pub use executor::{Executor, Explained};
pub use hints::Hints;
pub use result::{QueryOutcome, Row, Rows};
pub use warning::Warning;
