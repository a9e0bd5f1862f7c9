//! Errors from classifying workload statements and placing plan hints.

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// sqlparser rejected the text, either while tokenizing or parsing.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Parsed, but neither a read nor a write we know how to compare.
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// The statement does not start with a keyword that takes a hint block.
    #[error("cannot place a plan hint after '{found}'")]
    NoHintPosition { found: String },

    #[error("empty query")]
    EmptyQuery,

    #[error("expected one statement per query, found several")]
    MultipleStatements,
}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(e: sqlparser::parser::ParserError) -> Self {
        ParseError::Syntax(e.to_string())
    }
}

impl From<sqlparser::tokenizer::TokenizerError> for ParseError {
    fn from(e: sqlparser::tokenizer::TokenizerError) -> Self {
        ParseError::Syntax(e.to_string())
    }
}
