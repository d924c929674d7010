//src/error.rs

use thiserror::Error;

/// Errors surfaced by the assignment engine, the assembler and the loaders.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Too many malformed records: {count} (limit {limit})")]
    TooManyParseErrors { count: usize, limit: usize },

    #[error("Invalid classification tree: {0}")]
    InvalidTree(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// True for a user requested stop, as opposed to a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let io_error = Error::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_error.to_string().contains("IO error"));

        let parse = Error::Parse { line: 7, message: "bad score".to_string() };
        assert_eq!(parse.to_string(), "Parse error at line 7: bad score");

        let too_many = Error::TooManyParseErrors { count: 11, limit: 10 };
        assert!(too_many.to_string().contains("limit 10"));
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::InvalidTree("cycle".into()).is_cancelled());
    }
}
