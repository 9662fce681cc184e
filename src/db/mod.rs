pub mod executor;

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ExecutionError {
    ConnectionError(String),
    QueryError(String),
    TaskError(String),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::ConnectionError(msg) => write!(f, "Database connection error: {}", msg),
            ExecutionError::QueryError(msg) => write!(f, "SQL error: {}", msg),
            ExecutionError::TaskError(msg) => write!(f, "Database task error: {}", msg),
        }
    }
}

impl Error for ExecutionError {}
