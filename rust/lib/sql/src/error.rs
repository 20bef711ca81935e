use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A UNIQUE or PRIMARY KEY index rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("connection error: {0}")]
    Connection(String),
}
