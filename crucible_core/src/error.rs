use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed in IO")]
    Io(#[from] std::io::Error),
    #[error("sandbox backend failed: {0}")]
    Sandbox(String),
    #[error("environment error: {0}")]
    Environment(String),
    #[error("argument provided is error: {0}")]
    Argument(String),
    #[error("problem is misconfigured: {0}")]
    Problem(String),
}
