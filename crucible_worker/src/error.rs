use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed in IO")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("queue error: {0}")]
    Queue(#[from] lapin::Error),
    #[error("api error: {0}")]
    Api(#[from] reqwest::Error),
    #[error("judge error: {0}")]
    Judge(#[from] crucible_core::error::Error),
    #[error("judge task aborted: {0}")]
    Task(String),
}
