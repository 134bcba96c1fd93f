use thiserror::Error;
use yakpurger_engine::{BatchError, ConfigError, CredentialsError, PurgeError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("Purge client error: {0}")]
    Purge(#[from] PurgeError),

    #[error("{0}")]
    Batch(#[from] BatchError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// The batch index to pass to `--skipToBatch` when resuming, if any.
    pub fn resume_batch(&self) -> Option<usize> {
        match self {
            AppError::Batch(e) => Some(e.batch_index),
            _ => None,
        }
    }
}
