use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("validation {0}")]
    Validation(String),
    #[error("rate limited")]
    RateLimited,
    #[error("unknown session")]
    UnknownSession,
    #[error("transport {0}")]
    Transport(String),
    #[error("replication {0}")]
    Replication(String),
    #[error("io {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
