use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CourierTypesError {
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
    #[error("invalid base64 input")]
    InvalidBase64,
    #[error("json error")]
    JsonError,
}

pub type Result<T> = std::result::Result<T, CourierTypesError>;

impl From<serde_json::Error> for CourierTypesError {
    fn from(_: serde_json::Error) -> Self {
        CourierTypesError::JsonError
    }
}

impl From<base64::DecodeError> for CourierTypesError {
    fn from(_: base64::DecodeError) -> Self {
        CourierTypesError::InvalidBase64
    }
}
