//! Error types for the timesheet Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the timesheet Lambda functions.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller passed a value outside its domain (weekday, month, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Request payload failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Nothing recorded for the requested period
    #[error("No data: {0}")]
    NoData(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record already exists where only one is allowed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Remote record store error
    #[error("Store error: {0}")]
    Store(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidArgument(_) | Error::Validation(_) => 400,
            Error::NotFound(_) | Error::NoData(_) => 404,
            Error::Conflict(_) => 409,
            _ => 500,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Store(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidArgument("weekday 9".into()).status_code(), 400);
        assert_eq!(Error::NoData("March 2024".into()).status_code(), 404);
        assert_eq!(Error::Conflict("2024-03-04".into()).status_code(), 409);
        assert_eq!(Error::Store("timeout".into()).status_code(), 500);
    }
}
