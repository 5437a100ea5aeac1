use std::io;

use thiserror::Error;

use crate::feedback::FeedbackError;

/// Failures on setup paths. Gameplay itself never errors.
#[derive(Error, Debug)]
pub enum TabellineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feedback provider: {0}")]
    Feedback(#[from] FeedbackError),

    #[error("logging setup: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, TabellineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_keep_the_source_message() {
        let err: TabellineError = io::Error::new(io::ErrorKind::NotFound, "no data dir").into();
        assert_eq!(err.to_string(), "I/O error: no data dir");

        let err: TabellineError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error: "));

        let err: TabellineError = FeedbackError::EmptyResponse.into();
        assert!(err.to_string().starts_with("feedback provider: "));
    }
}
