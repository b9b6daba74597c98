use thiserror::Error;

/// Main error type for embedrank
#[derive(Error, Debug)]
pub enum EmbedrankError {
    /// Caller passed the wrong input shape (a batch where one text was expected, or the reverse)
    #[error("Input type error: {0}")]
    InputType(String),

    /// Embedding requested before the model was loaded
    #[error("Model not ready: {0}")]
    NotReady(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tab-separated input could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding model errors (loading or inference)
    #[error("Embedding model error: {0}")]
    Model(String),

    /// Malformed input data
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using EmbedrankError
pub type Result<T> = std::result::Result<T, EmbedrankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmbedrankError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_not_ready_display() {
        let err = EmbedrankError::NotReady("call load() first".to_string());
        assert_eq!(err.to_string(), "Model not ready: call load() first");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EmbedrankError = io_err.into();
        assert!(matches!(err, EmbedrankError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: EmbedrankError = json_err.into();
        assert!(matches!(err, EmbedrankError::Json(_)));
    }
}
