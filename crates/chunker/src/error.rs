use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while preparing chunks
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Invalid configuration (zero token limit, malformed config file)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A convertible item failed to render itself as text
    #[error("Failed to convert item #{index} to text: {source}")]
    TextConversion {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

impl ChunkerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a text conversion error for the item at `index`
    pub fn text_conversion(index: usize, source: std::io::Error) -> Self {
        Self::TextConversion { index, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn text_conversion_keeps_source() {
        let err = ChunkerError::text_conversion(3, std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "Failed to convert item #3 to text: boom");
        assert!(err.source().is_some());
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ChunkerError = io.into();
        assert!(matches!(err, ChunkerError::IoError(_)));
    }
}
