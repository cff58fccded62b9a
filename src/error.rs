use thiserror::Error;

/// Pre-flight failures. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid JSON in headers: {0}")]
    InvalidHeaders(String),
    #[error("Invalid JSON in body: {0}")]
    InvalidBody(String),
    #[error("Request count must be between 1 and {max}, got {count}")]
    CountOutOfRange { count: u32, max: u32 },
    #[error("Unsupported HTTP method: {0}")]
    UnknownMethod(String),
}

impl ValidationError {
    /// Name of the input field the presentation layer should focus.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidHeaders(_) => "headers",
            ValidationError::InvalidBody(_) => "body",
            ValidationError::CountOutOfRange { .. } => "count",
            ValidationError::UnknownMethod(_) => "method",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_match_inputs() {
        assert_eq!(ValidationError::InvalidHeaders("x".into()).field(), "headers");
        assert_eq!(ValidationError::InvalidBody("x".into()).field(), "body");
        assert_eq!(
            ValidationError::CountOutOfRange {
                count: 0,
                max: 1000
            }
            .field(),
            "count"
        );
    }

    #[test]
    fn count_error_mentions_bounds() {
        let err = ValidationError::CountOutOfRange {
            count: 1001,
            max: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Request count must be between 1 and 1000, got 1001"
        );
    }
}
