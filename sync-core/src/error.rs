//! Error types for reply parsing.

use thiserror::Error;

/// A reply body could not be turned into items.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON, or an item object is malformed.
    #[error("malformed reply: {0}")]
    Json(#[from] serde_json::Error),

    /// The body is JSON but not the shape the endpoint returns.
    #[error("unexpected reply shape: {0}")]
    UnexpectedShape(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::UnexpectedShape("expected object".into());
        assert_eq!(err.to_string(), "unexpected reply shape: expected object");
    }

    #[test]
    fn json_errors_convert() {
        let json_err = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let err: ParseError = json_err.into();
        assert!(matches!(err, ParseError::Json(_)));
    }
}
