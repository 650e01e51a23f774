//! Error types for twablet-sync.

use thiserror::Error;

/// Errors raised while building a [`Query`](crate::Query) from caller arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A required argument is absent or empty.
    #[error("{endpoint} requires a non-empty `{argument}` argument")]
    MissingArgument {
        /// Endpoint path being built.
        endpoint: &'static str,
        /// Name of the missing argument.
        argument: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ConstructionError::MissingArgument {
            endpoint: "search/tweets.json",
            argument: "q",
        };
        assert_eq!(
            err.to_string(),
            "search/tweets.json requires a non-empty `q` argument"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConstructionError>();
    }
}
