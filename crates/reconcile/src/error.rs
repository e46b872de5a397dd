//! Error types for reconciliation

use psscript::Verb;
use thiserror::Error;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from a reconciliation cycle
#[derive(Debug, Error)]
pub enum Error {
    /// The desired attributes contradict each other; nothing was sent to the host
    #[error("invalid disk {path:?}: {message}")]
    Invalid { path: String, message: String },

    /// The cancel token was set before the named operation started
    #[error("{verb} {path}: cancelled")]
    Cancelled { verb: Verb, path: String },

    /// An artifact operation failed
    #[error("{verb} {path}: {source}")]
    Operation {
        verb: Verb,
        path: String,
        source: hvclient::Error,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// The client error behind an operation failure.
    pub fn client_error(&self) -> Option<&hvclient::Error> {
        match self {
            Error::Operation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether repeating the cycle might succeed
    pub fn is_retryable(&self) -> bool {
        self.client_error().is_some_and(hvclient::Error::is_retryable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_message_names_verb_and_path() {
        let err = Error::Operation {
            verb: Verb::Resize,
            path: r"C:\vms\a.vhdx".to_string(),
            source: hvclient::Error::Execution {
                script: "ResizeVhd",
                code: Some(1),
                diagnostic: "disk in use".to_string(),
            },
        };

        let message = err.to_string();
        assert!(message.starts_with(r"resize C:\vms\a.vhdx: "));
        assert!(message.contains("disk in use"));
        assert!(err.is_retryable());
        assert!(err.client_error().is_some());
    }

    #[test]
    fn test_invalid_is_not_retryable() {
        let err = Error::Invalid {
            path: String::new(),
            message: "path argument is required".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.client_error().is_none());
    }

    #[test]
    fn test_cancelled_message() {
        let err = Error::Cancelled {
            verb: Verb::Read,
            path: "a".to_string(),
        };
        assert_eq!(err.to_string(), "read a: cancelled");
    }
}
