//! Error types for Hyper-V disk operations.
//!
//! Errors are categorized so callers can decide whether an operation is worth
//! running again. The client itself never retries.

use thiserror::Error;

/// Categories of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad arguments, caught before anything ran
    Argument,
    /// Script rendering failed (programmer error)
    Render,
    /// The runner could not reach the host
    Transport,
    /// The host ran the script and reported failure
    Execution,
    /// The host ran the script but its output could not be decoded
    Decode,
}

impl ErrorCategory {
    /// Whether running the same operation again might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport | Self::Execution)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Argument => "Invalid argument",
            Self::Render => "Script rendering failed",
            Self::Transport => "Host unreachable",
            Self::Execution => "Script failed on host",
            Self::Decode => "Unexpected script output",
        }
    }
}

/// Errors that can occur during disk operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument was rejected before any script was rendered
    #[error("invalid argument: {0}")]
    Invalid(String),

    /// The script could not be rendered
    #[error(transparent)]
    Render(#[from] psscript::Error),

    /// The runner could not be started
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that failed to start
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The host ran the script and reported failure
    #[error("{script} failed ({}): {diagnostic}", exit_label(.code))]
    Execution {
        /// Name of the script that failed
        script: &'static str,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Diagnostic text reported by the host
        diagnostic: String,
    },

    /// The host ran the script but produced undecodable output
    #[error("could not decode output of {script}: {source}")]
    Decode {
        /// Name of the script whose output was rejected
        script: &'static str,
        /// The raw output
        output: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Invalid(_) => ErrorCategory::Argument,
            Error::Render(_) => ErrorCategory::Render,
            Error::Launch { .. } => ErrorCategory::Transport,
            Error::Execution { .. } => ErrorCategory::Execution,
            Error::Decode { .. } => ErrorCategory::Decode,
        }
    }

    /// Whether running the operation again might succeed.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// Result type for disk operations.
pub type Result<T> = std::result::Result<T, Error>;
