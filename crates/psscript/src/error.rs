//! Error types for script rendering.
//!
//! Rendering only fails on programmer errors: an argument structure that
//! cannot be encoded, or a verb nobody registered a template for. Neither is
//! worth retrying.

use crate::template::Verb;
use thiserror::Error;

/// Errors that can occur while rendering a script.
#[derive(Debug, Error)]
pub enum Error {
    /// The argument structure could not be encoded as JSON
    #[error("failed to encode arguments for template '{template}': {source}")]
    Encode {
        /// Name of the template being rendered
        template: &'static str,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },

    /// The argument structure encoded to something other than a JSON object
    #[error("arguments for template '{template}' must encode to an object, got {kind}")]
    NotAnObject {
        /// Name of the template being rendered
        template: &'static str,
        /// JSON kind the arguments encoded to
        kind: &'static str,
    },

    /// No template is registered for the requested verb
    #[error("no script template registered for '{0}'")]
    MissingTemplate(Verb),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;
