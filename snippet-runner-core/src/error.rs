//! Error taxonomy shared by the snippet runner and its command surface.
//!
//! GraphQL errors in a snippet's own response have no variant here: they come
//! back inside the response body and are handed to the caller untouched.
//! Only requests the runner issues for itself, such as introspection, map
//! them to [`SnippetError::Remote`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnippetError {
    /// Missing or invalid configuration value (environment, URL, credentials).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown snippet name, or a missing optional file that was asked for.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed argument payload supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The snippet directory has no GraphQL document.
    #[error("No GraphQL document found in {}", .0.display())]
    FileNotFound(PathBuf),

    /// The GraphQL document could not be parsed.
    #[error("Invalid GraphQL document {}: {message}", path.display())]
    InvalidDocument { path: PathBuf, message: String },

    /// HTTP or network failure talking to the endpoint.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered an internal request with GraphQL errors.
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SnippetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnippetError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for SnippetError {
    fn from(e: reqwest::Error) -> Self {
        SnippetError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnippetError>;

/// Errors raised by the catalog importer's collaborators.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Source API error: {0}")]
    Source(String),

    #[error("Catalog API error: {0}")]
    Catalog(String),
}
