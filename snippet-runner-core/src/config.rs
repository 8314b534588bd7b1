use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};
use url::Url;

use crate::error::{Result, SnippetError};

/// Connection parameters for a GraphQL endpoint. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    url: Url,
    username: String,
    password: String,
}

impl ClientConfig {
    pub fn new(
        url: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let raw_url = url.as_ref().trim();
        let username = username.into();
        let password = password.into();

        if raw_url.is_empty() {
            return Err(SnippetError::Configuration("URL is required".into()));
        }
        if username.is_empty() {
            return Err(SnippetError::Configuration("Username is required".into()));
        }
        if password.is_empty() {
            return Err(SnippetError::Configuration("Password is required".into()));
        }
        let url = Url::parse(raw_url).map_err(|e| {
            SnippetError::Configuration(format!("Invalid endpoint URL {raw_url:?}: {e}"))
        })?;

        Ok(Self {
            url,
            username,
            password,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Hand-written so the password never ends up in a log line.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the snippet runner needs, constructed once at startup.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub client: ClientConfig,
    pub snippet_root: PathBuf,
}

impl RunnerConfig {
    pub fn trace_loaded(&self) {
        info!(
            url = %self.client.url(),
            username = %self.client.username(),
            snippet_root = %self.snippet_root.display(),
            "Loaded runner config"
        );
        debug!(?self, "Runner config loaded (full debug)");
    }
}
