/// `load_config` module: builds the runner and importer configuration from the
/// process environment.
///
/// This is the only place that reads environment variables. Everything below the
/// CLI boundary receives an explicit config struct.
///
/// # Responsibilities
/// - Read the required variables and fail fast with a configuration error when
///   any is missing or empty
/// - Validate URLs before any network traffic happens
/// - Keep secrets out of logs (only `*_set` booleans are traced)
///
/// Each loader has a `*_from` variant taking a lookup function, so tests can
/// feed values without touching the process environment.
use std::fmt;
use std::path::PathBuf;

use snippet_runner_core::{ClientConfig, RunnerConfig, SnippetError};
use tracing::{error, info};
use url::Url;

pub const ENV_URL: &str = "ATL_URL";
pub const ENV_USERNAME: &str = "ATL_USERNAME";
pub const ENV_PASSWORD: &str = "ATL_PASSWORD";
pub const ENV_SNIPPET_PATH: &str = "ATL_SNIPPET_PATH";

pub const ENV_BITBUCKET_URL: &str = "BITBUCKET_URL";
pub const ENV_BITBUCKET_TOKEN: &str = "BITBUCKET_TOKEN";
pub const ENV_ATLASSIAN_EMAIL: &str = "ATLASSIAN_EMAIL";
pub const ENV_ATLASSIAN_API_TOKEN: &str = "ATLASSIAN_API_TOKEN";
pub const ENV_ATLASSIAN_SUBDOMAIN: &str = "ATLASSIAN_SUBDOMAIN";
pub const ENV_CLOUD_ID: &str = "COMPASS_CLOUD_ID";
pub const ENV_DRY_RUN: &str = "DRY_RUN";
pub const ENV_GRAPHQL_URL: &str = "ATLASSIAN_GRAPHQL_URL";
pub const ENV_EXCLUDE: &str = "IMPORT_EXCLUDE";

fn required<F>(lookup: &F, key: &str) -> Result<String, SnippetError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            error!(var = key, "Required environment variable not set");
            Err(SnippetError::Configuration(format!(
                "{key} environment variable is required"
            )))
        }
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_url(key: &str, raw: &str) -> Result<Url, SnippetError> {
    Url::parse(raw).map_err(|e| {
        error!(var = key, error = %e, "Environment variable is not a valid URL");
        SnippetError::Configuration(format!("{key} is not a valid URL: {e}"))
    })
}

/// Loads the snippet runner configuration from the process environment.
pub fn load_config() -> Result<RunnerConfig, SnippetError> {
    load_config_from(|key| std::env::var(key).ok())
}

pub fn load_config_from<F>(lookup: F) -> Result<RunnerConfig, SnippetError>
where
    F: Fn(&str) -> Option<String>,
{
    let url = required(&lookup, ENV_URL)?;
    let username = required(&lookup, ENV_USERNAME)?;
    let password = required(&lookup, ENV_PASSWORD)?;
    let snippet_root = PathBuf::from(required(&lookup, ENV_SNIPPET_PATH)?);

    let client = ClientConfig::new(&url, username, password)?;
    let config = RunnerConfig {
        client,
        snippet_root,
    };
    config.trace_loaded();
    Ok(config)
}

/// Everything the Bitbucket → catalog importer needs.
#[derive(Clone)]
pub struct ImporterConfig {
    pub bitbucket_url: Url,
    pub bitbucket_token: String,
    pub atlassian_email: String,
    pub atlassian_api_token: String,
    pub subdomain: String,
    pub cloud_id: String,
    pub dry_run: bool,
    /// Overrides the gateway derived from `subdomain`.
    pub graphql_url: Option<Url>,
    /// `KEY` or `KEY/slug` entries to leave out of the import.
    pub exclude: Vec<String>,
}

impl ImporterConfig {
    pub fn graphql_endpoint(&self) -> String {
        match &self.graphql_url {
            Some(url) => url.to_string(),
            None => format!("https://{}.atlassian.net/gateway/api/graphql", self.subdomain),
        }
    }
}

impl fmt::Debug for ImporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImporterConfig")
            .field("bitbucket_url", &self.bitbucket_url.as_str())
            .field("atlassian_email", &self.atlassian_email)
            .field("subdomain", &self.subdomain)
            .field("cloud_id", &self.cloud_id)
            .field("dry_run", &self.dry_run)
            .field("graphql_url", &self.graphql_url.as_ref().map(Url::as_str))
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

/// `DRY_RUN=1` (or `true`) enables dry run; anything else leaves it off.
pub fn dry_run_enabled(value: Option<&str>) -> bool {
    matches!(value.map(|v| v.trim().to_ascii_lowercase()).as_deref(), Some("1") | Some("true"))
}

pub fn load_importer_config() -> Result<ImporterConfig, SnippetError> {
    load_importer_config_from(|key| std::env::var(key).ok())
}

pub fn load_importer_config_from<F>(lookup: F) -> Result<ImporterConfig, SnippetError>
where
    F: Fn(&str) -> Option<String>,
{
    let bitbucket_url = parse_url(ENV_BITBUCKET_URL, &required(&lookup, ENV_BITBUCKET_URL)?)?;
    let bitbucket_token = required(&lookup, ENV_BITBUCKET_TOKEN)?;
    let atlassian_email = required(&lookup, ENV_ATLASSIAN_EMAIL)?;
    let atlassian_api_token = required(&lookup, ENV_ATLASSIAN_API_TOKEN)?;
    let subdomain = required(&lookup, ENV_ATLASSIAN_SUBDOMAIN)?;
    let cloud_id = required(&lookup, ENV_CLOUD_ID)?;
    let dry_run = dry_run_enabled(lookup(ENV_DRY_RUN).as_deref());
    let graphql_url = optional(&lookup, ENV_GRAPHQL_URL)
        .map(|raw| parse_url(ENV_GRAPHQL_URL, &raw))
        .transpose()?;
    let exclude = optional(&lookup, ENV_EXCLUDE)
        .map(|raw| {
            raw.split(',')
                .map(|entry| entry.trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let config = ImporterConfig {
        bitbucket_url,
        bitbucket_token,
        atlassian_email,
        atlassian_api_token,
        subdomain,
        cloud_id,
        dry_run,
        graphql_url,
        exclude,
    };
    info!(
        bitbucket_url = %config.bitbucket_url,
        subdomain = %config.subdomain,
        dry_run = config.dry_run,
        bitbucket_token_set = !config.bitbucket_token.is_empty(),
        excluded = config.exclude.len(),
        "Loaded importer config"
    );
    Ok(config)
}
