#![doc = "Bitbucket Data Center client: implements the core `RepositorySource` trait over the REST API."]
//
//! # Bitbucket Data Center source
//!
//! Lists projects and repositories through `/rest/api/1.0`, following the
//! server's paging (`isLastPage` / `nextPageStart`) until the last page.
//!
//! - Authentication is a personal access token sent as a bearer token.
//! - Results are returned in the server's order, which the import loop keeps.
//! - Any non-success status or undecodable page aborts the listing with
//!   [`ImportError::Source`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;

use snippet_runner_core::contract::{RepositorySource, SourceProject, SourceRepository};
use snippet_runner_core::ImportError;

const API_PREFIX: &str = "rest/api/1.0";
const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    #[serde(default = "default_last_page")]
    is_last_page: bool,
    next_page_start: Option<u32>,
}

fn default_last_page() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ProjectDto {
    key: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectRefDto {
    key: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryDto {
    slug: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    project: ProjectRefDto,
}

pub struct BitbucketClient {
    base_url: Url,
    token: String,
    page_limit: u32,
    http: reqwest::Client,
}

impl BitbucketClient {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        info!(base_url = %base_url, "Initialised Bitbucket client");
        Self {
            base_url,
            token: token.into(),
            page_limit: DEFAULT_PAGE_LIMIT,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            API_PREFIX,
            path
        )
    }

    /// Collects every value of a paged collection.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ImportError> {
        let url = self.endpoint(path);
        let mut values = Vec::new();
        let mut start: u32 = 0;

        loop {
            debug!(%url, start, limit = self.page_limit, "Fetching Bitbucket page");
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[("start", start), ("limit", self.page_limit)])
                .send()
                .await
                .map_err(|e| {
                    error!(error = ?e, %url, "Bitbucket request failed to send");
                    ImportError::Source(format!("request to {url} failed: {e}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                error!(%status, %url, "Bitbucket returned an error status");
                return Err(ImportError::Source(format!(
                    "GET {url} returned {status}: {}",
                    body.chars().take(256).collect::<String>()
                )));
            }

            let page: Page<T> = response.json().await.map_err(|e| {
                error!(error = ?e, %url, "Failed to decode Bitbucket page");
                ImportError::Source(format!("invalid page from {url}: {e}"))
            })?;
            values.extend(page.values);

            match page.next_page_start {
                Some(next) if !page.is_last_page && next > start => start = next,
                _ => break,
            }
        }

        Ok(values)
    }
}

#[async_trait]
impl RepositorySource for BitbucketClient {
    async fn list_projects(&self) -> Result<Vec<SourceProject>, ImportError> {
        let projects: Vec<ProjectDto> = self.get_all("projects").await?;
        info!(count = projects.len(), "[IMPORT] Listed Bitbucket projects");
        Ok(projects
            .into_iter()
            .map(|p| SourceProject {
                key: p.key,
                name: p.name,
            })
            .collect())
    }

    async fn list_repositories(
        &self,
        project_key: &str,
    ) -> Result<Vec<SourceRepository>, ImportError> {
        let repos: Vec<RepositoryDto> = self
            .get_all(&format!("projects/{project_key}/repos"))
            .await?;
        info!(project_key, count = repos.len(), "[IMPORT] Listed Bitbucket repositories");
        Ok(repos
            .into_iter()
            .map(|r| SourceRepository {
                project_key: r.project.key,
                slug: r.slug,
                name: r.name,
                description: r.description.filter(|d| !d.trim().is_empty()),
            })
            .collect())
    }
}
