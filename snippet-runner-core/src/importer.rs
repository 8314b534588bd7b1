//! Catalog import pipeline: source repositories → catalog components.
//!
//! For every repository the source lists (projects in source order, then
//! repositories in source order) the importer derives a canonical URL and
//! moves the repository to exactly one outcome:
//!
//! - `Skipped`: the URL was already handled in this run, or the catalog already
//!   has a component linked to it.
//! - `WouldAdd`: dry run; nothing is written.
//! - `Added`: a component was created.
//! - `Failed`: the lookup or the create call errored. The loop carries on.
//!
//! Listing failures on the source side abort the run; there is nothing
//! meaningful to continue with.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::contract::{ComponentCatalog, NewComponent, RepositorySource, SourceRepository};
use crate::error::ImportError;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Base URL of the source host, used to derive repository URLs.
    pub source_base_url: Url,
    pub dry_run: bool,
    /// Labels attached to every created component.
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Skipped,
    WouldAdd,
    Added { component_id: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRecord {
    pub project_key: String,
    pub slug: String,
    pub url: String,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub records: Vec<ImportRecord>,
}

impl ImportReport {
    fn count(&self, pred: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Skipped))
    }

    pub fn would_add(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::WouldAdd))
    }

    pub fn added(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Added { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Failed { .. }))
    }
}

/// `{base}/projects/{KEY}/repos/{slug}/browse`
pub fn repository_url(base: &Url, project_key: &str, slug: &str) -> String {
    format!(
        "{}/projects/{}/repos/{}/browse",
        base.as_str().trim_end_matches('/'),
        project_key,
        slug
    )
}

/// Identity key for deduplication: query and fragment dropped, trailing
/// slashes trimmed, compared case-insensitively.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let canonical = match Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => trimmed.to_string(),
    };
    canonical.trim_end_matches('/').to_lowercase()
}

pub async fn import_repositories<S, C, F>(
    source: &S,
    catalog: &C,
    options: &ImportOptions,
    filter: F,
) -> Result<ImportReport, ImportError>
where
    S: RepositorySource + ?Sized,
    C: ComponentCatalog + ?Sized,
    F: Fn(&SourceRepository) -> bool,
{
    info!(
        dry_run = options.dry_run,
        source = %options.source_base_url,
        "[IMPORT] Starting repository import"
    );

    let mut report = ImportReport::default();
    let mut handled: HashSet<String> = HashSet::new();

    let projects = source.list_projects().await.map_err(|e| {
        error!(error = %e, "[IMPORT][ERROR] Failed to list projects");
        e
    })?;
    info!(count = projects.len(), "[IMPORT] Listed projects");

    for project in &projects {
        let repositories = source.list_repositories(&project.key).await.map_err(|e| {
            error!(
                project = %project.key,
                error = %e,
                "[IMPORT][ERROR] Failed to list repositories"
            );
            e
        })?;
        debug!(project = %project.key, count = repositories.len(), "[IMPORT] Listed repositories");

        for repo in repositories {
            if !filter(&repo) {
                debug!(
                    project = %repo.project_key,
                    slug = %repo.slug,
                    "[IMPORT] Excluded by filter"
                );
                continue;
            }
            let record = import_one(catalog, options, &mut handled, repo).await;
            report.records.push(record);
        }
    }

    info!(
        skipped = report.skipped(),
        would_add = report.would_add(),
        added = report.added(),
        failed = report.failed(),
        "[IMPORT] Finished repository import"
    );
    Ok(report)
}

async fn import_one<C>(
    catalog: &C,
    options: &ImportOptions,
    handled: &mut HashSet<String>,
    repo: SourceRepository,
) -> ImportRecord
where
    C: ComponentCatalog + ?Sized,
{
    let url = repository_url(&options.source_base_url, &repo.project_key, &repo.slug);
    let key = normalize_url(&url);
    let record = |outcome| ImportRecord {
        project_key: repo.project_key.clone(),
        slug: repo.slug.clone(),
        url: url.clone(),
        outcome,
    };

    if handled.contains(&key) {
        info!(%url, "[IMPORT] Skipped: URL already handled in this run");
        return record(ImportOutcome::Skipped);
    }

    match catalog.find_component_by_url(&url).await {
        Ok(Some(existing)) => {
            info!(%url, component_id = %existing.id, "[IMPORT] Skipped: component already exists");
            handled.insert(key);
            return record(ImportOutcome::Skipped);
        }
        Ok(None) => {}
        Err(e) => {
            warn!(%url, error = %e, "[IMPORT][ERROR] Existence check failed");
            return record(ImportOutcome::Failed {
                reason: e.to_string(),
            });
        }
    }

    if options.dry_run {
        info!(%url, name = %repo.name, "[IMPORT] Would add component (dry run)");
        handled.insert(key);
        return record(ImportOutcome::WouldAdd);
    }

    let component = NewComponent {
        name: repo.name.clone(),
        description: repo.description.clone(),
        repository_url: url.clone(),
        labels: options.labels.clone(),
    };
    match catalog.create_component(component).await {
        Ok(created) => {
            info!(%url, component_id = %created.id, "[IMPORT] Added component");
            handled.insert(key);
            record(ImportOutcome::Added {
                component_id: created.id,
            })
        }
        Err(e) => {
            error!(%url, error = %e, "[IMPORT][ERROR] Failed to create component");
            record(ImportOutcome::Failed {
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_url_ignores_trailing_slash_on_base() {
        let base = Url::parse("https://bitbucket.example.com/").unwrap();
        assert_eq!(
            repository_url(&base, "PLAT", "billing"),
            "https://bitbucket.example.com/projects/PLAT/repos/billing/browse"
        );
        let base = Url::parse("https://example.com/bitbucket").unwrap();
        assert_eq!(
            repository_url(&base, "PLAT", "billing"),
            "https://example.com/bitbucket/projects/PLAT/repos/billing/browse"
        );
    }

    #[test]
    fn normalization_folds_case_trailing_slash_and_query() {
        let a = normalize_url("https://Bitbucket.example.com/projects/PLAT/repos/billing/browse/");
        let b =
            normalize_url("https://bitbucket.example.com/projects/plat/repos/billing/browse?at=main");
        assert_eq!(a, b);
        assert_ne!(
            normalize_url("https://bitbucket.example.com/projects/PLAT/repos/billing/browse"),
            normalize_url("https://bitbucket.example.com/projects/PLAT/repos/billing-api/browse")
        );
    }
}
