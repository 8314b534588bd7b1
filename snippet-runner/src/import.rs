//! Glue for the `bitbucket-import` binary: builds the Bitbucket source and the
//! Compass catalog from [`ImporterConfig`], runs the core import loop and
//! formats the summary.

use anyhow::Result;
use snippet_runner_core::contract::SourceRepository;
use snippet_runner_core::importer::{
    import_repositories, ImportOptions, ImportOutcome, ImportReport,
};
use snippet_runner_core::{ClientConfig, GraphQLClient};
use tracing::info;

use crate::bitbucket::BitbucketClient;
use crate::compass::CompassCatalog;
use crate::load_config::ImporterConfig;

pub const IMPORT_LABEL: &str = "bitbucket-import";

/// One `IMPORT_EXCLUDE` entry: a whole project or a single repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Project(String),
    Repository { project_key: String, slug: String },
}

impl Exclusion {
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        match entry.split_once('/') {
            Some((key, slug)) if !key.is_empty() && !slug.is_empty() => Some(Exclusion::Repository {
                project_key: key.to_string(),
                slug: slug.to_string(),
            }),
            None if !entry.is_empty() => Some(Exclusion::Project(entry.to_string())),
            _ => None,
        }
    }

    /// Project keys compare case-insensitively; slugs are already lowercase on the server.
    pub fn matches(&self, repo: &SourceRepository) -> bool {
        match self {
            Exclusion::Project(key) => key.eq_ignore_ascii_case(&repo.project_key),
            Exclusion::Repository { project_key, slug } => {
                project_key.eq_ignore_ascii_case(&repo.project_key)
                    && slug.eq_ignore_ascii_case(&repo.slug)
            }
        }
    }
}

/// Builds the import predicate: keep every repository no exclusion matches.
pub fn exclusion_filter(entries: &[String]) -> impl Fn(&SourceRepository) -> bool {
    let exclusions: Vec<Exclusion> = entries.iter().filter_map(|e| Exclusion::parse(e)).collect();
    move |repo| !exclusions.iter().any(|ex| ex.matches(repo))
}

pub async fn run_import(config: &ImporterConfig) -> Result<ImportReport> {
    let source = BitbucketClient::new(config.bitbucket_url.clone(), config.bitbucket_token.clone());
    let client_config = ClientConfig::new(
        config.graphql_endpoint(),
        config.atlassian_email.clone(),
        config.atlassian_api_token.clone(),
    )?;
    let catalog = CompassCatalog::new(GraphQLClient::new(client_config), config.cloud_id.clone());

    let options = ImportOptions {
        source_base_url: config.bitbucket_url.clone(),
        dry_run: config.dry_run,
        labels: vec![IMPORT_LABEL.to_string()],
    };
    info!(
        target_endpoint = %config.graphql_endpoint(),
        excluded = config.exclude.len(),
        "[IMPORT] Clients initialised"
    );
    Ok(import_repositories(&source, &catalog, &options, exclusion_filter(&config.exclude)).await?)
}

/// Human-readable report: one line per repository, then the totals.
pub fn format_report(report: &ImportReport) -> String {
    let mut lines: Vec<String> = report
        .records
        .iter()
        .map(|record| {
            let outcome = match &record.outcome {
                ImportOutcome::Skipped => "SKIPPED".to_string(),
                ImportOutcome::WouldAdd => "WOULD ADD".to_string(),
                ImportOutcome::Added { component_id } => format!("ADDED {component_id}"),
                ImportOutcome::Failed { reason } => format!("FAILED {reason}"),
            };
            format!("{}/{} {} {}", record.project_key, record.slug, record.url, outcome)
        })
        .collect();
    lines.push(format!(
        "skipped: {}, would add: {}, added: {}, failed: {}",
        report.skipped(),
        report.would_add(),
        report.added(),
        report.failed()
    ));
    lines.join("\n")
}
