//! Discovers snippets under a root directory. Every call re-scans the disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::contract::GraphQLExecutor;
use crate::error::{Result, SnippetError};
use crate::snippet::{find_document, Snippet};

#[derive(Debug, Clone)]
pub struct SnippetLocator {
    root: PathBuf,
}

impl SnippetLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all immediate subdirectories holding a GraphQL document, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            warn!(root = %self.root.display(), error = %e, "Cannot read snippet root");
            SnippetError::Configuration(format!(
                "Snippet root {} cannot be read: {e}",
                self.root.display()
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SnippetError::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = %path.display(), "Skipping snippet directory with non UTF-8 name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            match find_document(&path) {
                Ok(Some(_)) => names.push(name),
                Ok(None) => debug!(path = %path.display(), "Directory has no GraphQL document"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read snippet directory")
                }
            }
        }
        names.sort();
        info!(root = %self.root.display(), count = names.len(), "Scanned snippet root");
        Ok(names)
    }

    /// Resolves `name` to its directory. Fails with `NotFound` when no such
    /// subdirectory exists.
    pub fn resolve<'c>(&self, name: &str, client: &'c dyn GraphQLExecutor) -> Result<Snippet<'c>> {
        if !is_plain_name(name) {
            return Err(SnippetError::NotFound(format!("Snippet '{name}' not found")));
        }
        let path = self.root.join(name);
        if !path.is_dir() {
            debug!(snippet = name, path = %path.display(), "No such snippet directory");
            return Err(SnippetError::NotFound(format!("Snippet '{name}' not found")));
        }
        Ok(Snippet::new(name, path, client))
    }

    pub fn snippets<'c>(&self, client: &'c dyn GraphQLExecutor) -> Result<Vec<Snippet<'c>>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|name| {
                let path = self.root.join(&name);
                Snippet::new(name, path, client)
            })
            .collect())
    }
}

// A snippet name is a single directory component; anything else could escape the root.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
}
