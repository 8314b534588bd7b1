//! A snippet: one directory holding a GraphQL document, optional default
//! variables (`variables.json`) and an optional `README.md`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::contract::GraphQLExecutor;
use crate::document::{parse_signature, OperationSignature};
use crate::error::{Result, SnippetError};
use crate::runner::run_snippet;

pub const DOCUMENT_EXTENSION: &str = "graphql";
pub const DEFAULTS_FILE: &str = "variables.json";
pub const README_FILE: &str = "README.md";

/// First `*.graphql` file in `dir`, by file name.
pub(crate) fn find_document(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut documents: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        })
        .collect();
    documents.sort();
    Ok(documents.into_iter().next())
}

#[derive(Clone)]
pub struct Snippet<'c> {
    name: String,
    path: PathBuf,
    client: &'c dyn GraphQLExecutor,
}

impl<'c> Snippet<'c> {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        client: &'c dyn GraphQLExecutor,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn client(&self) -> &'c dyn GraphQLExecutor {
        self.client
    }

    pub fn document_path(&self) -> Result<PathBuf> {
        match find_document(&self.path) {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Err(SnippetError::FileNotFound(self.path.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SnippetError::FileNotFound(self.path.clone()))
            }
            Err(e) => Err(SnippetError::io(&self.path, e)),
        }
    }

    pub fn read_document(&self) -> Result<String> {
        let path = self.document_path()?;
        debug!(snippet = %self.name, path = %path.display(), "Reading GraphQL document");
        fs::read_to_string(&path).map_err(|e| SnippetError::io(path, e))
    }

    /// Operation signature from the document header. Never touches the network.
    pub fn signature(&self) -> Result<OperationSignature> {
        let path = self.document_path()?;
        let source = fs::read_to_string(&path).map_err(|e| SnippetError::io(&path, e))?;
        parse_signature(&source).map_err(|message| SnippetError::InvalidDocument { path, message })
    }

    /// Default variables from `variables.json`; empty when the file is absent.
    pub fn read_defaults(&self) -> Result<Map<String, Value>> {
        let path = self.path.join(DEFAULTS_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(SnippetError::io(path, e)),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => {
                debug!(snippet = %self.name, keys = map.len(), "Loaded default variables");
                Ok(map)
            }
            Ok(_) => Err(SnippetError::InvalidArgument(format!(
                "{} must contain a JSON object",
                path.display()
            ))),
            Err(e) => Err(SnippetError::InvalidArgument(format!(
                "{} is not valid JSON: {e}",
                path.display()
            ))),
        }
    }

    /// README contents, or `None` when the snippet ships without one.
    pub fn readme(&self) -> Result<Option<String>> {
        let path = self.path.join(README_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnippetError::io(path, e)),
        }
    }

    /// Runs this snippet through its own client.
    pub async fn run(&self, arguments: Map<String, Value>) -> Result<Value> {
        info!(snippet = %self.name, "Running snippet");
        run_snippet(self, self.client, arguments).await
    }
}

impl fmt::Debug for Snippet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snippet")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
