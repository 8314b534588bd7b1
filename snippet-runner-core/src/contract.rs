#![allow(unused)]

//! # contract: the seams between pipelines and the services they talk to
//!
//! Three traits live here:
//! - [`GraphQLExecutor`]: executes one GraphQL operation against an endpoint.
//!   Implemented by [`crate::client::GraphQLClient`] and by mocks in tests.
//! - [`RepositorySource`]: enumerates projects and repositories of a source
//!   code host (Bitbucket Data Center in the CLI crate).
//! - [`ComponentCatalog`]: looks up and creates catalog components (Compass in
//!   the CLI crate).
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; the mocks are exported behind the
//!   `test-export-mocks` feature so the CLI crate's tests can use them too.
//!
//! ## Errors
//! - The executor returns [`SnippetError`]; remote GraphQL `errors` are part of
//!   the `Ok` value, never an `Err`.
//! - Importer collaborators return [`ImportError`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use mockall::{automock, predicate::*};

use crate::error::{ImportError, SnippetError};

/// One GraphQL request as sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    pub variables: Map<String, Value>,
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>, variables: Map<String, Value>) -> Self {
        Self {
            query: query.into(),
            variables,
            operation_name: None,
        }
    }

    pub fn with_operation_name(mut self, name: Option<String>) -> Self {
        self.operation_name = name;
        self
    }
}

/// Executes GraphQL operations against a remote endpoint.
///
/// The returned value is the raw JSON body of the response, `errors` included.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GraphQLExecutor: Send + Sync {
    async fn execute(&self, request: GraphQLRequest) -> Result<Value, SnippetError>;
}

/// A project on the source code host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProject {
    pub key: String,
    pub name: String,
}

/// A repository on the source code host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRepository {
    pub project_key: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}

/// Enumerates projects and their repositories, in the host's own order.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<SourceProject>, ImportError>;

    async fn list_repositories(
        &self,
        project_key: &str,
    ) -> Result<Vec<SourceRepository>, ImportError>;
}

/// The minimal data needed to create a catalog component for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComponent {
    pub name: String,
    pub description: Option<String>,
    /// Canonical repository URL; the identity key for deduplication.
    pub repository_url: String,
    pub labels: Vec<String>,
}

/// A component as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogComponent {
    pub id: String,
    pub name: String,
}

/// Looks up and creates components in the destination catalog.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ComponentCatalog: Send + Sync {
    /// Find an existing component with a link to `url`, whatever its name.
    async fn find_component_by_url(
        &self,
        url: &str,
    ) -> Result<Option<CatalogComponent>, ImportError>;

    async fn create_component(
        &self,
        component: NewComponent,
    ) -> Result<CatalogComponent, ImportError>;
}
