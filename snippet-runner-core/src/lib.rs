#![doc = "snippet-runner-core: core logic library for the snippet runner."]

//! This crate holds the snippet model, the GraphQL client and the catalog
//! import pipeline. The `snippet-runner` crate adds the command line, the
//! environment loading and the concrete source/catalog API clients.
//!
//! # Layout
//! - [`locator`] / [`snippet`] / [`document`]: discovering snippets and reading
//!   their documents, defaults and READMEs.
//! - [`client`] / [`runner`] / [`commands`]: executing snippets.
//! - [`schema`]: input schema generation for `peek`.
//! - [`importer`]: the repository → catalog import loop.
//! - [`contract`]: traits at the service seams, with `mockall` mocks.

pub mod client;
pub mod commands;
pub mod config;
pub mod contract;
pub mod document;
pub mod error;
pub mod importer;
pub mod locator;
pub mod runner;
pub mod schema;
pub mod snippet;

pub use client::GraphQLClient;
pub use commands::SnippetCommands;
pub use config::{ClientConfig, RunnerConfig};
pub use error::{ImportError, SnippetError};
pub use locator::SnippetLocator;
pub use snippet::Snippet;
