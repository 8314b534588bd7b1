//! Loads a snippet's document and defaults, merges caller arguments and
//! executes the operation once through the client.

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::contract::{GraphQLExecutor, GraphQLRequest};
use crate::document::parse_signature;
use crate::error::{Result, SnippetError};
use crate::snippet::Snippet;

/// Ordered merge: every default first, then every override. A key present in
/// `overrides` always replaces the default value in place; new keys are
/// appended in override order.
pub fn merge_variables(
    defaults: Map<String, Value>,
    overrides: Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = defaults;
    for (key, value) in overrides {
        merged.insert(key, value);
    }
    merged
}

pub async fn run_snippet(
    snippet: &Snippet<'_>,
    client: &dyn GraphQLExecutor,
    arguments: Map<String, Value>,
) -> Result<Value> {
    let document_path = snippet.document_path()?;
    let document = snippet.read_document()?;
    let signature = parse_signature(&document).map_err(|message| {
        error!(snippet = %snippet.name(), %message, "Failed to parse GraphQL document");
        SnippetError::InvalidDocument {
            path: document_path,
            message,
        }
    })?;

    let defaults = snippet.read_defaults()?;
    debug!(
        snippet = %snippet.name(),
        defaults = defaults.len(),
        arguments = arguments.len(),
        "Merging arguments over default variables"
    );
    let variables = merge_variables(defaults, arguments);

    let request = GraphQLRequest::new(document, variables).with_operation_name(signature.name);
    info!(
        snippet = %snippet.name(),
        operation = request.operation_name.as_deref().unwrap_or("<anonymous>"),
        "Executing snippet"
    );

    match client.execute(request).await {
        Ok(response) => {
            info!(
                snippet = %snippet.name(),
                has_errors = response.get("errors").is_some(),
                "Snippet executed"
            );
            Ok(response)
        }
        Err(e) => {
            error!(snippet = %snippet.name(), error = %e, "Snippet execution failed");
            Err(e)
        }
    }
}
