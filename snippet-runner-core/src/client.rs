//! HTTP GraphQL client: POSTs `{query, variables, operationName}` with Basic auth.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::contract::{GraphQLExecutor, GraphQLRequest};
use crate::error::{Result, SnippetError};

const EXPERIMENTAL_API_HEADER: &str = "X-ExperimentalApi";
const EXPERIMENTAL_API_VALUE: &str = "compass-prototype";

/// Longest slice of a non-JSON error body echoed back in a transport error.
const ERROR_BODY_PREVIEW: usize = 512;

pub struct GraphQLClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl GraphQLClient {
    pub fn new(config: ClientConfig) -> Self {
        info!(url = %config.url(), username = %config.username(), "Initialised GraphQL client");
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl GraphQLExecutor for GraphQLClient {
    async fn execute(&self, request: GraphQLRequest) -> Result<Value> {
        debug!(
            url = %self.config.url(),
            operation = request.operation_name.as_deref().unwrap_or("<anonymous>"),
            variables = request.variables.len(),
            "Sending GraphQL request"
        );

        let response = self
            .http
            .post(self.config.url().clone())
            .basic_auth(self.config.username(), Some(self.config.password()))
            .header(EXPERIMENTAL_API_HEADER, EXPERIMENTAL_API_VALUE)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %self.config.url(), "GraphQL request failed to send");
                SnippetError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = ?e, %status, "Failed to read GraphQL response body");
            SnippetError::from(e)
        })?;

        interpret_response(status, &body)
    }
}

/// Successful JSON bodies and GraphQL error bodies pass through; everything
/// else is a transport failure.
fn interpret_response(status: StatusCode, body: &str) -> Result<Value> {
    let parsed = serde_json::from_str::<Value>(body).ok();

    if status.is_success() {
        return match parsed {
            Some(value) => {
                if value.get("errors").is_some() {
                    warn!(%status, "GraphQL response carries errors; passing through");
                }
                Ok(value)
            }
            None => {
                error!(%status, "GraphQL endpoint returned a non-JSON body");
                Err(SnippetError::Transport(format!(
                    "Endpoint returned {status} with a body that is not JSON"
                )))
            }
        };
    }

    match parsed {
        Some(value) if value.get("errors").is_some() => {
            warn!(%status, "GraphQL endpoint returned an error status with a GraphQL error body");
            Ok(value)
        }
        _ => {
            error!(%status, "GraphQL endpoint returned an error status");
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            Err(SnippetError::Transport(format!("HTTP {status}: {preview}")))
        }
    }
}
