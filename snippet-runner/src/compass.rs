//! Compass implementation of the core `ComponentCatalog` trait.
//!
//! The first lookup pages through every component with `searchComponents` and
//! indexes them by normalised link URL, so a component is found by its
//! repository link even when it was renamed on either side. Later lookups are
//! answered from that index, and components created through this catalog are
//! added to it. Creation uses the `createComponent` mutation with a
//! `REPOSITORY` link. Both go through the same GraphQL executor the snippet
//! runner uses.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use snippet_runner_core::contract::{
    CatalogComponent, ComponentCatalog, GraphQLExecutor, GraphQLRequest, NewComponent,
};
use snippet_runner_core::importer::normalize_url;
use snippet_runner_core::{GraphQLClient, ImportError};

const COMPONENT_TYPE: &str = "SERVICE";
const SEARCH_PAGE_SIZE: u64 = 50;

const SEARCH_COMPONENTS: &str = r#"query searchCompassComponents($cloudId: String!, $query: CompassSearchComponentQuery) {
  compass {
    searchComponents(cloudId: $cloudId, query: $query) {
      ... on CompassSearchComponentConnection {
        nodes {
          component {
            id
            name
            links {
              url
            }
          }
        }
        pageInfo {
          hasNextPage
          endCursor
        }
      }
      ... on QueryError {
        message
      }
    }
  }
}"#;

const CREATE_COMPONENT: &str = r#"mutation createComponent($cloudId: ID!, $input: CreateCompassComponentInput!) {
  compass {
    createComponent(cloudId: $cloudId, input: $input) {
      success
      errors {
        message
      }
      componentDetails {
        id
        name
      }
    }
  }
}"#;

type LinkIndex = HashMap<String, CatalogComponent>;

pub struct CompassCatalog<E: GraphQLExecutor = GraphQLClient> {
    executor: E,
    cloud_id: String,
    /// Normalised link URL → component; `None` until the first lookup.
    links: Mutex<Option<LinkIndex>>,
}

impl<E: GraphQLExecutor> CompassCatalog<E> {
    pub fn new(executor: E, cloud_id: impl Into<String>) -> Self {
        Self {
            executor,
            cloud_id: cloud_id.into(),
            links: Mutex::new(None),
        }
    }

    async fn send(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<Value, ImportError> {
        let variables = match variables {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let request =
            GraphQLRequest::new(query, variables).with_operation_name(Some(operation.to_string()));
        let response = self.executor.execute(request).await.map_err(|e| {
            error!(operation, error = %e, "Compass request failed");
            ImportError::Catalog(e.to_string())
        })?;

        if let Some(message) = graphql_errors(&response) {
            error!(operation, %message, "Compass returned GraphQL errors");
            return Err(ImportError::Catalog(message));
        }
        Ok(response)
    }

    fn with_index<T>(&self, f: impl FnOnce(&mut Option<LinkIndex>) -> T) -> Result<T, ImportError> {
        let mut guard = self
            .links
            .lock()
            .map_err(|_| ImportError::Catalog("component link index is poisoned".into()))?;
        Ok(f(&mut guard))
    }

    /// Pages through every component of the site and indexes its links.
    async fn fetch_link_index(&self) -> Result<LinkIndex, ImportError> {
        let mut index = LinkIndex::new();
        let mut after: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = json!({ "first": SEARCH_PAGE_SIZE });
            if let Some(cursor) = &after {
                query["after"] = json!(cursor);
            }
            let response = self
                .send(
                    "searchCompassComponents",
                    SEARCH_COMPONENTS,
                    json!({ "cloudId": self.cloud_id, "query": query }),
                )
                .await?;
            pages += 1;

            let result = &response["data"]["compass"]["searchComponents"];
            if let Some(message) = result.get("message").and_then(Value::as_str) {
                return Err(ImportError::Catalog(message.to_string()));
            }
            let nodes = result
                .get("nodes")
                .and_then(Value::as_array)
                .ok_or_else(|| ImportError::Catalog("searchComponents returned no nodes".into()))?;

            for node in nodes {
                let component = &node["component"];
                let Some(found) = component_from(component) else {
                    continue;
                };
                for url in link_urls(component) {
                    index
                        .entry(normalize_url(url))
                        .or_insert_with(|| found.clone());
                }
            }

            let page_info = &result["pageInfo"];
            match (
                page_info["hasNextPage"].as_bool(),
                page_info["endCursor"].as_str(),
            ) {
                (Some(true), Some(cursor)) => after = Some(cursor.to_string()),
                _ => break,
            }
        }

        info!(pages, links = index.len(), "[IMPORT] Indexed Compass component links");
        Ok(index)
    }
}

/// Joins the `message` of every top-level GraphQL error.
fn graphql_errors(response: &Value) -> Option<String> {
    let errors = response.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn component_from(value: &Value) -> Option<CatalogComponent> {
    Some(CatalogComponent {
        id: value.get("id")?.as_str()?.to_string(),
        name: value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn link_urls(component: &Value) -> impl Iterator<Item = &str> {
    component
        .get("links")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|link| link.get("url").and_then(Value::as_str))
}

#[async_trait]
impl<E: GraphQLExecutor> ComponentCatalog for CompassCatalog<E> {
    async fn find_component_by_url(
        &self,
        url: &str,
    ) -> Result<Option<CatalogComponent>, ImportError> {
        let wanted = normalize_url(url);
        let cached =
            self.with_index(|slot| slot.as_ref().map(|index| index.get(&wanted).cloned()))?;
        if let Some(found) = cached {
            debug!(url, found = found.is_some(), "Answered lookup from link index");
            return Ok(found);
        }

        let index = self.fetch_link_index().await?;
        let found = index.get(&wanted).cloned();
        self.with_index(|slot| *slot = Some(index))?;
        debug!(url, found = found.is_some(), "Looked up component by repository link");
        Ok(found)
    }

    async fn create_component(
        &self,
        component: NewComponent,
    ) -> Result<CatalogComponent, ImportError> {
        let mut input = json!({
            "name": component.name,
            "typeId": COMPONENT_TYPE,
            "labels": component.labels,
            "links": [{
                "type": "REPOSITORY",
                "name": "Repository",
                "url": component.repository_url,
            }],
        });
        if let Some(description) = &component.description {
            input["description"] = json!(description);
        }

        let response = self
            .send(
                "createComponent",
                CREATE_COMPONENT,
                json!({ "cloudId": self.cloud_id, "input": input }),
            )
            .await?;

        let payload = &response["data"]["compass"]["createComponent"];
        if payload["success"].as_bool() != Some(true) {
            let reasons: Vec<&str> = payload["errors"]
                .as_array()
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            let reason = if reasons.is_empty() {
                "createComponent did not succeed".to_string()
            } else {
                reasons.join("; ")
            };
            return Err(ImportError::Catalog(reason));
        }

        let created = component_from(&payload["componentDetails"]).ok_or_else(|| {
            ImportError::Catalog("createComponent returned no component details".into())
        })?;
        info!(id = %created.id, name = %created.name, "[IMPORT] Created Compass component");
        let key = normalize_url(&component.repository_url);
        self.with_index(|slot| {
            if let Some(index) = slot.as_mut() {
                index.insert(key, created.clone());
            }
        })?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippet_runner_core::contract::MockGraphQLExecutor;
    use snippet_runner_core::SnippetError;

    const BILLING_URL: &str = "https://bitbucket.example.com/projects/PLAT/repos/billing/browse";

    fn search_page(nodes: Value, next: Option<&str>) -> Value {
        json!({"data": {"compass": {"searchComponents": {
            "nodes": nodes,
            "pageInfo": {"hasNextPage": next.is_some(), "endCursor": next}
        }}}})
    }

    fn node(id: &str, name: &str, urls: &[&str]) -> Value {
        let links: Vec<Value> = urls.iter().map(|url| json!({ "url": url })).collect();
        json!({"component": {"id": id, "name": name, "links": links}})
    }

    fn is_search(req: &GraphQLRequest) -> bool {
        req.operation_name.as_deref() == Some("searchCompassComponents")
    }

    #[tokio::test]
    async fn finds_component_by_link_even_when_names_differ() {
        let mut executor = MockGraphQLExecutor::new();
        executor
            .expect_execute()
            .withf(|req: &GraphQLRequest| {
                is_search(req)
                    && req.variables["cloudId"] == "cloud-1"
                    && req.variables["query"].get("query").is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(search_page(
                    json!([
                        node("c-1", "billing", &["https://other.example.com/x"]),
                        node(
                            "c-2",
                            "Billing Platform",
                            &["https://BITBUCKET.example.com/projects/PLAT/repos/billing/browse/"],
                        ),
                    ]),
                    None,
                ))
            });

        let catalog = CompassCatalog::new(executor, "cloud-1");
        let found = catalog.find_component_by_url(BILLING_URL).await.unwrap();
        assert_eq!(
            found,
            Some(CatalogComponent {
                id: "c-2".into(),
                name: "Billing Platform".into()
            })
        );
    }

    #[tokio::test]
    async fn link_index_is_built_once_across_pages() {
        let mut executor = MockGraphQLExecutor::new();
        let mut calls = 0;
        executor.expect_execute().times(2).returning(move |req| {
            calls += 1;
            if calls == 1 {
                assert!(req.variables["query"].get("after").is_none());
                Ok(search_page(json!([]), Some("cursor-2")))
            } else {
                assert_eq!(req.variables["query"]["after"], "cursor-2");
                Ok(search_page(json!([node("c-9", "ledger", &["https://bb/ledger"])]), None))
            }
        });

        let catalog = CompassCatalog::new(executor, "cloud-1");
        assert!(catalog.find_component_by_url(BILLING_URL).await.unwrap().is_none());
        let ledger = catalog.find_component_by_url("https://bb/ledger/").await.unwrap();
        assert_eq!(ledger.map(|c| c.id), Some("c-9".to_string()));
    }

    #[tokio::test]
    async fn created_components_are_found_without_another_search() {
        let mut executor = MockGraphQLExecutor::new();
        executor
            .expect_execute()
            .withf(|req: &GraphQLRequest| is_search(req))
            .times(1)
            .returning(|_| Ok(search_page(json!([]), None)));
        executor
            .expect_execute()
            .withf(|req: &GraphQLRequest| {
                let input = &req.variables["input"];
                req.operation_name.as_deref() == Some("createComponent")
                    && input["typeId"] == "SERVICE"
                    && input["labels"] == json!(["bitbucket"])
                    && input["links"][0]["type"] == "REPOSITORY"
                    && input["links"][0]["url"] == BILLING_URL
                    && input.get("description").is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(json!({"data": {"compass": {"createComponent": {
                    "success": true,
                    "errors": [],
                    "componentDetails": {"id": "ari:1", "name": "billing"}
                }}}}))
            });

        let catalog = CompassCatalog::new(executor, "cloud-1");
        assert!(catalog.find_component_by_url(BILLING_URL).await.unwrap().is_none());
        let created = catalog
            .create_component(NewComponent {
                name: "billing".into(),
                description: None,
                repository_url: BILLING_URL.into(),
                labels: vec!["bitbucket".into()],
            })
            .await
            .unwrap();
        assert_eq!(
            created,
            CatalogComponent {
                id: "ari:1".into(),
                name: "billing".into()
            }
        );

        let again = catalog.find_component_by_url(BILLING_URL).await.unwrap();
        assert_eq!(again, Some(created));
    }

    #[tokio::test]
    async fn unsuccessful_create_reports_mutation_errors() {
        let mut executor = MockGraphQLExecutor::new();
        executor.expect_execute().returning(|_| {
            Ok(json!({"data": {"compass": {"createComponent": {
                "success": false,
                "errors": [{"message": "Component name already exists"}],
                "componentDetails": null
            }}}}))
        });

        let catalog = CompassCatalog::new(executor, "cloud-1");
        let err = catalog
            .create_component(NewComponent {
                name: "a".into(),
                description: Some("desc".into()),
                repository_url: "https://bb/a".into(),
                labels: vec![],
            })
            .await
            .unwrap_err();
        match err {
            ImportError::Catalog(msg) => assert_eq!(msg, "Component name already exists"),
            other => panic!("expected catalog error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn top_level_errors_and_transport_failures_are_catalog_errors() {
        let mut executor = MockGraphQLExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json!({"errors": [{"message": "Unauthorized"}]})));
        let catalog = CompassCatalog::new(executor, "cloud-1");
        assert!(matches!(
            catalog.find_component_by_url("https://bb/a").await,
            Err(ImportError::Catalog(msg)) if msg == "Unauthorized"
        ));

        let mut executor = MockGraphQLExecutor::new();
        executor
            .expect_execute()
            .returning(|_| Err(SnippetError::Transport("HTTP 502".into())));
        let catalog = CompassCatalog::new(executor, "cloud-1");
        assert!(matches!(
            catalog.find_component_by_url("https://bb/a").await,
            Err(ImportError::Catalog(_))
        ));
    }
}
