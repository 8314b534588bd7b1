//! The four snippet operations (list, peek, help, run) as a library surface.
//!
//! The CLI crate is a thin clap layer over [`SnippetCommands`]; anything that
//! can be done from the command line can be done from here.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::contract::GraphQLExecutor;
use crate::document::OperationSignature;
use crate::error::{Result, SnippetError};
use crate::locator::SnippetLocator;
use crate::schema::{input_schema, referenced_types, resolve_definitions};

/// Parses a JSON argument payload. Anything other than a JSON object is rejected.
pub fn parse_arguments(args_json: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(args_json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(SnippetError::InvalidArgument(format!(
            "Arguments must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(SnippetError::InvalidArgument(format!(
            "Invalid JSON arguments {args_json:?}: {e}"
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub struct SnippetCommands<'c> {
    locator: SnippetLocator,
    client: &'c dyn GraphQLExecutor,
}

impl<'c> SnippetCommands<'c> {
    pub fn new(locator: SnippetLocator, client: &'c dyn GraphQLExecutor) -> Self {
        Self { locator, client }
    }

    pub fn locator(&self) -> &SnippetLocator {
        &self.locator
    }

    pub fn list(&self) -> Result<Vec<String>> {
        self.locator.list()
    }

    pub fn peek(&self, name: &str) -> Result<OperationSignature> {
        let snippet = self.locator.resolve(name, self.client)?;
        let signature = snippet.signature()?;
        debug!(snippet = name, %signature, "Peeked snippet signature");
        Ok(signature)
    }

    /// Input schema built from the document header alone.
    pub fn input_schema(&self, name: &str) -> Result<Value> {
        Ok(input_schema(&self.peek(name)?))
    }

    /// Input schema with custom types resolved through introspection.
    pub async fn resolved_input_schema(&self, name: &str) -> Result<Value> {
        let signature = self.peek(name)?;
        let mut schema = input_schema(&signature);
        let definitions = resolve_definitions(self.client, referenced_types(&signature)).await?;
        schema["definitions"] = Value::Object(definitions);
        Ok(schema)
    }

    pub fn help(&self, name: &str) -> Result<String> {
        let snippet = self.locator.resolve(name, self.client)?;
        snippet
            .readme()?
            .ok_or_else(|| {
                SnippetError::NotFound(format!("No README.md found for snippet '{name}'"))
            })
    }

    /// Validates `args_json` before anything else, then runs the snippet.
    pub async fn run(&self, name: &str, args_json: &str) -> Result<Value> {
        let arguments = parse_arguments(args_json)?;
        let snippet = self.locator.resolve(name, self.client)?;
        info!(snippet = name, "Dispatching run command");
        snippet.run(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_arguments_accepts_objects_only() {
        assert_eq!(parse_arguments(r#"{"id":"42"}"#).unwrap()["id"], "42");
        assert!(parse_arguments("{}").unwrap().is_empty());
        for bad in ["not json", "[1,2]", "42", "\"str\"", "null", "{\"a\":"] {
            assert!(
                matches!(parse_arguments(bad), Err(SnippetError::InvalidArgument(_))),
                "expected InvalidArgument for {bad}"
            );
        }
    }
}
