//! JSON schema (draft-04) describing a snippet's input variables.
//!
//! [`input_schema`] works purely from the document header. Custom input types
//! show up as `$ref`s; [`resolve_definitions`] can fill them in through the
//! endpoint's `__type` introspection, following nested types transitively.

use std::collections::{BTreeSet, VecDeque};

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::contract::{GraphQLExecutor, GraphQLRequest};
use crate::document::{OperationSignature, TypeRef};
use crate::error::{Result, SnippetError};

const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

const TYPE_SHAPE_QUERY: &str = r#"query GetTypeInput($type: String!) {
  __type(name: $type) {
    kind
    name
    inputFields {
      name
      type { kind name ofType { kind name ofType { kind name ofType { kind name } } } }
    }
    enumValues {
      name
      description
    }
  }
}"#;

fn builtin_scalar(name: &str) -> Option<Value> {
    match name {
        "ID" | "String" => Some(json!({"type": "string"})),
        "Int" => Some(json!({"type": "integer"})),
        "Float" => Some(json!({"type": "number"})),
        "Boolean" => Some(json!({"type": "boolean"})),
        _ => None,
    }
}

fn reference(name: &str) -> Value {
    json!({"$ref": format!("#/definitions/{name}")})
}

fn type_ref_schema(ty: &TypeRef, refs: &mut BTreeSet<String>) -> Value {
    match ty {
        TypeRef::NonNull(inner) => type_ref_schema(inner, refs),
        TypeRef::List(inner) => json!({"type": "array", "items": type_ref_schema(inner, refs)}),
        TypeRef::Named(name) => builtin_scalar(name).unwrap_or_else(|| {
            refs.insert(name.clone());
            reference(name)
        }),
    }
}

/// Custom (non built-in) type names the signature refers to.
pub fn referenced_types(signature: &OperationSignature) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    for var in &signature.variables {
        type_ref_schema(&var.type_ref, &mut refs);
    }
    refs
}

/// Schema for the variables object. `definitions` starts out empty.
pub fn input_schema(signature: &OperationSignature) -> Value {
    let mut refs = BTreeSet::new();
    let mut properties = Map::new();
    let mut required = Vec::new();

    for var in &signature.variables {
        properties.insert(var.name.clone(), type_ref_schema(&var.type_ref, &mut refs));
        if var.type_ref.is_non_null() && var.default_value.is_none() {
            required.push(Value::String(var.name.clone()));
        }
    }

    json!({
        "$schema": DRAFT_04,
        "type": "object",
        "properties": properties,
        "required": required,
        "definitions": {},
    })
}

/// Converts an introspection `__type` reference (`{kind, name, ofType}`).
/// Returns the schema and whether the field is non-null.
fn introspected_type_schema(ty: &Value, refs: &mut BTreeSet<String>) -> (Value, bool) {
    let kind = ty.get("kind").and_then(Value::as_str).unwrap_or_default();
    let name = ty.get("name").and_then(Value::as_str);
    let of_type = ty.get("ofType").unwrap_or(&Value::Null);

    match kind {
        "NON_NULL" => (introspected_type_schema(of_type, refs).0, true),
        "LIST" => (
            json!({"type": "array", "items": introspected_type_schema(of_type, refs).0}),
            false,
        ),
        "SCALAR" => (
            name.and_then(builtin_scalar).unwrap_or_else(|| json!({"type": "string"})),
            false,
        ),
        _ => match name {
            Some(name) => match builtin_scalar(name) {
                Some(schema) => (schema, false),
                None => {
                    refs.insert(name.to_string());
                    (reference(name), false)
                }
            },
            None => (json!({}), false),
        },
    }
}

fn error_messages(response: &Value) -> Option<String> {
    let errors = response.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
        .collect();
    Some(messages.join("; "))
}

/// Turns one introspection response into a schema definition, returning the
/// definition and the custom types it refers to.
pub fn introspection_to_definition(
    type_name: &str,
    response: &Value,
) -> Result<(Value, BTreeSet<String>)> {
    if let Some(message) = error_messages(response) {
        return Err(SnippetError::Remote(format!(
            "Introspecting '{type_name}' failed: {message}"
        )));
    }
    let ty = response
        .pointer("/data/__type")
        .filter(|t| !t.is_null())
        .ok_or_else(|| {
            SnippetError::NotFound(format!(
                "Type '{type_name}' is not described by the endpoint schema"
            ))
        })?;

    let mut refs = BTreeSet::new();

    if let Some(values) = ty.get("enumValues").and_then(Value::as_array) {
        let names: Vec<Value> = values
            .iter()
            .filter_map(|v| v.get("name").cloned())
            .collect();
        return Ok((json!({"type": "string", "enum": names}), refs));
    }

    if let Some(fields) = ty.get("inputFields").and_then(Value::as_array) {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in fields {
            let Some(name) = field.get("name").and_then(Value::as_str) else {
                continue;
            };
            let (schema, non_null) =
                introspected_type_schema(field.get("type").unwrap_or(&Value::Null), &mut refs);
            properties.insert(name.to_string(), schema);
            if non_null {
                required.push(Value::String(name.to_string()));
            }
        }
        let mut definition = json!({"type": "object", "properties": properties});
        if !required.is_empty() {
            definition["required"] = Value::Array(required);
        }
        return Ok((definition, refs));
    }

    // Custom scalars travel as strings on the wire.
    match ty.get("kind").and_then(Value::as_str) {
        Some("SCALAR") => Ok((json!({"type": "string"}), refs)),
        _ => Ok((json!({"type": "object"}), refs)),
    }
}

/// Fetches the introspection shape of one named type.
pub async fn introspect_type(executor: &dyn GraphQLExecutor, type_name: &str) -> Result<Value> {
    let mut variables = Map::new();
    variables.insert("type".into(), Value::String(type_name.to_string()));
    let request = GraphQLRequest::new(TYPE_SHAPE_QUERY, variables)
        .with_operation_name(Some("GetTypeInput".into()));
    debug!(type_name, "Introspecting type");
    executor.execute(request).await
}

/// Resolves every type in `roots`, and everything they refer to, into a
/// `definitions` map. Requests are issued one at a time.
pub async fn resolve_definitions(
    executor: &dyn GraphQLExecutor,
    roots: BTreeSet<String>,
) -> Result<Map<String, Value>> {
    let mut definitions = Map::new();
    let mut seen: BTreeSet<String> = roots.clone();
    let mut queue: VecDeque<String> = roots.into_iter().collect();

    while let Some(type_name) = queue.pop_front() {
        let response = introspect_type(executor, &type_name).await?;
        let (definition, refs) = introspection_to_definition(&type_name, &response)?;
        definitions.insert(type_name, definition);
        for next in refs {
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }

    info!(count = definitions.len(), "Resolved input type definitions");
    Ok(definitions)
}
