//! Reads the header of a GraphQL document: operation kind, name and variables.

use std::fmt;

use async_graphql_parser::types::{BaseType, DocumentOperations, OperationType, Type};
use async_graphql_parser::{parse_query, Positioned};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl From<OperationType> for OperationKind {
    fn from(ty: OperationType) -> Self {
        match ty {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        })
    }
}

/// A variable's GraphQL type, e.g. `[String!]!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// The innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl From<&Type> for TypeRef {
    fn from(ty: &Type) -> Self {
        let base = match &ty.base {
            BaseType::Named(name) => TypeRef::Named(name.to_string()),
            BaseType::List(inner) => TypeRef::List(Box::new(TypeRef::from(inner.as_ref()))),
        };
        if ty.nullable {
            base
        } else {
            TypeRef::NonNull(Box::new(base))
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSignature {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// The declared signature of the first operation in a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSignature {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variables: Vec<VariableSignature>,
}

impl fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        if !self.variables.is_empty() {
            f.write_str("(")?;
            for (i, var) in self.variables.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "${}: {}", var.name, var.type_ref)?;
                if let Some(default) = &var.default_value {
                    write!(f, " = {default}")?;
                }
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Parses `source` and returns the signature of its first operation (in
/// document order). Fragments are ignored.
pub fn parse_signature(source: &str) -> Result<OperationSignature, String> {
    let document = parse_query(source).map_err(|e| e.to_string())?;

    let (name, operation) = match document.operations {
        DocumentOperations::Single(operation) => (None, operation),
        DocumentOperations::Multiple(operations) => operations
            .into_iter()
            .min_by_key(|(_, op)| (op.pos.line, op.pos.column))
            .map(|(name, op)| (Some(name.to_string()), op))
            .ok_or_else(|| "Document contains no operations".to_string())?,
    };
    let Positioned { node: operation, .. } = operation;

    let variables = operation
        .variable_definitions
        .iter()
        .map(|var| VariableSignature {
            name: var.node.name.node.to_string(),
            type_ref: TypeRef::from(&var.node.var_type.node),
            default_value: var
                .node
                .default_value
                .as_ref()
                .map(|value| value.node.to_string()),
        })
        .collect();

    Ok(OperationSignature {
        kind: operation.ty.into(),
        name,
        variables,
    })
}
