use crate::filter::FilterError;
use graph_schema::{SchemaError, WriteOperator};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MutationError {
    /// Two input keys resolve to the same storage property.
    #[error("Conflicting modification of {} on type {type_name}", format_keys(.keys))]
    ConflictingProperties { keys: Vec<String>, type_name: String },

    #[error("Cannot set non-nullable field {type_name}.{field} to null")]
    RequiredFieldNull { type_name: String, field: String },

    /// An input key that is neither a relation field nor a mutable scalar field.
    #[error("Unknown input field `{field}` on type {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("Operator {operator} is not allowed on create ({type_name}.{field})")]
    InvalidOperator {
        type_name: String,
        field: String,
        operator: WriteOperator,
    },

    #[error("Invalid mutation input at `{path}`: {source}")]
    InvalidInput {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{member}` is not a member of union {union}")]
    UnknownUnionMember { union: String, member: String },

    #[error("Relationship field \"{type_name}.{field}\" cannot have more than one node linked")]
    MultipleNodesForOneToOne { type_name: String, field: String },

    #[error("{operation} is not supported on interface relationship field {type_name}.{field}")]
    UnsupportedOperation {
        operation: &'static str,
        type_name: String,
        field: String,
    },

    #[error("Relationship field {type_name}.{field} has no properties to set")]
    UnexpectedEdge { type_name: String, field: String },

    #[error("Parameter `{name}` was bound twice with different values")]
    ParameterCollision { name: String },

    /// Raised by an authorizer that rejects a request outright.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type MutationResult<T> = Result<T, MutationError>;

fn format_keys(keys: &[String]) -> String {
    keys.iter().map(|k| format!("[[{k}]]")).collect::<Vec<_>>().join(", ")
}
