use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown node type `{0}`.")]
    UnknownNodeType(String),

    #[error("Unknown relationship properties type `{0}`.")]
    UnknownRelationshipType(String),

    #[error("Relation field `{type_name}.{field_name}` references unknown type `{target}`.")]
    UnknownRelationTarget {
        type_name: String,
        field_name: String,
        target: String,
    },

    #[error("Duplicate type name `{0}`.")]
    DuplicateType(String),

    #[error("Invalid schema definition: {0}")]
    Definition(#[from] serde_json::Error),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
