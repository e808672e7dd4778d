//! Typed views of the nested mutation input. Every level of the input is classified once into
//! relation and scalar entries, and nested operation objects are parsed into descriptors.

use crate::{MutationError, MutationResult, naming::ParameterPrefix};
use graph_schema::{ParentContainer, RelationField, ScalarField, WriteOperator};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

pub type InputMap = Map<String, Value>;

/// `{ where, update, connect, disconnect, create, delete, connectOrCreate }` under a relation
/// field of an update input.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateFieldInput {
    #[serde(rename = "where")]
    pub filter: Option<Value>,
    pub update: Option<UpdateConnectionInput>,
    pub connect: Option<Value>,
    pub disconnect: Option<Value>,
    pub create: Option<Value>,
    pub delete: Option<Value>,
    pub connect_or_create: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateConnectionInput {
    pub node: Option<InputMap>,
    pub edge: Option<Value>,
}

/// One item of a nested `create`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFieldInput {
    #[serde(default)]
    pub node: InputMap,
    pub edge: Option<Value>,
}

/// The operations allowed under a relation field of a create input.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationCreateInput {
    pub create: Option<Value>,
    pub connect: Option<Value>,
    pub connect_or_create: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteFieldInput {
    #[serde(rename = "where")]
    pub filter: Option<Value>,
    pub delete: Option<InputMap>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectInput {
    #[serde(rename = "where")]
    pub filter: Option<Value>,
    pub edge: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisconnectInput {
    #[serde(rename = "where")]
    pub filter: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConnectOrCreateInput {
    #[serde(rename = "where")]
    pub filter: ConnectOrCreateWhere,
    #[serde(default)]
    pub on_create: CreateFieldInput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectOrCreateWhere {
    pub node: InputMap,
}

/// Parses a nested operation object, reporting the input path on failure.
pub fn parse<T: DeserializeOwned>(value: &Value, path: &ParameterPrefix) -> MutationResult<T> {
    T::deserialize(value).map_err(|source| MutationError::InvalidInput {
        path: path.to_string(),
        source,
    })
}

/// Lists are iterated, single objects are treated as a list of one.
pub fn coerce_vec(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    }
}

/// One classified key of an input level.
#[derive(Debug, Clone, Copy)]
pub enum InputEntry<'a> {
    Relation {
        field: &'a RelationField,
        value: &'a Value,
    },
    Scalar {
        key: &'a str,
        field: &'a ScalarField,
        operator: WriteOperator,
        value: &'a Value,
    },
}

impl<'a> InputEntry<'a> {
    /// Classifies every key of an input level, preserving input order. Relation keys set to null
    /// carry no operation and are skipped.
    pub fn classify(container: ParentContainer<'a>, input: &'a InputMap) -> MutationResult<Vec<InputEntry<'a>>> {
        input.iter().try_fold(Vec::with_capacity(input.len()), |mut entries, (key, value)| {
            if let Some(field) = container.find_relation_field(key) {
                if !value.is_null() {
                    entries.push(InputEntry::Relation { field, value });
                }
            } else if let Some(resolved) = container.resolve_input_key(key) {
                entries.push(InputEntry::Scalar {
                    key,
                    field: resolved.field,
                    operator: resolved.operator,
                    value,
                });
            } else {
                return Err(MutationError::UnknownField {
                    type_name: container.name().to_owned(),
                    field: key.clone(),
                });
            }

            Ok(entries)
        })
    }
}

/// Keeps only the keys a container owns. Interface input is shared by all implementations, each
/// of which ignores the keys it does not declare.
pub fn retain_owned(container: ParentContainer<'_>, input: &InputMap) -> InputMap {
    input
        .iter()
        .filter(|(key, _)| container.find_relation_field(key).is_some() || container.resolve_input_key(key).is_some())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Reads an object-valued input, reporting the path when it is not an object.
pub fn as_object<'v>(value: &'v Value, path: &ParameterPrefix) -> MutationResult<&'v InputMap> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(MutationError::InvalidInput {
            path: path.to_string(),
            source: serde::de::Error::custom(format!("expected an object, found `{other}`")),
        }),
    }
}
