//! Compilation of `where` arguments. The read-path filter language is much richer; the
//! [`PropertyWhereCompiler`] covers property comparisons and boolean composition.

use crate::{
    Parameters,
    cypher::{param_ref, property},
    naming::ParameterPrefix,
};
use graph_schema::{NodeType, ParentContainer, RelationshipType};
use itertools::Itertools;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Expected an object at `{path}`")]
    NotAnObject { path: String },

    #[error("Expected a list at `{path}`")]
    NotAList { path: String },

    #[error("Unknown filter `{key}` on type {type_name}")]
    UnknownField { type_name: String, key: String },

    #[error("Cannot filter on relationship properties at `{path}`: the relationship has no properties")]
    NoRelationshipProperties { path: String },

    #[error("Filter parameter `{0}` bound twice")]
    DuplicateParameter(String),
}

/// The input of one `where` compilation. Connection filters (`{ node, edge }`) are compiled
/// against a node and, when present, the matched relationship.
#[derive(Debug, Clone, Copy)]
pub struct WhereRequest<'a> {
    pub input: &'a Value,
    pub node: &'a NodeType,
    pub node_variable: &'a str,
    pub relationship: Option<&'a RelationshipType>,
    pub relationship_variable: Option<&'a str>,
    pub prefix: &'a ParameterPrefix,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WherePredicate {
    pub predicate: String,
    pub params: Parameters,
    /// Runs before the predicate, e.g. to aggregate over related nodes.
    pub subquery: Option<String>,
}

pub trait WhereCompiler {
    /// Compiles a connection `where`. Returns `None` when the filter does not restrict anything.
    fn compile_where(&self, request: &WhereRequest<'_>) -> Result<Option<WherePredicate>, FilterError>;
}

/// Equality, negation, membership, ordering and string matching on properties, composed with
/// `AND`, `OR` and `NOT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyWhereCompiler;

const COMPARISONS: [(&str, Comparison); 10] = [
    ("_NOT_IN", Comparison::NotIn),
    ("_NOT", Comparison::Not),
    ("_IN", Comparison::In),
    ("_LTE", Comparison::Lte),
    ("_LT", Comparison::Lt),
    ("_GTE", Comparison::Gte),
    ("_GT", Comparison::Gt),
    ("_CONTAINS", Comparison::Contains),
    ("_STARTS_WITH", Comparison::StartsWith),
    ("_ENDS_WITH", Comparison::EndsWith),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Equals,
    Not,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    StartsWith,
    EndsWith,
}

impl Comparison {
    fn render(self, lhs: &str, param: &str, value: &Value) -> String {
        match (self, value) {
            (Self::Equals, Value::Null) => format!("{lhs} IS NULL"),
            (Self::Not, Value::Null) => format!("{lhs} IS NOT NULL"),
            (Self::Equals, _) => format!("{lhs} = {param}"),
            (Self::Not, _) => format!("NOT ({lhs} = {param})"),
            (Self::In, _) => format!("{lhs} IN {param}"),
            (Self::NotIn, _) => format!("NOT ({lhs} IN {param})"),
            (Self::Lt, _) => format!("{lhs} < {param}"),
            (Self::Lte, _) => format!("{lhs} <= {param}"),
            (Self::Gt, _) => format!("{lhs} > {param}"),
            (Self::Gte, _) => format!("{lhs} >= {param}"),
            (Self::Contains, _) => format!("{lhs} CONTAINS {param}"),
            (Self::StartsWith, _) => format!("{lhs} STARTS WITH {param}"),
            (Self::EndsWith, _) => format!("{lhs} ENDS WITH {param}"),
        }
    }
}

struct PropertyScope<'a> {
    container: ParentContainer<'a>,
    variable: &'a str,
}

impl PropertyWhereCompiler {
    fn connection(
        &self,
        request: &WhereRequest<'_>,
        input: &Map<String, Value>,
        prefix: &ParameterPrefix,
        params: &mut Parameters,
    ) -> Result<Vec<String>, FilterError> {
        let mut predicates = Vec::new();

        for (key, value) in input {
            let path = prefix.segment(key);

            match key.as_str() {
                "node" => {
                    let scope = PropertyScope {
                        container: request.node.into(),
                        variable: request.node_variable,
                    };
                    predicates.extend(self.properties(&scope, object(value, &path)?, &path, params)?);
                }
                "edge" => {
                    let (Some(relationship), Some(variable)) = (request.relationship, request.relationship_variable) else {
                        return Err(FilterError::NoRelationshipProperties { path: path.to_string() });
                    };
                    let scope = PropertyScope {
                        container: relationship.into(),
                        variable,
                    };
                    predicates.extend(self.properties(&scope, object(value, &path)?, &path, params)?);
                }
                "AND" | "OR" => {
                    let parts = self.composite(value, &path, params, |item, path, params| {
                        self.connection(request, object(item, path)?, path, params)
                    })?;
                    predicates.extend(combine(key, parts));
                }
                "NOT" => {
                    let inner = self.connection(request, object(value, &path)?, &path, params)?;
                    predicates.extend(and(inner).map(|p| format!("NOT ({p})")));
                }
                _ => {
                    return Err(FilterError::UnknownField {
                        type_name: request.node.name().to_owned(),
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(predicates)
    }

    fn properties(
        &self,
        scope: &PropertyScope<'_>,
        input: &Map<String, Value>,
        prefix: &ParameterPrefix,
        params: &mut Parameters,
    ) -> Result<Vec<String>, FilterError> {
        let mut predicates = Vec::new();

        for (key, value) in input {
            let path = prefix.segment(key);

            match key.as_str() {
                "AND" | "OR" => {
                    let parts = self.composite(value, &path, params, |item, path, params| {
                        self.properties(scope, object(item, path)?, path, params)
                    })?;
                    predicates.extend(combine(key, parts));
                }
                "NOT" => {
                    let inner = self.properties(scope, object(value, &path)?, &path, params)?;
                    predicates.extend(and(inner).map(|p| format!("NOT ({p})")));
                }
                _ => {
                    let (field, comparison) = resolve_filter_key(scope.container, key).ok_or_else(|| FilterError::UnknownField {
                        type_name: scope.container.name().to_owned(),
                        key: key.clone(),
                    })?;

                    let lhs = property(scope.variable, field);
                    let param_name = prefix.leaf(key);

                    if !value.is_null() {
                        params
                            .insert(param_name.clone(), value.clone())
                            .map_err(|_| FilterError::DuplicateParameter(param_name.clone()))?;
                    }

                    predicates.push(comparison.render(&lhs, &param_ref(&param_name), value));
                }
            }
        }

        Ok(predicates)
    }

    /// Compiles every item of an `AND`/`OR` list under its own indexed prefix.
    fn composite<F>(&self, value: &Value, path: &ParameterPrefix, params: &mut Parameters, compile: F) -> Result<Vec<String>, FilterError>
    where
        F: Fn(&Value, &ParameterPrefix, &mut Parameters) -> Result<Vec<String>, FilterError>,
    {
        let Value::Array(items) = value else {
            return Err(FilterError::NotAList { path: path.to_string() });
        };

        let mut parts = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let inner = compile(item, &path.indexed(Some(index)), params)?;
            parts.extend(and(inner));
        }

        Ok(parts)
    }
}

impl WhereCompiler for PropertyWhereCompiler {
    fn compile_where(&self, request: &WhereRequest<'_>) -> Result<Option<WherePredicate>, FilterError> {
        let input = object(request.input, request.prefix)?;
        let mut params = Parameters::new();

        let predicates = self.connection(request, input, request.prefix, &mut params)?;

        Ok(and(predicates).map(|predicate| WherePredicate {
            predicate,
            params,
            subquery: None,
        }))
    }
}

fn object<'v>(value: &'v Value, path: &ParameterPrefix) -> Result<&'v Map<String, Value>, FilterError> {
    value.as_object().ok_or_else(|| FilterError::NotAnObject { path: path.to_string() })
}

/// The storage property and comparison of a filter key such as `title_STARTS_WITH`.
fn resolve_filter_key<'a>(container: ParentContainer<'a>, key: &str) -> Option<(&'a str, Comparison)> {
    let lookup = |name: &str| container.scalar_fields().iter().find(|f| f.name() == name);

    if let Some(field) = lookup(key) {
        return Some((field.db_name(), Comparison::Equals));
    }

    COMPARISONS.iter().find_map(|(suffix, comparison)| {
        let name = key.strip_suffix(suffix)?;
        lookup(name).map(|field| (field.db_name(), *comparison))
    })
}

fn and(predicates: Vec<String>) -> Option<String> {
    match predicates.len() {
        0 => None,
        1 => predicates.into_iter().next(),
        _ => Some(format!("({})", predicates.join(" AND "))),
    }
}

fn combine(operator: &str, parts: Vec<String>) -> Option<String> {
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => Some(format!("({})", parts.iter().join(&format!(" {operator} ")))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_schema::{ScalarField, TypeIdentifier};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compile(node: &NodeType, relationship: Option<&RelationshipType>, input: Value) -> Result<Option<WherePredicate>, FilterError> {
        let prefix = ParameterPrefix::root("this", "update").segment("actors").segment("where");

        PropertyWhereCompiler.compile_where(&WhereRequest {
            input: &input,
            node,
            node_variable: "this_actors0",
            relationship,
            relationship_variable: relationship.map(|_| "this_actors0_relationship"),
            prefix: &prefix,
        })
    }

    fn actor() -> NodeType {
        NodeType::new("Actor")
            .field(ScalarField::new("name", TypeIdentifier::String))
            .field(ScalarField::new("age", TypeIdentifier::Int))
    }

    #[test]
    fn empty_filter_is_no_predicate() {
        assert_eq!(compile(&actor(), None, json!({})).unwrap(), None);
        assert_eq!(compile(&actor(), None, json!({ "node": {} })).unwrap(), None);
    }

    #[test]
    fn compiles_comparisons_and_composition() {
        let input = json!({
            "node": {
                "name_STARTS_WITH": "Al",
                "OR": [{ "age_LT": 30 }, { "age": null }]
            }
        });

        let compiled = compile(&actor(), None, input).unwrap().unwrap();

        assert_eq!(
            compiled.predicate,
            "(this_actors0.name STARTS WITH $`this.update.actors.where.node.name_STARTS_WITH` AND (this_actors0.age < $`this.update.actors.where.node.OR[0].age_LT` OR this_actors0.age IS NULL))"
        );
        assert_eq!(
            compiled.params.keys().collect::<Vec<_>>(),
            vec![
                "this.update.actors.where.node.name_STARTS_WITH",
                "this.update.actors.where.node.OR[0].age_LT"
            ]
        );
    }

    #[test]
    fn compiles_edge_filters() {
        let acted_in = RelationshipType::new("ActedIn").field(ScalarField::new("role", TypeIdentifier::String));

        let compiled = compile(&actor(), Some(&acted_in), json!({ "edge": { "role_NOT": "Extra" } }))
            .unwrap()
            .unwrap();

        assert_eq!(
            compiled.predicate,
            "NOT (this_actors0_relationship.role = $`this.update.actors.where.edge.role_NOT`)"
        );
    }

    #[test]
    fn rejects_unknown_keys_and_shapes() {
        let unknown = compile(&actor(), None, json!({ "node": { "salary_GT": 3 } })).unwrap_err();
        assert_eq!(unknown.to_string(), "Unknown filter `salary_GT` on type Actor");

        let not_an_object = compile(&actor(), None, json!([])).unwrap_err();
        assert!(matches!(not_an_object, FilterError::NotAnObject { .. }));

        let no_edge = compile(&actor(), None, json!({ "edge": {} })).unwrap_err();
        assert!(matches!(no_edge, FilterError::NoRelationshipProperties { .. }));
    }
}
