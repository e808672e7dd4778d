#![allow(dead_code)]

use graph_schema::Schema;
use mutation_compiler::{
    AuthorizationClause, AuthorizationRequest, Authorizer, CompiledMutation, CompilerOptions, MutationCompiler,
    MutationResult, Parameters,
};
use indoc::indoc;
use serde_json::{Value, json};
use std::cell::Cell;

pub const MOVIES: &str = indoc! {r#"
    {
      "nodes": [
        {
          "name": "Movie",
          "fields": [
            { "name": "id", "type": "ID", "autogenerate": true },
            { "name": "title", "type": "String", "isRequired": true },
            { "name": "runtime", "type": "Int" },
            { "name": "tags", "type": "String", "isList": true },
            { "name": "owner", "type": "String" }
          ],
          "relationFields": [
            {
              "name": "actors",
              "type": "ACTED_IN",
              "direction": "IN",
              "isList": true,
              "target": { "node": "Actor" },
              "properties": "ActedIn"
            },
            { "name": "actor", "type": "ACTED_IN", "direction": "OUT", "target": { "node": "Actor" } },
            {
              "name": "director",
              "type": "DIRECTED",
              "direction": "IN",
              "target": { "union": { "name": "Director", "members": ["Person", "Studio"] } }
            }
          ]
        },
        {
          "name": "Series",
          "fields": [{ "name": "title", "type": "String" }]
        },
        {
          "name": "Actor",
          "fields": [{ "name": "name", "type": "String" }],
          "relationFields": [
            { "name": "movies", "type": "ACTED_IN", "direction": "OUT", "isList": true, "target": { "node": "Movie" } }
          ]
        },
        { "name": "Person", "labels": ["Person", "Human"], "fields": [{ "name": "name", "type": "String" }] },
        { "name": "Studio", "fields": [{ "name": "name", "type": "String" }] },
        {
          "name": "Reviewer",
          "fields": [{ "name": "name", "type": "String" }],
          "relationFields": [
            {
              "name": "reviewed",
              "type": "REVIEWED",
              "direction": "OUT",
              "isList": true,
              "target": { "interface": { "name": "Production", "implementations": ["Movie", "Series"] } }
            },
            {
              "name": "favorite",
              "type": "FAVORITE",
              "direction": "OUT",
              "target": { "interface": { "name": "Production", "implementations": ["Movie", "Series"] } }
            }
          ]
        },
        { "name": "User", "fields": [{ "name": "email", "type": "String" }] },
        {
          "name": "Critic",
          "fields": [{ "name": "name", "type": "String" }],
          "relationFields": [
            {
              "name": "rated",
              "type": "RATED",
              "direction": "OUT",
              "isList": true,
              "target": { "interface": { "name": "Production", "implementations": ["Movie", "Series"] } },
              "properties": "Rating",
              "siblingProperties": ["Review"]
            }
          ]
        },
        {
          "name": "Article",
          "fields": [
            { "name": "title", "type": "String" },
            { "name": "body", "type": "String" },
            { "name": "slug", "type": "String", "callback": { "name": "slugify", "operations": ["CREATE", "UPDATE"] } },
            { "name": "updatedAt", "type": "DateTime", "timestamps": ["UPDATE"] }
          ]
        }
      ],
      "relationships": [
        {
          "name": "ActedIn",
          "fields": [
            { "name": "screenTime", "type": "Int" },
            { "name": "createdAt", "type": "DateTime", "timestamps": ["CREATE"] }
          ]
        },
        { "name": "Rating", "fields": [{ "name": "score", "type": "Int" }] },
        { "name": "Review", "fields": [{ "name": "text", "type": "String" }] }
      ]
    }
"#};

pub fn schema() -> Schema {
    Schema::from_json(MOVIES).unwrap()
}

/// Options without the trailing relationship validation, for focused golden output.
pub fn unvalidated() -> CompilerOptions {
    CompilerOptions::builder().validate_relationships(false).build()
}

pub fn create(type_name: &str, input: Value) -> MutationResult<CompiledMutation> {
    let schema = schema();
    MutationCompiler::new(&schema).with_options(unvalidated()).create(type_name, &input)
}

pub fn update(type_name: &str, input: Value) -> MutationResult<CompiledMutation> {
    let schema = schema();
    MutationCompiler::new(&schema).with_options(unvalidated()).update(type_name, &input)
}

pub fn delete(type_name: &str, input: Value) -> MutationResult<CompiledMutation> {
    let schema = schema();
    MutationCompiler::new(&schema).with_options(unvalidated()).delete(type_name, &input)
}

pub fn param_names(compiled: &CompiledMutation) -> Vec<&str> {
    compiled.params.keys().collect()
}

/// Restricts every node type with an `owner` property to the authenticated user.
pub struct OwnerAuthorizer;

impl OwnerAuthorizer {
    fn clause(request: &AuthorizationRequest<'_>) -> Option<AuthorizationClause> {
        let predicates: Vec<String> = request
            .targets
            .iter()
            .filter(|target| target.field.is_none() && target.node.find_scalar_field("owner").is_some())
            .map(|target| format!("{}.owner = $jwt.sub", target.variable))
            .collect();

        if predicates.is_empty() {
            return None;
        }

        let mut params = Parameters::new();
        params.insert("jwt", json!({ "sub": "user-1" })).unwrap();

        Some(AuthorizationClause {
            predicate: predicates.join(" AND "),
            params,
            subqueries: None,
        })
    }
}

impl Authorizer for OwnerAuthorizer {
    fn before(&self, request: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(Self::clause(request))
    }

    fn after(&self, _: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(None)
    }
}

/// Applies the owner rule to the state a write produces instead of the data it touches.
pub struct OwnerAfterAuthorizer;

impl Authorizer for OwnerAfterAuthorizer {
    fn before(&self, _: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(None)
    }

    fn after(&self, request: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(OwnerAuthorizer::clause(request))
    }
}

/// Requires every matched node to have editors, which are collected by a subquery first.
pub struct EditorsAuthorizer;

impl Authorizer for EditorsAuthorizer {
    fn before(&self, request: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        let Some(target) = request.targets.iter().find(|target| target.field.is_none()) else {
            return Ok(None);
        };

        let editors = format!("{}_editors", target.variable);

        Ok(Some(AuthorizationClause {
            predicate: format!("size({editors}) > 0"),
            params: Parameters::new(),
            subqueries: Some(format!("CALL {{\n    WITH {}\n    RETURN [] AS {editors}\n}}", target.variable)),
        }))
    }

    fn after(&self, _: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(None)
    }
}

/// Binds a different value under the same parameter name on every call.
#[derive(Default)]
pub struct DriftingAuthorizer {
    calls: Cell<u32>,
}

impl Authorizer for DriftingAuthorizer {
    fn before(&self, _: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        let call = self.calls.get() + 1;
        self.calls.set(call);

        let mut params = Parameters::new();
        params.insert("auth_call", json!(call)).unwrap();

        Ok(Some(AuthorizationClause {
            predicate: "$auth_call > 0".into(),
            params,
            subqueries: None,
        }))
    }

    fn after(&self, _: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(None)
    }
}
