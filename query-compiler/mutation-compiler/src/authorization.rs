//! Sequencing of authorization predicates. How a predicate is derived is up to the [`Authorizer`];
//! the translators only decide where the "before" and "after" predicates go.

use crate::{
    MutationResult, Parameters, Statements,
    context::TranslationContext,
    cypher::{WithVars, conjunction},
    naming::ParameterPrefix,
};
use graph_schema::NodeType;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationOperation {
    Create,
    Update,
    Delete,
    CreateRelationship,
    DeleteRelationship,
}

/// A node in scope the predicate is generated for. `field` is set for field-level rules.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationTarget<'a> {
    pub node: &'a NodeType,
    pub variable: &'a str,
    pub field: Option<&'a str>,
}

impl<'a> AuthorizationTarget<'a> {
    pub fn node(node: &'a NodeType, variable: &'a str) -> Self {
        Self {
            node,
            variable,
            field: None,
        }
    }

    pub fn field(node: &'a NodeType, variable: &'a str, field: &'a str) -> Self {
        Self {
            node,
            variable,
            field: Some(field),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    pub targets: &'a [AuthorizationTarget<'a>],
    pub operations: &'a [AuthorizationOperation],
    /// Parameter prefix of the input position being authorized.
    pub index_prefix: Option<&'a str>,
}

/// A predicate returned by the authorizer, with the parameters it references and an optional
/// subquery that has to run before the predicate can be evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationClause {
    pub predicate: String,
    pub params: Parameters,
    pub subqueries: Option<String>,
}

pub trait Authorizer {
    /// Filters existing data before a write touches it.
    fn before(&self, request: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>>;

    /// Validates the state produced by a write.
    fn after(&self, request: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>>;
}

/// Grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthorization;

impl Authorizer for NoAuthorization {
    fn before(&self, _: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(None)
    }

    fn after(&self, _: &AuthorizationRequest<'_>) -> MutationResult<Option<AuthorizationClause>> {
        Ok(None)
    }
}

/// An authorization predicate whose parameters are already bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPredicate {
    pub predicate: String,
    pub subqueries: Option<String>,
}

/// Predicates discovered by a nested call that its caller has to place.
#[derive(Debug, Default)]
pub struct AuthorizationMeta {
    after: Vec<AuthorizationPredicate>,
}

impl AuthorizationMeta {
    pub fn push_after(&mut self, predicate: AuthorizationPredicate) {
        self.after.push(predicate);
    }

    pub fn absorb(&mut self, other: AuthorizationMeta) {
        self.after.extend(other.after);
    }

    pub fn take_after(&mut self) -> Vec<AuthorizationPredicate> {
        std::mem::take(&mut self.after)
    }

    pub fn is_empty(&self) -> bool {
        self.after.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timing {
    Before,
    After,
}

/// Asks the authorizer for a predicate and binds its parameters into `statements`.
pub(crate) fn authorize(
    ctx: &TranslationContext<'_>,
    timing: Timing,
    targets: &[AuthorizationTarget<'_>],
    operations: &[AuthorizationOperation],
    prefix: &ParameterPrefix,
    statements: &mut Statements,
) -> MutationResult<Option<AuthorizationPredicate>> {
    let request = AuthorizationRequest {
        targets,
        operations,
        index_prefix: Some(prefix.as_str()),
    };

    let clause = match timing {
        Timing::Before => ctx.authorizer.before(&request)?,
        Timing::After => ctx.authorizer.after(&request)?,
    };

    let Some(clause) = clause else {
        return Ok(None);
    };

    statements.extend_params(clause.params)?;

    Ok(Some(AuthorizationPredicate {
        predicate: clause.predicate,
        subqueries: clause.subqueries,
    }))
}

/// `WITH vars` (+ subqueries) `WHERE p1 AND p2`, or nothing when there is no predicate.
pub(crate) fn gate(with_vars: &WithVars, predicates: &[AuthorizationPredicate]) -> Option<String> {
    let predicate = conjunction(predicates.iter().map(|p| p.predicate.as_str()))?;
    let subqueries: Vec<&str> = predicates.iter().filter_map(|p| p.subqueries.as_deref()).collect();

    let mut lines = vec![format!("WITH {with_vars}")];

    if !subqueries.is_empty() {
        lines.extend(subqueries.iter().map(|s| (*s).to_owned()));
        lines.push("WITH *".to_owned());
    }

    lines.push(format!("WHERE {predicate}"));

    Some(lines.join("\n"))
}
