use crate::{
    MutationError, MutationResult, Statements,
    authorization::{AuthorizationOperation, AuthorizationPredicate, AuthorizationTarget, Timing, authorize},
    context::TranslationContext,
    cypher::{WithVars, arrows, call_block, case_where, conjunction, escape_name, label_string},
    filter::{WherePredicate, WhereRequest},
    input::{DeleteFieldInput, InputEntry, InputMap, coerce_vec, parse},
    naming::{ParameterPrefix, list_index, nested_variable, relationship_variable},
    targets::resolve_targets,
};
use graph_schema::{NodeType, ParentContainer, RelationField};
use tracing::debug;

/// The node whose related nodes are deleted.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeleteScope<'a> {
    pub node: &'a NodeType,
    pub variable: &'a str,
    pub with_vars: &'a WithVars,
    pub prefix: &'a ParameterPrefix,
}

/// Compiles a `delete` input object keyed by relation field.
#[tracing::instrument(skip_all, fields(node = scope.node.name(), variable = scope.variable))]
pub(crate) fn delete_related(ctx: &TranslationContext<'_>, scope: &DeleteScope<'_>, input: &InputMap) -> MutationResult<Statements> {
    let mut statements = Statements::new();

    for entry in InputEntry::classify(ParentContainer::from(scope.node), input)? {
        let (field, value) = match entry {
            InputEntry::Relation { field, value } => (field, value),
            InputEntry::Scalar { key, .. } => {
                return Err(MutationError::UnknownField {
                    type_name: scope.node.name().to_owned(),
                    field: key.to_owned(),
                });
            }
        };

        let segment = scope.prefix.segment(field.name());

        for target in resolve_targets(ctx.schema, field, value, &segment)? {
            let field_prefix = segment.qualified(target.qualifier);

            for (index, item) in coerce_vec(target.input).into_iter().enumerate() {
                let prefix = field_prefix.indexed(list_index(target.input.is_array(), index));
                let input: DeleteFieldInput = parse(item, &prefix)?;
                let variable = nested_variable(scope.variable, field.name(), target.qualifier, index);

                let branch = DeleteBranch {
                    parent: scope.node,
                    parent_variable: scope.variable,
                    with_vars: scope.with_vars,
                    field,
                    target: target.node,
                    variable: &variable,
                    prefix: &prefix,
                };

                statements.absorb(delete_branch(ctx, &branch, &input)?)?;
            }
        }
    }

    Ok(statements)
}

/// One `delete` item: the related nodes matched by `where`, and everything below them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeleteBranch<'a> {
    pub parent: &'a NodeType,
    pub parent_variable: &'a str,
    pub with_vars: &'a WithVars,
    pub field: &'a RelationField,
    pub target: &'a NodeType,
    pub variable: &'a str,
    pub prefix: &'a ParameterPrefix,
}

pub(crate) fn delete_branch(
    ctx: &TranslationContext<'_>,
    branch: &DeleteBranch<'_>,
    input: &DeleteFieldInput,
) -> MutationResult<Statements> {
    let variable = branch.variable;
    let relationship = relationship_variable(variable);
    let (left, right) = arrows(branch.field.direction());

    let mut statements = Statements::new();
    let mut body = Statements::new();

    statements.push("WITH *");
    body.push(format!("WITH {}", branch.with_vars));
    body.push(format!(
        "OPTIONAL MATCH ({}){left}[{relationship}:{}]{right}({variable}{})",
        branch.parent_variable,
        escape_name(branch.field.relationship_type()),
        label_string(branch.target),
    ));

    let filter = match &input.filter {
        Some(filter) => {
            let request = WhereRequest {
                input: filter,
                node: branch.target,
                node_variable: variable,
                relationship: ctx.schema.relationship_for(branch.field)?,
                relationship_variable: Some(&relationship),
                prefix: &branch.prefix.segment("where"),
            };

            match ctx.filters.compile_where(&request) {
                Ok(filter) => filter,
                Err(err) => {
                    debug!(%err, variable, "where could not be compiled, the branch deletes nothing");

                    let lines = statements.absorb_bindings(body)?;
                    statements.push(call_block(&lines.join("\n")));

                    return Ok(statements);
                }
            }
        }
        None => None,
    };

    let auth = authorize(
        ctx,
        Timing::Before,
        &[AuthorizationTarget::node(branch.target, variable)],
        &[AuthorizationOperation::Delete],
        branch.prefix,
        &mut statements,
    )?;

    push_match_filter(&mut statements, &mut body, filter, auth, &relationship, variable, branch.with_vars)?;

    if let Some(nested) = &input.delete {
        let with_vars = branch.with_vars.with(variable);
        let scope = DeleteScope {
            node: branch.target,
            variable,
            with_vars: &with_vars,
            prefix: &branch.prefix.segment("delete"),
        };

        body.absorb(delete_related(ctx, &scope, nested)?)?;
    }

    let to_delete = format!("{variable}_to_delete");

    body.push(format!("WITH {relationship}, collect(DISTINCT {variable}) AS {to_delete}"));
    body.push(call_block(&format!(
        "WITH {to_delete}\nUNWIND {to_delete} AS x\nDETACH DELETE x"
    )));

    let lines = statements.absorb_bindings(body)?;
    statements.push(call_block(&lines.join("\n")));

    Ok(statements)
}

/// Filters the matched relationship and node. Subqueries force the conditional-aggregation form.
pub(crate) fn push_match_filter(
    statements: &mut Statements,
    body: &mut Statements,
    filter: Option<WherePredicate>,
    auth: Option<AuthorizationPredicate>,
    relationship: &str,
    variable: &str,
    with_vars: &WithVars,
) -> MutationResult<()> {
    let mut subqueries = Vec::new();
    let mut predicates = Vec::new();

    if let Some(filter) = filter {
        statements.extend_params(filter.params)?;
        subqueries.extend(filter.subquery);
        predicates.push(filter.predicate);
    }

    if let Some(auth) = auth {
        subqueries.extend(auth.subqueries);
        predicates.push(auth.predicate);
    }

    let Some(predicate) = conjunction(predicates.iter().map(String::as_str)) else {
        return Ok(());
    };

    if subqueries.is_empty() {
        body.push(format!("WHERE {predicate}"));
    } else {
        subqueries.into_iter().for_each(|s| body.push(s));
        body.push(case_where(&predicate, relationship, variable, with_vars));
    }

    Ok(())
}
