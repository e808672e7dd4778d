//! Connecting and disconnecting existing nodes. The translators decide naming, ordering and
//! cardinality guards; a [`ConnectionTranslator`] produces the statements of one operation item.

use crate::{
    MutationResult, Statements,
    authorization::{AuthorizationOperation, AuthorizationPredicate, AuthorizationTarget, Timing, authorize},
    context::TranslationContext,
    cypher::{WithVars, arrows, call_block, case_where, conjunction, escape_name, indent, label_disjunction, label_string, param_ref},
    edge::{EdgeTarget, set_edge_properties},
    filter::WhereRequest,
    input::{ConnectInput, ConnectOrCreateInput, DisconnectInput, InputEntry, coerce_vec, parse},
    naming::{ParameterPrefix, list_index, relationship_variable},
    operators::WriteScope,
};
use graph_schema::{NodeType, ParentContainer, RelationField, WritePhase};
use serde_json::Value;

/// One `connect`, `disconnect` or `connectOrCreate` item under a relation field.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionRequest<'a> {
    pub parent: &'a NodeType,
    pub parent_variable: &'a str,
    pub field: &'a RelationField,
    /// Every concrete type the far node may have. More than one for interface fields.
    pub targets: &'a [&'a NodeType],
    pub input: &'a Value,
    /// Variable of the far node.
    pub variable: &'a str,
    pub with_vars: &'a WithVars,
    pub prefix: &'a ParameterPrefix,
    /// Far-node authorization computed by the caller, already bound. Set for disconnects.
    pub authorization: Option<&'a AuthorizationPredicate>,
}

pub trait ConnectionTranslator {
    fn connect(&self, ctx: &TranslationContext<'_>, request: &ConnectionRequest<'_>) -> MutationResult<Statements>;

    fn disconnect(&self, ctx: &TranslationContext<'_>, request: &ConnectionRequest<'_>) -> MutationResult<Statements>;

    fn connect_or_create(&self, ctx: &TranslationContext<'_>, request: &ConnectionRequest<'_>) -> MutationResult<Statements>;
}

/// Connects with `OPTIONAL MATCH` + guarded `MERGE`, disconnects with guarded `DELETE`, and
/// connect-or-creates by merging the far node on its `where` properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct CypherConnections;

impl CypherConnections {
    fn connect_target(
        &self,
        ctx: &TranslationContext<'_>,
        request: &ConnectionRequest<'_>,
        input: &ConnectInput,
        target: &NodeType,
        variable: &str,
    ) -> MutationResult<Statements> {
        let mut statements = Statements::new();
        let mut body = Statements::new();
        let relationship = relationship_variable(variable);
        let (left, right) = arrows(request.field.direction());

        body.push(format!("WITH {}", request.with_vars));
        body.push(format!("OPTIONAL MATCH ({variable}{})", label_string(target)));

        let filter = match &input.filter {
            Some(filter) => ctx.filters.compile_where(&WhereRequest {
                input: filter,
                node: target,
                node_variable: variable,
                relationship: None,
                relationship_variable: None,
                prefix: &request.prefix.segment("where"),
            })?,
            None => None,
        };

        let auth_targets = [AuthorizationTarget::node(target, variable)];
        let auth = authorize(
            ctx,
            Timing::Before,
            &auth_targets,
            &[AuthorizationOperation::CreateRelationship],
            request.prefix,
            &mut statements,
        )?;

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

        push_filter(&mut body, &subqueries, &predicates);

        let mut merge = Statements::new();
        merge.push(format!(
            "MERGE ({}){left}[{relationship}:{}]{right}({variable})",
            request.parent_variable,
            escape_name(request.field.relationship_type()),
        ));

        if let Some(edge) = &input.edge {
            let edge_target = EdgeTarget {
                parent: request.parent,
                field: request.field,
                variable: &relationship,
                prefix: &request.prefix.segment("edge"),
                phase: WritePhase::Create,
            };
            merge.absorb(set_edge_properties(ctx, &edge_target, edge)?)?;
        }

        let merge_lines = body.absorb_bindings(merge)?;
        body.push(foreach_present(variable, &merge_lines.join("\n")));
        body.push(format!("RETURN count(*) AS connect_{variable}"));

        statements.push("WITH *");
        let lines = statements.absorb_bindings(body)?;
        statements.push(call_block(&lines.join("\n")));

        Ok(statements)
    }
}

impl ConnectionTranslator for CypherConnections {
    #[tracing::instrument(skip_all, fields(field = request.field.name(), variable = request.variable))]
    fn connect(&self, ctx: &TranslationContext<'_>, request: &ConnectionRequest<'_>) -> MutationResult<Statements> {
        let input: ConnectInput = parse(request.input, request.prefix)?;
        let mut statements = Statements::new();

        match request.targets {
            [single] => statements.absorb(self.connect_target(ctx, request, &input, single, request.variable)?)?,
            targets => {
                for target in targets {
                    let variable = format!("{}_{}", request.variable, target.name());
                    statements.absorb(self.connect_target(ctx, request, &input, target, &variable)?)?;
                }
            }
        }

        Ok(statements)
    }

    #[tracing::instrument(skip_all, fields(field = request.field.name(), variable = request.variable))]
    fn disconnect(&self, ctx: &TranslationContext<'_>, request: &ConnectionRequest<'_>) -> MutationResult<Statements> {
        let input: DisconnectInput = parse(request.input, request.prefix)?;
        let variable = request.variable;
        let relationship = relationship_variable(variable);
        let (left, right) = arrows(request.field.direction());
        let relationship_properties = ctx.schema.relationship_for(request.field)?;

        let mut statements = Statements::new();
        let mut body = Statements::new();

        body.push(format!("WITH {}", request.with_vars));

        let mut subqueries = Vec::new();
        let mut predicates = Vec::new();

        body.push(format!(
            "OPTIONAL MATCH ({}){left}[{relationship}:{}]{right}({variable}{})",
            request.parent_variable,
            escape_name(request.field.relationship_type()),
            label_disjunction(request.targets),
        ));

        if let (Some(filter), Some(target)) = (&input.filter, request.targets.first()) {
            let compiled = ctx.filters.compile_where(&WhereRequest {
                input: filter,
                node: target,
                node_variable: variable,
                relationship: relationship_properties,
                relationship_variable: Some(&relationship),
                prefix: &request.prefix.segment("where"),
            })?;

            if let Some(compiled) = compiled {
                statements.extend_params(compiled.params)?;
                subqueries.extend(compiled.subquery);
                predicates.push(compiled.predicate);
            }
        }

        if let Some(auth) = request.authorization {
            subqueries.extend(auth.subqueries.clone());
            predicates.push(auth.predicate.clone());
        }

        if subqueries.is_empty() {
            body.push(conjunction(predicates.iter().map(String::as_str)).map(|p| format!("WHERE {p}")).unwrap_or_default());
        } else if let Some(predicate) = conjunction(predicates.iter().map(String::as_str)) {
            subqueries.iter().for_each(|s| body.push(s.as_str()));
            body.push(case_where(&predicate, &relationship, variable, request.with_vars));
        }

        body.push(foreach_present(variable, &format!("DELETE {relationship}")));
        body.push(format!("RETURN count(*) AS disconnect_{variable}"));

        statements.push("WITH *");
        let lines = statements.absorb_bindings(body)?;
        statements.push(call_block(&lines.join("\n")));

        Ok(statements)
    }

    #[tracing::instrument(skip_all, fields(field = request.field.name(), variable = request.variable))]
    fn connect_or_create(&self, ctx: &TranslationContext<'_>, request: &ConnectionRequest<'_>) -> MutationResult<Statements> {
        let input: ConnectOrCreateInput = parse(request.input, request.prefix)?;
        let variable = request.variable;
        let relationship = relationship_variable(variable);
        let (left, right) = arrows(request.field.direction());

        let mut statements = Statements::new();

        for target in request.targets {
            let container = ParentContainer::from(*target);
            let where_prefix = request.prefix.segment("where").segment("node");
            let mut body = Statements::new();
            let mut unique = Vec::new();

            for entry in InputEntry::classify(container, &input.filter.node)? {
                let InputEntry::Scalar { key, field, value, .. } = entry else {
                    continue;
                };

                let param = where_prefix.leaf(key);
                unique.push(format!("{}: {}", escape_name(field.db_name()), param_ref(&param)));
                body.param(param, value.clone())?;
            }

            body.push(format!("WITH {}", request.with_vars));
            body.push(format!("MERGE ({variable}{} {{ {} }})", label_string(target), unique.join(", ")));

            let node_prefix = request.prefix.segment("onCreate").segment("node");
            let scope = WriteScope {
                container,
                variable,
                prefix: &node_prefix,
                phase: WritePhase::Create,
            };

            let mut on_create = Statements::new();
            scope.autogenerated(&input.on_create.node).into_iter().for_each(|s| on_create.push(s));

            for entry in InputEntry::classify(container, &input.on_create.node)? {
                if let InputEntry::Scalar {
                    key,
                    field,
                    operator,
                    value,
                } = entry
                {
                    on_create.absorb(scope.scalar(key, field, operator, value)?)?;
                }
            }

            let assignments: Vec<String> = body
                .absorb_bindings(on_create)?
                .into_iter()
                .map(|line| line.trim_start_matches("SET ").to_owned())
                .collect();

            if !assignments.is_empty() {
                body.push(format!("ON CREATE SET\n{}", indent(&assignments.join(",\n"))));
            }

            let auth_targets = [AuthorizationTarget::node(target, variable)];
            let auth = authorize(
                ctx,
                Timing::Before,
                &auth_targets,
                &[AuthorizationOperation::CreateRelationship],
                request.prefix,
                &mut body,
            )?;

            if let Some(auth) = auth {
                body.push("WITH *");
                if let Some(subqueries) = auth.subqueries {
                    body.push(subqueries);
                    body.push("WITH *");
                }
                body.push(format!("WHERE {}", auth.predicate));
            }

            body.push(format!(
                "MERGE ({}){left}[{relationship}:{}]{right}({variable})",
                request.parent_variable,
                escape_name(request.field.relationship_type()),
            ));

            if let Some(edge) = &input.on_create.edge {
                let edge_target = EdgeTarget {
                    parent: request.parent,
                    field: request.field,
                    variable: &relationship,
                    prefix: &request.prefix.segment("onCreate").segment("edge"),
                    phase: WritePhase::Create,
                };
                body.absorb(set_edge_properties(ctx, &edge_target, edge)?)?;
            }

            body.push(format!("RETURN count(*) AS connectOrCreate_{variable}"));

            statements.push("WITH *");
            let lines = statements.absorb_bindings(body)?;
            statements.push(call_block(&lines.join("\n")));
        }

        Ok(statements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionKind {
    Connect,
    ConnectOrCreate,
    Disconnect,
}

impl ConnectionKind {
    fn segment(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::ConnectOrCreate => "connectOrCreate",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Every item of one connection operation under a relation field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConnectionItems<'a> {
    pub parent: &'a NodeType,
    pub parent_variable: &'a str,
    pub field: &'a RelationField,
    pub targets: &'a [&'a NodeType],
    pub value: &'a Value,
    /// Items are named `{stem}_{operation}{index}`.
    pub stem: &'a str,
    pub with_vars: &'a WithVars,
    /// Prefix of the relation field; the operation and item index are appended.
    pub prefix: &'a ParameterPrefix,
}

/// Hands every item to the configured [`ConnectionTranslator`]. Disconnects are authorized here,
/// on the far node, so the translator can conjoin the predicate with its `where`.
pub(crate) fn translate_connections(
    ctx: &TranslationContext<'_>,
    kind: ConnectionKind,
    items: &ConnectionItems<'_>,
) -> MutationResult<Statements> {
    let mut statements = Statements::new();

    for (index, item) in coerce_vec(items.value).into_iter().enumerate() {
        let variable = format!("{}_{}{index}", items.stem, kind.segment());
        let prefix = items
            .prefix
            .segment(kind.segment())
            .indexed(list_index(items.value.is_array(), index));

        let authorization = match kind {
            ConnectionKind::Disconnect => {
                let targets: Vec<_> = items
                    .targets
                    .iter()
                    .map(|target| AuthorizationTarget::node(target, &variable))
                    .collect();

                authorize(
                    ctx,
                    Timing::Before,
                    &targets,
                    &[AuthorizationOperation::DeleteRelationship],
                    &prefix,
                    &mut statements,
                )?
            }
            _ => None,
        };

        let request = ConnectionRequest {
            parent: items.parent,
            parent_variable: items.parent_variable,
            field: items.field,
            targets: items.targets,
            input: item,
            variable: &variable,
            with_vars: items.with_vars,
            prefix: &prefix,
            authorization: authorization.as_ref(),
        };

        let translated = match kind {
            ConnectionKind::Connect => ctx.connections.connect(ctx, &request)?,
            ConnectionKind::ConnectOrCreate => ctx.connections.connect_or_create(ctx, &request)?,
            ConnectionKind::Disconnect => ctx.connections.disconnect(ctx, &request)?,
        };

        statements.absorb(translated)?;
    }

    Ok(statements)
}

fn push_filter(body: &mut Statements, subqueries: &[String], predicates: &[String]) {
    let Some(predicate) = conjunction(predicates.iter().map(String::as_str)) else {
        return;
    };

    if subqueries.is_empty() {
        body.push(format!("WHERE {predicate}"));
    } else {
        subqueries.iter().for_each(|s| body.push(s.as_str()));
        body.push("WITH *");
        body.push(format!("WHERE {predicate}"));
    }
}

/// Runs `statements` only for rows where the optionally matched `variable` exists.
fn foreach_present(variable: &str, statements: &str) -> String {
    format!(
        "FOREACH (_ IN CASE WHEN {variable} IS NULL THEN [] ELSE [1] END |\n{}\n)",
        indent(statements)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreach_guards_on_presence() {
        assert_eq!(
            foreach_present("n", "DELETE r"),
            "FOREACH (_ IN CASE WHEN n IS NULL THEN [] ELSE [1] END |\n    DELETE r\n)"
        );
    }
}
