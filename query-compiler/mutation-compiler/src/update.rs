//! Nested updates. Relation fields are compiled before scalar assignments; every relation field
//! runs its operations in a fixed order: `delete`, `disconnect`, `update`, `connect`,
//! `connectOrCreate`, `create`.

use crate::{
    MutationError, MutationResult, Statements,
    authorization::{AuthorizationOperation, AuthorizationTarget, Timing, authorize, gate},
    conflicts::assert_no_conflicts,
    connection::{ConnectionItems, ConnectionKind, translate_connections},
    context::TranslationContext,
    create::{NestedCreate, create_related},
    cypher::{WithVars, arrows, call_block, escape_name, label_string},
    delete::{DeleteBranch, delete_branch, push_match_filter},
    edge::{EdgeTarget, set_edge_properties},
    filter::WhereRequest,
    input::{DeleteFieldInput, InputEntry, InputMap, UpdateConnectionInput, UpdateFieldInput, coerce_vec, parse, retain_owned},
    naming::{ParameterPrefix, list_index, nested_variable, relationship_variable},
    operators::WriteScope,
    targets::{ResolvedTarget, resolve_targets},
    validation::{cardinality_guard, relationship_validation},
};
use graph_schema::{NodeType, ParentContainer, RelationField, WritePhase};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub(crate) struct UpdateRequest<'a> {
    pub node: &'a NodeType,
    pub input: &'a InputMap,
    /// Bound by the caller before the update runs.
    pub variable: &'a str,
    pub with_vars: &'a WithVars,
    pub prefix: &'a ParameterPrefix,
    pub validate_relationships: bool,
    /// Whether the node-level "before" predicate is applied here. Nested updates authorize the
    /// node where it is matched instead.
    pub authorize_node: bool,
}

#[tracing::instrument(skip_all, fields(node = request.node.name(), variable = request.variable))]
pub(crate) fn update_node(ctx: &TranslationContext<'_>, request: &UpdateRequest<'_>) -> MutationResult<Statements> {
    let container = ParentContainer::from(request.node);
    assert_no_conflicts(container, request.input)?;

    let (relations, scalars): (Vec<_>, Vec<_>) = InputEntry::classify(container, request.input)?
        .into_iter()
        .partition(|entry| matches!(entry, InputEntry::Relation { .. }));

    let mut statements = Statements::new();
    let mut before = Vec::new();
    let mut after = Vec::new();

    for entry in relations {
        if let InputEntry::Relation { field, value } = entry {
            statements.absorb(update_relation_field(ctx, request, field, value)?)?;
        }
    }

    let scope = WriteScope {
        container,
        variable: request.variable,
        prefix: request.prefix,
        phase: WritePhase::Update,
    };
    let operations = [AuthorizationOperation::Update];
    let mut wrote_scalars = false;

    for entry in scalars {
        let InputEntry::Scalar {
            key,
            field,
            operator,
            value,
        } = entry
        else {
            continue;
        };

        statements.absorb(scope.scalar(key, field, operator, value)?)?;

        let field_target = [AuthorizationTarget::field(request.node, request.variable, field.name())];
        before.extend(authorize(ctx, Timing::Before, &field_target, &operations, request.prefix, &mut statements)?);
        after.extend(authorize(ctx, Timing::After, &field_target, &operations, request.prefix, &mut statements)?);

        wrote_scalars = true;
    }

    // Timestamps and callbacks only apply to an update that writes a scalar.
    if wrote_scalars {
        scope
            .autogenerated(request.input)
            .into_iter()
            .for_each(|s| statements.push(s));
        statements.absorb(scope.callbacks(ctx))?;
    }

    let node_target = [AuthorizationTarget::node(request.node, request.variable)];

    if request.authorize_node {
        before.extend(authorize(ctx, Timing::Before, &node_target, &operations, request.prefix, &mut statements)?);
    }

    after.extend(authorize(ctx, Timing::After, &node_target, &operations, request.prefix, &mut statements)?);
    after.extend(statements.authorization_mut().take_after());

    let mut output = Statements::new();

    if let Some(gate) = gate(request.with_vars, &before) {
        output.push(gate);
    }

    output.absorb(statements)?;

    if let Some(gate) = gate(request.with_vars, &after) {
        output.push(gate);
    }

    if request.validate_relationships && ctx.validates_relationships() {
        if let Some(validation) = relationship_validation(ctx, request.node, request.variable)? {
            output.push(validation);
        }
    }

    tracing::trace!(fragments = output.fragments().len(), "compiled update");

    Ok(output)
}

fn update_relation_field(
    ctx: &TranslationContext<'_>,
    request: &UpdateRequest<'_>,
    field: &RelationField,
    value: &Value,
) -> MutationResult<Statements> {
    let field_prefix = request.prefix.segment(field.name());
    let targets = resolve_targets(ctx.schema, field, value, &field_prefix)?;
    let all_targets = ctx.schema.concrete_targets(field)?;

    let mut statements = Statements::new();
    let mut guarded = false;

    for (position, target) in targets.iter().enumerate() {
        let mut branch = Statements::new();

        for (index, descriptor) in coerce_vec(target.input).into_iter().enumerate() {
            let variable = nested_variable(request.variable, field.name(), target.qualifier, index);
            let prefix = field_prefix
                .qualified(target.qualifier)
                .indexed(list_index(target.input.is_array(), index));
            let input: UpdateFieldInput = parse(descriptor, &prefix)?;

            let operation = FieldOperation {
                request,
                field,
                target,
                all_targets: &all_targets,
                variable: &variable,
                prefix: &prefix,
            };

            if let Some(delete) = &input.delete {
                branch.absorb(operation.delete(ctx, delete)?)?;
            }

            if let Some(disconnect) = &input.disconnect {
                branch.absorb(operation.connections(ctx, ConnectionKind::Disconnect, disconnect)?)?;
            }

            if let Some(update) = &input.update {
                branch.absorb(operation.update(ctx, input.filter.as_ref(), update)?)?;
            }

            let links = input.connect.is_some() || input.connect_or_create.is_some() || input.create.is_some();

            if links && !field.is_list() && !guarded {
                branch.push(cardinality_guard(
                    request.with_vars,
                    request.node,
                    request.variable,
                    field,
                    &all_targets,
                ));
                guarded = true;
            }

            // Interface connects match every implementation at once.
            if let Some(connect) = input.connect.as_ref().filter(|_| !field.is_interface() || position == 0) {
                branch.absorb(operation.connections(ctx, ConnectionKind::Connect, connect)?)?;
            }

            if let Some(connect_or_create) = &input.connect_or_create {
                if field.is_interface() {
                    return Err(MutationError::UnsupportedOperation {
                        operation: "connectOrCreate",
                        type_name: request.node.name().to_owned(),
                        field: field.name().to_owned(),
                    });
                }

                branch.absorb(operation.connections(ctx, ConnectionKind::ConnectOrCreate, connect_or_create)?)?;
            }

            if let Some(create) = &input.create {
                branch.absorb(operation.create(ctx, create)?)?;
            }
        }

        if field.is_interface() && !branch.is_empty() {
            let mut lines = vec![format!("WITH {}", request.with_vars)];
            lines.extend(statements.absorb_bindings(branch)?);
            lines.push(format!("RETURN count(*) AS update_{}_{}", request.variable, target.node.name()));

            statements.push("WITH *");
            statements.push(call_block(&lines.join("\n")));
        } else {
            statements.absorb(branch)?;
        }
    }

    Ok(statements)
}

/// One operation descriptor under a relation field, for one concrete target.
struct FieldOperation<'a> {
    request: &'a UpdateRequest<'a>,
    field: &'a RelationField,
    target: &'a ResolvedTarget<'a>,
    all_targets: &'a [&'a NodeType],
    /// Variable of the related node, e.g. `this_actors0`.
    variable: &'a str,
    prefix: &'a ParameterPrefix,
}

impl FieldOperation<'_> {
    fn delete(&self, ctx: &TranslationContext<'_>, delete: &Value) -> MutationResult<Statements> {
        let mut statements = Statements::new();

        for (index, item) in coerce_vec(delete).into_iter().enumerate() {
            let prefix = self.prefix.segment("delete").indexed(list_index(delete.is_array(), index));
            let input: DeleteFieldInput = parse(item, &prefix)?;
            let variable = format!("{}_delete{index}", self.variable);

            let branch = DeleteBranch {
                parent: self.request.node,
                parent_variable: self.request.variable,
                with_vars: self.request.with_vars,
                field: self.field,
                target: self.target.node,
                variable: &variable,
                prefix: &prefix,
            };

            statements.absorb(delete_branch(ctx, &branch, &input)?)?;
        }

        Ok(statements)
    }

    fn connections(&self, ctx: &TranslationContext<'_>, kind: ConnectionKind, value: &Value) -> MutationResult<Statements> {
        let single = [self.target.node];
        let targets: &[&NodeType] = match kind {
            ConnectionKind::Connect if self.field.is_interface() => self.all_targets,
            _ => &single,
        };

        translate_connections(
            ctx,
            kind,
            &ConnectionItems {
                parent: self.request.node,
                parent_variable: self.request.variable,
                field: self.field,
                targets,
                value,
                stem: self.variable,
                with_vars: self.request.with_vars,
                prefix: self.prefix,
            },
        )
    }

    fn update(&self, ctx: &TranslationContext<'_>, filter: Option<&Value>, update: &UpdateConnectionInput) -> MutationResult<Statements> {
        let request = self.request;
        let target = self.target.node;
        let variable = self.variable;
        let relationship = relationship_variable(variable);
        let (left, right) = arrows(self.field.direction());
        let update_prefix = self.prefix.segment("update");

        let mut statements = Statements::new();
        let mut body = Statements::new();

        statements.push(format!("WITH {}", request.with_vars));
        body.push(format!("WITH {}", request.with_vars));
        body.push(format!(
            "MATCH ({}){left}[{relationship}:{}]{right}({variable}{})",
            request.variable,
            escape_name(self.field.relationship_type()),
            label_string(target),
        ));

        let filter = match filter {
            Some(filter) => {
                let where_request = WhereRequest {
                    input: filter,
                    node: target,
                    node_variable: variable,
                    relationship: ctx.schema.relationship_for(self.field)?,
                    relationship_variable: Some(&relationship),
                    prefix: &self.prefix.segment("where"),
                };

                match ctx.filters.compile_where(&where_request) {
                    Ok(filter) => filter,
                    Err(err) => {
                        debug!(%err, variable, "where could not be compiled, the branch updates nothing");

                        body.push(format!("RETURN count(*) AS update_{variable}"));
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
            &[AuthorizationTarget::node(target, variable)],
            &[AuthorizationOperation::Update],
            &update_prefix,
            &mut statements,
        )?;

        push_match_filter(&mut statements, &mut body, filter, auth, &relationship, variable, request.with_vars)?;

        if let Some(edge) = &update.edge {
            let edge_target = EdgeTarget {
                parent: request.node,
                field: self.field,
                variable: &relationship,
                prefix: &update_prefix.segment("edge"),
                phase: WritePhase::Update,
            };

            body.absorb(set_edge_properties(ctx, &edge_target, edge)?)?;
        }

        if let Some(node) = &update.node {
            let owned;
            let input = if self.field.is_interface() {
                owned = retain_owned(ParentContainer::from(target), node);
                &owned
            } else {
                node
            };

            let with_vars = request.with_vars.with(variable);
            let nested = UpdateRequest {
                node: target,
                input,
                variable,
                with_vars: &with_vars,
                prefix: &update_prefix.segment("node"),
                validate_relationships: true,
                authorize_node: false,
            };

            body.absorb(update_node(ctx, &nested)?)?;
        }

        body.push(format!("RETURN count(*) AS update_{variable}"));

        let lines = statements.absorb_bindings(body)?;
        statements.push(call_block(&lines.join("\n")));

        Ok(statements)
    }

    fn create(&self, ctx: &TranslationContext<'_>, create: &Value) -> MutationResult<Statements> {
        let base = format!("{}_create", self.variable);

        let mut statements = Statements::new();
        statements.push(format!("WITH {}", self.request.with_vars));
        statements.absorb(create_related(
            ctx,
            &NestedCreate {
                parent: self.request.node,
                parent_variable: self.request.variable,
                field: self.field,
                target: self.target,
                value: create,
                base: &base,
                with_vars: self.request.with_vars,
                prefix: &self.prefix.segment("create"),
            },
        )?)?;

        Ok(statements)
    }
}
