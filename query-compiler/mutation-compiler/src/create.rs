use crate::{
    MutationError, MutationResult, Statements,
    authorization::{AuthorizationOperation, AuthorizationTarget, Timing, authorize, gate},
    conflicts::assert_no_conflicts,
    connection::{ConnectionItems, ConnectionKind, translate_connections},
    context::TranslationContext,
    cypher::{WithVars, arrows, escape_name, label_string},
    edge::{EdgeTarget, set_edge_properties},
    input::{CreateFieldInput, InputEntry, InputMap, RelationCreateInput, as_object, coerce_vec, parse},
    naming::{ParameterPrefix, list_index, nested_base, relationship_variable},
    operators::WriteScope,
    targets::{ResolvedTarget, resolve_targets},
    validation::relationship_validation,
};
use graph_schema::{NodeType, ParentContainer, RelationField, WritePhase};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub(crate) struct CreateRequest<'a> {
    pub node: &'a NodeType,
    pub input: &'a InputMap,
    pub variable: &'a str,
    /// Variables in scope, including `variable`.
    pub with_vars: &'a WithVars,
    pub prefix: &'a ParameterPrefix,
    pub validate_relationships: bool,
}

/// Compiles the creation of one node, its nested creates and connects. The "after" authorization
/// predicates of the created node itself are left in the authorization meta for the caller to
/// place.
#[tracing::instrument(skip_all, fields(node = request.node.name(), variable = request.variable))]
pub(crate) fn create_node(ctx: &TranslationContext<'_>, request: &CreateRequest<'_>) -> MutationResult<Statements> {
    let container = ParentContainer::from(request.node);
    assert_no_conflicts(container, request.input)?;

    let entries = InputEntry::classify(container, request.input)?;
    let scope = WriteScope {
        container,
        variable: request.variable,
        prefix: request.prefix,
        phase: WritePhase::Create,
    };

    let mut statements = Statements::new();
    let mut written_fields = Vec::new();

    statements.push(format!("CREATE ({}{})", request.variable, label_string(request.node)));
    scope
        .autogenerated(request.input)
        .into_iter()
        .for_each(|s| statements.push(s));
    statements.absorb(scope.callbacks(ctx))?;

    for entry in entries {
        match entry {
            InputEntry::Relation { field, value } => {
                statements.absorb(create_relation_field(ctx, request, field, value)?)?;
            }
            InputEntry::Scalar {
                key,
                field,
                operator,
                value,
            } => {
                statements.absorb(scope.scalar(key, field, operator, value)?)?;
                written_fields.push(field.name());
            }
        }
    }

    let operations = [AuthorizationOperation::Create];
    let node_target = [AuthorizationTarget::node(request.node, request.variable)];

    if let Some(predicate) = authorize(ctx, Timing::After, &node_target, &operations, request.prefix, &mut statements)? {
        statements.authorization_mut().push_after(predicate);
    }

    for field in written_fields {
        let field_target = [AuthorizationTarget::field(request.node, request.variable, field)];

        if let Some(predicate) = authorize(ctx, Timing::After, &field_target, &operations, request.prefix, &mut statements)? {
            statements.authorization_mut().push_after(predicate);
        }
    }

    if request.validate_relationships && ctx.validates_relationships() {
        if let Some(validation) = relationship_validation(ctx, request.node, request.variable)? {
            statements.push(validation);
        }
    }

    tracing::trace!(fragments = statements.fragments().len(), "compiled create");

    Ok(statements)
}

fn create_relation_field(
    ctx: &TranslationContext<'_>,
    request: &CreateRequest<'_>,
    field: &RelationField,
    value: &Value,
) -> MutationResult<Statements> {
    let field_prefix = request.prefix.segment(field.name());
    let targets = resolve_targets(ctx.schema, field, value, &field_prefix)?;
    let all_targets = ctx.schema.concrete_targets(field)?;

    let mut statements = Statements::new();

    for (position, target) in targets.iter().enumerate() {
        let prefix = field_prefix.qualified(target.qualifier);
        let input: RelationCreateInput = parse(target.input, &prefix)?;
        let stem = nested_base(request.variable, field.name(), target.qualifier);

        if let Some(create) = &input.create {
            statements.absorb(create_related(
                ctx,
                &NestedCreate {
                    parent: request.node,
                    parent_variable: request.variable,
                    field,
                    target,
                    value: create,
                    base: &stem,
                    with_vars: request.with_vars,
                    prefix: &prefix.segment("create"),
                },
            )?)?;
        }

        // Interface connects are translated once, against every implementation.
        if let Some(connect) = input.connect.as_ref().filter(|_| !field.is_interface() || position == 0) {
            let (stem, prefix, connect_targets) = if field.is_interface() {
                (nested_base(request.variable, field.name(), None), field_prefix.clone(), all_targets.clone())
            } else {
                (stem.clone(), prefix.clone(), vec![target.node])
            };

            statements.absorb(translate_connections(
                ctx,
                ConnectionKind::Connect,
                &ConnectionItems {
                    parent: request.node,
                    parent_variable: request.variable,
                    field,
                    targets: &connect_targets,
                    value: connect,
                    stem: &stem,
                    with_vars: request.with_vars,
                    prefix: &prefix,
                },
            )?)?;
        }

        if let Some(connect_or_create) = &input.connect_or_create {
            if field.is_interface() {
                return Err(MutationError::UnsupportedOperation {
                    operation: "connectOrCreate",
                    type_name: request.node.name().to_owned(),
                    field: field.name().to_owned(),
                });
            }

            statements.absorb(translate_connections(
                ctx,
                ConnectionKind::ConnectOrCreate,
                &ConnectionItems {
                    parent: request.node,
                    parent_variable: request.variable,
                    field,
                    targets: &[target.node],
                    value: connect_or_create,
                    stem: &stem,
                    with_vars: request.with_vars,
                    prefix: &prefix,
                },
            )?)?;
        }
    }

    Ok(statements)
}

/// The `create` operation under a relation field: a new node per item, linked to the parent.
/// Each item is closed with the created node's "after" gate and relationship validation, while the
/// node is still in scope.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NestedCreate<'a> {
    pub parent: &'a NodeType,
    pub parent_variable: &'a str,
    pub field: &'a RelationField,
    pub target: &'a ResolvedTarget<'a>,
    pub value: &'a Value,
    /// Variable stem; items are named `{base}{index}_node`.
    pub base: &'a str,
    pub with_vars: &'a WithVars,
    pub prefix: &'a ParameterPrefix,
}

pub(crate) fn create_related(ctx: &TranslationContext<'_>, nested: &NestedCreate<'_>) -> MutationResult<Statements> {
    let field = nested.field;
    let target = nested.target.node;
    let (left, right) = arrows(field.direction());
    let has_properties = ctx.schema.relationship_for(field)?.is_some();
    let no_edge = Value::Object(Map::new());

    let mut statements = Statements::new();

    for (index, item) in coerce_vec(nested.value).into_iter().enumerate() {
        let item_prefix = nested.prefix.indexed(list_index(nested.value.is_array(), index));
        let item: CreateFieldInput = parse(item, &item_prefix)?;
        let node_prefix = item_prefix.segment("node");

        let node_input = if field.is_interface() {
            assert_single_implementation(nested.parent, field, &item.node)?;

            match item.node.get(target.name()) {
                Some(value) => as_object(value, &node_prefix)?,
                None => continue,
            }
        } else {
            &item.node
        };

        let item_base = format!("{}{index}", nested.base);
        let node_variable = format!("{item_base}_node");
        let relationship = relationship_variable(&item_base);
        let node_with = nested.with_vars.with(node_variable.as_str());
        let merge_with = node_with.with(relationship.as_str());

        let mut created = create_node(
            ctx,
            &CreateRequest {
                node: target,
                input: node_input,
                variable: &node_variable,
                with_vars: &node_with,
                prefix: &node_prefix,
                validate_relationships: false,
            },
        )?;
        let after = created.authorization_mut().take_after();

        statements.push("WITH *");
        statements.absorb(created)?;
        statements.push(format!(
            "MERGE ({}){left}[{relationship}:{}]{right}({node_variable})",
            nested.parent_variable,
            escape_name(field.relationship_type()),
        ));

        let created_side = [AuthorizationTarget::node(target, &node_variable)];
        let before = authorize(
            ctx,
            Timing::Before,
            &created_side,
            &[AuthorizationOperation::CreateRelationship],
            &item_prefix,
            &mut statements,
        )?;

        if let Some(gate) = gate(&merge_with, before.as_slice()) {
            statements.push(gate);
        }

        if item.edge.is_some() || has_properties {
            let edge_target = EdgeTarget {
                parent: nested.parent,
                field,
                variable: &relationship,
                prefix: &item_prefix.segment("edge"),
                phase: WritePhase::Create,
            };
            statements.absorb(set_edge_properties(ctx, &edge_target, item.edge.as_ref().unwrap_or(&no_edge))?)?;
        }

        if let Some(gate) = gate(&node_with, &after) {
            statements.push(gate);
        }

        if ctx.validates_relationships() {
            if let Some(validation) = relationship_validation(ctx, target, &node_variable)? {
                statements.push(validation);
            }
        }
    }

    Ok(statements)
}

/// A one-to-one interface relationship cannot create nodes of several implementations at once.
fn assert_single_implementation(parent: &NodeType, field: &RelationField, node_input: &InputMap) -> MutationResult<()> {
    if field.is_list() {
        return Ok(());
    }

    let implementations = field.target().concrete_names();
    let present = node_input.keys().filter(|key| implementations.contains(*key)).count();

    if present > 1 {
        return Err(MutationError::MultipleNodesForOneToOne {
            type_name: parent.name().to_owned(),
            field: field.name().to_owned(),
        });
    }

    Ok(())
}
