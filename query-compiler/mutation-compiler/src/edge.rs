use crate::{
    MutationError, MutationResult, Statements,
    conflicts::assert_no_conflicts,
    context::TranslationContext,
    input::{InputEntry, InputMap, as_object},
    naming::ParameterPrefix,
    operators::WriteScope,
};
use graph_schema::{NodeType, ParentContainer, RelationField, RelationshipType, WritePhase};
use serde_json::Value;

/// The relationship whose properties are written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeTarget<'a> {
    pub parent: &'a NodeType,
    pub field: &'a RelationField,
    pub variable: &'a str,
    pub prefix: &'a ParameterPrefix,
    pub phase: WritePhase,
}

/// Sets relationship properties from an `edge` input object.
#[tracing::instrument(skip_all, fields(field = target.field.name(), variable = target.variable))]
pub(crate) fn set_edge_properties(ctx: &TranslationContext<'_>, target: &EdgeTarget<'_>, edge: &Value) -> MutationResult<Statements> {
    let Some(relationship) = ctx.schema.relationship_for(target.field)? else {
        return Err(MutationError::UnexpectedEdge {
            type_name: target.parent.name().to_owned(),
            field: target.field.name().to_owned(),
        });
    };

    let input = as_object(edge, target.prefix)?;

    let (input, prefix) = match sibling_entry(relationship, target.field, input) {
        Sibling::NotNamespaced => (input, target.prefix.clone()),
        Sibling::Entry(value) => {
            let prefix = target.prefix.segment(relationship.name());
            (as_object(value, &prefix)?, prefix)
        }
        Sibling::Missing => return Ok(Statements::new()),
    };

    let container = ParentContainer::from(relationship);
    assert_no_conflicts(container, input)?;

    let scope = WriteScope {
        container,
        variable: target.variable,
        prefix: &prefix,
        phase: target.phase,
    };

    let mut statements = Statements::new();
    let mut wrote_scalars = false;

    if target.phase == WritePhase::Create {
        scope.autogenerated(input).into_iter().for_each(|s| statements.push(s));
        statements.absorb(scope.callbacks(ctx))?;
    }

    for entry in InputEntry::classify(container, input)? {
        if let InputEntry::Scalar {
            key,
            field,
            operator,
            value,
        } = entry
        {
            statements.absorb(scope.scalar(key, field, operator, value)?)?;
            wrote_scalars = true;
        }
    }

    if target.phase == WritePhase::Update && wrote_scalars {
        scope.autogenerated(input).into_iter().for_each(|s| statements.push(s));
        statements.absorb(scope.callbacks(ctx))?;
    }

    Ok(statements)
}

enum Sibling<'v> {
    NotNamespaced,
    Entry(&'v Value),
    Missing,
}

/// Edge input of an interface relationship implemented by several edge types is keyed by
/// properties type name. Only the entry for `relationship` applies.
fn sibling_entry<'v>(relationship: &RelationshipType, field: &RelationField, input: &'v InputMap) -> Sibling<'v> {
    let siblings = field.sibling_properties();
    let is_sibling = |key: &String| key == relationship.name() || siblings.contains(key);

    if siblings.is_empty() || input.is_empty() || !input.keys().all(is_sibling) {
        return Sibling::NotNamespaced;
    }

    match input.get(relationship.name()) {
        Some(value) => Sibling::Entry(value),
        None => Sibling::Missing,
    }
}
