use crate::{
    MutationResult,
    context::TranslationContext,
    cypher::{WithVars, arrows, call_block, escape_name, label_disjunction},
};
use graph_schema::{NodeType, RelationField};

/// One count check per single-cardinality relation field of `node`: required fields must be linked
/// exactly once, optional ones at most once. Returns `None` when the type has no such fields.
pub(crate) fn relationship_validation(ctx: &TranslationContext<'_>, node: &NodeType, variable: &str) -> MutationResult<Option<String>> {
    let mut blocks = Vec::new();

    for field in node.relation_fields().iter().filter(|f| !f.is_list()) {
        let targets = ctx.schema.concrete_targets(field)?;
        let (left, right) = arrows(field.direction());
        let counted = format!("{variable}_{}_unique", field.name());

        let (predicate, message) = if field.is_required() {
            ("c = 1", "required exactly once")
        } else {
            ("c <= 1", "must be less than or equal to one")
        };

        let body = [
            format!("WITH {variable}"),
            format!(
                "MATCH ({variable}){left}[{counted}:{}]{right}({})",
                escape_name(field.relationship_type()),
                label_disjunction(&targets)
            ),
            format!("WITH count({counted}) AS c"),
            format!(
                "CALL apoc.util.validate(NOT ({predicate}), '{} {}.{} {message}', [0])",
                ctx.options.relationship_required_code,
                node.name(),
                field.name()
            ),
            format!("RETURN c AS {counted}_ignored"),
        ];

        blocks.push(call_block(&body.join("\n")));
    }

    if blocks.is_empty() {
        return Ok(None);
    }

    Ok(Some(format!("WITH *\n{}", blocks.join("\n"))))
}

/// Asserts that a single-cardinality relation field is not linked yet, to any of its concrete
/// targets, before a create or connect adds a relationship.
pub(crate) fn cardinality_guard(
    with_vars: &WithVars,
    parent: &NodeType,
    variable: &str,
    field: &RelationField,
    targets: &[&NodeType],
) -> String {
    let (left, right) = arrows(field.direction());

    format!(
        "WITH {with_vars}\n\
         CALL apoc.util.validate(EXISTS(({variable}){left}[:{}]{right}({})), \
         'Relationship field \"{}.{}\" cannot have more than one node linked', [0])",
        escape_name(field.relationship_type()),
        label_disjunction(targets),
        parent.name(),
        field.name(),
    )
}
