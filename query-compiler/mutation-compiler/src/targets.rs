use crate::{MutationError, MutationResult, input::as_object, naming::ParameterPrefix};
use graph_schema::{NodeType, RelationField, RelationTarget, Schema};
use serde_json::Value;

/// One concrete type a relation-field input has to be compiled against.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTarget<'a> {
    pub node: &'a NodeType,
    pub input: &'a Value,
    /// The concrete type name for union and interface fields, used in variable and parameter names.
    pub qualifier: Option<&'a str>,
}

/// Expands a relation field's input into its concrete targets, in declared order.
///
/// Union input is an object namespaced by member name; only members present in the input are
/// visited. Interface input is shared by every implementation. `path` is the input position of the
/// field, for error reporting.
pub fn resolve_targets<'a>(
    schema: &'a Schema,
    field: &'a RelationField,
    value: &'a Value,
    path: &ParameterPrefix,
) -> MutationResult<Vec<ResolvedTarget<'a>>> {
    match field.target() {
        RelationTarget::Node(name) => Ok(vec![ResolvedTarget {
            node: schema.node(name)?,
            input: value,
            qualifier: None,
        }]),

        RelationTarget::Union { name, members } => {
            let map = as_object(value, path)?;

            if let Some(unknown) = map.keys().find(|key| !members.contains(*key)) {
                return Err(MutationError::UnknownUnionMember {
                    union: name.clone(),
                    member: unknown.clone(),
                });
            }

            members
                .iter()
                .filter_map(|member| map.get(member).map(|input| (member, input)))
                .filter(|(_, input)| !input.is_null())
                .map(|(member, input)| -> MutationResult<_> {
                    Ok(ResolvedTarget {
                        node: schema.node(member)?,
                        input,
                        qualifier: Some(member.as_str()),
                    })
                })
                .collect()
        }

        RelationTarget::Interface { implementations, .. } => implementations
            .iter()
            .map(|implementation| -> MutationResult<_> {
                Ok(ResolvedTarget {
                    node: schema.node(implementation)?,
                    input: value,
                    qualifier: Some(implementation.as_str()),
                })
            })
            .collect(),
    }
}
