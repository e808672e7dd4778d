use crate::{MutationError, MutationResult, input::InputMap};
use graph_schema::ParentContainer;
use indexmap::IndexMap;

/// Rejects input where several keys write the same storage property, e.g. a legacy `email` next
/// to `email_SET`. Relation keys have no storage property and are skipped.
pub fn assert_no_conflicts(container: ParentContainer<'_>, input: &InputMap) -> MutationResult<()> {
    let mut by_property: IndexMap<&str, Vec<&str>> = IndexMap::new();

    for key in input.keys() {
        if container.find_relation_field(key).is_some() {
            continue;
        }

        if let Some(property) = container.map_to_db_property(key) {
            by_property.entry(property).or_default().push(key);
        }
    }

    let keys: Vec<String> = by_property
        .into_values()
        .filter(|keys| keys.len() > 1)
        .flatten()
        .map(str::to_owned)
        .collect();

    if keys.is_empty() {
        Ok(())
    } else {
        Err(MutationError::ConflictingProperties {
            keys,
            type_name: container.name().to_owned(),
        })
    }
}
