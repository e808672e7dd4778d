use crate::{RelationField, ScalarField};
use serde::{Deserialize, Serialize};

/// A graph entity type with a label set and a field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeType {
    name: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    fields: Vec<ScalarField>,
    #[serde(default)]
    relation_fields: Vec<RelationField>,
}

impl NodeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            fields: Vec::new(),
            relation_fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ScalarField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, field: RelationField) -> Self {
        self.relation_fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The labels written on `CREATE`. Defaults to the type name.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        let declared = self.labels.iter().map(String::as_str);
        let fallback = self.labels.is_empty().then_some(self.name.as_str());

        fallback.into_iter().chain(declared)
    }

    pub fn scalar_fields(&self) -> &[ScalarField] {
        &self.fields
    }

    pub fn relation_fields(&self) -> &[RelationField] {
        &self.relation_fields
    }

    pub fn find_scalar_field(&self, name: &str) -> Option<&ScalarField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn find_relation_field(&self, name: &str) -> Option<&RelationField> {
        self.relation_fields.iter().find(|rf| rf.name() == name)
    }

    pub fn mutable_fields(&self) -> impl Iterator<Item = &ScalarField> {
        self.fields.iter().filter(|f| f.is_mutable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParentContainer, TypeIdentifier, WritePhase};

    #[test]
    fn labels_default_to_type_name() {
        let node = NodeType::new("Movie");
        let labeled: NodeType =
            serde_json::from_str(r#"{ "name": "Movie", "labels": ["Film", "Media"] }"#).unwrap();

        assert_eq!(node.labels().collect::<Vec<_>>(), vec!["Movie"]);
        assert_eq!(labeled.labels().collect::<Vec<_>>(), vec!["Film", "Media"]);
    }

    #[test]
    fn mutable_fields_skip_generated_ones() {
        let node: NodeType = serde_json::from_str(
            r#"{
                "name": "Movie",
                "fields": [
                    { "name": "id", "type": "ID", "autogenerate": true },
                    { "name": "title", "type": "String" },
                    { "name": "createdAt", "type": "DateTime", "timestamps": ["CREATE"], "readOnly": true }
                ]
            }"#,
        )
        .unwrap();

        let names: Vec<_> = node.mutable_fields().map(|f| f.name()).collect();
        assert_eq!(names, vec!["title"]);

        let container = ParentContainer::from(&node);
        let created: Vec<_> = container.timestamped_fields(WritePhase::Create).map(|f| f.name()).collect();
        assert_eq!(created, vec!["createdAt"]);
        assert_eq!(container.autogenerated_fields().count(), 1);
        assert_eq!(
            node.find_scalar_field("title").map(|f| f.type_identifier()),
            Some(TypeIdentifier::String)
        );
    }
}
