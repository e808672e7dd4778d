use crate::{NodeType, RelationField, RelationshipType, SchemaError, SchemaResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The resolved schema model: every node type and relationship properties type, keyed by name
/// in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDefinition", into = "SchemaDefinition")]
pub struct Schema {
    nodes: IndexMap<String, NodeType>,
    relationships: IndexMap<String, RelationshipType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SchemaDefinition {
    #[serde(default)]
    nodes: Vec<NodeType>,
    #[serde(default)]
    relationships: Vec<RelationshipType>,
}

impl TryFrom<SchemaDefinition> for Schema {
    type Error = SchemaError;

    fn try_from(definition: SchemaDefinition) -> SchemaResult<Self> {
        let mut schema = Schema::default();

        for node in definition.nodes {
            schema = schema.add_node(node)?;
        }

        for relationship in definition.relationships {
            schema = schema.add_relationship(relationship)?;
        }

        Ok(schema)
    }
}

impl From<Schema> for SchemaDefinition {
    fn from(schema: Schema) -> Self {
        Self {
            nodes: schema.nodes.into_values().collect(),
            relationships: schema.relationships.into_values().collect(),
        }
    }
}

impl Schema {
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;

        Ok(schema)
    }

    pub fn add_node(mut self, node: NodeType) -> SchemaResult<Self> {
        if self.nodes.contains_key(node.name()) {
            return Err(SchemaError::DuplicateType(node.name().to_owned()));
        }

        self.nodes.insert(node.name().to_owned(), node);
        Ok(self)
    }

    pub fn add_relationship(mut self, relationship: RelationshipType) -> SchemaResult<Self> {
        if self.relationships.contains_key(relationship.name()) {
            return Err(SchemaError::DuplicateType(relationship.name().to_owned()));
        }

        self.relationships
            .insert(relationship.name().to_owned(), relationship);
        Ok(self)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeType> {
        self.nodes.values()
    }

    pub fn find_node(&self, name: &str) -> Option<&NodeType> {
        self.nodes.get(name)
    }

    pub fn node(&self, name: &str) -> SchemaResult<&NodeType> {
        self.find_node(name)
            .ok_or_else(|| SchemaError::UnknownNodeType(name.to_owned()))
    }

    pub fn find_relationship(&self, name: &str) -> Option<&RelationshipType> {
        self.relationships.get(name)
    }

    /// The properties type of a relation field. Both directions of a relation share one
    /// properties declaration, so the lookup goes through the name, not the field.
    pub fn relationship_for(&self, field: &RelationField) -> SchemaResult<Option<&RelationshipType>> {
        field
            .properties()
            .map(|name| {
                self.find_relationship(name)
                    .ok_or_else(|| SchemaError::UnknownRelationshipType(name.to_owned()))
            })
            .transpose()
    }

    /// All concrete node types a relation field may point to, in declared order.
    pub fn concrete_targets(&self, field: &RelationField) -> SchemaResult<Vec<&NodeType>> {
        field
            .target()
            .concrete_names()
            .iter()
            .map(|name| self.node(name))
            .collect()
    }

    /// Checks that every relation target and properties reference resolves.
    pub fn validate(&self) -> SchemaResult<()> {
        for node in self.nodes.values() {
            for field in node.relation_fields() {
                for target in field.target().concrete_names() {
                    if !self.nodes.contains_key(target) {
                        return Err(SchemaError::UnknownRelationTarget {
                            type_name: node.name().to_owned(),
                            field_name: field.name().to_owned(),
                            target: target.clone(),
                        });
                    }
                }

                self.relationship_for(field)?;

                for sibling in field.sibling_properties() {
                    if !self.relationships.contains_key(sibling) {
                        return Err(SchemaError::UnknownRelationshipType(sibling.clone()));
                    }
                }
            }
        }

        Ok(())
    }
}
