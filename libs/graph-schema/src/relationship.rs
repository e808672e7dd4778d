use crate::ScalarField;
use serde::{Deserialize, Serialize};

/// The properties carried by a relationship. Declared once and shared by
/// both endpoint types of the relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipType {
    name: String,
    #[serde(default)]
    fields: Vec<ScalarField>,
}

impl RelationshipType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ScalarField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scalar_fields(&self) -> &[ScalarField] {
        &self.fields
    }

    pub fn find_scalar_field(&self, name: &str) -> Option<&ScalarField> {
        self.fields.iter().find(|f| f.name() == name)
    }
}
