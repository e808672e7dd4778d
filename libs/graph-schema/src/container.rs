use crate::{NodeType, RelationField, RelationshipType, ScalarField, WriteOperator, WritePhase};

/// The owner of a set of input keys: a node type or a relationship properties type.
#[derive(Debug, Clone, Copy)]
pub enum ParentContainer<'a> {
    Node(&'a NodeType),
    Relationship(&'a RelationshipType),
}

/// An input key resolved against a container.
#[derive(Debug, Clone, Copy)]
pub struct InputField<'a> {
    pub field: &'a ScalarField,
    pub operator: WriteOperator,
}

impl<'a> ParentContainer<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Node(node) => node.name(),
            Self::Relationship(rel) => rel.name(),
        }
    }

    pub fn scalar_fields(&self) -> &'a [ScalarField] {
        match self {
            Self::Node(node) => node.scalar_fields(),
            Self::Relationship(rel) => rel.scalar_fields(),
        }
    }

    pub fn find_relation_field(&self, key: &str) -> Option<&'a RelationField> {
        match self {
            Self::Node(node) => node.find_relation_field(key),
            Self::Relationship(_) => None,
        }
    }

    /// Resolves an input key to a mutable field and the operator it requests.
    /// An exact field name always wins over a suffix interpretation.
    pub fn resolve_input_key(&self, key: &str) -> Option<InputField<'a>> {
        let fields = self.scalar_fields();
        let find = |name: &str| fields.iter().find(|f| f.name() == name && f.is_mutable());

        if let Some(field) = find(key) {
            return Some(InputField {
                field,
                operator: WriteOperator::Set,
            });
        }

        let (name, operator) = WriteOperator::split_key(key)?;
        let field = find(name)?;

        operator.applies_to(field).then_some(InputField { field, operator })
    }

    /// The storage property an input key writes to, if any.
    pub fn map_to_db_property(&self, key: &str) -> Option<&'a str> {
        self.resolve_input_key(key).map(|input| input.field.db_name())
    }

    pub fn timestamped_fields(&self, phase: WritePhase) -> impl Iterator<Item = &'a ScalarField> + use<'a> {
        self.scalar_fields().iter().filter(move |f| f.has_timestamp(phase))
    }

    pub fn autogenerated_fields(&self) -> impl Iterator<Item = &'a ScalarField> + use<'a> {
        self.scalar_fields().iter().filter(|f| f.is_autogenerated())
    }

    pub fn callback_fields(&self, phase: WritePhase) -> impl Iterator<Item = &'a ScalarField> + use<'a> {
        self.scalar_fields()
            .iter()
            .filter(move |f| f.callback().is_some_and(|cb| cb.operations.contains(&phase)))
    }
}

impl<'a> From<&'a NodeType> for ParentContainer<'a> {
    fn from(node: &'a NodeType) -> Self {
        Self::Node(node)
    }
}

impl<'a> From<&'a RelationshipType> for ParentContainer<'a> {
    fn from(rel: &'a RelationshipType) -> Self {
        Self::Relationship(rel)
    }
}
