use serde::{Deserialize, Serialize};

/// Storage direction of a relationship, seen from the node declaring the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationDirection {
    In,
    Out,
}

/// The direction used when the relationship is traversed by read queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryDirection {
    #[default]
    DefaultDirected,
    DefaultUndirected,
    DirectedOnly,
    UndirectedOnly,
}

/// The declared destination of a relation field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationTarget {
    Node(String),
    Union { name: String, members: Vec<String> },
    Interface { name: String, implementations: Vec<String> },
}

impl RelationTarget {
    /// The name of the declared target type (node, union or interface name).
    pub fn name(&self) -> &str {
        match self {
            Self::Node(name) => name,
            Self::Union { name, .. } | Self::Interface { name, .. } => name,
        }
    }

    /// The names of all concrete node types the target may resolve to, in declared order.
    pub fn concrete_names(&self) -> &[String] {
        match self {
            Self::Node(name) => std::slice::from_ref(name),
            Self::Union { members, .. } => members,
            Self::Interface { implementations, .. } => implementations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationField {
    name: String,
    #[serde(rename = "type")]
    relationship_type: String,
    direction: RelationDirection,
    #[serde(default)]
    query_direction: QueryDirection,
    #[serde(default)]
    is_list: bool,
    #[serde(default)]
    is_required: bool,
    target: RelationTarget,
    #[serde(default)]
    properties: Option<String>,
    #[serde(default)]
    sibling_properties: Vec<String>,
}

impl RelationField {
    pub fn new(
        name: impl Into<String>,
        relationship_type: impl Into<String>,
        direction: RelationDirection,
        target: RelationTarget,
    ) -> Self {
        Self {
            name: name.into(),
            relationship_type: relationship_type.into(),
            direction,
            query_direction: QueryDirection::default(),
            is_list: false,
            is_required: false,
            target,
            properties: None,
            sibling_properties: Vec::new(),
        }
    }

    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The relationship type stored in the database, e.g. `ACTED_IN`.
    pub fn relationship_type(&self) -> &str {
        &self.relationship_type
    }

    pub fn direction(&self) -> RelationDirection {
        self.direction
    }

    pub fn query_direction(&self) -> QueryDirection {
        self.query_direction
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn target(&self) -> &RelationTarget {
        &self.target
    }

    pub fn is_union(&self) -> bool {
        matches!(self.target, RelationTarget::Union { .. })
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.target, RelationTarget::Interface { .. })
    }

    pub fn is_polymorphic(&self) -> bool {
        self.is_union() || self.is_interface()
    }

    /// The name of the relationship properties type, if the edge carries properties.
    pub fn properties(&self) -> Option<&str> {
        self.properties.as_deref()
    }

    /// Properties type names of the sibling relationships sharing this abstract field.
    pub fn sibling_properties(&self) -> &[String] {
        &self.sibling_properties
    }
}
