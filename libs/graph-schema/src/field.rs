use serde::{Deserialize, Serialize};

/// The storage type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeIdentifier {
    #[serde(rename = "ID")]
    Id,
    String,
    Int,
    BigInt,
    Float,
    Boolean,
    DateTime,
    LocalDateTime,
    Date,
    Time,
    LocalTime,
    Duration,
    Point,
    CartesianPoint,
    Enum,
}

impl TypeIdentifier {
    pub fn is_spatial(self) -> bool {
        matches!(self, Self::Point | Self::CartesianPoint)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int | Self::BigInt)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float)
    }

    /// The Cypher function producing the current instant for temporal types.
    pub fn now_function(self) -> Option<&'static str> {
        match self {
            Self::DateTime => Some("datetime()"),
            Self::LocalDateTime => Some("localdatetime()"),
            Self::Date => Some("date()"),
            Self::Time => Some("time()"),
            Self::LocalTime => Some("localtime()"),
            _ => None,
        }
    }
}

/// The write phase a generated value or a callback is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WritePhase {
    Create,
    Update,
}

impl std::fmt::Display for WritePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => f.write_str("CREATE"),
            Self::Update => f.write_str("UPDATE"),
        }
    }
}

/// A deferred value resolved outside of the compiler, e.g. a server-side slug generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCallback {
    pub name: String,
    pub operations: Vec<WritePhase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarField {
    name: String,
    #[serde(default)]
    db_name: Option<String>,
    #[serde(rename = "type")]
    type_identifier: TypeIdentifier,
    #[serde(default)]
    is_list: bool,
    #[serde(default)]
    is_required: bool,
    #[serde(default)]
    autogenerate: bool,
    #[serde(default)]
    timestamps: Vec<WritePhase>,
    #[serde(default)]
    callback: Option<FieldCallback>,
    #[serde(default)]
    read_only: bool,
}

impl ScalarField {
    pub fn new(name: impl Into<String>, type_identifier: TypeIdentifier) -> Self {
        Self {
            name: name.into(),
            db_name: None,
            type_identifier,
            is_list: false,
            is_required: false,
            autogenerate: false,
            timestamps: Vec::new(),
            callback: None,
            read_only: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn mapped_to(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the property in the database.
    pub fn db_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }

    pub fn type_identifier(&self) -> TypeIdentifier {
        self.type_identifier
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn is_spatial(&self) -> bool {
        self.type_identifier.is_spatial()
    }

    pub fn is_autogenerated(&self) -> bool {
        self.autogenerate
    }

    pub fn callback(&self) -> Option<&FieldCallback> {
        self.callback.as_ref()
    }

    pub fn has_timestamp(&self, phase: WritePhase) -> bool {
        self.type_identifier.now_function().is_some() && self.timestamps.contains(&phase)
    }

    /// Whether the field can be written through mutation input.
    pub fn is_mutable(&self) -> bool {
        !self.autogenerate && !self.read_only && self.callback.is_none()
    }
}
