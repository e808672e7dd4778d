//! The schema model consumed by the mutation compiler: node types, relationship properties
//! types, scalar and relation fields, and the mapping of operator-suffixed input keys to storage
//! properties.

mod container;
mod error;
mod field;
mod node;
mod relation_field;
mod relationship;
mod schema;
mod write_operator;

pub use container::{InputField, ParentContainer};
pub use error::{SchemaError, SchemaResult};
pub use field::{FieldCallback, ScalarField, TypeIdentifier, WritePhase};
pub use node::NodeType;
pub use relation_field::{QueryDirection, RelationDirection, RelationField, RelationTarget};
pub use relationship::RelationshipType;
pub use schema::Schema;
pub use write_operator::WriteOperator;
