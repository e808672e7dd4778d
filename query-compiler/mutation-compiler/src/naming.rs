//! Variable and parameter naming. Parameter prefixes mirror the position of a value in the
//! mutation input, so two distinct input leaves never share a parameter name.

use std::fmt;

const SEGMENT_SEPARATOR: char = '.';
const RELATIONSHIP_SUFFIX: &str = "_relationship";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterPrefix(String);

impl ParameterPrefix {
    /// `this.update`
    pub fn root(variable: &str, phase: &str) -> Self {
        Self(format!("{variable}{SEGMENT_SEPARATOR}{phase}"))
    }

    /// Appends a literal path segment, e.g. a field key or a phase (`delete`, `where`, ...).
    pub fn segment(&self, segment: &str) -> Self {
        Self(format!("{}{SEGMENT_SEPARATOR}{segment}", self.0))
    }

    /// Appends the concrete type name of a polymorphic branch.
    pub fn qualified(&self, qualifier: Option<&str>) -> Self {
        match qualifier {
            Some(qualifier) => self.segment(qualifier),
            None => self.clone(),
        }
    }

    /// Appends an array position.
    pub fn indexed(&self, index: Option<usize>) -> Self {
        match index {
            Some(index) => Self(format!("{}[{index}]", self.0)),
            None => self.clone(),
        }
    }

    /// The parameter name of an input leaf under this prefix.
    pub fn leaf(&self, key: &str) -> String {
        format!("{}{SEGMENT_SEPARATOR}{key}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParameterPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `this_actors` or `this_pets_Dog`, before the position index is appended.
pub fn nested_base(base: &str, key: &str, qualifier: Option<&str>) -> String {
    match qualifier {
        Some(qualifier) => format!("{base}_{key}_{qualifier}"),
        None => format!("{base}_{key}"),
    }
}

/// `this_actors0`
pub fn nested_variable(base: &str, key: &str, qualifier: Option<&str>, index: usize) -> String {
    format!("{}{index}", nested_base(base, key, qualifier))
}

pub fn relationship_variable(variable: &str) -> String {
    format!("{variable}{RELATIONSHIP_SUFFIX}")
}

/// Index appended to a prefix only when the input value at that position was a list.
pub fn list_index(is_list: bool, index: usize) -> Option<usize> {
    is_list.then_some(index)
}
