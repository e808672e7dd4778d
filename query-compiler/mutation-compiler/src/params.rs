use crate::{MutationError, MutationResult};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// The flat, insertion-ordered parameter map of a compiled mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters(IndexMap<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value. Re-binding a name to an identical value is a no-op, binding it to a different
    /// value is an error.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> MutationResult<()> {
        let name = name.into();

        match self.0.get(&name) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(MutationError::ParameterCollision { name }),
            None => {
                self.0.insert(name, value);
                Ok(())
            }
        }
    }

    pub fn extend(&mut self, other: Parameters) -> MutationResult<()> {
        other.0.into_iter().try_for_each(|(name, value)| self.insert(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}
