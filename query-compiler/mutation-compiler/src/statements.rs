use crate::{MutationResult, Parameters, authorization::AuthorizationMeta};
use serde::Serialize;
use serde_json::Value;

/// A value that has to be produced outside of the compiler and passed back in under the resolved
/// callbacks parameter before the query runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRegistration {
    /// Key under the resolved callbacks parameter.
    pub param_name: String,
    pub callback_name: String,
    pub type_name: String,
    pub field_name: String,
}

/// The accumulated output of one translator call: ordered fragments plus everything bound while
/// producing them. Children are merged into their parent on return.
#[derive(Debug, Default)]
pub struct Statements {
    fragments: Vec<String>,
    params: Parameters,
    authorization: AuthorizationMeta,
    callbacks: Vec<CallbackRegistration>,
}

impl Statements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();

        if !fragment.is_empty() {
            self.fragments.push(fragment);
        }
    }

    pub fn param(&mut self, name: impl Into<String>, value: Value) -> MutationResult<()> {
        self.params.insert(name, value)
    }

    pub fn extend_params(&mut self, params: Parameters) -> MutationResult<()> {
        self.params.extend(params)
    }

    pub fn register_callback(&mut self, callback: CallbackRegistration) {
        if !self.callbacks.contains(&callback) {
            self.callbacks.push(callback);
        }
    }

    pub fn authorization_mut(&mut self) -> &mut AuthorizationMeta {
        &mut self.authorization
    }

    /// Appends the fragments of a child call and merges its bindings.
    pub fn absorb(&mut self, child: Statements) -> MutationResult<()> {
        let text = self.absorb_bindings(child)?;
        self.fragments.extend(text);
        Ok(())
    }

    /// Merges the bindings of a child call and hands back its fragments, for callers that wrap them
    /// into a block of their own.
    pub fn absorb_bindings(&mut self, child: Statements) -> MutationResult<Vec<String>> {
        let Statements {
            fragments,
            params,
            authorization,
            callbacks,
        } = child;

        self.params.extend(params)?;
        self.authorization.absorb(authorization);
        callbacks.into_iter().for_each(|cb| self.register_callback(cb));

        Ok(fragments)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn cypher(&self) -> String {
        self.fragments.join("\n")
    }

    pub fn into_parts(self) -> (Vec<String>, Parameters, AuthorizationMeta, Vec<CallbackRegistration>) {
        (self.fragments, self.params, self.authorization, self.callbacks)
    }
}
