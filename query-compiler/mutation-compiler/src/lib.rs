#![deny(unsafe_code, rust_2018_idioms)]

//! Compiles nested GraphQL mutation inputs into Cypher write statements.
//!
//! A mutation input is a tree: scalar keys (optionally suffixed with an operator such as
//! `_INCREMENT` or `_PUSH`) and relation keys carrying nested `create`, `connect`, `update`,
//! `delete`... operations. The compiler walks the tree against a [`graph_schema::Schema`] and
//! produces ordered Cypher fragments plus one flat parameter map. Authorization predicates,
//! `where` compilation and connect/disconnect statements come from pluggable collaborators.

mod authorization;
mod compiler;
mod conflicts;
mod connection;
mod context;
mod create;
mod cypher;
mod delete;
mod edge;
mod error;
mod filter;
mod input;
mod naming;
mod operators;
mod options;
mod params;
mod statements;
mod targets;
mod update;
mod validation;

pub use authorization::{
    AuthorizationClause, AuthorizationMeta, AuthorizationOperation, AuthorizationPredicate, AuthorizationRequest, AuthorizationTarget,
    Authorizer, NoAuthorization,
};
pub use compiler::{CompiledMutation, MutationCompiler};
pub use connection::{ConnectionRequest, ConnectionTranslator, CypherConnections};
pub use context::TranslationContext;
pub use cypher::WithVars;
pub use error::{MutationError, MutationResult};
pub use filter::{FilterError, PropertyWhereCompiler, WhereCompiler, WherePredicate, WhereRequest};
pub use naming::ParameterPrefix;
pub use options::CompilerOptions;
pub use params::Parameters;
pub use statements::{CallbackRegistration, Statements};
