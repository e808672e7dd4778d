use crate::{
    Authorizer, CompilerOptions, ConnectionTranslator, CypherConnections, MutationResult, NoAuthorization, Parameters,
    PropertyWhereCompiler, Statements, WhereCompiler,
    authorization::{AuthorizationOperation, AuthorizationTarget, Timing, authorize, gate},
    context::TranslationContext,
    create::{CreateRequest, create_node},
    cypher::WithVars,
    delete::{DeleteScope, delete_related},
    input::as_object,
    naming::ParameterPrefix,
    statements::CallbackRegistration,
    update::{UpdateRequest, update_node},
};
use graph_schema::Schema;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Compiles nested mutation inputs into Cypher write fragments and their parameters.
///
/// The read side of a mutation (matching the root of an update or delete, projecting the result)
/// belongs to the caller: `update` and `delete` expect the root variable to be bound already.
pub struct MutationCompiler<'a> {
    schema: &'a Schema,
    options: CompilerOptions,
    authorizer: &'a dyn Authorizer,
    filters: &'a dyn WhereCompiler,
    connections: &'a dyn ConnectionTranslator,
}

impl<'a> MutationCompiler<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            options: CompilerOptions::default(),
            authorizer: &NoAuthorization,
            filters: &PropertyWhereCompiler,
            connections: &CypherConnections,
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_authorizer(mut self, authorizer: &'a dyn Authorizer) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_filters(mut self, filters: &'a dyn WhereCompiler) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_connections(mut self, connections: &'a dyn ConnectionTranslator) -> Self {
        self.connections = connections;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    fn context(&self) -> TranslationContext<'_> {
        TranslationContext {
            schema: self.schema,
            options: &self.options,
            authorizer: self.authorizer,
            filters: self.filters,
            connections: self.connections,
        }
    }

    /// Creates one node of `type_name` with everything nested in `input`.
    pub fn create(&self, type_name: &str, input: &Value) -> MutationResult<CompiledMutation> {
        self.create_many(type_name, std::slice::from_ref(input))
    }

    /// Creates one node per input. A single input binds the root variable itself; several inputs
    /// bind `{root}0`, `{root}1`, ...
    #[tracing::instrument(skip_all, fields(type_name = type_name, inputs = inputs.len()))]
    pub fn create_many(&self, type_name: &str, inputs: &[Value]) -> MutationResult<CompiledMutation> {
        let ctx = self.context();
        let node = self.schema.node(type_name)?;
        let root = &self.options.root_variable;

        let mut statements = Statements::new();
        let mut with_vars: Option<WithVars> = None;

        for (index, input) in inputs.iter().enumerate() {
            let variable = match inputs {
                [_] => root.clone(),
                _ => format!("{root}{index}"),
            };
            let prefix = ParameterPrefix::root(&variable, "create");
            let input = as_object(input, &prefix)?;

            let scope = match &with_vars {
                Some(vars) => vars.with(variable.as_str()),
                None => WithVars::new(variable.as_str()),
            };

            let mut created = create_node(
                &ctx,
                &CreateRequest {
                    node,
                    input,
                    variable: &variable,
                    with_vars: &scope,
                    prefix: &prefix,
                    validate_relationships: true,
                },
            )?;

            let after = created.authorization_mut().take_after();
            statements.absorb(created)?;

            if let Some(gate) = gate(&scope, &after) {
                statements.push(gate);
            }

            with_vars = Some(scope);
        }

        Ok(CompiledMutation::from_statements(statements))
    }

    /// Updates the node bound to the root variable.
    #[tracing::instrument(skip_all, fields(type_name = type_name))]
    pub fn update(&self, type_name: &str, input: &Value) -> MutationResult<CompiledMutation> {
        let ctx = self.context();
        let node = self.schema.node(type_name)?;
        let root = self.options.root_variable.as_str();
        let prefix = ParameterPrefix::root(root, "update");

        let statements = update_node(
            &ctx,
            &UpdateRequest {
                node,
                input: as_object(input, &prefix)?,
                variable: root,
                with_vars: &WithVars::new(root),
                prefix: &prefix,
                validate_relationships: true,
                authorize_node: true,
            },
        )?;

        Ok(CompiledMutation::from_statements(statements))
    }

    /// Deletes the related nodes named in `input`, then the node bound to the root variable.
    #[tracing::instrument(skip_all, fields(type_name = type_name))]
    pub fn delete(&self, type_name: &str, input: &Value) -> MutationResult<CompiledMutation> {
        let ctx = self.context();
        let node = self.schema.node(type_name)?;
        let root = self.options.root_variable.as_str();
        let prefix = ParameterPrefix::root(root, "delete");
        let with_vars = WithVars::new(root);

        let mut statements = Statements::new();

        let auth = authorize(
            &ctx,
            Timing::Before,
            &[AuthorizationTarget::node(node, root)],
            &[AuthorizationOperation::Delete],
            &prefix,
            &mut statements,
        )?;

        let scope = DeleteScope {
            node,
            variable: root,
            with_vars: &with_vars,
            prefix: &prefix,
        };

        if !input.is_null() {
            statements.absorb(delete_related(&ctx, &scope, as_object(input, &prefix)?)?)?;
        }

        if let Some(gate) = gate(&with_vars, auth.as_slice()) {
            statements.push(gate);
        }

        statements.push(format!("DETACH DELETE {root}"));

        Ok(CompiledMutation::from_statements(statements))
    }
}

/// The write part of a mutation: Cypher fragments in execution order, the parameters they
/// reference and the callbacks whose results have to be supplied at execution time.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledMutation {
    pub fragments: Vec<String>,
    pub params: Parameters,
    pub callbacks: Vec<CallbackRegistration>,
}

impl CompiledMutation {
    fn from_statements(statements: Statements) -> Self {
        let (fragments, params, _, callbacks) = statements.into_parts();

        debug!(fragments = fragments.len(), params = params.len(), "compiled mutation");

        Self {
            fragments,
            params,
            callbacks,
        }
    }

    pub fn cypher(&self) -> String {
        self.fragments.join("\n")
    }
}
