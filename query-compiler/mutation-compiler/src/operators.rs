use crate::{
    MutationError, MutationResult, Statements,
    context::TranslationContext,
    cypher::{escape_name, param_ref, property},
    input::InputMap,
    naming::ParameterPrefix,
    statements::CallbackRegistration,
};
use graph_schema::{ParentContainer, ScalarField, WriteOperator, WritePhase};
use serde_json::Value;

const GENERATED_ID: &str = "randomUUID()";

/// The node or relationship whose scalar properties are being written.
#[derive(Debug, Clone, Copy)]
pub struct WriteScope<'a> {
    pub container: ParentContainer<'a>,
    pub variable: &'a str,
    pub prefix: &'a ParameterPrefix,
    pub phase: WritePhase,
}

impl WriteScope<'_> {
    /// Compiles one scalar input key into an assignment and binds its value.
    pub fn scalar(&self, key: &str, field: &ScalarField, operator: WriteOperator, value: &Value) -> MutationResult<Statements> {
        self.assert_nullable(field, value)?;

        if self.phase == WritePhase::Create && operator != WriteOperator::Set {
            return Err(MutationError::InvalidOperator {
                type_name: self.container.name().to_owned(),
                field: field.name().to_owned(),
                operator,
            });
        }

        let param = self.prefix.leaf(key);
        let mut statements = Statements::new();

        statements.push(assignment(field, operator, self.variable, &param));
        statements.param(param, value.clone())?;

        Ok(statements)
    }

    fn assert_nullable(&self, field: &ScalarField, value: &Value) -> MutationResult<()> {
        if field.is_required() && value.is_null() {
            return Err(MutationError::RequiredFieldNull {
                type_name: self.container.name().to_owned(),
                field: field.name().to_owned(),
            });
        }

        Ok(())
    }

    /// Generated ids and timestamps for the phase. On create, values supplied by the input win; on
    /// update, timestamps are always refreshed.
    pub fn autogenerated(&self, input: &InputMap) -> Vec<String> {
        let supplied = |field: &ScalarField| {
            input
                .keys()
                .filter_map(|key| self.container.resolve_input_key(key))
                .any(|resolved| resolved.field.name() == field.name())
        };

        self.container
            .scalar_fields()
            .iter()
            .filter_map(|field| {
                let target = property(self.variable, field.db_name());

                match self.phase {
                    WritePhase::Create if field.is_autogenerated() => Some(format!("SET {target} = {GENERATED_ID}")),
                    WritePhase::Create if supplied(field) => None,
                    phase if field.has_timestamp(phase) => field
                        .type_identifier()
                        .now_function()
                        .map(|now| format!("SET {target} = {now}")),
                    _ => None,
                }
            })
            .collect()
    }

    /// Assigns callback-produced values and registers the callbacks that have to be resolved.
    pub fn callbacks(&self, ctx: &TranslationContext<'_>) -> Statements {
        let mut statements = Statements::new();

        for field in self.container.callback_fields(self.phase) {
            let Some(callback) = field.callback() else {
                continue;
            };

            let param_name = format!("{}_{}_{}", self.variable, field.name(), callback.name);

            statements.push(format!(
                "SET {} = {}.{}",
                property(self.variable, field.db_name()),
                param_ref(&ctx.options.resolved_callbacks_param),
                escape_name(&param_name),
            ));

            statements.register_callback(CallbackRegistration {
                param_name,
                callback_name: callback.name.clone(),
                type_name: self.container.name().to_owned(),
                field_name: field.name().to_owned(),
            });
        }

        statements
    }
}

/// `SET v.prop = <value>` for one operator.
pub fn assignment(field: &ScalarField, operator: WriteOperator, variable: &str, param: &str) -> String {
    let target = property(variable, field.db_name());
    let param = param_ref(param);

    let value = match operator {
        WriteOperator::Set => spatial_value(field, &param),
        WriteOperator::Push => format!("{target} + {}", spatial_value(field, &param)),
        WriteOperator::Pop => format!("{target}[0..-{param}]"),
        arithmetic => match arithmetic.arithmetic_symbol() {
            Some(symbol) => format!("{target} {symbol} {param}"),
            None => param,
        },
    };

    format!("SET {target} = {value}")
}

fn spatial_value(field: &ScalarField, param: &str) -> String {
    match (field.is_spatial(), field.is_list()) {
        (false, _) => param.to_owned(),
        (true, false) => format!("point({param})"),
        (true, true) => format!("[p in {param} | point(p)]"),
    }
}
