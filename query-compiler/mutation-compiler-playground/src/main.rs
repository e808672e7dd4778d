use std::fs;

use anyhow::Context;
use graph_schema::Schema;
use mutation_compiler::{CompilerOptions, MutationCompiler};
use serde::Deserialize;
use serde_json::Value;

/// `{ options?, schema, mutation: { operation, type, input } }`
#[derive(Deserialize)]
struct Fixture {
    #[serde(default)]
    options: CompilerOptions,
    schema: Schema,
    mutation: Mutation,
}

#[derive(Deserialize)]
struct Mutation {
    operation: Operation,
    #[serde(rename = "type")]
    type_name: String,
    input: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum Operation {
    Create,
    CreateMany,
    Update,
    Delete,
}

pub fn main() -> anyhow::Result<()> {
    init_logger();

    let fixture = match std::env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("failed to read fixture `{path}`"))?,
        None => include_str!("./fixture.json").to_owned(),
    };

    let fixture: Fixture = serde_json::from_str(&fixture).context("invalid fixture")?;
    fixture.schema.validate()?;

    let compiler = MutationCompiler::new(&fixture.schema).with_options(fixture.options);
    let Mutation {
        operation,
        type_name,
        input,
    } = &fixture.mutation;

    let compiled = match operation {
        Operation::Create => compiler.create(type_name, input)?,
        Operation::CreateMany => {
            let Value::Array(inputs) = input else {
                anyhow::bail!("createMany expects a list of inputs");
            };
            compiler.create_many(type_name, inputs)?
        }
        Operation::Update => compiler.update(type_name, input)?,
        Operation::Delete => compiler.delete(type_name, input)?,
    };

    println!("{}", compiled.cypher());
    println!();
    println!("{}", serde_json::to_string_pretty(&compiled.params)?);

    if !compiled.callbacks.is_empty() {
        println!();
        println!("{}", serde_json::to_string_pretty(&compiled.callbacks)?);
    }

    Ok(())
}

fn init_logger() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| eprintln!("Error initializing the global logger: {err}"))
        .ok();
}
