//! Subcommand implementations

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use rowmap_pipeline::{TransformEngine, TransformOptions};
use rowmap_schema::factories::schema_for;
use rowmap_schema::{DataMappingSchema, SchemaLoader, SchemaRegistry, SourceType, TargetType};
use rowmap_validation::ValidationReporter;
use tracing::info;

use crate::input::{InputFormat, read_rows};

/// Where `transform` takes its schema from
pub enum SchemaSource {
    File(PathBuf),
    Builtin(String),
}

impl SchemaSource {
    fn resolve(&self) -> anyhow::Result<DataMappingSchema> {
        match self {
            Self::File(path) => load_schema(path),
            Self::Builtin(id) => {
                let registry = SchemaRegistry::with_builtins()?;
                registry.get(id).ok_or_else(|| {
                    anyhow!(
                        "no built-in schema '{id}'; available: {}",
                        registry.ids().join(", ")
                    )
                })
            }
        }
    }
}

fn load_schema(path: &Path) -> anyhow::Result<DataMappingSchema> {
    SchemaLoader::default()
        .load_file(path)
        .with_context(|| format!("failed to load schema '{}'", path.display()))
}

pub fn transform(
    input: &Path,
    format: Option<InputFormat>,
    schema: &SchemaSource,
    options: &TransformOptions,
    output: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let schema = schema.resolve()?;
    let rows = read_rows(input, format)?;
    info!("Applying schema '{}' to {}", schema.id, input.display());

    let result = TransformEngine::new().transform_data(&rows, &schema, options);
    let json = serde_json::to_string_pretty(&result)?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    let meta = &result.metadata;
    eprintln!(
        "{} of {} row(s) transformed, {} skipped in {} ms",
        meta.transformed_records, meta.total_records, meta.skipped_records, meta.duration_ms
    );
    if !result.errors.is_empty() || !result.warnings.is_empty() {
        eprint!(
            "{}",
            ValidationReporter::new().render(&result.errors, &result.warnings)
        );
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn print_schema(target: TargetType, source: SourceType) -> anyhow::Result<ExitCode> {
    let schema = schema_for(source, target)?;
    print!("{}", serde_yaml::to_string(&schema)?);
    Ok(ExitCode::SUCCESS)
}

pub fn check(path: &Path) -> anyhow::Result<ExitCode> {
    let schema = load_schema(path)?;
    let unknown = TransformEngine::new().check_schema(&schema);
    if unknown.is_empty() {
        println!("{}: ok", schema.id);
        return Ok(ExitCode::SUCCESS);
    }

    for (kind, name) in &unknown {
        println!("unknown {kind} function '{name}'");
    }
    Ok(ExitCode::FAILURE)
}

pub fn list() -> anyhow::Result<ExitCode> {
    for id in SchemaRegistry::with_builtins()?.ids() {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}
