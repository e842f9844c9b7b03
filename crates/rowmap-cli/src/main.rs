//! # rowmap-cli
//!
//! Command-line interface for the rowmap engine: run a mapping schema over
//! a CSV or JSON file, print the built-in schemas, and check schema files
//! for unknown function names.

mod commands;
mod config;
mod input;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use rowmap_schema::{SourceType, TargetType};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::input::InputFormat;

#[derive(Parser)]
#[command(name = "rowmap")]
#[command(about = "Declarative record mapping engine")]
#[command(version)]
struct Cli {
    /// YAML file with default transform options and log level
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a schema over an input file
    Transform {
        /// Input rows (.csv or .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format, when the extension does not tell
        #[arg(long, value_enum)]
        format: Option<InputFormat>,

        /// Schema file (.yaml, .yml or .json)
        #[arg(short, long, required_unless_present = "builtin", conflicts_with = "builtin")]
        schema: Option<PathBuf>,

        /// Built-in schema id, e.g. user-csv
        #[arg(short, long)]
        builtin: Option<String>,

        /// Keep going after a row fails to transform
        #[arg(long)]
        skip_errors: bool,

        /// Stop after this many errors
        #[arg(long)]
        max_errors: Option<usize>,

        /// Validate without emitting records
        #[arg(long)]
        validate_only: bool,

        /// Refuse to run a schema that references unknown functions
        #[arg(long)]
        fail_fast: bool,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a built-in schema as YAML
    Schema {
        #[arg(long, value_parser = parse_name::<TargetType>)]
        target: TargetType,

        #[arg(long, value_parser = parse_name::<SourceType>)]
        source: SourceType,
    },

    /// List function names a schema file uses but the engine does not know
    Check {
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// List built-in schema ids
    List,
}

/// Parse a kebab/snake-case enum name the way schema files spell it
fn parse_name<T: DeserializeOwned>(name: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(name.to_ascii_lowercase()))
        .map_err(|_| format!("unknown name '{name}'"))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init(&logging::level_for(cli.verbose, config.log_level.as_deref()))?;

    match cli.command {
        Commands::Transform {
            input,
            format,
            schema,
            builtin,
            skip_errors,
            max_errors,
            validate_only,
            fail_fast,
            output,
        } => {
            let mut options = config.options;
            options.skip_errors |= skip_errors;
            options.validate_only |= validate_only;
            options.fail_fast |= fail_fast;
            if max_errors.is_some() {
                options.max_errors = max_errors;
            }

            let source = match (schema, builtin) {
                (Some(path), _) => commands::SchemaSource::File(path),
                (None, Some(id)) => commands::SchemaSource::Builtin(id),
                (None, None) => anyhow::bail!("either --schema or --builtin is required"),
            };
            commands::transform(&input, format, &source, &options, output.as_deref())
        }
        Commands::Schema { target, source } => commands::print_schema(target, source),
        Commands::Check { schema } => commands::check(&schema),
        Commands::List => commands::list(),
    }
}
