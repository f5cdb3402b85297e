//! Minimal CLI: compile → (schema | check)

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::model::ModelDef;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile an epJSON-style schema into a typed model, then export it or
/// check instance documents against it
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile and print the model as a schema-shaped document
    Schema(SchemaOut),
    /// compile, then validate instance documents against the model
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// path to the schema document
    #[arg(long, short)]
    schema: PathBuf,

    /// top-level model name
    #[arg(long, default_value = "Root")]
    root_name: String,
}

#[derive(Args, Debug)]
struct SchemaOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// one or more instance documents; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn compile(&self) -> Result<ModelDef> {
        let schema = crate::load::read_schema(&self.schema)?;
        crate::compile::compile(&schema, &self.root_name)
            .with_context(|| format!("failed to compile schema {}", self.schema.display()))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let model = target.schema_settings.compile()?;
                let exported = crate::export::export(&model);
                let source = serde_json::to_string_pretty(&exported)?;
                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent).with_context(|| {
                                format!("failed to create {}", parent.display())
                            })?;
                        }
                        std::fs::write(out, &source)
                            .with_context(|| format!("failed to write {}", out.display()))?;
                    }
                    None => println!("{source}"),
                }
                Ok(())
            }
            Command::Check(target) => {
                let model = target.schema_settings.compile()?;
                let paths = crate::load::resolve_file_path_patterns(&target.input)?;

                let mut failed = 0usize;
                for path in &paths {
                    let instance = crate::load::read_instance(path)?;
                    match crate::decode::validate(&model, &instance) {
                        Ok(()) => {
                            eprintln!("{} {}", "✓".green(), path.display());
                        }
                        Err(error) => {
                            failed += 1;
                            eprintln!("{} {}: {error}", "✗".red(), path.display());
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} documents failed validation", paths.len());
                }
                Ok(())
            }
        }
    }
}
