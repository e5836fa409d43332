//! Minimal CLI: schema → (cpp | schema | check)
use std::fmt::Display;
use std::io::Read;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, Args};
use colored::Colorize;

use nodegen::{Config, Schema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile a node schema into C++ AST declarations (variant + visitor + node classes)
#[derive(Parser, Debug)]
#[command(name = "nodegen", version)]
pub struct CommandLineInterface {
    /// print progress notes to stderr
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse the schema and emit the C++ header
    Cpp(CppOut),
    /// parse the schema and print it as JSON
    Schema(SchemaOut),
    /// parse the schema and report problems only
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// schema file, or '-' for stdin
    #[arg(long, short)]
    input: String,

    /// JSON config file; the flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// character between the node name and its field list
    #[arg(long)]
    separator: Option<char>,

    /// name of the tagged-union alias
    #[arg(long)]
    union_name: Option<String>,

    /// name of the visitor class template
    #[arg(long)]
    visitor_name: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct CppOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// enclosing namespace, e.g. `pierogi::ast` (empty for none)
    #[arg(long)]
    namespace: Option<String>,

    /// include guard macro (derived from the namespace if omitted)
    #[arg(long)]
    include_guard: Option<String>,

    /// extra header to include; repeatable, added after the config file's list
    #[arg(long = "include")]
    includes: Vec<String>,

    /// output .hpp file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Config file (or defaults) with the shared overrides applied; not yet validated.
    fn base_config(&self) -> Result<Config> {
        let mut config = match self.config.as_ref() {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        if let Some(name) = self.union_name.as_ref() {
            config.union_name = name.clone();
        }
        if let Some(name) = self.visitor_name.as_ref() {
            config.visitor_name = name.clone();
        }
        Ok(config)
    }

    fn read_source(&self) -> Result<String> {
        if self.input == "-" {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read schema from stdin")?;
            return Ok(source)
        }
        std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read schema file {}", self.input))
    }

    fn load_schema(&self, config: &Config, verbose: bool) -> Result<Schema> {
        let source = self.read_source()?;
        let schema = nodegen::parse_schema_with(&source, config)
            .with_context(|| format!("failed to parse {}", self.label()))?;
        note(verbose, format!("parsed {} node type(s) from {}", schema.len(), self.label()));
        Ok(schema)
    }

    fn label(&self) -> &str {
        if self.input == "-" { "<stdin>" } else { &self.input }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        let verbose = self.verbose;
        match &self.cmd {
            Command::Cpp(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }

                let mut config = target.input_settings.base_config()?;
                if let Some(namespace) = target.namespace.as_ref() {
                    config.namespace = namespace.clone();
                }
                if let Some(guard) = target.include_guard.as_ref() {
                    config.include_guard = Some(guard.clone());
                }
                config.includes.extend(target.includes.iter().cloned());
                config.validate().context("invalid configuration")?;

                let schema = target.input_settings.load_schema(&config, verbose)?;
                let header = nodegen::emit_declarations(&schema, &config);
                write_output(target.out.as_deref(), &header)?;
                if let Some(out) = target.out.as_ref() {
                    note(verbose, format!("wrote {}", out.display()));
                }
            }
            Command::Schema(target) => {
                let config = target.input_settings.base_config()?;
                config.validate().context("invalid configuration")?;
                let schema = target.input_settings.load_schema(&config, verbose)?;
                let mut json = serde_json::to_string_pretty(&schema)?;
                json.push('\n');
                write_output(target.out.as_deref(), &json)?;
            }
            Command::Check(target) => {
                let config = target.input_settings.base_config()?;
                config.validate().context("invalid configuration")?;
                let schema = target.input_settings.load_schema(&config, verbose)?;
                println!("{} {} ({} node types)", "ok:".green().bold(), target.input_settings.label(), schema.len());
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    let Some(out) = out else {
        print!("{text}");
        return Ok(())
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
}

fn note(verbose: bool, message: impl Display) {
    if verbose {
        eprintln!("{} {message}", "note:".dimmed());
    }
}
