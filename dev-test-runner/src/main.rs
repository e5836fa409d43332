//! Fixture runner: every `<dir>/*.nodes` schema goes through nodegen and is
//! compared against its blessed result.
//!
//! - `<stem>.json` (optional) is the generator config for that fixture
//! - `<stem>.hpp` is the expected header for a valid schema
//! - `<stem>.err` holds the expected error code for an invalid one
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;

use nodegen::{Config, emit_declarations, parse_schema_with};

#[derive(Parser, Debug)]
struct Cli {
    /// fixture directory
    #[arg(default_value = "fixtures")]
    dir: PathBuf,

    /// write current output as the expected result
    #[arg(long)]
    bless: bool,

    /// print a JSON report instead of colored lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum Status { Pass, Fail, Blessed }

#[derive(Debug, Serialize)]
struct Outcome {
    fixture: String,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let pattern = cli.dir.join("*.nodes");
    let pattern = pattern.to_string_lossy();

    let mut outcomes = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        outcomes.push(run_fixture(&path, cli.bless)?);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            let tag = match outcome.status {
                Status::Pass => "pass".green(),
                Status::Blessed => "bless".yellow(),
                Status::Fail => "FAIL".red().bold(),
            };
            match outcome.detail.as_ref() {
                Some(detail) => eprintln!("{tag} {}: {detail}", outcome.fixture),
                None => eprintln!("{tag} {}", outcome.fixture),
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.status == Status::Fail).count();
    if failed > 0 {
        eprintln!("{failed} of {} fixture(s) failed", outcomes.len());
        std::process::exit(1);
    }
    Ok(())
}

fn run_fixture(path: &Path, bless: bool) -> Result<Outcome> {
    let fixture = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let config_path = path.with_extension("json");
    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    let (actual, expected_path) = match parse_schema_with(&source, &config) {
        Ok(schema) => {
            let header = emit_declarations(&schema, &config);
            if header != emit_declarations(&schema, &config) {
                return Ok(Outcome { fixture, status: Status::Fail, detail: Some("non-deterministic output".into()) })
            }
            (header, path.with_extension("hpp"))
        }
        Err(error) => (format!("{}\n", error.kind.code()), path.with_extension("err")),
    };

    let expected = std::fs::read_to_string(&expected_path).ok();
    let (status, detail) = match expected {
        Some(expected) if expected == actual => (Status::Pass, None),
        _ if bless => {
            std::fs::write(&expected_path, &actual)
                .with_context(|| format!("failed to write {}", expected_path.display()))?;
            (Status::Blessed, None)
        }
        Some(expected) => (Status::Fail, Some(first_difference(&expected, &actual))),
        None => (Status::Fail, Some(format!("missing {}", expected_path.display()))),
    };
    Ok(Outcome { fixture, status, detail })
}

fn first_difference(expected: &str, actual: &str) -> String {
    let mut expected_lines = expected.lines();
    let mut actual_lines = actual.lines();
    let mut line = 1;
    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(e), Some(a)) if e == a => line += 1,
            (e, a) => {
                return format!(
                    "line {line}: expected {:?}, got {:?}",
                    e.unwrap_or("<eof>"),
                    a.unwrap_or("<eof>"),
                )
            }
        }
    }
}
