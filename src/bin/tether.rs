//! Binary entry point for the tether table browser.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tether::{
    config::{CliConfig, SqliteOptions},
    init_logging,
    storage::{with_database, Database, RowKey, Table},
    Value,
};

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(
    name = "tether",
    version,
    about = "Inspect tables through the tether storage contract",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "URI",
        help = "Database to open (falls back to the config default)"
    )]
    database: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "TETHER_CONFIG",
        help = "CLI config file"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter directive, e.g. info or tether=debug"
    )]
    log_level: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "List table names and their count")]
    Tables,

    #[command(about = "Check whether a table exists (case-insensitive)")]
    Has {
        #[arg(value_name = "NAME")]
        name: String,
    },

    #[command(about = "Drop a table")]
    Drop {
        #[arg(value_name = "NAME")]
        name: String,
    },

    #[command(about = "Dump the rows of a table")]
    Rows {
        #[arg(value_name = "TABLE")]
        table: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct TablesReport {
    tables: Vec<String>,
    count: usize,
}

#[derive(Serialize)]
struct RowReport {
    key: RowKey,
    row: serde_json::Value,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    let level = cli
        .log_level
        .as_deref()
        .or(config.log_level())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logging(level)?;

    let uri = cli
        .database
        .as_deref()
        .or(config.default_database())
        .ok_or("no database given; pass --database or set [database] default in the config")?;
    let options = match cli.command {
        Command::Drop { .. } => SqliteOptions {
            create_if_missing: false,
            ..SqliteOptions::default()
        },
        _ => SqliteOptions::read_only(),
    };
    let format = cli.format;

    match cli.command {
        Command::Tables => {
            let report = with_database(uri, options, |db| {
                let mut tables = Vec::new();
                for entry in db.entries()? {
                    let (name, _) = entry?;
                    tables.push(name);
                }
                let count = db.size()?;
                Ok(TablesReport { tables, count })
            })?;
            emit(format, &report, |report| {
                for name in &report.tables {
                    println!("{name}");
                }
                println!("{} table(s)", report.count);
            })?;
        }
        Command::Has { name } => {
            let exists = with_database(uri, options, |db| db.has(&name))?;
            emit(format, &json!({ "name": &name, "exists": exists }), |_| {
                println!("{exists}");
            })?;
        }
        Command::Drop { name } => {
            with_database(uri, options, |db| db.remove(&name))?;
            emit(format, &json!({ "dropped": &name }), |_| {
                println!("dropped {name}");
            })?;
        }
        Command::Rows { table } => {
            let rows = with_database(uri, options, |db| {
                let mut rows = Vec::new();
                for entry in db.value(&table).entries()? {
                    let (key, row) = entry?;
                    let row = row
                        .iter()
                        .map(|(column, value)| (column.clone(), plain_json(value)))
                        .collect();
                    rows.push(RowReport {
                        key,
                        row: serde_json::Value::Object(row),
                    });
                }
                Ok(rows)
            })?;
            emit(format, &rows, |rows| {
                for entry in rows {
                    println!("{}\t{}", entry.key, entry.row);
                }
            })?;
        }
    }

    Ok(())
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: Fn(&T),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(value),
    }
    Ok(())
}

/// Untagged JSON rendering for display; the library's serde form is tagged.
fn plain_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(v) => json!(v),
        Value::Int(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::String(v) => json!(v),
        Value::Bytes(v) => json!(v),
        Value::List(items) => serde_json::Value::Array(items.iter().map(plain_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), plain_json(value)))
                .collect(),
        ),
    }
}
