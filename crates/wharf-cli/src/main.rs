//! wharf CLI: import warehouse table schemas, infer schemas from CSV files,
//! and preview parameter bindings.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wharf_core::config::AdapterConfig;
use wharf_core::infer::{infer_schema, InferOptions};
use wharf_core::schema::{DataType, Schema};
use wharf_core::types::{parse_naive_datetime, Frame, Value};
use wharf_params::{bind, ParamSpec};
use wharf_warehouse::{import_table_schema, TableDescriptor};

#[derive(Parser)]
#[command(name = "wharf")]
#[command(about = "wharf: schema reconciliation and parameter binding for warehouse queries", long_about = None)]
struct Cli {
    /// Path to an adapter config YAML (defaults come from WHARF_* variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema of a table descriptor (warehouse REST JSON)
    Import {
        /// Path to the table descriptor JSON
        #[arg(short, long)]
        table: PathBuf,
    },

    /// Infer a schema from a CSV file with a header row
    Infer {
        /// Path to the CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Type mixed columns by their first value instead of failing
        #[arg(long)]
        lenient: bool,

        /// Keep missing values when classifying columns
        #[arg(long)]
        keep_nulls: bool,

        /// Explicit column type, e.g. `--override amount=double`
        #[arg(long = "override", value_name = "NAME=TYPE")]
        overrides: Vec<String>,
    },

    /// Bind a JSON value to a typed parameter and print the wire form
    Bind {
        /// Parameter name
        #[arg(long)]
        name: String,

        /// Declared type, e.g. `date` or `struct<a: int64, b: string>`
        #[arg(long = "type")]
        data_type: String,

        /// Value as JSON
        #[arg(long)]
        value: String,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Import { table } => import(&table),
        Commands::Infer {
            csv,
            lenient,
            keep_nulls,
            overrides,
        } => infer(&config, &csv, lenient, keep_nulls, &overrides),
        Commands::Bind {
            name,
            data_type,
            value,
        } => bind_value(&name, &data_type, &value),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_config(path: Option<&Path>) -> Result<AdapterConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(AdapterConfig::from_yaml_str(&fs::read_to_string(path)?)?),
        None => Ok(AdapterConfig::from_env()),
    }
}

fn import(table_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let descriptor = TableDescriptor::from_json(&fs::read_to_string(table_path)?)?;
    let schema = import_table_schema(&descriptor)?;
    println!("{}", descriptor.reference);
    println!("{}", schema);
    Ok(())
}

fn infer(
    config: &AdapterConfig,
    csv_path: &Path,
    lenient: bool,
    keep_nulls: bool,
    overrides: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let options = infer_options(config, lenient, keep_nulls, overrides)?;
    let frame = read_csv(csv_path)?;
    let schema: Schema = infer_schema(&frame, &options)?;
    println!("{}", schema);
    Ok(())
}

fn infer_options(
    config: &AdapterConfig,
    lenient: bool,
    keep_nulls: bool,
    overrides: &[String],
) -> Result<InferOptions, Box<dyn std::error::Error>> {
    let mut options = config.infer_options();
    if lenient {
        options = options.with_strict(false);
    }
    if keep_nulls {
        options = options.with_aggressive_null(false);
    }
    for spec in overrides {
        let (name, ty) = spec
            .split_once('=')
            .ok_or_else(|| format!("override '{spec}' is not NAME=TYPE"))?;
        options = options.with_override(name.trim(), DataType::parse(ty.trim())?);
    }
    Ok(options)
}

fn read_csv(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(parse_cell).collect());
    }
    Ok(Frame::from_rows(names, rows)?)
}

/// Read a CSV cell as the narrowest value it spells.
///
/// Empty cells and `nan` are missing. Date-only cells stay strings; cells
/// with a time of day become datetimes.
fn parse_cell(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        return Value::Float(f);
    }
    if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
        return Value::Bool(cell.eq_ignore_ascii_case("true"));
    }
    if NaiveDate::parse_from_str(cell, "%Y-%m-%d").is_ok() {
        return Value::Str(cell.to_string());
    }
    match parse_naive_datetime(cell) {
        Some(dt) => Value::DateTime(dt),
        None => Value::Str(cell.to_string()),
    }
}

fn bind_value(name: &str, data_type: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let spec = ParamSpec::new(name, DataType::parse(data_type)?);
    let value = Value::from_json(serde_json::from_str(value)?);
    let bound = bind(&spec, &value)?;
    println!("{}", serde_json::to_string_pretty(&bound)?);
    Ok(())
}
