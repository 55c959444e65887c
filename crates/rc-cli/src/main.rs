//! `rc` CLI: check, print, export and query configuration files.
//!
//! ## Usage
//!
//! ```sh
//! # Report problems; exits with status 1 when there are any
//! rc check -i app.rc
//!
//! # Same, as a JSON list of diagnostics
//! rc check --json -i app.rc
//!
//! # Normalized text form (stdin → stdout)
//! cat app.rc | rc print
//!
//! # JSON export to a file, with an imported variable
//! rc -D home=/srv json -i app.rc -o app.json
//!
//! # Look up a value by dotted path
//! rc get -i app.rc server.port --type integer
//! ```
//!
//! Logging goes to stderr and is filtered by `RC_LOG` (default `error`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rc_core::{Config, ReadOptions, Value};
use std::io::{self, Write};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rc", version, about = "Runtime configuration language tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Import a string variable, NAME=VALUE (repeatable)
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", global = true)]
    defines: Vec<String>,

    /// Refuse includes nested deeper than this
    #[arg(long, global = true)]
    max_include_depth: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and report diagnostics
    Check {
        /// Input file (`-` for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,
        /// Print diagnostics as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Write the parsed tree back as configuration text
    Print {
        #[arg(short, long, default_value = "-")]
        input: String,
        /// Output file (`-` for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Export the parsed tree as JSON
    Json {
        #[arg(short, long, default_value = "-")]
        input: String,
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Print the value at a dotted path such as `server.port`
    Get {
        #[arg(short, long, default_value = "-")]
        input: String,
        path: String,
        /// Require the value to be of this type
        #[arg(long = "type", value_enum)]
        kind: Option<GetKind>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GetKind {
    Integer,
    Unsigned,
    Boolean,
    Float,
    #[value(name = "string")]
    Text,
    Array,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let defines = parse_defines(&cli.defines)?;
    let imports: Vec<(&str, &str)> = defines
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let mut options = ReadOptions::new();
    if let Some(depth) = cli.max_include_depth {
        options = options.with_max_include_depth(depth);
    }

    match cli.command {
        Commands::Check { input, json } => {
            let config = read_config(&options, &imports, &input)?;
            let diagnostics = config.diagnostics();
            if json {
                let text = serde_json::to_string_pretty(diagnostics)
                    .context("Failed to serialize diagnostics")?;
                println!("{text}");
            } else {
                report(&config);
            }
            if !diagnostics.is_empty() {
                process::exit(1);
            }
        }
        Commands::Print { input, output } => {
            let config = read_config(&options, &imports, &input)?;
            report(&config);
            config
                .write_file(&output)
                .with_context(|| format!("Failed to write {output}"))?;
        }
        Commands::Json { input, output } => {
            let config = read_config(&options, &imports, &input)?;
            report(&config);
            let mut json = config.to_json().context("Failed to export JSON")?;
            json.push('\n');
            write_output(&output, &json)?;
        }
        Commands::Get { input, path, kind } => {
            let config = read_config(&options, &imports, &input)?;
            report(&config);
            let keys: Vec<&str> = path.split('.').collect();
            let text = get_value(&config, &keys, kind)
                .with_context(|| format!("Failed to look up '{path}'"))?;
            println!("{text}");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RC_LOG").unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Split `NAME=VALUE` arguments.
fn parse_defines(defines: &[String]) -> Result<Vec<(String, String)>> {
    defines
        .iter()
        .map(|define| match define.split_once('=') {
            Some((name, _)) if name.is_empty() => bail!("Empty variable name in '{define}'"),
            Some((name, value)) => Ok((name.to_string(), value.to_string())),
            None => bail!("Expected NAME=VALUE, got '{define}'"),
        })
        .collect()
}

fn read_config(options: &ReadOptions, imports: &[(&str, &str)], input: &str) -> Result<Config> {
    Config::read_file_with(options, imports, input)
        .with_context(|| format!("Failed to read configuration: {input}"))
}

fn report(config: &Config) {
    for diagnostic in config.diagnostics() {
        eprintln!("{diagnostic}");
    }
}

fn get_value(config: &Config, path: &[&str], kind: Option<GetKind>) -> Result<String> {
    let text = match kind {
        None => display(config, config.get_object(path)?)?,
        Some(GetKind::Integer) => config.get_integer(path)?.to_string(),
        Some(GetKind::Unsigned) => config.get_unsigned(path)?.to_string(),
        Some(GetKind::Boolean) => config.get_boolean(path)?.to_string(),
        Some(GetKind::Float) => config.get_double(path)?.to_string(),
        Some(GetKind::Text) => config.get_string(path)?.to_string(),
        Some(GetKind::Array) => display(config, Value::Array(config.get_array(path)?))?,
    };
    Ok(text)
}

/// Scalars print bare, arrays as pretty JSON.
fn display(config: &Config, value: Value) -> Result<String> {
    Ok(match value {
        Value::Nil => "nil".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(_) => config.resolve(value).unwrap_or_default().to_string(),
        Value::Array(_) => serde_json::to_string_pretty(&config.value_to_json(value))
            .context("Failed to serialize array")?,
    })
}

fn write_output(path: &str, content: &str) -> Result<()> {
    if path == "-" {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))
}
