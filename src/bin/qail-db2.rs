//! qail-db2: DB2 query compiler CLI
//!
//! # Usage
//!
//! ```bash
//! # Compile a logical query (JSON) to DB2 SQL
//! qail-db2 compile query.json --emulated-pagination
//!
//! # Bind a %s template
//! qail-db2 bind 'SELECT SUM(%s) FROM "T" WHERE "A" = %s' --params '[2, "x"]'
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use qail_db2::prelude::*;
use qail_db2::transpiler::IdentifierQuoter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qail-db2")]
#[command(version)]
#[command(about = "Compile logical queries to IBM DB2 SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    qail-db2 compile query.json
    cat query.json | qail-db2 compile - --format json
    qail-db2 bind 'SELECT * FROM \"T\" WHERE \"A\" = %s' --params '[1]'
    qail-db2 quote users app.orders
    qail-db2 caps --emulated-pagination")]
struct Cli {
    /// Configuration file (defaults to ./qail-db2.toml, then the user config dir)
    #[arg(long, global = true, env = "QAIL_DB2_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Force OFFSET/FETCH pagination
    #[arg(long, global = true, conflicts_with = "emulated_pagination")]
    native_pagination: bool,

    /// Force ROW_NUMBER() pagination
    #[arg(long, global = true)]
    emulated_pagination: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a logical query read as JSON ("-" for stdin)
    Compile { input: String },
    /// Convert a %s template to native bind markers
    Bind {
        template: String,
        /// Parameters as a JSON array
        #[arg(short, long, default_value = "[]")]
        params: String,
    },
    /// Quote identifiers the way DB2 folds them
    Quote {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Show the active capability table
    Caps,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let caps = capabilities(&cli)?;
    match &cli.command {
        Commands::Compile { input } => compile_query(input, caps, cli.format),
        Commands::Bind { template, params } => bind_template(template, params, caps, cli.format),
        Commands::Quote { names } => quote_names(names, &caps),
        Commands::Caps => show_capabilities(&caps, cli.format),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "qail_db2=debug" } else { "qail_db2=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn capabilities(cli: &Cli) -> Result<DialectCapabilities> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let mut caps = config.dialect;
    if cli.native_pagination {
        caps.supports_native_pagination = true;
    }
    if cli.emulated_pagination {
        caps.supports_native_pagination = false;
    }
    Ok(caps)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn compile_query(input: &str, caps: DialectCapabilities, format: OutputFormat) -> Result<()> {
    let json = read_input(input)?;
    let query: LogicalQuery = serde_json::from_str(&json).context("Invalid logical query JSON")?;
    let compiled = Db2Compiler::new(caps).compile(&query)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&compiled)?),
        OutputFormat::Text => {
            println!("{}", compiled.sql.white().bold());
            if !compiled.params.is_empty() {
                println!();
                println!("{}", "Parameters:".dimmed());
                for (i, p) in compiled.params.iter().enumerate() {
                    println!("  {} {}", format!("{}.", i + 1).cyan(), p);
                }
            }
            if compiled.inlined > 0 {
                println!("{} {}", "Inlined literals:".dimmed(), compiled.inlined);
            }
            for notice in &compiled.notices {
                println!("{} {}", "notice:".yellow().bold(), notice);
            }
        }
    }
    Ok(())
}

fn bind_template(template: &str, params: &str, caps: DialectCapabilities, format: OutputFormat) -> Result<()> {
    let json: serde_json::Value = serde_json::from_str(params).context("--params must be a JSON array")?;
    let values: Vec<Value> = match json {
        serde_json::Value::Array(items) => items.iter().map(Value::from_json).collect(),
        _ => anyhow::bail!("--params must be a JSON array"),
    };
    let bound = Db2Compiler::new(caps).bind(template, &values)?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "sql": bound.sql,
                "params": bound.params,
                "inlined": bound.inlined,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{}", bound.sql.white().bold());
            for (i, p) in bound.params.iter().enumerate() {
                println!("  {} {}", format!("{}.", i + 1).cyan(), p);
            }
        }
    }
    Ok(())
}

fn quote_names(names: &[String], caps: &DialectCapabilities) -> Result<()> {
    let quoter = IdentifierQuoter::from_capabilities(caps);
    for name in names {
        match quoter.quote_path(name) {
            Ok(quoted) => println!("{} {} {}", name.dimmed(), "→".dimmed(), quoted.green()),
            Err(e) => println!("{} {} {}", name.dimmed(), "✗".red(), e.to_string().red()),
        }
    }
    Ok(())
}

fn show_capabilities(caps: &DialectCapabilities, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(caps)?),
        OutputFormat::Text => {
            println!("{}", "DB2 dialect capabilities".cyan().bold());
            for (name, value) in caps.describe() {
                println!("  {:<30} {}", name, value.yellow());
            }
        }
    }
    Ok(())
}
