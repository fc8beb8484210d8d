//! CLI for `oasforge-openapi`.
//!
//! `DocumentBuilder` is driven from Rust code (it needs compile-time
//! `#[derive(ApiSchema)]`/`ApiSchema` impls, which this binary cannot
//! synthesize), so the CLI's job is file-level: validating a generator
//! config and converting an already-built document between JSON and YAML.
//!
//! # Subcommands
//!
//! ```text
//! oasforge convert --input openapi.json --output openapi.yaml
//! oasforge validate-config --config oasforge.yaml
//! ```

#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use oasforge_core::Document;
use oasforge_openapi::GeneratorConfig;

/// Document conversion and config validation for `oasforge-openapi`.
#[derive(Parser)]
#[command(name = "oasforge", version, about)]
enum Cli {
    /// Re-serialize an existing document, choosing format by file extension.
    Convert(ConvertArgs),

    /// Parse a generator config file and print a one-line summary.
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Parser)]
struct ConvertArgs {
    /// Path to the input document (`.json`, `.yaml`, or `.yml`).
    #[arg(short, long)]
    input: PathBuf,

    /// Path to write the converted document to.
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Parser)]
struct ValidateConfigArgs {
    /// Path to a `GeneratorConfig` YAML file.
    #[arg(short, long)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli {
        Cli::Convert(args) => run_convert(&args),
        Cli::ValidateConfig(args) => run_validate_config(&args),
    }
}

fn run_convert(args: &ConvertArgs) -> anyhow::Result<()> {
    let contents = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let document: Document = match args.input.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            serde_json::from_str(&contents).context("Failed to parse input document as JSON")?
        }
        _ => serde_yaml_ng::from_str(&contents).context("Failed to parse input document as YAML")?,
    };

    oasforge_openapi::write_document(&document, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    eprintln!("Wrote {}", args.output.display());
    Ok(())
}

fn run_validate_config(args: &ValidateConfigArgs) -> anyhow::Result<()> {
    let config = GeneratorConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    eprintln!(
        "{}: target {:?}, naming {:?}, dedup={}",
        args.config.display(),
        config.target_version,
        config.naming_strategy,
        config.deduplicate
    );
    Ok(())
}
