//! CLI for the Solidity mutant generator

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use solidity_mutation_engine::{
    Catalog, GenerationReport, GeneratorConfig, MutationError, SourceUnit,
};

#[derive(Parser)]
#[command(name = "solmut")]
#[command(author, version, about = "AST-based mutant generation for Solidity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate mutations for one Solidity file
    Generate {
        /// JSON AST dump produced by the parser
        #[arg(short, long)]
        ast: PathBuf,

        /// The Solidity source the AST was built from
        #[arg(short, long)]
        source: PathBuf,

        /// Operator selection config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the operators of the catalog
    Operators {
        /// Operator selection config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show example configuration
    Example,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Generate {
            ast,
            source,
            config,
            format,
            output,
        } => generate(&ast, &source, config.as_deref(), format, output.as_deref()),

        Commands::Operators { config } => list_operators(config.as_deref()),

        Commands::Example => {
            println!("{}", GeneratorConfig::example());
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn catalog(config: Option<&Path>) -> anyhow::Result<Catalog> {
    let Some(path) = config else {
        return Ok(Catalog::standard());
    };
    let config = GeneratorConfig::load(path)?;
    Ok(Catalog::from_config(&config)?)
}

fn generate(
    ast: &Path,
    source: &Path,
    config: Option<&Path>,
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let catalog = catalog(config)?;
    let unit = SourceUnit::load(source, ast)
        .with_context(|| format!("loading '{}'", source.display()))?;

    log::info!(
        "running {} operator(s) over {}",
        catalog.len(),
        unit.file().display()
    );
    let (mutations, timings) = catalog.generate_with_stats(&unit);
    let report = GenerationReport::new(unit.file(), mutations, timings);

    let rendered = match format {
        Format::Text => report.render(),
        Format::Json => report.to_json().context("serializing report")?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered).map_err(|e| MutationError::WriteError {
                file: path.to_path_buf(),
                error: e.to_string(),
            })?;
            eprintln!(
                "{} {} mutation(s) written to {}",
                "✓".green(),
                report.total(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn list_operators(config: Option<&Path>) -> anyhow::Result<()> {
    let catalog = catalog(config)?;
    for operator in catalog.operators() {
        println!("{:<6} {}", operator.id().bold(), operator.name());
    }
    println!();
    println!("{} operator(s)", catalog.len());
    Ok(())
}
