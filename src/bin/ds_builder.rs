//! Descriptor Builder Command Line Interface
//!
//! Builds service-component descriptors from a facts file.
//!
//! # Usage
//!
//! ```bash
//! # Write descriptors below target/classes/OSGI-INF
//! ds_builder build --facts facts.yaml --out target/classes
//!
//! # Report problems without writing
//! ds_builder check --facts facts.yaml --format json
//!
//! # Print one descriptor
//! ds_builder render --facts facts.yaml --type de.test.Impl
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ds_annotation_builder::{
    build, check, load_facts, render, BuildReport, BuilderConfig, ConfigLoader, LineSeparator,
    OutputStatus,
};
use ds_descriptor_core::{Problem, Severity};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ds_builder")]
#[command(version)]
#[command(about = "Build OSGi Declarative Services descriptors from annotated type facts")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Builder configuration file (default: $DS_BUILDER_CONFIG, then ./ds-builder.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,

    /// Override the descriptor folder
    #[arg(long, global = true)]
    descriptor_folder: Option<String>,

    /// Override the schema namespace version
    #[arg(long, global = true)]
    schema_version: Option<String>,

    /// Override the multi-value property separator
    #[arg(long, global = true, value_enum)]
    line_separator: Option<SeparatorArg>,

    /// Do not write the generated-file header comment
    #[arg(long, global = true)]
    no_header: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SeparatorArg {
    Platform,
    Lf,
    Crlf,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate all components and write their descriptors
    Build {
        /// Facts file (.yaml, .yml or .json)
        #[arg(short, long)]
        facts: PathBuf,

        /// Output root; descriptors go to <out>/<descriptor folder>
        #[arg(long)]
        out: PathBuf,
    },

    /// Translate all components and report problems without writing
    Check {
        #[arg(short, long)]
        facts: PathBuf,
    },

    /// Print the descriptor of one component
    Render {
        #[arg(short, long)]
        facts: PathBuf,

        /// Binary name of the component type
        #[arg(long = "type")]
        type_name: String,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Commands::Build { facts, out } => cmd_build(facts, out, &config, cli.format),
        Commands::Check { facts } => cmd_check(facts, &config, cli.format),
        Commands::Render { facts, type_name } => cmd_render(facts, type_name, &config, cli.format),
    });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<BuilderConfig> {
    let mut config = ConfigLoader::new(cli.config.clone()).load()?;

    if let Some(folder) = &cli.descriptor_folder {
        config.descriptor_folder = folder.clone();
    }
    if let Some(version) = &cli.schema_version {
        config.schema_version = version.clone();
    }
    if let Some(separator) = cli.line_separator {
        config.line_separator = match separator {
            SeparatorArg::Platform => LineSeparator::Platform,
            SeparatorArg::Lf => LineSeparator::Lf,
            SeparatorArg::Crlf => LineSeparator::Crlf,
        };
    }
    if cli.no_header {
        config.generate_header = false;
    }
    Ok(config)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_build(
    facts: &Path,
    out: &Path,
    config: &BuilderConfig,
    format: OutputFormat,
) -> Result<bool> {
    let document = load_facts(facts)?;
    let report = build(&document, config, out)?;
    print_report(&report, format)?;
    Ok(!report.has_errors())
}

fn cmd_check(facts: &Path, config: &BuilderConfig, format: OutputFormat) -> Result<bool> {
    let document = load_facts(facts)?;
    let report = check(&document, config)?;
    print_report(&report, format)?;
    Ok(!report.has_errors())
}

fn cmd_render(
    facts: &Path,
    type_name: &str,
    config: &BuilderConfig,
    format: OutputFormat,
) -> Result<bool> {
    let document = load_facts(facts)?;
    let (xml, problems) = render(&document, config, type_name)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "type_name": type_name,
                "xml": xml,
                "problems": problems,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            print!("{}", xml);
            for problem in &problems {
                eprintln!("{}", format_problem(problem));
            }
        }
    }
    Ok(!ds_descriptor_core::has_errors(&problems))
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_report(report: &BuildReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for ty in &report.types {
        let status = match ty.status {
            OutputStatus::Written => "written".green(),
            OutputStatus::Unchanged => "unchanged".dimmed(),
            OutputStatus::Valid => "ok".green(),
            OutputStatus::Skipped => "skipped".red(),
        };
        match &ty.path {
            Some(path) => println!("{:>9} {} ({})", status, ty.type_name, path.display()),
            None => println!("{:>9} {}", status, ty.type_name),
        }
        for problem in &ty.problems {
            println!("          {}", format_problem(problem));
        }
    }

    println!(
        "\n{} component(s): {} written, {} unchanged, {} skipped",
        report.types.len(),
        report.count(OutputStatus::Written),
        report.count(OutputStatus::Unchanged),
        report.count(OutputStatus::Skipped)
    );
    Ok(())
}

fn format_problem(problem: &Problem) -> String {
    let label = match problem.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    match &problem.field {
        Some(field) => format!("{} [{}]: {}", label, field, problem.message),
        None => format!("{}: {}", label, problem.message),
    }
}
