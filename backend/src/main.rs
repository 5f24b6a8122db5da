//! Planfact CLI - Plan-fact sales reports from CSV exports
//!
//! # Main Commands
//!
//! ```bash
//! planfact serve                        # Start HTTP server (port 3000)
//! planfact report result.csv            # Render the report table
//! planfact report --filter "manager=Иванов" https://host/result.csv
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! planfact parse result.csv             # Normalized records as JSON
//! planfact options result.csv           # Show filter option lists
//! planfact check my-definition.json     # Validate a report definition
//! ```
//!
//! The source may also come from `PLANFACT_URL`, and a custom report
//! definition from `--definition` or `PLANFACT_DEFINITION`.

use clap::{Parser, Subcommand};
use planfact::definition::ReportDefinition;
use planfact::loader::{DatasetLoader, ReportSource};
use planfact::models::{FilterSelection, Highlight};
use planfact::report::{render, selection_from_pairs, RenderedReport, RenderedRow};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "planfact")]
#[command(about = "Plan-fact sales reports from CSV exports", long_about = None)]
struct Cli {
    /// Report definition JSON file (default: embedded sales definition,
    /// or PLANFACT_DEFINITION)
    #[arg(short, long, global = true)]
    definition: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and normalize a source, output typed records as JSON
    Parse {
        /// Source CSV (file path or URL; default: PLANFACT_URL)
        source: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the filtered report table
    Report {
        /// Source CSV (file path or URL; default: PLANFACT_URL)
        source: Option<String>,

        /// Filter selection, repeatable: --filter "manager=Иванов"
        /// (comma-separated values for multiselect)
        #[arg(short, long)]
        filter: Vec<String>,

        /// Output the rendered report as JSON instead of a text table
        #[arg(long)]
        json: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show filter option lists for a source
    Options {
        /// Source CSV (file path or URL; default: PLANFACT_URL)
        source: Option<String>,
    },

    /// Validate a report definition file
    Check {
        /// Definition JSON file
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Source CSV (file path or URL; default: PLANFACT_URL)
        source: Option<String>,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let definition = match resolve_definition(cli.definition.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Parse { source, output } => {
            cmd_parse(source.as_deref(), &definition, output.as_deref()).await
        }

        Commands::Report {
            source,
            filter,
            json,
            output,
        } => cmd_report(source.as_deref(), &definition, &filter, json, output.as_deref()).await,

        Commands::Options { source } => cmd_options(source.as_deref(), &definition).await,

        Commands::Check { input } => cmd_check(&input),

        Commands::Serve { source, port } => cmd_serve(source.as_deref(), definition, port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Definition resolution: flag, then PLANFACT_DEFINITION, then embedded.
fn resolve_definition(path: Option<&Path>) -> Result<ReportDefinition, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(ReportDefinition::load(p)?),
        None => match std::env::var("PLANFACT_DEFINITION") {
            Ok(p) => Ok(ReportDefinition::load(Path::new(&p))?),
            Err(_) => Ok(ReportDefinition::default_sales()),
        },
    }
}

/// Source resolution: argument, then PLANFACT_URL.
fn resolve_source(source: Option<&str>) -> Result<ReportSource, Box<dyn std::error::Error>> {
    match source {
        Some(s) => Ok(ReportSource::parse(s)),
        None => match std::env::var("PLANFACT_URL") {
            Ok(url) => Ok(ReportSource::parse(&url)),
            Err(_) => Err("no source given (argument or PLANFACT_URL)".into()),
        },
    }
}

async fn load_dataset(
    source: Option<&str>,
    definition: &ReportDefinition,
) -> Result<std::sync::Arc<planfact::models::Dataset>, Box<dyn std::error::Error>> {
    let loader = DatasetLoader::new(resolve_source(source)?, definition.clone());
    let (dataset, _info) = loader.load().await?;
    Ok(dataset)
}

async fn cmd_parse(
    source: Option<&str>,
    definition: &ReportDefinition,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_dataset(source, definition).await?;

    let json = serde_json::to_string_pretty(&dataset.records)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_report(
    source: Option<&str>,
    definition: &ReportDefinition,
    filters: &[String],
    json: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = parse_filters(filters, definition)?;
    let dataset = load_dataset(source, definition).await?;

    let report = render(&dataset, &selection, definition);
    eprintln!(
        "   {} of {} records match",
        report.meta.matched_rows, report.meta.dataset_rows
    );

    if json {
        write_output(&serde_json::to_string_pretty(&report)?, output)?;
    } else {
        write_output(&text_table(&report), output)?;
    }

    Ok(())
}

async fn cmd_options(
    source: Option<&str>,
    definition: &ReportDefinition,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_dataset(source, definition).await?;

    let report = render(&dataset, &FilterSelection::new(), definition);
    for options in &report.options {
        println!("{} ({}):", options.header, options.field);
        for value in &options.options {
            println!("  {}", value);
        }
        println!();
    }

    Ok(())
}

fn cmd_check(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Checking definition: {}", input.display());

    let definition = ReportDefinition::load(input)?;
    eprintln!(
        "   {} label columns, {} value columns, {} ratios",
        definition.labels.len(),
        definition.values.len(),
        definition.ratios.len()
    );
    eprintln!("Definition is valid");

    Ok(())
}

async fn cmd_serve(
    source: Option<&str>,
    definition: ReportDefinition,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = DatasetLoader::new(resolve_source(source)?, definition);
    planfact::server::start_server(port, loader).await
}

/// Parse `FIELD=VALUE` filter flags into a selection.
fn parse_filters(
    filters: &[String],
    definition: &ReportDefinition,
) -> Result<FilterSelection, Box<dyn std::error::Error>> {
    let mut pairs = Vec::with_capacity(filters.len());
    for raw in filters {
        let (field, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("invalid filter '{}', expected FIELD=VALUE", raw))?;
        pairs.push((field.trim().to_string(), value.trim().to_string()));
    }
    Ok(selection_from_pairs(pairs, definition)?)
}

/// Render the report as an aligned text table with a totals row.
fn text_table(report: &RenderedReport) -> String {
    let mut widths: Vec<usize> = report
        .table
        .headers
        .iter()
        .map(|h| h.chars().count())
        .collect();

    let all_rows: Vec<&RenderedRow> = report
        .table
        .rows
        .iter()
        .chain(std::iter::once(&report.table.totals))
        .collect();

    for row in &all_rows {
        for (i, cell) in row.cells.iter().enumerate() {
            let width = cell_text(cell).chars().count();
            if i < widths.len() && width > widths[i] {
                widths[i] = width;
            }
        }
    }

    let mut out = String::new();
    if !report.meta.title.is_empty() {
        out.push_str(&report.meta.title);
        out.push('\n');
    }

    let header_line: Vec<String> = report
        .table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i]))
        .collect();
    out.push_str(&header_line.join("  "));
    out.push('\n');

    let rule_len = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');

    for (idx, row) in all_rows.iter().enumerate() {
        // Rule above the totals row
        if idx == report.table.rows.len() {
            out.push_str(&"-".repeat(rule_len));
            out.push('\n');
        }
        let line: Vec<String> = row
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| pad(&cell_text(c), widths.get(i).copied().unwrap_or(0)))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out
}

/// Cell text with a plain-text emphasis marker for ratio cells.
fn cell_text(cell: &planfact::report::RenderedCell) -> String {
    match cell.highlight {
        Some(Highlight::Above) => format!("{} ▲", cell.text),
        Some(Highlight::Below) => format!("{} ▼", cell.text),
        _ => cell.text.clone(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
