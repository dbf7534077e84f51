//! StockScrape CLI — fetch, schema and normalize commands.
//!
//! Commands:
//! - `fetch` — assemble one instrument's record from its quote pages
//! - `schema` — print each section's selectors, positional table and fingerprint
//! - `normalize` — run the numeric normalizer over raw cell text

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockscrape_core::normalize::UnitGrammar;
use stockscrape_core::{
    DirFetcher, DocumentFetcher, FetcherConfig, HttpFetcher, Schema, SectionKind, SiteConfig,
};
use stockscrape_runner::{assemble, AssembleOptions, AssemblyReport, LogProgress};

#[derive(Parser)]
#[command(
    name = "stockscrape",
    about = "StockScrape CLI — typed records from financial quote pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured section for a symbol and print the merged record.
    Fetch {
        /// Instrument symbol (e.g., VEDL.NS, AAPL).
        symbol: String,

        /// Site configuration TOML. Defaults to the built-in Yahoo preset.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only these sections (comma-separated, e.g. profile,statistics).
        #[arg(long, value_delimiter = ',')]
        sections: Vec<SectionKind>,

        /// Read saved pages from this directory instead of the network.
        #[arg(long)]
        offline_dir: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Per-request timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Overall deadline in seconds; unfinished sections are cancelled.
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Print selectors, positional tables and schema fingerprints.
    Schema {
        /// Site configuration TOML. Defaults to the built-in Yahoo preset.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only this section.
        #[arg(long)]
        section: Option<SectionKind>,
    },
    /// Normalize raw cell text into numbers.
    Normalize {
        /// Raw values (e.g., 18.4% 1.42B "(1,234)").
        #[arg(required = true, allow_hyphen_values = true)]
        raw: Vec<String>,

        /// Also accept thousands separators, parenthesized negatives and K/T.
        #[arg(long, default_value_t = false)]
        extended: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The full report as pretty JSON.
    Json,
    /// Human-readable section table and highlights.
    Summary,
    /// The historical series as CSV.
    Csv,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            symbol,
            config,
            sections,
            offline_dir,
            format,
            timeout_secs,
            deadline_secs,
        } => run_fetch(
            &symbol,
            config.as_deref(),
            &sections,
            offline_dir,
            format,
            timeout_secs,
            deadline_secs,
        ),
        Commands::Schema { config, section } => run_schema(config.as_deref(), section),
        Commands::Normalize { raw, extended } => run_normalize(&raw, extended),
    }
}

/// Logs go to stderr so stdout carries only the requested output.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,stockscrape=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_site(path: Option<&Path>) -> Result<SiteConfig> {
    match path {
        Some(path) => SiteConfig::from_file(path)
            .with_context(|| format!("loading site config {}", path.display())),
        None => Ok(SiteConfig::yahoo()?),
    }
}

fn run_fetch(
    symbol: &str,
    config: Option<&Path>,
    sections: &[SectionKind],
    offline_dir: Option<PathBuf>,
    format: OutputFormat,
    timeout_secs: u64,
    deadline_secs: Option<u64>,
) -> Result<()> {
    if symbol.trim().is_empty() {
        bail!("symbol must not be empty");
    }

    let mut site = load_site(config)?;
    if !sections.is_empty() {
        for kind in sections {
            if site.section(*kind).is_none() {
                bail!("section '{kind}' is not configured for site {}", site.label());
            }
        }
        site = site.only(sections);
    }

    let fetcher: Arc<dyn DocumentFetcher> = match offline_dir {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("offline directory does not exist: {}", dir.display());
            }
            tracing::debug!(dir = %dir.display(), "reading saved pages");
            Arc::new(DirFetcher::new(dir))
        }
        None => {
            let config = FetcherConfig::default().with_timeout(Duration::from_secs(timeout_secs));
            Arc::new(HttpFetcher::new(config)?)
        }
    };

    let mut options = AssembleOptions::default();
    if let Some(secs) = deadline_secs {
        options = options.with_deadline(Duration::from_secs(secs));
    }

    let report = assemble(fetcher, &site, symbol, &options, &LogProgress)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Summary => print_summary(&report),
        OutputFormat::Csv => print_history_csv(&report)?,
    }

    // Output is printed even for a partial record; the exit code flags it.
    if !report.errors().is_empty() {
        for err in report.errors() {
            eprintln!("Error: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn print_json(report: &AssemblyReport) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}

fn print_history_csv(report: &AssemblyReport) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    for point in &report.record.history {
        wtr.serialize(point)?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_summary(report: &AssemblyReport) {
    let record = &report.record;
    let stats = &record.statistics;

    println!();
    println!("=== Stock Record ===");
    println!("Symbol:         {}", report.symbol);
    println!("Site:           {}", report.site);
    println!(
        "Started:        {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Elapsed:        {} ms", report.elapsed_ms);
    println!();
    println!("{:<18} {:<10} {:>8} {:>10}", "Section", "Status", "Warnings", "Elapsed");
    println!("{}", "-".repeat(49));
    for section in &report.sections {
        println!(
            "{:<18} {:<10} {:>8} {:>8} ms",
            section.section.as_str(),
            section.status.to_string(),
            section.warnings.len(),
            section.elapsed_ms
        );
    }
    println!();
    println!("--- Highlights ---");
    if !record.profile.name.is_empty() {
        println!("Name:           {}", record.profile.name);
        println!("Sector:         {}", record.profile.sector);
    }
    if let Some(cap) = stats.valuation_metrics.market_cap.first() {
        println!("Market Cap:     {cap}");
    }
    if !stats.revenue.is_empty() {
        println!("Revenue (ttm):  {}", stats.revenue);
    }
    println!("Profit Margin:  {:.2}%", stats.profit_margin * 100.0);
    println!("Beta (5Y):      {:.3}", stats.beta);
    println!("News items:     {}", record.news.len());
    println!("History rows:   {}", record.history.len());
    if let Some(latest) = record.history.iter().find(|p| p.is_price_row()) {
        let date = latest.date.map(|d| d.to_string()).unwrap_or_default();
        println!("Last close:     {:.2} ({date})", latest.close);
    }
    println!(
        "Revenue cols:   {}",
        record.financial.income_statement.total_revenue.len()
    );

    for (section, warning) in report.warnings() {
        println!("WARNING: [{section}] {warning}");
    }
    println!();
}

fn run_schema(config: Option<&Path>, only: Option<SectionKind>) -> Result<()> {
    let site = load_site(config)?;
    println!("Site: {}", site.label());

    for section in &site.sections {
        if only.is_some_and(|kind| kind != section.kind) {
            continue;
        }
        for (page, fingerprint) in section.pages.iter().zip(section.fingerprints()) {
            println!();
            println!("[{}] {}", section.kind, page.url);
            println!("fingerprint: {fingerprint}");

            for (name, pattern) in page.selectors.iter() {
                println!("  selector {name:<24} {}", pattern.as_str());
            }

            match &page.schema {
                Schema::Fields(fields) => {
                    println!("  layout fields (grammar {:?})", fields.grammar);
                    println!("  {:>5}  {:<24} {:<16} {}", "Index", "Key", "Type", "Field");
                    for spec in &fields.fields {
                        let index = spec.index.map(|i| i.to_string()).unwrap_or_else(|| "*".into());
                        println!(
                            "  {:>5}  {:<24} {:<16} {}",
                            index,
                            fields.key_of(spec).unwrap_or("-"),
                            spec.value_type.to_string(),
                            spec.field
                        );
                    }
                }
                Schema::Rows(rows) => {
                    println!("  layout rows (grammar {:?})", rows.grammar);
                    println!("  {:<24} {:<16} {}", "Key", "Type", "Field");
                    for column in &rows.columns {
                        println!(
                            "  {:<24} {:<16} {}",
                            column.key,
                            column.value_type.to_string(),
                            column.field
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_normalize(raw: &[String], extended: bool) -> Result<()> {
    let grammar = if extended {
        UnitGrammar::Extended
    } else {
        UnitGrammar::Baseline
    };
    println!("{:<20} {:>20} {:<10}", "Raw", "Value", "Unit");
    println!("{}", "-".repeat(52));
    for input in raw {
        let out = grammar.normalize(input);
        match &out.failure {
            None => println!("{:<20} {:>20} {:<10?}", input, out.value, out.unit),
            Some(failure) => println!("{:<20} {:>20} {failure}", input, out.value),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sections_flag_accepts_aliases() {
        let cli = Cli::try_parse_from([
            "stockscrape",
            "fetch",
            "VEDL.NS",
            "--sections",
            "stats,history",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch {
                symbol,
                sections,
                format,
                ..
            } => {
                assert_eq!(symbol, "VEDL.NS");
                assert_eq!(
                    sections,
                    [SectionKind::Statistics, SectionKind::HistoricalSeries]
                );
                assert!(format == OutputFormat::Json);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(Cli::try_parse_from(["stockscrape", "fetch", "X", "--sections", "quotes"]).is_err());
    }

    #[test]
    fn normalize_accepts_negative_values() {
        let cli = Cli::try_parse_from(["stockscrape", "normalize", "--extended", "-9.8%"]).unwrap();
        match cli.command {
            Commands::Normalize { raw, extended } => {
                assert_eq!(raw, ["-9.8%"]);
                assert!(extended);
            }
            _ => panic!("expected normalize"),
        }
    }
}
