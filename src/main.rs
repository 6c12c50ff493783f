use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod filter;
mod insights;
mod loader;
mod metrics;
mod models;
mod pipeline;
mod report;
mod validate;

use filter::{FilterRequest, Filters};
use loader::Source;

#[derive(Parser)]
#[command(name = "funnel-lab")]
#[command(about = "Funnel drop-offs, channel performance, and business-ready insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Use the bundled sample dataset
    #[arg(long)]
    sample: bool,
    /// Funnel CSV to analyze
    #[arg(long, env = "FUNNEL_LAB_CSV")]
    csv: Option<PathBuf>,
}

impl DataArgs {
    fn source(&self) -> Option<Source> {
        match (self.sample, &self.csv) {
            (true, _) => Some(Source::Sample),
            (false, Some(path)) => Some(Source::File(path.clone())),
            (false, None) => None,
        }
    }

    fn label(&self) -> String {
        match self.source() {
            Some(Source::File(path)) => path.display().to_string(),
            _ => "bundled sample".to_string(),
        }
    }
}

#[derive(Args)]
struct FilterArgs {
    /// First day to include (defaults to the earliest date)
    #[arg(long, value_parser = parse_date_arg)]
    start: Option<NaiveDate>,
    /// Last day to include (defaults to the latest date)
    #[arg(long, value_parser = parse_date_arg)]
    end: Option<NaiveDate>,
    /// Channel to include; repeat for several (defaults to all)
    #[arg(long = "channel")]
    channels: Vec<String>,
}

impl FilterArgs {
    fn request(&self) -> FilterRequest {
        FilterRequest {
            start: self.start,
            end: self.end,
            channels: (!self.channels.is_empty()).then(|| self.channels.clone()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a markdown dashboard report
    Report {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print KPIs, funnel and insights
    Summary {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export the dashboard as JSON
    Export {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the date range and channels available for filtering
    Inspect {
        #[command(flatten)]
        data: DataArgs,
    },
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    validate::parse_date(value).map_err(|e| e.to_string())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "funnel_lab=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn prepare(data: &DataArgs) -> anyhow::Result<Option<models::Dataset>> {
    let Some(source) = data.source() else {
        println!("No dataset loaded yet. Pass --sample or --csv <path> to start.");
        return Ok(None);
    };
    let dataset = pipeline::prepare(&source)
        .with_context(|| format!("could not build dashboard from {}", data.label()))?;
    Ok(Some(dataset))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report { data, filters, out } => {
            let Some(dataset) = prepare(&data)? else {
                return Ok(());
            };
            let dashboard = pipeline::run(&dataset, &filters.request());
            let report = report::build_report(&data.label(), &dashboard);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
        Commands::Summary { data, filters } => {
            let Some(dataset) = prepare(&data)? else {
                return Ok(());
            };
            let dashboard = pipeline::run(&dataset, &filters.request());
            print!("{}", report::build_summary(&dashboard));
        }
        Commands::Export { data, filters, out } => {
            let Some(dataset) = prepare(&data)? else {
                return Ok(());
            };
            let dashboard = pipeline::run(&dataset, &filters.request());
            let json = serde_json::to_string_pretty(&dashboard)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Dashboard exported to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Inspect { data } => {
            let Some(dataset) = prepare(&data)? else {
                return Ok(());
            };
            match Filters::defaults(&dataset) {
                Some(defaults) => {
                    println!("Rows: {}", dataset.len());
                    println!("Date range: {} to {}", defaults.start, defaults.end);
                    println!("Channels:");
                    for channel in &defaults.channels {
                        println!("- {channel}");
                    }
                }
                None => println!("Dataset has no rows."),
            }
        }
    }

    Ok(())
}
