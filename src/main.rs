//! tallyview main entry point

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tallyview_config::Config;
use tallyview_core::error::{DefaultErrorLogger, ErrorContext, ErrorLogger};
use tallyview_core::{CollectionSource, Exporter, FileSource, FilterState, SortSpec, TimeContext, ViewEngine, CSV_MIME_TYPE};
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The whole derived view as JSON
    Json,
    /// One page of the view as JSON
    Page,
    /// CSV export of the visible rows
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "tallyview")]
#[command(version = "0.1.0")]
#[command(about = "Filter, total and export accounting list data", long_about = None)]
struct Args {
    /// Configuration file path (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file with the list payload (array or {items}/{entries} envelope)
    #[arg(short, long, required_unless_present = "print_default_config")]
    input: Option<PathBuf>,

    /// Free-text search
    #[arg(short, long, default_value = "")]
    query: String,

    /// Status filter value ("All Status" disables it)
    #[arg(short, long, default_value = "All Status")]
    status: String,

    /// Sort as <field.path>[:asc|desc]
    #[arg(long)]
    sort: Option<String>,

    /// Time range: month, quarter, year, all, or START..END
    #[arg(long)]
    range: Option<String>,

    /// 1-based page number for --format page
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Treat a missing input file as an empty list
    #[arg(long)]
    missing_ok: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).map_err(|e| {
            eprintln!("{}", e.to_details());
            anyhow::anyhow!(e)
        }),
        None => Ok(Config::default()),
    }
}

fn build_filter(args: &Args, config: &Config) -> Result<FilterState> {
    let mut filter = FilterState::new(args.query.clone(), args.status.clone());

    if let Some(sort) = &args.sort {
        filter = filter.with_sort(SortSpec::parse(sort)?);
    }

    let time = match &args.range {
        Some(range) => TimeContext::parse(range)?,
        None => TimeContext::new(config.time_range.default_range),
    };
    filter = filter.with_time(time.with_fiscal_year_start(config.time_range.fiscal_year_start));

    Ok(filter)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let input = args.input.clone().context("--input is required")?;
    let source = FileSource::new(&input).missing_ok(args.missing_ok);
    let filter = build_filter(&args, &config)?;
    let engine = ViewEngine::from_config(&config);

    let rt = Runtime::new()?;
    let rows = rt.block_on(source.load()).map_err(|e| {
        let context = ErrorContext::new("load_collection".to_string())
            .with_source(input.display().to_string());
        DefaultErrorLogger.log_error(&e, &context);
        anyhow::anyhow!(e)
    })?;

    let view = engine.compute(&rows, &filter);
    log::info!(
        "{} of {} records visible ({})",
        view.total_count,
        rows.len(),
        filter.time.as_ref().map(|t| t.description()).unwrap_or_default()
    );

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Page => {
            let page = view.page(args.page, config.pagination.records_per_page);
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        OutputFormat::Csv => {
            let payload = Exporter::from_config(&config)
                .export(&view.visible_rows)
                .context("failed to build CSV export")?;
            let today = Local::now().format("%Y-%m-%d").to_string();
            log::info!(
                "export ready: {} ({})",
                config.export_file_name(&today).display(),
                CSV_MIME_TYPE
            );
            println!("{}", payload);
        }
    }

    Ok(())
}
