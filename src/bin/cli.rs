//! NtM Checker CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use ntm_checker::{
    error::{AppError, Result},
    models::{CheckReport, Config, Folio, WeekInfo},
    pipeline::{CheckService, render_summary},
    services::{JsonLayoutFile, RegionService},
};

/// ntm-checker - weekly Notices to Mariners against your chart folio
#[derive(Parser, Debug)]
#[command(
    name = "ntm-checker",
    version,
    about = "Checks weekly Notices to Mariners against a chart folio"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a published week against the folio
    Check {
        /// Comma-separated chart numbers (default: built-in folio)
        #[arg(long)]
        charts: Option<String>,

        /// Year of a past week
        #[arg(long, requires = "week")]
        year: Option<i32>,

        /// Past week number
        #[arg(long, requires = "year")]
        week: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check local bulletin files against the folio
    Scan {
        /// Section II file
        #[arg(long)]
        section_ii: Option<PathBuf>,

        /// Weekly bulletin file
        #[arg(long)]
        weekly: Option<PathBuf>,

        /// Comma-separated chart numbers (default: built-in folio)
        #[arg(long)]
        charts: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the weeks the site offers
    Weeks,

    /// Crop window of a correction on a document page
    Locate {
        /// Page layout dump (JSON)
        #[arg(long)]
        layout: PathBuf,

        /// Document URL
        #[arg(long)]
        url: String,

        /// 1-based page number
        #[arg(long)]
        page: usize,

        /// Chart or panel, e.g. 1491 or 5614_4
        #[arg(long)]
        chart: String,

        /// Notice number
        #[arg(long)]
        nm: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging. `RUST_LOG` wins; otherwise the level is applied
/// once the configuration is known.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .format_timestamp_secs()
        .init();
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(LevelFilter::Info);
    }
}

/// Apply `--verbose` or the configured level when `RUST_LOG` is unset.
fn apply_log_level(verbose: bool, configured: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let level = if verbose {
        LevelFilter::Debug
    } else {
        configured.parse().unwrap_or(LevelFilter::Info)
    };
    log::set_max_level(level);
}

fn parse_folio(charts: Option<&str>, max_charts: usize) -> Result<Folio> {
    match charts {
        Some(list) => Folio::from_values(list.split(','), max_charts),
        None => Ok(Folio::default()),
    }
}

fn print_report(report: &CheckReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_summary(report));
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::load_or_default(&cli.config);
    apply_log_level(cli.verbose, &config.logging.level);
    log::info!("Using configuration from {}", cli.config.display());
    let config = Arc::new(config);

    match cli.command {
        Command::Check {
            charts,
            year,
            week,
            json,
        } => {
            let folio = parse_folio(charts.as_deref(), config.check.max_charts)?;
            let week = year.zip(week).map(|(year, week)| WeekInfo { year, week });

            let service = CheckService::from_config(Arc::clone(&config))?;
            let report = service.run(&folio, week).await?;
            print_report(&report, json)?;
        }

        Command::Scan {
            section_ii,
            weekly,
            charts,
            json,
        } => {
            if section_ii.is_none() && weekly.is_none() {
                return Err(AppError::validation(
                    "Give --section-ii, --weekly, or both",
                ));
            }
            let folio = parse_folio(charts.as_deref(), config.check.max_charts)?;

            let service = CheckService::from_config(Arc::clone(&config))?;
            let report = service
                .scan_files(section_ii.as_deref(), weekly.as_deref(), &folio)
                .await?;
            print_report(&report, json)?;
        }

        Command::Weeks => {
            let service = CheckService::from_config(Arc::clone(&config))?;
            let weeks = service.pages().available_weeks().await?;
            log::info!("{} weeks available", weeks.len());
            for week in weeks {
                println!("{week}");
            }
        }

        Command::Locate {
            layout,
            url,
            page,
            chart,
            nm,
        } => {
            let layouts = JsonLayoutFile::load(&layout)?;
            let region = RegionService::new(
                Arc::new(layouts),
                &config.source.allowed_host,
                &config.check,
            );
            let decision = region.crop_window(&url, page, &chart, &nm).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = Config::load(&cli.config).map_err(|e| {
                log::error!("Config could not be read: {}", e);
                AppError::config(format!("{}: {e}", cli.config.display()))
            })?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({})", config.source.weekly_url());

            if let Some(path) = &config.catalog.path {
                let catalog = ntm_checker::models::ChartCatalog::load(path)?;
                log::info!("✓ Chart catalog OK ({} names)", catalog.len());
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
