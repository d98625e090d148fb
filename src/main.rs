mod config;
mod error;
mod fetcher;
mod listing;
mod parser;
mod record;
mod runner;
mod table;

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Settings;
use crate::fetcher::{Fetch, HttpFetcher};
use crate::record::{ReportId, REPORT_NUMBER_LABEL};
use crate::runner::Runner;
use crate::table::Table;

#[derive(Parser)]
#[command(name = "uac_scraper", about = "Utah Avalanche Center incident report scraper")]
struct Cli {
    /// Settings file (default: ./uac.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every listing page and write the dataset and failure lists
    Run {
        /// Listing pages to scan, first page included
        #[arg(short = 'n', long)]
        pages: Option<u32>,
        /// Pause after every request, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Directory for avy_data.csv, mismatched.csv and unreachable.csv
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Fetch one report and print its extracted fields
    Report {
        /// Five-digit report number
        id: String,
    },
    /// Fetch one listing page and print the report numbers on it
    Listing {
        /// 0 is the unindexed first page
        #[arg(default_value = "0")]
        page: u32,
    },
    /// Summarize a previously written dataset
    Stats {
        #[arg(default_value = "avy_data.csv")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Run {
            pages,
            delay_ms,
            out_dir,
        } => {
            if let Some(n) = pages {
                settings.pages = n;
            }
            if let Some(ms) = delay_ms {
                settings.delay_ms = ms;
            }
            if let Some(dir) = out_dir {
                settings.out_dir = dir;
            }
            settings.validate()?;

            let cancel = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancel);
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if interrupt(&flag) {
                        warn!("Second interrupt, exiting without saving");
                        std::process::exit(130);
                    }
                    warn!("Interrupt received, finishing current report (Ctrl-C again to abort)");
                }
            });

            let out_dir = settings.out_dir.clone();
            info!(
                pages = settings.pages,
                delay_ms = settings.delay_ms,
                "Scraping {}",
                settings.base_url
            );
            let job = Runner::new(HttpFetcher::new(&settings)?, settings, cancel);
            let outcome = job.run().await;

            runner::persist(&outcome, &out_dir)?;
            println!(
                "Saved {} reports, {} mismatched, {} unreachable ({} pages{}).",
                outcome.table.len(),
                outcome.failures.mismatched.len(),
                outcome.failures.unreachable.len(),
                outcome.pages_done,
                if outcome.interrupted { ", interrupted" } else { "" }
            );

            match outcome.fatal {
                Some(e) => Err(e.into()),
                None => Ok(()),
            }
        }
        Commands::Report { id } => {
            settings.validate()?;
            let Some(id) = ReportId::parse(&id) else {
                bail!("report number must be five digits, got {:?}", id);
            };
            let fetcher = HttpFetcher::new(&settings)?;
            let html = fetcher
                .fetch(&listing::report_url(&settings, &id))
                .await
                .with_context(|| format!("Failed to fetch report {}", id))?;

            match parser::extract_report(&id, &html) {
                Ok(record) => {
                    println!("Report {}\n", record.id());
                    let width = record.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
                    for (label, value) in record.iter() {
                        println!("{:<width$} | {}", label, value, width = width);
                    }
                    Ok(())
                }
                Err(e) => Err(anyhow::Error::new(e).context(format!("Report {} not extractable", id))),
            }
        }
        Commands::Listing { page } => {
            settings.validate()?;
            let fetcher = HttpFetcher::new(&settings)?;
            let url = listing::listing_url(&settings, page);
            let html = fetcher
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;

            let ids = listing::report_ids(&html);
            for id in &ids {
                println!("{}", id);
            }
            println!("\n{} reports on page {}", ids.len(), page);
            Ok(())
        }
        Commands::Stats { path } => {
            let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
            let table = Table::read_csv(file)?;
            print_stats(&table);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Raises the cancel flag. True when it was already raised.
fn interrupt(flag: &AtomicBool) -> bool {
    flag.swap(true, Ordering::SeqCst)
}

fn print_stats(table: &Table) {
    println!("Rows:    {}", table.len());
    println!("Columns: {}", table.columns().len());
    if table.columns().is_empty() {
        return;
    }
    if let (Some(first), Some(last)) = (
        table.cell(0, REPORT_NUMBER_LABEL),
        table.cell(table.len().saturating_sub(1), REPORT_NUMBER_LABEL),
    ) {
        println!("Reports: {} .. {}", first, last);
    }

    let mut filled = vec![0usize; table.columns().len()];
    for row in table.rows() {
        for (i, cell) in row.iter().enumerate() {
            if cell.is_some() {
                filled[i] += 1;
            }
        }
    }

    println!();
    println!("{:<32} | {:>6} | {:>5}", "Column", "Filled", "%");
    println!("{}", "-".repeat(50));
    for (name, n) in table.columns().iter().zip(&filled) {
        let pct = if table.is_empty() {
            0.0
        } else {
            *n as f64 * 100.0 / table.len() as f64
        };
        println!("{:<32} | {:>6} | {:>5.1}", truncate(name, 32), n, pct);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
