use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::RunError;
use crate::fetcher::Fetch;
use crate::listing::{self, listing_url, report_url};
use crate::parser;
use crate::record::{ReportId, REPORT_NUMBER_LABEL};
use crate::table::Table;

pub const DATASET_FILE: &str = "avy_data.csv";
pub const MISMATCHED_FILE: &str = "mismatched.csv";
pub const UNREACHABLE_FILE: &str = "unreachable.csv";

/// Reports that never made it into the table, in the order they failed.
#[derive(Debug, Default)]
pub struct FailureSets {
    /// Fetch failed: HTTP error status, transport error or timeout.
    pub unreachable: Vec<ReportId>,
    /// Fetched but not extractable.
    pub mismatched: Vec<ReportId>,
}

fn record_once(set: &mut Vec<ReportId>, id: &ReportId) {
    if !set.contains(id) {
        set.push(id.clone());
    }
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub table: Table,
    pub failures: FailureSets,
    pub pages_done: u32,
    pub interrupted: bool,
    /// Set when the run stopped early; whatever was gathered is still kept.
    pub fatal: Option<RunError>,
}

/// Walks listing pages in order, one request at a time.
pub struct Runner<F> {
    fetcher: F,
    settings: Settings,
    cancel: Arc<AtomicBool>,
}

impl<F: Fetch> Runner<F> {
    pub fn new(fetcher: F, settings: Settings, cancel: Arc<AtomicBool>) -> Self {
        Self {
            fetcher,
            settings,
            cancel,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if self.settings.delay_ms > 0 {
            tokio::time::sleep(self.settings.delay()).await;
        }
    }

    pub async fn run(&self) -> RunOutcome {
        let pages = self.settings.pages;
        let mut out = RunOutcome::default();

        let pb = ProgressBar::new(pages as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} page {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        'pages: for page in 0..pages {
            if self.cancelled() {
                out.interrupted = true;
                break;
            }

            let url = listing_url(&self.settings, page);
            let fetched = self.fetcher.fetch(&url).await;
            self.pause().await;
            let html = match fetched {
                Ok(html) => html,
                Err(e) => {
                    warn!(page, "Listing page unreachable: {}", e);
                    out.fatal = Some(RunError::ListingUnreachable { page, source: e });
                    break;
                }
            };

            let ids = listing::report_ids(&html);
            if ids.is_empty() && page + 1 < pages {
                warn!(page, "No reports on listing page {} of {}", page + 1, pages);
            }

            for (n, id) in ids.iter().enumerate() {
                if self.cancelled() {
                    out.interrupted = true;
                    break 'pages;
                }
                self.process_report(id, &mut out).await;

                if n % self.settings.progress_every.max(1) == 0 {
                    info!(
                        page,
                        report = n,
                        rows = out.table.len(),
                        "Processed report {}",
                        id
                    );
                }
            }

            out.pages_done += 1;
            pb.inc(1);
            pb.set_message(format!(
                "{} rows, {} mismatched, {} unreachable",
                out.table.len(),
                out.failures.mismatched.len(),
                out.failures.unreachable.len()
            ));
        }

        pb.finish_and_clear();
        if out.interrupted {
            warn!(pages_done = out.pages_done, "Run interrupted");
        }
        info!(
            "Collected {} reports ({} mismatched, {} unreachable) from {} pages",
            out.table.len(),
            out.failures.mismatched.len(),
            out.failures.unreachable.len(),
            out.pages_done
        );

        out
    }

    /// Fetch → extract → accumulate for one report. Failures land in `out.failures`.
    async fn process_report(&self, id: &ReportId, out: &mut RunOutcome) {
        let url = report_url(&self.settings, id);
        let fetched = self.fetcher.fetch(&url).await;
        self.pause().await;

        let html = match fetched {
            Ok(html) => html,
            Err(e) => {
                warn!(report = %id, "Unreachable: {}", e);
                record_once(&mut out.failures.unreachable, id);
                return;
            }
        };

        match parser::extract_report(id, &html) {
            Ok(record) => out.table.push(&record),
            Err(e) => {
                warn!(report = %id, "Mismatched: {}", e);
                record_once(&mut out.failures.mismatched, id);
            }
        }
    }
}

/// Files written by [`persist`], in the order written.
pub fn output_paths(dir: &Path) -> [PathBuf; 3] {
    [
        dir.join(DATASET_FILE),
        dir.join(MISMATCHED_FILE),
        dir.join(UNREACHABLE_FILE),
    ]
}

/// Writes the dataset and both failure lists into `dir`.
pub fn persist(outcome: &RunOutcome, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
    let [dataset, mismatched, unreachable] = output_paths(dir);

    outcome
        .table
        .write_csv(create(&dataset)?)
        .with_context(|| format!("Failed to write {}", dataset.display()))?;
    write_ids(&outcome.failures.mismatched, create(&mismatched)?)
        .with_context(|| format!("Failed to write {}", mismatched.display()))?;
    write_ids(&outcome.failures.unreachable, create(&unreachable)?)
        .with_context(|| format!("Failed to write {}", unreachable.display()))?;

    info!(
        "Wrote {} rows to {}, {} mismatched, {} unreachable",
        outcome.table.len(),
        dataset.display(),
        outcome.failures.mismatched.len(),
        outcome.failures.unreachable.len()
    );
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_ids<W: Write>(ids: &[ReportId], w: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(w);
    out.write_record(["", REPORT_NUMBER_LABEL])?;
    for (i, id) in ids.iter().enumerate() {
        out.write_record([i.to_string().as_str(), id.as_str()])?;
    }
    out.flush()?;
    Ok(())
}

// ── Tests ──
