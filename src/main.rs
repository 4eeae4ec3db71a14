//! Mushaf Verse Markers
//!
//! Locates the end-of-verse marker glyph on each of the 604 mushaf page
//! images, assigns verse identities from the authoritative page→verse
//! mapping, and derives per-line highlight rectangles for every verse.

mod calibration;
mod coords;
mod dataset;
mod detection;
mod fetch;
mod highlight;
mod page;
mod paths;
mod pipeline;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::calibration::{get_config, init_config};
use crate::dataset::csv_reader::read_markers;
use crate::dataset::csv_writer::{write_markers, write_segments};
use crate::dataset::export::export_issues;
use crate::dataset::{MarkerRecord, PageVerses};
use crate::pipeline::{check_images_dir, run_detection, DatasetReport, PageContext, Templates};

const LOG_FILE_NAME: &str = "mushaf_markers.log";

/// Pages whose verse range is logged after `generate` as a sanity check.
const SPOT_CHECK_PAGES: [u16; 5] = [1, 2, 22, 50, 604];

#[derive(Parser)]
#[command(
    name = "mushaf-markers",
    about = "Verse marker detection and highlight geometry for mushaf pages",
    version
)]
struct Cli {
    /// Directory holding templates, images/, the mapping and outputs
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to <root>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the page→verse mapping to page_verses.json
    Fetch,

    /// Detect markers on every page and write data.csv, data_verse.csv and issues.json
    Generate,

    /// Write data_verse.csv, detecting markers or reusing an existing data.csv
    Highlights {
        /// Read marker positions from data.csv instead of the page images
        #[arg(long)]
        from_csv: bool,

        /// Marker dataset used with --from-csv (defaults to <root>/data.csv)
        #[arg(long, requires = "from_csv")]
        markers: Option<PathBuf>,
    },
}

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join(LOG_FILE_NAME);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths::get_logs_dir().join(LOG_FILE_NAME))
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    paths::init_root(&cli.root);
    install_panic_hook();
    paths::ensure_directories().context("Failed to create logs directory")?;

    let config_path = cli.config.unwrap_or_else(paths::get_config_path);
    init_config(&config_path);

    let result = match cli.command {
        Commands::Fetch => fetch::fetch_mapping(&paths::get_page_verses_path()).map(|_| ()),
        Commands::Generate => generate(),
        Commands::Highlights { from_csv, markers } => highlights(from_csv, markers),
    };

    if let Err(e) = &result {
        log(&format!("Error: {:#}", e));
    }
    result
}

/// Loads prerequisites and runs detection over every page.
fn detect_all() -> Result<DatasetReport> {
    paths::check_prerequisites()?;
    let images_dir = paths::get_images_dir();
    check_images_dir(&images_dir)?;

    let templates = Templates::load(
        &paths::get_first_template_path(),
        &paths::get_standard_template_path(),
    )?;
    let mapping = PageVerses::from_json(&paths::get_page_verses_path())?;
    log(&format!(
        "Loaded mapping: {} pages, {} verses",
        mapping.page_count(),
        mapping.total_verses()
    ));

    let config = get_config();
    let ctx = PageContext {
        templates: &templates,
        mapping: &mapping,
        config,
        images_dir,
    };
    Ok(run_detection(&ctx, config.worker_count()))
}

/// Full pipeline over all pages.
fn generate() -> Result<()> {
    let report = detect_all()?;

    let markers_path = paths::get_markers_csv_path();
    write_markers(&markers_path, &report.markers)?;
    log(&format!(
        "Wrote {} markers to {}",
        report.markers.len(),
        markers_path.display()
    ));

    let segments_path = paths::get_segments_csv_path();
    write_segments(&segments_path, &report.segments)?;
    log(&format!(
        "Wrote {} highlight segments to {}",
        report.segments.len(),
        segments_path.display()
    ));

    export_issues(&report.issues, &paths::get_issues_path())?;
    log_issue_summary(&report.issues);

    log("Spot check:");
    for line in page_summary(&report.markers, &SPOT_CHECK_PAGES) {
        log(&line);
    }
    Ok(())
}

/// Writes data_verse.csv, from data.csv when `from_csv` is set, otherwise
/// from a fresh detection run.
fn highlights(from_csv: bool, markers_path: Option<PathBuf>) -> Result<()> {
    let segments = if from_csv {
        let markers_path = markers_path.unwrap_or_else(paths::get_markers_csv_path);
        if !markers_path.is_file() {
            return Err(anyhow!(
                "{} not found. Run `generate` first or omit --from-csv.",
                markers_path.display()
            ));
        }
        let markers = read_markers(&markers_path)?;
        log(&format!(
            "Read {} markers from {}",
            markers.len(),
            markers_path.display()
        ));
        highlight::build_segments(&markers)
    } else {
        let report = detect_all()?;
        log_issue_summary(&report.issues);
        report.segments
    };

    let segments_path = paths::get_segments_csv_path();
    write_segments(&segments_path, &segments)?;
    log(&format!(
        "Wrote {} highlight segments to {}",
        segments.len(),
        segments_path.display()
    ));
    Ok(())
}

/// First verse, last verse and verse count for each listed page.
fn page_summary(markers: &[MarkerRecord], pages: &[u16]) -> Vec<String> {
    pages
        .iter()
        .filter_map(|&number| {
            let on_page: Vec<&MarkerRecord> = markers
                .iter()
                .filter(|m| m.page.number() == number)
                .collect();
            let (first, last) = (on_page.first()?, on_page.last()?);
            Some(format!(
                "  Page {}: {} - {} ({} verses)",
                number,
                first.verse,
                last.verse,
                on_page.len()
            ))
        })
        .collect()
}

fn log_issue_summary(issues: &[dataset::DetectionIssue]) {
    if issues.is_empty() {
        return;
    }
    let shown: Vec<String> = issues
        .iter()
        .take(5)
        .map(|i| format!("p{} ({}/{})", i.page, i.detected, i.expected))
        .collect();
    let more = issues.len().saturating_sub(shown.len());
    let suffix = if more > 0 {
        format!(" and {} more", more)
    } else {
        String::new()
    };
    log(&format!(
        "Pages needing review: {}{}",
        shown.join(", "),
        suffix
    ));
}
