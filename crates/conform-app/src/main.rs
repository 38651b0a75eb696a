//! Autoconform - command-line front-end
//!
//! Thin binary over the library crates: parse arguments, initialize
//! tracing, run one operation. All conform logic lives in the libraries so
//! panel front-ends can drive the same code paths.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conform_core::{FrameRate, JobConfig};
use conform_db::{
    compare, max_source_ranges, render_table, restore_shots, EditDatabase, EditSelection,
};
use conform_edl::{EdlParser, EdlWriter};
use conform_engine::ConformJob;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autoconform", version, about = "Rebuild an edit from an EDL and delivered media")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a conform job from a JSON config file.
    Conform {
        /// Path to the job config (JSON).
        config: PathBuf,
        /// Override the EDL path from the config.
        #[arg(long)]
        edl: Option<PathBuf>,
        /// Override the media root from the config.
        #[arg(long)]
        shots: Option<PathBuf>,
        /// Override the output OTIO path from the config.
        #[arg(long)]
        otio: Option<PathBuf>,
    },
    /// Parse an EDL into the edit database.
    Ingest {
        #[command(flatten)]
        db: DbArgs,
        /// Edit name to file the records under.
        edit: String,
        /// EDL file to parse.
        edl: PathBuf,
        /// Mark the ingested records as the actual (current) edit.
        #[arg(long)]
        actual: bool,
    },
    /// Compare two edits and print the category table.
    Compare {
        #[command(flatten)]
        db: DbArgs,
        /// Base edit name, or "actual".
        base: String,
        /// Target edit name, or "actual".
        target: String,
        /// Write per-category EDL fragments into this directory.
        #[arg(long)]
        fragments: Option<PathBuf>,
    },
    /// Restamp a raw EDL with shot names from a stored edit.
    Restore {
        #[command(flatten)]
        db: DbArgs,
        /// Base edit name, or "actual".
        base: String,
        /// Raw EDL to restamp.
        edl: PathBuf,
        /// Where the restamped EDL is written; a marker file lands next to it.
        out: PathBuf,
    },
    /// Widest source range per shot across several edits.
    MaxRange {
        #[command(flatten)]
        db: DbArgs,
        /// Base edit name.
        base: String,
        /// Edits to widen against.
        comparisons: Vec<String>,
        /// Where the max-range EDL is written.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(clap::Args)]
struct DbArgs {
    /// Edit database file.
    #[arg(long)]
    db: PathBuf,
    /// Project name within the database.
    #[arg(long)]
    project: String,
    /// Project frame rate (integer fps).
    #[arg(long, default_value_t = 24)]
    fps: u32,
}

impl DbArgs {
    fn rate(&self) -> Result<FrameRate> {
        FrameRate::new(self.fps).context("invalid frame rate")
    }

    fn open(&self) -> Result<EditDatabase> {
        EditDatabase::open(&self.db)
            .with_context(|| format!("cannot open database {}", self.db.display()))
    }
}

fn selection(name: &str) -> EditSelection {
    if name.eq_ignore_ascii_case("actual") {
        EditSelection::Actual
    } else {
        EditSelection::Edit(name.to_string())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Command::Conform {
            config,
            edl,
            shots,
            otio,
        } => run_conform(&config, edl, shots, otio),
        Command::Ingest {
            db,
            edit,
            edl,
            actual,
        } => run_ingest(&db, &edit, &edl, actual),
        Command::Compare {
            db,
            base,
            target,
            fragments,
        } => run_compare(&db, &base, &target, fragments),
        Command::Restore { db, base, edl, out } => run_restore(&db, &base, &edl, &out),
        Command::MaxRange {
            db,
            base,
            comparisons,
            out,
        } => run_max_range(&db, &base, &comparisons, &out),
    }
}

fn run_conform(
    config: &PathBuf,
    edl: Option<PathBuf>,
    shots: Option<PathBuf>,
    otio: Option<PathBuf>,
) -> Result<()> {
    let mut config = JobConfig::load(config)
        .with_context(|| format!("cannot load job config {}", config.display()))?;
    if let Some(edl) = edl {
        config.edl_path = edl;
    }
    if let Some(shots) = shots {
        config.shots_folder = shots;
    }
    if let Some(otio) = otio {
        config.otio_path = otio;
    }
    config.validate()?;

    let handle = ConformJob::new(config).spawn();
    for tick in handle.progress().iter() {
        info!("[{}/{}] {}", tick.done, tick.total, tick.shot);
    }
    for warning in handle.warnings().try_iter() {
        warn!("{warning}");
    }
    let summary = handle.wait()?;
    info!(
        "placed {} clips ({} records skipped) -> {}",
        summary.clips_placed,
        summary.records_skipped,
        summary.otio_path.display()
    );
    Ok(())
}

fn run_ingest(db_args: &DbArgs, edit: &str, edl: &PathBuf, actual: bool) -> Result<()> {
    let rate = db_args.rate()?;
    let records = EdlParser::new(rate).parse_file(edl)?;
    let mut db = db_args.open()?;
    db.ingest_records(&db_args.project, edit, &records, actual);
    db.save()?;
    info!("ingested {} records into {}/{edit}", records.len(), db_args.project);
    Ok(())
}

fn run_compare(
    db_args: &DbArgs,
    base: &str,
    target: &str,
    fragments: Option<PathBuf>,
) -> Result<()> {
    let rate = db_args.rate()?;
    let db = db_args.open()?;
    let outcome = compare(&db, &db_args.project, &selection(base), &selection(target), rate)?;
    print!("{}", render_table(&outcome));

    if let Some(dir) = fragments {
        std::fs::create_dir_all(&dir)?;
        for (category, records) in &outcome.fragments {
            if records.is_empty() {
                continue;
            }
            let name = category.label().to_lowercase().replace(' ', "_");
            let path = dir.join(format!("{name}.edl"));
            EdlWriter::with_title(category.label()).write_file(&path, records)?;
            info!("wrote {} records to {}", records.len(), path.display());
        }
    }
    Ok(())
}

fn run_restore(db_args: &DbArgs, base: &str, edl: &PathBuf, out: &PathBuf) -> Result<()> {
    let rate = db_args.rate()?;
    let db = db_args.open()?;
    let target = EdlParser::new(rate).parse_file(edl)?;
    let outcome = restore_shots(&db, &db_args.project, &selection(base), &target, rate);

    EdlWriter::new().write_file(out, &outcome.records)?;
    let marker_path = out.with_extension("markers.txt");
    outcome.write_marker_file(&marker_path)?;
    info!(
        "restored {} of {} records -> {}",
        outcome.markers.len(),
        outcome.records.len(),
        out.display()
    );
    Ok(())
}

fn run_max_range(db_args: &DbArgs, base: &str, comparisons: &[String], out: &PathBuf) -> Result<()> {
    let rate = db_args.rate()?;
    let db = db_args.open()?;
    let names: Vec<&str> = comparisons.iter().map(String::as_str).collect();
    let records = max_source_ranges(&db, &db_args.project, base, &names, rate);
    EdlWriter::with_title("max source ranges").write_file(out, &records)?;
    info!("wrote {} max-range records to {}", records.len(), out.display());
    Ok(())
}
