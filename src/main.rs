use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mimic_lib::config::{CliOverrides, MimicConfig, APP_NAME, APP_VERSION};
use mimic_lib::corpus::clear_cache;
use mimic_lib::hospital::AdmissionWriteOptions;
use mimic_lib::models::enums::NoteFormat;
use mimic_lib::Corpus;

#[derive(Parser)]
#[command(name = APP_NAME, version = APP_VERSION, about = "MIMIC-III admissions and clinical notes")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// MIMIC-III SQLite database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Parse cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Patient, admission and note counts
    Stats,
    /// Print a hospital admission
    Admission {
        hadm_id: i64,
        /// Include admission, patient, codes and note text
        #[arg(long)]
        full: bool,
        #[arg(long)]
        note_limit: Option<usize>,
    },
    /// Print a note
    Note {
        row_id: i64,
        #[arg(short, long, default_value = "text")]
        format: NoteFormat,
        /// Write normalized paragraphs instead of raw section bodies
        #[arg(short, long)]
        normalize: bool,
    },
    /// Print the sections of a note
    Sections { row_id: i64 },
    /// Note counts per admission of a subject
    Counts { subject_id: i64 },
    /// Subjects with the most admissions
    AdmissionCounts {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Note categories; mapped categories are starred
    Categories,
    /// Random admission ids
    Sample {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Parse and cache admissions ahead of time
    Preempt {
        #[arg(required = true)]
        hadm_ids: Vec<i64>,
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Write each note of an admission to a file
    Export {
        hadm_id: i64,
        #[arg(short, long, default_value = "text")]
        format: NoteFormat,
        #[arg(short, long)]
        normalize: bool,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Remove cached admissions and notes
    Clear {
        /// Keep cached notes
        #[arg(long, conflicts_with = "notes_only")]
        admissions_only: bool,
        /// Keep cached admissions
        #[arg(long)]
        notes_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    mimic_lib::init_tracing(cli.verbose);

    let workers = match &cli.command {
        Command::Preempt { workers, .. } => *workers,
        _ => None,
    };
    let overrides = CliOverrides {
        db_path: cli.db.clone(),
        cache_dir: cli.cache_dir.clone(),
        workers,
    };
    let config = MimicConfig::load(cli.config.as_deref(), Some(&overrides)).context("Could not load configuration")?;
    tracing::debug!(version = APP_VERSION, "Starting {APP_NAME}");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    // Clearing only touches the cache directory.
    if let Command::Clear {
        admissions_only,
        notes_only,
    } = cli.command
    {
        let cache_dir = config.cache_dir();
        clear_cache(&cache_dir, !notes_only, !admissions_only).context("Could not clear cache")?;
        writeln!(out, "cleared: {}", cache_dir.display())?;
        out.flush()?;
        return Ok(());
    }

    let corpus = Corpus::open(&config).context("Could not open corpus")?;
    match cli.command {
        Command::Stats => corpus.write_stats(&mut out)?,
        Command::Admission {
            hadm_id,
            full,
            note_limit,
        } => {
            let base = if full {
                AdmissionWriteOptions::full()
            } else {
                AdmissionWriteOptions::default()
            };
            let opts = AdmissionWriteOptions { note_limit, ..base };
            corpus.write_admission(hadm_id, &mut out, &opts)?;
        }
        Command::Note {
            row_id,
            format,
            normalize,
        } => corpus.write_note(row_id, format, normalize, &mut out)?,
        Command::Sections { row_id } => corpus.write_sections(row_id, &mut out)?,
        Command::Counts { subject_id } => corpus.write_note_counts(subject_id, &mut out)?,
        Command::AdmissionCounts { limit } => corpus.write_admission_counts(limit, &mut out)?,
        Command::Categories => corpus.write_categories(&mut out)?,
        Command::Sample { limit } => {
            for hadm_id in corpus.sample(limit)? {
                writeln!(out, "{hadm_id}")?;
            }
        }
        Command::Preempt { hadm_ids, .. } => {
            let report = corpus.preempt(&hadm_ids, None)?;
            writeln!(
                out,
                "requested: {}, cached: {}, processed: {}, missing: {}, failed: {}",
                report.requested, report.cached, report.processed, report.missing, report.failed
            )?;
        }
        Command::Export {
            hadm_id,
            format,
            normalize,
            output,
        } => {
            for path in corpus.export_admission(hadm_id, format, normalize, &output)? {
                writeln!(out, "wrote: {}", path.display())?;
            }
        }
        Command::Clear { .. } => {}
    }
    out.flush()?;
    Ok(())
}
