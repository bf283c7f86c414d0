use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use phplens_logs::{
    EntryFilter, FileCache, FilterPresets, LogEntry, LogReader, ReadError, ReadPage, ReadRequest,
    SeverityCounts,
};

mod config;
mod output;

use config::Config;
use output::{TailOutput, format_counts, format_entry};

/// phplens - read the most recent entries of PHP error logs
#[derive(Parser, Debug)]
#[command(name = "phplens")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/phplens/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the most recent entries of a log, newest first
    Tail {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of entries (defaults to `default_entries` from the config)
        #[arg(short = 'n', long)]
        entries: Option<usize>,

        /// Hide a severity; repeatable
        #[arg(long, value_name = "SEV")]
        disable: Vec<String>,

        /// Keep entries whose message or file matches
        #[arg(long, value_name = "REGEX")]
        grep: Option<String>,

        /// Match --grep case-insensitively
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Keep entries that do not match --grep
        #[arg(long, requires = "grep")]
        invert: bool,

        /// Start from a predefined severity filter
        #[arg(long, value_enum)]
        preset: Option<Preset>,

        /// Stop at the most recent matching entry
        #[arg(long)]
        first_only: bool,

        /// Continue an earlier read from its resume offset
        #[arg(long, value_name = "N")]
        offset: Option<u64>,

        /// Copy the raw lines of shown entries to a file
        #[arg(long, value_name = "PATH")]
        mirror: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        /// Print per-severity counts of the result
        #[arg(long)]
        stats: bool,
    },

    /// Count entries newer than the last mark
    New {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Record the newest entry as seen
        #[arg(long)]
        mark: bool,

        /// Stop counting after this many entries
        #[arg(long, default_value = "1000")]
        limit: usize,
    },

    /// Drop all but the last N entries of a log
    Truncate {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Entries to keep
        #[arg(long, default_value = "0")]
        keep: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Preset {
    /// Fatal, parse and plain errors only
    Errors,
    /// Hide notices, deprecations and strict standards
    Quiet,
}

impl Preset {
    fn filter(self) -> EntryFilter {
        match self {
            Self::Errors => FilterPresets::errors_only(),
            Self::Quiet => FilterPresets::quiet(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args);

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let reader = LogReader::new(config.reader_config()?, FileCache::new(config.cache_file()));

    match args.command {
        Command::Tail {
            file,
            entries,
            disable,
            grep,
            ignore_case,
            invert,
            preset,
            first_only,
            offset,
            mirror,
            json,
            stats,
        } => {
            let mut filter = preset
                .map_or_else(EntryFilter::default, Preset::filter)
                .with_pattern(grep.as_deref().unwrap_or_default(), ignore_case)
                .context("invalid --grep pattern")?
                .with_disabled_severities(config.disabled_severities.iter().chain(&disable));
            if invert {
                filter = filter.inverted();
            }

            let mut request =
                ReadRequest::new(entries.unwrap_or(config.default_entries)).with_filter(filter);
            if first_only {
                request = request.first_only();
            }
            if let Some(offset) = offset {
                request = request.starting_at(offset);
            }

            let page = tail(&reader, &file, &request, mirror.as_deref())?;
            let counts = stats.then(|| SeverityCounts::from_entries(&page.entries));

            if json {
                let out = TailOutput {
                    page: &page,
                    stats: counts,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            let tz = reader.config().parser.timezone;
            for entry in &page.entries {
                println!("{}", format_entry(entry, tz));
            }
            if let Some(counts) = &counts {
                println!("{}", format_counts(counts));
            }
            if !page.complete {
                eprintln!("log changed during read; results are partial");
            }
            if let Some(offset) = page.resume_offset {
                eprintln!("older entries: --offset {}", offset);
            }
        }

        Command::New { file, mark, limit } => {
            let count = match reader.new_entries_count(&file, limit) {
                Ok(count) => count,
                Err(err) if is_unavailable(&err) => {
                    let notice = LogEntry::notice(err.to_string());
                    println!("{}", format_entry(&notice, reader.config().parser.timezone));
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            match reader.last_seen(&file) {
                Some(since) => println!("{} new entries since {}", count, since.to_rfc3339()),
                None => println!("{} entries", count),
            }

            if mark {
                let newest = match reader.cached_newest_timestamp(&file) {
                    Some(ts) => Some(ts),
                    None => reader.read_page(&file, &ReadRequest::new(1), None)?.newest_timestamp,
                };
                if let Some(ts) = newest {
                    reader.mark_seen(&file, ts);
                    info!(file = %file.display(), seen = %ts.to_rfc3339(), "marked as seen");
                }
            }
        }

        Command::Truncate { file, keep } => {
            let len = reader
                .truncate(&file, keep)
                .with_context(|| format!("failed to truncate {}", file.display()))?;
            println!("{}: {} bytes", file.display(), len);
        }
    }

    Ok(())
}

/// Read one page, standing in a notice entry for a log that cannot be opened
fn tail(
    reader: &LogReader<FileCache>,
    file: &Path,
    request: &ReadRequest,
    mirror: Option<&Path>,
) -> Result<ReadPage> {
    let mut mirror = match mirror {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create mirror {}", path.display()))?,
        )),
        None => None,
    };

    let result = reader.read_page(file, request, mirror.as_mut().map(|w| w as &mut dyn Write));
    match result {
        Ok(page) => Ok(page),
        Err(err) if is_unavailable(&err) => Ok(ReadPage {
            entries: vec![LogEntry::notice(err.to_string())],
            complete: true,
            ..ReadPage::default()
        }),
        Err(err) => Err(err.into()),
    }
}

fn is_unavailable(err: &ReadError) -> bool {
    matches!(
        err,
        ReadError::FileNotFound(_) | ReadError::FileNotReadable { .. }
    )
}
