use crate::constants::*;
use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| env!("CARGO_PKG_VERSION").to_string());

#[derive(Parser, Debug)]
#[command(name="svlink",
          version=&**FULL_VERSION,
          about="Provenance-based matching and merging of structural variant calls",
          long_about = None,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look for variants sharing the same original call between two VCF files
    Overlap(OverlapArgs),
    /// Cluster and merge provenance-linked calls from a sorted stream
    Merge(MergeArgs),
    /// Add allele frequency information to a VCF file
    Frequency(FrequencyArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Overlap(_) => "overlap",
            Command::Merge(_) => "merge",
            Command::Frequency(_) => "frequency",
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct OverlapArgs {
    /// VCF file containing variants to be output [default: stdin]
    #[arg(
        short = 'i',
        long = "input",
        value_name = "VCF",
        value_parser = check_file_exists
    )]
    pub input: Option<PathBuf>,

    /// VCF file containing variants used to determine if a site should be output
    #[arg(
        short = 'f',
        long = "filter",
        value_name = "VCF",
        value_parser = check_file_exists
    )]
    pub filter: PathBuf,

    /// Write output to a file [default: standard output]
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub output: Option<String>,

    /// Return the complement of the overlap
    #[arg(short = 'c', long = "complement", default_value_t = DEFAULT_COMPLEMENT)]
    pub complement: bool,

    /// INFO tag holding the comma-separated origin identifiers
    #[arg(
        long = "provenance-tag",
        value_name = "TAG",
        default_value = PROVENANCE_TAG,
        help_heading = "Advanced"
    )]
    pub provenance_tag: String,
}

#[derive(Parser, Debug, Clone)]
pub struct MergeArgs {
    /// Sorted VCF/BEDPE file to merge [default: stdin]
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        value_parser = check_file_exists
    )]
    pub input: Option<PathBuf>,

    /// Write output to a file [default: standard output]
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub output: Option<String>,

    /// Treat the input as BEDPE instead of VCF
    #[arg(long = "bedpe")]
    pub bedpe: bool,

    #[command(flatten)]
    pub merge_args: MergeArgsInner,
}

#[derive(Parser, Debug, Clone)]
pub struct MergeArgsInner {
    /// Maximum distance for clustering variants
    #[arg(
        short = 'w',
        long = "window",
        value_name = "WINDOW",
        default_value_t = DEFAULT_WINDOW
    )]
    pub window: i64,

    /// Distance tolerance when comparing breakend positions (0 requires exact equality)
    #[arg(
        long = "slop",
        value_name = "SLOP",
        default_value_t = DEFAULT_SLOP,
        value_parser = slop_in_range
    )]
    pub slop: f64,

    /// INFO tag holding the comma-separated origin identifiers
    #[arg(
        long = "provenance-tag",
        value_name = "TAG",
        default_value = PROVENANCE_TAG,
        help_heading = "Advanced"
    )]
    pub provenance_tag: String,

    /// Use the highest-QUAL cluster member as the merge template instead of the first
    #[arg(
        long = "use-max-qual",
        default_value_t = DEFAULT_USE_MAX_QUAL,
        help_heading = "Advanced"
    )]
    pub use_max_qual: bool,

    /// Caller-specific INFO tags to remove from merged records
    #[arg(
        long = "drop-tags",
        value_name = "TAGS",
        value_delimiter = ',',
        help_heading = "Advanced"
    )]
    pub drop_tags: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct FrequencyArgs {
    /// VCF input [default: stdin]
    #[arg(value_name = "VCF", value_parser = check_file_exists)]
    pub input: Option<PathBuf>,

    /// Write output to a file [default: standard output]
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub output: Option<String>,
}

/// Initializes the verbosity level for logging based on the command-line arguments.
///
/// Sets up the logger with a specific verbosity level that is determined
/// by the number of occurrences of the `-v` or `--verbose` flag in the command-line arguments.
pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.module_path().unwrap_or("unknown_module"),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

/// Checks if the provided file path exists, `-` meaning stdin.
fn check_file_exists(s: &str) -> anyhow::Result<PathBuf> {
    let path = Path::new(s);
    if s != "-" && !path.exists() {
        return Err(anyhow!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> anyhow::Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(anyhow!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn slop_in_range(s: &str) -> anyhow::Result<f64> {
    let slop: f64 = s
        .parse::<f64>()
        .map_err(|_| anyhow!("`{}` is not a valid slop distance", s))?;
    if slop < 0.0 {
        return Err(anyhow!("slop must be >= 0"));
    }
    Ok(slop)
}
