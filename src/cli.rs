use crate::utils::Result;
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="gapcon",
          version=&**FULL_VERSION,
          about="Resolve ambiguous scaffold gaps by aligning candidate contig paths",
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) {}. This program comes with ABSOLUTELY NO WARRANTY.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Fill scaffold gaps with consensus contigs")]
    Resolve(ResolveArgs),
    #[clap(about = "Check that graph, contigs and paths agree")]
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("resolve")))]
#[command(arg_required_else_help(true))]
pub struct ResolveArgs {
    #[clap(required = true)]
    #[clap(short = 'f')]
    #[clap(long = "contigs")]
    #[clap(help = "Contig sequences (FASTA, optionally gzipped)")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub contigs_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'j')]
    #[clap(long = "graph")]
    #[clap(help = "Contig adjacency graph (DOT)")]
    #[clap(value_name = "DOT")]
    #[arg(value_parser = check_file_exists)]
    pub graph_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "paths")]
    #[clap(help = "Scaffold paths, one 'LABEL NODE...' per line")]
    #[clap(value_name = "PATHS")]
    #[arg(value_parser = check_file_exists)]
    pub paths_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(required = true)]
    #[clap(short = 'k')]
    #[clap(long = "kmer")]
    #[clap(help = "k-mer size of the assembly")]
    #[clap(value_name = "K")]
    #[arg(value_parser = kmer_in_range)]
    pub kmer: u32,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(long = "write-graph")]
    #[clap(help = "Also write the graph with the new contigs to OUTPUT_PREFIX.dot")]
    pub write_graph: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(short = 'd')]
    #[clap(long = "dist-error")]
    #[clap(value_name = "N")]
    #[clap(help = "Allowed excess of a candidate path over the gap size")]
    #[clap(default_value = "6")]
    pub dist_error: u32,

    #[clap(help_heading("Advanced"))]
    #[clap(short = 'b')]
    #[clap(long = "branches")]
    #[clap(value_name = "N")]
    #[clap(help = "Maximum number of candidate paths to align")]
    #[clap(default_value = "4")]
    pub branches: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "identity")]
    #[clap(value_name = "FRAC")]
    #[clap(help = "Minimum identity of candidate paths to merge them")]
    #[clap(default_value = "0.9")]
    #[arg(value_parser = ensure_unit_float)]
    pub identity: f32,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-cost")]
    #[clap(value_name = "N")]
    #[clap(help = "Maximum number of vertices visited while searching one gap")]
    #[clap(default_value = "100000")]
    pub max_cost: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("validate")))]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    #[clap(required = true)]
    #[clap(short = 'f')]
    #[clap(long = "contigs")]
    #[clap(help = "Contig sequences (FASTA, optionally gzipped)")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub contigs_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'j')]
    #[clap(long = "graph")]
    #[clap(help = "Contig adjacency graph (DOT)")]
    #[clap(value_name = "DOT")]
    #[arg(value_parser = check_file_exists)]
    pub graph_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "paths")]
    #[clap(help = "Scaffold paths, one 'LABEL NODE...' per line")]
    #[clap(value_name = "PATHS")]
    #[arg(value_parser = check_file_exists)]
    pub paths_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'k')]
    #[clap(long = "kmer")]
    #[clap(help = "k-mer size of the assembly")]
    #[clap(value_name = "K")]
    #[arg(value_parser = kmer_in_range)]
    pub kmer: u32,
}

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
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn kmer_in_range(s: &str) -> Result<u32> {
    let k: u32 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid k-mer size", s))?;
    if k >= 2 {
        Ok(k)
    } else {
        Err("k-mer size must be at least 2".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f32> {
    let value = s
        .parse::<f32>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}
