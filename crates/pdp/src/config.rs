//! Application configuration from CLI flags and environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use pdp_core::constants::{
    DEFAULT_MAFFT, DEFAULT_MISMATCH_PERCENT, DEFAULT_PRIMERSEARCH, DEFAULT_PRODIGAL,
};

/// pdp: design diagnostic PCR primers that distinguish groups of bacterial genomes.
#[derive(Parser, Debug)]
#[command(name = "pdp", version, about)]
pub struct AppConfig {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Log stage milestones (INFO) instead of warnings only.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write the log to this file.
    #[arg(short, long, global = true, env = "PDP_LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// Do not draw progress bars.
    #[arg(long, global = true, env = "PDP_NO_PROGRESS")]
    pub no_progress: bool,

    /// Print only failures and errors; implies --no-progress.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CommonArgs {
    /// Whether progress bars should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !(self.no_progress || self.quiet)
    }
}

/// Where stage commands run.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulerKind {
    /// Worker pool on this machine.
    #[default]
    Local,
    /// Sun Grid Engine, one blocking submission per task.
    Sge,
}

/// Options for stages that dispatch external commands.
#[derive(Args, Debug, Clone)]
pub struct SchedulerArgs {
    /// Job scheduler.
    #[arg(short, long, value_enum, default_value_t = SchedulerKind::Local, env = "PDP_SCHEDULER")]
    pub scheduler: SchedulerKind,

    /// Maximum concurrent tasks [default: available cores].
    #[arg(short, long, env = "PDP_WORKERS", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// SGE submit program.
    #[arg(long, default_value = "qsub", env = "PDP_SGE_SUBMIT")]
    pub sge_submit: String,

    /// Treat empty output files as incomplete.
    #[arg(long)]
    pub strict_completion: bool,
}

/// Pipeline stages.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a genome collection and list its genomes and groups.
    Config(ConfigArgs),
    /// Call genes on every genome with Prodigal.
    Prodigal(ProdigalArgs),
    /// Screen each genome's primers against every genome with PrimerSearch.
    Primersearch(PrimerSearchArgs),
    /// Extract, align and summarise amplicons for a primer set.
    Extract(ExtractArgs),
    /// Remove primers that repeat an earlier primer pair.
    Dedupe(DedupeArgs),
    /// Print a shell completion script.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Genome collection (JSON).
    pub infile: PathBuf,

    /// Write the validated collection to this path.
    #[arg(long)]
    pub to_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProdigalArgs {
    /// Genome collection (JSON).
    pub infile: PathBuf,

    /// Write the updated collection here instead of over the input.
    pub outfile: Option<PathBuf>,

    /// Directory for gene predictions.
    #[arg(short, long, default_value = "prodigal")]
    pub outdir: PathBuf,

    /// Reuse an existing output directory.
    #[arg(short, long)]
    pub force: bool,

    /// Prodigal executable.
    #[arg(long, default_value = DEFAULT_PRODIGAL, env = "PDP_PRODIGAL")]
    pub prodigal: String,

    #[command(flatten)]
    pub scheduler: SchedulerArgs,
}

#[derive(Args, Debug)]
pub struct PrimerSearchArgs {
    /// Genome collection (JSON).
    pub infile: PathBuf,

    /// Write the updated collection here instead of over the input.
    pub outfile: Option<PathBuf>,

    /// Directory for PrimerSearch reports.
    #[arg(short, long, default_value = "primersearch")]
    pub outdir: PathBuf,

    /// Reuse an existing output directory.
    #[arg(short, long)]
    pub force: bool,

    /// PrimerSearch executable.
    #[arg(long, default_value = DEFAULT_PRIMERSEARCH, env = "PDP_PRIMERSEARCH")]
    pub primersearch: String,

    /// Allowed primer mismatch, in percent.
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_MISMATCH_PERCENT,
        value_parser = clap::value_parser!(u32).range(0..=100)
    )]
    pub mismatchpercent: u32,

    #[command(flatten)]
    pub scheduler: SchedulerArgs,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Genome collection (JSON) with PrimerSearch results.
    pub infile: PathBuf,

    /// Primer set (JSON) to extract amplicons for.
    pub primerfile: PathBuf,

    /// Parent output directory; results go in a subdirectory named after the primer file.
    #[arg(short, long, default_value = "extract")]
    pub outdir: PathBuf,

    /// Reuse an existing output directory.
    #[arg(short, long)]
    pub force: bool,

    /// Compute distances from unaligned amplicons.
    #[arg(long)]
    pub noalign: bool,

    /// MAFFT executable.
    #[arg(long, default_value = DEFAULT_MAFFT, env = "PDP_MAFFT")]
    pub mafft: String,

    #[command(flatten)]
    pub scheduler: SchedulerArgs,
}

#[derive(Args, Debug)]
pub struct DedupeArgs {
    /// Primer set (JSON).
    pub primerfile: PathBuf,

    /// De-duplicated primer set (JSON).
    pub outfile: PathBuf,
}
