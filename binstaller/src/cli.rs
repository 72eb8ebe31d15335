//! All the clap stuff for parsing/documenting the CLI.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// Generates POSIX-shell installers for GitHub release binaries.
#[derive(Parser, Clone, Debug)]
#[clap(version)]
#[clap(bin_name = "binstaller")]
#[clap(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Subcommand to run.
    #[clap(subcommand)]
    pub command: Commands,

    /// How verbose logging should be.
    #[clap(long, short)]
    #[clap(default_value_t = LevelFilter::WARN)]
    #[clap(help_heading = "GLOBAL OPTIONS", global = true)]
    pub verbose: LevelFilter,

    /// Suppress all non-error output.
    #[clap(long, short)]
    #[clap(help_heading = "GLOBAL OPTIONS", global = true)]
    pub quiet: bool,

    /// Answer "yes" to every confirmation prompt.
    #[clap(long, short)]
    #[clap(help_heading = "GLOBAL OPTIONS", global = true)]
    pub yes: bool,

    /// Render the installer script but don't write it to disk.
    #[clap(long)]
    #[clap(help_heading = "GLOBAL OPTIONS", global = true)]
    pub dry_run: bool,

    /// Network request timeout, in seconds.
    #[clap(long)]
    #[clap(default_value_t = 30)]
    #[clap(help_heading = "GLOBAL OPTIONS", global = true)]
    pub timeout: u64,

    /// Path to the `.binstaller.yml` that `gen` and `embed-checksums`
    /// operate on. Not used by `init`, which always writes a fresh one.
    #[clap(long, short)]
    #[clap(help_heading = "GLOBAL OPTIONS", global = true)]
    pub config: Option<Utf8PathBuf>,
}

/// The various subcommands of `binstaller`.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Generate a `.binstaller.yml` for a repo by inspecting its release tooling.
    Init(InitArgs),
    /// Render a `.binstaller.yml` into an installer shell script.
    Gen(GenArgs),
    /// Fetch or compute checksums and embed them into a `.binstaller.yml`.
    EmbedChecksums(EmbedChecksumsArgs),
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceArg {
    /// Auto-detect: try GoReleaser, then Aqua, then GitHub releases alone.
    Auto,
    /// A GoReleaser config.
    Goreleaser,
    /// An Aqua registry entry.
    Aqua,
    /// GitHub release metadata alone.
    Github,
}

#[derive(Args, Clone, Debug)]
pub struct InitArgs {
    /// The GitHub repo to generate a spec for, as `owner/name`.
    #[clap(long)]
    pub repo: String,

    /// Which upstream source to read from.
    #[clap(long, value_enum, default_value_t = SourceArg::Auto)]
    pub source: SourceArg,

    /// Local working directory to look for upstream config files in before
    /// falling back to the GitHub API.
    #[clap(long)]
    pub workdir: Option<Utf8PathBuf>,

    /// Local path to an upstream config file, used in place of `--workdir`
    /// discovery when the file isn't at its conventional name/location.
    #[clap(long)]
    pub file: Option<Utf8PathBuf>,

    /// Override the package name an adapter would otherwise infer from
    /// `--repo` or the upstream config.
    #[clap(long)]
    pub name: Option<String>,

    /// Pin a remote config fetch to this commit SHA instead of the repo's
    /// default branch.
    #[clap(long)]
    pub sha: Option<String>,

    /// Where to write the generated `.binstaller.yml`.
    #[clap(long, short, default_value = ".binstaller.yml")]
    pub output: Utf8PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct GenArgs {
    /// Where to write the generated installer script. `-` writes to stdout.
    #[clap(long, short, default_value = "install.sh")]
    pub output: Utf8PathBuf,
}

/// How `embed-checksums` should obtain digests.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecksumModeArg {
    /// Download a published checksum-file asset and parse it.
    Download,
    /// Parse a checksum file already on disk (see `--file`).
    ChecksumFile,
    /// Download each release asset and hash it ourselves.
    Calculate,
}

#[derive(Args, Clone, Debug)]
pub struct EmbedChecksumsArgs {
    /// Version to fetch/compute checksums for.
    #[clap(long)]
    pub version: Option<String>,

    /// How to obtain the digests.
    #[clap(long, value_enum, default_value_t = ChecksumModeArg::Download)]
    pub mode: ChecksumModeArg,

    /// Local checksum-file path, required with `--mode checksum-file`.
    #[clap(long)]
    pub file: Option<Utf8PathBuf>,

    /// With `--mode calculate`, hash every platform in the spec's
    /// `supported_platforms` instead of requiring an explicit `--assets` list.
    #[clap(long)]
    pub all_platforms: bool,

    /// Asset filenames to hash, used with `--mode calculate` when
    /// `--all-platforms` isn't given.
    #[clap(long, value_delimiter(','))]
    pub assets: Vec<String>,

    /// Where to write the updated spec; defaults to the input `--config` path.
    #[clap(long, short)]
    pub output: Option<Utf8PathBuf>,
}
