//! Errors binstaller can have.
//!
//! One enum, one `Result` alias — everything that can go wrong in the
//! pipeline folds into [`BinstallerError`] so callers get a single diagnostic
//! shape regardless of which stage failed.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// An alias for the common Result type for this crate.
pub type DistResult<T> = std::result::Result<T, BinstallerError>;

/// Errors binstaller can have.
#[derive(Debug, Error, Diagnostic)]
pub enum BinstallerError {
    /// random i/o error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// random axoasset error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Asset(#[from] axoasset::AxoassetError),

    /// random reqwest error
    #[error("network request to {url} failed")]
    Http {
        /// the URL that failed
        url: String,
        /// the underlying error
        #[source]
        source: reqwest::Error,
    },

    /// A problem with a jinja installer template, which is always a binstaller bug
    #[error("failed to render installer script template")]
    #[diagnostic(help(
        "this is a bug in binstaller, please file an issue with the InstallSpec that triggered it"
    ))]
    Jinja(#[source] minijinja::Error),

    /// InstallSpec failed to parse
    #[error(transparent)]
    SpecDecode(#[from] binstaller_schema::DecodeError),

    /// InstallSpec failed validation
    #[error(transparent)]
    SpecValidate(#[from] binstaller_schema::ValidationError),

    /// `repo` could not be parsed as `owner/name`
    #[error("couldn't parse {pair:?} as a GitHub repo (expected \"owner/name\")")]
    RepoPairParse {
        /// the offending input
        pair: String,
    },

    /// `--version` wasn't `"latest"` and didn't parse as a semantic version
    #[error("{version:?} is not \"latest\" or a valid semantic version")]
    InvalidVersion {
        /// the offending input
        version: String,
    },

    /// A required piece of upstream config couldn't be loaded from anywhere
    #[error("couldn't load {what} for {repo}")]
    #[diagnostic(help(
        "checked {tried:?} for a local file, then the repo's default branch on GitHub"
    ))]
    SourceLoad {
        /// what we were trying to load (e.g. "a GoReleaser config")
        what: &'static str,
        /// the repo we tried to load it from
        repo: String,
        /// the local paths we tried
        tried: Vec<Utf8PathBuf>,
    },

    /// Upstream config was present but couldn't be parsed
    #[error("couldn't parse {what} as YAML")]
    SourceParse {
        /// what we were trying to parse
        what: &'static str,
        /// the underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// A template referenced a variable or function the translator doesn't know
    #[error("couldn't translate template {template:?}: {reason}")]
    TemplateTranslate {
        /// the offending template
        template: String,
        /// why translation failed
        reason: String,
    },

    /// A placeholder was still present after substitution
    #[error("unresolved placeholder(s) remain in {context}: {rendered:?}")]
    UnresolvedPlaceholder {
        /// what we were resolving (e.g. "asset filename")
        context: &'static str,
        /// the string that still has `${...}` in it
        rendered: String,
    },

    /// A checksum file had no parseable lines at all
    #[error("checksum file {filename} contained no parseable hash lines")]
    EmptyChecksumFile {
        /// the file we tried to parse
        filename: String,
    },

    /// An embedded-checksums mode was requested with no usable target platforms
    #[error("no platforms were available to compute checksums for")]
    NoChecksumTargets,

    /// A digest algorithm we don't implement was requested
    #[error("unsupported checksum algorithm {algorithm:?}")]
    UnsupportedAlgorithm {
        /// the requested algorithm string
        algorithm: String,
    },

    /// `calculate` mode produced zero digests across every target
    #[error("failed to compute a checksum for every candidate platform")]
    ChecksumCalculateFailed,

    /// GitHub's API didn't return the field we needed
    #[error("GitHub API response for {repo} was missing {field}")]
    GithubApiMissingField {
        /// the repo we queried
        repo: String,
        /// the JSON field we expected
        field: &'static str,
    },
}

impl From<minijinja::Error> for BinstallerError {
    fn from(details: minijinja::Error) -> Self {
        BinstallerError::Jinja(details)
    }
}
