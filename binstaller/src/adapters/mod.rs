//! Source adapters: each translates one flavor of upstream release metadata
//! into an [`binstaller_schema::Spec`]. All three share the same shape —
//! fetch config (local file first, then GitHub API), parse, translate
//! templates via [`crate::templating`] — mirroring how
//! `cargo-dist`'s `InstallerImpl` variants share one `InstallerInfo` and
//! differ only in how they populate it.

pub mod aqua;
pub mod github;
pub mod goreleaser;

use axoasset::AxoClient;
use binstaller_schema::Spec;
use camino::Utf8PathBuf;

use crate::errors::DistResult;

/// Where to look for a local copy of upstream config before falling back to
/// GitHub, and what repo to fall back to. Mirrors the local-then-remote
/// fallback `axoasset::LocalAsset`/`AxoClient` split already used elsewhere
/// in this crate.
pub struct SourceLocation {
    /// `owner/name` of the GitHub repository being installed from.
    pub repo: String,
    /// Local filesystem candidates to try first, in order.
    pub local_candidates: Vec<Utf8PathBuf>,
}

/// Try each local candidate in order, falling back to `remote_url` over
/// `client` if none exist. Returns the loaded text and which path (local
/// path or URL) it came from, for error messages.
pub async fn load_config_text(
    location: &SourceLocation,
    remote_url: &str,
    client: &AxoClient,
    what: &'static str,
) -> DistResult<String> {
    for candidate in &location.local_candidates {
        if candidate.exists() {
            return axoasset::LocalAsset::load_string(candidate.as_str())
                .map_err(Into::into);
        }
    }
    client
        .load_string(remote_url)
        .await
        .map_err(|_| crate::errors::BinstallerError::SourceLoad {
            what,
            repo: location.repo.clone(),
            tried: location.local_candidates.clone(),
        })
}

/// Finish off a `Spec` built by an adapter: fill defaults and validate. Every
/// adapter's `build` ends by calling this so the result always satisfies the
/// same contract regardless of source.
pub fn finalize(mut spec: Spec) -> DistResult<Spec> {
    binstaller_schema::apply_defaults(&mut spec);
    binstaller_schema::validate(&spec)?;
    Ok(spec)
}
