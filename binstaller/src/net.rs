//! Shared HTTP client construction, mirroring `cargo-dist/src/net.rs`: one
//! place that builds both the raw `reqwest::Client` (for GitHub API calls)
//! and the `axoasset::AxoClient` wrapper (for downloading release assets and
//! checksum files), so every caller gets the same timeout and user-agent.

use std::time::Duration;

use axoasset::AxoClient;

use crate::errors::DistResult;

/// Client construction knobs. A placeholder today (matching
/// `cargo-dist::net::ClientSettings`) but the natural home for a future
/// `--timeout`/proxy-config surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientSettings {
    /// Request timeout, applied to every request the client issues.
    pub timeout: Option<Duration>,
}

/// Build the raw `reqwest::Client` used for GitHub API calls.
pub fn create_reqwest_client(settings: ClientSettings) -> DistResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("binstaller/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|source| crate::errors::BinstallerError::Http {
        url: "<client construction>".to_string(),
        source,
    })
}

/// Build the `axoasset::AxoClient` used for downloading assets and checksum
/// files.
pub fn create_axoasset_client(settings: ClientSettings) -> DistResult<AxoClient> {
    let client = create_reqwest_client(settings)?;
    Ok(AxoClient::with_reqwest(client))
}

/// Validate a URL binstaller is about to hit before spending a network round
/// trip on it — mainly a backstop against a malformed `repo` string
/// producing something like `https://api.github.com/repos//releases/latest`.
pub fn validate_url(raw: &str) -> DistResult<url::Url> {
    url::Url::parse(raw).map_err(|_| crate::errors::BinstallerError::RepoPairParse {
        pair: raw.to_string(),
    })
}
