//! Embeds checksums into a [`Spec`]'s `checksums.embedded_checksums` map, so
//! the generated installer can verify downloads without a network round
//! trip to a checksum file at install time.
//!
//! Three modes, matching the three ways a project publishes digests:
//! download a published checksum file and parse it, or compute digests
//! ourselves from the release assets directly (`calculate`). Per-target
//! digest computation runs concurrently via `tokio::task::JoinSet`, then
//! joins into the map serially — the same fan-out/fan-in split
//! `cargo-dist`'s artifact-build orchestration uses for parallel platform
//! builds.

use std::collections::BTreeMap;

use axoasset::AxoClient;
use binstaller_schema::{Algorithm, ChecksumEntry};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::errors::{BinstallerError, DistResult};

/// How to obtain checksums for a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumMode {
    /// Download a single checksum-file asset (e.g. `checksums.txt`) and
    /// parse its lines.
    ChecksumFile,
    /// Download every per-platform asset and hash it ourselves.
    Calculate,
}

/// Fetch or compute digests for `version`'s release assets and return them
/// keyed by filename, ready to splice into `Spec::checksums.embedded_checksums`.
pub async fn embed_checksums(
    client: &AxoClient,
    download_base_url: &str,
    version: &str,
    algorithm: Algorithm,
    mode: ChecksumMode,
    asset_filenames: &[String],
) -> DistResult<Vec<ChecksumEntry>> {
    match mode {
        ChecksumMode::ChecksumFile => {
            fetch_checksum_file(client, download_base_url, version, algorithm).await
        }
        ChecksumMode::Calculate => {
            calculate_checksums(client, download_base_url, algorithm, asset_filenames).await
        }
    }
}

async fn fetch_checksum_file(
    client: &AxoClient,
    download_base_url: &str,
    version: &str,
    algorithm: Algorithm,
) -> DistResult<Vec<ChecksumEntry>> {
    let filename = "checksums.txt".to_string();
    let url = format!("{download_base_url}/{version}/{filename}");
    let text = client
        .load_string(&url)
        .await
        .map_err(|_| BinstallerError::EmptyChecksumFile { filename: filename.clone() })?;
    let entries = parse_checksum_file(&text, algorithm);
    if entries.is_empty() {
        return Err(BinstallerError::EmptyChecksumFile { filename });
    }
    Ok(entries)
}

/// Parse a `sha256sum`-style checksum file. Each line is either
/// `<hex>  <filename>` (two-space "text mode" separator),
/// `<hex> *<filename>` ("binary mode"), or `<hex>  <filename>` with a single
/// space — all three are accepted since publishers are inconsistent.
pub fn parse_checksum_file(text: &str, algorithm: Algorithm) -> Vec<ChecksumEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let Some(hash) = parts.next() else { continue };
        let Some(rest) = parts.next() else { continue };
        let filename = rest.trim_start().trim_start_matches('*');
        if filename.is_empty() || hash.is_empty() {
            continue;
        }
        entries.push(ChecksumEntry {
            filename: filename.to_string(),
            hash: hash.to_ascii_lowercase(),
            algorithm: Some(algorithm),
        });
    }
    entries
}

async fn calculate_checksums(
    client: &AxoClient,
    download_base_url: &str,
    algorithm: Algorithm,
    asset_filenames: &[String],
) -> DistResult<Vec<ChecksumEntry>> {
    if asset_filenames.is_empty() {
        return Err(BinstallerError::NoChecksumTargets);
    }

    let mut joinset = tokio::task::JoinSet::new();
    for filename in asset_filenames {
        let url = format!("{download_base_url}/{filename}");
        let client = client.clone();
        let filename = filename.clone();
        joinset.spawn(async move {
            let bytes = client.load_bytes(&url).await;
            (filename, bytes)
        });
    }

    let mut digests: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    while let Some(joined) = joinset.join_next().await {
        // A join error only happens if the spawned task panicked; since it
        // only awaits network I/O and inserts into a map, that can't
        // happen in practice, so a failed join is treated like a failed
        // download and simply skipped.
        let Ok((filename, bytes)) = joined else { continue };
        if let Ok(bytes) = bytes {
            digests.insert(filename, bytes);
        }
    }

    if digests.is_empty() {
        return Err(BinstallerError::ChecksumCalculateFailed);
    }

    let entries = digests
        .into_iter()
        .map(|(filename, bytes)| ChecksumEntry {
            hash: hex::encode(digest_bytes(algorithm, &bytes)),
            filename,
            algorithm: Some(algorithm),
        })
        .collect();
    Ok(entries)
}

fn digest_bytes(algorithm: Algorithm, bytes: &[u8]) -> Vec<u8> {
    match algorithm {
        Algorithm::Sha256 => Sha256::digest(bytes).to_vec(),
        Algorithm::Sha512 => Sha512::digest(bytes).to_vec(),
        Algorithm::Sha1 => Sha1::digest(bytes).to_vec(),
        Algorithm::Md5 => Md5::digest(bytes).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_space_separated_lines() {
        let text = "deadbeef  tool-linux-amd64.tar.gz\n";
        let entries = parse_checksum_file(text, Algorithm::Sha256);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "tool-linux-amd64.tar.gz");
        assert_eq!(entries[0].hash, "deadbeef");
    }

    #[test]
    fn parses_binary_mode_star_prefixed_lines() {
        let text = "cafebabe *tool-darwin-arm64.tar.gz\n";
        let entries = parse_checksum_file(text, Algorithm::Sha256);
        assert_eq!(entries[0].filename, "tool-darwin-arm64.tar.gz");
        assert_eq!(entries[0].hash, "cafebabe");
    }

    #[test]
    fn skips_blank_lines() {
        let text = "\n\ndeadbeef  a.tar.gz\n\n";
        assert_eq!(parse_checksum_file(text, Algorithm::Sha256).len(), 1);
    }

    #[test]
    fn lowercases_hashes() {
        let text = "DEADBEEF  a.tar.gz\n";
        assert_eq!(parse_checksum_file(text, Algorithm::Sha256)[0].hash, "deadbeef");
    }
}
