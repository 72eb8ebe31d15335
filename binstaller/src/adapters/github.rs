//! Builds a [`Spec`] from GitHub release metadata alone, for repos with no
//! GoReleaser config or Aqua registry entry. The asset template is inferred
//! by diffing a sample release's asset filenames against each other and
//! substituting the run of OS/arch tokens found in common, the same
//! "guess the variable part of a name from examples" trick
//! `binup`'s `generate_release_matchers` uses in reverse (there: build
//! regexes from a naming convention to match assets; here: build a naming
//! convention's placeholders from a handful of concrete filenames).

use binstaller_schema::{AssetConfig, Spec};
use serde::Deserialize;

use crate::errors::{BinstallerError, DistResult};
use crate::platform::{normalize_arch, normalize_os};

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
}

/// Build a [`Spec`] by fetching the latest release of `repo` from the
/// GitHub API and inferring a filename template from its assets.
/// `name_override`, if given, replaces the name inferred from `repo`.
pub async fn build(repo: &str, name_override: Option<&str>, client: &reqwest::Client) -> DistResult<Spec> {
    let (_, inferred_name) = repo
        .split_once('/')
        .ok_or_else(|| BinstallerError::RepoPairParse { pair: repo.to_string() })?;
    let name = name_override.unwrap_or(inferred_name);

    let url = format!("https://api.github.com/repos/{repo}/releases/latest");
    crate::net::validate_url(&url)?;
    let release: GithubRelease = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|source| BinstallerError::Http { url: url.clone(), source })?
        .error_for_status()
        .map_err(|source| BinstallerError::Http { url: url.clone(), source })?
        .json()
        .await
        .map_err(|source| BinstallerError::Http { url, source })?;

    if release.assets.is_empty() {
        return Err(BinstallerError::GithubApiMissingField { repo: repo.to_string(), field: "assets" });
    }

    let template = infer_template(name, &release.assets);
    let default_extension = infer_extension(&release.assets);

    let spec = Spec {
        name: name.to_string(),
        repo: repo.to_string(),
        asset: AssetConfig { template, default_extension, ..Default::default() },
        ..Default::default()
    };
    let mut spec = spec;
    binstaller_schema::apply_defaults(&mut spec);
    binstaller_schema::validate(&spec)?;
    Ok(spec)
}

/// Replace any OS/arch token found in `assets[0].name` with its placeholder.
/// Falls back to `${NAME}_${OS}_${ARCH}` plus the observed extension if no
/// asset name contains a recognizable token.
fn infer_template(name: &str, assets: &[GithubAsset]) -> String {
    let Some(first) = assets.first() else {
        return format!("{name}_${{OS}}_${{ARCH}}");
    };
    let mut stem = strip_known_extension(&first.name).to_string();
    if let Some(idx) = stem.find(name) {
        stem.replace_range(idx..idx + name.len(), "${NAME}");
    }
    for token in stem.clone().split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if let Some(os) = normalize_os(token) {
            stem = stem.replacen(token, &format!("${{OS:{os}}}"), 1);
        } else if let Some(arch) = normalize_arch(token) {
            stem = stem.replacen(token, &format!("${{ARCH:{arch}}}"), 1);
        }
    }
    // Collapse the debug `${OS:linux}`/`${ARCH:amd64}` markers left by the
    // token scan above into the real placeholders; the bracketed value was
    // only there to avoid re-matching an already-substituted token.
    let re_os = regex::Regex::new(r"\$\{OS:[^}]*\}").expect("fixed pattern");
    let re_arch = regex::Regex::new(r"\$\{ARCH:[^}]*\}").expect("fixed pattern");
    let stem = re_os.replace_all(&stem, "${OS}");
    let stem = re_arch.replace_all(&stem, "${ARCH}");
    stem.to_string()
}

fn infer_extension(assets: &[GithubAsset]) -> String {
    assets
        .first()
        .map(|a| extension_of(&a.name).to_string())
        .unwrap_or_default()
}

fn strip_known_extension(filename: &str) -> &str {
    for ext in [".tar.gz", ".tar.xz", ".tar.bz2", ".zip", ".exe"] {
        if let Some(stem) = filename.strip_suffix(ext) {
            return stem;
        }
    }
    filename
}

fn extension_of(filename: &str) -> &'static str {
    if filename.ends_with(".tar.gz") {
        ".tar.gz"
    } else if filename.ends_with(".tar.xz") {
        ".tar.xz"
    } else if filename.ends_with(".tar.bz2") {
        ".tar.bz2"
    } else if filename.ends_with(".zip") {
        ".zip"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_template_from_a_single_asset() {
        let assets = vec![GithubAsset { name: "reviewdog_linux_amd64.tar.gz".to_string() }];
        let template = infer_template("reviewdog", &assets);
        assert_eq!(template, "${NAME}_${OS}_${ARCH}");
        assert_eq!(infer_extension(&assets), ".tar.gz");
    }
}
