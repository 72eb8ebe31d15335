//! Translates an Aqua registry entry (`registry.yaml`) into a [`Spec`].
//!
//! Aqua registries encode per-platform variation through several
//! independent mechanisms that all fold into `AssetConfig::rules`:
//! `format_overrides` (format swapped per GOOS), `replacements` (a GOOS/arch
//! value renamed before it's substituted into the asset template), and the
//! ordered `overrides` list (goos/goarch-scoped replacement of asset,
//! format, files, and the above). Version-scoped variation
//! (`version_overrides`) is resolved once, up front, against a synthetic
//! "latest" version, the same way `aqua`'s own registry-generation CLI
//! treats `latest` as satisfying any unconstrained package.

use std::collections::BTreeMap;

use axoasset::AxoClient;
use binstaller_schema::{
    ArchEmulation, AssetConfig, AssetRule, AssetRuleWhen, BinaryEntry, Case, NamingConvention,
    Platform, Spec,
};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use semver::Version;
use serde::Deserialize;

use crate::adapters::{finalize, load_config_text, SourceLocation};
use crate::errors::{BinstallerError, DistResult};
use crate::templating::{aqua_dialect, translate, translate_with, Dialect};

const KNOWN_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".tar.xz", ".tar.bz2", ".tar", ".zip"];
const KNOWN_GOOS: &[&str] = &[
    "linux", "darwin", "windows", "freebsd", "netbsd", "openbsd", "dragonfly", "solaris",
    "android", "plan9", "nacl",
];

/// The "latest" version sentinel Aqua's own constraint evaluation treats as
/// satisfying any ordinary semver comparison.
fn latest_sentinel() -> Version {
    Version::new(99_999_999, 0, 0)
}

#[derive(Debug, Default, Deserialize)]
struct AquaPackage {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    repo_owner: String,
    #[serde(default)]
    repo_name: String,
    #[serde(default)]
    asset: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    files: Vec<AquaFile>,
    #[serde(default)]
    supported_envs: Vec<String>,
    #[serde(default)]
    checksum: Option<AquaChecksum>,
    #[serde(default)]
    format_overrides: Vec<AquaFormatOverride>,
    #[serde(default)]
    overrides: Vec<AquaOverride>,
    #[serde(default)]
    replacements: IndexMap<String, String>,
    #[serde(default)]
    rosetta2: bool,
    #[serde(default)]
    version_constraint: String,
    #[serde(default)]
    version_overrides: Vec<AquaVersionOverride>,
}

#[derive(Debug, Deserialize)]
struct AquaRegistry {
    packages: Vec<AquaPackage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AquaFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    src: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AquaFormatOverride {
    #[serde(default)]
    goos: String,
    #[serde(default)]
    format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AquaOverride {
    #[serde(default)]
    goos: String,
    #[serde(default)]
    goarch: String,
    #[serde(default)]
    asset: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    files: Vec<AquaFile>,
    #[serde(default)]
    replacements: IndexMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct AquaVersionOverride {
    #[serde(default)]
    version_constraint: String,
    #[serde(default)]
    asset: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    files: Vec<AquaFile>,
    #[serde(default)]
    supported_envs: Vec<String>,
    #[serde(default)]
    checksum: Option<AquaChecksum>,
    #[serde(default)]
    format_overrides: Vec<AquaFormatOverride>,
    #[serde(default)]
    overrides: Vec<AquaOverride>,
    #[serde(default)]
    replacements: IndexMap<String, String>,
    #[serde(default)]
    rosetta2: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AquaChecksum {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    asset: String,
    #[serde(default)]
    algorithm: String,
}

/// The package fields actually used for mapping, after folding in whichever
/// `version_overrides` entry (if any) matched the latest sentinel.
struct Effective {
    asset: String,
    format: String,
    files: Vec<AquaFile>,
    supported_envs: Vec<String>,
    checksum: Option<AquaChecksum>,
    format_overrides: Vec<AquaFormatOverride>,
    overrides: Vec<AquaOverride>,
    replacements: IndexMap<String, String>,
    rosetta2: bool,
}

impl Effective {
    fn from_package(package: &AquaPackage) -> Self {
        Effective {
            asset: package.asset.clone(),
            format: package.format.clone(),
            files: package.files.clone(),
            supported_envs: package.supported_envs.clone(),
            checksum: package.checksum.clone(),
            format_overrides: package.format_overrides.clone(),
            overrides: package.overrides.clone(),
            replacements: package.replacements.clone(),
            rosetta2: package.rosetta2,
        }
    }

    /// Apply a selected `version_overrides` entry: each field replaces the
    /// base field if non-empty; `replacements` is merged key-by-key with
    /// override precedence.
    fn merge_version_override(&mut self, over: &AquaVersionOverride) {
        if !over.asset.is_empty() {
            self.asset = over.asset.clone();
        }
        if !over.format.is_empty() {
            self.format = over.format.clone();
        }
        if !over.files.is_empty() {
            self.files = over.files.clone();
        }
        if !over.supported_envs.is_empty() {
            self.supported_envs = over.supported_envs.clone();
        }
        if over.checksum.is_some() {
            self.checksum = over.checksum.clone();
        }
        if !over.format_overrides.is_empty() {
            self.format_overrides = over.format_overrides.clone();
        }
        if !over.overrides.is_empty() {
            self.overrides = over.overrides.clone();
        }
        for (k, v) in &over.replacements {
            self.replacements.insert(k.clone(), v.clone());
        }
        if over.rosetta2 {
            self.rosetta2 = true;
        }
    }
}

/// Build a [`Spec`] from a repo's Aqua registry entry.
///
/// `file_override`, if given, is tried before `workdir`'s conventional
/// `registry.yaml`. `git_ref` selects which ref of `aquaproj/aqua-registry`
/// a remote fallback fetch reads from (`"main"` normally).
/// `name_override`, if given, replaces the package name.
pub async fn build(
    repo: &str,
    workdir: Option<&Utf8PathBuf>,
    file_override: Option<&Utf8PathBuf>,
    git_ref: &str,
    name_override: Option<&str>,
    client: &AxoClient,
) -> DistResult<Spec> {
    let (owner, repo_name) = repo
        .split_once('/')
        .ok_or_else(|| BinstallerError::RepoPairParse { pair: repo.to_string() })?;

    let mut local_candidates = file_override.cloned().into_iter().collect::<Vec<_>>();
    if let Some(dir) = workdir {
        local_candidates.push(dir.join("registry.yaml"));
    }
    let location = SourceLocation { repo: repo.to_string(), local_candidates };
    let remote_url = format!(
        "https://raw.githubusercontent.com/aquaproj/aqua-registry/{git_ref}/pkgs/{owner}/{repo_name}/registry.yaml"
    );
    let text = load_config_text(&location, &remote_url, client, "an Aqua registry entry").await?;
    let registry: AquaRegistry =
        serde_yaml::from_str(&text).map_err(|source| BinstallerError::SourceParse {
            what: "an Aqua registry entry",
            source,
        })?;
    let package = registry
        .packages
        .iter()
        .find(|p| p.kind.is_empty() || p.kind == "github_release")
        .ok_or_else(|| BinstallerError::SourceParse {
            what: "an Aqua registry entry",
            source: serde_yaml::Error::custom_missing_packages(),
        })?;

    let sentinel = latest_sentinel();
    let mut effective = Effective::from_package(package);
    if !constraint_satisfied(&package.version_constraint, &sentinel) {
        if let Some(over) = package
            .version_overrides
            .iter()
            .find(|o| constraint_satisfied(&o.version_constraint, &sentinel))
        {
            effective.merge_version_override(over);
        }
    }

    let dialect = aqua_dialect();
    let raw_template = if effective.asset.is_empty() { "{{.Asset}}" } else { effective.asset.as_str() };
    let translated = translate(raw_template, &dialect)
        .map_err(|reason| BinstallerError::TemplateTranslate {
            template: raw_template.to_string(),
            reason,
        })?;
    let mut template = translated.template;
    if !template.ends_with("${EXT}") && !KNOWN_EXTENSIONS.iter().any(|ext| template.ends_with(ext)) {
        template.push_str("${EXT}");
    }
    let asset_without_ext = template.strip_suffix("${EXT}").unwrap_or(&template).to_string();

    let default_extension = if !effective.format.is_empty() {
        format_to_extension(&effective.format)
    } else {
        KNOWN_EXTENSIONS
            .iter()
            .find(|ext| template.ends_with(**ext))
            .map(|ext| ext.to_string())
            .unwrap_or_default()
    };

    let os_titlecase = raw_template.contains("title .OS");

    let mut rules = Vec::new();
    rules.extend(format_override_rules(&effective.format_overrides));
    rules.extend(replacement_rules(&effective.replacements));
    rules.extend(override_rules(&effective.overrides, &dialect)?);

    let binaries = map_binaries(&effective.files, &dialect, &asset_without_ext)?;

    let asset = AssetConfig {
        template,
        default_extension,
        binaries,
        rules,
        naming_convention: if os_titlecase {
            Some(NamingConvention { os: Case::Titlecase, arch: Case::Lowercase })
        } else {
            None
        },
        arch_emulation: if effective.rosetta2 { Some(ArchEmulation { rosetta2: true }) } else { None },
    };

    let checksums = match effective.checksum.as_ref() {
        Some(c) => {
            let raw = if c.asset.is_empty() { "${ASSET_FILENAME}.sha256" } else { c.asset.as_str() };
            let mut extra = BTreeMap::new();
            extra.insert("AssetWithoutExt", asset_without_ext.clone());
            let translated = translate_with(raw, &dialect, &extra)
                .map_err(|reason| BinstallerError::TemplateTranslate { template: raw.to_string(), reason })?;
            Some(binstaller_schema::ChecksumConfig {
                template: translated.template,
                algorithm: parse_algorithm(&c.algorithm),
                embedded_checksums: Default::default(),
            })
        }
        None => None,
    };

    let name = name_override
        .map(|n| n.to_string())
        .or_else(|| (!package.name.is_empty()).then(|| package.name.clone()))
        .or_else(|| effective.files.first().map(|f| f.name.clone()))
        .unwrap_or_else(|| repo_name.to_string());

    let resolved_repo = if package.repo_owner.is_empty() || package.repo_name.is_empty() {
        repo.to_string()
    } else {
        format!("{}/{}", package.repo_owner, package.repo_name)
    };

    let supported_platforms = effective
        .supported_envs
        .iter()
        .filter_map(|env| env.split_once('/'))
        .map(|(os, arch)| Platform { os: os.to_string(), arch: arch.to_string() })
        .collect();

    let spec = Spec {
        name,
        repo: resolved_repo,
        asset,
        checksums,
        supported_platforms,
        ..Default::default()
    };
    finalize(spec)
}

fn map_binaries(
    files: &[AquaFile],
    dialect: &Dialect,
    asset_without_ext: &str,
) -> DistResult<Vec<BinaryEntry>> {
    let mut extra = BTreeMap::new();
    extra.insert("AssetWithoutExt", asset_without_ext.to_string());
    files
        .iter()
        .map(|f| {
            let path = match &f.src {
                Some(src) if !src.is_empty() => translate_with(src, dialect, &extra)
                    .map_err(|reason| BinstallerError::TemplateTranslate {
                        template: src.clone(),
                        reason,
                    })?
                    .template,
                _ => f.name.clone(),
            };
            Ok(BinaryEntry { name: f.name.clone(), path })
        })
        .collect()
}

fn format_override_rules(overrides: &[AquaFormatOverride]) -> Vec<AssetRule> {
    overrides
        .iter()
        .filter(|o| !o.goos.is_empty() && !o.format.is_empty())
        .map(|o| AssetRule {
            when: AssetRuleWhen { os: Some(o.goos.clone()), arch: None },
            ext: Some(format_to_extension(&o.format)),
            ..Default::default()
        })
        .collect()
}

fn replacement_rules(replacements: &IndexMap<String, String>) -> Vec<AssetRule> {
    replacements
        .iter()
        .map(|(key, value)| {
            if KNOWN_GOOS.contains(&key.as_str()) {
                AssetRule {
                    when: AssetRuleWhen { os: Some(key.clone()), arch: None },
                    os: Some(value.clone()),
                    ..Default::default()
                }
            } else {
                AssetRule {
                    when: AssetRuleWhen { os: None, arch: Some(key.clone()) },
                    arch: Some(value.clone()),
                    ..Default::default()
                }
            }
        })
        .collect()
}

/// `overrides[{goos, goarch, asset?, format?, files?, replacements?}]` →
/// rules, in source order (first-match-wins matches Aqua's own evaluation).
/// An override's own `replacements` apply first: a single replacement folds
/// directly into the rule carrying the override's `asset`/`format`/`files`;
/// more than one is emitted as separate leading rules sharing the same
/// `when`, since `AssetRule` only carries one `os` and one `arch` rename.
fn override_rules(overrides: &[AquaOverride], dialect: &Dialect) -> DistResult<Vec<AssetRule>> {
    let mut rules = Vec::new();
    for over in overrides {
        let when = AssetRuleWhen {
            os: (!over.goos.is_empty()).then(|| over.goos.clone()),
            arch: (!over.goarch.is_empty()).then(|| over.goarch.clone()),
        };

        let renames: Vec<(Option<String>, Option<String>)> = over
            .replacements
            .iter()
            .map(|(key, value)| {
                if KNOWN_GOOS.contains(&key.as_str()) {
                    (Some(value.clone()), None)
                } else {
                    (None, Some(value.clone()))
                }
            })
            .collect();

        let ext = (!over.format.is_empty()).then(|| format_to_extension(&over.format));
        let template = if over.asset.is_empty() {
            None
        } else {
            Some(
                translate(&over.asset, dialect)
                    .map_err(|reason| BinstallerError::TemplateTranslate {
                        template: over.asset.clone(),
                        reason,
                    })?
                    .template,
            )
        };
        let binaries = if over.files.is_empty() {
            None
        } else {
            let asset_without_ext = template
                .as_deref()
                .map(|t| t.strip_suffix("${EXT}").unwrap_or(t).to_string())
                .unwrap_or_default();
            Some(map_binaries(&over.files, dialect, &asset_without_ext)?)
        };

        if renames.len() == 1 {
            let (os, arch) = renames.into_iter().next().unwrap();
            rules.push(AssetRule { when, os, arch, ext, template, binaries });
        } else {
            for (os, arch) in renames {
                rules.push(AssetRule { when: when.clone(), os, arch, ..Default::default() });
            }
            rules.push(AssetRule { when, ext, template, binaries, ..Default::default() });
        }
    }
    Ok(rules)
}

/// Empty constraint is always satisfied; otherwise every `&&`-joined clause
/// must hold against `version`.
fn constraint_satisfied(constraint: &str, version: &Version) -> bool {
    let constraint = constraint.trim();
    if constraint.is_empty() {
        return true;
    }
    constraint.split("&&").all(|clause| eval_clause(clause.trim(), version))
}

/// Evaluate a single `Version <op> "<literal>"` clause. Two-character
/// operators are checked before their single-character prefixes so `>=`
/// isn't misparsed as `>` with a stray `=`.
fn eval_clause(clause: &str, version: &Version) -> bool {
    const OPS: [&str; 6] = ["==", "!=", ">=", "<=", ">", "<"];
    for op in OPS {
        if let Some((lhs, rhs)) = clause.split_once(op) {
            if lhs.trim() != "Version" {
                continue;
            }
            let Some(rhs) = parse_version_literal(rhs.trim()) else { return false };
            return match op {
                "==" => *version == rhs,
                "!=" => *version != rhs,
                ">=" => *version >= rhs,
                "<=" => *version <= rhs,
                ">" => *version > rhs,
                "<" => *version < rhs,
                _ => unreachable!(),
            };
        }
    }
    false
}

fn parse_version_literal(raw: &str) -> Option<Version> {
    let raw = raw.trim().trim_matches('"');
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    Version::parse(raw).ok()
}

fn format_to_extension(format: &str) -> String {
    match format {
        "zip" => ".zip".to_string(),
        "tar.gz" | "tgz" => ".tar.gz".to_string(),
        "tar.xz" => ".tar.xz".to_string(),
        "raw" | "" => String::new(),
        other => format!(".{other}"),
    }
}

fn parse_algorithm(raw: &str) -> binstaller_schema::Algorithm {
    match raw {
        "sha1" => binstaller_schema::Algorithm::Sha1,
        "sha512" => binstaller_schema::Algorithm::Sha512,
        "md5" => binstaller_schema::Algorithm::Md5,
        _ => binstaller_schema::Algorithm::Sha256,
    }
}

trait MissingPackagesError {
    fn custom_missing_packages() -> Self;
}

impl MissingPackagesError for serde_yaml::Error {
    fn custom_missing_packages() -> Self {
        serde::de::Error::custom("registry.yaml had no packages")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_satisfied_against_sentinel() {
        let sentinel = latest_sentinel();
        assert!(constraint_satisfied("", &sentinel));
        assert!(constraint_satisfied(r#"Version >= "v1.0.0""#, &sentinel));
        assert!(!constraint_satisfied(r#"Version < "v1.0.0""#, &sentinel));
        assert!(constraint_satisfied(
            r#"Version >= "v1.0.0" && Version < "v999999999.0.0""#,
            &sentinel
        ));
    }
}
