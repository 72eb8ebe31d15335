//! Renders an [`Spec`] into a standalone POSIX shell installer script.
//!
//! The generator never resolves a per-platform result itself — it hands the
//! template every rule, ordered, and the template's own `sh` logic performs
//! the first-match-wins resolution at install time on the end user's
//! machine (mirroring the way `cargo-dist`'s shell installer embeds platform
//! detection in the script rather than baking in one target per script).

pub mod templates;

use binstaller_schema::{Algorithm, AssetRule, AssetRuleWhen, Case, NamingConvention, Spec};
use camino::Utf8Path;
use serde::Serialize;

use crate::errors::DistResult;
use templates::Templates;

/// Everything the `installer.sh.j2` template needs, serialized in the shape
/// the template consumes it in. Field order here has no on-disk contract
/// (unlike `Spec`'s YAML) but is kept logically grouped for readability.
#[derive(Debug, Serialize)]
pub struct InstallerContext {
    /// Binary/display name.
    pub name: String,
    /// `owner/name` GitHub repo.
    pub repo: String,
    /// Version to install when the caller doesn't pin one.
    pub default_version: String,
    /// Shell expression for the install destination.
    pub default_bin_dir: String,
    /// Base filename template (already binstaller-placeholder syntax).
    pub asset_template: String,
    /// Default extension, possibly empty.
    pub default_extension: String,
    /// Per-platform override rules, in first-match-wins order.
    pub rules: Vec<RuleContext>,
    /// Binaries to extract/install from the resolved asset.
    pub binaries: Vec<BinaryContext>,
    /// Casing convention for `${OS}`/`${ARCH}`.
    pub naming_convention: NamingConventionContext,
    /// Whether a Rosetta2 fallback should be attempted on darwin/arm64.
    pub rosetta2: bool,
    /// Checksum verification settings, if any.
    pub checksums: Option<ChecksumContext>,
    /// Attestation verification settings, if any.
    pub attestation: Option<AttestationContext>,
    /// `tar --strip-components` value, if any extraction is needed.
    pub strip_components: u32,
    /// The GitHub release download base URL, e.g.
    /// `https://github.com/owner/name/releases/download`.
    pub download_base_url: String,
    /// The fixed POSIX shell runtime library, inserted verbatim (never
    /// itself passed through Jinja).
    pub runtime_lib: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RuleContext {
    pub when_os: Option<String>,
    pub when_arch: Option<String>,
    pub template: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub ext: Option<String>,
    pub binaries: Option<Vec<BinaryContext>>,
}

#[derive(Debug, Serialize, Clone)]
pub struct BinaryContext {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct NamingConventionContext {
    pub os_titlecase: bool,
    pub arch_titlecase: bool,
}

#[derive(Debug, Serialize)]
pub struct ChecksumContext {
    pub template: String,
    pub algorithm: String,
    /// `version -> [{filename, hash}]`, flattened so the template doesn't
    /// need to do any map-key lookups of its own; empty unless embedding.
    pub embedded: Vec<EmbeddedChecksumVersion>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddedChecksumVersion {
    pub version: String,
    pub entries: Vec<EmbeddedChecksumEntry>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddedChecksumEntry {
    pub filename: String,
    pub hash: String,
    pub algorithm: String,
}

#[derive(Debug, Serialize)]
pub struct AttestationContext {
    pub require: bool,
    pub verify_flags: String,
}

/// Build the serializable context for `spec`, already fully defaulted and
/// validated (callers are expected to have run it through
/// `binstaller_schema::load_and_prepare` or equivalent).
pub fn build_context(spec: &Spec) -> InstallerContext {
    let naming = spec.asset.naming_convention.unwrap_or_default();
    InstallerContext {
        name: spec.name.clone(),
        repo: spec.repo.clone(),
        default_version: spec.default_version.clone(),
        default_bin_dir: spec.default_bin_dir.clone(),
        asset_template: spec.asset.template.clone(),
        default_extension: spec.asset.default_extension.clone(),
        rules: spec.asset.rules.iter().map(rule_context).collect(),
        binaries: spec.asset.binaries.iter().map(binary_context).collect(),
        naming_convention: naming_context(naming),
        rosetta2: spec.asset.arch_emulation.map(|a| a.rosetta2).unwrap_or(false),
        checksums: spec.checksums.as_ref().map(checksum_context),
        attestation: spec
            .attestation
            .as_ref()
            .filter(|a| a.enabled)
            .map(|a| AttestationContext {
                require: a.require,
                verify_flags: a.verify_flags.clone(),
            }),
        strip_components: spec.unpack.map(|u| u.strip_components).unwrap_or(0),
        download_base_url: format!("https://github.com/{}/releases/download", spec.repo),
        runtime_lib: templates::RUNTIME_LIB_SH,
    }
}

fn rule_context(rule: &AssetRule) -> RuleContext {
    let AssetRuleWhen { os, arch } = rule.when.clone();
    RuleContext {
        when_os: os,
        when_arch: arch,
        template: rule.template.clone(),
        os: rule.os.clone(),
        arch: rule.arch.clone(),
        ext: rule.ext.clone(),
        binaries: rule.binaries.as_ref().map(|bs| bs.iter().map(binary_context).collect()),
    }
}

fn binary_context(b: &binstaller_schema::BinaryEntry) -> BinaryContext {
    BinaryContext { name: b.name.clone(), path: b.path.clone() }
}

fn naming_context(n: NamingConvention) -> NamingConventionContext {
    NamingConventionContext {
        os_titlecase: n.os == Case::Titlecase,
        arch_titlecase: n.arch == Case::Titlecase,
    }
}

fn checksum_context(c: &binstaller_schema::ChecksumConfig) -> ChecksumContext {
    ChecksumContext {
        template: c.template.clone(),
        algorithm: c.algorithm.to_string(),
        embedded: c
            .embedded_checksums
            .iter()
            .map(|(version, entries)| EmbeddedChecksumVersion {
                version: version.clone(),
                entries: entries
                    .iter()
                    .map(|e| EmbeddedChecksumEntry {
                        filename: e.filename.clone(),
                        hash: e.hash.clone(),
                        algorithm: e.algorithm.unwrap_or(Algorithm::Sha256).to_string(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Render `spec` into a standalone installer script and write it to
/// `dest_path`.
pub fn generate(spec: &Spec, dest_path: &Utf8Path) -> DistResult<()> {
    let templates = Templates::new()?;
    let ctx = build_context(spec);
    let rendered = templates.render_installer(&ctx)?;
    axoasset::LocalAsset::write_new_all(&rendered, dest_path)?;
    Ok(())
}

/// Render `spec` to a string without touching the filesystem, for tests and
/// for the CLI's `--dry-run` mode.
pub fn render_to_string(spec: &Spec) -> DistResult<String> {
    let templates = Templates::new()?;
    let ctx = build_context(spec);
    templates.render_installer(&ctx)
}

/// Resolve the asset filename `spec` would produce for `os`/`arch` at
/// `version`, applying the same first-match-wins rule lookup and
/// `${NAME}`/`${VERSION}`/`${TAG}`/`${OS}`/`${ARCH}`/`${EXT}` substitution the
/// generated installer script performs at runtime. Used by `embed-checksums
/// --all-platforms` to enumerate asset filenames without a release listing.
pub fn resolve_asset_filename(spec: &Spec, os: &str, arch: &str, version: &str) -> String {
    let rule = spec.asset.rules.iter().find(|r| {
        r.when.os.as_deref().map_or(true, |o| o == os)
            && r.when.arch.as_deref().map_or(true, |a| a == arch)
    });
    let template = rule
        .and_then(|r| r.template.clone())
        .unwrap_or_else(|| spec.asset.template.clone());
    let ext = rule
        .and_then(|r| r.ext.clone())
        .unwrap_or_else(|| spec.asset.default_extension.clone());

    let naming = spec.asset.naming_convention.unwrap_or_default();
    let tag = if version.starts_with('v') { version.to_string() } else { format!("v{version}") };

    template
        .replace("${NAME}", &spec.name)
        .replace("${VERSION}", version)
        .replace("${TAG}", &tag)
        .replace("${OS}", &naming.os.apply(os))
        .replace("${ARCH}", &naming.arch.apply(arch))
        .replace("${EXT}", &ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use binstaller_schema::apply_defaults;

    #[test]
    fn renders_a_minimal_spec_without_error() {
        let mut spec = Spec { repo: "reviewdog/reviewdog".to_string(), ..Default::default() };
        apply_defaults(&mut spec);
        let out = render_to_string(&spec).expect("render must succeed");
        assert!(out.starts_with("#!/bin/sh") || out.starts_with("#!/usr/bin/env sh"));
        assert!(out.contains("reviewdog"));
    }

    #[test]
    fn resolves_asset_filename_per_platform_with_rule_override() {
        let mut spec = Spec {
            name: "reviewdog".to_string(),
            repo: "reviewdog/reviewdog".to_string(),
            asset: binstaller_schema::AssetConfig {
                template: "${NAME}_${OS}_${ARCH}".to_string(),
                default_extension: ".tar.gz".to_string(),
                rules: vec![binstaller_schema::AssetRule {
                    when: AssetRuleWhen { os: Some("windows".to_string()), arch: None },
                    ext: Some(".zip".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        apply_defaults(&mut spec);

        assert_eq!(
            resolve_asset_filename(&spec, "linux", "amd64", "1.2.3"),
            "reviewdog_linux_amd64.tar.gz"
        );
        assert_eq!(
            resolve_asset_filename(&spec, "windows", "amd64", "1.2.3"),
            "reviewdog_windows_amd64.zip"
        );
    }
}
