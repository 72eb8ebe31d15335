#![deny(missing_docs)]

//! # binstaller-schema
//!
//! This crate exists to serialize, deserialize, and default the `.binstaller.yml`
//! document (the "InstallSpec") produced and consumed by `binstaller`. It has no
//! knowledge of GitHub, GoReleaser, Aqua, or shell generation; it only knows the
//! shape of the document and how to fill in its defaults.
//!
//! The root type of the schema is [`Spec`].

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

mod error;
#[cfg(test)]
mod tests;

pub use error::{DecodeError, ValidationError};

/// The only schema version this crate understands.
pub const SCHEMA_V1: &str = "v1";

/// Default value for [`Spec::default_version`].
pub const DEFAULT_VERSION: &str = "latest";

/// Default expression for [`Spec::default_bin_dir`].
pub const DEFAULT_BIN_DIR: &str = "${BINSTALLER_BIN:-${HOME}/.local/bin}";

/// The canonical configuration document this tool reads and writes.
///
/// Field order here is load-bearing: `serde_yaml` serializes struct fields in
/// declaration order, and [`Spec::save`] depends on this exact order to satisfy
/// the on-disk key-order contract (schema, name, repo, default_version,
/// default_bin_dir, asset, checksums, attestation, unpack, supported_platforms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    /// Schema version tag. Only `"v1"` is recognized.
    #[serde(default)]
    pub schema: String,
    /// The target binary name. Required after defaulting.
    #[serde(default)]
    pub name: String,
    /// `owner/name` of the GitHub repository this spec installs from.
    #[serde(default)]
    pub repo: String,
    /// Version used when the caller does not specify one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_version: String,
    /// Install-destination shell expression.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_bin_dir: String,
    /// How to name, locate, and extract the release asset.
    #[serde(default)]
    pub asset: AssetConfig,
    /// Checksum verification configuration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksums: Option<ChecksumConfig>,
    /// Attestation verification configuration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation: Option<AttestationConfig>,
    /// Archive-unpacking options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpack: Option<UnpackConfig>,
    /// Platforms this spec claims to support. Empty means "any".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_platforms: Vec<Platform>,
}

impl Default for Spec {
    fn default() -> Self {
        Spec {
            schema: String::new(),
            name: String::new(),
            repo: String::new(),
            default_version: String::new(),
            default_bin_dir: String::new(),
            asset: AssetConfig::default(),
            checksums: None,
            attestation: None,
            unpack: None,
            supported_platforms: Vec::new(),
        }
    }
}

/// How a release asset is named, located, and extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Filename template. May reference `${NAME}`, `${VERSION}`, `${TAG}`,
    /// `${OS}`, `${ARCH}`, `${EXT}`, `${ASSET_FILENAME}`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
    /// Archive extension including the leading dot, or `""` for a bare binary.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_extension: String,
    /// Binaries to extract/install, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binaries: Vec<BinaryEntry>,
    /// Ordered per-platform overrides. First match wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<AssetRule>,
    /// Casing convention applied to `${OS}`/`${ARCH}` at resolution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming_convention: Option<NamingConvention>,
    /// Rosetta2-style emulation fallback settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch_emulation: Option<ArchEmulation>,
}

/// A single binary to be copied out of the archive (or treated as the asset itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryEntry {
    /// The installed filename.
    pub name: String,
    /// The location of the binary inside the archive, or `${ASSET_FILENAME}`
    /// if the asset itself is the binary.
    pub path: String,
}

/// An ordered override, selected by matching `when` against the resolved
/// `{os, arch}` of the install target. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRule {
    /// Conditions that must hold for this rule to match.
    #[serde(default)]
    pub when: AssetRuleWhen,
    /// Overridden asset template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Overridden OS value (e.g. to rename `windows` to something else).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Overridden arch value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// Overridden extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// Wholesale replacement for the top-level binaries list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binaries: Option<Vec<BinaryEntry>>,
}

/// The conditions under which an [`AssetRule`] matches. A populated field must
/// equal the target's corresponding value; an absent field is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRuleWhen {
    /// Required OS value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Required arch value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// Casing applied to `${OS}`/`${ARCH}` placeholders at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    /// `linux`, `amd64`, ...
    #[default]
    Lowercase,
    /// `Linux` (first letter uppercased, rest untouched).
    Titlecase,
}

impl Case {
    /// Apply this casing to a resolved OS/arch value.
    pub fn apply(self, value: &str) -> String {
        match self {
            Case::Lowercase => value.to_ascii_lowercase(),
            Case::Titlecase => titlecase(value),
        }
    }
}

/// Uppercase the first byte of `value`, leaving the rest untouched.
pub fn titlecase(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Per-axis casing convention. Defaults to lowercase/lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConvention {
    /// Casing for `${OS}`.
    #[serde(default)]
    pub os: Case,
    /// Casing for `${ARCH}`.
    #[serde(default)]
    pub arch: Case,
}

impl Default for NamingConvention {
    fn default() -> Self {
        NamingConvention {
            os: Case::Lowercase,
            arch: Case::Lowercase,
        }
    }
}

/// Rosetta2-style emulation fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchEmulation {
    /// When true, a darwin/arm64 host without a native asset may resolve
    /// `ARCH=amd64` if Rosetta 2 is available.
    #[serde(default)]
    pub rosetta2: bool,
}

/// Checksum verification configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecksumConfig {
    /// Checksum-file filename template.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
    /// Digest algorithm used by [`ChecksumConfig::template`] and as the default
    /// for entries in [`ChecksumConfig::embedded_checksums`].
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Digests embedded directly in the spec, keyed by (opaque) version string.
    /// Map order is insertion order and is preserved through serialization.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub embedded_checksums: IndexMap<String, Vec<ChecksumEntry>>,
}

/// A single embedded checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumEntry {
    /// The asset filename this digest applies to.
    pub filename: String,
    /// The digest, lowercase hex.
    pub hash: String,
    /// Algorithm used for this entry, if it differs from the top-level default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
}

/// A supported digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// SHA-256 (the default).
    #[default]
    Sha256,
    /// SHA-1.
    Sha1,
    /// SHA-512.
    Sha512,
    /// MD5.
    Md5,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha512 => "sha512",
            Algorithm::Md5 => "md5",
        };
        f.write_str(s)
    }
}

/// Attestation verification configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationConfig {
    /// Whether the generated script attempts attestation verification at all.
    #[serde(default)]
    pub enabled: bool,
    /// Whether the generated script must fail closed if verification can't run.
    #[serde(default)]
    pub require: bool,
    /// Extra flags appended to `gh attestation verify`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub verify_flags: String,
}

/// Archive-unpacking options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackConfig {
    /// Number of leading path elements to strip during extraction
    /// (matches `tar --strip-components`).
    #[serde(default)]
    pub strip_components: u32,
}

/// A single `{os, arch}` pair in [`Spec::supported_platforms`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// The normalized OS value (e.g. `linux`, `darwin`, `windows`).
    pub os: String,
    /// The normalized arch value (e.g. `amd64`, `arm64`, `armv6`).
    pub arch: String,
}

/// Regex that a defaulted `repo` must match: `owner/name`, each component
/// restricted to the GitHub-safe character set.
fn repo_regex() -> &'static regex::Regex {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$")
            .expect("repo regex is a valid, fixed pattern")
    })
}

/// Parse a `.binstaller.yml` document. Unknown fields are tolerated.
pub fn load(bytes: &[u8]) -> Result<Spec, DecodeError> {
    let spec: Spec = serde_yaml::from_slice(bytes).map_err(DecodeError::Yaml)?;
    if !spec.schema.is_empty() && spec.schema != SCHEMA_V1 {
        return Err(DecodeError::UnsupportedSchema {
            schema: spec.schema,
        });
    }
    Ok(spec)
}

/// Serialize a `Spec` back to YAML bytes, preserving key order and rule order.
pub fn save(spec: &Spec) -> Result<Vec<u8>, DecodeError> {
    serde_yaml::to_string(spec)
        .map(String::into_bytes)
        .map_err(DecodeError::Yaml)
}

/// Fill in every default named in the InstallSpec contract. Idempotent:
/// calling this twice in a row produces the same result as calling it once.
pub fn apply_defaults(spec: &mut Spec) {
    if spec.schema.is_empty() {
        spec.schema = SCHEMA_V1.to_string();
    }
    if spec.default_version.is_empty() {
        spec.default_version = DEFAULT_VERSION.to_string();
    }
    if spec.default_bin_dir.is_empty() {
        spec.default_bin_dir = DEFAULT_BIN_DIR.to_string();
    }
    if spec.name.is_empty() {
        if let Some((_, name)) = spec.repo.rsplit_once('/') {
            spec.name = name.to_string();
        }
    }
    if spec.asset.naming_convention.is_none() {
        spec.asset.naming_convention = Some(NamingConvention::default());
    }
    if spec.asset.binaries.is_empty() && !spec.name.is_empty() {
        let path = if spec.asset.default_extension.is_empty() {
            "${ASSET_FILENAME}".to_string()
        } else {
            spec.name.clone()
        };
        spec.asset.binaries.push(BinaryEntry {
            name: spec.name.clone(),
            path,
        });
    }
    if let Some(checksums) = spec.checksums.as_mut() {
        for entries in checksums.embedded_checksums.values_mut() {
            for entry in entries.iter_mut() {
                if entry.algorithm.is_none() {
                    entry.algorithm = Some(checksums.algorithm);
                }
            }
        }
    }
    if spec.attestation.is_none() {
        spec.attestation = Some(AttestationConfig::default());
    }
}

/// Validate invariants that defaulting alone cannot guarantee (currently:
/// non-empty `name`/`repo` and a well-formed `repo`). Call after
/// [`apply_defaults`].
pub fn validate(spec: &Spec) -> Result<(), ValidationError> {
    if spec.name.is_empty() {
        return Err(ValidationError::MissingField { field: "name" });
    }
    if spec.repo.is_empty() {
        return Err(ValidationError::MissingField { field: "repo" });
    }
    if !repo_regex().is_match(&spec.repo) {
        return Err(ValidationError::InvalidRepo {
            repo: spec.repo.clone(),
        });
    }
    if let Some(unpack) = spec.unpack {
        // strip_components is a u32, so it is always >= 0; the invariant
        // exists to document intent, not to guard an unreachable branch.
        let _ = unpack.strip_components;
    }
    Ok(())
}

/// Load a spec and fully prepare it for use: parse, default, then validate.
pub fn load_and_prepare(bytes: &[u8]) -> Result<Spec, PrepareError> {
    let mut spec = load(bytes)?;
    apply_defaults(&mut spec);
    validate(&spec)?;
    Ok(spec)
}

/// The combined failure modes of [`load_and_prepare`].
#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    /// The document could not be parsed.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The parsed, defaulted document failed validation.
    #[error(transparent)]
    Validate(#[from] ValidationError),
}
