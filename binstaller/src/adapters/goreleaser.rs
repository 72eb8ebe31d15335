//! Translates a `.goreleaser.yml`/`.goreleaser.yaml` into an [`Spec`].
//!
//! GoReleaser's own config schema is huge; binstaller only reads the
//! archive-naming and build-matrix pieces it needs, the same narrow-reading
//! style `cargo-dist`'s adapters use against `Cargo.toml` (read a handful of
//! fields, ignore the rest via `#[serde(default)]` everywhere).

use axoasset::AxoClient;
use binstaller_schema::{
    ArchEmulation, AssetConfig, AssetRule, AssetRuleWhen, Case, NamingConvention, Platform, Spec,
    UnpackConfig,
};
use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::adapters::{finalize, load_config_text, SourceLocation};
use crate::errors::{BinstallerError, DistResult};
use crate::platform::{self, Target};
use crate::templating::{goreleaser_dialect, translate};

/// The narrow slice of `.goreleaser.yml` binstaller reads.
#[derive(Debug, Deserialize)]
struct GoreleaserConfig {
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    builds: Vec<BuildConfig>,
    #[serde(default)]
    archives: Vec<ArchiveConfig>,
    #[serde(default)]
    checksum: Option<ChecksumBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct BuildConfig {
    #[serde(default)]
    goos: Vec<String>,
    #[serde(default)]
    goarch: Vec<String>,
    #[serde(default)]
    goarm: Vec<String>,
    #[serde(default)]
    ignore: Vec<IgnoreEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct IgnoreEntry {
    #[serde(default)]
    goos: String,
    #[serde(default)]
    goarch: String,
    #[serde(default)]
    goarm: String,
}

#[derive(Debug, Default, Deserialize)]
struct ArchiveConfig {
    #[serde(default)]
    format: String,
    #[serde(default)]
    name_template: String,
    #[serde(default)]
    format_overrides: Vec<GoreleaserFormatOverride>,
    #[serde(default)]
    wrap_in_directory: String,
}

#[derive(Debug, Default, Deserialize)]
struct GoreleaserFormatOverride {
    #[serde(default)]
    goos: String,
    #[serde(default)]
    format: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChecksumBlock {
    #[serde(default)]
    name_template: String,
    #[serde(default, rename = "algorithm")]
    algorithm: String,
}

/// Build a [`Spec`] from a repo's GoReleaser config.
///
/// `file_override`, if given, is tried before any `workdir`-conventional
/// filename. `git_ref` selects which commit/branch a remote fallback fetch
/// reads from (`"HEAD"` for the repo's default branch). `name_override`, if
/// given, replaces the name the config would otherwise infer.
pub async fn build(
    repo: &str,
    workdir: Option<&Utf8PathBuf>,
    file_override: Option<&Utf8PathBuf>,
    git_ref: &str,
    name_override: Option<&str>,
    client: &AxoClient,
) -> DistResult<Spec> {
    let mut local_candidates = file_override.cloned().into_iter().collect::<Vec<_>>();
    if let Some(dir) = workdir {
        local_candidates.push(dir.join(".goreleaser.yml"));
        local_candidates.push(dir.join(".goreleaser.yaml"));
    }
    let location = SourceLocation { repo: repo.to_string(), local_candidates };
    let remote_url = format!("https://raw.githubusercontent.com/{repo}/{git_ref}/.goreleaser.yml");
    let text = load_config_text(&location, &remote_url, client, "a GoReleaser config").await?;
    let config: GoreleaserConfig =
        serde_yaml::from_str(&text).map_err(|source| BinstallerError::SourceParse {
            what: "a GoReleaser config",
            source,
        })?;

    let name = if let Some(name) = name_override {
        name.to_string()
    } else if config.project_name.is_empty() {
        repo.rsplit_once('/').map(|(_, n)| n.to_string()).unwrap_or_default()
    } else {
        config.project_name.clone()
    };

    let dialect = goreleaser_dialect();
    let archive = config.archives.first();
    let format = archive.map(|a| a.format.as_str()).unwrap_or("tar.gz");
    let default_extension = format_to_extension(format);

    let raw_template = archive
        .map(|a| a.name_template.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or("{{ .ProjectName }}_{{ .Os }}_{{ .Arch }}");
    let mut translated = translate(raw_template, &dialect)
        .map_err(|reason| BinstallerError::TemplateTranslate {
            template: raw_template.to_string(),
            reason,
        })?;
    if !translated.template.ends_with("${EXT}") {
        translated.template.push_str("${EXT}");
    }

    let os_titlecase = raw_template.contains("title .Os") || raw_template.contains("title .OS");

    let mut asset = AssetConfig {
        template: translated.template,
        default_extension,
        rules: translated.rules,
        naming_convention: if os_titlecase {
            Some(NamingConvention { os: Case::Titlecase, arch: Case::Lowercase })
        } else {
            None
        },
        arch_emulation: Some(ArchEmulation { rosetta2: true }),
        ..Default::default()
    };

    if let Some(archive) = archive {
        apply_format_override_rules(&archive.format_overrides, &mut asset);
    }

    let checksums = config.checksum.as_ref().map(|c| {
        let template = if c.name_template.is_empty() {
            format!("{name}_checksums.txt")
        } else {
            c.name_template.clone()
        };
        binstaller_schema::ChecksumConfig {
            template,
            algorithm: parse_algorithm(&c.algorithm),
            embedded_checksums: Default::default(),
        }
    });

    let supported_platforms = compute_supported_platforms(&config.builds);

    let unpack = archive
        .filter(|a| a.wrap_in_directory == "true")
        .map(|_| UnpackConfig { strip_components: 1 });

    let spec = Spec {
        name,
        repo: repo.to_string(),
        asset,
        checksums,
        unpack,
        supported_platforms,
        ..Default::default()
    };
    finalize(spec)
}

/// `supported_platforms` is the cartesian product of each build's
/// `goos × goarch`, minus anything the build's `ignore` list excludes, with
/// `arm` expanded into `armv6`/`armv7` via `goarm`. Only pairs binstaller
/// actually knows how to resolve at install time (`platform::DEFAULT_TARGETS`)
/// survive, so an exotic GOOS/GOARCH combination a project builds for but
/// binstaller can't detect at runtime doesn't show up as "supported".
fn compute_supported_platforms(builds: &[BuildConfig]) -> Vec<Platform> {
    let mut targets: Vec<Target> = Vec::new();
    for build in builds {
        for raw_os in &build.goos {
            let Some(os) = platform::normalize_os(raw_os) else { continue };
            for raw_arch in &build.goarch {
                if raw_arch == "arm" && !build.goarm.is_empty() {
                    targets.extend(platform::expand_goarm(os, &build.goarm, |o, v| {
                        build
                            .ignore
                            .iter()
                            .any(|i| ignore_matches(i, o, "arm", v))
                    }));
                    continue;
                }
                let Some(arch) = platform::normalize_arch(raw_arch) else { continue };
                if build.ignore.iter().any(|i| ignore_matches(i, os, arch, "")) {
                    continue;
                }
                targets.push(Target { os, arch });
            }
        }
    }

    targets.sort();
    targets.dedup();
    targets
        .into_iter()
        .filter(|t| platform::DEFAULT_TARGETS.contains(t))
        .map(|t| Platform { os: t.os.to_string(), arch: t.arch.to_string() })
        .collect()
}

fn ignore_matches(entry: &IgnoreEntry, os: &str, arch: &str, goarm: &str) -> bool {
    (entry.goos.is_empty() || entry.goos == os)
        && (entry.goarch.is_empty() || entry.goarch == arch)
        && (entry.goarm.is_empty() || entry.goarm == goarm)
}

fn format_to_extension(format: &str) -> String {
    match format {
        "zip" => ".zip".to_string(),
        "tar" => ".tar".to_string(),
        "tar.gz" | "tgz" | "" => ".tar.gz".to_string(),
        "binary" => String::new(),
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

/// `archives[].format_overrides` lets a GoReleaser config ship a different
/// archive format for a specific `goos` (Windows zips while everything else
/// tars, for instance). Each override becomes an OS-scoped rule so the
/// generated installer picks the right extension per platform.
fn apply_format_override_rules(overrides: &[GoreleaserFormatOverride], asset: &mut AssetConfig) {
    for over in overrides {
        if over.goos.is_empty() || over.format.is_empty() {
            continue;
        }
        let ext = format_to_extension(&over.format);
        asset.rules.push(AssetRule {
            when: AssetRuleWhen { os: Some(over.goos.clone()), arch: None },
            ext: Some(ext),
            ..Default::default()
        });
    }
}
