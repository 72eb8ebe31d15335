//! Platform identification: the `{os, arch}` pairs binstaller resolves
//! release assets against, and the handful of OS/arch string dialects
//! upstream sources use to spell them.
//!
//! Grounded in the normalization tables of `cargo-dist/src/platform.rs`
//! (there: `SupportQuality`/Rosetta2 fallback logic over target-triples;
//! here: GOOS/GOARCH style pairs, since GitHub release assets are named
//! after Go's platform vocabulary far more often than Rust's triples).

use std::fmt;

/// A resolved installation target, always already lowercase-canonical:
/// `linux`/`darwin`/`windows` and `amd64`/`arm64`/`386`/`armv6`/`armv7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    /// Canonical OS name.
    pub os: &'static str,
    /// Canonical arch name.
    pub arch: &'static str,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// The platform matrix binstaller targets by default when a source doesn't
/// enumerate one explicitly. Mirrors the GOOS/GOARCH combinations GoReleaser
/// ships out of the box for `goos: [linux, darwin, windows]` /
/// `goarch: [amd64, arm64]`, plus the two common 32-bit ARM variants.
pub const DEFAULT_TARGETS: &[Target] = &[
    Target { os: "linux", arch: "amd64" },
    Target { os: "linux", arch: "arm64" },
    Target { os: "linux", arch: "armv6" },
    Target { os: "linux", arch: "armv7" },
    Target { os: "linux", arch: "386" },
    Target { os: "darwin", arch: "amd64" },
    Target { os: "darwin", arch: "arm64" },
    Target { os: "windows", arch: "amd64" },
    Target { os: "windows", arch: "386" },
];

/// Expand a GoReleaser-style `goarm` list (`["6", "7"]`) against a base
/// `arm` arch entry into the `armv6`/`armv7` targets we use internally,
/// honoring an `ignore` list of `{goos, goarch, goarm}` triples the same
/// way GoReleaser's build matrix does: an ignored combination is dropped,
/// not replaced.
pub fn expand_goarm(
    os: &str,
    goarm_values: &[String],
    is_ignored: impl Fn(&str, &str) -> bool,
) -> Vec<Target> {
    goarm_values
        .iter()
        .filter(|v| !is_ignored(os, v))
        .filter_map(|v| match v.as_str() {
            "6" => Some(Target { os: leak_os(os), arch: "armv6" }),
            "7" => Some(Target { os: leak_os(os), arch: "armv7" }),
            _ => None,
        })
        .collect()
}

fn leak_os(os: &str) -> &'static str {
    match os {
        "linux" => "linux",
        "darwin" => "darwin",
        "windows" => "windows",
        other => Box::leak(other.to_string().into_boxed_str()),
    }
}

/// Normalize a free-form OS string (as seen in upstream metadata or a user's
/// `uname -s`) to binstaller's canonical spelling. Returns `None` for
/// anything unrecognized rather than guessing.
pub fn normalize_os(raw: &str) -> Option<&'static str> {
    match raw.to_ascii_lowercase().as_str() {
        "linux" => Some("linux"),
        "darwin" | "macos" | "osx" => Some("darwin"),
        "windows" | "win" | "win32" | "win64" => Some("windows"),
        _ => None,
    }
}

/// Normalize a free-form arch string to binstaller's canonical spelling.
pub fn normalize_arch(raw: &str) -> Option<&'static str> {
    match raw.to_ascii_lowercase().as_str() {
        "amd64" | "x86_64" | "x64" => Some("amd64"),
        "arm64" | "aarch64" => Some("arm64"),
        "386" | "i386" | "x86" => Some("386"),
        "armv6" | "arm6" => Some("armv6"),
        "armv7" | "arm7" | "arm" => Some("armv7"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_aliases() {
        assert_eq!(normalize_os("Darwin"), Some("darwin"));
        assert_eq!(normalize_os("osx"), Some("darwin"));
        assert_eq!(normalize_arch("x86_64"), Some("amd64"));
        assert_eq!(normalize_arch("aarch64"), Some("arm64"));
    }

    #[test]
    fn unknown_values_do_not_guess() {
        assert_eq!(normalize_os("plan9"), None);
        assert_eq!(normalize_arch("riscv64"), None);
    }

    #[test]
    fn expand_goarm_drops_ignored_combinations() {
        let targets = expand_goarm("linux", &["6".to_string(), "7".to_string()], |os, v| {
            os == "linux" && v == "6"
        });
        assert_eq!(targets, vec![Target { os: "linux", arch: "armv7" }]);
    }
}
