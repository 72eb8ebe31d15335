//! Checksum embedding and the installer script's use of embedded digests
//! instead of a network round trip.

use binstaller::checksum::parse_checksum_file;
use binstaller::generator::render_to_string;
use binstaller_schema::{Algorithm, ChecksumConfig, ChecksumEntry, Spec};
use indexmap::IndexMap;

#[test]
fn parses_a_mixed_checksum_file() {
    let text = "\
deadbeef  tool-linux-amd64.tar.gz
cafebabe *tool-darwin-arm64.tar.gz
01234567 tool-windows-amd64.zip
";
    let entries = parse_checksum_file(text, Algorithm::Sha256);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].filename, "tool-darwin-arm64.tar.gz");
    assert_eq!(entries[1].hash, "cafebabe");
}

#[test]
fn embedded_checksum_is_rendered_inline_and_skips_the_checksum_file_fallback() {
    let mut spec = Spec { repo: "example/tool".to_string(), ..Default::default() };
    binstaller_schema::apply_defaults(&mut spec);
    spec.asset.template = "tool_${OS}_${ARCH}".to_string();
    spec.asset.default_extension = ".tar.gz".to_string();

    let mut embedded = IndexMap::new();
    embedded.insert(
        "v1.2.3".to_string(),
        vec![ChecksumEntry {
            filename: "tool_linux_amd64.tar.gz".to_string(),
            hash: "deadbeef".to_string(),
            algorithm: Some(Algorithm::Sha256),
        }],
    );
    spec.checksums = Some(ChecksumConfig {
        template: "tool_checksums.txt".to_string(),
        algorithm: Algorithm::Sha256,
        embedded_checksums: embedded,
    });

    let script = render_to_string(&spec).expect("script must render");
    assert!(script.contains("tool_linux_amd64.tar.gz"));
    assert!(script.contains("deadbeef"));
    // The embedded lookup must appear before the checksum-file fallback, so
    // the fallback is only reached if CHECKSUM_HASH is still unset.
    let embedded_pos = script.find("CHECKSUM_HASH=\"deadbeef\"").unwrap();
    let fallback_pos = script.find("CHECKSUM_TEMPLATE=").unwrap();
    assert!(embedded_pos < fallback_pos);
}
