//! GoReleaser-sourced spec for a Linux/amd64 install, end to end through
//! spec generation and script rendering, entirely from local fixtures (no
//! network access).

use binstaller::generator::render_to_string;
use camino::Utf8PathBuf;

fn fixture(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[tokio::test]
async fn reviewdog_goreleaser_spec_renders_a_valid_script() {
    let settings = binstaller::net::ClientSettings::default();
    let client = binstaller::net::create_axoasset_client(settings).unwrap();
    let workdir = fixture("goreleaser-reviewdog");

    let spec = binstaller::adapters::goreleaser::build(
        "reviewdog/reviewdog",
        Some(&workdir),
        None,
        "HEAD",
        None,
        &client,
    )
    .await
    .expect("goreleaser adapter must succeed against the local fixture");

    assert_eq!(spec.name, "reviewdog");
    assert_eq!(spec.asset.default_extension, ".tar.gz");
    assert_eq!(spec.asset.template, "${NAME}_${VERSION}_${OS}_${ARCH}${EXT}");
    assert!(spec
        .asset
        .rules
        .iter()
        .any(|r| r.when.os.as_deref() == Some("windows") && r.ext.as_deref() == Some(".zip")));
    assert!(spec
        .supported_platforms
        .iter()
        .any(|p| p.os == "darwin" && p.arch == "arm64"));
    assert!(!spec.supported_platforms.iter().any(|p| p.os == "windows" && p.arch == "arm64"));

    let script = render_to_string(&spec).expect("script must render");
    assert!(script.contains("NAME=\"reviewdog\""));
    assert!(script.contains("REPO=\"reviewdog/reviewdog\""));
    assert!(script.contains("bi_detect_os"));
    assert!(script.contains(".zip"));
}
