//! Aqua-registry-sourced specs, including the rule-ordering-sensitive
//! darwin/arm64 zip override, entirely from local fixtures.

use camino::Utf8PathBuf;

fn fixture(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[tokio::test]
async fn gh_aqua_spec_has_a_windows_zip_override() {
    let settings = binstaller::net::ClientSettings::default();
    let client = binstaller::net::create_axoasset_client(settings).unwrap();
    let workdir = fixture("aqua-gh");

    let spec = binstaller::adapters::aqua::build("cli/gh", Some(&workdir), None, "main", None, &client)
        .await
        .expect("aqua adapter must succeed against the local fixture");

    assert_eq!(spec.name, "gh");
    assert_eq!(spec.asset.template, "gh_${TAG}_${OS}_${ARCH}.tar.gz");
    assert_eq!(spec.asset.default_extension, ".tar.gz");
    assert_eq!(spec.asset.rules.len(), 1);
    assert_eq!(spec.asset.rules[0].when.os.as_deref(), Some("windows"));
    assert_eq!(spec.asset.rules[0].ext.as_deref(), Some(".zip"));

    assert_eq!(
        spec.checksums.as_ref().map(|c| c.template.as_str()),
        Some("gh_${TAG}_${OS}_${ARCH}.tar.gz.sha256")
    );

    assert_eq!(spec.asset.binaries.len(), 1);
    assert_eq!(spec.asset.binaries[0].name, "gh");
    assert_eq!(spec.asset.binaries[0].path, "gh_${TAG}_${OS}_${ARCH}.tar.gz_bin");

    assert!(spec.supported_platforms.iter().any(|p| p.os == "darwin" && p.arch == "arm64"));
}

#[tokio::test]
async fn darwin_arm64_override_is_checked_before_generic_windows_rule() {
    let settings = binstaller::net::ClientSettings::default();
    let client = binstaller::net::create_axoasset_client(settings).unwrap();
    let workdir = fixture("aqua-darwin-override");

    let spec = binstaller::adapters::aqua::build("example/tool", Some(&workdir), None, "main", None, &client)
        .await
        .expect("aqua adapter must succeed against the local fixture");

    // Order is preserved exactly as declared: darwin/arm64 first, then windows.
    assert_eq!(spec.asset.rules.len(), 2);
    assert_eq!(spec.asset.rules[0].when.os.as_deref(), Some("darwin"));
    assert_eq!(spec.asset.rules[0].when.arch.as_deref(), Some("arm64"));
    assert_eq!(spec.asset.rules[0].ext.as_deref(), Some(".zip"));
    assert_eq!(spec.asset.rules[0].template.as_deref(), Some("tool_${TAG}_darwin_arm64.zip"));
    assert_eq!(spec.asset.rules[1].when.os.as_deref(), Some("windows"));

    let script = binstaller::generator::render_to_string(&spec).expect("script must render");
    // The darwin/arm64 rule text must appear before the windows rule text,
    // so the shell's first-match-wins loop checks it first.
    let darwin_pos = script.find("\"darwin\"").expect("darwin rule present");
    let windows_pos = script.find("\"windows\"").expect("windows rule present");
    assert!(darwin_pos < windows_pos);
}

#[tokio::test]
async fn override_with_its_own_files_is_rendered_into_the_script() {
    let settings = binstaller::net::ClientSettings::default();
    let client = binstaller::net::create_axoasset_client(settings).unwrap();
    let workdir = fixture("aqua-file-override");

    let spec =
        binstaller::adapters::aqua::build("example/multitool", Some(&workdir), None, "main", None, &client)
            .await
            .expect("aqua adapter must succeed against the local fixture");

    assert_eq!(spec.asset.rules.len(), 1);
    let rule = &spec.asset.rules[0];
    assert_eq!(rule.when.os.as_deref(), Some("windows"));
    let binaries = rule.binaries.as_ref().expect("windows override carries its own files");
    assert_eq!(binaries.len(), 1);
    assert_eq!(binaries[0].name, "multitool");
    assert_eq!(binaries[0].path, "multitool.exe");

    // The generated script must actually select the override's binaries at
    // install time rather than silently falling back to the top-level list.
    let script = binstaller::generator::render_to_string(&spec).expect("script must render");
    assert!(script.contains("BI_BINARIES_OVERRIDE=1"));
    assert!(script.contains("multitool.exe"));
}
