use super::*;

fn minimal_spec() -> Spec {
    Spec {
        repo: "reviewdog/reviewdog".to_string(),
        ..Default::default()
    }
}

#[test]
fn defaults_fill_name_from_repo() {
    let mut spec = minimal_spec();
    apply_defaults(&mut spec);
    assert_eq!(spec.name, "reviewdog");
    assert_eq!(spec.schema, "v1");
    assert_eq!(spec.default_version, "latest");
    assert_eq!(spec.default_bin_dir, DEFAULT_BIN_DIR);
}

#[test]
fn defaults_are_idempotent() {
    let mut once = minimal_spec();
    apply_defaults(&mut once);
    let mut twice = once.clone();
    apply_defaults(&mut twice);
    assert_eq!(once, twice);
}

#[test]
fn defaults_binary_path_is_asset_filename_when_no_extension() {
    let mut spec = minimal_spec();
    apply_defaults(&mut spec);
    assert_eq!(
        spec.asset.binaries,
        vec![BinaryEntry {
            name: "reviewdog".to_string(),
            path: "${ASSET_FILENAME}".to_string(),
        }]
    );
}

#[test]
fn defaults_binary_path_is_name_when_extension_present() {
    let mut spec = minimal_spec();
    spec.asset.default_extension = ".tar.gz".to_string();
    apply_defaults(&mut spec);
    assert_eq!(
        spec.asset.binaries,
        vec![BinaryEntry {
            name: "reviewdog".to_string(),
            path: "reviewdog".to_string(),
        }]
    );
}

#[test]
fn defaults_do_not_clobber_explicit_binaries() {
    let mut spec = minimal_spec();
    spec.asset.binaries = vec![BinaryEntry {
        name: "custom".to_string(),
        path: "bin/custom".to_string(),
    }];
    apply_defaults(&mut spec);
    assert_eq!(spec.asset.binaries.len(), 1);
    assert_eq!(spec.asset.binaries[0].name, "custom");
}

#[test]
fn embedded_checksum_algorithm_defaults_from_top_level() {
    let mut spec = minimal_spec();
    spec.checksums = Some(ChecksumConfig {
        template: "${ASSET_FILENAME}.sha256".to_string(),
        algorithm: Algorithm::Sha512,
        embedded_checksums: IndexMap::from([(
            "v1.0.0".to_string(),
            vec![ChecksumEntry {
                filename: "tool-linux-amd64.tar.gz".to_string(),
                hash: "deadbeef".to_string(),
                algorithm: None,
            }],
        )]),
    });
    apply_defaults(&mut spec);
    let entries = &spec.checksums.unwrap().embedded_checksums["v1.0.0"];
    assert_eq!(entries[0].algorithm, Some(Algorithm::Sha512));
}

#[test]
fn validate_rejects_missing_name_or_repo() {
    let spec = Spec::default();
    assert!(matches!(
        validate(&spec),
        Err(ValidationError::MissingField { field: "name" })
    ));

    let mut with_name = Spec::default();
    with_name.name = "tool".to_string();
    assert!(matches!(
        validate(&with_name),
        Err(ValidationError::MissingField { field: "repo" })
    ));
}

#[test]
fn validate_rejects_malformed_repo() {
    let mut spec = minimal_spec();
    apply_defaults(&mut spec);
    spec.repo = "not-a-valid-repo".to_string();
    assert!(matches!(
        validate(&spec),
        Err(ValidationError::InvalidRepo { .. })
    ));
}

#[test]
fn round_trip_preserves_rule_order() {
    let mut spec = minimal_spec();
    spec.asset.rules = vec![
        AssetRule {
            when: AssetRuleWhen {
                os: Some("darwin".to_string()),
                arch: Some("arm64".to_string()),
            },
            ext: Some(".zip".to_string()),
            ..Default::default()
        },
        AssetRule {
            when: AssetRuleWhen {
                os: Some("windows".to_string()),
                arch: None,
            },
            ext: Some(".zip".to_string()),
            ..Default::default()
        },
    ];
    apply_defaults(&mut spec);

    let bytes = save(&spec).unwrap();
    let reloaded = load(&bytes).unwrap();
    assert_eq!(reloaded.asset.rules, spec.asset.rules);
}

#[test]
fn round_trip_key_order_matches_contract() {
    let mut spec = minimal_spec();
    apply_defaults(&mut spec);
    let bytes = save(&spec).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let keys: Vec<&str> = text
        .lines()
        .filter(|l| !l.starts_with(' ') && !l.starts_with('-') && l.contains(':'))
        .map(|l| l.split(':').next().unwrap())
        .collect();
    let expected = [
        "schema",
        "name",
        "repo",
        "default_version",
        "default_bin_dir",
        "asset",
    ];
    assert_eq!(&keys[..expected.len()], expected);
}

#[test]
fn load_rejects_unsupported_schema() {
    let bytes = b"schema: v2\nname: foo\nrepo: a/b\n";
    assert!(matches!(
        load(bytes),
        Err(DecodeError::UnsupportedSchema { .. })
    ));
}

#[test]
fn titlecase_only_uppercases_first_byte() {
    assert_eq!(titlecase("darwin"), "Darwin");
    assert_eq!(titlecase(""), "");
    assert_eq!(Case::Titlecase.apply("windows"), "Windows");
    assert_eq!(Case::Lowercase.apply("WINDOWS"), "windows");
}
