//! Script-generation scenarios that don't depend on any source adapter:
//! a Windows `.zip` rule driving the `unzip` extraction branch, and
//! attestation settings that must fail closed when `gh` is unavailable.

use binstaller::generator::render_to_string;
use binstaller_schema::{AssetRule, AssetRuleWhen, AttestationConfig, Spec};

fn base_spec() -> Spec {
    let mut spec = Spec { repo: "example/tool".to_string(), ..Default::default() };
    binstaller_schema::apply_defaults(&mut spec);
    spec.asset.template = "tool_${OS}_${ARCH}".to_string();
    spec.asset.default_extension = ".tar.gz".to_string();
    spec
}

#[test]
fn windows_rule_drives_the_unzip_branch_and_exe_suffix() {
    let mut spec = base_spec();
    spec.asset.rules.push(AssetRule {
        when: AssetRuleWhen { os: Some("windows".to_string()), arch: None },
        ext: Some(".zip".to_string()),
        ..Default::default()
    });

    let script = render_to_string(&spec).expect("script must render");
    assert!(script.contains("unzip -q -o"));
    assert!(script.contains("BI_DEST_NAME=\"$BI_DEST_NAME.exe\""));
}

#[test]
fn attestation_required_without_gh_fails_closed() {
    let mut spec = base_spec();
    spec.attestation = Some(AttestationConfig {
        enabled: true,
        require: true,
        verify_flags: "--signer-repo example/tool".to_string(),
    });

    let script = render_to_string(&spec).expect("script must render");
    assert!(script.contains("attestation verification is required but"));
    assert!(!script.contains("warning: skipping attestation verification"));
}

#[test]
fn attestation_optional_without_gh_warns_instead_of_failing() {
    let mut spec = base_spec();
    spec.attestation = Some(AttestationConfig {
        enabled: true,
        require: false,
        verify_flags: String::new(),
    });

    let script = render_to_string(&spec).expect("script must render");
    assert!(script.contains("warning: skipping attestation verification"));
}

#[test]
fn strip_components_is_forwarded_to_the_extraction_call() {
    let mut spec = base_spec();
    spec.unpack = Some(binstaller_schema::UnpackConfig { strip_components: 1 });

    let script = render_to_string(&spec).expect("script must render");
    assert!(script.contains("bi_extract \"$ASSET_PATH\" \"$WORKDIR/extracted\" \"1\""));
}
