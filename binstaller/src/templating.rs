//! Translates a source-specific filename template (GoReleaser's Go-template
//! syntax, Aqua's `{{ }}` expressions) into binstaller's own `${VAR}`
//! placeholder syntax, plus — when the template branches on OS/arch — the
//! [`binstaller_schema::AssetRule`] list that reproduces that branching.
//!
//! A single generic evaluator serves both dialects, the way
//! `cargo-dist/src/backend/templates.rs`'s `Templates` struct serves both the
//! plain and yaml-flavored template sets from one engine distinguished only
//! by its `Environment` configuration: here the axis of variation is a
//! `Dialect`'s variable table and function whitelist, not template syntax.

use std::collections::BTreeMap;

use binstaller_schema::{AssetRule, AssetRuleWhen};

/// A source-specific vocabulary: which `{{ .Field }}` names map to which
/// binstaller placeholder, and which template functions are safe to treat
/// as pass-through.
pub struct Dialect {
    /// Template variable name -> binstaller placeholder (without `${}`).
    pub variables: BTreeMap<&'static str, &'static str>,
    /// Template function name -> how it's resolved.
    pub functions: BTreeMap<&'static str, FunctionBehavior>,
    /// The variable name used in `{{if eq .Field "literal"}}` branches that
    /// this dialect allows the rule-extraction pre-pass to turn into
    /// `AssetRule`s. GoReleaser branches on `.Arch`/`.Os`; Aqua templates
    /// don't branch at all, so its dialect leaves this empty.
    pub branchable_fields: BTreeMap<&'static str, BranchTarget>,
}

/// What a whitelisted template function does to its single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionBehavior {
    /// The function is the identity on its argument's resolved placeholder
    /// (e.g. GoReleaser's `title` applied to a value binstaller already
    /// lowercases/titlecases itself via `NamingConvention`).
    Identity,
    /// The function always evaluates to a fixed placeholder regardless of
    /// its argument (e.g. `trimV` on `.Version`, which just strips a `v`
    /// prefix binstaller's own `${VERSION}` already excludes).
    Constant(&'static str),
}

/// Which part of an [`AssetRuleWhen`] a branchable field feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTarget {
    /// The branch constrains `when.os`.
    Os,
    /// The branch constrains `when.arch`.
    Arch,
}

/// GoReleaser's `nfpm`/archive `name_template` vocabulary.
pub fn goreleaser_dialect() -> Dialect {
    let mut variables = BTreeMap::new();
    variables.insert("ProjectName", "NAME");
    variables.insert("Binary", "NAME");
    variables.insert("Version", "VERSION");
    variables.insert("Tag", "TAG");
    variables.insert("Os", "OS");
    variables.insert("Arch", "ARCH");

    let mut functions = BTreeMap::new();
    functions.insert("title", FunctionBehavior::Identity);
    functions.insert("tolower", FunctionBehavior::Identity);
    functions.insert("toupper", FunctionBehavior::Identity);
    functions.insert("trim", FunctionBehavior::Identity);
    functions.insert("replace", FunctionBehavior::Identity);
    functions.insert("trimprefix", FunctionBehavior::Identity);
    functions.insert("trimsuffix", FunctionBehavior::Identity);

    let mut branchable_fields = BTreeMap::new();
    branchable_fields.insert("Os", BranchTarget::Os);
    branchable_fields.insert("Arch", BranchTarget::Arch);

    Dialect { variables, functions, branchable_fields }
}

/// Aqua registry's `asset`/`format` template vocabulary. Aqua templates
/// don't carry conditionals of their own — per-platform variation lives in
/// `registry.yaml`'s own `overrides` list, which the Aqua adapter turns into
/// `AssetRule`s directly — so `branchable_fields` is empty here.
pub fn aqua_dialect() -> Dialect {
    let mut variables = BTreeMap::new();
    variables.insert("Version", "TAG");
    variables.insert("SemVer", "VERSION");
    variables.insert("OS", "OS");
    variables.insert("Arch", "ARCH");
    variables.insert("Format", "EXT");
    variables.insert("Asset", "ASSET_FILENAME");

    let mut functions = BTreeMap::new();
    functions.insert("title", FunctionBehavior::Identity);
    functions.insert("trimV", FunctionBehavior::Constant("VERSION"));

    Dialect {
        variables,
        functions,
        branchable_fields: BTreeMap::new(),
    }
}

/// Everything translation produced: the rewritten template text (binstaller
/// placeholder syntax) plus any rules extracted from conditionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// The template with every `{{ }}` expression replaced by `${VAR}`.
    pub template: String,
    /// Rules extracted from `{{if eq .Field "..."}}` chains, in source order.
    pub rules: Vec<AssetRule>,
}

/// Translate `source` under `dialect`. Unknown variables or functions are a
/// hard error: binstaller never silently drops upstream template logic.
pub fn translate(source: &str, dialect: &Dialect) -> Result<Translation, String> {
    translate_with(source, dialect, &BTreeMap::new())
}

/// Like [`translate`], but resolves any variable name found in `extra`
/// directly to its literal string value rather than through `dialect`'s
/// static placeholder table. Used for per-call bindings such as Aqua's
/// `AssetWithoutExt`, whose value depends on the asset template already
/// translated for this particular package, not on a fixed `${VAR}` mapping.
pub fn translate_with(
    source: &str,
    dialect: &Dialect,
    extra: &BTreeMap<&str, String>,
) -> Result<Translation, String> {
    let (stripped, rules) = extract_conditional_rules(source, dialect, extra)?;
    let template = substitute(&stripped, dialect, extra)?;
    Ok(Translation { template, rules })
}

/// Replace plain `{{.Var}}` and `{{func .Var}}` expressions with `${VAR}`.
fn substitute(source: &str, dialect: &Dialect, extra: &BTreeMap<&str, String>) -> Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or_else(|| "unterminated {{ }} expression".to_string())?;
        let expr = after_open[..close].trim();
        out.push_str(&resolve_expr(expr, dialect, extra)?);
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_expr(expr: &str, dialect: &Dialect, extra: &BTreeMap<&str, String>) -> Result<String, String> {
    let parts: Vec<&str> = expr.split_whitespace().collect();
    match parts.as_slice() {
        [var] if var.starts_with('.') => resolve_var(&var[1..], dialect, extra),
        [func, var] if var.starts_with('.') => {
            let behavior = dialect
                .functions
                .get(func)
                .ok_or_else(|| format!("unknown template function {func:?}"))?;
            match behavior {
                FunctionBehavior::Identity => resolve_var(&var[1..], dialect, extra),
                FunctionBehavior::Constant(placeholder) => Ok(format!("${{{placeholder}}}")),
            }
        }
        _ => Err(format!("unsupported template expression {expr:?}")),
    }
}

fn resolve_var(name: &str, dialect: &Dialect, extra: &BTreeMap<&str, String>) -> Result<String, String> {
    if let Some(literal) = extra.get(name) {
        return Ok(literal.clone());
    }
    dialect
        .variables
        .get(name)
        .map(|placeholder| format!("${{{placeholder}}}"))
        .ok_or_else(|| format!("unknown template variable {name:?}"))
}

/// Pull `{{if eq .Field "literal"}}text{{else if eq .Field "literal2"}}text2{{else}}text3{{end}}`
/// chains out of `source`, turning each arm into an [`AssetRule`] whose
/// `template` is the arm's literal text (itself substituted later), and
/// replacing the whole chain with a single placeholder segment so the
/// remaining text can be translated normally. A chain's `else` arm, if any,
/// becomes the base template rather than a rule (it matches by falling
/// through, the same way an unconditional default does in `AssetConfig`).
fn extract_conditional_rules(
    source: &str,
    dialect: &Dialect,
    extra: &BTreeMap<&str, String>,
) -> Result<(String, Vec<AssetRule>), String> {
    if dialect.branchable_fields.is_empty() {
        return Ok((source.to_string(), Vec::new()));
    }

    let mut out = String::with_capacity(source.len());
    let mut rules = Vec::new();
    let mut rest = source;

    while let Some(if_pos) = find_tag(rest, "if") {
        out.push_str(&rest[..if_pos.tag_start]);

        let cond = parse_eq_condition(&if_pos.inner, dialect)?;
        let mut arms: Vec<(Option<AssetRuleWhen>, String)> = Vec::new();
        arms.push((Some(cond), String::new()));

        let mut cursor = if_pos.tag_end;
        let mut depth = 0usize;
        loop {
            let next = find_any_tag(&rest[cursor..], &["if", "else", "end"])
                .ok_or_else(|| "unterminated {{if}} chain".to_string())?;
            let abs_start = cursor + next.tag_start;
            let abs_end = cursor + next.tag_end;

            arms.last_mut().unwrap().1.push_str(&rest[cursor..abs_start]);

            match next.keyword {
                "if" => {
                    depth += 1;
                    arms.last_mut().unwrap().1.push_str(&rest[abs_start..abs_end]);
                }
                "end" if depth > 0 => {
                    depth -= 1;
                    arms.last_mut().unwrap().1.push_str(&rest[abs_start..abs_end]);
                }
                "end" => {
                    cursor = abs_end;
                    break;
                }
                "else" => {
                    if next.inner.trim().starts_with("if ") {
                        let cond_text = next.inner.trim().trim_start_matches("if").trim();
                        let cond = parse_eq_condition(cond_text, dialect)?;
                        arms.push((Some(cond), String::new()));
                    } else {
                        arms.push((None, String::new()));
                    }
                }
                _ => unreachable!(),
            }
            cursor = abs_end;
        }
        rest = &rest[cursor..];

        let mut base_template: Option<String> = None;
        for (when, body) in arms {
            let body = substitute(&body, dialect, extra)?;
            match when {
                Some(when) => rules.push(AssetRule {
                    when,
                    template: Some(body),
                    ..Default::default()
                }),
                None => base_template = Some(body),
            }
        }
        out.push_str(&base_template.unwrap_or_default());
    }
    out.push_str(rest);
    Ok((out, rules))
}

struct TagMatch<'a> {
    tag_start: usize,
    tag_end: usize,
    inner: &'a str,
    keyword: &'a str,
}

fn find_tag<'a>(source: &'a str, keyword: &'static str) -> Option<TagMatchOwned> {
    find_any_tag(source, &[keyword]).filter(|m| m.keyword == keyword).map(|m| TagMatchOwned {
        tag_start: m.tag_start,
        tag_end: m.tag_end,
        inner: m.inner.to_string(),
    })
}

struct TagMatchOwned {
    tag_start: usize,
    tag_end: usize,
    inner: String,
}

/// Find the earliest `{{ <keyword> ... }}` tag among `keywords`, treating
/// `{{if ...}}` / `{{else if ...}}` / `{{else}}` / `{{end}}` as the only
/// recognized action forms.
fn find_any_tag<'a>(source: &'a str, keywords: &[&'static str]) -> Option<TagMatch<'a>> {
    let mut search_from = 0;
    loop {
        let open = source[search_from..].find("{{")? + search_from;
        let after = &source[open + 2..];
        let close_rel = after.find("}}")?;
        let inner = after[..close_rel].trim();
        let tag_end = open + 2 + close_rel + 2;

        for &kw in keywords {
            let matches = match kw {
                "if" => inner.starts_with("if "),
                "else" => inner == "else" || inner.starts_with("else if"),
                "end" => inner == "end",
                _ => false,
            };
            if matches {
                return Some(TagMatch { tag_start: open, tag_end, inner, keyword: kw });
            }
        }
        search_from = tag_end;
    }
}

/// Parse `eq .Field "literal"` (the only conditional form GoReleaser
/// templates use for platform branching) into an [`AssetRuleWhen`].
fn parse_eq_condition(cond: &str, dialect: &Dialect) -> Result<AssetRuleWhen, String> {
    let cond = cond.trim().trim_start_matches("if").trim();
    let parts: Vec<&str> = cond.splitn(3, char::is_whitespace).collect();
    let [func, var, literal] = parts.as_slice() else {
        return Err(format!("unsupported conditional {cond:?}"));
    };
    if *func != "eq" {
        return Err(format!("unsupported conditional function {func:?}"));
    }
    if !var.starts_with('.') {
        return Err(format!("unsupported conditional operand {var:?}"));
    }
    let field = &var[1..];
    let target = dialect
        .branchable_fields
        .get(field)
        .ok_or_else(|| format!("{field:?} cannot be branched on in this dialect"))?;
    let literal = literal.trim().trim_matches('"').to_string();

    let mut when = AssetRuleWhen::default();
    match target {
        BranchTarget::Os => when.os = Some(literal),
        BranchTarget::Arch => when.arch = Some(literal),
    }
    Ok(when)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_plain_variables() {
        let t = translate("{{ .ProjectName }}_{{ .Version }}_{{ .Os }}_{{ .Arch }}", &goreleaser_dialect())
            .unwrap();
        assert_eq!(t.template, "${NAME}_${VERSION}_${OS}_${ARCH}");
        assert!(t.rules.is_empty());
    }

    #[test]
    fn identity_function_resolves_its_argument() {
        let t = translate("{{ title .Os }}", &goreleaser_dialect()).unwrap();
        assert_eq!(t.template, "${OS}");
    }

    #[test]
    fn constant_function_ignores_its_argument() {
        let t = translate("{{ trimV .Version }}", &aqua_dialect()).unwrap();
        assert_eq!(t.template, "${VERSION}");
    }

    #[test]
    fn aqua_version_maps_to_tag_not_version() {
        let t = translate("{{.Version}}_{{.SemVer}}", &aqua_dialect()).unwrap();
        assert_eq!(t.template, "${TAG}_${VERSION}");
    }

    #[test]
    fn extra_bindings_resolve_to_literal_text() {
        let mut extra = BTreeMap::new();
        extra.insert("AssetWithoutExt", "gh_${TAG}_${OS}_${ARCH}".to_string());
        let t = translate_with("{{.AssetWithoutExt}}_bin", &aqua_dialect(), &extra).unwrap();
        assert_eq!(t.template, "gh_${TAG}_${OS}_${ARCH}_bin");
    }

    #[test]
    fn unknown_variable_is_an_error() {
        assert!(translate("{{ .Nope }}", &goreleaser_dialect()).is_err());
    }

    #[test]
    fn unknown_function_is_an_error() {
        assert!(translate("{{ upper .Os }}", &goreleaser_dialect()).is_err());
    }

    #[test]
    fn aqua_variables_map_to_asset_placeholders() {
        let t = translate("{{.Asset}}", &aqua_dialect()).unwrap();
        assert_eq!(t.template, "${ASSET_FILENAME}");
    }

    #[test]
    fn extracts_simple_if_else_chain_into_rules() {
        let source = r#"{{if eq .Arch "amd64"}}x86_64{{else if eq .Arch "arm64"}}aarch64{{else}}{{.Arch}}{{end}}"#;
        let t = translate(source, &goreleaser_dialect()).unwrap();
        assert_eq!(t.template, "${ARCH}");
        assert_eq!(t.rules.len(), 2);
        assert_eq!(t.rules[0].when.arch.as_deref(), Some("amd64"));
        assert_eq!(t.rules[0].template.as_deref(), Some("x86_64"));
        assert_eq!(t.rules[1].when.arch.as_deref(), Some("arm64"));
        assert_eq!(t.rules[1].template.as_deref(), Some("aarch64"));
    }
}
