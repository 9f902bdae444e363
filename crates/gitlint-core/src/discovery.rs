//! External rule discovery
//!
//! User-defined rules are loaded from declarative TOML manifests: a single
//! manifest file, or a directory whose `.toml` files are scanned
//! non-recursively. Each manifest declares rules over a fixed check
//! vocabulary; declared parameters surface as regular rule options so
//! `<rule>.<option>=<value>` overrides work on user rules exactly like on
//! built-in ones.
//!
//! ```toml
//! [[rules]]
//! id = "UC1"
//! name = "body-max-words"
//! type = "line"
//! target = "body"
//! [rules.check]
//! max-length = 120
//! ```
//!
//! Every manifest entry is validated against the rule contract at load
//! time; any violation fails discovery with an error naming the offending
//! rule.

use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{GitContextError, UserRuleError};
use crate::git::GitCommit;
use crate::options::RuleOption;
use crate::rule::{
    CommitCheck, ConfigCheck, LineCheck, LineRuleTarget, LintContext, Rule, RuleClass,
    RuleResult, RuleViolation,
};

/// Leading letters reserved for built-in rule ids
const RESERVED_ID_LETTERS: [char; 5] = ['R', 'T', 'B', 'M', 'I'];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    rules: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ManifestEntry {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    target: Option<String>,
    /// Violation message override; each check has a default
    message: Option<String>,
    check: Option<CheckSpec>,
}

/// The fixed check vocabulary. Exactly one field must be set per rule.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct CheckSpec {
    max_length: Option<i64>,
    min_length: Option<i64>,
    match_regex: Option<String>,
    forbid_regex: Option<String>,
    forbid_words: Option<Vec<String>>,
    ignore_rules: Option<IgnoreRulesSpec>,
}

/// Configuration-rule check: when `when-matches` matches the scoped text,
/// add `rules` to the ignore list
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct IgnoreRulesSpec {
    rules: Vec<String>,
    when_matches: Option<String>,
    #[serde(default = "default_scope")]
    scope: String,
}

fn default_scope() -> String {
    "title".to_string()
}

/// Which validated checks a manifest line/commit rule can carry
#[derive(Debug, Clone)]
enum CheckKind {
    MaxLength,
    MinLength,
    MatchRegex,
    ForbidRegex,
    ForbidWords,
}

/// Validated line/commit check, parameterized through the rule's options
#[derive(Debug, Clone)]
struct ManifestCheck {
    kind: CheckKind,
    message: Option<String>,
}

impl ManifestCheck {
    fn check_text(
        &self,
        rule: &Rule,
        text: &str,
        ctx: &LintContext,
    ) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        let mut report = |message: String| {
            let message = self.message.clone().unwrap_or(message);
            violations.push(RuleViolation::new(&rule.id, message, Some(text.to_string())));
        };

        match self.kind {
            CheckKind::MaxLength => {
                let limit = rule.int_option("max-length").unwrap_or(i64::MAX);
                let length = text.chars().count() as i64;
                if length > limit {
                    report(format!("Text exceeds max length ({length}>{limit})"));
                }
            }
            CheckKind::MinLength => {
                let limit = rule.int_option("min-length").unwrap_or(0);
                let length = text.chars().count() as i64;
                if length < limit {
                    report(format!("Text is too short ({length}<{limit})"));
                }
            }
            CheckKind::MatchRegex => {
                if let Some(regex) = rule.regex_option("regex") {
                    if !ctx.regex_matches(rule, regex, text) {
                        report(format!("Text does not match regex ({})", regex.as_str()));
                    }
                }
            }
            CheckKind::ForbidRegex => {
                if let Some(regex) = rule.regex_option("regex") {
                    if regex.is_match(text) {
                        report(format!("Text matches forbidden regex ({})", regex.as_str()));
                    }
                }
            }
            CheckKind::ForbidWords => {
                let lowered = text.to_lowercase();
                for word in rule.list_option("words").unwrap_or(&[]) {
                    if lowered.contains(&word.to_lowercase()) {
                        report(format!("Text contains the word '{word}'"));
                    }
                }
            }
        }
        violations
    }
}

impl LineCheck for ManifestCheck {
    fn validate(
        &self,
        rule: &Rule,
        line: &str,
        _commit: &GitCommit,
        ctx: &LintContext,
    ) -> RuleResult {
        Ok(self.check_text(rule, line, ctx))
    }
}

impl CommitCheck for ManifestCheck {
    fn validate(&self, rule: &Rule, commit: &GitCommit, ctx: &LintContext) -> RuleResult {
        let full = commit.message()?.full.clone();
        Ok(self.check_text(rule, &full, ctx))
    }
}

/// Validated configuration check built from an `ignore-rules` spec
#[derive(Debug, Clone)]
struct ManifestIgnoreRules {
    scope: IgnoreScope,
}

#[derive(Debug, Clone, Copy)]
enum IgnoreScope {
    Title,
    Body,
    AuthorName,
}

impl ConfigCheck for ManifestIgnoreRules {
    fn apply(
        &self,
        rule: &Rule,
        config: &mut crate::config::LintConfig,
        commit: &mut GitCommit,
    ) -> Result<(), GitContextError> {
        let Some(regex) = rule.regex_option("regex") else {
            return Ok(());
        };
        let matched = match self.scope {
            IgnoreScope::Title => regex.is_match(&commit.message()?.title),
            IgnoreScope::Body => commit.message()?.body.iter().any(|l| regex.is_match(l)),
            IgnoreScope::AuthorName => match commit.author_name()? {
                Some(name) => regex.is_match(name),
                None => false,
            },
        };
        if !matched {
            return Ok(());
        }

        let requested = rule.list_option("rules").unwrap_or(&[]).to_vec();
        if requested.iter().any(|r| r.eq_ignore_ascii_case("all")) {
            let all: Vec<String> = config.rules().ids().map(str::to_string).collect();
            config.extend_ignore(all);
        } else {
            config.extend_ignore(requested);
        }
        Ok(())
    }
}

/// Load and validate rule classes from a manifest file or a directory of
/// manifest files. Directory scanning is non-recursive; files load in name
/// order so discovery is deterministic.
pub fn discover_rule_classes(path: &Path) -> Result<Vec<RuleClass>, UserRuleError> {
    let mut files = Vec::new();
    if path.is_file() {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|err| UserRuleError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        for entry in entries {
            let entry = entry.map_err(|err| UserRuleError::Io {
                path: path.to_path_buf(),
                source: err,
            })?;
            let file = entry.path();
            if file.is_file() && file.extension().is_some_and(|ext| ext == "toml") {
                files.push(file);
            }
        }
        files.sort();
    } else {
        return Err(UserRuleError::InvalidExtraPath {
            path: path.display().to_string(),
        });
    }

    let mut classes = Vec::new();
    for file in files {
        classes.extend(load_manifest_file(&file)?);
    }
    Ok(classes)
}

fn load_manifest_file(path: &Path) -> Result<Vec<RuleClass>, UserRuleError> {
    let module = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let content = std::fs::read_to_string(path).map_err(|err| UserRuleError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    let manifest: Manifest =
        toml::from_str(&content).map_err(|err| UserRuleError::ModuleLoad {
            module: module.clone(),
            message: err.to_string(),
        })?;

    tracing::debug!(module, rules = manifest.rules.len(), "loaded rule manifest");
    manifest
        .rules
        .into_iter()
        .map(|entry| build_rule_class(&module, entry))
        .collect()
}

/// Validate one manifest entry against the rule contract and turn it into a
/// registrable class
fn build_rule_class(module: &str, entry: ManifestEntry) -> Result<RuleClass, UserRuleError> {
    let rule_label = |entry: &ManifestEntry| {
        entry
            .id
            .clone()
            .or_else(|| entry.name.clone())
            .unwrap_or_else(|| format!("<unnamed rule in '{module}'>"))
    };

    let id = match entry.id.as_deref() {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => return Err(UserRuleError::MissingId { rule: rule_label(&entry) }),
    };
    let name = match entry.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(UserRuleError::MissingName { rule: id }),
    };
    if id
        .chars()
        .next()
        .is_some_and(|c| RESERVED_ID_LETTERS.contains(&c))
    {
        return Err(UserRuleError::ReservedId { rule: name, id });
    }

    let invalid_check = |message: &str| UserRuleError::InvalidCheck {
        rule: name.clone(),
        message: message.to_string(),
    };

    let kind = entry
        .kind
        .as_deref()
        .ok_or_else(|| invalid_check("missing rule type (line, commit or configuration)"))?;
    let check = entry
        .check
        .ok_or_else(|| invalid_check("missing [rules.check] table"))?;

    match kind {
        "line" => {
            let target = match entry.target.as_deref() {
                Some("title") => LineRuleTarget::CommitMessageTitle,
                Some("body") => LineRuleTarget::CommitMessageBody,
                _ => return Err(UserRuleError::MissingTarget { rule: name }),
            };
            let (check, options) = build_text_check(&check, entry.message, &invalid_check)?;
            Ok(RuleClass::line(&id, &name, target, check).with_options(options))
        }
        "commit" => {
            let (check, options) = build_text_check(&check, entry.message, &invalid_check)?;
            Ok(RuleClass::commit(&id, &name, check).with_options(options))
        }
        "configuration" => {
            if check_field_count(&check) != 1 {
                return Err(invalid_check(
                    "configuration rules require exactly the 'ignore-rules' check",
                ));
            }
            let Some(spec) = check.ignore_rules else {
                return Err(invalid_check(
                    "configuration rules require exactly the 'ignore-rules' check",
                ));
            };
            let scope = match spec.scope.as_str() {
                "title" => IgnoreScope::Title,
                "body" => IgnoreScope::Body,
                "author-name" => IgnoreScope::AuthorName,
                other => {
                    return Err(invalid_check(&format!(
                        "invalid ignore-rules scope '{other}' (expected title, body or author-name)"
                    )));
                }
            };
            let pattern = spec
                .when_matches
                .as_deref()
                .ok_or_else(|| invalid_check("ignore-rules requires a 'when-matches' regex"))?;
            compile_manifest_regex(pattern, &invalid_check)?;

            let mut rules_option = RuleOption::list("rules", &[], "Rules to ignore on match");
            let _ = rules_option.set_list(spec.rules);
            let regex_option = manifest_regex_option(pattern, "Regex that triggers the ignore");
            Ok(
                RuleClass::configuration(&id, &name, ManifestIgnoreRules { scope })
                    .with_options(vec![regex_option, rules_option]),
            )
        }
        other => Err(invalid_check(&format!(
            "invalid rule type '{other}' (expected line, commit or configuration)"
        ))),
    }
}

fn check_field_count(check: &CheckSpec) -> usize {
    [
        check.max_length.is_some(),
        check.min_length.is_some(),
        check.match_regex.is_some(),
        check.forbid_regex.is_some(),
        check.forbid_words.is_some(),
        check.ignore_rules.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count()
}

fn compile_manifest_regex(
    pattern: &str,
    invalid_check: &impl Fn(&str) -> UserRuleError,
) -> Result<Regex, UserRuleError> {
    Regex::new(pattern).map_err(|err| invalid_check(&format!("invalid regex: {err}")))
}

fn manifest_regex_option(pattern: &str, description: &str) -> RuleOption {
    RuleOption::regex("regex", Some(pattern), description)
}

/// Build a line/commit check plus the options its parameters surface as
fn build_text_check(
    check: &CheckSpec,
    message: Option<String>,
    invalid_check: &impl Fn(&str) -> UserRuleError,
) -> Result<(ManifestCheck, Vec<RuleOption>), UserRuleError> {
    if check_field_count(check) != 1 {
        return Err(invalid_check(
            "exactly one check must be specified (max-length, min-length, match-regex, forbid-regex or forbid-words)",
        ));
    }

    if let Some(limit) = check.max_length {
        let mut option = RuleOption::int("max-length", None, "Maximum length");
        option
            .set(Some(&limit.to_string()))
            .map_err(|err| invalid_check(&err.to_string()))?;
        return Ok((
            ManifestCheck { kind: CheckKind::MaxLength, message },
            vec![option],
        ));
    }
    if let Some(limit) = check.min_length {
        let mut option = RuleOption::int("min-length", None, "Minimum length");
        option
            .set(Some(&limit.to_string()))
            .map_err(|err| invalid_check(&err.to_string()))?;
        return Ok((
            ManifestCheck { kind: CheckKind::MinLength, message },
            vec![option],
        ));
    }
    if let Some(pattern) = check.match_regex.as_deref() {
        compile_manifest_regex(pattern, invalid_check)?;
        return Ok((
            ManifestCheck { kind: CheckKind::MatchRegex, message },
            vec![manifest_regex_option(pattern, "Regex the text must match")],
        ));
    }
    if let Some(pattern) = check.forbid_regex.as_deref() {
        compile_manifest_regex(pattern, invalid_check)?;
        return Ok((
            ManifestCheck { kind: CheckKind::ForbidRegex, message },
            vec![manifest_regex_option(pattern, "Regex the text must not match")],
        ));
    }
    if let Some(words) = check.forbid_words.clone() {
        let mut option = RuleOption::list("words", &[], "Forbidden words");
        let _ = option.set_list(words);
        return Ok((
            ManifestCheck { kind: CheckKind::ForbidWords, message },
            vec![option],
        ));
    }
    Err(invalid_check(
        "configuration checks are only valid on configuration rules",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitContext;
    use crate::rule::RuleBehavior;
    use std::io::Write;

    fn manifest_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_discover_line_rule() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "UC1"
            name = "body-max-words"
            type = "line"
            target = "body"
            [rules.check]
            max-length = 10
            "#,
        );
        let classes = discover_rule_classes(file.path()).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].id, "UC1");
        assert_eq!(classes[0].target, Some(LineRuleTarget::CommitMessageBody));
        assert!(matches!(classes[0].behavior, RuleBehavior::Line(_)));

        // The declared parameter surfaces as an option
        let rule = classes[0].instantiate_default();
        assert_eq!(rule.int_option("max-length"), Some(10));
    }

    #[test]
    fn test_discovered_rule_validates() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "UC2"
            name = "no-swearing"
            type = "line"
            target = "title"
            [rules.check]
            forbid-words = ["darn"]
            "#,
        );
        let classes = discover_rule_classes(file.path()).unwrap();
        let rule = classes[0].instantiate_default();
        let RuleBehavior::Line(check) = rule.behavior() else {
            panic!("expected line behavior");
        };
        let context = GitContext::from_commit_msg("This darn title");
        let violations = check
            .validate(&rule, "This darn title", &context.commits[0], &LintContext::default())
            .unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, "UC2");
    }

    #[test]
    fn test_discover_configuration_rule() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "UCR1"
            name = "release-ignores"
            type = "configuration"
            [rules.check.ignore-rules]
            rules = ["UC1"]
            when-matches = "^Release "
            scope = "title"
            "#,
        );
        let classes = discover_rule_classes(file.path()).unwrap();
        assert!(matches!(classes[0].behavior, RuleBehavior::Configuration(_)));
    }

    #[test]
    fn test_configuration_rule_requires_ignore_rules_check() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "UCR2"
            name = "bad-config-rule"
            type = "configuration"
            [rules.check]
            max-length = 10
            "#,
        );
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid check for user-defined rule 'bad-config-rule': \
             configuration rules require exactly the 'ignore-rules' check"
        );
    }

    #[test]
    fn test_missing_id_and_name() {
        let file = manifest_file(
            r#"
            [[rules]]
            name = "no-id"
            type = "line"
            target = "title"
            [rules.check]
            max-length = 10
            "#,
        );
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User-defined rule 'no-id' must have an 'id' attribute"
        );

        let file = manifest_file(
            r#"
            [[rules]]
            id = "UC1"
            type = "line"
            target = "title"
            [rules.check]
            max-length = 10
            "#,
        );
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User-defined rule 'UC1' must have a 'name' attribute"
        );
    }

    #[test]
    fn test_reserved_id_rejected() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "T99"
            name = "my-rule"
            type = "line"
            target = "title"
            [rules.check]
            max-length = 10
            "#,
        );
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The id 'T99' of 'my-rule' is invalid. Gitlint reserves ids starting with R,T,B,M,I"
        );
    }

    #[test]
    fn test_line_rule_requires_target() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "UC1"
            name = "my-rule"
            type = "line"
            [rules.check]
            max-length = 10
            "#,
        );
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The target of the user-defined line rule 'my-rule' must be either 'title' or 'body'"
        );
    }

    #[test]
    fn test_multiple_checks_rejected() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "UC1"
            name = "my-rule"
            type = "line"
            target = "title"
            [rules.check]
            max-length = 10
            min-length = 2
            "#,
        );
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert!(err
            .to_string()
            .contains("exactly one check must be specified"));
    }

    #[test]
    fn test_invalid_manifest_regex() {
        let file = manifest_file(
            r#"
            [[rules]]
            id = "UC1"
            name = "my-rule"
            type = "line"
            target = "title"
            [rules.check]
            match-regex = "*invalid"
            "#,
        );
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid regex"));
    }

    #[test]
    fn test_malformed_toml_names_module() {
        let mut file = tempfile::Builder::new()
            .prefix("myrules")
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(b"not [valid toml").unwrap();
        let err = discover_rule_classes(file.path()).unwrap_err();
        assert!(matches!(err, UserRuleError::ModuleLoad { ref module, .. } if module.starts_with("myrules")));
    }

    #[test]
    fn test_directory_scan_is_sorted_and_shallow() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.toml"),
            "[[rules]]\nid = \"UC2\"\nname = \"b-rule\"\ntype = \"line\"\ntarget = \"title\"\n[rules.check]\nmax-length = 10\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.toml"),
            "[[rules]]\nid = \"UC1\"\nname = \"a-rule\"\ntype = \"line\"\ntarget = \"title\"\n[rules.check]\nmax-length = 10\n",
        )
        .unwrap();
        // Subdirectories are not scanned
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(
            sub.join("c.toml"),
            "[[rules]]\nid = \"UC3\"\nname = \"c-rule\"\ntype = \"line\"\ntarget = \"title\"\n[rules.check]\nmax-length = 10\n",
        )
        .unwrap();

        let classes = discover_rule_classes(dir.path()).unwrap();
        let ids: Vec<&str> = classes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["UC1", "UC2"]);
    }

    #[test]
    fn test_invalid_extra_path() {
        let err = discover_rule_classes(Path::new("/does/not/exist")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid extra-path: /does/not/exist");
    }
}
