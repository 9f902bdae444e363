//! CT1: enforce the Conventional Commits title format
//! (<https://www.conventionalcommits.org/>)

use gitlint_core::{
    GitCommit, LineRuleTarget, LintContext, Rule, RuleClass, RuleOption, RuleResult,
    RuleViolation,
};
use once_cell::sync::Lazy;
use regex::Regex;

static CONVENTIONAL_COMMIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^(]+?)(?:\(([^)]+?)\))?!?: .+").expect("static regex"));

const DEFAULT_TYPES: [&str; 11] = [
    "fix", "feat", "chore", "docs", "style", "refactor", "perf", "test", "revert", "ci", "build",
];

pub fn conventional_commit() -> RuleClass {
    RuleClass::line(
        "CT1",
        "contrib-title-conventional-commits",
        LineRuleTarget::CommitMessageTitle,
        validate_conventional_commit,
    )
    .with_options(vec![
        RuleOption::list("types", &DEFAULT_TYPES, "Comma separated list of allowed commit types."),
        RuleOption::list("scopes", &[], "Comma separated list of allowed scopes."),
    ])
}

fn validate_conventional_commit(
    rule: &Rule,
    title: &str,
    _commit: &GitCommit,
    _ctx: &LintContext,
) -> RuleResult {
    let mut violations = Vec::new();

    let Some(captures) = CONVENTIONAL_COMMIT_REGEX.captures(title) else {
        violations.push(RuleViolation::new(
            &rule.id,
            "Title does not follow ConventionalCommits.org format 'type(optional-scope): description'",
            Some(title.to_string()),
        ));
        return Ok(violations);
    };

    let types = rule.list_option("types").unwrap_or(&[]);
    let commit_type = captures.get(1).map_or("", |m| m.as_str());
    if !types.iter().any(|t| t == commit_type) {
        violations.push(RuleViolation::new(
            &rule.id,
            format!("Title does not start with one of {}", types.join(", ")),
            Some(title.to_string()),
        ));
    }

    let scopes = rule.list_option("scopes").unwrap_or(&[]);
    if scopes.is_empty() {
        return Ok(violations);
    }
    if let Some(scope) = captures.get(2).map(|m| m.as_str()) {
        if !scopes.iter().any(|s| s == scope) {
            violations.push(RuleViolation::new(
                &rule.id,
                format!("Title does not use one of these scopes: {}", scopes.join(", ")),
                Some(title.to_string()),
            ));
        }
    }
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitlint_core::{GitContext, RuleBehavior};
    use std::collections::HashMap;

    fn validate_with(options: &[(&str, &str)], title: &str) -> Vec<RuleViolation> {
        let raw: HashMap<String, String> = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let rule = conventional_commit().instantiate(&raw).unwrap();
        let RuleBehavior::Line(check) = rule.behavior() else {
            panic!("expected line rule");
        };
        let context = GitContext::from_commit_msg(title);
        check
            .validate(&rule, title, &context.commits[0], &LintContext::default())
            .unwrap()
    }

    #[test]
    fn test_valid_conventional_titles() {
        for title in [
            "feat: add new thing",
            "fix(parser): handle empty input",
            "chore!: drop old API",
        ] {
            assert!(validate_with(&[], title).is_empty(), "title: {title}");
        }
    }

    #[test]
    fn test_format_violation() {
        let violations = validate_with(&[], "no conventional format here");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("ConventionalCommits.org format"));
    }

    #[test]
    fn test_unknown_type() {
        let violations = validate_with(&[], "wip: not an allowed type");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.starts_with("Title does not start with one of"));
    }

    #[test]
    fn test_scope_enforcement() {
        assert!(validate_with(&[("scopes", "core,cli")], "feat(core): ok").is_empty());

        let violations = validate_with(&[("scopes", "core,cli")], "feat(gui): nope");
        assert_eq!(
            violations[0].message,
            "Title does not use one of these scopes: core, cli"
        );

        // No scope in the title is fine even when scopes are restricted
        assert!(validate_with(&[("scopes", "core,cli")], "feat: no scope").is_empty());
    }
}
