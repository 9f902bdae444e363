//! Configuration rules I1-I4
//!
//! These run before all other rules and may mutate the active configuration
//! or the commit message itself.

use gitlint_core::{GitCommit, GitContextError, LintConfig, Rule, RuleClass, RuleOption};

/// I1: ignore rules for commits whose title matches a regex
pub fn ignore_by_title() -> RuleClass {
    RuleClass::configuration("I1", "ignore-by-title", apply_ignore_by_title).with_options(vec![
        RuleOption::regex(
            "regex",
            None,
            "Regex matching the titles of commits this rule should apply to",
        ),
        RuleOption::str("ignore", "all".to_string(), "Comma-separated list of rules to ignore"),
    ])
}

fn apply_ignore_by_title(
    rule: &Rule,
    config: &mut LintConfig,
    commit: &mut GitCommit,
) -> Result<(), GitContextError> {
    let Some(regex) = rule.regex_option("regex") else {
        return Ok(());
    };
    let title = commit.message()?.title.clone();
    if config.lint_context().regex_matches(rule, regex, &title) {
        let ignore = rule.str_option("ignore").unwrap_or("all").to_string();
        tracing::debug!(
            rule = %rule.id,
            "commit title '{title}' matches the regex '{}', ignoring rules: {ignore}",
            regex.as_str()
        );
        config.set_ignore(&ignore);
    }
    Ok(())
}

/// I2: ignore rules for commits with a body line matching a regex.
/// The first matching body line wins.
pub fn ignore_by_body() -> RuleClass {
    RuleClass::configuration("I2", "ignore-by-body", apply_ignore_by_body).with_options(vec![
        RuleOption::regex(
            "regex",
            None,
            "Regex matching lines of the body of commits this rule should apply to",
        ),
        RuleOption::str("ignore", "all".to_string(), "Comma-separated list of rules to ignore"),
    ])
}

fn apply_ignore_by_body(
    rule: &Rule,
    config: &mut LintConfig,
    commit: &mut GitCommit,
) -> Result<(), GitContextError> {
    let Some(regex) = rule.regex_option("regex") else {
        return Ok(());
    };
    let ctx = config.lint_context();
    let body = commit.message()?.body.clone();
    for line in body {
        if ctx.regex_matches(rule, regex, &line) {
            let ignore = rule.str_option("ignore").unwrap_or("all").to_string();
            tracing::debug!(
                rule = %rule.id,
                "commit message line '{line}' matches the regex '{}', ignoring rules: {ignore}",
                regex.as_str()
            );
            config.set_ignore(&ignore);
            return Ok(());
        }
    }
    Ok(())
}

/// I3: drop body lines matching a regex before any other rule sees them
pub fn ignore_body_lines() -> RuleClass {
    RuleClass::configuration("I3", "ignore-body-lines", apply_ignore_body_lines).with_options(
        vec![RuleOption::regex(
            "regex",
            None,
            "Regex matching lines of the body that should be ignored",
        )],
    )
}

fn apply_ignore_body_lines(
    rule: &Rule,
    config: &mut LintConfig,
    commit: &mut GitCommit,
) -> Result<(), GitContextError> {
    let Some(regex) = rule.regex_option("regex") else {
        return Ok(());
    };
    let ctx = config.lint_context();
    let message = commit.message_mut()?;
    let mut new_body = Vec::with_capacity(message.body.len());
    for line in message.body.drain(..) {
        if ctx.regex_matches(rule, regex, &line) {
            tracing::debug!(
                "ignoring line '{line}' because it matches '{}'",
                regex.as_str()
            );
        } else {
            new_body.push(line);
        }
    }
    message.body = new_body;
    message.sync_full();
    Ok(())
}

/// I4: ignore rules for commits whose author name matches a regex.
/// Warns and skips when the author name is unknown.
pub fn ignore_by_author_name() -> RuleClass {
    RuleClass::configuration("I4", "ignore-by-author-name", apply_ignore_by_author_name)
        .with_options(vec![
            RuleOption::regex(
                "regex",
                None,
                "Regex matching the author name of commits this rule should apply to",
            ),
            RuleOption::str("ignore", "all".to_string(), "Comma-separated list of rules to ignore"),
        ])
}

fn apply_ignore_by_author_name(
    rule: &Rule,
    config: &mut LintConfig,
    commit: &mut GitCommit,
) -> Result<(), GitContextError> {
    let Some(regex) = rule.regex_option("regex") else {
        return Ok(());
    };
    let Some(author_name) = commit.author_name()? else {
        tracing::warn!(
            "{} - {}: skipping - commit author name unknown. \
             Suggested fix: use staged mode (general.staged=true)",
            rule.name,
            rule.id
        );
        return Ok(());
    };
    let author_name = author_name.to_string();
    if config.lint_context().regex_matches(rule, regex, &author_name) {
        let ignore = rule.str_option("ignore").unwrap_or("all").to_string();
        tracing::debug!(
            rule = %rule.id,
            "commit author name '{author_name}' matches the regex '{}', ignoring rules: {ignore}",
            regex.as_str()
        );
        config.set_ignore(&ignore);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitlint_core::{
        GitContext, LineRuleTarget, LintContext, RuleBehavior, RuleResult, RuleViolation,
    };

    fn any_title_rule(rule: &Rule, line: &str, _c: &GitCommit, _ctx: &LintContext) -> RuleResult {
        Ok(vec![RuleViolation::new(&rule.id, "always fails", Some(line.to_string()))])
    }

    fn config_with(configuration_class: RuleClass, option: (&str, &str)) -> LintConfig {
        let classes = vec![
            configuration_class,
            RuleClass::line("UT1", "always-fails", LineRuleTarget::CommitMessageTitle, any_title_rule),
        ];
        let mut config = LintConfig::new(&classes, Vec::new());
        let id = config.rules().iter().next().map(|r| r.id.clone()).unwrap();
        config.set_rule_option(&id, option.0, option.1).unwrap();
        config
    }

    fn apply_first_rule(config: &mut LintConfig, commit: &mut GitCommit) {
        let rule = config.rules().iter().next().cloned().unwrap();
        let RuleBehavior::Configuration(check) = rule.behavior().clone() else {
            panic!("expected configuration rule");
        };
        check.apply(&rule, config, commit).unwrap();
    }

    #[test]
    fn test_ignore_by_title() {
        let mut config = config_with(ignore_by_title(), ("regex", "^Release "));
        config.set_general_option("regex-style-search", "true").unwrap();

        let mut commit = GitContext::from_commit_msg("Release 1.2.3").commits.remove(0);
        apply_first_rule(&mut config, &mut commit);
        assert!(config.is_rule_ignored("UT1", "always-fails"));

        let mut config = config_with(ignore_by_title(), ("regex", "^Release "));
        config.set_general_option("regex-style-search", "true").unwrap();
        let mut commit = GitContext::from_commit_msg("Regular title").commits.remove(0);
        apply_first_rule(&mut config, &mut commit);
        assert!(!config.is_rule_ignored("UT1", "always-fails"));
    }

    #[test]
    fn test_ignore_by_body() {
        let mut config = config_with(ignore_by_body(), ("regex", "relnotes"));
        config.set_general_option("regex-style-search", "true").unwrap();

        let mut commit = GitContext::from_commit_msg("Tïtle\n\nsee relnotes for details")
            .commits
            .remove(0);
        apply_first_rule(&mut config, &mut commit);
        assert!(config.is_rule_ignored("UT1", "always-fails"));
    }

    #[test]
    fn test_ignore_body_lines_rewrites_message() {
        let mut config = config_with(ignore_body_lines(), ("regex", "^Co-authored-by"));
        config.set_general_option("regex-style-search", "true").unwrap();

        let mut commit =
            GitContext::from_commit_msg("Tïtle\n\nReal body\nCo-authored-by: Jane <jane@example.com>")
                .commits
                .remove(0);
        apply_first_rule(&mut config, &mut commit);

        let message = commit.message().unwrap();
        assert_eq!(message.body, vec!["", "Real body"]);
        assert_eq!(message.full, "Tïtle\n\nReal body");
    }

    #[test]
    fn test_ignore_by_author_name_skips_when_unknown() {
        let mut config = config_with(ignore_by_author_name(), ("regex", "dependabot"));
        let mut commit = GitContext::from_commit_msg("Tïtle").commits.remove(0);
        apply_first_rule(&mut config, &mut commit);
        // No author on a detached commit, rule skips without ignoring
        assert!(!config.is_rule_ignored("UT1", "always-fails"));
    }

    #[test]
    fn test_ignore_option_limits_scope() {
        let mut config = config_with(ignore_by_title(), ("regex", "^Release "));
        config.set_general_option("regex-style-search", "true").unwrap();
        config.set_rule_option("I1", "ignore", "T1,B2").unwrap();

        let mut commit = GitContext::from_commit_msg("Release 1.2.3").commits.remove(0);
        apply_first_rule(&mut config, &mut commit);
        assert!(config.is_rule_ignored("T1", "title-max-length"));
        assert!(!config.is_rule_ignored("UT1", "always-fails"));
    }
}
