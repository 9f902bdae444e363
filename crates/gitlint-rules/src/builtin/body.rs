//! Body rules B1-B8

use gitlint_core::{
    GitCommit, LineRuleTarget, LintContext, Rule, RuleClass, RuleOption, RuleResult,
    RuleViolation,
};

use super::{check_hard_tab, check_max_length, check_trailing_whitespace};

/// B1: body lines must not exceed a maximum length
pub fn body_max_line_length() -> RuleClass {
    RuleClass::line(
        "B1",
        "body-max-line-length",
        LineRuleTarget::CommitMessageBody,
        validate_max_line_length,
    )
    .with_options(vec![RuleOption::int("line-length", 80, "Max line length")])
}

fn validate_max_line_length(rule: &Rule, line: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    Ok(check_max_length(rule, line, "Line"))
}

/// B2: body lines must not have trailing whitespace
pub fn body_trailing_whitespace() -> RuleClass {
    RuleClass::line(
        "B2",
        "body-trailing-whitespace",
        LineRuleTarget::CommitMessageBody,
        validate_trailing_whitespace,
    )
}

fn validate_trailing_whitespace(
    rule: &Rule,
    line: &str,
    _commit: &GitCommit,
    _ctx: &LintContext,
) -> RuleResult {
    Ok(check_trailing_whitespace(rule, line, "Line has trailing whitespace"))
}

/// B3: body lines must not contain hard tabs
pub fn body_hard_tab() -> RuleClass {
    RuleClass::line(
        "B3",
        "body-hard-tab",
        LineRuleTarget::CommitMessageBody,
        validate_hard_tab,
    )
}

fn validate_hard_tab(rule: &Rule, line: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    Ok(check_hard_tab(rule, line, "Line contains hard tab characters (\\t)"))
}

/// B4: the line after the title must be empty
pub fn body_first_line_empty() -> RuleClass {
    RuleClass::commit("B4", "body-first-line-empty", validate_first_line_empty)
}

fn validate_first_line_empty(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let body = &commit.message()?.body;
    if let Some(first_line) = body.first() {
        if !first_line.is_empty() {
            return Ok(vec![
                RuleViolation::new(
                    &rule.id,
                    "Second line is not empty",
                    Some(first_line.clone()),
                )
                .with_line_nr(2),
            ]);
        }
    }
    Ok(Vec::new())
}

/// B5: body must reach a minimum total length
pub fn body_min_length() -> RuleClass {
    RuleClass::commit("B5", "body-min-length", validate_min_length)
        .with_options(vec![RuleOption::int("min-length", 20, "Minimum body length")])
}

fn validate_min_length(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let min_length = rule.int_option("min-length").unwrap_or(20);
    let joined: String = commit.message()?.body.concat();
    let actual = joined.chars().count() as i64;
    if 0 < actual && actual < min_length {
        return Ok(vec![
            RuleViolation::new(
                &rule.id,
                format!("Body message is too short ({actual}<{min_length})"),
                Some(joined),
            )
            .with_line_nr(3),
        ]);
    }
    Ok(Vec::new())
}

/// B6: body must be present (merge commits exempt by default)
pub fn body_is_missing() -> RuleClass {
    RuleClass::commit("B6", "body-is-missing", validate_body_is_missing).with_options(vec![
        RuleOption::bool("ignore-merge-commits", true, "Ignore merge commits"),
    ])
}

fn validate_body_is_missing(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    if rule.bool_option("ignore-merge-commits").unwrap_or(true) && commit.is_merge_commit()? {
        return Ok(Vec::new());
    }
    let body = &commit.message()?.body;
    if body.len() < 2 || body.concat().trim().is_empty() {
        return Ok(vec![
            RuleViolation::new(&rule.id, "Body message is missing", None).with_line_nr(3),
        ]);
    }
    Ok(Vec::new())
}

/// B7: body must mention configured files when they change
pub fn body_changed_file_mention() -> RuleClass {
    RuleClass::commit("B7", "body-changed-file-mention", validate_changed_file_mention)
        .with_options(vec![RuleOption::list(
            "files",
            &[],
            "Files that need to be mentioned",
        )])
}

fn validate_changed_file_mention(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let mut violations = Vec::new();
    let changed_files = commit.changed_files()?;
    let body = &commit.message()?.body;
    let body_text = body.join(" ");
    for file in rule.list_option("files").unwrap_or(&[]) {
        if changed_files.iter().any(|changed| changed == file) && !body_text.contains(file.as_str())
        {
            violations.push(
                RuleViolation::new(
                    &rule.id,
                    format!("Body does not mention changed file '{file}'"),
                    None,
                )
                .with_line_nr(body.len() as u64 + 1),
            );
        }
    }
    Ok(violations)
}

/// B8: body must match a configured regex (pass-through when unset)
pub fn body_match_regex() -> RuleClass {
    RuleClass::commit("B8", "body-match-regex", validate_body_match_regex)
        .with_options(vec![RuleOption::regex("regex", None, "Regex the body should match")])
}

fn validate_body_match_regex(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let Some(regex) = rule.regex_option("regex") else {
        return Ok(Vec::new());
    };
    let body = &commit.message()?.body;

    // Skip the empty line after the title, and prune the trailing empty
    // line git adds, neither of which users expect to match against
    let mut body_lines: Vec<&str> = if body.len() > 1 {
        body[1..].iter().map(String::as_str).collect()
    } else {
        Vec::new()
    };
    if body_lines.last() == Some(&"") {
        body_lines.pop();
    }
    let full_body = body_lines.join("\n");

    if !regex.is_match(&full_body) {
        return Ok(vec![
            RuleViolation::new(
                &rule.id,
                format!("Body does not match regex ({})", regex.as_str()),
                None,
            )
            .with_line_nr(body.len() as u64 + 1),
        ]);
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitlint_core::{GitContext, RuleBehavior};

    fn validate_commit(class: RuleClass, message: &str) -> Vec<RuleViolation> {
        let rule = class.instantiate_default();
        let RuleBehavior::Commit(check) = rule.behavior() else {
            panic!("expected commit rule");
        };
        let context = GitContext::from_commit_msg(message);
        check
            .validate(&rule, &context.commits[0], &LintContext::default())
            .unwrap()
    }

    #[test]
    fn test_body_first_line_empty() {
        assert!(validate_commit(body_first_line_empty(), "Tïtle\n\nBody").is_empty());

        let violations = validate_commit(body_first_line_empty(), "Tïtle\nBody right away");
        assert_eq!(violations[0].message, "Second line is not empty");
        assert_eq!(violations[0].line_nr, Some(2));
    }

    #[test]
    fn test_body_min_length() {
        assert!(validate_commit(
            body_min_length(),
            "Tïtle\n\nThis body is long enough to pass"
        )
        .is_empty());

        let violations = validate_commit(body_min_length(), "Tïtle\n\ntoo short");
        assert_eq!(violations[0].message, "Body message is too short (9<20)");
        assert_eq!(violations[0].line_nr, Some(3));

        // A fully absent body is B6's concern, not B5's
        assert!(validate_commit(body_min_length(), "Tïtle").is_empty());
    }

    #[test]
    fn test_body_is_missing() {
        assert!(validate_commit(body_is_missing(), "Tïtle\n\nSome body").is_empty());

        let violations = validate_commit(body_is_missing(), "Tïtle");
        assert_eq!(violations[0].message, "Body message is missing");
        assert_eq!(violations[0].line_nr, Some(3));

        assert!(!validate_commit(body_is_missing(), "Tïtle\n\n  ").is_empty());

        // Merge commits are exempt by default
        assert!(validate_commit(body_is_missing(), "Merge branch 'foo'").is_empty());
    }

    #[test]
    fn test_body_match_regex() {
        let class = body_match_regex();
        let mut rule = class.instantiate_default();
        rule.options
            .get_mut("regex")
            .unwrap()
            .set(Some("Fixes #\\d+"))
            .unwrap();
        let RuleBehavior::Commit(check) = rule.behavior() else {
            panic!("expected commit rule");
        };

        let context = GitContext::from_commit_msg("Tïtle\n\nSome body\nFixes #42");
        assert!(check
            .validate(&rule, &context.commits[0], &LintContext::default())
            .unwrap()
            .is_empty());

        let context = GitContext::from_commit_msg("Tïtle\n\nSome body");
        let violations = check
            .validate(&rule, &context.commits[0], &LintContext::default())
            .unwrap();
        assert_eq!(violations[0].message, "Body does not match regex (Fixes #\\d+)");
        assert_eq!(violations[0].line_nr, Some(3));
    }
}
