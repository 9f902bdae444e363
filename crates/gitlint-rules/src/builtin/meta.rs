//! Meta rules: commit metadata rather than message content

use gitlint_core::{GitCommit, LintContext, Rule, RuleClass, RuleOption, RuleResult, RuleViolation};

pub const DEFAULT_AUTHOR_VALID_EMAIL_REGEX: &str = r"^[^@ ]+@[^@ ]+\.[^@ ]+";

/// M1: the commit author email must match a regex
pub fn author_valid_email() -> RuleClass {
    RuleClass::commit("M1", "author-valid-email", validate_author_email).with_options(vec![
        RuleOption::regex(
            "regex",
            Some(DEFAULT_AUTHOR_VALID_EMAIL_REGEX),
            "Regex that author email address should match",
        ),
    ])
}

fn validate_author_email(rule: &Rule, commit: &GitCommit, ctx: &LintContext) -> RuleResult {
    let Some(regex) = rule.regex_option("regex") else {
        return Ok(Vec::new());
    };
    let Some(author_email) = commit.author_email()? else {
        return Ok(Vec::new());
    };

    // The default pattern is built for search semantics; only custom
    // patterns go through the configured match/search style
    let matches = if regex.as_str() == DEFAULT_AUTHOR_VALID_EMAIL_REGEX {
        regex.is_match(author_email)
    } else {
        ctx.regex_matches(rule, regex, author_email)
    };

    if !matches {
        return Ok(vec![RuleViolation::new(
            &rule.id,
            "Author email for commit is invalid",
            Some(author_email.to_string()),
        )]);
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitlint_core::{GitContext, RuleBehavior};

    #[test]
    fn test_author_email_unknown_passes() {
        // Commits materialized from a bare message have no author
        let context = GitContext::from_commit_msg("Tïtle");
        let rule = author_valid_email().instantiate_default();
        let RuleBehavior::Commit(check) = rule.behavior() else {
            panic!("expected commit rule");
        };
        assert!(check
            .validate(&rule, &context.commits[0], &LintContext::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_default_email_regex() {
        let regex = regex::Regex::new(DEFAULT_AUTHOR_VALID_EMAIL_REGEX).unwrap();
        assert!(regex.is_match("john.doe@example.com"));
        assert!(!regex.is_match("john.doe"));
        assert!(!regex.is_match("john doe@example.com"));
        assert!(!regex.is_match("@example.com"));
    }
}
