//! CC2: reject fixup!/squash!/amend! commits that should have been
//! autosquashed before review

use gitlint_core::{GitCommit, LintContext, Rule, RuleClass, RuleResult, RuleViolation};

pub fn disallow_cleanup_commits() -> RuleClass {
    RuleClass::commit("CC2", "contrib-disallow-cleanup-commits", validate_no_cleanup_commits)
}

fn validate_no_cleanup_commits(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    if commit.is_fixup_commit()? {
        return Ok(vec![
            RuleViolation::new(&rule.id, "Fixup commits are not allowed", None).with_line_nr(1),
        ]);
    }
    if commit.is_squash_commit()? {
        return Ok(vec![
            RuleViolation::new(&rule.id, "Squash commits are not allowed", None).with_line_nr(1),
        ]);
    }
    if commit.is_fixup_amend_commit()? {
        return Ok(vec![
            RuleViolation::new(&rule.id, "Amend commits are not allowed", None).with_line_nr(1),
        ]);
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitlint_core::{GitContext, RuleBehavior};

    fn validate(message: &str) -> Vec<RuleViolation> {
        let rule = disallow_cleanup_commits().instantiate_default();
        let RuleBehavior::Commit(check) = rule.behavior() else {
            panic!("expected commit rule");
        };
        let context = GitContext::from_commit_msg(message);
        check
            .validate(&rule, &context.commits[0], &LintContext::default())
            .unwrap()
    }

    #[test]
    fn test_regular_commit_passes() {
        assert!(validate("Regular tïtle\n\nBody").is_empty());
    }

    #[test]
    fn test_cleanup_commits_rejected() {
        let cases = [
            ("fixup! Regular tïtle", "Fixup commits are not allowed"),
            ("squash! Regular tïtle", "Squash commits are not allowed"),
            ("amend! Regular tïtle", "Amend commits are not allowed"),
        ];
        for (message, expected) in cases {
            let violations = validate(message);
            assert_eq!(violations.len(), 1, "message: {message}");
            assert_eq!(violations[0].message, expected);
            assert_eq!(violations[0].line_nr, Some(1));
        }
    }
}
