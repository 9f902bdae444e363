//! Linter orchestration: applies the configured rules to a commit and
//! returns a deterministically ordered violation list

use crate::config::LintConfig;
use crate::error::GitContextError;
use crate::git::GitCommit;
use crate::rule::{LineRuleTarget, LintContext, Rule, RuleBehavior, RuleViolation};

/// Applies the rules of a [`LintConfig`] to commits.
///
/// The configuration is owned because configuration rules may mutate it
/// while linting; when linting a range of commits, build a fresh linter per
/// commit from the builder so those mutations never leak across commits.
#[derive(Debug)]
pub struct Linter {
    pub config: LintConfig,
}

impl Linter {
    pub fn new(config: LintConfig) -> Self {
        Self { config }
    }

    /// Lint a single commit:
    /// configuration rules run first (registration order) and may mutate
    /// both the configuration and the commit; special commit types
    /// configured to be ignored short-circuit to an empty list; line rules
    /// then run over title (line 1) and body (line 2 onwards), commit rules
    /// over the whole commit. Violations sort by line number (none first),
    /// then rule id.
    pub fn lint(&mut self, commit: &mut GitCommit) -> Result<Vec<RuleViolation>, GitContextError> {
        tracing::debug!(
            sha = commit.sha.as_deref().unwrap_or("[SHA UNKNOWN]"),
            "linting commit"
        );

        self.apply_configuration_rules(commit)?;

        if self.is_ignored_commit_type(commit)? {
            tracing::debug!("commit type is configured to be ignored, skipping");
            return Ok(Vec::new());
        }

        let ctx = self.config.lint_context();
        let mut violations = Vec::new();

        let title = vec![commit.message()?.title.clone()];
        violations.extend(self.apply_line_rules(
            &title,
            commit,
            LineRuleTarget::CommitMessageTitle,
            1,
            &ctx,
        )?);

        let body = commit.message()?.body.clone();
        violations.extend(self.apply_line_rules(
            &body,
            commit,
            LineRuleTarget::CommitMessageBody,
            2,
            &ctx,
        )?);

        violations.extend(self.apply_commit_rules(commit, &ctx)?);

        // No line number sorts first (commit-rule violations), then
        // position, then rule id for violations sharing a position
        violations.sort_by(|a, b| {
            let a_key = (a.line_nr.map_or(-1, |n| n as i64), a.rule_id.as_str());
            let b_key = (b.line_nr.map_or(-1, |n| n as i64), b.rule_id.as_str());
            a_key.cmp(&b_key)
        });
        Ok(violations)
    }

    fn should_ignore(&self, rule: &Rule) -> bool {
        self.config.is_rule_ignored(&rule.id, &rule.name)
    }

    /// Run every non-ignored configuration rule in registration order
    fn apply_configuration_rules(
        &mut self,
        commit: &mut GitCommit,
    ) -> Result<(), GitContextError> {
        let configuration_rules: Vec<Rule> = self
            .config
            .rules()
            .iter()
            .filter(|rule| rule.is_configuration_rule() && !self.should_ignore(rule))
            .cloned()
            .collect();
        for rule in configuration_rules {
            if let RuleBehavior::Configuration(check) = rule.behavior() {
                check.apply(&rule, &mut self.config, commit)?;
            }
        }
        Ok(())
    }

    /// True when the commit is a special type the configuration ignores
    fn is_ignored_commit_type(&self, commit: &GitCommit) -> Result<bool, GitContextError> {
        Ok(
            (commit.is_merge_commit()? && self.config.ignore_merge_commits())
                || (commit.is_squash_commit()? && self.config.ignore_squash_commits())
                || (commit.is_fixup_commit()? && self.config.ignore_fixup_commits())
                || (commit.is_fixup_amend_commit()? && self.config.ignore_fixup_amend_commits())
                || (commit.is_revert_commit()? && self.config.ignore_revert_commits()),
        )
    }

    fn apply_line_rules(
        &self,
        lines: &[String],
        commit: &GitCommit,
        target: LineRuleTarget,
        line_nr_start: u64,
        ctx: &LintContext,
    ) -> Result<Vec<RuleViolation>, GitContextError> {
        let mut all_violations = Vec::new();
        for (offset, line) in lines.iter().enumerate() {
            let line_nr = line_nr_start + offset as u64;
            for rule in self
                .config
                .rules()
                .iter()
                .filter(|rule| rule.target() == Some(target) && !self.should_ignore(rule))
            {
                if let RuleBehavior::Line(check) = rule.behavior() {
                    let violations = check.validate(rule, line, commit, ctx)?;
                    all_violations
                        .extend(violations.into_iter().map(|v| v.with_line_nr(line_nr)));
                }
            }
        }
        Ok(all_violations)
    }

    fn apply_commit_rules(
        &self,
        commit: &GitCommit,
        ctx: &LintContext,
    ) -> Result<Vec<RuleViolation>, GitContextError> {
        let mut all_violations = Vec::new();
        for rule in self
            .config
            .rules()
            .iter()
            .filter(|rule| rule.is_commit_rule() && !self.should_ignore(rule))
        {
            if let RuleBehavior::Commit(check) = rule.behavior() {
                all_violations.extend(check.validate(rule, commit, ctx)?);
            }
        }
        Ok(all_violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitContext;
    use crate::rule::{RuleClass, RuleResult};

    fn title_no_wip(rule: &Rule, line: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
        if line.contains("WIP") {
            return Ok(vec![RuleViolation::new(
                &rule.id,
                "Title contains the word 'WIP'",
                Some(line.to_string()),
            )]);
        }
        Ok(Vec::new())
    }

    fn body_no_tabs(rule: &Rule, line: &str, _commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
        if line.contains('\t') {
            return Ok(vec![RuleViolation::new(
                &rule.id,
                "Body line contains a tab",
                Some(line.to_string()),
            )]);
        }
        Ok(Vec::new())
    }

    fn body_required(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
        let body = &commit.message()?.body;
        if body.iter().all(|line| line.trim().is_empty()) {
            return Ok(vec![RuleViolation::new(&rule.id, "Body message is missing", None)]);
        }
        Ok(Vec::new())
    }

    fn ignore_wip_when_title_quickfix(
        _rule: &Rule,
        config: &mut LintConfig,
        commit: &mut GitCommit,
    ) -> Result<(), GitContextError> {
        if commit.message()?.title.starts_with("Quickfix") {
            config.extend_ignore(["UT1".to_string()]);
        }
        Ok(())
    }

    fn rewrite_body_to_merge(
        _rule: &Rule,
        _config: &mut LintConfig,
        commit: &mut GitCommit,
    ) -> Result<(), GitContextError> {
        let message = commit.message_mut()?;
        message.title = format!("Merge: {}", message.title);
        message.sync_full();
        Ok(())
    }

    fn tag_release_commit(
        _rule: &Rule,
        _config: &mut LintConfig,
        commit: &mut GitCommit,
    ) -> Result<(), GitContextError> {
        if commit.message()?.title.starts_with("Release") {
            commit
                .extra
                .insert("release".to_string(), serde_json::Value::Bool(true));
        }
        Ok(())
    }

    fn require_release_notes(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
        let is_release = commit
            .extra
            .get("release")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if is_release && !commit.message()?.full.contains("Notes:") {
            return Ok(vec![RuleViolation::new(
                &rule.id,
                "Release commit is missing release notes",
                None,
            )]);
        }
        Ok(Vec::new())
    }

    fn classes() -> Vec<RuleClass> {
        vec![
            RuleClass::line("UT1", "title-no-wip", LineRuleTarget::CommitMessageTitle, title_no_wip),
            RuleClass::line("UB1", "body-no-tabs", LineRuleTarget::CommitMessageBody, body_no_tabs),
            RuleClass::commit("UC1", "body-required", body_required),
        ]
    }

    fn linter_with(classes: Vec<RuleClass>) -> Linter {
        Linter::new(LintConfig::new(&classes, Vec::new()))
    }

    fn commit(message: &str) -> GitCommit {
        GitContext::from_commit_msg(message).commits.remove(0)
    }

    #[test]
    fn test_violations_sorted_commit_rule_first() {
        let mut linter = linter_with(classes());
        let mut commit = commit("WIP: do things");

        let violations = linter.lint(&mut commit).unwrap();
        let ids: Vec<(&str, Option<u64>)> = violations
            .iter()
            .map(|v| (v.rule_id.as_str(), v.line_nr))
            .collect();
        // The commit-rule violation has no line number and sorts first
        assert_eq!(ids, vec![("UC1", None), ("UT1", Some(1))]);
    }

    #[test]
    fn test_body_line_numbers_start_at_two() {
        let mut linter = linter_with(classes());
        let mut commit = commit("Good title\n\nok line\nbad\tline");

        let violations = linter.lint(&mut commit).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, "UB1");
        assert_eq!(violations[0].line_nr, Some(4));
    }

    #[test]
    fn test_ignored_rules_are_skipped() {
        let mut linter = linter_with(classes());
        linter.config.set_ignore("UT1, body-required");
        let mut commit = commit("WIP: do things");

        let violations = linter.lint(&mut commit).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_configuration_rule_mutates_config() {
        let mut all = classes();
        all.insert(
            0,
            RuleClass::configuration("UCF1", "quickfix-ignores", ignore_wip_when_title_quickfix),
        );
        let mut linter = linter_with(all);
        let mut commit = commit("Quickfix WIP thing\n\nSome body");

        let violations = linter.lint(&mut commit).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_merge_commit_short_circuit_after_configuration_rules() {
        let mut all = classes();
        all.insert(
            0,
            RuleClass::configuration("UCF2", "merge-rewriter", rewrite_body_to_merge),
        );
        let mut linter = linter_with(all);
        let mut commit = commit("WIP: becomes a merge");

        // The configuration rule turns the title into a merge title; with
        // ignore-merge-commits on by default, linting short-circuits
        let violations = linter.lint(&mut commit).unwrap();
        assert!(violations.is_empty());
        assert!(commit.is_merge_commit().unwrap());
    }

    #[test]
    fn test_commit_fields_attached_by_configuration_rule() {
        let release_classes = || {
            vec![
                RuleClass::configuration("UCF3", "release-tagger", tag_release_commit),
                RuleClass::commit("UC2", "release-notes-required", require_release_notes),
            ]
        };

        // The configuration rule tags the commit; the later commit rule
        // reads that tag back off the same commit instance
        let mut linter = linter_with(release_classes());
        let mut tagged = commit("Release 1.2.3\n\nSome body");
        let violations = linter.lint(&mut tagged).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, "UC2");
        assert_eq!(
            tagged.extra.get("release"),
            Some(&serde_json::Value::Bool(true))
        );

        let mut linter = linter_with(release_classes());
        let mut documented = commit("Release 1.2.4\n\nNotes: all the things");
        assert!(linter.lint(&mut documented).unwrap().is_empty());

        // Untagged commits never trip the dependent rule
        let mut linter = linter_with(release_classes());
        let mut plain = commit("Regular title\n\nSome body");
        assert!(linter.lint(&mut plain).unwrap().is_empty());
        assert!(plain.extra.is_empty());
    }

    #[test]
    fn test_merge_commit_linted_when_not_ignored() {
        let mut linter = linter_with(classes());
        linter
            .config
            .set_general_option("ignore-merge-commits", "false")
            .unwrap();
        let mut commit = commit("Merge branch 'WIP-stuff'");

        let violations = linter.lint(&mut commit).unwrap();
        assert!(violations.iter().any(|v| v.rule_id == "UT1"));
    }
}
